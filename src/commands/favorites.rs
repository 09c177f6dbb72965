use clap::{Args, Subcommand};

use super::context::AppContext;

#[derive(Args)]
pub struct FavCommand {
    #[command(subcommand)]
    pub command: FavSubcommand,
}

#[derive(Subcommand)]
pub enum FavSubcommand {
    /// List favorite words
    List,
    /// Add a word to favorites
    Add {
        /// Word to add
        word: String,
    },
    /// Remove a word from favorites
    Remove {
        /// Word to remove
        word: String,
    },
    /// Check whether a word is a favorite
    Check {
        /// Word to check
        word: String,
    },
}

impl FavCommand {
    pub async fn run(&self, ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
        let reconciler = &ctx.reconciler;
        let session = &ctx.session;

        match &self.command {
            FavSubcommand::List => {
                let favorites = reconciler.get_favorites(session).await;
                if favorites.is_empty() {
                    println!("No favorites yet.");
                } else {
                    for word in &favorites {
                        println!("{}", word);
                    }
                }
            }
            FavSubcommand::Add { word } => {
                let word = normalize(word);
                if reconciler.add_favorite(session, &word).await {
                    println!("Added '{}' to favorites", word);
                } else if reconciler.is_favorite(session, &word).await {
                    println!("'{}' is already a favorite", word);
                } else {
                    return Err(format!("Could not add '{}' to favorites", word).into());
                }
            }
            FavSubcommand::Remove { word } => {
                let word = normalize(word);
                if reconciler.remove_favorite(session, &word).await {
                    println!("Removed '{}' from favorites", word);
                } else {
                    println!("'{}' is not a favorite", word);
                }
            }
            FavSubcommand::Check { word } => {
                let word = normalize(word);
                if reconciler.is_favorite(session, &word).await {
                    println!("'{}' is a favorite", word);
                } else {
                    println!("'{}' is not a favorite", word);
                }
            }
        }

        Ok(())
    }
}

/// Words are stored lowercased and trimmed, the same as definition lookups.
pub fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}
