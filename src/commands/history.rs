use clap::{Args, Subcommand};

use super::context::AppContext;
use super::favorites::normalize;

#[derive(Args)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub command: HistorySubcommand,
}

#[derive(Subcommand)]
pub enum HistorySubcommand {
    /// List recently viewed words, most recent first
    List {
        /// Maximum number of entries to show
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Record a view of a word without looking it up
    View {
        /// Word that was viewed
        word: String,
    },
}

impl HistoryCommand {
    pub async fn run(&self, ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            HistorySubcommand::List { limit } => {
                let history = ctx.reconciler.get_history(&ctx.session).await;
                if history.is_empty() {
                    println!("No history yet.");
                    return Ok(());
                }
                let shown = limit.unwrap_or(history.len());
                for entry in history.iter().take(shown) {
                    println!("{}", entry);
                }
            }
            HistorySubcommand::View { word } => {
                let word = normalize(word);
                ctx.reconciler.add_to_history(&ctx.session, &word).await;
                println!("Recorded view of '{}'", word);
            }
        }
        Ok(())
    }
}
