use clap::Args;
use wordbook::dictionary::HttpDictionary;
use wordbook_core::{CachedLookup, DefinitionCache};

use super::context::AppContext;
use super::favorites::normalize;

#[derive(Args)]
pub struct DefineCommand {
    /// Words to look up. Definitions are cached for the rest of this call,
    /// so a repeated word is fetched once.
    #[arg(required = true)]
    pub words: Vec<String>,

    /// Do not record the lookup in history
    #[arg(long)]
    pub no_history: bool,
}

impl DefineCommand {
    pub async fn run(
        &self,
        ctx: &AppContext,
        cache: DefinitionCache,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let lookup = CachedLookup::new(HttpDictionary::new(), cache);
        let mut missing = 0;

        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                println!();
            }
            let word = normalize(word);
            match lookup.define(&word).await? {
                Some(definition) => {
                    print!("{}", definition);
                    if ctx.reconciler.is_favorite(&ctx.session, &word).await {
                        println!("\n★ favorite");
                    }
                    if !self.no_history {
                        ctx.reconciler.add_to_history(&ctx.session, &word).await;
                    }
                }
                None => {
                    missing += 1;
                    println!("No definition found for '{}'", word);
                }
            }
        }

        tracing::debug!(
            cached = lookup.cache().len(),
            missing,
            "definition lookups finished"
        );
        Ok(())
    }
}
