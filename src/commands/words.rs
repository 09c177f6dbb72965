use clap::Args;
use wordbook::dictionary::HttpDictionary;

use super::context::AppContext;

#[derive(Args)]
pub struct WordsCommand {
    /// Maximum number of words to print
    #[arg(long, short, default_value_t = 50)]
    pub limit: usize,

    /// Only print words starting with this prefix
    #[arg(long, short)]
    pub prefix: Option<String>,
}

impl WordsCommand {
    pub async fn run(&self, ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
        if !ctx.reconciler.words_list_loaded().await {
            println!("Fetching word list for the first time...");
        }

        let dictionary = HttpDictionary::new();
        let words = dictionary.fetch_words().await?;
        ctx.reconciler.set_words_list_loaded().await;

        let prefix = self.prefix.as_deref().map(str::to_lowercase);
        let selected: Vec<&String> = words
            .iter()
            .filter(|w| prefix.as_deref().map_or(true, |p| w.starts_with(p)))
            .take(self.limit)
            .collect();

        for word in &selected {
            println!("{}", word);
        }
        println!();
        println!("Showing {} of {} words", selected.len(), words.len());
        Ok(())
    }
}
