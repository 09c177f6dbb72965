use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordbook::config::Config;
use wordbook_core::DefinitionCache;

mod commands;

use commands::{
    AppContext, ConfigCommand, DefineCommand, FavCommand, HistoryCommand, LoginCommand,
    LogoutCommand, SyncCommand, WordsCommand,
};

#[derive(Parser)]
#[command(name = "wordbook")]
#[command(version)]
#[command(
    about = "Look up English words and keep favorites and history in sync",
    long_about = None
)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage favorite words
    Fav(FavCommand),

    /// Show or record viewed words
    History(HistoryCommand),

    /// Look up word definitions
    Define(DefineCommand),

    /// Browse the word list
    Words(WordsCommand),

    /// Sign in to an account and merge its remote data
    Login(LoginCommand),

    /// Upload local data and sign out
    Logout(LogoutCommand),

    /// Sync with remote server
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Fav(cmd)) => {
            let ctx = AppContext::open(&config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::History(cmd)) => {
            let ctx = AppContext::open(&config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::Define(cmd)) => {
            let ctx = AppContext::open(&config).await?;
            let cache = DefinitionCache::with_ttl(config.cache_ttl());
            cmd.run(&ctx, cache).await?;
        }
        Some(Commands::Words(cmd)) => {
            let ctx = AppContext::open(&config).await?;
            cmd.run(&ctx).await?;
        }
        Some(Commands::Login(cmd)) => {
            let mut ctx = AppContext::open(&config).await?;
            cmd.run(&mut ctx).await?;
        }
        Some(Commands::Logout(cmd)) => {
            let mut ctx = AppContext::open(&config).await?;
            cmd.run(&mut ctx).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let ctx = AppContext::open(&config).await?;
            cmd.run(&ctx, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
