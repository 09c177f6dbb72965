//! Sync CLI commands for pushing to and pulling from the document server.

use clap::{Args, Subcommand};
use wordbook::config::Config;

use super::context::AppContext;

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: SyncSubcommand,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Upload local favorites and history, replacing the remote copies
    Push,
    /// Merge remote favorites and history into local data
    Pull,
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, ctx: &AppContext, config: &Config) -> Result<(), SyncCommandError> {
        match &self.command {
            SyncSubcommand::Push => self.push(ctx).await,
            SyncSubcommand::Pull => self.pull(ctx).await,
            SyncSubcommand::Status => {
                self.status(ctx, config).await;
                Ok(())
            }
        }
    }

    async fn push(&self, ctx: &AppContext) -> Result<(), SyncCommandError> {
        check_ready(ctx)?;
        println!("Pushing local data...");
        ctx.reconciler
            .sync_to_remote(&ctx.session)
            .await
            .map_err(|e| SyncCommandError::Failed(e.to_string()))?;
        println!("✓ favorites and history uploaded");
        Ok(())
    }

    async fn pull(&self, ctx: &AppContext) -> Result<(), SyncCommandError> {
        check_ready(ctx)?;
        println!("Pulling remote data...");
        let data = ctx.reconciler.load_from_remote(&ctx.session).await;
        println!("✓ {} favorites", data.favorites.len());
        println!("✓ {} history entries", data.history.len());
        Ok(())
    }

    async fn status(&self, ctx: &AppContext, config: &Config) {
        println!("Sync Configuration");
        println!("==================");
        println!();

        match ctx.session.account_id() {
            Some(account) => println!("Account:   {}", account),
            None => println!("Account:   (not logged in)"),
        }

        let Some(remote) = &ctx.remote else {
            println!("Status:    Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  remote:");
            println!("    server_url: \"http://localhost:8080\"");
            println!("    api_key: \"your-key\"");
            println!();
            println!("Or set environment variables:");
            println!("  WORDBOOK_REMOTE_URL");
            println!("  WORDBOOK_REMOTE_API_KEY");
            if config.remote.server_url.is_some() {
                println!();
                println!("(server_url is set but api_key is missing)");
            }
            return;
        };

        println!("Server:    {}", remote.server_url());
        print!("Server status: ");
        if remote.check_server().await {
            println!("✓ reachable");
        } else {
            println!("✗ unreachable");
        }
    }
}

fn check_ready(ctx: &AppContext) -> Result<(), SyncCommandError> {
    if ctx.remote.is_none() {
        return Err(SyncCommandError::NotConfigured);
    }
    if !ctx.session.is_authenticated() {
        return Err(SyncCommandError::NotLoggedIn);
    }
    Ok(())
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NotConfigured,
    NotLoggedIn,
    Failed(String),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NotConfigured => write!(
                f,
                "Sync not configured. Set remote.server_url and remote.api_key"
            ),
            SyncCommandError::NotLoggedIn => {
                write!(f, "Not logged in. Run 'wordbook login <account>' first")
            }
            SyncCommandError::Failed(e) => write!(f, "Sync failed: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {}
