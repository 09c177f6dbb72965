//! Login/logout: switch the persisted session and reconcile with the remote.

use clap::Args;
use wordbook_core::{login, logout};

use super::context::AppContext;

#[derive(Args)]
pub struct LoginCommand {
    /// Account to sign in as
    pub account: String,
}

impl LoginCommand {
    pub async fn run(&self, ctx: &mut AppContext) -> Result<(), Box<dyn std::error::Error>> {
        let account = self.account.trim();
        if account.is_empty() {
            return Err("Account name must not be empty".into());
        }

        if ctx.remote.is_none() {
            eprintln!("Warning: no remote server configured; data stays on this device");
        }

        if ctx.session.is_authenticated() && ctx.session.account_id() != Some(account) {
            // Flush the previous account before switching.
            let previous = logout(&ctx.reconciler, &ctx.session).await;
            ctx.save_session(previous).await?;
        }

        let (session, data) = login(&ctx.reconciler, account).await;
        ctx.save_session(session).await?;

        println!("Logged in as {}", account);
        println!(
            "  {} favorite{}, {} history entr{}",
            data.favorites.len(),
            if data.favorites.len() == 1 { "" } else { "s" },
            data.history.len(),
            if data.history.len() == 1 { "y" } else { "ies" }
        );
        Ok(())
    }
}

#[derive(Args)]
pub struct LogoutCommand {}

impl LogoutCommand {
    pub async fn run(&self, ctx: &mut AppContext) -> Result<(), Box<dyn std::error::Error>> {
        let Some(account) = ctx.session.account_id().map(str::to_string) else {
            println!("Not logged in");
            return Ok(());
        };

        let session = logout(&ctx.reconciler, &ctx.session).await;
        ctx.save_session(session).await?;
        println!("Logged out of {}", account);
        Ok(())
    }
}
