mod config_cmd;
mod context;
mod define;
mod favorites;
mod history;
mod session_cmd;
mod sync_cmd;
mod words;

pub use config_cmd::ConfigCommand;
pub use context::AppContext;
pub use define::DefineCommand;
pub use favorites::FavCommand;
pub use history::HistoryCommand;
pub use session_cmd::{LoginCommand, LogoutCommand};
pub use sync_cmd::SyncCommand;
pub use words::WordsCommand;
