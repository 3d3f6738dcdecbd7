pub mod action;
pub mod command;
pub mod context;
pub mod module;

pub use action::{Action, NotifyLevel};
pub use command::{parse_command, Command};
pub use context::{Context, WalletContext};
pub use module::Module;
