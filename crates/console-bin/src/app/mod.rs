//! Application wiring and command handlers.

mod commands;
mod state;

pub use commands::{run_get, run_login, run_logout, show_status};
pub use state::ConsoleState;
