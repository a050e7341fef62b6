//! Configuration, paths, and logging setup for the QA console.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_URL, DEFAULT_APPLICATION_ID, DEFAULT_AUTH_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_REFRESH_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_to, parse_level};
pub use paths::Paths;
