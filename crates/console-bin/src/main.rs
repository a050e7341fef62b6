//! QA console - command-line front end for the quality-audit dashboard API.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console_config_and_utils::{init_logging_to, Config, Paths};

/// QA console command-line interface.
#[derive(Parser)]
#[command(name = "qa-console")]
#[command(about = "Sign in to the QA analytics API and make authenticated calls")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for session, config and log files. Defaults to ~/.qa-console
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an identity-provider token
    Login {
        /// ID token issued by the identity provider
        #[arg(long, env = "QA_CONSOLE_ID_TOKEN")]
        id_token: String,
    },
    /// Check whether the stored session is usable
    Status,
    /// GET an API path with session handling
    Get {
        /// Path relative to the API base URL
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_parser = parse_query_pair)]
        query: Vec<(String, String)>,
    },
    /// End the session locally and on the server
    Logout,
}

fn parse_query_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    init_logging_to(
        cli.log_level.as_deref().unwrap_or(&config.log_level),
        paths.log_file(),
    );

    let state = app::ConsoleState::build(config, paths)?;

    let result = match cli.command {
        Commands::Login { id_token } => app::run_login(&state, &id_token).await,
        Commands::Status => app::show_status(&state).await,
        Commands::Get { path, query } => app::run_get(&state, &path, query).await,
        Commands::Logout => app::run_logout(&state).await,
    };

    if state.navigator.redirected_to_login() {
        eprintln!("Session ended. Sign in again with `qa-console login --id-token <TOKEN>`.");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_pair_splits_on_first_equals() {
        assert_eq!(
            parse_query_pair("filter=a=b").unwrap(),
            ("filter".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_query_pair("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_query_pair("novalue").is_err());
        assert!(parse_query_pair("=x").is_err());
    }

    #[test]
    fn cli_parses_get_with_queries() {
        let cli = Cli::try_parse_from([
            "qa-console",
            "--base-dir",
            "/tmp/qa",
            "get",
            "/audits",
            "-q",
            "from=2024-01-01",
            "--query",
            "to=2024-01-31",
        ])
        .unwrap();

        assert_eq!(cli.base_dir, Some(PathBuf::from("/tmp/qa")));
        match cli.command {
            Commands::Get { path, query } => {
                assert_eq!(path, "/audits");
                assert_eq!(query.len(), 2);
                assert_eq!(query[1].0, "to");
            }
            _ => panic!("expected get command"),
        }
    }

    #[test]
    fn cli_requires_a_command() {
        assert!(Cli::try_parse_from(["qa-console"]).is_err());
    }

    #[test]
    fn cli_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["qa-console", "status", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Status));
    }
}
