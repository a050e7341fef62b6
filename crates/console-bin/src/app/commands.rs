//! Command handlers.

use super::ConsoleState;
use console_auth::{decode_claims, ApiRequest, AuthError, RemoteLogout, SessionStatus};
use tracing::info;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn run_login(state: &ConsoleState, id_token: &str) -> CommandResult {
    let outcome = state.login.login(id_token).await?;

    match &outcome.email {
        Some(email) => println!("Signed in as {}", email),
        None => println!("Signed in"),
    }
    println!("  Roles: {}", outcome.roles.join(", "));
    Ok(())
}

pub async fn show_status(state: &ConsoleState) -> CommandResult {
    let gate = state.mount_gate();
    let status = gate.evaluate().await;

    match status {
        SessionStatus::Authenticated => {
            println!("Session is active");
            if let Some(email) = state.store.user_email()? {
                println!("  User:    {}", email);
            }
            let expiry = state
                .store
                .access_token()?
                .and_then(|token| decode_claims(&token))
                .and_then(|claims| claims.expires_at_utc());
            if let Some(expiry) = expiry {
                println!("  Expires: {}", expiry.to_rfc3339());
            }
        }
        other => {
            println!("Not signed in ({:?})", other);
        }
    }
    println!("  Session file: {}", state.paths.session_file().display());
    Ok(())
}

pub async fn run_get(
    state: &ConsoleState,
    path: &str,
    query: Vec<(String, String)>,
) -> CommandResult {
    let request = query
        .into_iter()
        .fold(ApiRequest::get(path), |request, (key, value)| {
            request.with_query(key, value)
        });

    let response = state.pipeline.send(&request).await?;
    info!(path, status = response.status, "request completed");

    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", response.body),
    }

    if !response.is_success() {
        return Err(AuthError::Api {
            status: response.status,
            body: String::new(),
        }
        .into());
    }
    Ok(())
}

pub async fn run_logout(state: &ConsoleState) -> CommandResult {
    let outcome = state.logout.logout().await;

    match outcome.remote {
        RemoteLogout::Confirmed => println!("Signed out"),
        RemoteLogout::Skipped => println!("No active session; local state cleared"),
        RemoteLogout::Failed(reason) => {
            println!("Signed out locally (server logout failed: {})", reason)
        }
    }
    Ok(())
}
