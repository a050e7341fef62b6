//! Unverified JWT claim inspection.
//!
//! The server verifies signatures. The client only reads the stated expiry
//! (and, at login, the email and roles) to decide what to do next. Every
//! decode failure is treated as an expired token; nothing here returns an
//! error or panics.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Claims the console reads from a token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    /// `exp`, seconds since the Unix epoch.
    pub expires_at: Option<i64>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl Claims {
    /// Expiry as a timestamp, if the claim is present and representable.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
    }
}

/// Decode the payload segment of a JWT without checking its signature.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    if payload.is_empty() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    let object = value.as_object()?;

    let expires_at = object.get("exp").and_then(|exp| match exp {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    });

    let email = object
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);

    let roles = object
        .get("roles")
        .and_then(Value::as_array)
        .map(|roles| {
            roles
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(Claims {
        expires_at,
        email,
        roles,
    })
}

/// Whether `token` should be treated as expired right now.
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

/// Whether `token` should be treated as expired at `now` (epoch seconds).
///
/// | input                          | result |
/// |--------------------------------|--------|
/// | absent or empty                | true   |
/// | `exp <= now`                   | true   |
/// | `exp > now`                    | false  |
/// | no `exp` claim                 | true   |
/// | undecodable                    | true   |
pub fn is_expired_at(token: Option<&str>, now: i64) -> bool {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return true;
    };

    match decode_claims(token).and_then(|claims| claims.expires_at) {
        Some(exp) => exp <= now,
        None => true,
    }
}
