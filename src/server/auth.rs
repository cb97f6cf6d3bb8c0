//! Caller identity. Accounts live upstream; a gateway forwards the username
//! and, when a shared secret is configured, signs it.

use axum::extract::FromRequestParts;
use axum::http::{ request::Parts, HeaderMap };
use chrono::Utc;
use hmac::{ Hmac, Mac };
use log::warn;
use sha2::Sha256;

use super::api::AppState;
use super::error::ApiError;
use crate::cli::Args;
use crate::db;
use crate::models::user::User;

type HmacSha256 = Hmac<Sha256>;

pub const USERNAME_HEADER: &str = "x-username";
pub const TIMESTAMP_HEADER: &str = "x-api-ts";
pub const SIGNATURE_HEADER: &str = "x-api-sign";

const USERNAME_MAX_LEN: usize = 150;

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub api_key: Option<String>,
    pub max_skew_secs: i64,
}

impl AuthSettings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: args.server_api_key.clone().filter(|k| !k.is_empty()),
            max_skew_secs: args.signature_max_skew_secs,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SignatureError {
    Missing,
    TimestampOutOfRange,
    BadSignature,
}

impl SignatureError {
    fn message(&self) -> &'static str {
        match self {
            SignatureError::Missing => "missing ts/sig",
            SignatureError::TimestampOutOfRange => "timestamp out of range",
            SignatureError::BadSignature => "bad signature",
        }
    }
}

pub fn sign(secret: &str, ts: &str, username: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(ts.as_bytes());
    mac.update(b":");
    mac.update(username.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `sig == hex(HMAC-SHA256(secret, "<ts>:<username>"))` and that `ts`
/// is within `max_skew_secs` of `now`.
pub fn verify_signature(
    secret: &str,
    ts: Option<&str>,
    sig: Option<&str>,
    username: &str,
    now: i64,
    max_skew_secs: i64
) -> Result<(), SignatureError> {
    let (Some(ts), Some(sig)) = (ts, sig) else {
        return Err(SignatureError::Missing);
    };

    let ts_i: i64 = ts.parse().map_err(|_| SignatureError::TimestampOutOfRange)?;
    if (now - ts_i).abs() > max_skew_secs {
        return Err(SignatureError::TimestampOutOfRange);
    }

    let expected = hex::decode(sig).map_err(|_| SignatureError::BadSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::BadSignature)?;
    mac.update(ts.as_bytes());
    mac.update(b":");
    mac.update(username.as_bytes());
    mac.verify_slice(&expected).map_err(|_| SignatureError::BadSignature)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The authenticated caller, created on first sight.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let username = header_str(&parts.headers, USERNAME_HEADER)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided.".into()))?
            .to_string();

        if username.chars().count() > USERNAME_MAX_LEN {
            return Err(ApiError::BadRequest("Username is too long.".into()));
        }
        if username == state.assistant.bot_user().username {
            return Err(ApiError::Forbidden("This account cannot be used by clients.".into()));
        }

        if let Some(secret) = &state.auth.api_key {
            let verified = verify_signature(
                secret,
                header_str(&parts.headers, TIMESTAMP_HEADER),
                header_str(&parts.headers, SIGNATURE_HEADER),
                &username,
                Utc::now().timestamp(),
                state.auth.max_skew_secs
            );
            if let Err(e) = verified {
                warn!("Rejected request for @{}: {}", username, e.message());
                return Err(ApiError::Unauthorized(e.message().into()));
            }
        }

        let user = db::users::get_or_create(&state.db, &username).await?;
        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "gateway-secret";
    const NOW: i64 = 1_750_000_000;

    #[test]
    fn accepts_fresh_valid_signature() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, "coach");
        assert_eq!(verify_signature(SECRET, Some(&ts), Some(&sig), "coach", NOW + 10, 300), Ok(()));
    }

    #[test]
    fn signature_is_bound_to_username() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, "coach");
        assert_eq!(
            verify_signature(SECRET, Some(&ts), Some(&sig), "someone_else", NOW, 300),
            Err(SignatureError::BadSignature)
        );
    }

    #[test]
    fn rejects_stale_missing_or_garbled_input() {
        let ts = NOW.to_string();
        let sig = sign(SECRET, &ts, "coach");
        assert_eq!(
            verify_signature(SECRET, Some(&ts), Some(&sig), "coach", NOW + 301, 300),
            Err(SignatureError::TimestampOutOfRange)
        );
        assert_eq!(verify_signature(SECRET, None, Some(&sig), "coach", NOW, 300), Err(SignatureError::Missing));
        assert_eq!(
            verify_signature(SECRET, Some(&ts), Some("zz-not-hex"), "coach", NOW, 300),
            Err(SignatureError::BadSignature)
        );
        assert_eq!(
            verify_signature(SECRET, Some("yesterday"), Some(&sig), "coach", NOW, 300),
            Err(SignatureError::TimestampOutOfRange)
        );
    }
}
