use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::RemoteError;

/// Seconds shaved off a token's lifetime so it is never used right at expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Environment variable read by [`EnvTokenSource`].
pub const TOKEN_ENV: &str = "SHOP_LEDGER_DRIVE_TOKEN";
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Access token as returned by an authorization flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in_secs: i64,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<String>, expires_in_secs: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in_secs,
        }
    }
}

/// Cached bearer credential with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn from_grant(grant: &TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            access_token: grant.access_token.clone(),
            expires_at: now + Duration::seconds(grant.expires_in_secs - EXPIRY_SKEW_SECS),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.trim().is_empty() && now < self.expires_at
    }
}

/// Obtains tokens without user interaction.
pub trait TokenSource: Send + Sync {
    /// `Ok(None)` means interactive consent is required.
    fn refresh_silently(&self) -> Result<Option<TokenGrant>, RemoteError>;
}

/// Reads a pre-issued access token from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvTokenSource;

impl TokenSource for EnvTokenSource {
    fn refresh_silently(&self) -> Result<Option<TokenGrant>, RemoteError> {
        Ok(std::env::var(TOKEN_ENV)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(|token| TokenGrant::new(token, DEFAULT_TOKEN_LIFETIME_SECS)))
    }
}
