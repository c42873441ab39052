//! Cached OAuth2 token read from the token file.

use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Tokens are treated as expired this long before their real expiry so a
/// request doesn't race the deadline.
pub const EXPIRY_DELTA_SECS: i64 = 10;

/// Reads an explicit JSON `null` as the type's zero value, the same as a
/// missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, deserialize_with = "null_as_default")]
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_token: String,
    /// `None` means the token never expires.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    pub fn from_json(json: &[u8]) -> Result<Self, serde_json::Error> {
        let mut token: Token = serde_json::from_slice(json)?;
        // The zero timestamp (0001-01-01T00:00:00Z) is how "no expiry" is written.
        token.expiry = token.expiry.filter(|expiry| expiry.year() > 1);
        Ok(token)
    }

    /// Normalized token type used in the Authorization header.
    pub fn kind(&self) -> String {
        let kind = self.token_type.as_str();
        if kind.eq_ignore_ascii_case("bearer") {
            "Bearer".to_string()
        } else if kind.eq_ignore_ascii_case("mac") {
            "MAC".to_string()
        } else if kind.eq_ignore_ascii_case("basic") {
            "Basic".to_string()
        } else if !kind.is_empty() {
            kind.to_string()
        } else {
            "Bearer".to_string()
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_DELTA_SECS) < now,
            None => false,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.kind(), self.access_token)
    }
}

/// Loads the cached token from `path`.
///
/// An unreadable file is a fatal bootstrap error; a readable file with
/// malformed contents is reported back to the caller.
pub fn token_from_file(path: &Path) -> ProviderResult<Token> {
    let contents = std::fs::read(path).map_err(|source| ProviderError::ReadToken {
        path: path.to_path_buf(),
        source,
    })?;

    let token = Token::from_json(&contents).map_err(|source| ProviderError::ParseToken {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        expiry = ?token.expiry,
        has_refresh_token = !token.refresh_token.is_empty(),
        "Loaded OAuth2 token"
    );

    Ok(token)
}
