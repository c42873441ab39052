//! OAuth2 client configuration read from a Google client-secret file.
//!
//! The file is the JSON downloaded from the Google Cloud Console credentials
//! page. It holds either a "web" or an "installed" section:
//!
//! ```json
//! { "installed": { "client_id": "...", "client_secret": "...",
//!                  "redirect_uris": ["http://localhost"],
//!                  "auth_uri": "...", "token_uri": "..." } }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::token::null_as_default;

/// Full read/write access to calendars. If this changes, previously saved
/// tokens have to be issued again.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Resolved OAuth2 client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSection>,
    installed: Option<ClientSection>,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    #[serde(default, deserialize_with = "null_as_default")]
    client_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    client_secret: String,
    #[serde(default, deserialize_with = "null_as_default")]
    redirect_uris: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    auth_uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    token_uri: String,
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

impl OAuthConfig {
    /// Parses a client-secret document, requesting the given scopes.
    ///
    /// A "web" section takes precedence over an "installed" one. The first
    /// redirect URI becomes the redirect URL.
    pub fn from_json(json: &[u8], scopes: &[&str]) -> Result<Self, String> {
        let file: ClientSecretFile = serde_json::from_slice(json).map_err(|e| e.to_string())?;

        let section = file
            .web
            .or(file.installed)
            .ok_or_else(|| "no credentials found".to_string())?;

        let redirect_url = section
            .redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| "missing redirect URL in the client_credentials.json".to_string())?;

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            redirect_url,
            auth_url: or_default(section.auth_uri, GOOGLE_AUTH_URL),
            token_url: or_default(section.token_uri, GOOGLE_TOKEN_URL),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Loads the client configuration from the client-secret file at `path`.
pub fn config_from_file(path: &Path) -> ProviderResult<OAuthConfig> {
    let contents = std::fs::read(path).map_err(|source| ProviderError::ReadCredentials {
        path: path.to_path_buf(),
        source,
    })?;

    let config = OAuthConfig::from_json(&contents, &[CALENDAR_SCOPE]).map_err(|reason| {
        ProviderError::ParseCredentials {
            path: path.to_path_buf(),
            reason,
        }
    })?;

    debug!(
        path = %path.display(),
        client_id = %config.client_id,
        "Loaded OAuth2 client configuration"
    );

    Ok(config)
}
