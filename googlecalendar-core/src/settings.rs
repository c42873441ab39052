//! Provider settings resolved from the environment.
//!
//! The two OAuth2 files are located through:
//!   CALENDAR_CREDENTIALS_FILE   (default: credentials.json)
//!   CALENDAR_OAUTH2_TOKEN_FILE  (default: token.json)

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ProviderResult;

pub const CREDENTIALS_FILE_ENV: &str = "CALENDAR_CREDENTIALS_FILE";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";

pub const TOKEN_FILE_ENV: &str = "CALENDAR_OAUTH2_TOKEN_FILE";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Terraform version reported in the user agent when the host doesn't tell us.
pub const DEFAULT_TERRAFORM_VERSION: &str = "0.11.14";

pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3/";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reads an environment variable, falling back to `default` when it is
/// unset or empty.
pub fn env_with_default(key: &str, default: &str) -> String {
    lookup_with_default(|k| std::env::var(k).ok(), key, default)
}

fn lookup_with_default<F>(lookup: F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials_file: PathBuf,
    pub token_file: PathBuf,
    pub terraform_version: String,
    pub timeout: Duration,
    pub api_base_url: Url,
}

impl Settings {
    pub fn from_env() -> ProviderResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> ProviderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            credentials_file: PathBuf::from(lookup_with_default(
                &lookup,
                CREDENTIALS_FILE_ENV,
                DEFAULT_CREDENTIALS_FILE,
            )),
            token_file: PathBuf::from(lookup_with_default(
                &lookup,
                TOKEN_FILE_ENV,
                DEFAULT_TOKEN_FILE,
            )),
            terraform_version: DEFAULT_TERRAFORM_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_base_url: Url::parse(DEFAULT_API_BASE_URL)?,
        })
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = path.into();
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = path.into();
        self
    }

    pub fn with_terraform_version(mut self, version: impl Into<String>) -> Self {
        self.terraform_version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points the client at another API root. A trailing slash is added so
    /// relative paths join below it rather than replacing the last segment.
    pub fn with_api_base_url(mut self, base: &str) -> ProviderResult<Self> {
        let base = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        self.api_base_url = Url::parse(&base)?;
        Ok(self)
    }
}
