//! Error types for the Google Calendar provider.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while bootstrapping or using the calendar client.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unable to read client secret file {}: {source}", .path.display())]
    ReadCredentials {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse client secret file {} to config: {reason}", .path.display())]
    ParseCredentials { path: PathBuf, reason: String },

    #[error("Unable to read oauth2 token file {}: {source}", .path.display())]
    ReadToken {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse oauth2 token file {}: {source}", .path.display())]
    ParseToken {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed creating a new calendar service: {0}")]
    Client(#[source] reqwest::Error),

    #[error("oauth2: token expired and refresh token is not set")]
    RefreshTokenMissing,

    #[error("oauth2: cannot fetch token: {status}\nResponse: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("oauth2: server response missing access_token")]
    MissingAccessToken,

    #[error("Calendar API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ProviderError {
    /// Bootstrap failures that must terminate the process instead of being
    /// reported back to the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ReadCredentials { .. } | Self::ParseCredentials { .. } | Self::ReadToken { .. }
        )
    }
}

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn io_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")
    }

    #[test]
    fn file_access_errors_are_fatal() {
        let read_creds = ProviderError::ReadCredentials {
            path: PathBuf::from("credentials.json"),
            source: io_error(),
        };
        let parse_creds = ProviderError::ParseCredentials {
            path: PathBuf::from("credentials.json"),
            reason: "no credentials found".to_string(),
        };
        let read_token = ProviderError::ReadToken {
            path: PathBuf::from("token.json"),
            source: io_error(),
        };

        assert!(read_creds.is_fatal());
        assert!(parse_creds.is_fatal());
        assert!(read_token.is_fatal());
    }

    #[test]
    fn malformed_token_is_returned_not_fatal() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProviderError::ParseToken {
            path: PathBuf::from("token.json"),
            source,
        };
        assert!(!err.is_fatal());
        assert!(!ProviderError::RefreshTokenMissing.is_fatal());
    }

    #[test]
    fn messages_name_the_file() {
        let err = ProviderError::ReadCredentials {
            path: PathBuf::from("/etc/creds.json"),
            source: io_error(),
        };
        assert_eq!(
            err.to_string(),
            "Unable to read client secret file /etc/creds.json: no such file"
        );
    }
}
