//! Provider configuration: turns the two OAuth2 files into a calendar client.

use tracing::info;

use crate::credentials::config_from_file;
use crate::error::ProviderResult;
use crate::service::CalendarService;
use crate::settings::Settings;
use crate::token::token_from_file;

/// Configured state shared by the provider's resources.
#[derive(Debug)]
pub struct Config {
    calendar: CalendarService,
}

impl Config {
    /// Loads the client-secret and token files named in `settings` and
    /// builds the calendar client.
    ///
    /// Check [`crate::ProviderError::is_fatal`] on failure: unreadable or
    /// malformed client secrets and an unreadable token file must end the
    /// process.
    pub fn load_and_validate(settings: &Settings) -> ProviderResult<Self> {
        let oauth = config_from_file(&settings.credentials_file)?;
        let token = token_from_file(&settings.token_file)?;

        let calendar = CalendarService::new(oauth, token, settings)?;

        info!(user_agent = calendar.user_agent(), "Configured Google Calendar client");

        Ok(Self { calendar })
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CALENDAR_SCOPE;
    use crate::error::ProviderError;
    use std::path::Path;

    const CLIENT_SECRET: &str = r#"{
        "installed": {
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "secret",
            "redirect_uris": ["urn:ietf:wg:oauth:2.0:oob", "http://localhost"],
            "token_uri": "https://oauth2.googleapis.com/token"
        }
    }"#;

    const TOKEN: &str = r#"{
        "access_token": "ya29.token",
        "token_type": "Bearer",
        "refresh_token": "1//refresh",
        "expiry": "2030-01-01T00:00:00Z"
    }"#;

    fn settings_in(dir: &Path) -> Settings {
        Settings::from_lookup(|_| None)
            .unwrap()
            .with_credentials_file(dir.join("credentials.json"))
            .with_token_file(dir.join("token.json"))
            .with_terraform_version("0.11.14")
    }

    #[test]
    fn valid_files_produce_a_client() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credentials.json"), CLIENT_SECRET).unwrap();
        std::fs::write(dir.path().join("token.json"), TOKEN).unwrap();

        let config = Config::load_and_validate(&settings_in(dir.path())).unwrap();
        let calendar = config.calendar();

        assert!(calendar.user_agent().ends_with(") Terraform/0.11.14"));
        assert_eq!(calendar.oauth_config().client_id, "id.apps.googleusercontent.com");
        assert_eq!(calendar.oauth_config().scopes, vec![CALENDAR_SCOPE.to_string()]);
        assert_eq!(
            calendar.base_url().as_str(),
            "https://www.googleapis.com/calendar/v3/"
        );
    }

    #[test]
    fn missing_credentials_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token.json"), TOKEN).unwrap();

        let err = Config::load_and_validate(&settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, ProviderError::ReadCredentials { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn credentials_without_client_section_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credentials.json"), "{}").unwrap();
        std::fs::write(dir.path().join("token.json"), TOKEN).unwrap();

        let err = Config::load_and_validate(&settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, ProviderError::ParseCredentials { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn missing_token_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credentials.json"), CLIENT_SECRET).unwrap();

        let err = Config::load_and_validate(&settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, ProviderError::ReadToken { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn malformed_token_is_returned_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("credentials.json"), CLIENT_SECRET).unwrap();
        std::fs::write(dir.path().join("token.json"), "not json").unwrap();

        let err = Config::load_and_validate(&settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, ProviderError::ParseToken { .. }));
        assert!(!err.is_fatal());
    }
}
