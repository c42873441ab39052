//! Calendar API client.

use reqwest::Request;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::TokenSource;
use crate::credentials::OAuthConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::settings::Settings;
use crate::token::Token;
use crate::transport::LoggingTransport;
use crate::user_agent::user_agent;

/// Label the transport logs requests under.
const API_NAME: &str = "Google";

/// An entry of the user's calendar list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub access_role: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// A calendar resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListPage {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

/// Pulls Google's `error.message` out of an error body, falling back to the
/// raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<GoogleErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Authenticated Calendar API client tagged with the provider user agent.
#[derive(Debug)]
pub struct CalendarService {
    transport: LoggingTransport,
    tokens: TokenSource,
    base_url: Url,
    user_agent: String,
}

impl CalendarService {
    pub fn new(config: OAuthConfig, token: Token, settings: &Settings) -> ProviderResult<Self> {
        let user_agent = user_agent(&settings.terraform_version);

        let http = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .map_err(ProviderError::Client)?;

        Ok(Self {
            transport: LoggingTransport::new(API_NAME, http.clone()),
            tokens: TokenSource::new(config, token, http),
            base_url: settings.api_base_url.clone(),
            user_agent,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn oauth_config(&self) -> &OAuthConfig {
        self.tokens.config()
    }

    /// Base URL extended with the given path segments, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET request carrying the bearer token and the user agent. The user
    /// agent is set on the request itself so the transport logs it.
    fn authorized_get(&self, url: Url, token: &Token) -> ProviderResult<Request> {
        Ok(self
            .transport
            .client()
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .header(AUTHORIZATION, token.authorization_header())
            .build()?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ProviderResult<T> {
        let token = self.tokens.token().await?;
        let request = self.authorized_get(url, &token)?;

        let response = self.transport.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        Ok(response.json().await?)
    }

    /// Lists every calendar on the user's calendar list, following pagination.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarListEntry>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["users", "me", "calendarList"])?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let page: CalendarListPage = self.get_json(url).await?;
            calendars.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = calendars.len(), "Fetched calendar list");
        Ok(calendars)
    }

    pub async fn get_calendar(&self, calendar_id: &str) -> ProviderResult<Calendar> {
        let url = self.endpoint(&["calendars", calendar_id])?;
        self.get_json(url).await
    }
}
