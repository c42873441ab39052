//! Core of the Google Calendar Terraform provider.
//!
//! This crate bootstraps the provider's calendar client:
//! - `settings` locates the OAuth2 files through the environment
//! - `credentials` and `token` read the client secret and the cached token
//! - `service` is the authenticated Calendar API client
//! - `config` ties them together and classifies bootstrap failures

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod service;
pub mod settings;
pub mod token;
pub mod transport;
pub mod user_agent;

pub use config::Config;
pub use error::{ProviderError, ProviderResult};
pub use service::{Calendar, CalendarListEntry, CalendarService};
pub use settings::Settings;
