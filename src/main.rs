mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use googlecalendar_core::settings::{env_with_default, DEFAULT_TERRAFORM_VERSION};
use googlecalendar_core::{Config, ProviderError, Settings};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Terraform's log level variable, also used for the provider's own logs.
const LOG_ENV: &str = "TF_LOG";

#[derive(Parser)]
#[command(name = "terraform-provider-googlecalendar")]
#[command(about = "Bootstrap and check the Google Calendar provider's OAuth2 credentials")]
struct Cli {
    /// Client secret file (overrides CALENDAR_CREDENTIALS_FILE)
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,

    /// Cached OAuth2 token file (overrides CALENDAR_OAUTH2_TOKEN_FILE)
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Terraform version reported in the user agent
    #[arg(long, global = true, default_value = DEFAULT_TERRAFORM_VERSION)]
    terraform_version: String,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the credentials and list the calendars they can see
    Check,
    /// Load the credentials and show a single calendar
    Calendar {
        /// Calendar ID, e.g. "primary" or an email address
        id: String,
    },
    /// Print the user agent sent with API requests
    UserAgent,
}

/// Maps Terraform's `TF_LOG` vocabulary onto a tracing level. Terraform
/// treats any non-empty value it doesn't recognize (e.g. `JSON`) as `TRACE`.
/// Errors are never filtered out.
fn log_level(tf_log: &str) -> &'static str {
    match tf_log.trim().to_ascii_lowercase().as_str() {
        "" | "off" | "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        _ => "trace",
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level(&env_with_default(LOG_ENV, ""))))
        .with_writer(std::io::stderr)
        .init();
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let settings = Settings::from_env().context("Failed to read provider settings")?;
        Ok(self.apply_overrides(settings))
    }

    /// Flags win over the environment.
    fn apply_overrides(&self, mut settings: Settings) -> Settings {
        settings = settings.with_terraform_version(self.terraform_version.clone());

        if let Some(path) = &self.credentials_file {
            settings = settings.with_credentials_file(path);
        }
        if let Some(path) = &self.token_file {
            settings = settings.with_token_file(path);
        }
        if let Some(secs) = self.timeout_secs {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }

        settings
    }
}

/// Outcome of loading the provider configuration.
enum Bootstrap {
    Ready(Config),
    /// The process has to stop with this error.
    Fatal(ProviderError),
}

fn try_bootstrap(settings: &Settings) -> Result<Bootstrap> {
    match Config::load_and_validate(settings) {
        Ok(config) => Ok(Bootstrap::Ready(config)),
        Err(e) if e.is_fatal() => Ok(Bootstrap::Fatal(e)),
        Err(e) => Err(e).context("Failed to configure the Google Calendar provider"),
    }
}

fn fatal_message(err: &ProviderError) -> String {
    format!("Unable to load provider configuration: {}", err)
}

/// Runs the bootstrap. Unreadable or malformed client secrets and an
/// unreadable token file end the process here.
fn bootstrap(settings: &Settings) -> Result<Config> {
    match try_bootstrap(settings)? {
        Bootstrap::Ready(config) => Ok(config),
        Bootstrap::Fatal(e) => {
            let message = fatal_message(&e);
            error!("{}", message);
            // stderr regardless of TF_LOG
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Commands::Check => commands::check::run(bootstrap(&settings)?).await,
        Commands::Calendar { id } => commands::calendar::run(bootstrap(&settings)?, &id).await,
        Commands::UserAgent => {
            println!(
                "{}",
                googlecalendar_core::user_agent::user_agent(&settings.terraform_version)
            );
            Ok(())
        }
    }
}
