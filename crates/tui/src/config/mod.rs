use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/tui.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Email prefilled on the login screen.
    pub email: String,
    /// Display currency used when a transaction carries none.
    pub currency: String,
    /// Requested page size; the server may clamp it and echo its own.
    pub per_page: u32,
    pub session_path: String,
    /// Log file path; empty disables logging entirely.
    pub log_file: String,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            email: String::new(),
            currency: "INR".to_string(),
            per_page: 25,
            session_path: "config/tui_session.json".to_string(),
            log_file: String::new(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "paisa_tui", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000).
    #[arg(long)]
    base_url: Option<String>,
    /// Override login email (password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Override display currency.
    #[arg(long)]
    currency: Option<String>,
    /// Override requested page size.
    #[arg(long)]
    per_page: Option<u32>,
    /// Override session file path.
    #[arg(long)]
    session_path: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("PAISA_TUI"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if let Some(currency) = args.currency {
        settings.currency = currency;
    }
    if let Some(per_page) = args.per_page {
        settings.per_page = per_page;
    }
    if let Some(session_path) = args.session_path {
        settings.session_path = session_path;
    }

    Ok(settings)
}
