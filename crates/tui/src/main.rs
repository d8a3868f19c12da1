mod aggregate;
mod app;
mod client;
mod config;
mod error;
mod import;
mod quick_add;
mod session;
mod ui;

use std::{fs::OpenOptions, path::Path, sync::Arc};

use crate::error::Result;

/// Logs go to a file because stdout belongs to the alternate screen.
/// An empty `log_file` disables logging entirely.
fn init_tracing(config: &config::AppConfig) -> Result<()> {
    if config.log_file.is_empty() {
        return Ok(());
    }

    if let Some(parent) = Path::new(&config.log_file).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("paisa_tui={}", config.log_level))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;
    init_tracing(&config)?;
    let mut app = app::App::new(config)?;
    app.run().await?;
    Ok(())
}
