//! Config commands (show, set-url, set-notifications)

use crate::config::{config_file, Config, STREAM_URL_ENV};
use crate::notify::NotifyMode;
use anyhow::Result;

/// Print the effective configuration
pub async fn show() -> Result<()> {
    let config = Config::load()?;

    println!("Config file:        {}", config_file().display());
    println!();
    println!("stream_url:         {}", config.stream_url);
    println!("notifications:      {}", config.notifications.as_str());
    println!("reconnect_delay_ms: {}", config.reconnect_delay_ms);
    println!("demo_interval_secs: {}", config.demo_interval_secs);

    if std::env::var(STREAM_URL_ENV).is_ok() {
        println!();
        println!("(stream_url overridden by {})", STREAM_URL_ENV);
    }

    Ok(())
}

/// Store a new stream URL
pub async fn set_url(url: &str) -> Result<()> {
    let mut config = Config::load_from(&config_file())?;
    config.set_stream_url(url)?;
    config.save()?;

    println!("Stream URL set to {}", config.stream_url);
    Ok(())
}

/// Store the notification mode
pub async fn set_notifications(mode: NotifyMode) -> Result<()> {
    let mut config = Config::load_from(&config_file())?;
    config.notifications = mode;
    config.save()?;

    println!("Notifications set to {}", mode.as_str());
    Ok(())
}
