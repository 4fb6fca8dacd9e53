//! Check command implementation

use std::path::Path;

use colored::Colorize;
use pkgshare_store::{StoreConfig, StoreSettings};
use serde::Serialize;

use crate::error::Result;

/// Resolved settings as shown to the user; the access key is never included.
#[derive(Debug, Serialize)]
struct SettingsSummary<'a> {
    drive: &'a str,
    remote: &'a str,
    user_name: &'a str,
    root: &'a str,
    feed_id: &'a str,
    retry_attempts: u32,
    retry_delay_ms: u64,
    log_file: Option<&'a Path>,
}

impl<'a> SettingsSummary<'a> {
    fn new(settings: &'a StoreSettings, config: &'a StoreConfig) -> Self {
        Self {
            drive: &settings.binding.local,
            remote: &settings.binding.remote,
            user_name: &settings.binding.user_name,
            root: settings.root.as_str(),
            feed_id: &settings.feed_id,
            retry_attempts: settings.retry.max_attempts,
            retry_delay_ms: settings.retry.delay.as_millis() as u64,
            log_file: config.log_file_name.as_deref(),
        }
    }
}

/// Validate `config` without touching the share.
pub fn run_check(config: &StoreConfig, json: bool) -> Result<()> {
    let settings = config.validate()?;
    let summary = SettingsSummary::new(&settings, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Configuration is valid".green().bold());
    println!();
    println!("{}:     {}", "Drive".dimmed(), summary.drive.cyan());
    println!("{}:     {}", "Share".dimmed(), summary.remote);
    println!("{}:      {}", "User".dimmed(), summary.user_name);
    println!("{}:      {}", "Root".dimmed(), summary.root);
    println!("{}:      {}", "Feed".dimmed(), summary.feed_id);
    println!(
        "{}:     {} attempts, {} ms apart",
        "Retry".dimmed(),
        summary.retry_attempts,
        summary.retry_delay_ms
    );
    match summary.log_file {
        Some(path) => println!("{}:  {}", "Log file".dimmed(), path.display()),
        None => println!("{}:  {}", "Log file".dimmed(), "console only".dimmed()),
    }
    Ok(())
}
