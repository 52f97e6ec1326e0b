//! `isofetch config` – print the effective configuration.

use anyhow::Result;
use isofetch_core::{config, logging};

pub fn run_config() -> Result<()> {
    let path = config::config_path()?;
    let mut cfg = config::load_or_init()?;
    let key_source = if std::env::var(config::API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty()) {
        config::API_KEY_ENV
    } else if cfg.api_key.is_some() {
        "config file"
    } else {
        "not set"
    };
    if cfg.api_key.is_some() {
        cfg.api_key = Some("********".to_string());
    }

    println!("# config: {}", path.display());
    if let Ok(log) = logging::log_file_path() {
        println!("# log:    {}", log.display());
    }
    println!("# api key: {}", key_source);
    print!("{}", toml::to_string_pretty(&cfg)?);
    if let Err(err) = cfg.validate() {
        println!("# warning: {:#}", err);
    }
    Ok(())
}
