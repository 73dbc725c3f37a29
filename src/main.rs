mod api_routes;
mod api_state;
mod models;
mod service;
mod utils;

use crate::models::config::{setup_config, CloudMode, Config, ConfigOverrides};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::net::IpAddr;

#[macro_use]
extern crate rocket;

use api_state::AppState;

fn build_rocket(config: &Config) -> rocket::Rocket<rocket::Build> {
    let app_state = AppState::new(config);

    // validate_config has already checked the address
    let address: IpAddr = config
        .address
        .parse()
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", address));

    rocket::custom(figment)
        .manage(app_state)
        .mount("/", routes![api_routes::metrics])
        .register("/", catchers![api_routes::not_found])
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(parse_log_level(&args.log_level))
        .format_timestamp_secs()
        .init();

    info!("backup-exporter starting...");

    // Strip any surrounding quotes from config file path
    let config_file = args
        .config_file
        .as_ref()
        .map(|path| path.trim_matches(|c| c == '"' || c == '\'').to_string());

    let config = setup_config(config_file, args.overrides()).context("Failed to load configuration")?;

    if args.validate_only {
        info!("Configuration is valid. Exiting (--validate-only mode).");
        return Ok(());
    }

    info!(
        "Starting backup exporter on {}:{} for {} (cloud mode: {:?})",
        config.address, config.port, config.backup_dir, config.cloud_mode
    );
    build_rocket(&config).launch().await?;
    Ok(())
}

fn parse_log_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    }
}

#[derive(Parser)]
#[command(name = "backup-exporter")]
#[command(about = "Prometheus exporter for local and cloud backups", long_about = None)]
struct Cli {
    #[arg(short = 'c', long = "config", env = "BACKUP_EXPORTER_CONFIG")]
    config_file: Option<String>,

    #[arg(long = "backup-dir", env = "BACKUP_EXPORTER_BACKUP_DIR")]
    backup_dir: Option<String>,

    #[arg(long = "rclone-remote", env = "BACKUP_EXPORTER_RCLONE_REMOTE")]
    rclone_remote: Option<String>,

    #[arg(long = "rclone-path")]
    rclone_path: Option<String>,

    #[arg(long = "rclone-binary")]
    rclone_binary: Option<String>,

    #[arg(short = 'p', long = "port", env = "BACKUP_EXPORTER_PORT")]
    port: Option<u16>,

    #[arg(long = "address", env = "BACKUP_EXPORTER_ADDRESS")]
    address: Option<String>,

    #[arg(long = "cloud-mode", value_enum, env = "BACKUP_EXPORTER_CLOUD_MODE")]
    cloud_mode: Option<CloudMode>,

    #[arg(long = "command-timeout")]
    command_timeout_secs: Option<u64>,

    #[arg(long = "cache-ttl")]
    cloud_cache_ttl_secs: Option<u64>,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    #[arg(short = 'v', long = "validate-only")]
    validate_only: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backup_dir: self.backup_dir.clone(),
            rclone_remote: self.rclone_remote.clone(),
            rclone_path: self.rclone_path.clone(),
            rclone_binary: self.rclone_binary.clone(),
            port: self.port,
            address: self.address.clone(),
            cloud_mode: self.cloud_mode,
            command_timeout_secs: self.command_timeout_secs,
            cloud_cache_ttl_secs: self.cloud_cache_ttl_secs,
        }
    }
}
