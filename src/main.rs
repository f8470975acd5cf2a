use clap::{Parser, Subcommand};
use domelink::model::command::AZ_TARGET_PARAM;
use domelink::model::Command;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// domelink: headless dashboard client for dome and shutter controllers
#[derive(Parser)]
#[command(name = "domelink", version, about)]
struct Cli {
    /// Path to the config file (TOML).
    #[arg(short, long, default_value = "/etc/domelink/config.toml")]
    config: PathBuf,

    /// Enable JSON log output (for journald).
    #[arg(long)]
    json: bool,

    /// Validate config and exit.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Poll status, run commands from stdin, follow the controller log.
    Run,
    /// Poll status once and print it.
    Status,
    /// Send one command and report the controller's verdict.
    Send {
        /// Command name, e.g. `close` or `slew-to-az`.
        command: Command,
        /// Target azimuth in degrees, for `slew-to-az`.
        #[arg(long)]
        az: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init tracing.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("domelink=info"));

    if cli.json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    info!("domelink v{}", env!("CARGO_PKG_VERSION"));

    // Load config.
    let config_path = cli
        .config
        .canonicalize()
        .unwrap_or_else(|_| cli.config.clone());
    let config = domelink::config::load(&config_path)?;

    if cli.check {
        println!(
            "config OK: {} controller at {}, log channel {}",
            config.controller.kind,
            config.controller.url,
            if config.log.enabled { "on" } else { "off" },
        );
        return Ok(());
    }

    match cli.action.unwrap_or(Action::Run) {
        Action::Run => {
            info!("loaded config: {} controller", config.controller.kind);
            domelink::daemon::run(config, config_path).await?;
        }
        Action::Status => {
            let view = domelink::daemon::status(&config).await?;
            print!("{view}");
        }
        Action::Send { command, az } => {
            let mut params = BTreeMap::new();
            if let Some(az) = az {
                params.insert(AZ_TARGET_PARAM.to_string(), az);
            }
            domelink::daemon::send(&config, command.clone(), params).await?;
            println!("{command}: done");
        }
    }

    Ok(())
}
