use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use ctl_console::backend::{HttpSwitchStatus, InMemoryInventory};
use ctl_console::commands::{register_builtin_commands, register_controller_commands};
use ctl_console::config::{ConsoleConfig, DEFAULT_CONFIG_FILE};
use ctl_console::{CommandRegistry, ConsoleServer, logging};

/// ctl-console -- SSH command console for the network controller.
#[derive(Parser, Debug)]
#[command(name = "ctl-console", version, about)]
struct Cli {
    /// Configuration file (RON); defaults are used when it does not exist
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Login name
    #[arg(long)]
    username: Option<String>,

    /// Login password
    #[arg(long)]
    password: Option<String>,

    /// Host key file, generated when missing
    #[arg(long)]
    hostkey: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_filter: String,
}

impl Cli {
    fn console_config(&self) -> anyhow::Result<ConsoleConfig> {
        let mut config = if self.config.exists() {
            ConsoleConfig::load(&self.config)
                .with_context(|| format!("failed to load config from {}", self.config.display()))?
        } else {
            info!("No config file found at '{}', using defaults", self.config.display());
            ConsoleConfig::default()
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(username) = &self.username {
            config.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(hostkey) = &self.hostkey {
            config.hostkey = hostkey.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logs = logging::init(&cli.log_filter).context("failed to install log subscriber")?;
    let config = cli.console_config()?;

    let registry = Arc::new(CommandRegistry::new());
    register_builtin_commands(&registry).context("failed to register built-in commands")?;

    let switches = HttpSwitchStatus::new(&config.rest_url, config.rest_timeout())
        .context("failed to create REST client")?;
    register_controller_commands(
        &registry,
        Arc::new(InMemoryInventory::new()),
        Arc::new(switches),
        logs,
    )
    .context("failed to register controller commands")?;

    let port = config.port;
    if let Err(e) = ConsoleServer::new(config, registry).run().await {
        error!("Starting config console (via SSH) on port {} failed: {}", port, e);
        return Err(e.into());
    }
    Ok(())
}
