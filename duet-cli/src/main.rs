use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use duet_core::IceServerConfig;
use duet_server::{DEFAULT_PORT, HeartbeatConfig, RelayConfig, start_relay};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "duet-relay")]
#[command(about = "Signaling relay for two-party calls")]
struct Cli {
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// STUN server announced to clients.
    #[arg(long, env = "STUN_URL", default_value = "stun:stun.l.google.com:19302")]
    stun: String,

    #[arg(long, env = "TURN_URL")]
    turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME", requires = "turn_url")]
    turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL", requires = "turn_url")]
    turn_credential: Option<String>,

    /// Seconds between WebSocket pings.
    #[arg(long, default_value_t = 30)]
    heartbeat_secs: u64,
}

impl Cli {
    fn relay_config(&self) -> RelayConfig {
        let mut ice_servers = vec![IceServerConfig::stun(&self.stun)];
        if let Some(url) = &self.turn_url {
            ice_servers.push(IceServerConfig {
                urls: vec![url.clone()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        RelayConfig {
            ice_servers,
            heartbeat: HeartbeatConfig {
                interval: Duration::from_secs(self.heartbeat_secs.max(1)),
                ..HeartbeatConfig::default()
            },
            ..RelayConfig::with_port(self.port)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = cli.relay_config();
    println!("{}", "📞 Starting duet relay...".green().bold());
    println!("   🧊 ICE servers: {}", config.ice_servers.len());

    let handle = start_relay(config)
        .await
        .with_context(|| format!("Failed to start relay on port {}", cli.port))?;
    println!(
        "{} {}",
        "✨ Listening on".green().bold(),
        handle.ws_url().cyan()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down");
    handle.shutdown().await?;

    Ok(())
}
