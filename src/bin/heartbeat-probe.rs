use std::time::Duration;

use clap::Parser;

use heartbeat_failover::config::ObservabilityConfig;
use heartbeat_failover::health::{Endpoint, Prober, Role, TcpProber};
use heartbeat_failover::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "heartbeat-probe")]
#[command(about = "Send one HEARTBEAT to a replica and print the reply", long_about = None)]
struct Cli {
    #[arg(default_value = "localhost")]
    host: String,

    #[arg(default_value_t = 9999)]
    port: u16,

    /// Connect and read timeout in milliseconds.
    #[arg(long, default_value_t = 3000)]
    timeout_ms: u64,

    /// Label the target as BACKUP in logs.
    #[arg(long)]
    backup: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&ObservabilityConfig {
        log_level: "warn".to_string(),
        ..ObservabilityConfig::default()
    });

    let role = if cli.backup { Role::Backup } else { Role::Primary };
    let endpoint = Endpoint::new(role, cli.host, cli.port);
    let prober = TcpProber::new(Duration::from_millis(cli.timeout_ms));

    match prober.probe(&endpoint).await {
        Ok(reply) => {
            println!("{reply}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{role} {endpoint}: probe failed: {e}");
            std::process::exit(1);
        }
    }
}
