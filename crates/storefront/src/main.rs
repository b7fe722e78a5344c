//! Storefront command shell entry point.

use std::sync::Arc;

use storefront::commands::{self, Command, HELP};
use storefront::{Config, Storefront};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Open the session and restore whatever it had
    let catalog = Arc::new(storefront::catalog::demo_catalog());
    let mut storefront = Storefront::open(config, catalog)?;
    let start = storefront.start();
    tracing::info!(identity = %start.identity, "storefront ready");

    // 4. Read commands until quit or end of input
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout
        .write_all(b"storefront shell, type 'help' for commands\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let output = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => HELP.to_string(),
            Ok(Command::Metrics) => metrics_handle.render(),
            Ok(command) => match commands::execute(&mut storefront, command).await {
                Ok(output) => output,
                Err(e) => format!("error: {e}"),
            },
            Err(e) => format!("{e}\n{HELP}"),
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    tracing::info!("storefront shell closed");
    Ok(())
}
