use anyhow::Result;
use plc_gateway_celima::{Config, MqttApp};
use plcnormalization::{Dispatcher, MessageHandler};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cfg = Config::from_env_and_args(&args)?;
    info!(
        broker = %cfg.broker_host,
        port = cfg.broker_port,
        client_id = %cfg.client_id,
        prefix = %cfg.isa95_prefix,
        "starting gateway"
    );

    let handler = MessageHandler::new(Dispatcher::new(), cfg.isa95_prefix.clone());
    let mut app = MqttApp::new(&cfg, handler);

    // A broker we cannot reach at startup is fatal (exit code 1); outages
    // after this point are ridden out by the event loop.
    app.wait_until_connected().await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down");
            signal_token.cancel();
        }
    });

    app.run(shutdown).await?;
    info!("gateway stopped");
    Ok(())
}
