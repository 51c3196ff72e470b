use anyhow::Result;
use footballbin_mcp::{
    bridge::{BridgeClient, StdioBridge},
    config::BridgeConfig,
};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "footballbin_mcp=info".into()),
        )
        .init();

    let config = BridgeConfig::from_env();
    let bridge = StdioBridge::new(BridgeClient::new(config.api_endpoint));
    bridge
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
