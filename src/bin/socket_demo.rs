use std::sync::Arc;
use std::time::Duration;
use walrus_notes::domain_model::{SocketEvent, UserId};
use walrus_notes::logger::*;
use walrus_notes::settings::*;
use walrus_notes::socket::*;

// Connects to the configured push endpoint and prints every draft event.
// $ cargo run --bin socket_demo -- --settings=settings/dev.toml
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let socket = &project_settings.socket;
    let user_id = socket
        .user_id
        .as_deref()
        .map(str::parse::<UserId>)
        .transpose()?;

    let mut config = SocketConfig::new(socket_url(&socket.url, user_id)?);
    config.backoff = ReconnectBackoff::with_base(Duration::from_millis(socket.reconnect_interval_ms));
    config.settle_delay = Duration::from_millis(socket.settle_delay_ms);
    config.reconnect = socket.reconnect;

    let client = Arc::new(ResilientSocketClient::new(config, Arc::new(WsConnector::new())));

    let _opened = client.on_open({
        let client = client.clone();
        move || {
            let hello = SocketEvent::new("DRAFT_SUBSCRIBE", serde_json::json!({}));
            info!("connected, subscribe sent: {}", client.send(&hello));
        }
    });
    let _updates = client.subscribe("NOTE_UPDATED", |payload| {
        info!("note updated: {}", payload);
    });

    client.connect();
    tokio::signal::ctrl_c().await?;
    client.shutdown();

    Ok(())
}
