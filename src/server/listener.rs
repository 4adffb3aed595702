use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionSettings, Handler};

pub async fn run<H: Handler>(cfg: &Config, handler: Arc<H>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.listen_addr))?;
    info!("Listening on {}", cfg.server.listen_addr);

    serve(listener, handler, cfg.connection_settings()).await
}

/// Accepts connections forever, one task per connection.
pub async fn serve<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    settings: ConnectionSettings,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        debug!("Accepted connection from {}", peer);

        let handler = handler.clone();
        let settings = settings.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, handler, settings);
            if let Err(e) = conn.run().await {
                warn!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}
