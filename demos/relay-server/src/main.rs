//! Runs a LanChat relay until Ctrl-C.
//!
//! ```text
//! cargo run -p relay-server              # 0.0.0.0:11000
//! cargo run -p relay-server 127.0.0.1:9000
//! RUST_LOG=debug cargo run -p relay-server
//! ```

use lanchat::prelude::*;

#[tokio::main]
async fn main() -> Result<(), LanChatError> {
    lanchat::logging::init(lanchat::logging::DEFAULT_LOG_LEVEL);

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("0.0.0.0:{DEFAULT_PORT}"));

    let server = RelayServer::builder().bind(&addr).build().await?;

    let stop = server.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Ctrl-C received, stopping"),
            Err(e) => tracing::error!(error = %e, "cannot listen for Ctrl-C, stopping"),
        }
        stop.cancel();
    });

    server.run().await
}
