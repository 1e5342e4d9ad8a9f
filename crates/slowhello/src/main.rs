//! slowhello: answers every request on `0.0.0.0:5000` with `Hello, world!\n`
//! after a one-second pause, echoing the caller's address in `X-Remote-Addr`.

use anyhow::Context;
use mimalloc::MiMalloc;
use slowhello_core::{Routes, Server, ServerConfig};
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::default();
    let routes = Routes::hello()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async move {
        let server = Server::bind(&config, routes)?;
        info!(workers = config.workers, "starting slowhello");
        server.run().await
    })?;

    Ok(())
}
