use anyhow::Context;
use tokio::net::TcpListener;
use todo_client::{ClientConfig, TodoApp, TodoClient, UreqTransport};
use todo_web::{config::Config, router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let client = TodoClient::new(ClientConfig::new(&config.server_url));
    let backend = client.base_url().to_string();
    let state = AppState::new(TodoApp::new(client), UreqTransport::new());

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, %backend, "todo page listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
