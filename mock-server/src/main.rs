use mock_server::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_MASTER_KEY: &str = "master-key";

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let master_key = std::env::var("MASTER_KEY").unwrap_or_else(|_| {
        tracing::warn!("MASTER_KEY not set, using the default development key");
        DEFAULT_MASTER_KEY.to_string()
    });

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener, AppState::new(&master_key)).await
}
