use mock_server::{MockConfig, MockState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let merchant_id = std::env::var("MOCK_MERCHANT_ID").unwrap_or_else(|_| "merchant".to_string());
    let api_key = std::env::var("MOCK_API_KEY").unwrap_or_else(|_| "key".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %merchant_id, "mock Viva API listening");
    mock_server::run(listener, MockState::new(MockConfig::new(merchant_id, api_key))).await
}
