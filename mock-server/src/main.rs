use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let user_token = std::env::var("MOCK_USER_TOKEN").unwrap_or_else(|_| "mock-user".to_string());
    let api_token = std::env::var("MOCK_API_TOKEN").unwrap_or_else(|_| "mock-api".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "mock CRM listening");
    mock_server::run(listener, mock_server::Crm::new(user_token, api_token).into_db()).await
}
