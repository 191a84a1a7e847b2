use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let share_port = std::env::var("SHARE_PORT").unwrap_or_else(|_| "3001".to_string());

    let addr = format!("127.0.0.1:{port}");
    let share_addr = format!("127.0.0.1:{share_port}");
    let listener = TcpListener::bind(&addr).await?;
    let share_listener = TcpListener::bind(&share_addr).await?;
    tracing::info!(%addr, %share_addr, "mock device listening");

    tokio::try_join!(
        mock_server::run(listener),
        mock_server::run_share(share_listener)
    )?;
    Ok(())
}
