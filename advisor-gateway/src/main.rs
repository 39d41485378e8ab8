use advisor_core::config::AdvisorConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Missing configuration is fatal before the service binds; a half-working
    // gateway would only fail later, mid-conversation.
    let cfg = match AdvisorConfig::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("advisor gateway listening on {addr}");
    axum::serve(listener, advisor_gateway::app::router(cfg)).await?;
    Ok(())
}
