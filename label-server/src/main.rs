use label_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. dotenv, work dir, logger
    setup_environment()?;

    print_banner();
    tracing::info!("Label server starting...");

    // 2. configuration
    let config = Config::from_env();

    // 3. shared state (restores the saved printer)
    let state = ServerState::initialize(&config).await;

    // 4. HTTP server until ctrl-c
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}
