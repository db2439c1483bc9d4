use mediaferry_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (local layout, remote store, pipeline, routes)
    let (state, router) = mediaferry_api::setup::initialize_app(config.clone()).await?;

    // Start the server, draining running ingestions on shutdown
    mediaferry_api::setup::server::start_server(&config, state, router).await?;

    Ok(())
}
