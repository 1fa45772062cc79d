mod api_doc;
mod auth;
mod error;
mod handlers;
mod middleware;
mod services;
mod setup;
mod state;
mod telemetry;

use droply_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    telemetry::init_telemetry();

    let config = Config::from_env()?;
    config.validate()?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
