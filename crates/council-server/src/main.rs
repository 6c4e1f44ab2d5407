use clap::Parser;
use tracing::{info, warn};

use council_server::{configuration, logging, routes, state};

#[derive(Parser)]
#[command(author, version, about = "Council deliberation server", long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();

    logging::setup_logging()?;

    let settings = configuration::Settings::new()?;
    info!("configuration loaded: {:?}", settings);

    let provider_configs = match configuration::load_provider_configs() {
        Ok(configs) => {
            info!("loaded {} provider configurations", configs.len());
            configs
        }
        Err(err) => {
            warn!("no provider secrets loaded: {:#}", err);
            Vec::new()
        }
    };

    let state = state::AppState::new(provider_configs);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(settings.socket_addr()).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
