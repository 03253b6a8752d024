mod api;
mod config;
mod console;
mod error;
mod token;
mod view;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::config::Config;
use crate::console::Console;
use crate::token::TokenMinter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Token minting and API calls are async; the command loop itself reads
    // stdin synchronously and blocks on the runtime per command.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let api = ApiClient::new(&config.api.base_url);
    let minter = TokenMinter::new(config.identity.clone());
    let console = Console::new(api, minter);
    console.run(&rt)?;

    Ok(())
}
