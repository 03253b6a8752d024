use std::sync::Arc;

use tokio::net::TcpListener;

use roster_backend::auth::JwksVerifier;
use roster_backend::store::UserStore;
use roster_backend::{app, logging, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    logging::init(&config.logging);

    tracing::info!("Starting Roster API");

    // Initialize components
    let verifier = JwksVerifier::new(&config.identity).await?;
    let store = UserStore::new(&config.database.url)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = Arc::new(AppState {
        config,
        verifier,
        store,
    });

    let app = app(state);

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
