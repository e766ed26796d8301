// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::http::HeaderName;
use taskfocus_server::{config::Config, database, routes, state::AppState};
use tokio::time::{self, Duration};
use tower_http::cors::{Any, CorsLayer};

/// How often expired login sessions and reset tokens are dropped.
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:?}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match database::establish_connection_pool(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    match database::users::promote_staff(&db_pool, &config.admin_usernames).await {
        Ok(0) => {}
        Ok(count) => tracing::info!("Promoted {} accounts to staff.", count),
        Err(e) => tracing::error!("Failed to promote staff accounts: {:?}", e),
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(db_pool, config);

    let purge_state = state.clone(); // Clone the state for the purge task
    tokio::spawn(async move {
        let mut interval = time::interval(PURGE_INTERVAL);

        // The first tick completes immediately. Skip it to wait for the first interval.
        interval.tick().await;

        loop {
            interval.tick().await;

            let sessions = purge_state.sessions.purge_expired();
            match database::reset_tokens::purge_stale_reset_tokens(
                &purge_state.pool,
                purge_state.config.reset_token_ttl,
            )
            .await
            {
                Ok(tokens) => tracing::debug!(
                    "Purged {} login sessions and {} reset tokens.",
                    sessions,
                    tokens
                ),
                Err(e) => tracing::error!("Error while purging reset tokens: {:?}", e),
            }
        }
    });

    let app_routes = routes::create_router(state);

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    let app = app_routes.layer(cors); // Apply the CORS layer

    tracing::info!("The server listens on http://{}", bind_addr);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {:?}", bind_addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", e);
        std::process::exit(1);
    }
}
