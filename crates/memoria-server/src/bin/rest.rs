//! memoria-rest: the multi-user HTTP binary. Unlike `memoria-mcp`, the
//! owner id for every request is resolved from its JWT, not fixed at
//! startup.

use std::net::SocketAddr;

use memoria_core::Config;
use memoria_server::{rest, startup};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    startup::init_logging();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let port = config.rest_port;
    let jwt_secret = config.auth.jwt_secret.clone();
    let token_ttl_seconds = config.auth.token_ttl_seconds;

    let engine = match startup::build_engine(config).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to initialize memory engine: {e}");
            std::process::exit(1);
        }
    };
    startup::spawn_reindex_worker(engine.clone());

    let app = rest::build_router(engine, jwt_secret, token_ttl_seconds);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("memoria-rest listening on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
