use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{accounts, transfers};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/accounts", post(accounts::account_new).get(accounts::list))
        .route(
            "/accounts/{id}",
            get(accounts::get).delete(accounts::delete),
        )
        .route("/accounts/{id}/entries", get(accounts::entries))
        .route("/transfers", post(transfers::transfer_new))
        .with_state(state)
}

/// Build the HTTP application over `engine`.
pub fn app(engine: Engine) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
    })
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}
