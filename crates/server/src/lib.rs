use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

use serde::Serialize;
pub use server::{app, run_with_listener};

mod accounts;
mod server;
mod transfers;
mod views;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountList, AccountNew, AccountView};
    }

    pub mod entry {
        pub use api_types::entry::{EntryList, EntryView};
    }

    pub mod transfer {
        pub use api_types::transfer::{TransferCreated, TransferNew, TransferView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::AccountInUse(_) | EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Begin(_)
        | EngineError::Commit(_)
        | EngineError::Rollback { .. }
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidTransfer(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidPage(_)
        | EngineError::CurrencyMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Conflict(db_err) => {
            tracing::warn!("transaction conflict: {db_err}");
            "transaction conflict, retry the request".to_string()
        }
        err @ (EngineError::Begin(_)
        | EngineError::Commit(_)
        | EngineError::Rollback { .. }
        | EngineError::Database(_)) => {
            tracing::error!("database error: {err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Generic(value.body_text())
    }
}
