//! Transfers API endpoint.

use api_types::transfer::{TransferCreated, TransferNew};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use engine::{EngineError, TransferCmd};

use crate::{
    ServerError,
    server::ServerState,
    views::{engine_currency, transfer_created},
};

pub async fn transfer_new(
    State(state): State<ServerState>,
    payload: Result<Json<TransferNew>, JsonRejection>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let Json(payload) = payload?;
    let currency = engine_currency(payload.currency);
    for id in [payload.from_account_id, payload.to_account_id] {
        let account = state.engine.account(id).await?;
        if account.currency != currency {
            return Err(EngineError::CurrencyMismatch(format!(
                "account {id} currency is {}, got {currency}",
                account.currency
            ))
            .into());
        }
    }

    let result = state
        .engine
        .transfer(TransferCmd::new(
            payload.from_account_id,
            payload.to_account_id,
            payload.amount,
        ))
        .await?;
    tracing::info!(transfer_id = result.transfer.id, "transfer created");

    Ok((StatusCode::CREATED, Json(transfer_created(result))))
}
