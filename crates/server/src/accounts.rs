//! Accounts API endpoints.

use api_types::{
    account::{AccountList, AccountNew, AccountView},
    entry::{EntryList, EntryView},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    ServerError,
    server::ServerState,
    views::{account_view, engine_currency, entry_view},
};

const MIN_PAGE_SIZE: u64 = 5;
const MAX_PAGE_SIZE: u64 = 10;

/// Turn a 1-based page into `(offset, limit)`.
fn page_bounds(page_id: u64, page_size: u64) -> Result<(u64, u64), ServerError> {
    if page_id == 0 {
        return Err(ServerError::Generic("page_id must be >= 1".to_string()));
    }
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ServerError::Generic(format!(
            "page_size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"
        )));
    }
    let offset = (page_id - 1)
        .checked_mul(page_size)
        .ok_or_else(|| ServerError::Generic("page_id too large".to_string()))?;
    Ok((offset, page_size))
}

fn account_id(id: i64) -> Result<i64, ServerError> {
    if id < 1 {
        return Err(ServerError::Generic("id must be >= 1".to_string()));
    }
    Ok(id)
}

pub async fn account_new(
    State(state): State<ServerState>,
    payload: Result<Json<AccountNew>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let Json(payload) = payload?;
    let account = state
        .engine
        .create_account(&payload.owner, engine_currency(payload.currency))
        .await?;

    Ok((StatusCode::CREATED, Json(account_view(account))))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AccountView>, ServerError> {
    let Path(id) = id?;
    let account = state.engine.account(account_id(id)?).await?;
    Ok(Json(account_view(account)))
}

pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<AccountList>, QueryRejection>,
) -> Result<Json<Vec<AccountView>>, ServerError> {
    let Query(query) = query?;
    let (offset, limit) = page_bounds(query.page_id, query.page_size)?;
    let accounts = state.engine.list_accounts(offset, limit).await?;
    Ok(Json(accounts.into_iter().map(account_view).collect()))
}

pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ServerError> {
    let Path(id) = id?;
    state.engine.delete_account(account_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn entries(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<EntryList>, QueryRejection>,
) -> Result<Json<Vec<EntryView>>, ServerError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let id = account_id(id)?;
    let (offset, limit) = page_bounds(
        query.page_id.unwrap_or(1),
        query.page_size.unwrap_or(MAX_PAGE_SIZE),
    )?;
    // Unknown accounts are a 404, not an empty page.
    state.engine.account(id).await?;
    let entries = state.engine.list_entries(id, offset, limit).await?;
    Ok(Json(entries.into_iter().map(entry_view).collect()))
}
