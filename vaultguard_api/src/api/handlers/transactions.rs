//! Write-path handlers: prepare an unsigned transaction and broadcast a
//! signed one.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::registry::preparer::{self, PrepareRequest, PreparedTransaction};
use crate::registry::submitter::{self, SubmissionResult};

/// `POST /api/will/prepare`
pub async fn prepare_will(
    State(state): State<AppState>,
    Json(request): Json<PrepareRequest>,
) -> Result<Json<PreparedTransaction>, ApiError> {
    let prepared = preparer::prepare(state.gateway.as_ref(), &state.config, &request).await?;

    log::info!(
        "prepared createWill transaction for {} with {} nominee(s)",
        prepared.transaction_data.to,
        prepared.parameters.nominees.len()
    );
    Ok(Json(prepared))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    pub signed_transaction: Option<String>,
}

/// `POST /api/will/broadcast`
pub async fn broadcast_will(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<SubmissionResult>), ApiError> {
    let signed = request.signed_transaction.unwrap_or_default();
    let result = submitter::submit(state.gateway.as_ref(), &signed).await?;

    log::info!(
        "broadcast confirmed: tx={}, block={:?}, record={:?}",
        result.transaction_hash,
        result.block_number,
        result.token_id
    );
    Ok((StatusCode::CREATED, Json(result)))
}
