//! Read-path handlers: single-record fetch and the paged listing.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::api::validation::parse_record_id;
use crate::gateway::GatewayError;
use crate::registry::formatter::format_will;
use crate::registry::scanner::{self, ScanRequest};
use crate::registry::{unix_now_secs, Will};

const DEFAULT_LIMIT: i64 = 10;

/// `GET /api/will/:token_id`
pub async fn get_will(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
) -> Result<Json<Will>, ApiError> {
    let record_id = parse_record_id(&token_id)?;

    let record = match state.gateway.fetch_record(record_id).await {
        Ok(record) => record,
        Err(GatewayError::NotFound) => {
            return Err(ApiError::not_found(
                "Will not found. The specified token ID does not exist.",
            ))
        }
        Err(err) => {
            log::error!("failed to fetch will {record_id}: {err}");
            return Err(ApiError::internal_server_error(
                "Failed to fetch will details from the blockchain",
            )
            .with_details(err.to_string()));
        }
    };

    // The owner lookup can fail independently of the record; absence is
    // reported in the view model rather than failing the request.
    let owner = match state.gateway.fetch_owner(record_id).await {
        Ok(owner) => Some(owner),
        Err(err) => {
            log::debug!("owner lookup for will {record_id} failed: {err}");
            None
        }
    };

    Ok(Json(format_will(&record, owner, record_id, unix_now_secs())))
}

#[derive(Debug, Deserialize)]
pub struct ListWillsQuery {
    pub owner: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    pub count: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ListFilters {
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListWillsResponse {
    pub wills: Vec<Will>,
    pub pagination: Pagination,
    pub filters: ListFilters,
}

/// `GET /api/wills?owner=&limit=&offset=`
pub async fn list_wills(
    State(state): State<AppState>,
    Query(query): Query<ListWillsQuery>,
) -> Result<Json<ListWillsResponse>, ApiError> {
    let request = ScanRequest {
        owner: query.owner.clone(),
        limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        offset: query.offset.unwrap_or(0),
    };

    let outcome = scanner::scan(
        state.gateway.as_ref(),
        &request,
        state.config.scan_horizon_multiplier,
        unix_now_secs(),
    )
    .await?;

    log::debug!(
        "scan examined {} identifiers, matched {}, skipped {} on probe errors",
        outcome.examined,
        outcome.wills.len(),
        outcome.probe_errors
    );

    Ok(Json(ListWillsResponse {
        pagination: Pagination {
            limit: request.limit,
            offset: request.offset,
            count: outcome.wills.len(),
            has_more: outcome.has_more,
        },
        filters: ListFilters { owner: query.owner },
        wills: outcome.wills,
    }))
}
