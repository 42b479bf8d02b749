//! Discovery scanner: reconstructs a paged listing from a ledger that only
//! offers per-identifier lookups.
//!
//! The registry exposes no index and no enumeration, so listing is a bounded
//! sequential probe over ascending identifiers. The horizon
//! (`limit * scan_horizon_multiplier`) caps the cost of a request over a
//! sparse identifier space; records sparser than the horizon allows are not
//! found. That trade-off is inherent to the read interface — the scanner sits
//! behind the [`RegistryGateway`] capability so an indexed event-log reader
//! can later replace the probing without touching the HTTP contract.

use ethers::types::Address;

use super::formatter::format_will;
use super::{parse_address, RegistryError, Will};
use crate::gateway::{GatewayError, RegistryGateway};

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;

/// Raw listing request, validated before any ledger call.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub owner: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

struct ScanParams {
    owner: Option<Address>,
    limit: usize,
    offset: u64,
}

impl ScanRequest {
    fn validate(&self) -> Result<ScanParams, RegistryError> {
        if self.limit < MIN_LIMIT || self.limit > MAX_LIMIT {
            return Err(RegistryError::InvalidArgument(format!(
                "Limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
            )));
        }
        if self.offset < 0 {
            return Err(RegistryError::InvalidArgument(
                "Offset must be zero or greater".to_string(),
            ));
        }
        let owner = match &self.owner {
            Some(raw) if !raw.trim().is_empty() => Some(parse_address(
                raw,
                format!("Invalid owner address: {raw}"),
            )?),
            _ => None,
        };
        Ok(ScanParams {
            owner,
            limit: self.limit as usize,
            offset: self.offset as u64,
        })
    }
}

/// Result of one listing request.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub wills: Vec<Will>,
    /// Heuristic: set iff the page filled completely. Signals "likely more",
    /// not "provably more".
    pub has_more: bool,
    /// Identifiers examined before the scan stopped.
    pub examined: u64,
    /// Probes that failed on a remote error and were skipped.
    pub probe_errors: u64,
}

/// Outcome of probing a single identifier.
enum ProbeOutcome {
    Found(Box<Will>),
    Absent,
    Failed(&'static str),
}

/// Scan ascending identifiers starting at `request.offset` until the page is
/// full or the horizon is exhausted. Per-identifier failures are folded into
/// counters, never surfaced as request-level errors.
pub async fn scan(
    gateway: &dyn RegistryGateway,
    request: &ScanRequest,
    horizon_multiplier: u64,
    now: u64,
) -> Result<ScanOutcome, RegistryError> {
    let params = request.validate()?;
    let horizon = params.limit as u64 * horizon_multiplier;

    let mut wills: Vec<Will> = Vec::new();
    let mut examined = 0u64;
    let mut probe_errors = 0u64;

    // Probes are strictly sequential: identifier n+1 is never examined before
    // n completes, so result order is ascending by construction.
    while wills.len() < params.limit && examined < horizon {
        let record_id = params.offset + examined;
        examined += 1;

        match probe(gateway, record_id, params.owner.as_ref(), now).await {
            ProbeOutcome::Found(will) => wills.push(*will),
            ProbeOutcome::Absent => {}
            ProbeOutcome::Failed(reason) => {
                probe_errors += 1;
                log::debug!("probe of record {record_id} skipped: {reason}");
            }
        }
    }

    let has_more = wills.len() == params.limit;
    Ok(ScanOutcome {
        wills,
        has_more,
        examined,
        probe_errors,
    })
}

async fn probe(
    gateway: &dyn RegistryGateway,
    record_id: u64,
    owner_filter: Option<&Address>,
    now: u64,
) -> ProbeOutcome {
    // Owner resolution failing in any way marks the identifier non-existent.
    let owner = match gateway.fetch_owner(record_id).await {
        Ok(owner) => owner,
        Err(GatewayError::NotFound) => return ProbeOutcome::Absent,
        Err(_) => return ProbeOutcome::Failed("owner lookup failed"),
    };

    if let Some(filter) = owner_filter {
        if owner != *filter {
            return ProbeOutcome::Absent;
        }
    }

    let record = match gateway.fetch_record(record_id).await {
        Ok(record) => record,
        Err(GatewayError::NotFound) => return ProbeOutcome::Absent,
        Err(_) => return ProbeOutcome::Failed("record fetch failed"),
    };

    if !record.is_valid_will() {
        return ProbeOutcome::Absent;
    }

    ProbeOutcome::Found(Box::new(format_will(&record, Some(owner), record_id, now)))
}
