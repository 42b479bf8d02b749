//! Request validation utilities for the HTTP surface.
//!
//! Address and pagination rules live with the registry components (they must
//! hold regardless of transport); what remains here is validation of raw path
//! and body material before it reaches them.

use super::errors::ApiError;

/// Parse a record id path segment. The id must be purely numeric; anything
/// else is a client error, reported before any ledger call.
pub fn parse_record_id(raw: &str) -> Result<u64, ApiError> {
    raw.trim().parse::<u64>().map_err(|_| {
        ApiError::bad_request("Invalid token ID. Please provide a valid numeric token ID.")
    })
}
