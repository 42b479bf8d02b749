//! Pure mapping from the raw ledger tuple to the [`Will`] read model.

use chrono::{DateTime, Utc};
use ethers::types::Address;

use super::{format_address, format_h256, RawWillRecord, Will, WillDeadline, WillStatus};

/// Format a raw record into the canonical view model. `now` is injected so
/// the derived `deadline_passed` flag is deterministic under test.
pub fn format_will(
    record: &RawWillRecord,
    owner: Option<Address>,
    record_id: u64,
    now: u64,
) -> Will {
    Will {
        record_id,
        owner: owner.as_ref().map(format_address),
        deadline: WillDeadline {
            timestamp: record.deadline,
            date: iso_date(record.deadline),
        },
        triggered: record.triggered,
        executed: record.executed,
        nominees: record.nominees.iter().map(format_address).collect(),
        encrypted_hash: format_h256(&record.encrypted_hash),
        decrypted_hash: format_h256(&record.decrypted_hash),
        status: WillStatus {
            is_active: !record.triggered && !record.executed,
            is_triggered: record.triggered,
            is_executed: record.executed,
            deadline_passed: now > record.deadline,
        },
    }
}

fn iso_date(timestamp: u64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
        .map(|date| date.to_rfc3339())
        .unwrap_or_default()
}
