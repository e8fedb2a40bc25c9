pub mod admin;
pub mod engine;

pub use admin::PollAdmin;
pub use engine::{ActivePollView, OptionTally, PollEngine, VoteReceipt};

use shared::{Error, Result};
use uuid::Uuid;

/// Accepted length range of a client-computed device hash.
pub const DEVICE_HASH_LEN: std::ops::RangeInclusive<usize> = 32..=128;

pub fn parse_uuid(field: &'static str, raw: &str) -> Result<Uuid> {
    raw.trim()
        .parse()
        .map_err(|_| Error::validation(field, format!("'{}' is not a valid id", raw)))
}

/// Trimmed device hash, rejected when outside [`DEVICE_HASH_LEN`].
pub fn validate_device_hash(raw: &str) -> Result<&str> {
    let hash = raw.trim();
    if !DEVICE_HASH_LEN.contains(&hash.chars().count()) {
        return Err(Error::validation(
            "deviceIdHash",
            format!(
                "must be {} to {} characters",
                DEVICE_HASH_LEN.start(),
                DEVICE_HASH_LEN.end()
            ),
        ));
    }
    Ok(hash)
}
