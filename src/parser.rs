//! Parser for the upstream listing batch envelope.

use anyhow::{Result, bail};
use serde_json::Value;

use crate::listing::RawListing;

/// Decodes a batch response from the listing API into raw records.
///
/// The envelope must carry `success: true` and an `inmuebles` array;
/// anything else is a batch-level error and no records are produced.
/// Individual array elements that are not objects are skipped — per-record
/// problems are the normalizer's concern, not the parser's.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON, the success flag is missing
/// or false, or the listings field is not an array.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<RawListing>> {
    let envelope: Value = serde_json::from_slice(bytes)?;

    if envelope["success"].as_bool() != Some(true) {
        bail!("upstream response did not report success");
    }

    let Some(items) = envelope["inmuebles"].as_array() else {
        bail!("upstream response has no listing array");
    };

    let records = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();

    Ok(records)
}
