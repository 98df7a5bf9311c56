//! Reassembly of received units into the original file bytes.
//!
//! There is no checksum on the wire: a unit whose payload was corrupted
//! but still decodes as base64 is assembled as-is. Only completeness is
//! checked here.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Indices in `0..total_chunks` that have no unit, ascending.
#[must_use]
pub fn missing_indices(units: &BTreeMap<u32, Vec<u8>>, total_chunks: u32) -> Vec<u32> {
    missing_iter(units, total_chunks).collect()
}

/// Lazy form of [`missing_indices`], for callers that only show a few.
pub fn missing_iter(
    units: &BTreeMap<u32, Vec<u8>>,
    total_chunks: u32,
) -> impl Iterator<Item = u32> + '_ {
    (0..total_chunks).filter(move |index| !units.contains_key(index))
}

/// Concatenate units `0..total_chunks` in index order.
///
/// Units outside the range are ignored. Calling this twice on the same
/// map yields identical bytes.
///
/// # Errors
///
/// Returns [`Error::MissingUnits`] listing every absent index if any unit
/// in range is missing. Nothing is returned partially.
pub fn assemble(units: &BTreeMap<u32, Vec<u8>>, total_chunks: u32) -> Result<Vec<u8>> {
    let missing = missing_indices(units, total_chunks);
    if !missing.is_empty() {
        return Err(Error::MissingUnits { missing });
    }

    let total_len = units.range(..total_chunks).map(|(_, unit)| unit.len()).sum();
    let mut out = Vec::with_capacity(total_len);
    for (_, unit) in units.range(..total_chunks) {
        out.extend_from_slice(unit);
    }

    Ok(out)
}
