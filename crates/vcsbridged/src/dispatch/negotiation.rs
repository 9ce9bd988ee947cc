//! Protocol version negotiation.

use std::collections::BTreeSet;

use super::errors::NegotiationError;

/// Selects the highest version both sides support.
///
/// # Errors
///
/// Returns [`NegotiationError::Incompatible`] when the sets are disjoint.
/// There is no fallback version.
pub fn negotiate_version(
    host: &BTreeSet<u32>,
    backend: &BTreeSet<u32>,
) -> Result<u32, NegotiationError> {
    host.intersection(backend)
        .max()
        .copied()
        .ok_or_else(|| NegotiationError::Incompatible {
            host: host.iter().copied().collect(),
            backend: backend.iter().copied().collect(),
        })
}
