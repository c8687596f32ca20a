//! Batch sizing for chunked imports.
//!
//! Larger histories get proportionally larger batches: yielding between
//! batches keeps the host responsive, but every yield costs a scheduler round
//! trip, so the batch count is kept roughly constant as imports grow.

/// Smallest batch used for imports under [`MEDIUM_IMPORT_THRESHOLD`].
pub const MIN_BATCH_SIZE: usize = 10_000;

/// Imports at or above this size use 15% batches.
pub const MEDIUM_IMPORT_THRESHOLD: usize = 100_000;

/// Imports above this size use 20% batches.
pub const LARGE_IMPORT_THRESHOLD: usize = 200_000;

/// Compute the batch size for an import of `total` records.
///
/// - under 100,000: 10% of `total`, never below [`MIN_BATCH_SIZE`]
/// - 100,000 to 200,000 inclusive: 15%
/// - above 200,000: 20%
pub fn batch_size_for(total: usize) -> usize {
    if total < MEDIUM_IMPORT_THRESHOLD {
        (total / 10).max(MIN_BATCH_SIZE)
    } else if total <= LARGE_IMPORT_THRESHOLD {
        total * 15 / 100
    } else {
        total / 5
    }
}
