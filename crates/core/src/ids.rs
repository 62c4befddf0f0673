//! Asset id synthesis.
//!
//! Ids are millisecond timestamps plus a per-index stride plus a random
//! offset below the stride. Within one call every id falls into its own
//! stride-wide band, so ids are distinct even when the clock reading is
//! shared by the whole batch. Across calls collisions are possible but
//! negligible, and nothing re-checks for them.

use rand::Rng;

use crate::types::AssetId;

/// Width of the band reserved for each index in a batch.
pub const ID_STRIDE: i64 = 1000;

/// Synthesize `count` ids for one commit.
pub fn synthesize_ids<R: Rng + ?Sized>(now_ms: i64, count: usize, rng: &mut R) -> Vec<AssetId> {
    (0..count as i64)
        .map(|index| now_ms + index * ID_STRIDE + rng.random_range(0..ID_STRIDE))
        .collect()
}
