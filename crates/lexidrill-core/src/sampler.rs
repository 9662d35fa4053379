//! Proficiency-weighted entry selection.
//!
//! Each entry is drawn with probability proportional to
//! `6 - proficiency_level`, so a level-1 entry comes up five times as often
//! as a level-5 one. The draw is a single uniform integer in
//! `[0, total_weight)` located with a binary search over cumulative weights.

use rand::Rng;

use crate::error::DrillError;
use crate::model::Entry;

/// Pick one entry, weighted towards the least mastered.
pub fn sample<'a, R: Rng>(entries: &'a [Entry], rng: &mut R) -> Result<&'a Entry, DrillError> {
    if entries.is_empty() {
        return Err(DrillError::EmptyInput);
    }

    let mut cumulative = Vec::with_capacity(entries.len());
    let mut total: u64 = 0;
    for entry in entries {
        total += u64::from(entry.proficiency_level.weight());
        cumulative.push(total);
    }

    let ticket = rng.random_range(0..total);
    // First entry whose running total exceeds the ticket.
    let index = cumulative.partition_point(|&upper| upper <= ticket);
    Ok(&entries[index])
}

/// Probability that `sample` picks the entry at each index.
pub fn selection_probabilities(entries: &[Entry]) -> Vec<f64> {
    let total: u32 = entries.iter().map(|e| e.proficiency_level.weight()).sum();
    if total == 0 {
        return Vec::new();
    }
    entries
        .iter()
        .map(|e| f64::from(e.proficiency_level.weight()) / f64::from(total))
        .collect()
}
