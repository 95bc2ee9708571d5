//! Tablet allocation for a single daily dose.
//!
//! The allocator walks the available strengths largest-first and greedily
//! assigns tablet counts at half-tablet granularity (configurable). It is a
//! pure function: no state is kept between calls, and malformed inputs are
//! clamped rather than rejected.

use crate::types::{AllocationResult, TabletPortion, DEFAULT_GRANULARITY};

/// Allocate tablets for a requested dose at half-tablet granularity.
///
/// Strengths must be deduplicated and sorted descending (see
/// [`crate::normalize_strengths`]); the greedy walk depends on that order
/// to prefer larger tablets and minimize pill count.
///
/// The allocation never overshoots: counts are rounded down, so the sum of
/// allocated milligrams is always <= the requested dose, and the shortfall
/// is reported in `remainder_mg`. An unreachable dose is not an error;
/// the caller decides whether the remainder warrants a warning.
pub fn allocate(requested_dose_mg: f64, strengths: &[f64]) -> AllocationResult {
    allocate_with_granularity(requested_dose_mg, strengths, DEFAULT_GRANULARITY)
}

/// Allocate with an explicit tablet-count granularity (e.g., 0.25 for
/// quarter tablets). Non-positive granularity falls back to half tablets.
pub fn allocate_with_granularity(
    requested_dose_mg: f64,
    strengths: &[f64],
    granularity: f64,
) -> AllocationResult {
    let granularity = if granularity > 0.0 {
        granularity
    } else {
        DEFAULT_GRANULARITY
    };

    let mut remaining = requested_dose_mg.max(0.0);
    let mut tablets = Vec::with_capacity(strengths.len());

    for &strength in strengths {
        // Round down to the nearest granularity multiple, clamped at zero.
        // Rounding down is deliberate: never exceed the requested dose.
        // A non-positive strength (callers should have normalized it away)
        // contributes nothing rather than poisoning the arithmetic.
        let count = if strength > 0.0 {
            let raw = remaining / strength;
            ((raw / granularity).floor() * granularity).max(0.0)
        } else {
            0.0
        };

        remaining = round_mg(remaining - count * strength);

        tracing::debug!(
            "Allocated {} x {} mg, {} mg remaining",
            count,
            strength,
            remaining
        );

        tablets.push(TabletPortion {
            strength_mg: strength,
            count,
        });
    }

    AllocationResult {
        tablets,
        remainder_mg: remaining,
    }
}

/// Round to 2 decimal places to suppress floating-point drift between
/// successive subtractions.
pub(crate) fn round_mg(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
