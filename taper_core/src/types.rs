//! Core domain types for the Taperplan system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Tablet portions and allocation results
//! - Taper configuration and reduction modes
//! - Taper steps and sequence results
//! - Expanded day rows and the exported schedule envelope

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milligram tolerance used when comparing doses and deduplicating strengths.
///
/// Two quantities closer than this are treated as equal; a remainder below
/// this is treated as fully allocated.
pub const DOSE_TOLERANCE_MG: f64 = 0.01;

/// Default tablet-count granularity: half tablets.
pub const DEFAULT_GRANULARITY: f64 = 0.5;

/// Default dosing frequency shown on every step unless overridden.
pub const DEFAULT_FREQUENCY_LABEL: &str = "Once daily";

// ============================================================================
// Allocation Types
// ============================================================================

/// A count of tablets at one strength (e.g., 1.5 x 5 mg).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabletPortion {
    pub strength_mg: f64,
    pub count: f64,
}

impl TabletPortion {
    /// Milligrams contributed by this portion.
    pub fn dose_mg(&self) -> f64 {
        self.strength_mg * self.count
    }
}

/// Result of allocating a requested dose across available strengths.
///
/// Portions are ordered largest strength first, matching the order the
/// allocator walked. The remainder is the part of the requested dose that
/// could not be expressed at the allocation granularity; it is never
/// negative (the allocator never overshoots).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub tablets: Vec<TabletPortion>,
    pub remainder_mg: f64,
}

impl AllocationResult {
    /// Total milligrams actually covered by the allocated tablets.
    pub fn allocated_mg(&self) -> f64 {
        self.tablets.iter().map(TabletPortion::dose_mg).sum()
    }

    /// Total number of tablets across all strengths.
    pub fn tablet_total(&self) -> f64 {
        self.tablets.iter().map(|p| p.count).sum()
    }

    /// Whether the requested dose was fully expressed, within tolerance.
    pub fn is_exact(&self) -> bool {
        self.remainder_mg < DOSE_TOLERANCE_MG
    }
}

// ============================================================================
// Taper Configuration
// ============================================================================

/// How the daily dose decreases between taper steps.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReductionMode {
    /// Reduce by a fixed number of milligrams per step.
    ByMilligram,
    /// Reduce by a number of tablets of one chosen strength per step.
    ByTabletCount,
}

/// Parameters for generating an automatic taper.
///
/// Constructed fresh by the caller before each generation; the sequencer
/// never mutates it. Out-of-range values are clamped to safe defaults at
/// generation time rather than rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AutoTaperConfig {
    pub start_dose_mg: f64,
    pub step_days: u32,
    pub reduction_mode: ReductionMode,
    pub step_milligram: f64,
    pub step_strength_mg: f64,
    pub step_tablet_count: f64,
    pub frequency_label: String,
}

impl Default for AutoTaperConfig {
    fn default() -> Self {
        Self {
            start_dose_mg: 0.0,
            step_days: 1,
            reduction_mode: ReductionMode::ByMilligram,
            step_milligram: 0.0,
            step_strength_mg: 0.0,
            step_tablet_count: 0.0,
            frequency_label: DEFAULT_FREQUENCY_LABEL.to_string(),
        }
    }
}

impl AutoTaperConfig {
    /// The per-step dose decrement implied by the reduction mode.
    ///
    /// Negative inputs clamp to zero; a zero decrement is allowed here and
    /// handled by the sequencer's iteration cap.
    pub fn decrement_mg(&self) -> f64 {
        match self.reduction_mode {
            ReductionMode::ByMilligram => self.step_milligram.max(0.0),
            ReductionMode::ByTabletCount => {
                self.step_strength_mg.max(0.0) * self.step_tablet_count.max(0.0)
            }
        }
    }
}

// ============================================================================
// Taper Sequence Types
// ============================================================================

/// One plateau of the taper: a contiguous block of identical daily dosing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaperStep {
    pub days: u32,
    pub tablets: Vec<TabletPortion>,
    pub frequency_label: String,
}

impl TaperStep {
    /// Milligrams taken on each day of this step.
    pub fn daily_dose_mg(&self) -> f64 {
        self.tablets.iter().map(TabletPortion::dose_mg).sum()
    }
}

/// An ordered taper, plus the remainder from the last allocation performed.
///
/// The last remainder is what callers surface as an "N mg could not be
/// allocated with the selected strengths" advisory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaperSequenceResult {
    pub steps: Vec<TaperStep>,
    pub last_remainder_mg: f64,
    /// True when the iteration cap stopped generation with dose still
    /// above zero. A taper that reaches zero in exactly the cap's worth of
    /// steps is not truncated.
    pub truncated: bool,
}

impl TaperSequenceResult {
    /// Total calendar length of the taper in days.
    pub fn total_days(&self) -> u32 {
        self.steps.iter().map(|s| s.days).sum()
    }

    /// Whether any step left dose unallocated, within tolerance.
    pub fn has_remainder(&self) -> bool {
        self.last_remainder_mg >= DOSE_TOLERANCE_MG
    }
}

// ============================================================================
// Expanded Schedule Types
// ============================================================================

/// One printable checklist row: a single calendar day of the taper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayRow {
    /// 1-based day number within the schedule.
    pub day: u32,
    pub date: NaiveDate,
    pub dose_mg: f64,
    pub tablets: Vec<TabletPortion>,
    pub frequency_label: String,
}

/// A fully expanded schedule, ready for display or export.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Catalog drug id, when the schedule was built from one.
    pub drug: Option<String>,
    pub rows: Vec<DayRow>,
}

// ============================================================================
// Strength List Normalization
// ============================================================================

/// Normalize a list of tablet strengths for allocation.
///
/// Drops non-positive entries, sorts descending (largest first), and
/// deduplicates within [`DOSE_TOLERANCE_MG`], keeping the largest of each
/// near-duplicate run. The allocator depends on the descending order for
/// greedy correctness; callers run this before invoking the core.
pub fn normalize_strengths(mut strengths: Vec<f64>) -> Vec<f64> {
    strengths.retain(|s| *s > 0.0);
    strengths.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    strengths.dedup_by(|a, b| (*a - *b).abs() < DOSE_TOLERANCE_MG);
    strengths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sorts_descending() {
        let strengths = normalize_strengths(vec![5.0, 25.0, 1.0]);
        assert_eq!(strengths, vec![25.0, 5.0, 1.0]);
    }

    #[test]
    fn test_normalize_dedupes_and_drops_nonpositive() {
        // Near-duplicates within tolerance collapse to the first (largest)
        // representative after the descending sort.
        let strengths = normalize_strengths(vec![5.0, 5.0, 0.0, -2.0, 5.001]);
        assert_eq!(strengths, vec![5.001]);
    }

    #[test]
    fn test_decrement_by_milligram() {
        let config = AutoTaperConfig {
            step_milligram: 2.5,
            ..Default::default()
        };
        assert_eq!(config.decrement_mg(), 2.5);
    }

    #[test]
    fn test_decrement_by_tablet_count() {
        let config = AutoTaperConfig {
            reduction_mode: ReductionMode::ByTabletCount,
            step_strength_mg: 5.0,
            step_tablet_count: 0.5,
            ..Default::default()
        };
        assert_eq!(config.decrement_mg(), 2.5);
    }

    #[test]
    fn test_decrement_clamps_negative_inputs() {
        let config = AutoTaperConfig {
            step_milligram: -5.0,
            ..Default::default()
        };
        assert_eq!(config.decrement_mg(), 0.0);
    }

    #[test]
    fn test_step_daily_dose() {
        let step = TaperStep {
            days: 3,
            tablets: vec![
                TabletPortion {
                    strength_mg: 10.0,
                    count: 1.0,
                },
                TabletPortion {
                    strength_mg: 5.0,
                    count: 0.5,
                },
            ],
            frequency_label: DEFAULT_FREQUENCY_LABEL.into(),
        };
        assert!((step.daily_dose_mg() - 12.5).abs() < DOSE_TOLERANCE_MG);
    }
}
