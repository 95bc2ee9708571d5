//! Auto-taper generation.
//!
//! The sequencer drives the allocator across a sequence of decreasing daily
//! doses, emitting one [`TaperStep`] per plateau until the dose reaches
//! zero or the safety cap is hit.
//!
//! ## Generation rules
//!
//! 1. Clamp the start dose to >= 0 and step length to >= 1 day.
//! 2. Compute the per-step decrement once, from the reduction mode.
//! 3. Each pass: allocate the current dose, emit a step, subtract the
//!    decrement (floored at zero), repeat.
//! 4. Stop when the dose reaches zero, or after [`MAX_TAPER_STEPS`] passes.
//!
//! The component never returns an error: malformed inputs are clamped, an
//! unreachable dose shows up as the recorded remainder, and a zero
//! decrement is bounded by the cap rather than rejected.

use crate::allocator;
use crate::types::{AutoTaperConfig, TaperSequenceResult, TaperStep, DEFAULT_GRANULARITY};

/// Safety cap on generated steps.
///
/// Guarantees termination even for a zero decrement; hitting the cap
/// silently truncates the sequence.
pub const MAX_TAPER_STEPS: usize = 200;

/// Generate a taper sequence from the configured parameters.
///
/// `strengths` must be normalized (descending, deduplicated); see
/// [`crate::normalize_strengths`]. The list is read-only and nothing is
/// kept between calls.
pub fn generate(config: &AutoTaperConfig, strengths: &[f64]) -> TaperSequenceResult {
    generate_with_granularity(config, strengths, DEFAULT_GRANULARITY)
}

/// Generate with an explicit tablet-count granularity, forwarded to the
/// allocator for each step.
pub fn generate_with_granularity(
    config: &AutoTaperConfig,
    strengths: &[f64],
    granularity: f64,
) -> TaperSequenceResult {
    let mut dose = config.start_dose_mg.max(0.0);
    let step_days = config.step_days.max(1);
    let decrement = config.decrement_mg();

    tracing::debug!(
        "Generating taper: start {} mg, {} day steps, decrement {} mg",
        dose,
        step_days,
        decrement
    );

    let mut steps = Vec::new();
    let mut last_remainder = 0.0;

    while dose > 0.0 && steps.len() < MAX_TAPER_STEPS {
        let allocation = allocator::allocate_with_granularity(dose, strengths, granularity);
        last_remainder = allocation.remainder_mg;

        steps.push(TaperStep {
            days: step_days,
            tablets: allocation.tablets,
            frequency_label: config.frequency_label.clone(),
        });

        dose = round_down_dose(dose - decrement);
    }

    let truncated = dose > 0.0;
    if truncated {
        tracing::warn!(
            "Taper truncated at {} steps with {} mg still to taper",
            MAX_TAPER_STEPS,
            dose
        );
    }

    tracing::debug!(
        "Generated {} steps, last remainder {} mg",
        steps.len(),
        last_remainder
    );

    TaperSequenceResult {
        steps,
        last_remainder_mg: last_remainder,
        truncated,
    }
}

/// Floor at zero and round to 2 decimals so a decrement like 2.1 does not
/// leave the loop chasing float dust above zero.
fn round_down_dose(dose: f64) -> f64 {
    ((dose.max(0.0)) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReductionMode, DOSE_TOLERANCE_MG};

    fn mg_taper(start: f64, step_days: u32, step_mg: f64) -> AutoTaperConfig {
        AutoTaperConfig {
            start_dose_mg: start,
            step_days,
            reduction_mode: ReductionMode::ByMilligram,
            step_milligram: step_mg,
            ..Default::default()
        }
    }

    fn doses(result: &TaperSequenceResult) -> Vec<f64> {
        result.steps.iter().map(TaperStep::daily_dose_mg).collect()
    }

    #[test]
    fn test_simple_milligram_taper() {
        let config = mg_taper(15.0, 3, 5.0);
        let result = generate(&config, &[10.0, 5.0]);

        assert_eq!(result.steps.len(), 3);
        assert_eq!(doses(&result), vec![15.0, 10.0, 5.0]);
        for step in &result.steps {
            assert_eq!(step.days, 3);
            assert_eq!(step.frequency_label, "Once daily");
        }
        assert_eq!(result.last_remainder_mg, 0.0);
        assert_eq!(result.total_days(), 9);
    }

    #[test]
    fn test_tablet_count_reduction() {
        let config = AutoTaperConfig {
            start_dose_mg: 20.0,
            step_days: 7,
            reduction_mode: ReductionMode::ByTabletCount,
            step_strength_mg: 5.0,
            step_tablet_count: 1.0,
            ..Default::default()
        };
        let result = generate(&config, &[5.0]);

        assert_eq!(doses(&result), vec![20.0, 15.0, 10.0, 5.0]);
    }

    #[test]
    fn test_zero_start_dose_yields_empty_sequence() {
        let config = mg_taper(0.0, 3, 5.0);
        let result = generate(&config, &[5.0]);

        assert!(result.steps.is_empty());
        assert_eq!(result.last_remainder_mg, 0.0);
    }

    #[test]
    fn test_negative_start_dose_clamps() {
        let config = mg_taper(-10.0, 3, 5.0);
        let result = generate(&config, &[5.0]);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_zero_step_days_clamps_to_one() {
        let config = mg_taper(10.0, 0, 5.0);
        let result = generate(&config, &[5.0]);
        assert!(result.steps.iter().all(|s| s.days == 1));
    }

    #[test]
    fn test_zero_decrement_hits_cap() {
        let config = mg_taper(10.0, 1, 0.0);
        let result = generate(&config, &[5.0]);

        assert_eq!(result.steps.len(), MAX_TAPER_STEPS);
        assert!(result.truncated);
        // Every step is the same un-reduced dose.
        assert!(doses(&result).iter().all(|d| (*d - 10.0).abs() < DOSE_TOLERANCE_MG));
    }

    #[test]
    fn test_taper_ending_exactly_at_cap_is_not_truncated() {
        // 1000 mg reduced by 5 mg reaches zero in exactly 200 steps.
        let config = mg_taper(1000.0, 1, 5.0);
        let result = generate(&config, &[5.0]);

        assert_eq!(result.steps.len(), MAX_TAPER_STEPS);
        assert!(!result.truncated);
    }

    #[test]
    fn test_short_taper_is_not_truncated() {
        let config = mg_taper(15.0, 3, 5.0);
        let result = generate(&config, &[5.0]);
        assert!(!result.truncated);
    }

    #[test]
    fn test_monotonic_dose_decrease() {
        let config = mg_taper(50.0, 2, 7.5);
        let result = generate(&config, &[25.0, 5.0, 1.0]);

        let doses = doses(&result);
        for pair in doses.windows(2) {
            assert!(
                pair[1] <= pair[0] + DOSE_TOLERANCE_MG,
                "dose increased between steps: {:?}",
                pair
            );
        }
    }

    #[test]
    fn test_last_remainder_recorded() {
        // Final step is 2 mg, unreachable with 5 mg tablets.
        let config = mg_taper(12.0, 1, 5.0);
        let result = generate(&config, &[5.0]);

        assert_eq!(result.steps.len(), 3); // 12, 7, 2
        assert_eq!(result.last_remainder_mg, 2.0);
        assert!(result.has_remainder());
    }

    #[test]
    fn test_decrement_overshooting_zero_stops_cleanly() {
        let config = mg_taper(10.0, 5, 15.0);
        let result = generate(&config, &[5.0]);

        assert_eq!(result.steps.len(), 1);
        assert_eq!(doses(&result), vec![10.0]);
    }

    #[test]
    fn test_generation_is_pure() {
        let config = mg_taper(25.0, 3, 5.0);
        let strengths = vec![25.0, 5.0];
        let a = generate(&config, &strengths);
        let b = generate(&config, &strengths);
        assert_eq!(a, b);
        // Input strength list is untouched.
        assert_eq!(strengths, vec![25.0, 5.0]);
    }

    #[test]
    fn test_parallel_generations_are_independent() {
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                std::thread::spawn(move || {
                    let config = mg_taper(5.0 * i as f64, 2, 5.0);
                    generate(&config, &[5.0])
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            assert_eq!(result.steps.len(), i + 1);
        }
    }
}
