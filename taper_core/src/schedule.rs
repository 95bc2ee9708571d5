//! Expansion of taper steps into a day-by-day checklist.
//!
//! A [`TaperSequenceResult`] is a list of plateaus; the printable checklist
//! needs one row per calendar day. This module flattens steps into dated
//! [`DayRow`]s and wraps them in a [`Schedule`] envelope for export.

use crate::types::{DayRow, Schedule, TaperSequenceResult};
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

/// Flatten taper steps into one row per calendar day, starting at
/// `start_date`. Day numbers are 1-based and dates are consecutive.
pub fn expand_schedule(result: &TaperSequenceResult, start_date: NaiveDate) -> Vec<DayRow> {
    let mut rows = Vec::with_capacity(result.total_days() as usize);
    let mut day = 1u32;

    for step in &result.steps {
        let dose = step.daily_dose_mg();
        for _ in 0..step.days {
            rows.push(DayRow {
                day,
                date: start_date + Duration::days(i64::from(day) - 1),
                dose_mg: dose,
                tablets: step.tablets.clone(),
                frequency_label: step.frequency_label.clone(),
            });
            day += 1;
        }
    }

    tracing::debug!("Expanded {} steps into {} day rows", result.steps.len(), rows.len());
    rows
}

/// Build the exportable schedule envelope around expanded day rows.
pub fn build_schedule(
    result: &TaperSequenceResult,
    start_date: NaiveDate,
    drug: Option<String>,
) -> Schedule {
    Schedule {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        drug,
        rows: expand_schedule(result, start_date),
    }
}
