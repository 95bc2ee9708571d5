//! Schedule export to CSV and JSON.
//!
//! CSV gets one row per calendar day (the printable checklist shape); JSON
//! gets the full [`Schedule`] envelope including the generation id and
//! timestamp.

use crate::types::{Schedule, TabletPortion};
use crate::Result;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    day: u32,
    date: String,
    dose_mg: f64,
    tablets: String,
    frequency: String,
}

impl CsvRow {
    fn from_day(row: &crate::types::DayRow) -> Self {
        CsvRow {
            day: row.day,
            date: row.date.to_string(),
            dose_mg: row.dose_mg,
            tablets: format_tablets(&row.tablets),
            frequency: row.frequency_label.clone(),
        }
    }
}

/// Render non-zero portions as "1 x 25 mg + 0.5 x 5 mg".
pub fn format_tablets(tablets: &[TabletPortion]) -> String {
    let parts: Vec<String> = tablets
        .iter()
        .filter(|p| p.count > 0.0)
        .map(|p| format!("{} x {} mg", p.count, p.strength_mg))
        .collect();

    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" + ")
    }
}

/// Write the schedule to a CSV file, one row per day.
///
/// The file is created (parents included), written with headers, flushed,
/// and synced to disk before returning.
pub fn write_schedule_csv(path: &Path, schedule: &Schedule) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    for row in &schedule.rows {
        writer.serialize(CsvRow::from_day(row))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| crate::Error::Export(format!("Failed to finish CSV: {}", e)))?;
    file.sync_all()?;

    tracing::info!("Wrote {} day rows to {:?}", schedule.rows.len(), path);
    Ok(())
}

/// Write the full schedule envelope as pretty-printed JSON.
pub fn write_schedule_json(path: &Path, schedule: &Schedule) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = serde_json::to_string_pretty(schedule)?;
    std::fs::write(path, contents)?;

    tracing::info!("Wrote schedule {} to {:?}", schedule.id, path);
    Ok(())
}
