use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::borrow::Cow;
use std::path::PathBuf;
use taper_core::*;

#[derive(Parser)]
#[command(name = "taperplan")]
#[command(about = "Taper schedule builder for step-down medication dosing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a taper schedule and print the day-by-day checklist
    Plan {
        /// Catalog drug id (see `taperplan drugs`)
        #[arg(long, conflicts_with = "strengths")]
        drug: Option<String>,

        /// Comma-separated tablet strengths in mg, e.g. "25,5,1"
        #[arg(long)]
        strengths: Option<String>,

        /// Starting daily dose in mg
        #[arg(long)]
        start_dose: f64,

        /// Days per taper step (defaults from config)
        #[arg(long)]
        step_days: Option<u32>,

        /// Reduce by this many mg per step
        #[arg(long, conflicts_with = "reduce_tablets")]
        reduce_mg: Option<f64>,

        /// Reduce by tablets of one strength per step, e.g. "5x0.5"
        #[arg(long)]
        reduce_tablets: Option<String>,

        /// First day of the schedule (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Write the checklist to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the full schedule to a JSON file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show the tablet breakdown for a single dose
    Allocate {
        /// Dose in mg
        #[arg(long)]
        dose: f64,

        /// Catalog drug id
        #[arg(long, conflicts_with = "strengths")]
        drug: Option<String>,

        /// Comma-separated tablet strengths in mg
        #[arg(long)]
        strengths: Option<String>,
    },

    /// List available drugs and their tablet strengths
    Drugs,
}

fn main() -> Result<()> {
    // Initialize logging
    taper_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Plan {
            drug,
            strengths,
            start_dose,
            step_days,
            reduce_mg,
            reduce_tablets,
            start_date,
            csv,
            json,
        } => cmd_plan(
            &config,
            drug,
            strengths,
            start_dose,
            step_days,
            reduce_mg,
            reduce_tablets,
            start_date,
            csv,
            json,
        ),
        Commands::Allocate {
            dose,
            drug,
            strengths,
        } => cmd_allocate(&config, dose, drug, strengths),
        Commands::Drugs => cmd_drugs(&config),
    }
}

/// Built-in catalog, with any configured custom drugs merged over it. With
/// no custom entries this borrows the cached default instance.
fn load_catalog(config: &Config) -> Cow<'static, Catalog> {
    if config.drugs.custom.is_empty() {
        Cow::Borrowed(get_default_catalog())
    } else {
        Cow::Owned(build_default_catalog().with_custom_drugs(&config.drugs.custom))
    }
}

/// Resolve the strength list from either a catalog drug or an explicit
/// comma-separated list. Returns the normalized strengths plus the catalog
/// entry when one was used.
fn resolve_strengths(
    config: &Config,
    drug: Option<&str>,
    strengths: Option<&str>,
) -> Result<(Vec<f64>, Option<Drug>)> {
    if let Some(id) = drug {
        let catalog = load_catalog(config);
        let errors = catalog.validate();
        if !errors.is_empty() {
            for error in &errors {
                eprintln!("Catalog error: {}", error);
            }
            return Err(Error::CatalogValidation("Invalid catalog".into()));
        }

        let entry = catalog.drug(id).ok_or_else(|| {
            Error::Config(format!(
                "Unknown drug '{}'. Run `taperplan drugs` to list available drugs.",
                id
            ))
        })?;
        return Ok((entry.strengths_mg.clone(), Some(entry.clone())));
    }

    let raw = strengths.ok_or_else(|| {
        Error::Config("Provide either --drug or --strengths".into())
    })?;
    let parsed = parse_strengths(raw)?;
    Ok((normalize_strengths(parsed), None))
}

fn parse_strengths(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| Error::Config(format!("Invalid strength '{}' in --strengths", s)))
        })
        .collect()
}

/// Parse a "STRENGTHxCOUNT" reduction, e.g. "5x0.5" for half a 5 mg tablet.
fn parse_reduce_tablets(raw: &str) -> Result<(f64, f64)> {
    let (strength, count) = raw.split_once(['x', 'X']).ok_or_else(|| {
        Error::Config(format!(
            "Invalid --reduce-tablets '{}': expected STRENGTHxCOUNT, e.g. 5x0.5",
            raw
        ))
    })?;

    let strength = strength.trim().parse::<f64>().map_err(|_| {
        Error::Config(format!("Invalid strength in --reduce-tablets '{}'", raw))
    })?;
    let count = count.trim().parse::<f64>().map_err(|_| {
        Error::Config(format!("Invalid count in --reduce-tablets '{}'", raw))
    })?;

    Ok((strength, count))
}

#[allow(clippy::too_many_arguments)]
fn cmd_plan(
    config: &Config,
    drug: Option<String>,
    strengths: Option<String>,
    start_dose: f64,
    step_days: Option<u32>,
    reduce_mg: Option<f64>,
    reduce_tablets: Option<String>,
    start_date: Option<NaiveDate>,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
) -> Result<()> {
    let (strength_list, drug_entry) =
        resolve_strengths(config, drug.as_deref(), strengths.as_deref())?;

    let (reduction_mode, step_milligram, step_strength_mg, step_tablet_count) =
        match &reduce_tablets {
            Some(raw) => {
                let (strength, count) = parse_reduce_tablets(raw)?;
                (ReductionMode::ByTabletCount, 0.0, strength, count)
            }
            None => (
                ReductionMode::ByMilligram,
                reduce_mg.unwrap_or(0.0),
                0.0,
                0.0,
            ),
        };

    let frequency_label = drug_entry
        .as_ref()
        .map(|d| d.frequency_label.clone())
        .unwrap_or_else(|| config.schedule.frequency_label.clone());

    let taper = AutoTaperConfig {
        start_dose_mg: start_dose,
        step_days: step_days.unwrap_or(config.schedule.default_step_days),
        reduction_mode,
        step_milligram,
        step_strength_mg,
        step_tablet_count,
        frequency_label,
    };

    let result = generate_with_granularity(&taper, &strength_list, config.allocation.granularity);

    if result.steps.is_empty() {
        println!("No taper steps generated (start dose is zero).");
        return Ok(());
    }

    let start = start_date.unwrap_or_else(|| Local::now().date_naive());
    let schedule = build_schedule(&result, start, drug_entry.as_ref().map(|d| d.id.clone()));

    display_plan(&taper, &result, &schedule, drug_entry.as_ref(), &strength_list);

    if result.has_remainder() {
        println!();
        println!(
            "⚠ {} mg of the final dose could not be allocated with the selected strengths.",
            result.last_remainder_mg
        );
    }

    if result.truncated {
        println!();
        println!(
            "⚠ Schedule truncated at {} steps; the configured reduction never reaches zero.",
            MAX_TAPER_STEPS
        );
    }

    if let Some(path) = csv {
        write_schedule_csv(&path, &schedule)?;
        println!();
        println!("✓ Checklist written to {}", path.display());
    }

    if let Some(path) = json {
        write_schedule_json(&path, &schedule)?;
        println!();
        println!("✓ Schedule written to {}", path.display());
    }

    Ok(())
}

fn display_plan(
    taper: &AutoTaperConfig,
    result: &TaperSequenceResult,
    schedule: &Schedule,
    drug: Option<&Drug>,
    strengths: &[f64],
) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  TAPER SCHEDULE");
    println!("╰─────────────────────────────────────────╯");
    println!();

    match drug {
        Some(d) => println!("  {}", d.name),
        None => {
            let list: Vec<String> = strengths.iter().map(|s| format!("{}", s)).collect();
            println!("  Custom strengths: {} mg", list.join(", "));
        }
    }

    let decrement = taper.decrement_mg();
    println!(
        "  Start: {} mg, reducing by {} mg every {} day(s)",
        taper.start_dose_mg.max(0.0),
        decrement,
        taper.step_days.max(1)
    );
    println!(
        "  Total: {} day(s) over {} step(s)",
        result.total_days(),
        result.steps.len()
    );

    if let Some(notes) = drug.and_then(|d| d.notes.as_deref()) {
        println!("  Note: {}", notes);
    }

    println!();
    for (i, step) in result.steps.iter().enumerate() {
        println!(
            "  Step {}: {} mg for {} day(s) → {} ({})",
            i + 1,
            step.daily_dose_mg(),
            step.days,
            format_tablets(&step.tablets),
            step.frequency_label
        );
    }

    println!();
    println!("  {:>4}  {:<12} {:>8}  Tablets", "Day", "Date", "Dose");
    for row in &schedule.rows {
        println!(
            "  {:>4}  {:<12} {:>5} mg  {}",
            row.day,
            row.date.to_string(),
            row.dose_mg,
            format_tablets(&row.tablets)
        );
    }
}

fn cmd_allocate(
    config: &Config,
    dose: f64,
    drug: Option<String>,
    strengths: Option<String>,
) -> Result<()> {
    let (strength_list, drug_entry) =
        resolve_strengths(config, drug.as_deref(), strengths.as_deref())?;

    let result = allocate_with_granularity(dose, &strength_list, config.allocation.granularity);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  DOSE BREAKDOWN");
    println!("╰─────────────────────────────────────────╯");
    println!();
    if let Some(d) = &drug_entry {
        println!("  {}", d.name);
    }
    println!("  Requested: {} mg", dose.max(0.0));
    println!();

    for portion in &result.tablets {
        println!(
            "  → {} x {} mg tablet(s)",
            portion.count, portion.strength_mg
        );
    }

    println!();
    println!("  Allocated: {} mg", result.allocated_mg());
    if !result.is_exact() {
        println!(
            "  ⚠ Unallocated: {} mg (not expressible at the current granularity)",
            result.remainder_mg
        );
    }

    Ok(())
}

fn cmd_drugs(config: &Config) -> Result<()> {
    let catalog = load_catalog(config);

    let mut drugs: Vec<&Drug> = catalog.drugs.values().collect();
    drugs.sort_by(|a, b| a.id.cmp(&b.id));

    println!("\nAvailable drugs:");
    println!();
    for drug in drugs {
        let strengths: Vec<String> = drug
            .strengths_mg
            .iter()
            .map(|s| format!("{}", s))
            .collect();
        println!("  {:<16} {}: {} mg", drug.id, drug.name, strengths.join(", "));
    }
    println!();

    Ok(())
}
