#![forbid(unsafe_code)]

//! Core domain model and business logic for the Taperplan system.
//!
//! This crate provides:
//! - Domain types (strengths, allocations, taper steps, schedules)
//! - Greedy tablet allocation at half-tablet granularity
//! - Auto-taper sequence generation
//! - Day-by-day schedule expansion
//! - Drug catalog, configuration, and CSV/JSON export

pub mod types;
pub mod error;
pub mod allocator;
pub mod sequencer;
pub mod schedule;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use allocator::{allocate, allocate_with_granularity};
pub use sequencer::{generate, generate_with_granularity, MAX_TAPER_STEPS};
pub use schedule::{build_schedule, expand_schedule};
pub use catalog::{build_default_catalog, get_default_catalog, Catalog, Drug};
pub use config::Config;
pub use export::{format_tablets, write_schedule_csv, write_schedule_json};
