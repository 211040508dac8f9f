//! Batch orchestration.
//!
//! A run turns a list of inputs into an ordered list of [`BatchResult`]s,
//! one per [`WorkItem`], calling the synthesis engine once per item and
//! never letting a single failed item stop the run.
//!
//! Two run modes share the same per-item primitive:
//!
//! - **Sequential batch** ([`BatchOrchestrator::run_batch`]): one item per
//!   non-blank input line, all using the same preset.
//! - **Comparison** ([`BatchOrchestrator::run_comparison`]): one fixed text
//!   rendered once per preset in [`COMPARISON_PRESETS`](crate::presets::COMPARISON_PRESETS).

pub mod input;
pub mod naming;
pub mod orchestrator;
pub mod report;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::presets::PresetConfig;

pub use input::{create_sample_text_file, read_text_items, SAMPLE_TEXTS};
pub use orchestrator::{BatchOrchestrator, BatchRun, ComparisonRun};
pub use report::{BatchSummary, ComparisonEntry, ComparisonReport};

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct WorkItem<'a> {
    /// 1-based position in the run.
    pub index: usize,
    pub text: String,
    pub preset: &'a PresetConfig,
    pub output_path: PathBuf,
}

/// Outcome of one work item. Created once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub index: usize,
    pub text: String,
    /// Written file, present only on success.
    pub output_file: Option<PathBuf>,
    pub success: bool,
    /// Wall-clock time spent on the item.
    #[serde(rename = "time", with = "report::duration_secs")]
    pub elapsed: Duration,
}
