use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::naming::{batch_output_path, comparison_output_path};
use super::report::{write_json, BatchSummary, ComparisonEntry, ComparisonReport};
use super::{BatchResult, WorkItem};
use crate::error::VoiceGenError;
use crate::presets::{PresetConfig, PresetRegistry};
use crate::SynthesisEngine;

/// Results of a sequential batch, in input order.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub results: Vec<BatchResult>,
    pub summary: BatchSummary,
}

/// Results of a comparison run, keyed by preset.
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub report: ComparisonReport,
    pub summary: BatchSummary,
}

/// Drives a synthesis engine over a list of work items.
///
/// Items run one at a time in order. A failed item is recorded and the run
/// moves on; only an engine that cannot start, or reports itself unusable,
/// ends a run early.
pub struct BatchOrchestrator<'a, E: SynthesisEngine + ?Sized> {
    registry: &'a PresetRegistry,
    engine: &'a mut E,
    report_path: Option<PathBuf>,
}

impl<'a, E: SynthesisEngine + ?Sized> BatchOrchestrator<'a, E> {
    pub fn new(registry: &'a PresetRegistry, engine: &'a mut E) -> Self {
        Self {
            registry,
            engine,
            report_path: None,
        }
    }

    /// Rewrite the batch report at `path` after every item, so an
    /// interrupted run still leaves the finished items on disk. Comparison
    /// runs write their report here once the run ends or the engine is lost.
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Synthesize every non-blank entry of `texts` with one preset.
    ///
    /// Output files are named `NNN_<slug>.wav` inside `output_dir`. Returns
    /// exactly one result per item regardless of how many items fail.
    pub fn run_batch(
        &mut self,
        texts: &[String],
        preset_name: &str,
        output_dir: &Path,
    ) -> Result<BatchRun, VoiceGenError> {
        let registry = self.registry;
        let preset = registry.lookup(preset_name)?;
        let texts: Vec<&str> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            return Err(VoiceGenError::MissingInput(
                "no text items to synthesize".to_string(),
            ));
        }

        log::info!(
            "Generating {} speech samples into {} with preset '{}'",
            texts.len(),
            output_dir.display(),
            preset.name
        );
        fs::create_dir_all(output_dir)?;

        let items: Vec<WorkItem<'_>> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| WorkItem {
                index: i + 1,
                text: text.to_string(),
                preset,
                output_path: batch_output_path(output_dir, i + 1, text),
            })
            .collect();

        let report_path = self.report_path.clone();
        let (results, total) = self.run_items(&items, report_path.as_deref())?;
        let summary = BatchSummary::from_results(&results, total);
        log::info!(
            "Batch complete: {}/{} succeeded in {:.1?} ({:.1?} per item)",
            summary.succeeded,
            summary.attempted,
            summary.total,
            summary.mean
        );
        Ok(BatchRun { results, summary })
    }

    /// Render `text` once per preset in `preset_names`.
    ///
    /// Every name is resolved before any synthesis starts. Output files are
    /// named `comparison_<preset>.wav` inside `output_dir`.
    pub fn run_comparison(
        &mut self,
        text: &str,
        preset_names: &[&str],
        output_dir: &Path,
    ) -> Result<ComparisonRun, VoiceGenError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceGenError::MissingInput(
                "no text given for comparison".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = preset_names.iter().find(|name| !seen.insert(**name)) {
            return Err(VoiceGenError::InvalidPreset(format!(
                "preset '{dup}' listed more than once for comparison"
            )));
        }
        let registry = self.registry;
        let presets = preset_names
            .iter()
            .map(|name| registry.lookup(name))
            .collect::<Result<Vec<&PresetConfig>, _>>()?;

        log::info!(
            "Generating comparison samples for {:?} with presets: {}",
            text,
            preset_names.join(", ")
        );
        fs::create_dir_all(output_dir)?;

        let items: Vec<WorkItem<'_>> = presets
            .iter()
            .enumerate()
            .map(|(i, &preset)| WorkItem {
                index: i + 1,
                text: text.to_string(),
                preset,
                output_path: comparison_output_path(output_dir, &preset.name),
            })
            .collect();

        let (results, total) = match self.run_items(&items, None) {
            Ok(done) => done,
            Err(VoiceGenError::CollaboratorLost { reason, completed }) => {
                self.save_comparison(&comparison_report(&items, &completed));
                return Err(VoiceGenError::CollaboratorLost { reason, completed });
            }
            Err(e) => return Err(e),
        };
        let report = comparison_report(&items, &results);
        self.save_comparison(&report);
        let summary = BatchSummary::from_results(&results, total);
        Ok(ComparisonRun { report, summary })
    }

    /// Write the comparison report to the report path, if one is set.
    fn save_comparison(&self, report: &ComparisonReport) {
        if let Some(path) = &self.report_path {
            if let Err(e) = write_json(path, report) {
                log::warn!("Could not write report {}: {e}", path.display());
            }
        }
    }

    /// Synthesize a single text to `output_path`.
    pub fn run_single(
        &mut self,
        text: &str,
        preset_name: &str,
        output_path: &Path,
    ) -> Result<BatchResult, VoiceGenError> {
        let registry = self.registry;
        let preset = registry.lookup(preset_name)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(VoiceGenError::MissingInput("no text given".to_string()));
        }
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let item = WorkItem {
            index: 1,
            text: text.to_string(),
            preset,
            output_path: output_path.to_path_buf(),
        };
        let (mut results, _) = self.run_items(std::slice::from_ref(&item), None)?;
        results.pop().ok_or_else(|| {
            VoiceGenError::MissingInput("single generation produced no result".to_string())
        })
    }

    fn run_items(
        &mut self,
        items: &[WorkItem<'_>],
        report_path: Option<&Path>,
    ) -> Result<(Vec<BatchResult>, Duration), VoiceGenError> {
        self.engine
            .load()
            .map_err(|e| VoiceGenError::CollaboratorInit(e.to_string()))?;

        let start = Instant::now();
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            log::info!("Processing {}/{}", item.index, items.len());
            let (result, fatal) = self.process_item(item);
            results.push(result);

            if let Some(path) = report_path {
                if let Err(e) = write_json(path, &results) {
                    log::warn!("Could not update report {}: {e}", path.display());
                }
            }

            if let Some(reason) = fatal {
                log::error!(
                    "Synthesis engine unusable, stopping after {} of {} items",
                    results.len(),
                    items.len()
                );
                return Err(VoiceGenError::CollaboratorLost {
                    reason,
                    completed: results,
                });
            }
        }

        Ok((results, start.elapsed()))
    }

    /// Run one item. The second value carries the reason when the engine
    /// reported itself unusable.
    fn process_item(&mut self, item: &WorkItem<'_>) -> (BatchResult, Option<String>) {
        log::debug!(
            "Item {}: preset '{}', output {}",
            item.index,
            item.preset.name,
            item.output_path.display()
        );

        let start = Instant::now();
        let outcome = self
            .engine
            .synthesize_to_file(&item.text, item.preset, &item.output_path);
        let elapsed = start.elapsed();

        match outcome {
            Ok(audio) => {
                log::info!(
                    "Generated {} ({:.2}s of audio) in {:.1?}",
                    item.output_path.display(),
                    audio.duration_secs(),
                    elapsed
                );
                let result = BatchResult {
                    index: item.index,
                    text: item.text.clone(),
                    output_file: Some(item.output_path.clone()),
                    success: true,
                    elapsed,
                };
                (result, None)
            }
            Err(err) => {
                let preview: String = item.text.chars().take(50).collect();
                log::error!("Failed to generate speech for {preview:?}: {err}");
                let fatal = err.is_fatal().then(|| err.to_string());
                let result = BatchResult {
                    index: item.index,
                    text: item.text.clone(),
                    output_file: None,
                    success: false,
                    elapsed,
                };
                (result, fatal)
            }
        }
    }
}

/// Pair each attempted item with its preset name, in run order.
fn comparison_report(items: &[WorkItem<'_>], results: &[BatchResult]) -> ComparisonReport {
    let mut report = ComparisonReport::default();
    for (item, result) in items.iter().zip(results) {
        report.push(
            item.preset.name.clone(),
            ComparisonEntry {
                file: result.output_file.clone(),
                time: result.elapsed,
                success: result.success,
            },
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::COMPARISON_PRESETS;
    use crate::{SynthesisError, SynthesisResult, SAMPLE_RATE};

    /// Fails every call whose 1-based number is in `fail_on`.
    struct ScriptedEngine {
        calls: usize,
        fail_on: HashSet<usize>,
        fatal_on: Option<usize>,
        load_error: Option<String>,
        seen_presets: Vec<String>,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                calls: 0,
                fail_on: HashSet::new(),
                fatal_on: None,
                load_error: None,
                seen_presets: Vec::new(),
            }
        }
    }

    impl SynthesisEngine for ScriptedEngine {
        fn load(&mut self) -> Result<(), SynthesisError> {
            match &self.load_error {
                Some(reason) => Err(SynthesisError::Unavailable(reason.clone())),
                None => Ok(()),
            }
        }

        fn synthesize(
            &mut self,
            _text: &str,
            preset: &PresetConfig,
        ) -> Result<SynthesisResult, SynthesisError> {
            self.calls += 1;
            self.seen_presets.push(preset.name.clone());
            if self.fatal_on == Some(self.calls) {
                return Err(SynthesisError::Unavailable("device lost".to_string()));
            }
            if self.fail_on.contains(&self.calls) {
                return Err(SynthesisError::Failed(format!("call {}", self.calls)));
            }
            Ok(SynthesisResult {
                samples: vec![0.1; 240],
                sample_rate: SAMPLE_RATE,
            })
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Line number {i}.")).collect()
    }

    #[test]
    fn alternating_failures_still_yield_one_result_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();
        engine.fail_on = [2, 4].into_iter().collect();

        let run = BatchOrchestrator::new(&registry, &mut engine)
            .run_batch(&lines(5), "fast", dir.path())
            .unwrap();

        assert_eq!(run.results.len(), 5);
        let indices: Vec<usize> = run.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        let successes: Vec<bool> = run.results.iter().map(|r| r.success).collect();
        assert_eq!(successes, vec![true, false, true, false, true]);
        assert!(run.results[1].output_file.is_none());
        assert!(run.results[0].output_file.as_ref().unwrap().exists());
        assert_eq!(run.summary.succeeded, 3);
        assert_eq!(run.summary.attempted, 5);
    }

    #[test]
    fn unknown_preset_fails_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();

        let err = BatchOrchestrator::new(&registry, &mut engine)
            .run_batch(&lines(2), "nope", dir.path())
            .unwrap_err();

        assert!(matches!(err, VoiceGenError::UnknownPreset(_)));
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn init_failure_aborts_without_attempting_items() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();
        engine.load_error = Some("weights missing".to_string());

        let err = BatchOrchestrator::new(&registry, &mut engine)
            .run_batch(&lines(3), "fast", dir.path())
            .unwrap_err();

        assert!(matches!(err, VoiceGenError::CollaboratorInit(_)));
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn fatal_error_mid_run_keeps_results_so_far() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("batch_results.json");
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();
        engine.fatal_on = Some(3);

        let err = BatchOrchestrator::new(&registry, &mut engine)
            .with_report_path(&report)
            .run_batch(&lines(5), "fast", dir.path())
            .unwrap_err();

        match err {
            VoiceGenError::CollaboratorLost { completed, .. } => {
                assert_eq!(completed.len(), 3);
                assert!(!completed[2].success);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.calls, 3);

        let persisted: Vec<BatchResult> =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(persisted.len(), 3);
    }

    #[test]
    fn report_is_rewritten_after_each_item() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("batch_results.json");
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();

        let run = BatchOrchestrator::new(&registry, &mut engine)
            .with_report_path(&report)
            .run_batch(&lines(2), "ultra_fast", dir.path())
            .unwrap();

        let persisted: Vec<BatchResult> =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(persisted.len(), run.results.len());
        assert_eq!(persisted[1].text, "Line number 2.");
    }

    #[test]
    fn comparison_runs_each_preset_once_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();

        let run = BatchOrchestrator::new(&registry, &mut engine)
            .run_comparison("test", &COMPARISON_PRESETS, dir.path())
            .unwrap();

        assert_eq!(run.report.len(), 4);
        assert_eq!(engine.seen_presets, COMPARISON_PRESETS.to_vec());
        let fast = run.report.get("fast").unwrap();
        assert!(fast.success);
        assert_eq!(
            fast.file.as_deref(),
            Some(dir.path().join("comparison_fast.wav").as_path())
        );
    }

    #[test]
    fn comparison_rejects_unknown_preset_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();

        let err = BatchOrchestrator::new(&registry, &mut engine)
            .run_comparison("test", &["fast", "bogus"], dir.path())
            .unwrap_err();
        assert!(matches!(err, VoiceGenError::UnknownPreset(_)));
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn comparison_rejects_repeated_preset() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();

        let err = BatchOrchestrator::new(&registry, &mut engine)
            .run_comparison("test", &["fast", "standard", "fast"], dir.path())
            .unwrap_err();
        assert!(matches!(err, VoiceGenError::InvalidPreset(_)), "{err}");
        assert!(err.to_string().contains("fast"), "{err}");
        assert_eq!(engine.calls, 0);
        assert!(!dir.path().join("comparison_fast.wav").exists());
    }

    #[test]
    fn comparison_keeps_partial_report_when_engine_is_lost() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("comparison_results.json");
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();
        engine.fatal_on = Some(2);

        let err = BatchOrchestrator::new(&registry, &mut engine)
            .with_report_path(&report)
            .run_comparison("test", &COMPARISON_PRESETS, dir.path())
            .unwrap_err();
        assert!(matches!(
            &err,
            VoiceGenError::CollaboratorLost { completed, .. } if completed.len() == 2
        ));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        let object = value.as_object().unwrap();
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2);
        assert!(object.contains_key("ultra_fast"));
        assert_eq!(object["ultra_fast"]["success"], true);
        assert_eq!(object["fast"]["success"], false);
    }

    #[test]
    fn single_generation_writes_requested_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sub").join("hello.wav");
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();

        let result = BatchOrchestrator::new(&registry, &mut engine)
            .run_single("  Hello  ", "custom_optimized", &out)
            .unwrap();
        assert!(result.success);
        assert_eq!(result.text, "Hello");
        assert!(out.exists());
    }

    #[test]
    fn blank_inputs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = PresetRegistry::default();
        let mut engine = ScriptedEngine::new();
        let mut orchestrator = BatchOrchestrator::new(&registry, &mut engine);

        let blank = vec!["   ".to_string(), String::new()];
        assert!(matches!(
            orchestrator.run_batch(&blank, "fast", dir.path()),
            Err(VoiceGenError::MissingInput(_))
        ));
        assert!(matches!(
            orchestrator.run_comparison(" ", &COMPARISON_PRESETS, dir.path()),
            Err(VoiceGenError::MissingInput(_))
        ));
    }
}
