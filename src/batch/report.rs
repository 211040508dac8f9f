use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::BatchResult;
use crate::error::VoiceGenError;

/// Serialize a `Duration` as fractional seconds.
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Aggregate numbers for a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub total: Duration,
    /// `total / attempted`; failed items count as attempted.
    pub mean: Duration,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchResult], total: Duration) -> Self {
        let attempted = results.len();
        let succeeded = results.iter().filter(|r| r.success).count();
        let mean = if attempted == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(total.as_secs_f64() / attempted as f64)
        };
        Self {
            attempted,
            succeeded,
            total,
            mean,
        }
    }

    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn render(&self) -> String {
        format!(
            "Successful: {}/{}\nTotal time: {:.1} seconds\nAverage per sample: {:.1} seconds",
            self.succeeded,
            self.attempted,
            self.total.as_secs_f64(),
            self.mean.as_secs_f64()
        )
    }
}

/// Outcome of one preset in a comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub file: Option<PathBuf>,
    #[serde(with = "duration_secs")]
    pub time: Duration,
    pub success: bool,
}

/// Comparison outcomes keyed by preset name, in the order they ran.
///
/// Serializes as a JSON object whose keys keep run order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonReport {
    entries: Vec<(String, ComparisonEntry)>,
}

impl ComparisonReport {
    pub fn push(&mut self, preset: impl Into<String>, entry: ComparisonEntry) {
        self.entries.push((preset.into(), entry));
    }

    pub fn get(&self, preset: &str) -> Option<&ComparisonEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == preset)
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComparisonEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Console table of preset, time and status.
    pub fn render_table(&self) -> String {
        let rule = "-".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{:<16} │ {:<8} │ Status", "Preset", "Time (s)");
        let _ = writeln!(out, "{rule}");
        for (name, entry) in self.iter() {
            let (time, status) = if entry.success {
                (format!("{:.1}", entry.time.as_secs_f64()), "Success")
            } else {
                ("N/A".to_string(), "Failed")
            };
            let _ = writeln!(out, "{name:<16} │ {time:<8} │ {status}");
        }
        let _ = write!(out, "{rule}");
        out
    }
}

impl Serialize for ComparisonReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// Write `value` as pretty JSON.
///
/// The file is written next to its destination and renamed into place, so a
/// reader never sees a half-written report.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), VoiceGenError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let body = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
