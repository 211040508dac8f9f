//! Named quality presets.
//!
//! A preset bundles the sampling parameters handed to the synthesis engine.
//! Cheaper presets draw fewer autoregressive candidates and run fewer
//! diffusion iterations, trading audio quality for generation time.
//!
//! | Preset | Samples | Diffusion | Temperature | Quality |
//! |---|---|---|---|---|
//! | `ultra_fast` | 1 | 5 | 0.70 | 6 |
//! | `fast` | 16 | 30 | 0.80 | 7 |
//! | `standard` | 256 | 100 | 0.80 | 8 |
//! | `high_quality` | 512 | 200 | 0.70 | 9 |
//! | `custom_optimized` | 128 | 75 | 0.75 | 8 |
//!
//! # Custom registries
//!
//! ```rust
//! use voicegen_rs::presets::{PresetConfigBuilder, PresetRegistry};
//!
//! let tiny = PresetConfigBuilder::default()
//!     .name("tiny")
//!     .sampling_budget(2)
//!     .refinement_steps(4)
//!     .temperature(0.5)
//!     .build()?;
//! let registry = PresetRegistry::new(vec![tiny], "tiny")?;
//! assert_eq!(registry.lookup("tiny")?.sampling_budget, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashSet;
use std::fmt::Write;

use derive_builder::Builder;

use crate::error::VoiceGenError;

/// Repetition penalty used when a preset leaves it unset.
pub const DEFAULT_REPETITION_PENALTY: f32 = 2.0;

/// Length penalty used when a preset leaves it unset.
pub const DEFAULT_LENGTH_PENALTY: f32 = 1.0;

/// Balanced tier used when the caller does not name a preset.
pub const DEFAULT_PRESET: &str = "custom_optimized";

/// Presets exercised by a comparison run, in report order.
pub const COMPARISON_PRESETS: [&str; 4] = ["ultra_fast", "fast", "custom_optimized", "standard"];

/// Synthesis parameters for one quality level.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct PresetConfig {
    /// Unique key, e.g. `"ultra_fast"`.
    #[builder(setter(into))]
    pub name: String,
    /// Number of autoregressive candidates to draw.
    pub sampling_budget: u32,
    /// Number of diffusion refinement passes.
    pub refinement_steps: u32,
    /// Sampling temperature in `(0, 1]`.
    pub temperature: f32,
    /// Penalty on repeated tokens; [`DEFAULT_REPETITION_PENALTY`] when unset.
    #[builder(default, setter(strip_option))]
    pub repetition_penalty: Option<f32>,
    /// Bias towards longer or shorter output; [`DEFAULT_LENGTH_PENALTY`] when unset.
    #[builder(default, setter(strip_option))]
    pub length_penalty: Option<f32>,
    /// Name of a preset built into the model. When set, the engine is asked
    /// to use it instead of the explicit numeric parameters.
    #[builder(default, setter(into, strip_option))]
    pub engine_preset: Option<String>,
    /// One-line summary shown in preset listings.
    #[builder(default, setter(into))]
    pub description: String,
    /// Relative quality on a 1–10 scale. Informational only.
    #[builder(default = "5")]
    pub quality_score: u8,
}

impl PresetConfig {
    pub fn effective_repetition_penalty(&self) -> f32 {
        self.repetition_penalty.unwrap_or(DEFAULT_REPETITION_PENALTY)
    }

    pub fn effective_length_penalty(&self) -> f32 {
        self.length_penalty.unwrap_or(DEFAULT_LENGTH_PENALTY)
    }

    /// Ten-character star bar, e.g. `★★★★★★★★☆☆` for a score of 8.
    pub fn quality_bar(&self) -> String {
        let filled = usize::from(self.quality_score.min(10));
        format!("{}{}", "★".repeat(filled), "☆".repeat(10 - filled))
    }

    fn check(&self) -> Result<(), String> {
        check_fields(
            &self.name,
            self.sampling_budget,
            self.refinement_steps,
            self.temperature,
            self.repetition_penalty,
            self.length_penalty,
            self.quality_score,
        )
    }
}

impl PresetConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        check_fields(
            self.name.as_deref().unwrap_or_default(),
            self.sampling_budget.unwrap_or(1),
            self.refinement_steps.unwrap_or(1),
            self.temperature.unwrap_or(1.0),
            self.repetition_penalty.flatten(),
            self.length_penalty.flatten(),
            self.quality_score.unwrap_or(5),
        )
    }
}

fn check_fields(
    name: &str,
    sampling_budget: u32,
    refinement_steps: u32,
    temperature: f32,
    repetition_penalty: Option<f32>,
    length_penalty: Option<f32>,
    quality_score: u8,
) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("preset name must not be empty".to_string());
    }
    if sampling_budget == 0 {
        return Err(format!("{name}: sampling budget must be positive"));
    }
    if refinement_steps == 0 {
        return Err(format!("{name}: refinement steps must be positive"));
    }
    if temperature.is_nan() || temperature <= 0.0 || temperature > 1.0 {
        return Err(format!("{name}: temperature {temperature} is outside (0, 1]"));
    }
    for (label, value) in [
        ("repetition penalty", repetition_penalty),
        ("length penalty", length_penalty),
    ] {
        if let Some(v) = value {
            if v.is_nan() || v <= 0.0 {
                return Err(format!("{name}: {label} {v} must be positive"));
            }
        }
    }
    if !(1..=10).contains(&quality_score) {
        return Err(format!("{name}: quality score {quality_score} is outside 1..=10"));
    }
    Ok(())
}

/// Raised when a preset name is not registered.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown preset '{name}'. Available: {}", .available.join(", "))]
pub struct UnknownPresetError {
    pub name: String,
    pub available: Vec<String>,
}

/// Immutable, ordered set of presets.
///
/// Built once at start-up and passed by reference to whoever needs to turn a
/// preset name into parameters.
#[derive(Debug, Clone)]
pub struct PresetRegistry {
    presets: Vec<PresetConfig>,
    default_name: String,
}

impl PresetRegistry {
    /// Build a registry from `presets`, keeping their order for listings.
    ///
    /// Fails if names repeat, any entry breaks the numeric invariants, or
    /// `default_name` is not among the entries.
    pub fn new(
        presets: Vec<PresetConfig>,
        default_name: impl Into<String>,
    ) -> Result<Self, VoiceGenError> {
        let default_name = default_name.into();
        let mut seen = HashSet::new();
        for preset in &presets {
            preset.check().map_err(VoiceGenError::InvalidPreset)?;
            if !seen.insert(preset.name.as_str()) {
                return Err(VoiceGenError::InvalidPreset(format!(
                    "duplicate preset name '{}'",
                    preset.name
                )));
            }
        }
        if !seen.contains(default_name.as_str()) {
            return Err(VoiceGenError::InvalidPreset(format!(
                "default preset '{default_name}' is not registered"
            )));
        }
        Ok(Self {
            presets,
            default_name,
        })
    }

    /// Resolve a preset by name.
    pub fn lookup(&self, name: &str) -> Result<&PresetConfig, UnknownPresetError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| UnknownPresetError {
                name: name.to_string(),
                available: self.names().into_iter().map(str::to_string).collect(),
            })
    }

    /// All presets in display order.
    pub fn list(&self) -> &[PresetConfig] {
        &self.presets
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    /// The balanced tier used when no preset is named.
    pub fn default_preset(&self) -> &PresetConfig {
        // `new` guarantees the default is registered.
        self.presets
            .iter()
            .find(|p| p.name == self.default_name)
            .unwrap_or(&self.presets[0])
    }

    /// Human-readable table of presets with quality bars.
    pub fn render_listing(&self) -> String {
        let rule = "-".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "Available Quality Presets:");
        let _ = writeln!(out, "{rule}");
        for preset in &self.presets {
            let _ = writeln!(
                out,
                "{:16} │ {} │ {}",
                preset.name,
                preset.quality_bar(),
                preset.description
            );
        }
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "Recommendation: use '{}' for the best speed/quality balance",
            self.default_name
        );
        out
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self {
            presets: builtin_presets(),
            default_name: DEFAULT_PRESET.to_string(),
        }
    }
}

/// The stock preset table, fastest first.
pub fn builtin_presets() -> Vec<PresetConfig> {
    let tier = |name: &str, samples, steps, temperature, score, description: &str| PresetConfig {
        name: name.to_string(),
        sampling_budget: samples,
        refinement_steps: steps,
        temperature,
        repetition_penalty: None,
        length_penalty: None,
        engine_preset: Some(name.to_string()),
        description: description.to_string(),
        quality_score: score,
    };

    vec![
        tier("ultra_fast", 1, 5, 0.7, 6, "Fastest generation (~30 seconds)"),
        tier("fast", 16, 30, 0.8, 7, "Fast with decent quality (~2 minutes)"),
        tier("standard", 256, 100, 0.8, 8, "Good balance (~5 minutes)"),
        tier("high_quality", 512, 200, 0.7, 9, "Best quality (~10 minutes)"),
        PresetConfig {
            name: DEFAULT_PRESET.to_string(),
            sampling_budget: 128,
            refinement_steps: 75,
            temperature: 0.75,
            repetition_penalty: Some(2.0),
            length_penalty: Some(1.0),
            engine_preset: None,
            description: "Optimized balance of speed/quality (~3 minutes)".to_string(),
            quality_score: 8,
        },
    ]
}
