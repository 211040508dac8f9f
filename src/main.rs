//! Command-line front end for voice-cloned speech generation.
//!
//! # Usage
//!
//! ```bash
//! # Copy processed recordings into the voice directory
//! voicegen prepare-voice audio_data/your_voice_processed
//!
//! # One utterance
//! voicegen say "Hello world!" --preset ultra_fast --output test.wav
//!
//! # Batch from a text file, one line per utterance
//! voicegen create-samples
//! voicegen batch sample_texts.txt custom_optimized
//!
//! # Same text with each comparison preset
//! voicegen compare "Hello world!"
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use voicegen_rs::batch::naming::single_output_path;
use voicegen_rs::batch::report::write_json;
use voicegen_rs::batch::{create_sample_text_file, read_text_items, BatchOrchestrator};
use voicegen_rs::config::GeneratorConfig;
use voicegen_rs::engines::{CommandEngine, Device};
use voicegen_rs::presets::{PresetRegistry, COMPARISON_PRESETS};
use voicegen_rs::voice::prepare_voice;
use voicegen_rs::{SynthesisEngine, VoiceGenError};

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "voicegen")]
#[command(about = "Generate speech in a cloned voice with quality presets", long_about = None)]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Name of the cloned voice.
    #[arg(long, global = true)]
    voice: Option<String>,
    /// Directory holding one subdirectory of samples per voice.
    #[arg(long, global = true)]
    voices_dir: Option<PathBuf>,
    /// Synthesizer program to run.
    #[arg(long, global = true)]
    engine: Option<PathBuf>,
    /// Compute device (cuda, mps, cpu). Probed when omitted.
    #[arg(long, global = true)]
    device: Option<Device>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Synthesize every non-blank line of a text file.
    Batch {
        /// Text file, one utterance per line.
        text_file: PathBuf,
        /// Preset name; defaults to the balanced tier.
        preset: Option<String>,
        /// Directory for generated files.
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// JSON report path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Render one text with each comparison preset.
    Compare {
        text: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write an example text file for `batch`.
    CreateSamples {
        file: Option<PathBuf>,
    },
    /// Synthesize a single utterance.
    Say {
        text: String,
        #[arg(long)]
        preset: Option<String>,
        /// Output WAV path; derived from the text when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the available quality presets.
    Presets,
    /// Copy processed recordings into the voice directory.
    PrepareVoice {
        source_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let registry = PresetRegistry::default();

    match run(cli, &registry) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(VoiceGenError::UnknownPreset(_)) = err.downcast_ref::<VoiceGenError>() {
                eprintln!();
                eprint!("{}", registry.render_listing());
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(voice) = &cli.voice {
        config.voice = voice.clone();
    }
    if let Some(dir) = &cli.voices_dir {
        config.voices_dir = dir.clone();
    }
    if let Some(program) = &cli.engine {
        config.engine.program = program.clone();
    }
    if let Some(device) = cli.device {
        config.engine.device = Some(device.to_string());
    }
    Ok(config)
}

fn run(cli: Cli, registry: &PresetRegistry) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Presets => {
            print!("{}", registry.render_listing());
        }
        Commands::CreateSamples { file } => {
            let path = file.unwrap_or_else(|| config.sample_file.clone());
            let count = create_sample_text_file(&path)?;
            println!("Created sample text file: {}", path.display());
            println!("Contains {count} sample texts for batch processing");
        }
        Commands::PrepareVoice { source_dir } => {
            let source = source_dir.unwrap_or_else(|| config.processed_audio_dir.clone());
            let copied = prepare_voice(&source, &config.voices_dir, &config.voice)?;
            for path in &copied {
                println!("  copied {}", path.display());
            }
            println!("Voice '{}' ready with {} samples", config.voice, copied.len());
        }
        Commands::Say {
            text,
            preset,
            output,
        } => {
            let preset = preset.unwrap_or_else(|| registry.default_preset().name.clone());
            let output = output.unwrap_or_else(|| single_output_path(&text, &preset));
            let mut engine = CommandEngine::new(config.engine_params()?);

            let result = BatchOrchestrator::new(registry, &mut engine)
                .run_single(&text, &preset, &output)?;
            engine.unload();

            if result.success {
                println!("Saved to: {}", output.display());
                println!("Generation time: {:.1} seconds", result.elapsed.as_secs_f64());
            } else {
                anyhow::bail!("generation failed for {:?}", result.text);
            }
        }
        Commands::Batch {
            text_file,
            preset,
            output_dir,
            report,
        } => {
            let texts = read_text_items(&text_file)?;
            let preset = preset.unwrap_or_else(|| registry.default_preset().name.clone());
            let output_dir = output_dir.unwrap_or_else(|| config.batch_output_dir.clone());
            let report = report.unwrap_or_else(|| config.batch_report.clone());
            let mut engine = CommandEngine::new(config.engine_params()?);

            let run = BatchOrchestrator::new(registry, &mut engine)
                .with_report_path(&report)
                .run_batch(&texts, &preset, &output_dir)?;
            engine.unload();

            for result in &run.results {
                let status = if result.success { "ok  " } else { "FAIL" };
                println!("{status} {:03} {}", result.index, result.text);
            }
            println!();
            println!("{}", run.summary.render());

            write_json(&report, &run.results)
                .with_context(|| format!("writing {}", report.display()))?;
            println!("Results saved to: {}", report.display());
        }
        Commands::Compare {
            text,
            output_dir,
            report,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.comparison_output_dir.clone());
            let report = report.unwrap_or_else(|| config.comparison_report.clone());
            let mut engine = CommandEngine::new(config.engine_params()?);

            let run = BatchOrchestrator::new(registry, &mut engine)
                .with_report_path(&report)
                .run_comparison(&text, &COMPARISON_PRESETS, &output_dir)?;
            engine.unload();

            println!("Comparison Results:");
            println!("{}", run.report.render_table());

            write_json(&report, &run.report)
                .with_context(|| format!("writing {}", report.display()))?;
            println!("Comparison results saved to: {}", report.display());
        }
    }

    Ok(())
}
