//! Leakscope CLI
//!
//! # Usage
//!
//! ```bash
//! # Leaks watched by keyed weak references, default preset
//! leakscope heap.json
//!
//! # Every instance of a class, JSON report, with retained sizes
//! leakscope heap.json --leaking-class com.example.MainActivity --retained-size --format json
//!
//! # Team configuration file
//! leakscope heap.json --config leakscope.yaml -vv
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use leakscope_core::config::{AnalysisConfig, Preset};
use leakscope_core::features::analysis::{
    ClassInstancesLeakingObjectFinder, KeyedWeakReferenceFinder, TracingProgressListener,
};
use leakscope_core::{HeapAnalysis, HeapAnalysisSuccess, HeapAnalyzer, LeakingObjectFinder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Find memory leaks in a JSON heap snapshot
#[derive(Parser, Debug)]
#[command(name = "leakscope", author, version, about, long_about = None)]
struct Cli {
    /// Heap snapshot (JSON)
    snapshot: PathBuf,

    /// YAML configuration file (overrides --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analysis preset
    #[arg(short, long, value_enum, default_value_t = Preset::Balanced)]
    preset: Preset,

    /// Compute retained sizes even if the preset does not
    #[arg(long)]
    retained_size: bool,

    /// Treat every instance of this class as leaking (repeatable)
    #[arg(long = "leaking-class", value_name = "CLASS")]
    leaking_classes: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("leakscope_core=info,leakscope=info"),
        _ => EnvFilter::new("leakscope_core=debug,leakscope=debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            error!("{}", message);
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };
    debug!(config = %config.describe(), "Configuration");

    let finder: Box<dyn LeakingObjectFinder> = if cli.leaking_classes.is_empty() {
        Box::new(KeyedWeakReferenceFinder)
    } else {
        Box::new(ClassInstancesLeakingObjectFinder::new(cli.leaking_classes.clone()))
    };

    let analyzer = HeapAnalyzer::new(config).with_listener(TracingProgressListener);
    let analysis = analyzer.analyze_snapshot_file(&cli.snapshot, finder.as_ref());

    if let Err(err) = print_analysis(&analysis, cli.format) {
        eprintln!("error: {}", err);
        return ExitCode::FAILURE;
    }

    match analysis {
        HeapAnalysis::Success(_) => ExitCode::SUCCESS,
        HeapAnalysis::Failure(_) => ExitCode::FAILURE,
    }
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig, String> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_yaml_file(path).map_err(|e| e.to_string())?,
        None => AnalysisConfig::preset(cli.preset),
    };
    let config = if cli.retained_size {
        config.compute_retained_heap_size(true)
    } else {
        config
    };
    config.validated().map_err(|e| e.to_string())
}

fn print_analysis(analysis: &HeapAnalysis, format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(analysis)?),
        OutputFormat::Text => match analysis {
            HeapAnalysis::Success(success) => print_success(success),
            HeapAnalysis::Failure(failure) => {
                println!("Heap analysis failed after {} ms", failure.analysis_duration_millis);
                println!("{}", failure.error_message);
            }
        },
    }
    Ok(())
}

fn print_success(success: &HeapAnalysisSuccess) {
    println!("====================================");
    println!("HEAP ANALYSIS RESULT");
    println!("====================================");
    println!("{} APPLICATION LEAKS", success.application_leaks.len());
    for leak in &success.application_leaks {
        println!();
        print!("{}", leak);
    }
    println!("====================================");
    println!("{} LIBRARY LEAKS", success.library_leaks.len());
    for leak in &success.library_leaks {
        println!();
        print!("{}", leak);
    }
    println!("====================================");
    println!("{} UNREACHABLE OBJECTS", success.unreachable_objects.len());
    for object in &success.unreachable_objects {
        println!();
        println!("{}", object);
        println!("    Leaking: {} ({})", object.leaking_status, object.leaking_status_reason);
        for label in &object.labels {
            println!("    {}", label);
        }
    }
    println!("====================================");
    println!("METADATA");
    for (key, value) in &success.metadata {
        println!("{}: {}", key, value);
    }
    println!("Analysis duration: {} ms", success.analysis_duration_millis);
    println!("Heap dump file: {}", success.heap_dump_file.display());
    println!("====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preset_defaults_to_balanced() {
        let cli = Cli::try_parse_from(["leakscope", "heap.json"]).unwrap();
        assert_eq!(cli.preset, Preset::Balanced);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.leaking_classes.is_empty());
    }

    #[test]
    fn test_preset_and_repeated_classes_parse() {
        let cli = Cli::try_parse_from([
            "leakscope",
            "heap.json",
            "--preset",
            "thorough",
            "--leaking-class",
            "com.example.A",
            "--leaking-class",
            "com.example.B",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.preset, Preset::Thorough);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.leaking_classes, vec!["com.example.A", "com.example.B"]);
    }

    #[test]
    fn test_unknown_preset_is_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["leakscope", "heap.json", "--preset", "custom"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
        let message = err.to_string();
        assert!(message.contains("fast"), "{}", message);
        assert!(message.contains("thorough"), "{}", message);
    }

    #[test]
    fn test_retained_size_flag_overrides_preset() {
        let cli = Cli::try_parse_from(["leakscope", "heap.json", "--preset", "fast", "--retained-size"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.preset, Preset::Fast);
        assert!(config.compute_retained_heap_size);
    }
}
