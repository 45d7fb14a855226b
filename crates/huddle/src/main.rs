//! huddle CLI - groups near-duplicate text records.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use huddle::{
    open_records, write_grouped_jsonl, GroupingPipeline, PipelineConfig, DEFAULT_DEVIANCE,
    FINGERPRINT_BITS,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

/// JSON output for grouping results.
#[derive(Serialize)]
struct JsonOutput {
    input: String,
    output: Option<String>,
    total_records: usize,
    unique_groups: usize,
    duplicates: usize,
    deviance: u32,
    workers: usize,
    elapsed_secs: f64,
    throughput_records_s: f64,
}

/// Groups near-duplicate text records into clusters.
///
/// Fingerprints each input line into a 256-bit similarity-preserving code and
/// groups lines whose codes differ in at most --deviance bits.
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input file path (one record per line).
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file path for grouped records (JSON Lines).
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Maximum number of fingerprint bits allowed to differ within a group.
    #[arg(short, long, default_value_t = DEFAULT_DEVIANCE)]
    deviance: u32,

    /// Number of worker threads (defaults to available parallelism).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print statistics only, don't write output.
    #[arg(long)]
    stats_only: bool,

    /// Output results as JSON.
    #[arg(long)]
    json: bool,

    /// Show progress while grouping.
    #[arg(long)]
    progress: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Create a spinner for indeterminate progress.
fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // Handle completions subcommand
    if let Some(Commands::Completions { shell }) = args.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "huddle", &mut io::stdout());
        return Ok(());
    }

    // Require input file for grouping operations
    let input = args.input.clone().ok_or("Input file is required")?;

    // Validate arguments
    if args.deviance as usize > FINGERPRINT_BITS {
        eprintln!("Error: deviance must be between 0 and {FINGERPRINT_BITS}");
        std::process::exit(1);
    }

    if args.workers == Some(0) {
        eprintln!("Error: workers must be > 0");
        std::process::exit(1);
    }

    let defaults = PipelineConfig::default();
    let config = PipelineConfig {
        deviance: args.deviance,
        workers: args.workers.unwrap_or(defaults.workers),
        report_interval: if args.verbose { 100_000 } else { usize::MAX },
        ..defaults
    };

    // Print configuration
    if args.verbose && !args.json {
        eprintln!("Configuration:");
        eprintln!("  Input: {}", input.display());
        if let Some(ref output) = args.output {
            eprintln!("  Output: {}", output.display());
        }
        eprintln!("  Deviance: {}", config.deviance);
        eprintln!("  Workers: {}", config.workers);
        eprintln!();
    }

    let pb = if args.progress && !args.json {
        Some(create_spinner("Grouping records..."))
    } else {
        None
    };

    let start = Instant::now();
    let reader = open_records(&input)?;
    let pipeline = GroupingPipeline::new(config.clone())?;
    let outcome = pipeline.run(reader)?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let stats = &outcome.stats;

    // Write output if requested
    if !args.stats_only {
        if let Some(ref output_path) = args.output {
            write_grouped_jsonl(output_path, &outcome.records)?;
            if args.verbose && !args.json {
                eprintln!(
                    "Wrote {} grouped records to {}",
                    outcome.records.len(),
                    output_path.display()
                );
            }
        }
    }

    if args.json {
        let output = JsonOutput {
            input: input.display().to_string(),
            output: if args.stats_only {
                None
            } else {
                args.output.as_ref().map(|p| p.display().to_string())
            },
            total_records: stats.total,
            unique_groups: stats.groups,
            duplicates: stats.duplicates,
            deviance: stats.deviance,
            workers: config.workers,
            elapsed_secs: stats.elapsed_secs,
            throughput_records_s: stats.throughput(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        eprintln!();
        eprintln!("Grouping Results:");
        eprintln!("  Total records:     {}", stats.total);
        eprintln!("  Unique groups:     {}", stats.groups);
        eprintln!("  Duplicates found:  {}", stats.duplicates);
        eprintln!("  Deviance:          {}", stats.deviance);
        eprintln!();
        eprintln!("Performance:");
        eprintln!("  Processing time:   {:.3}s", stats.elapsed_secs);
        eprintln!("  Throughput:        {:.0} records/sec", stats.throughput());
        eprintln!();
        eprintln!(
            "With {} degrees of deviance, {} entries were grouped into {} unique groups",
            stats.deviance, stats.total, stats.groups
        );

        if args.stats_only {
            eprintln!();
            eprintln!("(Output not written: --stats-only mode)");
        }

        eprintln!("Total time: {:.3}s", start.elapsed().as_secs_f64());
    }

    Ok(())
}
