//! Command-line interface for cafe-loadgen
//!
//! # Usage Examples
//!
//! ## Generate
//! ```bash
//! # CSV and JSONL files under ./out, 100k comments, 4 workers
//! cafe-loadgen generate \
//!   --config run.yaml \
//!   --output-dir out \
//!   --target-comments 100000 \
//!   --workers 4
//!
//! # Progress logging
//! RUST_LOG=debug cafe-loadgen generate --config run.yaml --dry-run
//! ```
//!
//! ## Plan
//! ```bash
//! cafe-loadgen plan --config run.yaml
//! ```

use cafe_loadgen::{run_generate, run_plan, GenerateArgs, PlanArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cafe-loadgen")]
#[command(about = "Generate cafe/article/comment data for database load testing")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and write rows to the configured sinks
    Generate(GenerateArgs),

    /// Print the cafe allocation without generating rows
    Plan(PlanArgs),
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            let summary = run_generate(&args)?;
            println!("{summary}");
        }
        Commands::Plan(args) => {
            print!("{}", run_plan(&args)?);
        }
    }

    Ok(())
}
