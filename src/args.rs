//! CLI argument definitions.

use clap::Args;
use loadgen_core::RunConfig;
use std::path::PathBuf;

/// Arguments of `generate`.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Path to run configuration YAML file
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Output directory for load files (created if missing)
    #[arg(long, short = 'o', default_value = ".")]
    pub output_dir: PathBuf,

    /// File name prefix; files are named {prefix}_{article|comment}_{partition}.{ext}
    #[arg(long, default_value = "cafe")]
    pub prefix: String,

    /// Number of worker threads, each with its own event queue
    #[arg(long, default_value = "1", env = "LOADGEN_WORKERS")]
    pub workers: usize,

    /// Random seed; overrides the configured seed (same seed = same data with one worker)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Total comments to generate; overrides the configured target
    #[arg(long)]
    pub target_comments: Option<u64>,

    /// Dry-run mode: run the full simulation but discard every row
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    /// Apply command-line overrides to a loaded configuration.
    pub fn apply_overrides(&self, config: &mut RunConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(target) = self.target_comments {
            config.target_comments = target;
        }
    }

    /// Path prefix handed to every sink.
    pub fn output_prefix(&self) -> String {
        self.output_dir
            .join(&self.prefix)
            .to_string_lossy()
            .into_owned()
    }
}

/// Arguments of `plan`.
#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    /// Path to run configuration YAML file
    #[arg(long, short = 'c')]
    pub config: PathBuf,
}
