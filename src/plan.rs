//! `plan` command: print the cafe allocation without generating rows.

use crate::args::PlanArgs;
use anyhow::Context;
use loadgen_core::RunConfig;
use loadgen_engine::CafeAllocator;
use std::fmt::Write;

/// Render the per-cell allocation as an aligned table.
pub fn render_plan(allocator: &CafeAllocator) -> String {
    let modulus = allocator.modulus();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>8} {:>9} {:>12} {:>8} {:>12}",
        "category", "partition", "first_id", "cafes", "last_id"
    );
    for cell in allocator.plan() {
        let last_id = cell.id_at(cell.count.saturating_sub(1), modulus);
        let _ = writeln!(
            out,
            "{:>8} {:>9} {:>12} {:>8} {:>12}",
            cell.category, cell.partition, cell.start_id, cell.count, last_id
        );
    }
    let _ = writeln!(out, "{} cafes, id modulus {}", allocator.len(), modulus);
    out
}

/// Run the plan command.
pub fn run_plan(args: &PlanArgs) -> anyhow::Result<String> {
    let config = RunConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load run configuration from {:?}", args.config))?;
    let allocator = CafeAllocator::from_config(&config).context("Failed to allocate cafes")?;
    Ok(render_plan(&allocator))
}
