use std::path::PathBuf;

use clap::Parser;

use packbench::io_utils::cli_hint;
use packbench::{Benchmark, CodecRegistry};

/// Benchmark external compression tool-chains against package tarballs.
///
/// Results accumulate in a per-package JSON record; completed work is
/// skipped on re-runs, so an interrupted benchmark resumes where it left
/// off.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Package archives to benchmark (*.tar.bz2)
    #[arg(required = true)]
    packages: Vec<PathBuf>,

    /// Directory holding per-package work trees and result files
    #[arg(long, default_value = "work")]
    work_dir: PathBuf,

    /// Comma separated subset of codecs to run (the baseline is always kept)
    #[arg(long, value_delimiter = ',')]
    only: Option<Vec<String>>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let registry = CodecRegistry::standard();
    let registry = match &args.only {
        Some(names) => registry.retain(names).map_err(|e| cli_hint(&e))?,
        None => registry,
    };

    let bench = Benchmark::new(&registry, &args.work_dir);
    let mut failures = 0usize;
    for package in &args.packages {
        // A failed package keeps its partial record; the remaining inputs
        // are still attempted since their records are independent.
        if let Err(e) = bench.run_package(package) {
            eprintln!("{}: {}", package.display(), cli_hint(&e));
            failures += 1;
        }
    }
    if failures > 0 {
        return Err(format!("{failures} package(s) failed").into());
    }
    Ok(())
}
