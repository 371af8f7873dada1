//! Rewrites `tests/golden/<case>/expected_report.json` from each case's
//! `input.bin` capture.
//!
//! Usage: `regenerate_golden [--chunk-size N] [--name DEVICE] [CASE...]`
//!
//! Run from the repository root. With no case names every directory holding
//! an `input.bin` is regenerated. The golden tests replay with the default
//! options, so only pass `--chunk-size` or `--name` for ad hoc inspection.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rotel_core::{DEFAULT_CHUNK_SIZE, ReplayOptions, replay_capture_file};

const GOLDEN_ROOT: &str = "tests/golden";

#[derive(Debug)]
struct Args {
    options: ReplayOptions,
    cases: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(err) = parse_args(std::env::args().skip(1)).and_then(|args| run(&args)) {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        options: ReplayOptions::default(),
        cases: Vec::new(),
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--chunk-size" => {
                let value = raw.next().ok_or("--chunk-size needs a value")?;
                args.options.chunk_size = value
                    .parse::<usize>()
                    .ok()
                    .filter(|size| *size > 0)
                    .ok_or_else(|| format!("invalid chunk size '{}'", value))?;
            }
            "--name" => {
                args.options.name = raw.next().ok_or("--name needs a value")?;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{}'", other));
            }
            case => args.cases.push(case.to_string()),
        }
    }
    Ok(args)
}

fn run(args: &Args) -> Result<(), String> {
    let root = PathBuf::from(GOLDEN_ROOT);
    let mut cases = if args.cases.is_empty() {
        discover_cases(&root)?
    } else {
        args.cases.iter().map(|case| root.join(case)).collect()
    };
    cases.sort();

    if args.options.chunk_size != DEFAULT_CHUNK_SIZE {
        eprintln!(
            "warning: chunk size {} differs from the golden tests' {}",
            args.options.chunk_size, DEFAULT_CHUNK_SIZE
        );
    }

    for case in cases {
        let input = case.join("input.bin");
        if !input.is_file() {
            return Err(format!("missing capture {}", input.display()));
        }
        regenerate_one(&input, &case.join("expected_report.json"), &args.options)?;
    }
    Ok(())
}

fn discover_cases(root: &Path) -> Result<Vec<PathBuf>, String> {
    let entries =
        fs::read_dir(root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    let mut cases = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if path.is_dir() && path.join("input.bin").is_file() {
            cases.push(path);
        }
    }
    Ok(cases)
}

fn regenerate_one(input: &Path, output: &Path, options: &ReplayOptions) -> Result<(), String> {
    let report = replay_capture_file(input, options)
        .map_err(|err| format!("replay failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    println!(
        "{}: {} events, {} commands, {} diagnostic ids",
        output.display(),
        report.events.len(),
        report.commands.len(),
        report.diagnostics.len()
    );
    Ok(())
}
