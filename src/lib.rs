/*
This file implements "covref", a coverage ratchet for CI pipelines.
It runs a project's test suite, reads per-package coverage from the runner's summary
output, compares it with a reference file checked into the repository, and fails the
build when any package lost coverage.

Key features and structure:
- Uses Clap for parsing command-line arguments.
- Reads and writes the semicolon-delimited reference file (`reference`).
- Parses `go test -cover` summary lines with named regex fields (`parse`).
- Compares snapshots key by key; new packages count as improvements (`compare`).
- When coverage improved, rewrites the reference and can commit and push it using the
  git CLI, with git2 for repository discovery, status, and identity (`vcs`).
- Optional per-project settings in `covref.toml` (`config`) and a JSON run report (`report`).
*/

use clap::{ArgAction, Parser};
use std::env;
use std::error::Error;
use std::path::PathBuf;

mod compare;
mod config;
mod parse;
mod reference;
mod report;
mod runner;
mod vcs;

pub use compare::{compare, Change, Comparison, Verdict};
pub use config::{load_config, parse_config, FileConfig, CONFIG_FILE};
pub use parse::{parse_line, parse_test_output, PackageCoverage, PackageStatus};
pub use reference::{
    format_coverage, format_percent, parse_coverage, read_coverage, write_coverage, CoverageMap,
};
pub use report::{build_report, write_report};
pub use runner::{run_test_command, split_command, CommandOutput};
pub use vcs::{
    check_git_installed, commit_reference, locate_in_repository, push_reference,
    resolve_identity, Identity,
};

pub const DEFAULT_TEST_COMMAND: &str = "go test -mod=vendor -cover ./...";
pub const DEFAULT_REFERENCE: &str = "coverage.csv";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_REFSPEC: &str = "HEAD";
pub const DEFAULT_MESSAGE: &str = "Update coverage reference.";

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[93m";
const RESET: &str = "\x1b[0m";

#[derive(Parser, Debug, Default)]
#[command(
    name = "covref",
    version,
    about = "Run the test suite and fail when per-package coverage drops below the stored reference.",
    after_help = "\
Exit status:
  0  coverage improved, stayed the same, or a new reference was written
  1  coverage regressed for at least one package, or the run failed"
)]
pub struct Cli {
    /// Write the current coverage as the new reference without comparing
    #[arg(short = 'w', long, action = ArgAction::SetTrue)]
    pub write_new_ref: bool,

    /// Commit the reference file when coverage got better
    #[arg(short = 'c', long, action = ArgAction::SetTrue)]
    pub commit_better_ref: bool,

    /// Push after committing (implies --commit-better-ref)
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub push: bool,

    /// Remote to push to (default: origin, or `remote` from covref.toml)
    #[arg(long)]
    pub remote: Option<String>,

    /// Go import path; the project is looked up under $GOPATH/src
    #[arg(short, long, conflicts_with = "project_dir")]
    pub target: Option<String>,

    /// Project directory (default: current directory)
    #[arg(short = 'C', long)]
    pub project_dir: Option<PathBuf>,

    /// Reference file, relative to the project directory (default: coverage.csv)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Test command to run (default: go test -mod=vendor -cover ./...)
    #[arg(long)]
    pub test_command: Option<String>,

    /// Commit message for the updated reference
    #[arg(short, long)]
    pub message: Option<String>,

    /// Also write a JSON summary of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Perform a dry run (no files written, no git changes)
    #[arg(long)]
    pub dry_run: bool,

    /// Print debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a completed run decided. Only `Regressed` maps to a failing exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    Improved,
    Unchanged,
    Regressed,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Regressed => 1,
            _ => 0,
        }
    }
}

/// Logger threshold for a parsed command line.
pub fn log_level(cli: &Cli) -> log::LevelFilter {
    if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Resolve `$GOPATH/src/<target>`; falls back to `$HOME/go` like the go tool.
pub fn gopath_project_dir(target: &str) -> Result<PathBuf, Box<dyn Error>> {
    let gopath = match env::var_os("GOPATH").filter(|v| !v.is_empty()) {
        // GOPATH may be a list; the first entry is where `go get` puts sources.
        Some(list) => env::split_paths(&list)
            .next()
            .ok_or("GOPATH is set but contains no entries")?,
        None => {
            let home = env::var_os("HOME").ok_or("neither GOPATH nor HOME is set")?;
            PathBuf::from(home).join("go")
        }
    };
    Ok(gopath.join("src").join(target))
}

/// Pick the project directory from --target, --project-dir, or the current directory.
pub fn resolve_project_dir(cli: &Cli) -> Result<PathBuf, Box<dyn Error>> {
    let dir = if let Some(target) = &cli.target {
        gopath_project_dir(target)?
    } else if let Some(dir) = &cli.project_dir {
        dir.clone()
    } else {
        env::current_dir()?
    };
    if !dir.is_dir() {
        return Err(format!("project directory '{}' does not exist", dir.display()).into());
    }
    Ok(dir)
}

fn child_env(config: &FileConfig) -> Vec<(String, String)> {
    let mut env = vec![("GO111MODULE".to_string(), "on".to_string())];
    for (key, value) in &config.env {
        env.retain(|(k, _)| k != key);
        env.push((key.clone(), value.clone()));
    }
    env
}

fn log_comparison(cmp: &Comparison) {
    for change in &cmp.regressions {
        log::info!(
            "{}{}: {}% < {}%{}",
            RED,
            change.path,
            format_percent(change.current),
            format_percent(change.reference),
            RESET
        );
    }
    for change in &cmp.improvements {
        log::debug!(
            "{}: {}% > {}%",
            change.path,
            format_percent(change.current),
            format_percent(change.reference)
        );
    }
    for path in &cmp.new_paths {
        log::info!("new path (no reference): {}", path);
    }
    for path in &cmp.dropped_paths {
        log::warn!("path no longer reported: {}", path);
    }
}

fn finish(
    cli: &Cli,
    current: &CoverageMap,
    comparison: Option<&Comparison>,
    outcome: Outcome,
) -> Result<Outcome, Box<dyn Error>> {
    if let Some(path) = &cli.report {
        let report = build_report(current, comparison, comparison.map(Comparison::verdict));
        if cli.dry_run {
            log::info!("[dry-run] Would write report to '{}'", path.display());
        } else {
            write_report(path, &report)?;
        }
    }
    Ok(outcome)
}

pub fn execute_cli(cli: Cli) -> Result<Outcome, Box<dyn Error>> {
    let project_dir = resolve_project_dir(&cli)?;
    let config = load_config(&project_dir)?;
    log::debug!("Project directory: '{}'", project_dir.display());

    let reference_path = project_dir.join(
        cli.reference
            .clone()
            .or_else(|| config.reference.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REFERENCE)),
    );
    let reference = if reference_path.exists() {
        read_coverage(&reference_path)?
    } else if cli.write_new_ref {
        CoverageMap::new()
    } else {
        return Err(format!(
            "reference '{}' not found; run with --write-new-ref to create it",
            reference_path.display()
        )
        .into());
    };

    let command = cli
        .test_command
        .clone()
        .or_else(|| config.test_command.clone())
        .unwrap_or_else(|| DEFAULT_TEST_COMMAND.to_string());
    let output = run_test_command(&command, &project_dir, &child_env(&config))?;
    println!("{}", output.stdout);
    if !output.stderr.is_empty() {
        // go build and download diagnostics arrive on stderr.
        eprint!("{}", output.stderr);
    }
    let current = parse_test_output(&output.stdout);
    log::debug!("Parsed coverage for {} packages", current.len());

    if cli.write_new_ref {
        log::info!("Writing a new reference.");
        if cli.dry_run {
            log::info!("[dry-run] Would write '{}'", reference_path.display());
        } else {
            write_coverage(&current, &reference_path)?;
        }
        return finish(&cli, &current, None, Outcome::Written);
    }

    let comparison = compare(&current, &reference);
    log_comparison(&comparison);

    let outcome = match comparison.verdict() {
        Verdict::Worse => {
            log::info!("{}Coverage got worse!{}", RED, RESET);
            Outcome::Regressed
        }
        Verdict::Better => {
            log::info!(
                "{}Coverage got better. Writing new reference.{}",
                GREEN,
                RESET
            );
            if cli.dry_run {
                log::info!("[dry-run] Would write '{}'", reference_path.display());
            } else {
                write_coverage(&current, &reference_path)?;
            }
            if cli.commit_better_ref || cli.push {
                let message = cli
                    .message
                    .clone()
                    .or_else(|| config.message.clone())
                    .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
                let committed =
                    commit_reference(&reference_path, &config, &message, cli.dry_run)?;
                if cli.push && (committed || cli.dry_run) {
                    let remote = cli
                        .remote
                        .clone()
                        .or_else(|| config.remote.clone())
                        .unwrap_or_else(|| DEFAULT_REMOTE.to_string());
                    let refspec = config
                        .push_refspec
                        .clone()
                        .unwrap_or_else(|| DEFAULT_REFSPEC.to_string());
                    push_reference(&project_dir, &remote, &refspec, cli.dry_run)?;
                }
            }
            Outcome::Improved
        }
        Verdict::Same => {
            log::info!("{}Coverage stayed the same.{}", YELLOW, RESET);
            Outcome::Unchanged
        }
    };

    finish(&cli, &current, Some(&comparison), outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_env_overrides_default_go111module() {
        let config = FileConfig {
            env: vec![
                ("GO111MODULE".to_string(), "off".to_string()),
                ("GOFLAGS".to_string(), "-count=1".to_string()),
            ],
            ..FileConfig::default()
        };
        let env = child_env(&config);
        assert_eq!(
            env,
            vec![
                ("GO111MODULE".to_string(), "off".to_string()),
                ("GOFLAGS".to_string(), "-count=1".to_string()),
            ]
        );
    }

    #[test]
    fn only_regression_fails() {
        assert_eq!(Outcome::Regressed.exit_code(), 1);
        assert_eq!(Outcome::Improved.exit_code(), 0);
        assert_eq!(Outcome::Unchanged.exit_code(), 0);
        assert_eq!(Outcome::Written.exit_code(), 0);
    }
}
