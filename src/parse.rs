//! Parsing of `go test -cover` summary lines.
//!
//! The runner prints one summary line per package, e.g.
//!
//! ```text
//! ok  	github.com/acme/proxy	(cached)	coverage: 0.0% of statements [no tests to run]
//! ok  	github.com/acme/proxy/router	0.012s	coverage: 81.2% of statements
//! ?   	github.com/acme/proxy/cmd	[no test files]
//! 	github.com/acme/proxy/api		coverage: 0.0% of statements
//! ```
//!
//! Anything else (download notices, `PASS`, test logs) is skipped.

use crate::reference::CoverageMap;
use once_cell::sync::Lazy;
use regex::Regex;

static SUMMARY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<status>ok|\?|FAIL)\s+(?P<package>\S+)(?P<rest>.*)$")
        .expect("summary regex is valid")
});

// go >= 1.22 reports packages without test files with a leading tab and no status.
static UNTESTED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+(?P<package>[^\s:]+)\s+(?P<rest>coverage:.*)$")
        .expect("untested regex is valid")
});

static PERCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"coverage:\s+(?P<percent>\d+(?:\.\d+)?)%").expect("percent regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    Ok,
    NoTestFiles,
    Failed,
    Untested,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageCoverage {
    pub status: PackageStatus,
    pub package: String,
    pub percent: f64,
}

/// Parse a single summary line. Packages without a reported percentage count as 0%.
pub fn parse_line(line: &str) -> Option<PackageCoverage> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }
    let (status, caps) = if let Some(caps) = SUMMARY_LINE.captures(line) {
        let status = match &caps["status"] {
            "ok" => PackageStatus::Ok,
            "?" => PackageStatus::NoTestFiles,
            _ => PackageStatus::Failed,
        };
        (status, caps)
    } else if let Some(caps) = UNTESTED_LINE.captures(line) {
        (PackageStatus::Untested, caps)
    } else {
        return None;
    };

    let percent = PERCENT
        .captures(&caps["rest"])
        .and_then(|p| p["percent"].parse::<f64>().ok())
        .unwrap_or(0.0);

    Some(PackageCoverage {
        status,
        package: caps["package"].to_string(),
        percent,
    })
}

/// Build the coverage mapping from a runner's stdout. Later lines win on duplicate packages.
pub fn parse_test_output(output: &str) -> CoverageMap {
    let mut map = CoverageMap::new();
    for line in output.lines() {
        match parse_line(line) {
            Some(entry) => {
                if entry.status == PackageStatus::Failed {
                    log::warn!("package '{}' reported FAIL", entry.package);
                }
                map.insert(entry.package, entry.percent);
            }
            None if !line.trim().is_empty() => {
                log::debug!("skipping non-summary line: {}", line);
            }
            None => {}
        }
    }
    map
}
