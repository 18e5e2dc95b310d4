use crate::compare::{Change, Comparison, Verdict};
use crate::reference::CoverageMap;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::error::Error;
use std::fs;
use std::path::Path;

fn changes(list: &[Change]) -> Value {
    Value::Array(
        list.iter()
            .map(|c| json!({ "path": c.path, "current": c.current, "reference": c.reference }))
            .collect(),
    )
}

/// Build the JSON summary of one run.
pub fn build_report(
    current: &CoverageMap,
    comparison: Option<&Comparison>,
    verdict: Option<Verdict>,
) -> Value {
    let empty = Comparison::default();
    let cmp = comparison.unwrap_or(&empty);
    json!({
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "verdict": verdict.map(Verdict::as_str),
        "coverage": current,
        "regressions": changes(&cmp.regressions),
        "improvements": changes(&cmp.improvements),
        "new_paths": cmp.new_paths,
        "dropped_paths": cmp.dropped_paths,
    })
}

pub fn write_report(path: &Path, report: &Value) -> Result<(), Box<dyn Error>> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    log::debug!("Wrote report to '{}'", path.display());
    Ok(())
}
