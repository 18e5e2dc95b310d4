use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Package identifier -> coverage percentage for one test run.
pub type CoverageMap = BTreeMap<String, f64>;

/// Read a semicolon-delimited reference file (`identifier;percentage`, no header).
pub fn read_coverage(path: &Path) -> Result<CoverageMap, Box<dyn Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read reference '{}': {}", path.display(), e))?;
    parse_coverage(&contents).map_err(|e| format!("{}: {}", path.display(), e).into())
}

/// Write `map` to `path`, replacing any previous content.
pub fn write_coverage(map: &CoverageMap, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, format_coverage(map))
        .map_err(|e| format!("failed to write reference '{}': {}", path.display(), e))?;
    log::debug!("Wrote {} entries to '{}'", map.len(), path.display());
    Ok(())
}

pub fn parse_coverage(contents: &str) -> Result<CoverageMap, Box<dyn Error>> {
    let mut map = CoverageMap::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        // Percentages never contain ';', so the last one is the column separator.
        let (key, value) = line
            .rsplit_once(';')
            .ok_or_else(|| format!("line {}: expected 'identifier;percentage'", idx + 1))?;
        let percent: f64 = value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p: &f64| p.is_finite() && (0.0..=100.0).contains(p))
            .ok_or_else(|| format!("line {}: invalid percentage '{}'", idx + 1, value.trim()))?;
        map.insert(unquote(key), percent);
    }
    Ok(map)
}

pub fn format_coverage(map: &CoverageMap) -> String {
    let mut out = String::new();
    for (key, percent) in map {
        out.push_str(&quote(key));
        out.push(';');
        out.push_str(&format_percent(*percent));
        out.push('\n');
    }
    out
}

/// Shortest representation that round-trips, always with a fractional part (`80.0`).
pub fn format_percent(percent: f64) -> String {
    format!("{:?}", percent)
}

fn quote(field: &str) -> String {
    if field.contains(';') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn unquote(field: &str) -> String {
    if field.len() >= 2 && field.starts_with('"') && field.ends_with('"') {
        field[1..field.len() - 1].replace("\"\"", "\"")
    } else {
        field.to_string()
    }
}
