use crate::reference::CoverageMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Worse,
    Better,
    Same,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Worse => "worse",
            Verdict::Better => "better",
            Verdict::Same => "same",
        }
    }
}

/// A package whose coverage moved between the reference and the current run.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: String,
    pub current: f64,
    pub reference: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub regressions: Vec<Change>,
    pub improvements: Vec<Change>,
    /// Present in the run but not in the reference; counted as improved.
    pub new_paths: Vec<String>,
    /// Present in the reference but not in the run; informational only.
    pub dropped_paths: Vec<String>,
}

impl Comparison {
    pub fn verdict(&self) -> Verdict {
        if !self.regressions.is_empty() {
            Verdict::Worse
        } else if !self.improvements.is_empty() || !self.new_paths.is_empty() {
            Verdict::Better
        } else {
            Verdict::Same
        }
    }
}

/// Compare `current` against `reference` key by key using strict `<` / `>`.
pub fn compare(current: &CoverageMap, reference: &CoverageMap) -> Comparison {
    let mut result = Comparison::default();
    for (path, &now) in current {
        match reference.get(path) {
            None => result.new_paths.push(path.clone()),
            Some(&before) if now < before => result.regressions.push(Change {
                path: path.clone(),
                current: now,
                reference: before,
            }),
            Some(&before) if now > before => result.improvements.push(Change {
                path: path.clone(),
                current: now,
                reference: before,
            }),
            Some(_) => {}
        }
    }
    result.dropped_paths = reference
        .keys()
        .filter(|k| !current.contains_key(*k))
        .cloned()
        .collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> CoverageMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn regression_wins_over_improvement() {
        let reference = map(&[("a", 50.0), ("b", 50.0)]);
        let current = map(&[("a", 49.9), ("b", 90.0), ("c", 1.0)]);
        let cmp = compare(&current, &reference);
        assert_eq!(cmp.verdict(), Verdict::Worse);
        assert_eq!(cmp.regressions.len(), 1);
        assert_eq!(cmp.regressions[0].path, "a");
        assert_eq!(cmp.improvements.len(), 1);
        assert_eq!(cmp.new_paths, vec!["c".to_string()]);
    }

    #[test]
    fn dropped_paths_do_not_change_verdict() {
        let reference = map(&[("a", 50.0), ("gone", 99.0)]);
        let current = map(&[("a", 50.0)]);
        let cmp = compare(&current, &reference);
        assert_eq!(cmp.verdict(), Verdict::Same);
        assert_eq!(cmp.dropped_paths, vec!["gone".to_string()]);
    }
}
