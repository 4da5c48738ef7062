//! Rendering of an analysis result into the three-part diff the user sees:
//! lines to add, lines to remove, and the full desired include list with
//! `// for Symbol` annotations.

use std::fmt;

use crate::analysis::FileDiff;
use crate::file_info::OneIncludeOrForwardDeclareLine;
use crate::paths::get_canonical_name;

/// Canonical ordering of include lines: the file's own header first, then C
/// system headers, C++ system headers, project headers, and forward
/// declarations last. Alphabetical within each group.
fn include_sort_key(diff_path: &str, line: &OneIncludeOrForwardDeclareLine) -> (u8, String) {
    match &line.quoted_include {
        Some(quoted) => {
            let category = if get_canonical_name(quoted) == get_canonical_name(diff_path) {
                0 // The associated header of this source file.
            } else if quoted.starts_with('<') && quoted.ends_with(".h>") {
                1
            } else if quoted.starts_with('<') {
                2
            } else {
                3
            };
            (category, quoted.clone())
        }
        None => (4, line.line.clone()),
    }
}

fn annotated(line: &OneIncludeOrForwardDeclareLine) -> String {
    if line.symbol_counts.is_empty() || !line.is_include_line() {
        return line.line.clone();
    }
    let symbols: Vec<&str> = line
        .symbol_counts
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    format!("{}  // for {}", line.line, symbols.join(", "))
}

/// The rendered report for one file.
pub struct FileReport {
    pub path: String,
    pub additions: Vec<String>,
    /// Removal lines, already formatted with their line-number ranges.
    pub removals: Vec<String>,
    pub full_include_list: Vec<String>,
    pub violations: Vec<String>,
    pub has_changes: bool,
}

impl FileReport {
    pub fn from_diff(diff: &FileDiff) -> Self {
        let mut additions: Vec<&OneIncludeOrForwardDeclareLine> =
            diff.additions.iter().collect();
        additions.sort_by_key(|l| include_sort_key(&diff.path, l));

        let removals: Vec<String> = diff
            .lines
            .iter()
            .filter(|l| l.is_present && !l.is_desired)
            .map(|l| format!("- {}  // {}", l.line, l.line_number_range()))
            .collect();

        let mut full: Vec<&OneIncludeOrForwardDeclareLine> = diff
            .lines
            .iter()
            .filter(|l| l.is_desired)
            .chain(diff.additions.iter())
            .collect();
        full.sort_by_key(|l| include_sort_key(&diff.path, l));

        FileReport {
            path: diff.path.clone(),
            additions: additions.into_iter().map(annotated).collect(),
            removals,
            full_include_list: full.into_iter().map(annotated).collect(),
            violations: diff.violations.clone(),
            has_changes: diff.has_changes(),
        }
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes {
            return writeln!(f, "({} has correct #includes/fwd-decls)", self.path);
        }

        writeln!(f, "{} should add these lines:", self.path)?;
        for line in &self.additions {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)?;

        writeln!(f, "{} should remove these lines:", self.path)?;
        for line in &self.removals {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)?;

        writeln!(f, "The full include-list for {}:", self.path)?;
        for line in &self.full_include_list {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
