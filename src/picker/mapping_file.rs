//! Loading of user mapping files: a YAML (or JSON) sequence of `include`,
//! `symbol` and `ref` directives. Errors in a mapping file abort that file
//! with a `file:line:col: message` diagnostic on stderr, but never the run.

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde_yaml::Value;

use super::{IncludePicker, MappedInclude, Visibility};
use crate::paths::{is_absolute_path, make_absolute_path, parent_path};

/// One element of a mapping file. Externally tagged, so the YAML shape is
/// `- include: [from, from-visibility, to, to-visibility]` and friends.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MappingDirective {
    Include([String; 4]),
    Symbol([String; 4]),
    Ref(String),
}

impl IncludePicker {
    /// Adds a directory to the search path used to resolve relative mapping
    /// file names.
    pub fn add_mapping_file_search_path(&mut self, path: &str) {
        let absolute = make_absolute_path(
            &std::env::current_dir().unwrap_or_default(),
            path,
        )
        .to_string_lossy()
        .into_owned();
        if !self.mapping_file_search_path.contains(&absolute) {
            debug!("adding mapping file search path: {}", absolute);
            self.mapping_file_search_path.push(absolute);
        }
    }

    /// Parses a mapping file and applies its directives:
    ///
    /// ```yaml
    /// - include: ["<private.h>", private, "<public.h>", public]
    /// - symbol: [Symbol, private, "<public.h>", public]
    /// - ref: "other.imp"
    /// ```
    ///
    /// YAML is a superset of JSON, so JSON mapping files parse as well.
    /// `ref`s resolve relative to the referring file first, then the search
    /// path.
    pub fn add_mappings_from_file(&mut self, filename: &str) {
        let (absolute_path, contents) = match self.try_read_mapping_file(filename) {
            Ok(found) => found,
            Err(err) => {
                eprintln!("cannot open mapping file '{}': {}", filename, err);
                return;
            }
        };

        let root: Value = match serde_yaml::from_str(&contents) {
            Ok(value) => value,
            Err(err) => {
                let (line, col) = err
                    .location()
                    .map(|l| (l.line(), l.column()))
                    .unwrap_or((1, 1));
                eprintln!("{}:{}:{}: {}", absolute_path, line, col, err);
                return;
            }
        };

        let entries = match root {
            Value::Sequence(entries) => entries,
            _ => {
                eprintln!("{}:1:1: root element must be an array", absolute_path);
                return;
            }
        };

        let entry_lines = sequence_entry_lines(&contents);
        for (index, entry) in entries.into_iter().enumerate() {
            let (line, col) = entry_lines.get(index).copied().unwrap_or((1, 1));
            let directive: MappingDirective = match serde_yaml::with::singleton_map::deserialize(entry)
            {
                Ok(directive) => directive,
                Err(err) => {
                    // Diagnose and skip the rest of the file; entries that
                    // already applied stay applied.
                    eprintln!("{}:{}:{}: {}", absolute_path, line, col, err);
                    return;
                }
            };
            if !self.apply_mapping_directive(directive, &absolute_path, line, col) {
                return;
            }
        }
    }

    /// Applies one directive; false aborts the file.
    fn apply_mapping_directive(
        &mut self,
        directive: MappingDirective,
        filename: &str,
        line: usize,
        col: usize,
    ) -> bool {
        let diag = |message: String| {
            eprintln!("{}:{}:{}: {}", filename, line, col, message);
            false
        };

        match directive {
            MappingDirective::Include([from, from_vis, to, to_vis]) => {
                let Some(from_visibility) = parse_visibility(&from_vis) else {
                    return diag(format!("unknown visibility '{}'", from_vis));
                };
                let Some(to_visibility) = parse_visibility(&to_vis) else {
                    return diag(format!("unknown visibility '{}'", to_vis));
                };
                self.add_include_mapping(
                    &from,
                    from_visibility,
                    MappedInclude::new(to),
                    to_visibility,
                );
            }
            MappingDirective::Symbol([symbol, from_vis, to, to_vis]) => {
                // The from-side visibility is shape-checked only; symbol
                // keys are always private.
                if parse_visibility(&from_vis).is_none() {
                    return diag(format!("unknown visibility '{}'", from_vis));
                }
                let Some(to_visibility) = parse_visibility(&to_vis) else {
                    return diag(format!("unknown visibility '{}'", to_vis));
                };
                self.add_symbol_mapping(&symbol, MappedInclude::new(to), to_visibility);
            }
            MappingDirective::Ref(ref_file) => {
                if ref_file.is_empty() {
                    return diag("mapping ref expects a single filename value".to_string());
                }
                // Let refs resolve relative to the file that names them.
                self.add_mapping_file_search_path(&parent_path(filename));
                self.add_mappings_from_file(&ref_file);
            }
        }
        true
    }

    fn try_read_mapping_file(&self, filename: &str) -> Result<(String, String), String> {
        let absolute_path = if is_absolute_path(filename) {
            debug!("absolute mapping filename: {}", filename);
            filename.to_string()
        } else {
            debug!("relative mapping filename: {}; scanning search path", filename);
            let mut found = None;
            for dir in &self.mapping_file_search_path {
                let candidate = make_absolute_path(Path::new(dir), filename);
                if candidate.exists() {
                    debug!("found mapping file: {}", candidate.display());
                    found = Some(candidate.to_string_lossy().into_owned());
                    break;
                }
            }
            found.ok_or_else(|| "not found in mapping file search path".to_string())?
        };

        let contents = fs::read_to_string(&absolute_path)
            .map_err(|e| format!("failed to read {}: {}", absolute_path, e))?;
        Ok((absolute_path, contents))
    }
}

fn parse_visibility(s: &str) -> Option<Visibility> {
    match s {
        "private" => Some(Visibility::Private),
        "public" => Some(Visibility::Public),
        _ => None,
    }
}

/// 1-based (line, column) of each top-level sequence entry, found by
/// scanning for `- ` item markers at the shallowest indentation. Used to
/// point diagnostics at the offending directive; falls back to 1:1 for
/// flow-style (JSON) documents.
fn sequence_entry_lines(contents: &str) -> Vec<(usize, usize)> {
    let mut entries = Vec::new();
    let mut min_indent = usize::MAX;
    for (idx, line) in contents.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("- ") || trimmed == "-" {
            let indent = line.len() - trimmed.len();
            if indent < min_indent {
                min_indent = indent;
                entries.clear();
            }
            if indent == min_indent {
                entries.push((idx + 1, indent + 1));
            }
        }
    }
    entries
}
