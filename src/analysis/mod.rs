//! The use analyzer: compares the symbol uses reported for a file against
//! the `#include`s and forward declarations it actually wrote, classifies
//! each use as satisfied or a violation, and derives the desired include
//! set. Runs only after the preprocessor observer has been finalized.

use std::collections::BTreeSet;

use log::debug;

use crate::file_info::{Decl, OneIncludeOrForwardDeclareLine, OneUse, UseKind};
use crate::preprocessor::PreprocessorObserver;
use crate::source::FileId;

/// The outcome of analyzing one file: its original lines with desire flags
/// and symbol annotations filled in, the new lines the file should gain,
/// and the violation messages to show the user.
#[derive(Debug, Default)]
pub struct FileDiff {
    pub path: String,
    /// Lines present in the source, annotated.
    pub lines: Vec<OneIncludeOrForwardDeclareLine>,
    /// Lines the analysis wants added (is_present is false on all of them).
    pub additions: Vec<OneIncludeOrForwardDeclareLine>,
    pub violations: Vec<String>,
}

impl FileDiff {
    fn empty(path: String) -> Self {
        FileDiff {
            path,
            ..Default::default()
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.additions.is_empty()
            || self
                .lines
                .iter()
                .any(|line| line.is_present && !line.is_desired)
    }
}

/// Classifies every recorded use for `file` and computes the include diff.
/// `handle_preprocessing_done()` must have run first.
pub fn analyze_file(observer: &PreprocessorObserver, file: FileId) -> FileDiff {
    assert!(
        observer.preprocessing_done(),
        "analysis requires handle_preprocessing_done() to have run"
    );
    let files = observer.files();
    let picker = observer.picker();
    let path = files.path(file).to_string();
    let Some(info) = observer.file_info_for(file) else {
        return FileDiff::empty(path);
    };

    // A .cc file gets credit for everything its internal headers (foo.h,
    // foo-inl.h) already include or forward-declare.
    let mut associated_includes: BTreeSet<String> = BTreeSet::new();
    let mut associated_fwd_declares: BTreeSet<String> = BTreeSet::new();
    for internal in &info.internal_headers {
        if let Some(internal_info) = observer.file_info_for(*internal) {
            associated_includes.extend(internal_info.direct_includes.iter().cloned());
            associated_includes.insert(internal_info.quoted_file.clone());
            associated_fwd_declares
                .extend(internal_info.direct_forward_declares.iter().cloned());
        }
    }

    let mut diff = FileDiff::empty(path.clone());
    diff.lines = info.lines.clone();

    // Protected includes (pragma keep/export, non-header includes,
    // re-exports) and the file's own internal headers are desired no
    // matter what: foo.cc always keeps its #include "foo.h".
    for line in diff.lines.iter_mut() {
        if let Some(quoted) = &line.quoted_include {
            if info.protected_includes.contains(quoted) {
                line.is_desired = true;
            }
            if let Some(included_file) = observer.include_to_file(quoted) {
                if info.internal_headers.contains(&included_file) {
                    line.is_desired = true;
                }
            }
        }
    }

    let mut desired_includes: BTreeSet<String> = info.protected_includes.clone();
    let mut reported_symbols: BTreeSet<String> = BTreeSet::new();

    for use_ in &info.symbol_uses {
        if use_.ignore_use {
            continue;
        }

        // A use of something this file (or an internal header) declares
        // itself needs no include at all.
        if let Some(decl_file) = files.lookup(&use_.decl_filepath) {
            if decl_file == file || info.internal_headers.contains(&decl_file) {
                continue;
            }
        }

        // Candidate headers: the symbol map for decl-less (macro) uses,
        // falling back to the file map; the friend exemption and as-written
        // spelling substitution both live inside the picker call.
        let mut candidates: Vec<String> = if use_.decl.is_none() {
            let from_symbol_map = picker.get_candidate_headers_for_symbol(&use_.symbol_name);
            if from_symbol_map.is_empty() {
                picker.get_candidate_headers_for_filepath_included_from(
                    &use_.decl_filepath,
                    &path,
                )
            } else {
                from_symbol_map
                    .into_iter()
                    .map(|m| m.quoted_include)
                    .collect()
            }
        } else {
            picker.get_candidate_headers_for_filepath_included_from(&use_.decl_filepath, &path)
        };

        candidates.retain(|candidate| !observer.include_is_inhibited(file, candidate));
        if candidates.is_empty() {
            continue; // Every way to satisfy this use is suppressed.
        }

        match use_.kind {
            UseKind::ForwardDeclareUse => {
                // A declaration anywhere in reach is enough.
                if info.direct_forward_declares.contains(&use_.symbol_name)
                    || associated_fwd_declares.contains(&use_.symbol_name)
                {
                    mark_fwd_decl_desired(&mut diff.lines, &use_.symbol_name);
                    continue;
                }
                let satisfied = satisfy_through_includes(
                    observer,
                    &mut diff,
                    &desired_includes,
                    &associated_includes,
                    use_,
                    &candidates,
                );
                if satisfied.is_some() {
                    continue;
                }
                if observer.forward_declare_is_inhibited(file, &use_.symbol_name) {
                    continue;
                }
                let Some(decl) = &use_.decl else {
                    continue; // Only decls can be forward-declared.
                };
                if reported_symbols.insert(use_.symbol_name.clone()) {
                    add_fwd_decl_line(&mut diff.additions, decl);
                    diff.violations
                        .push(format_fwd_declare_violation(observer, use_));
                }
            }
            UseKind::FullUse => {
                let satisfied = satisfy_through_includes(
                    observer,
                    &mut diff,
                    &desired_includes,
                    &associated_includes,
                    use_,
                    &candidates,
                );
                if let Some(chosen) = satisfied {
                    debug!(
                        "{}: use of {} satisfied by {}",
                        files.location_str(use_.use_loc),
                        use_.symbol_name,
                        chosen
                    );
                    continue;
                }
                // Violation: pick the first candidate, the map's canonical
                // ordering puts the best header first.
                let chosen = candidates[0].clone();
                desired_includes.insert(chosen.clone());
                add_include_line(&mut diff.additions, &chosen, &use_.short_symbol_name);
                if reported_symbols.insert(use_.symbol_name.clone()) {
                    diff.violations
                        .push(format_full_use_violation(observer, use_, &chosen));
                }
            }
        }
    }

    diff
}

/// Tries to satisfy a use with an include that is already present, already
/// scheduled for addition, provided by an internal header, or whose target
/// intends to provide the symbol's file. Returns the satisfying quoted
/// include and annotates the line it credits.
fn satisfy_through_includes(
    observer: &PreprocessorObserver,
    diff: &mut FileDiff,
    desired_includes: &BTreeSet<String>,
    associated_includes: &BTreeSet<String>,
    use_: &OneUse,
    candidates: &[String],
) -> Option<String> {
    // Prefer an already-present include over adding a new one.
    for candidate in candidates {
        if let Some(line) = find_present_include(&mut diff.lines, candidate) {
            line.is_desired = true;
            line.add_symbol_use(&use_.short_symbol_name);
            return Some(candidate.clone());
        }
        if associated_includes.contains(candidate) {
            // Provided by an internal header; nothing to annotate here.
            return Some(candidate.clone());
        }
        if desired_includes.contains(candidate) {
            if let Some(line) = find_addition(&mut diff.additions, candidate) {
                line.add_symbol_use(&use_.short_symbol_name);
            }
            return Some(candidate.clone());
        }
    }

    // A present include whose target is a public mapper provides its whole
    // include closure: <vector> is allowed to hand out std::allocator even
    // though <memory> defines it. Ordinary headers only provide what they
    // include directly, which step one above already covered through the
    // candidate list.
    let decl_file = observer.files().lookup(&use_.decl_filepath)?;
    for line in diff.lines.iter_mut() {
        let Some(quoted) = line.quoted_include.clone() else {
            continue;
        };
        if !line.is_present {
            continue;
        }
        let Some(included_file) = observer.include_to_file(&quoted) else {
            continue;
        };
        if observer.provides_full_closure(included_file)
            && observer.public_header_intends_to_provide(included_file, decl_file)
        {
            line.is_desired = true;
            line.add_symbol_use(&use_.short_symbol_name);
            return Some(quoted);
        }
    }
    for quoted in associated_includes {
        if let Some(included_file) = observer.include_to_file(quoted) {
            if observer.provides_full_closure(included_file)
                && observer.public_header_intends_to_provide(included_file, decl_file)
            {
                return Some(quoted.clone());
            }
        }
    }
    None
}

fn find_present_include<'a>(
    lines: &'a mut [OneIncludeOrForwardDeclareLine],
    quoted: &str,
) -> Option<&'a mut OneIncludeOrForwardDeclareLine> {
    lines
        .iter_mut()
        .find(|l| l.is_present && l.quoted_include.as_deref() == Some(quoted))
}

fn find_addition<'a>(
    additions: &'a mut [OneIncludeOrForwardDeclareLine],
    quoted: &str,
) -> Option<&'a mut OneIncludeOrForwardDeclareLine> {
    additions
        .iter_mut()
        .find(|l| l.quoted_include.as_deref() == Some(quoted))
}

fn mark_fwd_decl_desired(lines: &mut [OneIncludeOrForwardDeclareLine], qualified_name: &str) {
    if let Some(line) = lines.iter_mut().find(|l| {
        l.fwd_decl
            .as_ref()
            .map(|d| d.qualified_name == qualified_name)
            .unwrap_or(false)
    }) {
        line.is_desired = true;
    }
}

fn add_include_line(
    additions: &mut Vec<OneIncludeOrForwardDeclareLine>,
    quoted: &str,
    symbol: &str,
) {
    if let Some(line) = find_addition(additions, quoted) {
        line.add_symbol_use(symbol);
        return;
    }
    let mut line = OneIncludeOrForwardDeclareLine::desired_include(quoted);
    line.add_symbol_use(symbol);
    additions.push(line);
}

fn add_fwd_decl_line(additions: &mut Vec<OneIncludeOrForwardDeclareLine>, decl: &Decl) {
    let already_there = additions.iter().any(|l| {
        l.fwd_decl
            .as_ref()
            .map(|d| d.qualified_name == decl.qualified_name)
            .unwrap_or(false)
    });
    if !already_there {
        additions.push(OneIncludeOrForwardDeclareLine::desired_fwd_decl(decl));
    }
}

fn format_full_use_violation(
    observer: &PreprocessorObserver,
    use_: &OneUse,
    suggested: &str,
) -> String {
    let mut msg = format!(
        "{}: warning: {} is defined in {}, which isn't directly #included",
        observer.files().location_str(use_.use_loc),
        use_.symbol_name,
        suggested,
    );
    if !use_.comment.is_empty() {
        msg.push_str(&format!(" {}", use_.comment));
    }
    msg
}

fn format_fwd_declare_violation(observer: &PreprocessorObserver, use_: &OneUse) -> String {
    let mut msg = format!(
        "{}: warning: {} needs a declaration, but does not provide or directly #include one",
        observer.files().location_str(use_.use_loc),
        use_.symbol_name,
    );
    if !use_.comment.is_empty() {
        msg.push_str(&format!(" {}", use_.comment));
    }
    msg
}
