//! Cross-file macro reference tracking. Macro uses can't be checked as they
//! are seen: a macro body may call a macro that is only defined later in
//! another header, so references from inside macro bodies are deferred and
//! replayed once the whole translation unit has been read.

use std::collections::HashMap;

use log::debug;

use crate::file_info::FileInfoStore;
use crate::source::{SourceFiles, SourceLocation};

use super::ReportScope;

#[derive(Default)]
pub struct MacroUseTracker {
    /// Macro name to where it was `#define`d. Re-definitions overwrite; that
    /// can misattribute uses between an #undef/re-define pair, which is rare
    /// enough to live with.
    macros_definition_loc: HashMap<String, SourceLocation>,
    /// Identifier tokens seen inside macro bodies, replayed after
    /// preprocessing.
    macros_called_from_macros: Vec<(String, SourceLocation)>,
}

impl MacroUseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_definition(&mut self, name: &str, loc: SourceLocation) {
        self.macros_definition_loc.insert(name.to_string(), loc);
    }

    pub fn definition_loc(&self, name: &str) -> Option<SourceLocation> {
        self.macros_definition_loc.get(name).copied()
    }

    pub fn record_macro_called_from_macro(&mut self, name: &str, loc: SourceLocation) {
        self.macros_called_from_macros.push((name.to_string(), loc));
    }

    /// Records a full use of `name` at `usage_loc`, attributed to the file
    /// that defined it. Uses whose definition is `<built-in>` are dropped;
    /// a macro reference is never a forward-declare use.
    pub fn report_macro_use(
        &self,
        store: &mut FileInfoStore,
        files: &SourceFiles,
        scope: &ReportScope,
        name: &str,
        usage_loc: SourceLocation,
        dfn_loc: SourceLocation,
    ) {
        let used_in = usage_loc.file;
        if !scope.should_report(files, used_in) {
            return;
        }
        let defined_path = files.path(dfn_loc.file);
        if defined_path == "<built-in>" {
            return;
        }
        debug!(
            "[ use macro ] {}: {} (from {})",
            files.location_str(usage_loc),
            name,
            files.location_str(dfn_loc)
        );
        let defined_path = defined_path.to_string();
        let used_in_path = files.path(used_in).to_string();
        store
            .get_or_create(used_in, &used_in_path)
            .report_full_symbol_use_by_name(usage_loc, &defined_path, name);
    }

    /// Looks `name` up among the seen `#define`s and reports a use if found.
    /// An `#ifdef FOO` with no definition anywhere is deliberately silent: a
    /// `#define FOO` elsewhere does not mean everyone testing FOO uses that
    /// header.
    pub fn find_and_report_macro_use(
        &self,
        store: &mut FileInfoStore,
        files: &SourceFiles,
        scope: &ReportScope,
        name: &str,
        loc: SourceLocation,
    ) {
        if let Some(dfn_loc) = self.definition_loc(name) {
            self.report_macro_use(store, files, scope, name, loc, dfn_loc);
        }
    }

    /// Replays every deferred macro-from-macro reference. Call once, after
    /// all files have been read.
    pub fn replay_deferred_uses(
        &mut self,
        store: &mut FileInfoStore,
        files: &SourceFiles,
        scope: &ReportScope,
    ) {
        let deferred = std::mem::take(&mut self.macros_called_from_macros);
        for (name, loc) in &deferred {
            self.find_and_report_macro_use(store, files, scope, name, *loc);
        }
    }
}
