//! The preprocessor observer: consumes the stream of preprocessor events
//! for a translation unit (file enter/exit, `#include`, macro define and
//! expand, `#if`/`#ifdef`), builds the include graph and the per-file
//! records, routes in-source pragmas to the include picker, and, once
//! preprocessing is done, computes the *intends-to-provide* and
//! *transitive-include* relations the analyzer runs on.

pub mod lexer;
pub mod macros;
pub mod pragmas;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use log::debug;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::file_info::{FileInfo, FileInfoStore};
use crate::paths::{convert_to_quoted_include, get_canonical_name, is_header_file};
use crate::picker::IncludePicker;
use crate::source::{FileId, SourceFiles, SourceLocation};

use macros::MacroUseTracker;

/// Which files violations are reported for: the main compilation unit plus
/// anything matching a user-supplied glob. Glob matching follows the
/// shell's pathname rule: `*` does not cross `/`.
pub struct ReportScope {
    main_canonical_name: Option<String>,
    globs: Vec<Glob>,
    glob_set: GlobSet,
}

impl Default for ReportScope {
    fn default() -> Self {
        ReportScope {
            main_canonical_name: None,
            globs: Vec::new(),
            glob_set: GlobSet::empty(),
        }
    }
}

impl ReportScope {
    fn add_glob(&mut self, pattern: &str) -> Result<(), String> {
        // Shell pathname semantics: * and ? never cross a `/`.
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| format!("bad glob '{}': {}", pattern, e))?;
        self.globs.push(glob);
        let mut builder = GlobSetBuilder::new();
        for g in &self.globs {
            builder.add(g.clone());
        }
        self.glob_set = builder
            .build()
            .map_err(|e| format!("bad glob '{}': {}", pattern, e))?;
        Ok(())
    }

    pub fn should_report(&self, files: &SourceFiles, file: FileId) -> bool {
        let path = files.path(file);
        if let Some(main_canonical) = &self.main_canonical_name {
            if get_canonical_name(path) == *main_canonical {
                return true;
            }
        }
        self.glob_set.is_match(path)
    }
}

/// Per-file suppressions and export ranges collected from pragmas.
#[derive(Default)]
pub struct PragmaTables {
    /// (file, line) pairs inside a begin_exports/end_exports block.
    pub exported_lines: HashSet<(FileId, u32)>,
    /// Includes the file refuses to have suggested.
    pub no_include_map: HashMap<FileId, BTreeSet<String>>,
    /// Symbols the file refuses to have forward-declare suggestions for.
    pub no_forward_declare_map: HashMap<FileId, BTreeSet<String>>,
}

pub struct PreprocessorObserver {
    files: SourceFiles,
    picker: IncludePicker,
    store: FileInfoStore,
    macro_tracker: MacroUseTracker,
    scope: ReportScope,
    pragma_tables: PragmaTables,

    include_graph: DiGraph<FileId, ()>,
    graph_nodes: HashMap<FileId, NodeIndex>,

    /// Quoted include spelling to the file it resolved to. With
    /// `#include_next` one spelling can name several files; the first one
    /// seen wins.
    include_to_file: HashMap<String, FileId>,

    main_file: Option<FileId>,
    files_to_report: BTreeSet<FileId>,
    pragmas_processed: HashSet<FileId>,

    intends_to_provide_map: HashMap<FileId, BTreeSet<FileId>>,
    transitive_include_map: HashMap<FileId, BTreeSet<FileId>>,
    /// Files whose provide-set covers a whole include closure: public
    /// mappers and the private headers behind them. Other files only
    /// provide their direct includes.
    expanded_providers: BTreeSet<FileId>,
    preprocessing_done: bool,
}

impl PreprocessorObserver {
    pub fn new(picker: IncludePicker) -> Self {
        PreprocessorObserver {
            files: SourceFiles::new(),
            picker,
            store: FileInfoStore::new(),
            macro_tracker: MacroUseTracker::new(),
            scope: ReportScope::default(),
            pragma_tables: PragmaTables::default(),
            include_graph: DiGraph::new(),
            graph_nodes: HashMap::new(),
            include_to_file: HashMap::new(),
            main_file: None,
            files_to_report: BTreeSet::new(),
            pragmas_processed: HashSet::new(),
            intends_to_provide_map: HashMap::new(),
            transitive_include_map: HashMap::new(),
            expanded_providers: BTreeSet::new(),
            preprocessing_done: false,
        }
    }

    // ---- File registration (driver side).

    pub fn add_source_file(&mut self, path: &str, contents: String) -> FileId {
        self.files.add_file(path, contents)
    }

    pub fn intern_file(&mut self, path: &str) -> FileId {
        self.files.intern(path)
    }

    /// Also check files matching this glob, not just the main compilation
    /// unit.
    pub fn add_glob_to_report_violations_for(&mut self, pattern: &str) -> Result<(), String> {
        self.scope.add_glob(pattern)
    }

    fn is_builtin_file(&self, file: FileId) -> bool {
        let path = self.files.path(file);
        path == "<built-in>" || path == "<command line>"
    }

    fn belongs_to_main_compilation_unit(&self, file: FileId) -> bool {
        match &self.scope.main_canonical_name {
            Some(main_canonical) => {
                get_canonical_name(self.files.path(file)) == *main_canonical
            }
            None => false,
        }
    }

    // ---- Preprocessor event handlers.

    /// Entering `file` via the `#include` at `include_loc` (`None` for the
    /// main file). The first non-builtin file entered becomes the main file
    /// of the translation unit.
    pub fn enter_file(
        &mut self,
        file: FileId,
        include_loc: Option<SourceLocation>,
        include_name_as_written: &str,
    ) {
        debug!(
            "[ #include ] {} ({})",
            include_name_as_written,
            self.files.path(file)
        );
        if let Some(loc) = include_loc {
            self.add_direct_include(loc, file, include_name_as_written);
        }
        if self.is_builtin_file(file) {
            return;
        }
        let path = self.files.path(file).to_string();
        self.store.get_or_create(file, &path);

        if self.pragmas_processed.insert(file) {
            if let Some(contents) = self.files.contents(file) {
                let contents = contents.to_string();
                let filepath = self.files.path(file).to_string();
                pragmas::process_pragmas_in_file(
                    file,
                    &filepath,
                    &contents,
                    &mut self.picker,
                    &mut self.pragma_tables,
                );
            }
        }

        if self.main_file.is_none() {
            self.main_file = Some(file);
            self.scope.main_canonical_name =
                Some(get_canonical_name(self.files.path(file)));
        }
        if self.belongs_to_main_compilation_unit(file) {
            debug!("added to main compilation unit: {}", self.files.path(file));
        }
        if self.scope.should_report(&self.files, file) {
            self.files_to_report.insert(file);
        }
    }

    pub fn exit_file(&mut self, return_loc: Option<SourceLocation>) {
        if let Some(loc) = return_loc {
            debug!("[ exiting to ] {}", self.files.location_str(loc));
        }
    }

    pub fn rename_file(&mut self, loc: SourceLocation) {
        debug!("[ renaming to ] {}", self.files.location_str(loc));
    }

    pub fn system_header_pragma(&mut self, loc: SourceLocation) {
        debug!("[ #pragma system_header ] {}", self.files.location_str(loc));
    }

    /// An `#include` whose target was skipped thanks to a header guard.
    /// The edge is still registered; duplicates are preserved so the report
    /// can suggest removing one copy.
    pub fn file_skipped(
        &mut self,
        file: FileId,
        include_loc: SourceLocation,
        include_name_as_written: &str,
    ) {
        debug!(
            "[ (#include) ] {} ({})",
            include_name_as_written,
            self.files.path(file)
        );
        self.add_direct_include(include_loc, file, include_name_as_written);
    }

    fn add_direct_include(
        &mut self,
        includer_loc: SourceLocation,
        includee: FileId,
        include_name_as_written: &str,
    ) {
        if self.is_builtin_file(includee) {
            return;
        }
        let includer = includer_loc.file;
        let includer_path = self.files.path(includer).to_string();
        let includee_path = self.files.path(includee).to_string();

        self.store
            .get_or_create(includer, &includer_path)
            .add_include(includee, include_name_as_written, includer_loc.line);
        self.store.get_or_create(includee, &includee_path);

        // foo.cc gets foo.h's includes for free; remember the association.
        if Some(includer) == self.main_file && self.belongs_to_main_compilation_unit(includee) {
            self.store
                .get_mut(includer)
                .unwrap()
                .internal_headers
                .insert(includee);
        }

        if !include_name_as_written.is_empty() {
            self.include_to_file
                .entry(include_name_as_written.to_string())
                .or_insert(includee);
        }
        // Register the canonical spelling too, so picker results (which
        // are canonical) resolve back to a file even when the source wrote
        // a relative form.
        self.include_to_file
            .entry(convert_to_quoted_include(&includee_path))
            .or_insert(includee);

        self.picker
            .add_direct_include(&includer_path, &includee_path, include_name_as_written);

        self.maybe_protect_include(includer_loc, includee, include_name_as_written);

        let from = self.graph_node(includer);
        let to = self.graph_node(includee);
        self.include_graph.add_edge(from, to, ());
    }

    fn graph_node(&mut self, file: FileId) -> NodeIndex {
        let graph = &mut self.include_graph;
        *self
            .graph_nodes
            .entry(file)
            .or_insert_with(|| graph.add_node(file))
    }

    /// Some `#include` lines must never be suggested for removal: pragma
    /// keep/export lines, exported ranges, and includes of non-headers.
    fn maybe_protect_include(
        &mut self,
        includer_loc: SourceLocation,
        includee: FileId,
        include_name_as_written: &str,
    ) {
        let includer = includer_loc.file;
        if self.is_builtin_file(includer) {
            return;
        }
        let line_text = self
            .files
            .line_text(includer, includer_loc.line)
            .unwrap_or("");

        let mut protect_reason = "";
        if line_text.contains("// IWYU pragma: keep") {
            protect_reason = "pragma_keep";
        } else if line_text.contains("// IWYU pragma: export")
            || self
                .pragma_tables
                .exported_lines
                .contains(&(includer, includer_loc.line))
        {
            protect_reason = "pragma_export";
            let quoted_includer =
                convert_to_quoted_include(self.files.path(includer));
            if crate::paths::is_quoted_include(include_name_as_written) {
                self.picker.add_mapping(
                    include_name_as_written,
                    crate::picker::MappedInclude::new(quoted_includer),
                );
            }
        } else if !is_header_file(self.files.path(includee)) {
            // Textually-included source files are never removal candidates.
            protect_reason = "non-header include";
        }

        if !protect_reason.is_empty() {
            let spelling = if include_name_as_written.is_empty() {
                convert_to_quoted_include(self.files.path(includee))
            } else {
                include_name_as_written.to_string()
            };
            let includer_path = self.files.path(includer).to_string();
            self.store
                .get_or_create(includer, &includer_path)
                .report_include_file_use(&spelling);
            debug!(
                "marked dep: {} needs to keep {} (reason: {})",
                includer_path, spelling, protect_reason
            );
        }
    }

    pub fn macro_defined(&mut self, name: &str, dfn_loc: SourceLocation, body: &str) {
        debug!(
            "[ #define ] {}: {}",
            self.files.location_str(dfn_loc),
            name
        );
        self.macro_tracker.record_definition(name, dfn_loc);
        // Tokens in the body can't be checked yet (the macros they name may
        // be defined later in another header); defer them for replay.
        for (ident, offset) in lexer::identifiers(body) {
            self.macro_tracker.record_macro_called_from_macro(
                &ident,
                SourceLocation::new(dfn_loc.file, dfn_loc.line, dfn_loc.column + offset as u32),
            );
        }
    }

    pub fn macro_expands(&mut self, name: &str, use_loc: SourceLocation) {
        self.macro_tracker.find_and_report_macro_use(
            &mut self.store,
            &self.files,
            &self.scope,
            name,
            use_loc,
        );
    }

    pub fn ifdef(&mut self, name: &str, loc: SourceLocation) {
        debug!("[ #ifdef ] {}: {}", self.files.location_str(loc), name);
        self.macro_tracker
            .find_and_report_macro_use(&mut self.store, &self.files, &self.scope, name, loc);
    }

    pub fn ifndef(&mut self, name: &str, loc: SourceLocation) {
        debug!("[ #ifndef ] {}: {}", self.files.location_str(loc), name);
        self.macro_tracker
            .find_and_report_macro_use(&mut self.store, &self.files, &self.scope, name, loc);
    }

    /// `#if` and `#elif` get their condition re-lexed: macros inside
    /// `defined(...)` never produce expansion events, so they are reported
    /// from here instead.
    pub fn if_condition(&mut self, expression: &str, loc: SourceLocation) {
        debug!("[ #if ] {}", self.files.location_str(loc));
        for (name, offset) in lexer::find_arguments_to_defined(expression) {
            let arg_loc = SourceLocation::new(loc.file, loc.line, loc.column + offset as u32);
            self.macro_tracker.find_and_report_macro_use(
                &mut self.store,
                &self.files,
                &self.scope,
                &name,
                arg_loc,
            );
        }
    }

    pub fn elif_condition(&mut self, expression: &str, loc: SourceLocation) {
        self.if_condition(expression, loc);
    }

    // ---- Post-processing, done once all source has been read.

    /// Must be called exactly once, after the last preprocessor event and
    /// before any use analysis.
    pub fn handle_preprocessing_done(&mut self) {
        assert!(
            !self.preprocessing_done,
            "handle_preprocessing_done() may only be called once"
        );
        self.preprocessing_done = true;

        self.macro_tracker
            .replay_deferred_uses(&mut self.store, &self.files, &self.scope);

        self.picker.finalize_added_includes();
        self.protect_reexport_includes();
        self.populate_intends_to_provide_map();
        self.populate_transitive_include_map();
    }

    /// Re-exporting an include counts as using it: if the includer has a
    /// mapping from the includee, the include must stay.
    fn protect_reexport_includes(&mut self) {
        let mut protect: Vec<(FileId, String)> = Vec::new();
        for (includer, info) in self.store.iter() {
            let includer_path = self.files.path(includer);
            for includee in &info.direct_includes_as_files {
                let includee_path = self.files.path(*includee);
                if self.picker.has_mapping(includee_path, includer_path)
                    && includee_path != includer_path
                {
                    protect.push((includer, convert_to_quoted_include(includee_path)));
                }
            }
        }
        for (includer, quoted) in protect {
            let path = self.files.path(includer).to_string();
            self.store
                .get_or_create(includer, &path)
                .report_include_file_use(&quoted);
            debug!("marked dep: {} needs to keep {} (reason: re-exports)", path, quoted);
        }
    }

    /// All files reachable from `file` through the include graph, not
    /// counting `file` itself.
    fn reachable_includes(&self, file: FileId) -> BTreeSet<FileId> {
        let mut reachable = BTreeSet::new();
        let Some(&start) = self.graph_nodes.get(&file) else {
            return reachable;
        };
        let mut dfs = Dfs::new(&self.include_graph, start);
        while let Some(node) = dfs.next(&self.include_graph) {
            let id = self.include_graph[node];
            if id != file {
                reachable.insert(id);
            }
        }
        reachable
    }

    /// A file "intends to provide" the files whose symbols it re-exports.
    /// Every file provides itself and its direct includes. A public header
    /// (one some private file maps to) provides everything transitively
    /// behind it, and pulling in a public header pulls in its full closure
    /// too. Finally each private header inherits what its public faces
    /// provide, so lookups need not map private to public first.
    fn populate_intends_to_provide_map(&mut self) {
        assert!(
            self.intends_to_provide_map.is_empty(),
            "intends-to-provide may only be computed once"
        );

        // Public headers, mapped from the private files behind them.
        let mut private_headers_behind: BTreeMap<FileId, BTreeSet<FileId>> = BTreeMap::new();
        for (header, _) in self.store.iter() {
            let header_path = self.files.path(header);
            for public in self.picker.get_candidate_headers_for_filepath(header_path) {
                if let Some(&public_file) = self.include_to_file.get(&public.quoted_include) {
                    if public_file != header {
                        private_headers_behind
                            .entry(public_file)
                            .or_default()
                            .insert(header);
                    }
                }
            }
        }

        for (public_file, privates) in &private_headers_behind {
            self.expanded_providers.insert(*public_file);
            self.expanded_providers.extend(privates.iter().copied());
        }

        for (file, info) in self.store.iter() {
            let mut provides = BTreeSet::new();
            provides.insert(file);
            if private_headers_behind.contains_key(&file) {
                provides.extend(self.reachable_includes(file));
            } else {
                for &inc in &info.direct_includes_as_files {
                    provides.insert(inc);
                    if private_headers_behind.contains_key(&inc) {
                        provides.extend(self.reachable_includes(inc));
                    }
                }
            }
            self.intends_to_provide_map.insert(file, provides);
        }

        // Two files can share a quoted name (#include_next); merge their
        // sets. With more than two files per name the winner of the final
        // assignment is source-order dependent, a known imperfection.
        let ids: Vec<FileId> = self.store.files().collect();
        for file in &ids {
            let quoted = convert_to_quoted_include(self.files.path(*file));
            let other = self.include_to_file.get(&quoted).copied().unwrap_or(*file);
            if other != *file {
                let mine = self.intends_to_provide_map.get(file).cloned().unwrap_or_default();
                let merged = self.intends_to_provide_map.entry(other).or_default();
                merged.extend(mine);
                let merged = merged.clone();
                self.intends_to_provide_map.insert(*file, merged);
            }
        }

        // Private headers promise whatever their public faces promise. When
        // a private header has several public faces we union them all.
        for (public_header, privates) in &private_headers_behind {
            let public_provides = self
                .intends_to_provide_map
                .get(public_header)
                .cloned()
                .unwrap_or_default();
            for private in privates {
                self.intends_to_provide_map
                    .entry(*private)
                    .or_default()
                    .extend(public_provides.iter().copied());
            }
        }
    }

    fn populate_transitive_include_map(&mut self) {
        assert!(
            self.transitive_include_map.is_empty(),
            "transitive includes may only be computed once"
        );
        let ids: Vec<FileId> = self.store.files().collect();
        for file in ids {
            let mut includes = self.reachable_includes(file);
            includes.insert(file);
            self.transitive_include_map.insert(file, includes);
        }
    }

    // ---- Queries (valid after handle_preprocessing_done).

    pub fn main_file(&self) -> Option<FileId> {
        self.main_file
    }

    pub fn files_to_report(&self) -> &BTreeSet<FileId> {
        &self.files_to_report
    }

    pub fn include_to_file(&self, quoted_include: &str) -> Option<FileId> {
        self.include_to_file.get(quoted_include).copied()
    }

    pub fn public_header_intends_to_provide(
        &self,
        public_header: FileId,
        other_file: FileId,
    ) -> bool {
        self.intends_to_provide_map
            .get(&public_header)
            .map(|provides| provides.contains(&other_file))
            .unwrap_or(false)
    }

    /// True if `file`'s provide-set was expanded to a full include closure
    /// (a public mapper or a private header behind one). Only these satisfy
    /// uses of files they don't include directly.
    pub fn provides_full_closure(&self, file: FileId) -> bool {
        self.expanded_providers.contains(&file)
    }

    pub fn file_transitively_includes(&self, includer: FileId, includee: FileId) -> bool {
        self.transitive_include_map
            .get(&includer)
            .map(|includes| includes.contains(&includee))
            .unwrap_or(false)
    }

    pub fn file_transitively_includes_quoted(
        &self,
        includer: FileId,
        quoted_includee: &str,
    ) -> bool {
        self.transitive_include_map
            .get(&includer)
            .map(|includes| {
                includes.iter().any(|inc| {
                    convert_to_quoted_include(self.files.path(*inc)) == quoted_includee
                })
            })
            .unwrap_or(false)
    }

    pub fn include_is_inhibited(&self, file: FileId, quoted_include: &str) -> bool {
        self.pragma_tables
            .no_include_map
            .get(&file)
            .map(|set| set.contains(quoted_include))
            .unwrap_or(false)
    }

    pub fn forward_declare_is_inhibited(&self, file: FileId, name: &str) -> bool {
        self.pragma_tables
            .no_forward_declare_map
            .get(&file)
            .map(|set| {
                set.contains(name)
                    || set.contains(name.rsplit("::").next().unwrap_or(name))
            })
            .unwrap_or(false)
    }

    pub fn files(&self) -> &SourceFiles {
        &self.files
    }

    pub fn picker(&self) -> &IncludePicker {
        &self.picker
    }

    pub fn store(&self) -> &FileInfoStore {
        &self.store
    }

    /// Mutable access for the AST side to report symbol uses with.
    pub fn store_mut(&mut self) -> &mut FileInfoStore {
        &mut self.store
    }

    pub fn file_info_for(&self, file: FileId) -> Option<&FileInfo> {
        self.store.get(file)
    }

    pub fn file_info_mut(&mut self, file: FileId) -> &mut FileInfo {
        let path = self.files.path(file).to_string();
        self.store.get_or_create(file, &path)
    }

    pub fn preprocessing_done(&self) -> bool {
        self.preprocessing_done
    }
}
