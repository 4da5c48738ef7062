//! A lightweight stand-in for a compiler front-end: scans translation units
//! line by line, resolves `#include`s against the search path, and feeds
//! the resulting event stream into the preprocessor observer. Symbol-level
//! AST uses are out of its reach, but macro definitions and expansions are
//! genuine preprocessor work, so the driver tracks and reports those itself.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::analysis;
use crate::paths::parent_path;
use crate::picker::IncludePicker;
use crate::preprocessor::lexer;
use crate::preprocessor::PreprocessorObserver;
use crate::report::FileReport;
use crate::source::{FileId, SourceLocation};

static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*(\w+)\s*(.*)$").unwrap());
static DEFINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(\([^)]*\))?\s*(.*)$").unwrap());

#[derive(Debug, Default, Clone)]
pub struct DriverOptions {
    /// `-I` search directories, in order.
    pub include_dirs: Vec<PathBuf>,
    /// Mapping files to load before preprocessing.
    pub mapping_files: Vec<String>,
    /// Globs naming extra files to check besides the main compilation unit.
    pub check_also: Vec<String>,
    /// Skip the built-in libc/libstdc++ mapping tables.
    pub no_default_mappings: bool,
}

/// Preprocesses one translation unit and analyzes every checked file in it.
pub fn analyze_translation_unit(
    main_path: &Path,
    options: &DriverOptions,
) -> Result<Vec<FileReport>, String> {
    let mut picker = if options.no_default_mappings {
        IncludePicker::empty()
    } else {
        IncludePicker::new()
    };
    picker.add_mapping_file_search_path(".");
    picker.add_mapping_file_search_path(&parent_path(&main_path.to_string_lossy()));
    for dir in &options.include_dirs {
        picker.add_mapping_file_search_path(&dir.to_string_lossy());
    }
    for mapping_file in &options.mapping_files {
        picker.add_mappings_from_file(mapping_file);
    }

    let mut observer = PreprocessorObserver::new(picker);
    for glob in &options.check_also {
        observer.add_glob_to_report_violations_for(glob)?;
    }

    let contents = fs::read_to_string(main_path)
        .map_err(|e| format!("failed to read {}: {}", main_path.display(), e))?;
    let main_file = observer.add_source_file(&main_path.to_string_lossy(), contents);

    let mut scanner = Scanner {
        observer: &mut observer,
        include_dirs: &options.include_dirs,
        entered: HashSet::new(),
        defined_macros: HashSet::new(),
    };
    scanner.preprocess_file(main_file, None, "");

    observer.handle_preprocessing_done();

    let reports = observer
        .files_to_report()
        .iter()
        .map(|file| FileReport::from_diff(&analysis::analyze_file(&observer, *file)))
        .collect();
    Ok(reports)
}

struct Scanner<'a> {
    observer: &'a mut PreprocessorObserver,
    include_dirs: &'a [PathBuf],
    entered: HashSet<FileId>,
    defined_macros: HashSet<String>,
}

impl Scanner<'_> {
    fn preprocess_file(
        &mut self,
        file: FileId,
        include_loc: Option<SourceLocation>,
        as_written: &str,
    ) {
        self.entered.insert(file);
        self.observer.enter_file(file, include_loc, as_written);
        let Some(contents) = self.observer.files().contents(file) else {
            return; // Unresolved header; the edge alone is still useful.
        };
        let contents = contents.to_string();

        let mut in_block_comment = false;
        for (idx, raw_line) in contents.lines().enumerate() {
            let linenum = idx as u32 + 1;
            let line = strip_comments(raw_line, &mut in_block_comment);

            if let Some(caps) = DIRECTIVE_RE.captures(&line) {
                let directive = caps.get(1).unwrap().as_str().to_string();
                let rest = caps.get(2).unwrap().as_str().to_string();
                let column = caps.get(1).unwrap().start() as u32 + 1;
                let loc = SourceLocation::new(file, linenum, column);
                self.handle_directive(&directive, &rest, loc);
            } else {
                self.scan_for_macro_uses(&line, file, linenum);
            }
        }
    }

    fn handle_directive(&mut self, directive: &str, rest: &str, loc: SourceLocation) {
        match directive {
            "include" | "include_next" => {
                if let Some(spelling) = lexer::include_spelling(rest) {
                    self.handle_include(&spelling, loc);
                }
            }
            "define" => {
                if let Some(caps) = DEFINE_RE.captures(rest) {
                    let name = caps.get(1).unwrap().as_str().to_string();
                    let body = caps.get(3).map(|m| m.as_str()).unwrap_or("").to_string();
                    self.defined_macros.insert(name.clone());
                    self.observer.macro_defined(&name, loc, &body);
                }
            }
            "undef" => {
                if let Some((name, _)) = lexer::identifiers(rest).into_iter().next() {
                    self.defined_macros.remove(&name);
                }
            }
            "ifdef" => {
                if let Some((name, _)) = lexer::identifiers(rest).into_iter().next() {
                    self.observer.ifdef(&name, loc);
                }
            }
            "ifndef" => {
                if let Some((name, _)) = lexer::identifiers(rest).into_iter().next() {
                    self.observer.ifndef(&name, loc);
                }
            }
            "if" => {
                self.observer.if_condition(rest, loc);
                self.report_expanded_condition_macros(rest, loc);
            }
            "elif" => {
                self.observer.elif_condition(rest, loc);
                self.report_expanded_condition_macros(rest, loc);
            }
            _ => {}
        }
    }

    /// Macros in an `#if` outside `defined(...)` are expanded by a real
    /// preprocessor and arrive as expansion events.
    fn report_expanded_condition_macros(&mut self, expression: &str, loc: SourceLocation) {
        let defined_args: HashSet<String> = lexer::find_arguments_to_defined(expression)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        for (ident, offset) in lexer::identifiers(expression) {
            if ident == "defined" || defined_args.contains(&ident) {
                continue;
            }
            if self.defined_macros.contains(&ident) {
                let use_loc =
                    SourceLocation::new(loc.file, loc.line, loc.column + offset as u32);
                self.observer.macro_expands(&ident, use_loc);
            }
        }
    }

    fn scan_for_macro_uses(&mut self, line: &str, file: FileId, linenum: u32) {
        for (ident, offset) in lexer::identifiers(line) {
            if self.defined_macros.contains(&ident) {
                let loc = SourceLocation::new(file, linenum, offset as u32 + 1);
                self.observer.macro_expands(&ident, loc);
            }
        }
    }

    fn handle_include(&mut self, spelling: &str, loc: SourceLocation) {
        let name = &spelling[1..spelling.len() - 1];
        let is_quoted = spelling.starts_with('"');
        let includer_path = self.observer.files().path(loc.file).to_string();

        let (path, contents) = self.resolve_include(name, &includer_path, is_quoted);
        let includee = match contents {
            Some(contents) => self.observer.add_source_file(&path, contents),
            None => self.observer.intern_file(&path),
        };

        if self.entered.contains(&includee) {
            // Header guard: register the edge, skip the body.
            self.observer.file_skipped(includee, loc, spelling);
        } else {
            self.preprocess_file(includee, Some(loc), spelling);
            self.observer.exit_file(Some(loc));
        }
    }

    /// Quote includes search the includer's directory first, then `-I`
    /// dirs; angle includes search only `-I` dirs. Unresolved headers get a
    /// stable placeholder path so the include edge still round-trips to the
    /// spelling the user wrote.
    fn resolve_include(
        &self,
        name: &str,
        includer_path: &str,
        search_includer_dir: bool,
    ) -> (String, Option<String>) {
        if search_includer_dir {
            let local = Path::new(&parent_path(includer_path)).join(name);
            if let Ok(contents) = fs::read_to_string(&local) {
                return (local.to_string_lossy().into_owned(), Some(contents));
            }
        }
        for dir in self.include_dirs {
            let candidate = dir.join(name);
            if let Ok(contents) = fs::read_to_string(&candidate) {
                return (candidate.to_string_lossy().into_owned(), Some(contents));
            }
        }
        let path = Path::new(name);
        if let Ok(contents) = fs::read_to_string(path) {
            return (name.to_string(), Some(contents));
        }
        debug!("could not resolve #include of {}", name);
        if search_includer_dir {
            (
                Path::new(&parent_path(includer_path))
                    .join(name)
                    .to_string_lossy()
                    .into_owned(),
                None,
            )
        } else {
            (format!("/usr/include/{}", name), None)
        }
    }
}

fn strip_comments(line: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while !rest.is_empty() {
        if *in_block_comment {
            match rest.find("*/") {
                Some(pos) => {
                    *in_block_comment = false;
                    rest = &rest[pos + 2..];
                }
                None => break,
            }
        } else {
            let line_comment = rest.find("//");
            let block_comment = rest.find("/*");
            match (line_comment, block_comment) {
                (Some(lc), bc) if bc.map(|b| lc < b).unwrap_or(true) => {
                    out.push_str(&rest[..lc]);
                    break;
                }
                (_, Some(bc)) => {
                    out.push_str(&rest[..bc]);
                    *in_block_comment = true;
                    rest = &rest[bc + 2..];
                }
                (None, None) => {
                    out.push_str(rest);
                    break;
                }
                (Some(_), None) => unreachable!(),
            }
        }
    }
    out
}
