//! Per-file bookkeeping: which `#include`s and forward declarations a file
//! wrote, and which symbol uses the AST walker reported against it. The
//! analyzer reads these records after preprocessing is finalized.

use std::collections::{BTreeSet, HashMap};

use crate::paths::convert_to_quoted_include;
use crate::source::{FileId, SourceLocation};

/// What kind of declaration a symbol resolves to. Drives how a forward
/// declaration is rendered (`class Foo;` vs `struct Foo;`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Struct,
    Enum,
    Union,
    Function,
    Typedef,
    Variable,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DeclKind::Class => "class",
            DeclKind::Struct => "struct",
            DeclKind::Enum => "enum",
            DeclKind::Union => "union",
            DeclKind::Function => "function",
            DeclKind::Typedef => "typedef",
            DeclKind::Variable => "variable",
        }
    }
}

/// Stand-in for a named declaration delivered by the AST traversal: enough
/// identity to attribute the use to a file and render a forward declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub kind: DeclKind,
    /// Fully qualified, e.g. `myproject::Foo`.
    pub qualified_name: String,
    /// Filepath of the declaration the use resolved to.
    pub filepath: String,
    pub line: u32,
}

impl Decl {
    pub fn new(kind: DeclKind, qualified_name: &str, filepath: &str, line: u32) -> Self {
        Decl {
            kind,
            qualified_name: qualified_name.to_string(),
            filepath: filepath.to_string(),
            line,
        }
    }

    /// `a::b::Foo` rendered as a self-contained forward declaration.
    pub fn forward_declare_line(&self) -> String {
        let parts: Vec<&str> = self.qualified_name.split("::").collect();
        let (namespaces, name) = parts.split_at(parts.len() - 1);
        let mut line = String::new();
        for ns in namespaces {
            line.push_str(&format!("namespace {} {{ ", ns));
        }
        line.push_str(&format!("{} {};", self.kind.keyword(), name[0]));
        for _ in namespaces {
            line.push_str(" }");
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseKind {
    /// The use needs the complete definition (member access, sizeof,
    /// inheritance, by-value, ...).
    FullUse,
    /// A declaration alone satisfies the use (pointer, reference).
    ForwardDeclareUse,
}

/// One recorded symbol use. Uses are stored exactly as reported; the
/// analyzer is responsible for deduplication.
#[derive(Debug, Clone)]
pub struct OneUse {
    pub symbol_name: String,
    pub short_symbol_name: String,
    pub decl: Option<Decl>,
    /// Filepath where the symbol is defined, also set for decl-less
    /// (macro/token) uses.
    pub decl_filepath: String,
    pub use_loc: SourceLocation,
    pub kind: UseKind,
    pub in_method_body: bool,
    /// Extra context appended to the violation message, or empty.
    pub comment: String,
    pub ignore_use: bool,
    pub is_violation: bool,
    pub suggested_header: Option<String>,
}

impl OneUse {
    fn new(
        symbol_name: &str,
        decl: Option<Decl>,
        decl_filepath: &str,
        use_loc: SourceLocation,
        kind: UseKind,
        in_method_body: bool,
        comment: &str,
    ) -> Self {
        OneUse {
            symbol_name: symbol_name.to_string(),
            short_symbol_name: short_name(symbol_name).to_string(),
            decl,
            decl_filepath: decl_filepath.to_string(),
            use_loc,
            kind,
            in_method_body,
            comment: comment.to_string(),
            ignore_use: false,
            is_violation: false,
            suggested_header: None,
        }
    }

    pub fn is_full_use(&self) -> bool {
        self.kind == UseKind::FullUse
    }
}

fn short_name(qualified: &str) -> &str {
    qualified.rsplit("::").next().unwrap_or(qualified)
}

/// One line the file wrote (or the analysis wants): either `#include X` or a
/// forward declaration. Tracks presence, desire, the source line range, and
/// the symbols satisfied through it.
#[derive(Debug, Clone)]
pub struct OneIncludeOrForwardDeclareLine {
    pub line: String,
    pub start_linenum: u32,
    pub end_linenum: u32,
    pub is_desired: bool,
    pub is_present: bool,
    /// Symbol name -> reference count, in first-seen order.
    pub symbol_counts: Vec<(String, u32)>,
    pub quoted_include: Option<String>,
    pub fwd_decl: Option<Decl>,
}

impl OneIncludeOrForwardDeclareLine {
    fn for_include(quoted_include: &str, linenum: u32) -> Self {
        OneIncludeOrForwardDeclareLine {
            line: format!("#include {}", quoted_include),
            start_linenum: linenum,
            end_linenum: linenum,
            is_desired: false,
            is_present: false,
            symbol_counts: Vec::new(),
            quoted_include: Some(quoted_include.to_string()),
            fwd_decl: None,
        }
    }

    fn for_fwd_decl(decl: &Decl, start_linenum: u32, end_linenum: u32) -> Self {
        OneIncludeOrForwardDeclareLine {
            line: decl.forward_declare_line(),
            start_linenum,
            end_linenum,
            is_desired: false,
            is_present: false,
            symbol_counts: Vec::new(),
            quoted_include: None,
            fwd_decl: Some(decl.clone()),
        }
    }

    /// An include line the analysis wants to add; it has no source
    /// position.
    pub fn desired_include(quoted_include: &str) -> Self {
        let mut line = Self::for_include(quoted_include, 0);
        line.is_desired = true;
        line
    }

    /// A forward declaration the analysis wants to add.
    pub fn desired_fwd_decl(decl: &Decl) -> Self {
        let mut line = Self::for_fwd_decl(decl, 0, 0);
        line.is_desired = true;
        line
    }

    pub fn is_include_line(&self) -> bool {
        self.quoted_include.is_some()
    }

    pub fn line_number_range(&self) -> String {
        format!("lines {}-{}", self.start_linenum, self.end_linenum)
    }

    pub fn add_symbol_use(&mut self, symbol_name: &str) {
        if let Some(entry) = self
            .symbol_counts
            .iter_mut()
            .find(|(name, _)| name == symbol_name)
        {
            entry.1 += 1;
        } else {
            self.symbol_counts.push((symbol_name.to_string(), 1));
        }
    }

    pub fn has_symbol_use(&self, symbol_name: &str) -> bool {
        self.symbol_counts.iter().any(|(name, _)| name == symbol_name)
    }
}

/// Everything recorded about one file over the translation unit.
#[derive(Debug, Default)]
pub struct FileInfo {
    pub quoted_file: String,
    /// Files treated as logically part of this one: `foo.h` and `foo-inl.h`
    /// for `foo.cc`.
    pub internal_headers: BTreeSet<FileId>,
    pub symbol_uses: Vec<OneUse>,
    pub lines: Vec<OneIncludeOrForwardDeclareLine>,
    pub direct_includes: BTreeSet<String>,
    pub direct_includes_as_files: BTreeSet<FileId>,
    /// Qualified names this file forward-declares itself.
    pub direct_forward_declares: BTreeSet<String>,
    /// Includes protected from removal (pragma keep/export, `.cc` includes,
    /// re-exports), stored by their as-written spelling.
    pub protected_includes: BTreeSet<String>,
}

impl FileInfo {
    pub fn new(quoted_file: String) -> Self {
        FileInfo {
            quoted_file,
            ..Default::default()
        }
    }

    /// Records an `#include` line. Duplicate includes are stored twice so
    /// the report can suggest dropping one copy.
    pub fn add_include(&mut self, includee: FileId, quoted_includee: &str, linenumber: u32) {
        let mut line = OneIncludeOrForwardDeclareLine::for_include(quoted_includee, linenumber);
        line.is_present = true;
        self.lines.push(line);
        self.direct_includes.insert(quoted_includee.to_string());
        self.direct_includes_as_files.insert(includee);
    }

    pub fn add_forward_declare(&mut self, decl: &Decl, start_line: u32, end_line: u32) {
        let mut line = OneIncludeOrForwardDeclareLine::for_fwd_decl(decl, start_line, end_line);
        line.is_present = true;
        self.lines.push(line);
        self.direct_forward_declares
            .insert(decl.qualified_name.clone());
    }

    /// A use that needs the full definition of `decl`.
    pub fn report_full_symbol_use(
        &mut self,
        use_loc: SourceLocation,
        decl: &Decl,
        in_method_body: bool,
        comment: &str,
    ) {
        self.symbol_uses.push(OneUse::new(
            &decl.qualified_name,
            Some(decl.clone()),
            &decl.filepath,
            use_loc,
            UseKind::FullUse,
            in_method_body,
            comment,
        ));
    }

    /// Decl-less form, used for macros and other token-level uses.
    pub fn report_full_symbol_use_by_name(
        &mut self,
        use_loc: SourceLocation,
        dfn_filepath: &str,
        symbol: &str,
    ) {
        self.symbol_uses.push(OneUse::new(
            symbol,
            None,
            dfn_filepath,
            use_loc,
            UseKind::FullUse,
            false,
            "",
        ));
    }

    /// A use satisfied by a declaration alone. Only decls can be
    /// forward-declared, so there is no by-name form.
    pub fn report_forward_declare_use(
        &mut self,
        use_loc: SourceLocation,
        decl: &Decl,
        in_method_body: bool,
        comment: &str,
    ) {
        self.symbol_uses.push(OneUse::new(
            &decl.qualified_name,
            Some(decl.clone()),
            &decl.filepath,
            use_loc,
            UseKind::ForwardDeclareUse,
            in_method_body,
            comment,
        ));
    }

    /// Keep this include exactly as written, bypassing any mapping.
    pub fn report_include_file_use(&mut self, quoted_include: &str) {
        self.protected_includes.insert(quoted_include.to_string());
    }
}

/// All per-file records of the translation unit, keyed by file id.
#[derive(Debug, Default)]
pub struct FileInfoStore {
    infos: HashMap<FileId, FileInfo>,
}

impl FileInfoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, file: FileId, filepath: &str) -> &mut FileInfo {
        self.infos
            .entry(file)
            .or_insert_with(|| FileInfo::new(convert_to_quoted_include(filepath)))
    }

    pub fn get(&self, file: FileId) -> Option<&FileInfo> {
        self.infos.get(&file)
    }

    pub fn get_mut(&mut self, file: FileId) -> Option<&mut FileInfo> {
        self.infos.get_mut(&file)
    }

    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.infos.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, &FileInfo)> {
        self.infos.iter().map(|(id, info)| (*id, info))
    }
}
