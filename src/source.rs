use std::collections::HashMap;
use std::fmt;

/// Handle to a file seen during preprocessing. All cross-file tables key on
/// this instead of cloning path strings around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

/// A location inside a tracked file. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        SourceLocation { file, line, column }
    }
}

struct SourceFile {
    path: String,
    contents: Option<String>,
}

/// Arena of every file the preprocessor has entered, plus their contents
/// where available. Contents are kept so the pragma scanner and the
/// include-line protection checks can re-read source text after the fact.
///
/// Files like `<built-in>` or unresolved system headers are interned without
/// contents.
#[derive(Default)]
pub struct SourceFiles {
    files: Vec<SourceFile>,
    by_path: HashMap<String, FileId>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a path without contents, or return the existing id.
    pub fn intern(&mut self, path: &str) -> FileId {
        if let Some(id) = self.by_path.get(path) {
            return *id;
        }
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            path: path.to_string(),
            contents: None,
        });
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Intern a path together with its source text.
    pub fn add_file(&mut self, path: &str, contents: String) -> FileId {
        let id = self.intern(path);
        self.files[id.0 as usize].contents = Some(contents);
        id
    }

    pub fn lookup(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn path(&self, id: FileId) -> &str {
        &self.files[id.0 as usize].path
    }

    pub fn contents(&self, id: FileId) -> Option<&str> {
        self.files[id.0 as usize].contents.as_deref()
    }

    /// The text of a single 1-based line, without the trailing newline.
    pub fn line_text(&self, id: FileId, line: u32) -> Option<&str> {
        let contents = self.contents(id)?;
        contents.lines().nth(line.saturating_sub(1) as usize)
    }

    pub fn ids(&self) -> impl Iterator<Item = FileId> {
        (0..self.files.len() as u32).map(FileId)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `path:line:column` form used in diagnostics.
    pub fn location_str(&self, loc: SourceLocation) -> String {
        format!("{}:{}:{}", self.path(loc.file), loc.line, loc.column)
    }
}

impl fmt::Debug for SourceFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFiles")
            .field("files", &self.files.len())
            .finish()
    }
}
