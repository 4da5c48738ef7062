//! Path and filename classification helpers shared by the picker and the
//! preprocessor: quoted-include conversion, canonical-name computation, and
//! the system/third-party tests that drive the mapping heuristics.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// Search-path prefixes that mark a file as a system include. A path that
/// starts with one of these is converted to `<...>` form by stripping the
/// prefix.
static SYSTEM_INCLUDE_PREFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^/usr/include/c\+\+/[^/]+/",
        r"^/usr/include/",
        r"^/usr/local/include/",
        r"^/usr/grte/[^/]+/include/",
        r"^/usr/lib/gcc/[^/]+/[^/]+/include/",
        r"^/usr/src/linux[^/]*/include/",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const SOURCE_EXTENSIONS: &[&str] = &[".cc", ".c", ".cpp", ".cxx", ".C"];

/// True iff the string is an `#include` spelling with its delimiters:
/// `"foo/bar.h"` or `<vector>`.
pub fn is_quoted_include(s: &str) -> bool {
    if s.len() < 2 {
        return false;
    }
    (s.starts_with('<') && s.ends_with('>')) || (s.starts_with('"') && s.ends_with('"'))
}

/// A mapping key: either a quoted include or `@` followed by a regex that
/// matches one.
pub fn is_quoted_filepath_pattern(s: &str) -> bool {
    is_quoted_include(s) || s.starts_with('@')
}

/// Collapses `./` segments and resolves `..` against the preceding segment.
/// Purely textual; never touches the filesystem.
pub fn normalize_file_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(&s) if s != "..") {
                    out.pop();
                } else if !absolute {
                    out.push("..");
                }
            }
            _ => out.push(segment),
        }
    }
    let joined = out.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// True if the path lives under one of the known system-include roots.
pub fn is_system_include_file(path: &str) -> bool {
    SYSTEM_INCLUDE_PREFIXES.iter().any(|re| re.is_match(path))
}

/// Converts a filepath to the way it would be written in an `#include`
/// line: system headers get their search-path prefix stripped and are
/// wrapped in `<>`, everything else is normalized and double-quoted.
pub fn convert_to_quoted_include(path: &str) -> String {
    for re in SYSTEM_INCLUDE_PREFIXES.iter() {
        if let Some(m) = re.find(path) {
            return format!("<{}>", &path[m.end()..]);
        }
    }
    format!("\"{}\"", normalize_file_path(path))
}

fn strip_right<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    s.strip_suffix(suffix)
}

/// Strips quotes, a source/header extension, and test/-inl decorations, and
/// maps the last `internal/` path segment to `public/`. Two files with the
/// same canonical name belong to the same compilation unit: `foo.h` and
/// `foo-inl.h` are the internal headers of `foo.cc`.
pub fn get_canonical_name(filepath: &str) -> String {
    let mut name: &str = filepath;
    if is_quoted_include(name) {
        name = &name[1..name.len() - 1];
    }
    let mut owned = normalize_file_path(name);

    let mut stripped_ext = false;
    for ext in [".cc", ".c", ".cpp", ".cxx", ".h", ".hpp", ".hxx"] {
        if let Some(rest) = strip_right(&owned, ext) {
            owned = rest.to_string();
            stripped_ext = true;
            break;
        }
    }
    if stripped_ext {
        for deco in ["_unittest", "_regtest", "_test"] {
            if let Some(rest) = strip_right(&owned, deco) {
                owned = rest.to_string();
                break;
            }
        }
        if let Some(rest) = strip_right(&owned, "-inl") {
            owned = rest.to_string();
        }
        // A header in foo/internal/ is canonically one with its foo/public/
        // sibling, so lib.h and the lib.cc that implements it match up even
        // when the project hides the header.
        if let Some(pos) = owned.rfind("internal/") {
            if pos == 0 || owned.as_bytes()[pos - 1] == b'/' {
                owned = format!("{}public/{}", &owned[..pos], &owned[pos + "internal/".len()..]);
            }
        }
    }
    owned
}

/// Include-advisor never suggests removing an `#include` of a non-header
/// (a `.cc` textually included for tests, say), so source extensions are
/// the ones that matter here. Extension-less files like `<vector>` count
/// as headers.
pub fn is_header_file(path: &str) -> bool {
    let mut p = path;
    if is_quoted_include(p) {
        p = &p[1..p.len() - 1];
    }
    !SOURCE_EXTENSIONS.iter().any(|ext| p.ends_with(ext))
}

/// True if the path (quoted or not) has a `third_party/` segment.
pub fn is_third_party_file(path: &str) -> bool {
    let p = path.trim_start_matches(['"', '<']);
    p.starts_with("third_party/") || p.contains("/third_party/")
}

pub fn is_absolute_path(path: &str) -> bool {
    Path::new(path).is_absolute()
}

pub fn make_absolute_path(base: &Path, path: &str) -> PathBuf {
    if is_absolute_path(path) {
        PathBuf::from(path)
    } else {
        base.join(path)
    }
}

pub fn parent_path(path: &str) -> String {
    match Path::new(path).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

/// Stable 64-bit key for an (includer, includee) path pair. The as-written
/// spelling table is keyed by this instead of owning two more copies of
/// every path.
pub fn path_pair_hash(includer: &str, includee: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    includer.hash(&mut hasher);
    includee.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_strips_known_suffixes() {
        assert_eq!(get_canonical_name("my/path/foo.cxx"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo.cpp"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo.cc"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo.c"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo.h"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo-inl.h"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo_unittest.cc"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo_regtest.cc"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo_test.cc"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo-inl_unittest.cc"), "my/path/foo");
        assert_eq!(get_canonical_name("my/path/foo_mytest.cc"), "my/path/foo_mytest");
    }

    #[test]
    fn test_canonical_name_strips_quotes() {
        assert_eq!(get_canonical_name("<set>"), "set");
        assert_eq!(get_canonical_name("<bits/stl_set.h>"), "bits/stl_set");
        assert_eq!(get_canonical_name("\"my/path/foo-inl.h\""), "my/path/foo");
    }

    #[test]
    fn test_canonical_name_maps_internal_to_public() {
        assert_eq!(get_canonical_name("my/internal/foo.cc"), "my/public/foo");
        assert_eq!(get_canonical_name("my/public/foo.cc"), "my/public/foo");
        assert_eq!(get_canonical_name("my/internal/foo.h"), "my/public/foo");
        assert_eq!(get_canonical_name("my/public/foo.h"), "my/public/foo");
        assert_eq!(get_canonical_name("internal/foo"), "internal/foo");
        assert_eq!(get_canonical_name("path/internal_impl.cc"), "path/internal_impl");
    }

    #[test]
    fn test_is_system_include_file() {
        assert!(!is_system_include_file("foo.h"));
        assert!(is_system_include_file("/usr/include/string.h"));
        assert!(is_system_include_file("/usr/include/c++/4.3/bits/stl_vector.h"));
    }

    #[test]
    fn test_convert_to_quoted_include() {
        assert_eq!(convert_to_quoted_include("foo.h"), "\"foo.h\"");
        assert_eq!(convert_to_quoted_include("/usr/include/string.h"), "<string.h>");
        assert_eq!(
            convert_to_quoted_include("/usr/include/c++/4.3/bits/stl_vector.h"),
            "<bits/stl_vector.h>"
        );
        assert_eq!(convert_to_quoted_include("././././my/dot.h"), "\"my/dot.h\"");
    }

    #[test]
    fn test_is_quoted_include() {
        assert!(is_quoted_include("<vector>"));
        assert!(is_quoted_include("\"foo/bar.h\""));
        assert!(!is_quoted_include("vector"));
        assert!(!is_quoted_include("<vector"));
        assert!(!is_quoted_include(""));
    }

    #[test]
    fn test_is_quoted_filepath_pattern() {
        assert!(is_quoted_filepath_pattern("<vector>"));
        assert!(is_quoted_filepath_pattern("@\"foo/.*\""));
        assert!(!is_quoted_filepath_pattern("foo/bar.h"));
    }

    #[test]
    fn test_normalize_file_path() {
        assert_eq!(normalize_file_path("././foo.h"), "foo.h");
        assert_eq!(normalize_file_path("a/b/../c.h"), "a/c.h");
        assert_eq!(normalize_file_path("/usr/./include/x.h"), "/usr/include/x.h");
        assert_eq!(normalize_file_path("../x.h"), "../x.h");
    }

    #[test]
    fn test_is_header_file() {
        assert!(is_header_file("foo.h"));
        assert!(is_header_file("<vector>"));
        assert!(is_header_file("\"foo/bar.hpp\""));
        assert!(!is_header_file("foo.cc"));
        assert!(!is_header_file("\"gen/table.c\""));
    }

    #[test]
    fn test_is_third_party_file() {
        assert!(is_third_party_file("\"third_party/boost/graph.h\""));
        assert!(is_third_party_file("src/third_party/x.h"));
        assert!(!is_third_party_file("\"my/party/x.h\""));
    }
}
