//! The include picker: for any symbol or header file, which `#include`
//! lines are acceptable ways to get it?
//!
//! The hard part is that many headers are private. A private header has one
//! or more public headers that it maps to, and suggestions must name the
//! public ones. Mappings come from four places: the hard-coded default
//! tables in [`default_mappings`], user mapping files (YAML/JSON, see
//! [`mapping_file`]), in-source pragmas routed here by the preprocessor, and
//! inference rules applied to every `#include` seen during the run
//! (`internal/` directories, `<asm-ARCH/...>`, third-party code).
//!
//! Lifecycle: mutate freely, call [`IncludePicker::finalize_added_includes`]
//! exactly once, then query. Mutation after finalize is a bug in the caller
//! and panics.

pub mod default_mappings;
pub mod mapping_file;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::warn;
use regex::Regex;

use crate::paths::{
    convert_to_quoted_include, is_quoted_filepath_pattern, is_quoted_include,
    is_third_party_file, path_pair_hash,
};

/// Whether a header may be included directly by user code. Anything not
/// explicitly listed is treated as public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Unset,
    Public,
    Private,
}

/// The value side of a mapping: the include spelling to suggest, plus the
/// on-disk path when the spelling alone is ambiguous (e.g. ""-style includes
/// whose quoted form depends on where the includer sits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedInclude {
    pub quoted_include: String,
    pub path: Option<String>,
}

impl MappedInclude {
    pub fn new(quoted_include: impl Into<String>) -> Self {
        MappedInclude {
            quoted_include: quoted_include.into(),
            path: None,
        }
    }

    pub fn with_path(quoted_include: impl Into<String>, path: impl Into<String>) -> Self {
        MappedInclude {
            quoted_include: quoted_include.into(),
            path: Some(path.into()),
        }
    }
}

/// Keys are symbol names or quoted filepath patterns; values are ordered
/// candidate lists, best first.
pub type IncludeMap = BTreeMap<String, Vec<MappedInclude>>;

enum TransitiveStatus {
    Calculating,
    Done,
}

pub struct IncludePicker {
    symbol_include_map: IncludeMap,
    filepath_include_map: IncludeMap,

    /// Visibility keyed by quoted include (or symbol name). Takes priority
    /// over `path_visibility_map`.
    include_visibility_map: BTreeMap<String, Visibility>,
    /// Visibility keyed by raw path.
    path_visibility_map: BTreeMap<String, Visibility>,

    /// Every include seen via `add_direct_include`: quoted includee to the
    /// set of quoted includers. Used for regex expansion and third-party
    /// inference.
    quoted_includes_to_quoted_includers: BTreeMap<String, BTreeSet<String>>,

    /// Hash of (includer path, includee path) to the include spelling the
    /// user actually wrote, symlinks and `./` segments included.
    include_as_written: HashMap<u64, String>,

    /// `@`-prefixed pattern (later: concrete quoted include) to the set of
    /// includee *paths* that accept a matching includer as a friend.
    friend_to_headers_map: BTreeMap<String, BTreeSet<String>>,

    mapping_file_search_path: Vec<String>,

    finalized: bool,
}

impl IncludePicker {
    /// A picker preloaded with the default libc/libstdc++ tables.
    pub fn new() -> Self {
        let mut picker = Self::empty();
        default_mappings::add_default_mappings(&mut picker);
        picker
    }

    /// A picker with no mappings at all; used by tests and by
    /// `--no-default-mappings`.
    pub fn empty() -> Self {
        IncludePicker {
            symbol_include_map: BTreeMap::new(),
            filepath_include_map: BTreeMap::new(),
            include_visibility_map: BTreeMap::new(),
            path_visibility_map: BTreeMap::new(),
            quoted_includes_to_quoted_includers: BTreeMap::new(),
            include_as_written: HashMap::new(),
            friend_to_headers_map: BTreeMap::new(),
            mapping_file_search_path: Vec::new(),
            finalized: false,
        }
    }

    fn assert_mutable(&self) {
        assert!(
            !self.finalized,
            "include picker may not be mutated after finalize_added_includes()"
        );
    }

    fn mark_visibility(map: &mut BTreeMap<String, Visibility>, key: &str, vis: Visibility) {
        if vis == Visibility::Unset {
            return;
        }
        let entry = map.entry(key.to_string()).or_insert(vis);
        assert!(
            *entry == vis,
            "same file seen with two different visibilities: {} (old: {:?}, new: {:?})",
            key,
            entry,
            vis
        );
    }

    /// Records an include edge and applies the built-in inference rules:
    /// `<built-in>` is private, `internal/` headers are private with their
    /// sibling directory as friends, and `<asm-ARCH/...>` maps to
    /// `<asm/...>`.
    pub fn add_direct_include(
        &mut self,
        includer_filepath: &str,
        includee_filepath: &str,
        quoted_include_as_written: &str,
    ) {
        self.assert_mutable();

        let quoted_includer = convert_to_quoted_include(includer_filepath);
        let quoted_includee = convert_to_quoted_include(includee_filepath);

        self.quoted_includes_to_quoted_includers
            .entry(quoted_includee.clone())
            .or_default()
            .insert(quoted_includer.clone());
        if !quoted_include_as_written.is_empty() {
            self.include_as_written.insert(
                path_pair_hash(includer_filepath, includee_filepath),
                quoted_include_as_written.to_string(),
            );
        }

        // The compiler's fake includer of the main file must never become a
        // suggestion.
        if includer_filepath == "<built-in>" {
            self.mark_include_as_private("\"<built-in>\"");
        }

        // foo/internal/bar.h is private; everyone under foo/ is a friend and
        // the includer is assumed to be its public face.
        if let Some(pos) = find_internal_segment(&quoted_includee) {
            self.mark_include_as_private(&quoted_includee);
            self.add_friend_regex(
                includee_filepath,
                &format!("{}.*", &quoted_includee[..pos]),
            );
            self.add_mapping(&quoted_includee, MappedInclude::new(quoted_includer));
        } else if let Some(rest) = quoted_includee.strip_prefix("<asm-") {
            // <asm-cris/posix_types.h> is the arch-specific spelling of
            // <asm/posix_types.h>.
            if let Some(slash) = rest.find('/') {
                self.mark_include_as_private(&quoted_includee);
                let public_header = format!("<asm/{}", &rest[slash + 1..]);
                self.add_mapping(&quoted_includee, MappedInclude::new(public_header));
            }
        }
    }

    /// Appends `map_to` to the candidate list of `map_from`. Keys may be
    /// `@`-prefixed regexes; values must be plain quoted includes.
    pub fn add_mapping(&mut self, map_from: &str, map_to: MappedInclude) {
        self.assert_mutable();
        assert!(
            is_quoted_filepath_pattern(map_from),
            "map keys must be quoted filepaths or @ followed by a regex: {}",
            map_from
        );
        assert!(
            is_quoted_include(&map_to.quoted_include),
            "map values must be quoted includes: {}",
            map_to.quoted_include
        );
        self.filepath_include_map
            .entry(map_from.to_string())
            .or_default()
            .push(map_to);
    }

    pub fn add_include_mapping(
        &mut self,
        map_from: &str,
        from_visibility: Visibility,
        map_to: MappedInclude,
        to_visibility: Visibility,
    ) {
        let to_quoted = map_to.quoted_include.clone();
        self.add_mapping(map_from, map_to);
        Self::mark_visibility(&mut self.include_visibility_map, map_from, from_visibility);
        Self::mark_visibility(&mut self.include_visibility_map, &to_quoted, to_visibility);
    }

    /// Symbol keys are always private, so lookups never "self-map" to the
    /// symbol name.
    pub fn add_symbol_mapping(
        &mut self,
        symbol: &str,
        map_to: MappedInclude,
        to_visibility: Visibility,
    ) {
        self.assert_mutable();
        assert!(
            is_quoted_include(&map_to.quoted_include),
            "map values must be quoted includes: {}",
            map_to.quoted_include
        );
        let to_quoted = map_to.quoted_include.clone();
        self.symbol_include_map
            .entry(symbol.to_string())
            .or_default()
            .push(map_to);
        Self::mark_visibility(&mut self.include_visibility_map, symbol, Visibility::Private);
        Self::mark_visibility(&mut self.include_visibility_map, &to_quoted, to_visibility);
    }

    pub fn mark_include_as_private(&mut self, quoted_filepath_pattern: &str) {
        self.assert_mutable();
        assert!(
            is_quoted_filepath_pattern(quoted_filepath_pattern),
            "mark_include_as_private takes a quoted filepath pattern: {}",
            quoted_filepath_pattern
        );
        Self::mark_visibility(
            &mut self.include_visibility_map,
            quoted_filepath_pattern,
            Visibility::Private,
        );
    }

    pub fn mark_path_as_private(&mut self, path: &str) {
        self.assert_mutable();
        Self::mark_visibility(&mut self.path_visibility_map, path, Visibility::Private);
    }

    /// `friend_regex` must match a quoted include (quotes included in the
    /// pattern). Any includer matching it may include `includee_filepath`
    /// even when that file is private.
    pub fn add_friend_regex(&mut self, includee_filepath: &str, friend_regex: &str) {
        self.assert_mutable();
        self.friend_to_headers_map
            .entry(format!("@{}", friend_regex))
            .or_default()
            .insert(includee_filepath.to_string());
    }

    /// Copies the values of every `@regex` key onto each seen include that
    /// fully matches it (anchored `^(...)$`), skipping matches that would
    /// create an identity mapping. The concrete key inherits the regex
    /// key's visibility.
    fn expand_regexes(&mut self) {
        let filepath_regex_keys: Vec<String> = regex_keys(&self.filepath_include_map);
        let friend_regex_keys: Vec<String> =
            self.friend_to_headers_map.keys().cloned().collect();

        let seen_includes: Vec<String> = self
            .quoted_includes_to_quoted_includers
            .keys()
            .cloned()
            .collect();
        for hdr in &seen_includes {
            for regex_key in &filepath_regex_keys {
                let re = anchored_regex(&regex_key[1..]);
                let map_to = &self.filepath_include_map[regex_key];
                if re.is_match(hdr) && !map_to.iter().any(|m| m.quoted_include == *hdr) {
                    let values = map_to.clone();
                    let vis = self
                        .include_visibility_map
                        .get(regex_key)
                        .copied()
                        .unwrap_or(Visibility::Unset);
                    self.filepath_include_map
                        .entry(hdr.clone())
                        .or_default()
                        .extend(values);
                    Self::mark_visibility(&mut self.include_visibility_map, hdr, vis);
                }
            }
            for regex_key in &friend_regex_keys {
                if !regex_key.starts_with('@') {
                    continue;
                }
                let re = anchored_regex(&regex_key[1..]);
                if re.is_match(hdr) {
                    let values = self.friend_to_headers_map[regex_key].clone();
                    self.friend_to_headers_map
                        .entry(hdr.clone())
                        .or_default()
                        .extend(values);
                }
            }
        }
    }

    /// Third-party code can't carry our pragmas, so trust its authors: a
    /// third-party header only ever included from other third-party files,
    /// with no explicit mapping, maps to each of its includers and becomes
    /// private.
    fn add_implicit_third_party_mappings(&mut self) {
        let explicit: BTreeSet<String> = self
            .filepath_include_map
            .keys()
            .filter(|k| is_third_party_file(k))
            .cloned()
            .collect();

        let mut included_from_non_third_party = BTreeSet::new();
        for (includee, includers) in &self.quoted_includes_to_quoted_includers {
            if includers.iter().any(|inc| !is_third_party_file(inc)) {
                included_from_non_third_party.insert(includee.clone());
            }
        }

        let mut new_mappings: Vec<(String, String)> = Vec::new();
        for (includee, includers) in &self.quoted_includes_to_quoted_includers {
            if !is_third_party_file(includee)
                || explicit.contains(includee)
                || included_from_non_third_party.contains(includee)
            {
                continue;
            }
            for includer in includers {
                new_mappings.push((includee.clone(), includer.clone()));
            }
        }
        for (includee, includer) in new_mappings {
            self.add_mapping(&includee, MappedInclude::new(includer));
            if self.get_visibility_for_quoted(&includee) == Visibility::Unset {
                self.mark_include_as_private(&includee);
            }
        }
    }

    /// Depth-first closure of the filepath map, so a.h -> b.h -> c.h also
    /// yields a.h -> c.h directly. Cycles are fatal except in code we don't
    /// own (`third_party/`, `internal/`), where the offending edge is
    /// dropped with a warning.
    fn make_map_transitive(&mut self) {
        let keys: Vec<String> = self.filepath_include_map.keys().cloned().collect();
        let mut seen_nodes: BTreeMap<String, TransitiveStatus> = BTreeMap::new();
        let mut node_stack: Vec<String> = Vec::new();
        for key in keys {
            Self::make_node_transitive(
                &mut self.filepath_include_map,
                &mut seen_nodes,
                &mut node_stack,
                &key,
            );
        }
    }

    fn make_node_transitive(
        filepath_map: &mut IncludeMap,
        seen_nodes: &mut BTreeMap<String, TransitiveStatus>,
        node_stack: &mut Vec<String>,
        key: &str,
    ) {
        match seen_nodes.get(key) {
            Some(TransitiveStatus::Calculating) => {
                let tolerated = cycle_is_tolerated(key, node_stack);
                if tolerated {
                    warn!("ignoring a cyclical mapping involving {}", key);
                    return;
                }
                let mut msg = String::from("cycle in include mapping:\n");
                for node in node_stack.iter() {
                    msg.push_str(&format!("  {} ->\n", node));
                }
                msg.push_str(&format!("  {}", key));
                panic!("{}", msg);
            }
            Some(TransitiveStatus::Done) => return,
            None => {}
        }

        let children: Vec<String> = match filepath_map.get(key) {
            Some(values) => values.iter().map(|m| m.quoted_include.clone()).collect(),
            None => {
                seen_nodes.insert(key.to_string(), TransitiveStatus::Done);
                return;
            }
        };

        seen_nodes.insert(key.to_string(), TransitiveStatus::Calculating);
        for child in &children {
            node_stack.push(child.clone());
            Self::make_node_transitive(filepath_map, seen_nodes, node_stack, child);
            node_stack.pop();
        }
        seen_nodes.insert(key.to_string(), TransitiveStatus::Done);

        // The children are transitive now, so one expansion step closes
        // this node too.
        let old_values = filepath_map.get(key).cloned().unwrap_or_default();
        let expanded = expand_once(filepath_map, &old_values);
        filepath_map.insert(key.to_string(), expanded);
    }

    /// Must be called exactly once, after every `#include` has been seen.
    /// Expands regex keys, infers third-party mappings, and transitively
    /// closes both maps. After this only queries are allowed.
    pub fn finalize_added_includes(&mut self) {
        assert!(
            !self.finalized,
            "finalize_added_includes() may only be called once"
        );
        self.expand_regexes();
        self.add_implicit_third_party_mappings();
        self.make_map_transitive();

        // With the filepath map closed, the symbol map closes in a single
        // expansion step.
        let symbol_keys: Vec<String> = self.symbol_include_map.keys().cloned().collect();
        for key in symbol_keys {
            let values = self.symbol_include_map[&key].clone();
            let expanded = expand_once(&self.filepath_include_map, &values);
            self.symbol_include_map.insert(key, expanded);
        }

        self.finalized = true;
    }

    fn get_visibility_for_quoted(&self, quoted_include: &str) -> Visibility {
        self.include_visibility_map
            .get(quoted_include)
            .copied()
            .unwrap_or(Visibility::Unset)
    }

    fn get_visibility(&self, mapped: &MappedInclude) -> Visibility {
        match self.include_visibility_map.get(&mapped.quoted_include) {
            Some(vis) => *vis,
            None => match &mapped.path {
                Some(path) => self
                    .path_visibility_map
                    .get(path)
                    .copied()
                    .unwrap_or(Visibility::Unset),
                None => Visibility::Unset,
            },
        }
    }

    pub fn is_public(&self, mapped: &MappedInclude) -> bool {
        self.get_visibility(mapped) != Visibility::Private
    }

    /// The values for `key` with private entries filtered out. A public key
    /// is implicitly its own first candidate.
    fn get_public_values(&self, m: &IncludeMap, key: &str) -> Vec<MappedInclude> {
        assert!(!key.starts_with('@'), "key may not be a regex: {}", key);
        let values = match m.get(key) {
            Some(values) if !values.is_empty() => values,
            _ => return Vec::new(),
        };

        let mut retval = Vec::new();
        if self.get_visibility_for_quoted(key) != Visibility::Private {
            retval.push(MappedInclude::new(key));
        }
        for value in values {
            assert!(!value.quoted_include.starts_with('@'));
            if self.is_public(value) {
                retval.push(value.clone());
            }
        }
        retval
    }

    fn assert_finalized(&self) {
        assert!(
            self.finalized,
            "queries require finalize_added_includes() to have run"
        );
    }

    /// Ordered public headers that provide `symbol`, best first. Empty for
    /// symbols with no mapping.
    pub fn get_candidate_headers_for_symbol(&self, symbol: &str) -> Vec<MappedInclude> {
        self.assert_finalized();
        self.get_public_values(&self.symbol_include_map, symbol)
    }

    /// Ordered public headers that provide the file at `filepath`. Falls
    /// back to the file itself, quoted, when nothing maps it.
    pub fn get_candidate_headers_for_filepath(&self, filepath: &str) -> Vec<MappedInclude> {
        self.assert_finalized();
        let quoted_header = convert_to_quoted_include(filepath);
        let retval = self.get_public_values(&self.filepath_include_map, &quoted_header);
        if retval.is_empty() {
            return vec![MappedInclude::with_path(quoted_header, filepath)];
        }
        retval
    }

    /// Like `get_candidate_headers_for_filepath`, but specialized for a
    /// known includer: friends may keep the private header itself, and when
    /// the includer wrote its own spelling for the file we echo it back.
    pub fn get_candidate_headers_for_filepath_included_from(
        &self,
        included_filepath: &str,
        including_filepath: &str,
    ) -> Vec<String> {
        self.assert_finalized();
        let quoted_includer = convert_to_quoted_include(including_filepath);
        let quoted_includee = convert_to_quoted_include(included_filepath);

        let mut retval: Vec<String>;
        let is_friend = self
            .friend_to_headers_map
            .get(&quoted_includer)
            .map(|headers| headers.contains(included_filepath))
            .unwrap_or(false);
        if is_friend {
            retval = vec![quoted_includee.clone()];
        } else {
            retval = self
                .get_candidate_headers_for_filepath(included_filepath)
                .into_iter()
                .map(|m| best_quoted_include_for_includer(&m, including_filepath))
                .collect();
            if retval.len() == 1
                && self.get_visibility_for_quoted(&retval[0]) == Visibility::Private
            {
                warn!(
                    "no public header found to replace the private header {}",
                    retval[0]
                );
            }
        }

        // Prefer the include spelling the user actually wrote; it survives
        // symlinks and ./ segments that convert_to_quoted_include loses.
        if let Some(as_written) = self
            .include_as_written
            .get(&path_pair_hash(including_filepath, included_filepath))
        {
            let relativized = best_quoted_include_for_includer(
                &MappedInclude::with_path(quoted_includee.clone(), included_filepath),
                including_filepath,
            );
            if let Some(slot) = retval
                .iter_mut()
                .find(|q| **q == quoted_includee || **q == relativized)
            {
                *slot = as_written.clone();
            }
        }
        retval
    }

    /// True iff `map_to_filepath` re-exports `map_from_filepath`: either
    /// reachable in the (transitively closed) filepath map, or the same
    /// file.
    pub fn has_mapping(&self, map_from_filepath: &str, map_to_filepath: &str) -> bool {
        self.assert_finalized();
        let quoted_from = convert_to_quoted_include(map_from_filepath);
        let quoted_to = convert_to_quoted_include(map_to_filepath);
        if let Some(mappers) = self.filepath_include_map.get(&quoted_from) {
            if mappers.iter().any(|m| m.quoted_include == quoted_to) {
                return true;
            }
        }
        quoted_from == quoted_to
    }

    pub fn maybe_get_include_name_as_written(
        &self,
        includer_filepath: &str,
        includee_filepath: &str,
    ) -> Option<&str> {
        self.include_as_written
            .get(&path_pair_hash(includer_filepath, includee_filepath))
            .map(|s| s.as_str())
    }

    pub fn mapping_file_search_path(&self) -> &[String] {
        &self.mapping_file_search_path
    }
}

impl Default for IncludePicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Position right after `foo/` in `"foo/internal/bar.h"`, if the quoted
/// include has an `internal/` segment preceded by a slash.
fn find_internal_segment(quoted_include: &str) -> Option<usize> {
    let pos = quoted_include.find("internal/")?;
    if pos > 0 && quoted_include.as_bytes()[pos - 1] == b'/' {
        Some(pos)
    } else {
        None
    }
}

fn regex_keys(m: &IncludeMap) -> Vec<String> {
    m.keys().filter(|k| k.starts_with('@')).cloned().collect()
}

/// ""-style spellings depend on where the includer sits: a mapped include
/// that knows its on-disk path is respelled relative to the includer's
/// directory when it lives underneath it.
fn best_quoted_include_for_includer(mapped: &MappedInclude, including_filepath: &str) -> String {
    if let Some(path) = &mapped.path {
        if mapped.quoted_include.starts_with('"') {
            let includer_dir = format!("{}/", crate::paths::parent_path(including_filepath));
            if includer_dir != "./" {
                if let Some(relative) = path.strip_prefix(&includer_dir) {
                    return format!("\"{}\"", relative);
                }
            }
        }
    }
    mapped.quoted_include.clone()
}

/// Regex keys must match the whole candidate, not a substring.
fn anchored_regex(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{})$", pattern))
        .unwrap_or_else(|e| panic!("bad mapping regex '{}': {}", pattern, e))
}

fn cycle_is_tolerated(key: &str, node_stack: &[String]) -> bool {
    std::iter::once(key)
        .chain(node_stack.iter().map(|s| s.as_str()))
        .any(|node| is_third_party_file(node) || node.contains("internal/"))
}

/// Replaces each node with the node itself plus its children in
/// `filepath_map`, preserving order and skipping duplicates.
fn expand_once(filepath_map: &IncludeMap, values: &[MappedInclude]) -> Vec<MappedInclude> {
    let mut expanded: Vec<MappedInclude> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for value in values {
        if seen.insert(value.quoted_include.clone()) {
            expanded.push(value.clone());
        }
        if let Some(children) = filepath_map.get(&value.quoted_include) {
            for child in children {
                if seen.insert(child.quoted_include.clone()) {
                    expanded.push(child.clone());
                }
            }
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(values: &[MappedInclude]) -> Vec<String> {
        values.iter().map(|m| m.quoted_include.clone()).collect()
    }

    #[test]
    fn test_dynamic_private_to_public_mapping() {
        let mut p = IncludePicker::empty();
        p.add_direct_include("project/public/foo.h", "project/internal/private.h", "");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("project/internal/private.h")),
            vec!["\"project/public/foo.h\""]
        );
    }

    #[test]
    fn test_multiple_public_files_keep_insertion_order() {
        let mut p = IncludePicker::empty();
        p.add_direct_include("project/public/foo.h", "project/internal/private.h", "");
        p.add_direct_include("project/public/bar.h", "project/internal/private.h", "");
        p.add_direct_include("project/public/bar.h", "project/internal/other.h", "");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("project/internal/private.h")),
            vec!["\"project/public/foo.h\"", "\"project/public/bar.h\""]
        );
    }

    #[test]
    fn test_transitive_mapping() {
        let mut p = IncludePicker::empty();
        p.add_direct_include("project/public/foo.h", "project/internal/private.h", "");
        p.add_direct_include("project/internal/private.h", "project/internal/other.h", "");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("project/internal/other.h")),
            vec!["\"project/public/foo.h\""]
        );
    }

    #[test]
    fn test_normalizes_asm_architecture_headers() {
        let mut p = IncludePicker::empty();
        p.add_direct_include("/usr/include/types.h", "/usr/include/asm-cris/posix_types.h", "");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath(
                "/usr/src/linux-headers-2.6.24-gg23/include/asm-cris/posix_types.h"
            )),
            vec!["<asm/posix_types.h>"]
        );
    }

    #[test]
    fn test_explicit_private_to_public_mapping() {
        let mut p = IncludePicker::empty();
        p.add_mapping(
            "\"project/private/foo.h\"",
            MappedInclude::new("\"project/not_private/bar.h\""),
        );
        p.mark_include_as_private("\"project/private/foo.h\"");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("project/private/foo.h")),
            vec!["\"project/not_private/bar.h\""]
        );
    }

    #[test]
    fn test_regex_key_does_not_create_identity_mapping() {
        let mut p = IncludePicker::empty();
        p.add_mapping("@\"mydir/.*\\.h\"", MappedInclude::new("\"mydir/include.h\""));
        p.mark_include_as_private("@\"mydir/.*\\.h\"");
        p.add_direct_include("a.h", "mydir/internal.h", "");
        p.add_direct_include("b.h", "mydir/include.h", "");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("mydir/internal.h")),
            vec!["\"mydir/include.h\""]
        );
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("mydir/include.h")),
            vec!["\"mydir/include.h\""]
        );
    }

    #[test]
    fn test_never_maps_to_builtin() {
        let mut p = IncludePicker::empty();
        p.add_direct_include("<built-in>", "foo/bar/internal/code.cc", "");
        p.add_direct_include("foo/bar/internal/code.cc", "foo/qux/internal/lib.h", "");
        p.finalize_added_includes();
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("foo/qux/internal/lib.h")),
            vec!["\"foo/qux/internal/lib.h\""]
        );
    }

    #[test]
    #[should_panic(expected = "may not be mutated")]
    fn test_mutation_after_finalize_panics() {
        let mut p = IncludePicker::empty();
        p.finalize_added_includes();
        p.add_mapping("\"a.h\"", MappedInclude::new("\"b.h\""));
    }

    #[test]
    #[should_panic(expected = "may only be called once")]
    fn test_double_finalize_panics() {
        let mut p = IncludePicker::empty();
        p.finalize_added_includes();
        p.finalize_added_includes();
    }

    #[test]
    #[should_panic(expected = "two different visibilities")]
    fn test_visibility_conflict_panics() {
        let mut p = IncludePicker::empty();
        p.add_include_mapping(
            "\"a.h\"",
            Visibility::Private,
            MappedInclude::new("\"b.h\""),
            Visibility::Public,
        );
        p.add_include_mapping(
            "\"a.h\"",
            Visibility::Public,
            MappedInclude::new("\"c.h\""),
            Visibility::Public,
        );
    }

    #[test]
    fn test_path_visibility_is_consulted_after_include_visibility() {
        let mut p = IncludePicker::empty();
        p.mark_path_as_private("lib/hidden.h");
        let by_path = MappedInclude::with_path("\"lib/hidden.h\"", "lib/hidden.h");
        assert!(!p.is_public(&by_path));
        // No path attached: nothing marks the quoted form, so it's public.
        let by_quoted = MappedInclude::new("\"lib/hidden.h\"");
        assert!(p.is_public(&by_quoted));
        // The quoted-include table wins over the path table.
        let mut p = IncludePicker::empty();
        p.mark_path_as_private("lib/both.h");
        p.add_include_mapping(
            "\"other.h\"",
            Visibility::Private,
            MappedInclude::new("\"lib/both.h\""),
            Visibility::Public,
        );
        let both = MappedInclude::with_path("\"lib/both.h\"", "lib/both.h");
        assert!(p.is_public(&both));
    }

    #[test]
    fn test_third_party_cycle_is_tolerated() {
        let mut p = IncludePicker::empty();
        p.add_mapping("\"third_party/a.h\"", MappedInclude::new("\"third_party/b.h\""));
        p.add_mapping("\"third_party/b.h\"", MappedInclude::new("\"third_party/a.h\""));
        p.mark_include_as_private("\"third_party/a.h\"");
        p.mark_include_as_private("\"third_party/b.h\"");
        p.finalize_added_includes();
        // Both sides are private, so neither mapping surfaces in queries.
        assert_eq!(
            quoted(&p.get_candidate_headers_for_filepath("third_party/a.h")),
            vec!["\"third_party/a.h\""]
        );
    }

    #[test]
    #[should_panic(expected = "cycle in include mapping")]
    fn test_project_cycle_is_fatal() {
        let mut p = IncludePicker::empty();
        p.add_mapping("\"a.h\"", MappedInclude::new("\"b.h\""));
        p.add_mapping("\"b.h\"", MappedInclude::new("\"a.h\""));
        p.finalize_added_includes();
    }
}
