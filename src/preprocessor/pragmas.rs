//! In-source pragma parsing. Pragmas ride in ordinary line comments
//! (`// IWYU pragma: ...`) because a real `#pragma` would not survive every
//! context the same way; the scanner recognizes them only when they start a
//! whole-line comment. The `@headername{...}` directive, used by standard
//! library implementations, is honored inside doc comments as well.

use log::warn;

use crate::paths::{convert_to_quoted_include, is_quoted_include};
use crate::picker::{IncludePicker, MappedInclude};
use crate::source::FileId;

use super::lexer::split_on_whitespace_preserving_quotes;
use super::PragmaTables;

const PRAGMA_MARKER: &str = "// IWYU pragma: ";
const HEADERNAME_MARKER: &str = "@headername{";

/// Scans one file's text for pragmas and applies their effects to the
/// picker and the per-file suppression tables.
pub fn process_pragmas_in_file(
    file: FileId,
    filepath: &str,
    contents: &str,
    picker: &mut IncludePicker,
    tables: &mut PragmaTables,
) {
    let mut begin_exports_line: Option<u32> = None;

    for (idx, line) in contents.lines().enumerate() {
        let linenum = idx as u32 + 1;
        let trimmed = line.trim_start();
        let Some(pragma_text) = trimmed.strip_prefix(PRAGMA_MARKER) else {
            continue;
        };
        let tokens = split_on_whitespace_preserving_quotes(pragma_text);

        if let Some(begin_line) = begin_exports_line {
            if match_one_token(&tokens, "end_exports", 1, filepath, linenum) {
                for exported in begin_line + 1..linenum {
                    tables.exported_lines.insert((file, exported));
                }
                begin_exports_line = None;
            } else {
                warn!("{}:{}: expected end_exports pragma", filepath, linenum);
            }
            continue;
        }

        if match_one_token(&tokens, "begin_exports", 1, filepath, linenum) {
            begin_exports_line = Some(linenum);
        } else if match_one_token(&tokens, "end_exports", 1, filepath, linenum) {
            warn!("{}:{}: end_exports without a begin_exports", filepath, linenum);
        } else if match_two_tokens(&tokens, "private,", "include", 3, filepath, linenum) {
            let quoted_this = convert_to_quoted_include(filepath);
            if is_quoted_include(&tokens[2]) {
                picker.add_mapping(&quoted_this, MappedInclude::new(tokens[2].clone()));
                picker.mark_include_as_private(&quoted_this);
            } else {
                warn!(
                    "{}:{}: private pragma needs a quoted include, got '{}'",
                    filepath, linenum, tokens[2]
                );
            }
        } else if match_one_token(&tokens, "private", 1, filepath, linenum) {
            picker.mark_include_as_private(&convert_to_quoted_include(filepath));
        } else if match_one_token(&tokens, "no_include", 2, filepath, linenum) {
            tables
                .no_include_map
                .entry(file)
                .or_default()
                .insert(tokens[1].clone());
        } else if match_one_token(&tokens, "no_forward_declare", 2, filepath, linenum) {
            tables
                .no_forward_declare_map
                .entry(file)
                .or_default()
                .insert(tokens[1].clone());
        } else if match_one_token(&tokens, "friend", 2, filepath, linenum) {
            let mut regex = tokens[1].clone();
            if !regex.starts_with('"') && !regex.starts_with('<') {
                regex = format!("\"{}\"", regex);
            }
            picker.add_friend_regex(filepath, &regex);
        } else if !match_one_token(&tokens, "keep", 1, filepath, linenum)
            && !match_one_token(&tokens, "export", 1, filepath, linenum)
        {
            // keep/export on their own line do nothing here; inline forms
            // are handled where the #include itself is recorded.
            warn!(
                "{}:{}: unknown or malformed pragma ({})",
                filepath, linenum, pragma_text
            );
        }
    }

    if begin_exports_line.is_some() {
        warn!("{}: begin_exports without an end_exports", filepath);
    }

    process_headername_directive(filepath, contents, picker);
}

/// `@headername{foo, bar}` marks this file private and maps it to the
/// listed system headers. At most one directive per file is honored.
fn process_headername_directive(filepath: &str, contents: &str, picker: &mut IncludePicker) {
    for (idx, line) in contents.lines().enumerate() {
        let linenum = idx as u32 + 1;
        let trimmed = line.trim_start();
        let in_comment =
            trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*');
        let Some(pos) = line.find(HEADERNAME_MARKER) else {
            continue;
        };
        if !in_comment {
            continue;
        }
        let after = &line[pos + HEADERNAME_MARKER.len()..];
        let Some(close) = after.find('}') else {
            warn!(
                "{}:{}: @headername directive missing a closing brace",
                filepath, linenum
            );
            continue;
        };
        let quoted_private = convert_to_quoted_include(filepath);
        for name in after[..close].split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let quoted_header = format!("<{}>", name);
            picker.add_mapping(&quoted_private, MappedInclude::new(quoted_header));
            picker.mark_include_as_private(&quoted_private);
        }
        break; // No more than one @headername directive per file.
    }
}

/// True when the first token matches and enough tokens are present. Extra
/// tokens past the expected count get a warning unless they start a trailing
/// comment.
fn match_one_token(
    tokens: &[String],
    token: &str,
    num_expected: usize,
    filepath: &str,
    linenum: u32,
) -> bool {
    if tokens.len() < num_expected || tokens[0] != token {
        return false;
    }
    if tokens.len() > num_expected && !tokens[num_expected].starts_with("//") {
        warn!("{}:{}: extra tokens on pragma line", filepath, linenum);
    }
    true
}

fn match_two_tokens(
    tokens: &[String],
    token1: &str,
    token2: &str,
    num_expected: usize,
    filepath: &str,
    linenum: u32,
) -> bool {
    if tokens.len() < num_expected || tokens[0] != token1 || tokens[1] != token2 {
        return false;
    }
    if tokens.len() > num_expected && !tokens[num_expected].starts_with("//") {
        warn!("{}:{}: extra tokens on pragma line", filepath, linenum);
    }
    true
}
