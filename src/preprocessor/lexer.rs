//! Small text utilities for picking apart pragma lines and preprocessor
//! condition expressions. Hand-rolled because the inputs are single lines
//! and the tokenizer must keep `"..."` and `<...>` spellings intact.

/// Splits on whitespace, but keeps double-quoted and angle-bracketed
/// strings together as single tokens: `private, include "foo bar.h"` splits
/// into `private,`, `include`, `"foo bar.h"`.
pub fn split_on_whitespace_preserving_quotes(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut closing: Option<char> = None;
    for c in text.chars() {
        if let Some(close) = closing {
            current.push(c);
            if c == close {
                closing = None;
            }
            continue;
        }
        match c {
            '"' => {
                current.push(c);
                closing = Some('"');
            }
            '<' => {
                current.push(c);
                closing = Some('>');
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Iterator over the C identifiers in a line, with their 0-based byte
/// offsets.
pub fn identifiers(text: &str) -> Vec<(String, usize)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() {
                let c = bytes[i] as char;
                if c.is_ascii_alphanumeric() || c == '_' {
                    i += 1;
                } else {
                    break;
                }
            }
            out.push((text[start..i].to_string(), start));
        } else {
            i += 1;
        }
    }
    out
}

/// Finds the identifiers that are arguments to `defined` in an `#if` or
/// `#elif` expression: for `#if FOO || defined(BAR) && defined BAZ` this
/// returns BAR and BAZ. (FOO is reported through the ordinary
/// macro-expansion path; macros inside `defined()` are never expanded, so
/// they need this special handling.)
pub fn find_arguments_to_defined(expression: &str) -> Vec<(String, usize)> {
    #[derive(PartialEq)]
    enum State {
        LookingForDefined,
        ExpectingParenOrIdentifier,
        ExpectingIdentifier,
    }

    let mut state = State::LookingForDefined;
    let mut result = Vec::new();
    let mut chars = expression.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = offset;
            let mut end = offset + c.len_utf8();
            while let Some((next_offset, next)) = chars.peek().copied() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    chars.next();
                    end = next_offset + next.len_utf8();
                } else {
                    break;
                }
            }
            let ident = &expression[start..end];
            match state {
                State::LookingForDefined => {
                    if ident == "defined" {
                        state = State::ExpectingParenOrIdentifier;
                    }
                }
                State::ExpectingParenOrIdentifier | State::ExpectingIdentifier => {
                    result.push((ident.to_string(), start));
                    state = State::LookingForDefined;
                }
            }
        } else if c == '(' && state == State::ExpectingParenOrIdentifier {
            state = State::ExpectingIdentifier;
        } else {
            state = State::LookingForDefined;
        }
    }
    result
}

/// The include spelling (with its delimiters) from the rest of an
/// `#include` line, e.g. `<vector>  // comment` yields `<vector>`.
pub fn include_spelling(after_include: &str) -> Option<String> {
    let trimmed = after_include.trim_start();
    let mut chars = trimmed.chars();
    let (open, close) = match chars.next() {
        Some('<') => ('<', '>'),
        Some('"') => ('"', '"'),
        _ => return None,
    };
    let rest = &trimmed[open.len_utf8()..];
    let end = rest.find(close)?;
    Some(format!("{}{}{}", open, &rest[..end], close))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_preserves_quoted_strings() {
        assert_eq!(
            split_on_whitespace_preserving_quotes("private, include \"foo bar.h\""),
            vec!["private,", "include", "\"foo bar.h\""]
        );
        assert_eq!(
            split_on_whitespace_preserving_quotes("export  "),
            vec!["export"]
        );
        assert_eq!(
            split_on_whitespace_preserving_quotes("no_include <a b.h>"),
            vec!["no_include", "<a b.h>"]
        );
    }

    #[test]
    fn test_find_arguments_to_defined() {
        let args = find_arguments_to_defined("FOO || defined(BAR) && defined BAZ");
        let names: Vec<&str> = args.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["BAR", "BAZ"]);
    }

    #[test]
    fn test_find_arguments_to_defined_none() {
        assert!(find_arguments_to_defined("FOO && BAR > 2").is_empty());
    }

    #[test]
    fn test_find_arguments_reports_offsets() {
        let expr = "defined(X)";
        let args = find_arguments_to_defined(expr);
        assert_eq!(args, vec![("X".to_string(), 8)]);
    }

    #[test]
    fn test_include_spelling() {
        assert_eq!(include_spelling(" <vector> // c"), Some("<vector>".to_string()));
        assert_eq!(include_spelling("\"a/b.h\""), Some("\"a/b.h\"".to_string()));
        assert_eq!(include_spelling("MACRO_NAME"), None);
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            identifiers("FOO(x) + _bar2"),
            vec![
                ("FOO".to_string(), 0),
                ("x".to_string(), 4),
                ("_bar2".to_string(), 9)
            ]
        );
    }
}
