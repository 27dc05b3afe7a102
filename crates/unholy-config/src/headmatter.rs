//! Headmatter splitting for Unholyfiles
//!
//! An Unholyfile is an optional TOML block fenced by divider lines (three or
//! more `-`), followed by a free-form shell script:
//!
//! ```text
//! ---
//! [dev]
//! image = "ghcr.io/example/devenv:latest"
//! ---
//! #!/bin/sh
//! echo "hello from the devenv"
//! ```
//!
//! Splitting never normalizes anything: the divider lines keep their exact
//! text and line endings so a rewrite can reproduce everything outside the
//! TOML block byte-for-byte.

use std::sync::LazyLock;

use regex::Regex;
use toml_edit::DocumentMut;

use crate::error::{Error, Result};

static DIVIDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{3,}$").unwrap());

/// The four verbatim parts of an Unholyfile.
///
/// `leader`, `head`, `divider` and `tail` concatenate back to the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Headmatter<'a> {
    /// Opening divider line, including its line ending. Empty when absent.
    pub leader: &'a str,
    /// TOML text between the dividers.
    pub head: &'a str,
    /// Closing divider line, including its line ending. Empty when absent.
    pub divider: &'a str,
    /// Everything after the closing divider: the script.
    pub tail: &'a str,
}

impl<'a> Headmatter<'a> {
    /// Whether the text opened with a divider line.
    pub fn has_headmatter(&self) -> bool {
        !self.leader.is_empty()
    }
}

/// Split text into leader, head, divider and tail.
///
/// - Empty input gives four empty parts.
/// - If the first line is a divider, lines up to the next divider are the
///   head and the rest is the tail. Without a closing divider everything
///   after the first line is head and the tail is empty.
/// - Otherwise the entire input is tail.
pub fn split(text: &str) -> Headmatter<'_> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Headmatter::default();
    };

    if !is_divider(first) {
        return Headmatter {
            tail: text,
            ..Headmatter::default()
        };
    }

    let head_start = first.len();
    let mut offset = head_start;
    for line in lines {
        if is_divider(line) {
            return Headmatter {
                leader: first,
                head: &text[head_start..offset],
                divider: line,
                tail: &text[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    Headmatter {
        leader: first,
        head: &text[head_start..],
        divider: "",
        tail: "",
    }
}

/// Split text and parse its head as TOML.
///
/// `origin` names the text in parse errors (e.g. `user Unholyfile`).
pub fn parse<'a>(text: &'a str, origin: &str) -> Result<(DocumentMut, &'a str)> {
    let parts = split(text);
    let document = parts
        .head
        .parse::<DocumentMut>()
        .map_err(|e| Error::parse(origin, e.to_string()))?;
    Ok((document, parts.tail))
}

fn is_divider(line: &str) -> bool {
    DIVIDER.is_match(line.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_round_trips_verbatim() {
        let text = "-----\r\nkey = 1\n----\nscript\n";
        let parts = split(text);
        let joined = format!(
            "{}{}{}{}",
            parts.leader, parts.head, parts.divider, parts.tail
        );
        assert_eq!(joined, text);
        assert_eq!(parts.leader, "-----\r\n");
        assert_eq!(parts.divider, "----\n");
    }

    #[test]
    fn test_two_dashes_is_not_a_divider() {
        let parts = split("--\nkey = 1\n");
        assert!(!parts.has_headmatter());
        assert_eq!(parts.tail, "--\nkey = 1\n");
    }

    #[test]
    fn test_divider_with_trailing_spaces() {
        let parts = split("---  \na = 1\n  ---\nrest");
        assert_eq!(parts.head, "a = 1\n");
        assert_eq!(parts.tail, "rest");
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = parse("---\n[broken\n---\n", "repo Unholyfile").unwrap_err();
        assert!(err.to_string().contains("repo Unholyfile"));
    }
}
