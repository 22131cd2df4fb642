//! Keyed fenced blocks inside a note's raw text.
//!
//! A note is treated as plain text with addressable sub-regions: fenced code
//! blocks tagged with a language identifier. [`BlockDocument::get_block`]
//! reads the first one and [`BlockDocument::set_block`] replaces its body,
//! leaving every other byte of the note untouched.

use std::ops::Range;

use regex::Regex;

/// One fenced block; `body` excludes the fence lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    pub body: &'a str,
    pub body_range: Range<usize>,
}

/// Result of replacing a block body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEdit {
    /// The new body equals the old one; nothing to write.
    Unchanged,
    /// The full note text after the edit.
    Changed(String),
    /// No block with this language exists.
    Missing,
}

/// View over note text addressing blocks of one language.
pub struct BlockDocument<'a> {
    text: &'a str,
    pattern: Regex,
}

impl<'a> BlockDocument<'a> {
    pub fn new(text: &'a str, language: &str) -> Self {
        let pattern = Regex::new(&format!(
            r"(?s)```{}\r?\n(.*?)\r?\n```",
            regex::escape(language)
        ))
        .expect("escaped block pattern is valid");
        Self { text, pattern }
    }

    /// Every block of this language, in document order.
    pub fn blocks(&self) -> Vec<FencedBlock<'a>> {
        self.pattern
            .captures_iter(self.text)
            .filter_map(|caps| caps.get(1))
            .map(|m| FencedBlock {
                body: &self.text[m.range()],
                body_range: m.range(),
            })
            .collect()
    }

    /// The first block of this language.
    pub fn get_block(&self) -> Option<FencedBlock<'a>> {
        self.pattern
            .captures(self.text)
            .and_then(|caps| caps.get(1))
            .map(|m| FencedBlock {
                body: &self.text[m.range()],
                body_range: m.range(),
            })
    }

    /// Replace the body of the first block with `f(old_body)`.
    pub fn set_block(&self, f: impl FnOnce(&str) -> String) -> BlockEdit {
        let Some(block) = self.get_block() else {
            return BlockEdit::Missing;
        };
        let new_body = f(block.body);
        if new_body == block.body {
            return BlockEdit::Unchanged;
        }

        let mut out = String::with_capacity(self.text.len() + new_body.len());
        out.push_str(&self.text[..block.body_range.start]);
        out.push_str(&new_body);
        out.push_str(&self.text[block.body_range.end..]);

        if out == self.text {
            BlockEdit::Unchanged
        } else {
            BlockEdit::Changed(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "---\nmal_id: 1\n---\n\n```animeLog\nmal_id: 1\nstatus: watching\n```\n\ntrailing\n";

    #[test]
    fn test_get_block() {
        let doc = BlockDocument::new(NOTE, "animeLog");
        let block = doc.get_block().unwrap();
        assert_eq!(block.body, "mal_id: 1\nstatus: watching");
    }

    #[test]
    fn test_other_languages_ignored() {
        let text = "```rust\nfn main() {}\n```\n";
        assert!(BlockDocument::new(text, "animeLog").get_block().is_none());
    }

    #[test]
    fn test_set_block_preserves_surroundings() {
        let doc = BlockDocument::new(NOTE, "animeLog");
        let BlockEdit::Changed(out) = doc.set_block(|_| "mal_id: 1\nstatus: dropped".into()) else {
            panic!("expected change");
        };
        assert_eq!(
            out,
            "---\nmal_id: 1\n---\n\n```animeLog\nmal_id: 1\nstatus: dropped\n```\n\ntrailing\n"
        );
    }

    #[test]
    fn test_set_block_same_body_is_unchanged() {
        let doc = BlockDocument::new(NOTE, "animeLog");
        assert_eq!(doc.set_block(str::to_string), BlockEdit::Unchanged);
    }

    #[test]
    fn test_set_block_missing() {
        let doc = BlockDocument::new("no blocks here", "animeLog");
        assert_eq!(doc.set_block(str::to_string), BlockEdit::Missing);
    }

    #[test]
    fn test_only_first_block_is_touched() {
        let text = "```animeLog\nstatus: a\n```\n```animeLog\nstatus: b\n```\n";
        let doc = BlockDocument::new(text, "animeLog");
        assert_eq!(doc.blocks().len(), 2);
        let BlockEdit::Changed(out) = doc.set_block(|_| "status: c".into()) else {
            panic!("expected change");
        };
        assert_eq!(out, "```animeLog\nstatus: c\n```\n```animeLog\nstatus: b\n```\n");
    }

    #[test]
    fn test_empty_block_is_not_a_block() {
        let text = "```animeLog\n```\n";
        let doc = BlockDocument::new(text, "animeLog");
        assert!(doc.get_block().is_none());
        assert_eq!(doc.set_block(|_| "status: watching".into()), BlockEdit::Missing);
    }

    #[test]
    fn test_crlf_note() {
        let text = "```animeLog\r\nmal_id: 1\r\nstatus: watching\r\n```\r\n";
        let block = BlockDocument::new(text, "animeLog").get_block().unwrap();
        assert_eq!(block.body, "mal_id: 1\r\nstatus: watching");
    }
}
