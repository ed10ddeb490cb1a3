//! Free-text schedule message parsing
//!
//! A schedule message is a sequence of date-anchored blocks:
//!
//! ```text
//! 5/3 Release review @alice @bob (lead) in the big room
//! 5/10 Retro @carol
//! ```
//!
//! Each line starting with a `MM/DD` token opens a block that runs to the
//! next such line or the end of the message. Mentions are pulled out of the
//! block in order of appearance and the remainder becomes the reminder text.

use anyhow::Result;
use regex::Regex;

/// One date-anchored block, normalized for reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    /// `MM/DD` key, 1-2 digits per part, exactly as typed
    pub date: String,
    /// Mention tokens with the `<` link marker, in order of first appearance
    pub users: Vec<String>,
    /// Block text with mention substrings removed, edge-trimmed
    pub message: String,
}

/// Splits raw message text into [`ParsedEntry`] values.
pub struct ReminderParser {
    anchor: Regex,
    mention: Regex,
}

impl ReminderParser {
    pub fn new() -> Result<Self> {
        Ok(ReminderParser {
            // A date token at the start of a line opens a block
            anchor: Regex::new(r"(?m)^\d{1,2}/\d{1,2}")?,
            // "@name" optionally followed by a parenthesized annotation
            mention: Regex::new(r"@\S+(?:\s+\([^)]+\))?")?,
        })
    }

    /// Parse a message into zero or more entries.
    ///
    /// Text with no date anchor yields an empty vec; that is the caller's
    /// cue to tell the author the message was not understood, not an error.
    /// A date appearing twice yields two entries; persistence order decides
    /// which one survives.
    pub fn parse(&self, text: &str) -> Vec<ParsedEntry> {
        self.segments(text)
            .into_iter()
            .map(|(date, content)| self.extract(date, content))
            .collect()
    }

    /// Locate date anchors and slice the text between them.
    ///
    /// The `regex` crate has no lookahead, so instead of one big pattern the
    /// anchors are found first and each block is the slice running from its
    /// anchor to the next one (or the end of text).
    fn segments<'a>(&self, text: &'a str) -> Vec<(&'a str, &'a str)> {
        let anchors: Vec<_> = self.anchor.find_iter(text).collect();
        anchors
            .iter()
            .enumerate()
            .map(|(i, anchor)| {
                let end = anchors.get(i + 1).map_or(text.len(), |next| next.start());
                (anchor.as_str(), &text[anchor.end()..end])
            })
            .collect()
    }

    fn extract(&self, date: &str, content: &str) -> ParsedEntry {
        let users = self
            .mention
            .find_iter(content)
            .map(|m| format!("<{}", m.as_str()))
            .collect();
        let message = self.mention.replace_all(content, "").trim().to_string();
        ParsedEntry {
            date: date.trim().to_string(),
            users,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ReminderParser {
        ReminderParser::new().unwrap()
    }

    #[test]
    fn test_single_entry_with_annotated_mention() {
        let entries = parser().parse("5/3 Meeting @alice @bob (lead) notes here");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].date, "5/3");
        assert_eq!(entries[0].users, vec!["<@alice", "<@bob (lead)"]);
        // Interior whitespace is preserved verbatim: stripping the two
        // mention substrings leaves the spaces that surrounded them.
        assert_eq!(entries[0].message, "Meeting   notes here");
    }

    #[test]
    fn test_two_segments() {
        let entries = parser().parse("3/1 Lunch @x\n3/2 Dinner @y");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "3/1");
        assert_eq!(entries[0].users, vec!["<@x"]);
        assert_eq!(entries[0].message, "Lunch");
        assert_eq!(entries[1].date, "3/2");
        assert_eq!(entries[1].users, vec!["<@y"]);
        assert_eq!(entries[1].message, "Dinner");
    }

    #[test]
    fn test_block_spans_multiple_lines() {
        let entries = parser().parse("12/24 Party setup\nbring snacks @dana\n12/25 Party @all");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "12/24");
        assert_eq!(entries[0].users, vec!["<@dana"]);
        assert_eq!(entries[0].message, "Party setup\nbring snacks");
    }

    #[test]
    fn test_no_date_token_yields_nothing() {
        assert!(parser().parse("remember the milk @alice").is_empty());
        assert!(parser().parse("").is_empty());
    }

    #[test]
    fn test_date_mid_line_is_not_an_anchor() {
        let entries = parser().parse("moved to 6/1, see thread");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_block_with_no_mentions() {
        let entries = parser().parse("7/7 Ship the release");

        assert_eq!(entries.len(), 1);
        assert!(entries[0].users.is_empty());
        assert_eq!(entries[0].message, "Ship the release");
    }

    #[test]
    fn test_block_with_only_mentions() {
        let entries = parser().parse("7/7 @alice @bob");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].users, vec!["<@alice", "<@bob"]);
        assert_eq!(entries[0].message, "");
    }

    #[test]
    fn test_duplicate_dates_yield_duplicate_entries() {
        let entries = parser().parse("4/1 First @a\n4/1 Second @b");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "4/1");
        assert_eq!(entries[1].date, "4/1");
        assert_eq!(entries[1].message, "Second");
    }

    #[test]
    fn test_zero_padded_dates_kept_as_typed() {
        let entries = parser().parse("05/03 Standup @team");
        assert_eq!(entries[0].date, "05/03");
    }
}
