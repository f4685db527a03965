//! Sections: a heading line and everything under it.
//!
//! `extract_sections` always returns the preamble (text before the first heading)
//! first, then one section per heading that is not nested under a shallower one.
//! Deeper headings stay inside their parent's `content` and are reachable through
//! [`Section::subsections`].

use serde::Serialize;

use crate::wikitext::Entity;
use crate::wikitext::enums::EntityKind;

pub const MAX_HEADING_LEVEL: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// 1 to 6. The preamble is level 1.
    pub level: u8,
    /// Heading text, trimmed. `None` for the preamble.
    pub header: Option<String>,
    /// Byte offset of the section start in the document.
    pub index: usize,
    /// Heading line included.
    pub content: String,
}

impl Entity for Section {
    fn kind(&self) -> EntityKind {
        EntityKind::Section
    }
    fn wikitext(&self) -> &str {
        &self.content
    }
}

/// Level and header text if `line` is a heading.
///
/// With uneven `=` runs the shorter run sets the level and the rest of the longer
/// one is part of the header: `===Foo==` is level 2 with header `=Foo`.
fn parse_heading(line: &str) -> Option<(u8, String)> {
    let line = line.trim_end();
    if !line.starts_with('=') || !line.ends_with('=') {
        return None;
    }
    let len = line.len();
    if line.bytes().all(|b| b == b'=') {
        if len < 3 {
            return None;
        }
        let level = ((len - 1) / 2).min(MAX_HEADING_LEVEL as usize);
        return Some((level as u8, "=".repeat(len - 2 * level)));
    }
    let left = line.bytes().take_while(|b| *b == b'=').count();
    let right = line.bytes().rev().take_while(|b| *b == b'=').count();
    let level = left.min(right).min(MAX_HEADING_LEVEL as usize);
    Some((level as u8, line[level..len - level].trim().to_string()))
}

/// Split `text` into the preamble and its top-level sections.
pub fn extract_sections(text: &str) -> Vec<Section> {
    // (offset, level, header) of every heading line
    let mut headings = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if let Some((level, header)) = parse_heading(line) {
            headings.push((offset, level, header));
        }
        offset += line.len();
    }

    let first = headings.first().map_or(text.len(), |h| h.0);
    let mut sections = vec![Section {
        level: 1,
        header: None,
        index: 0,
        content: text[..first].to_string(),
    }];

    let mut open: Option<(usize, u8, String)> = None;
    for (start, level, header) in headings {
        if open.as_ref().is_some_and(|(_, open_level, _)| level > *open_level) {
            continue;
        }
        if let Some((open_start, open_level, open_header)) = open.take() {
            sections.push(Section {
                level: open_level,
                header: Some(open_header),
                index: open_start,
                content: text[open_start..start].to_string(),
            });
        }
        open = Some((start, level, header));
    }
    if let Some((open_start, open_level, open_header)) = open {
        sections.push(Section {
            level: open_level,
            header: Some(open_header),
            index: open_start,
            content: text[open_start..].to_string(),
        });
    }

    log::trace!("extracted {} sections", sections.len());
    sections
}

impl Section {
    /// Sections nested directly under this one, with document offsets.
    pub fn subsections(&self) -> Vec<Section> {
        if self.header.is_none() {
            return Vec::new();
        }
        let body_start = self
            .content
            .find('\n')
            .map_or(self.content.len(), |i| i + 1);
        extract_sections(&self.content[body_start..])
            .into_iter()
            .skip(1)
            .map(|mut s| {
                s.index += self.index + body_start;
                s
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Lead text.\n== History ==\nOld.\n=== Early ===\nVery old.\n== Usage ==\nNow.\n";

    #[test]
    fn preamble_comes_first() {
        let s = extract_sections(DOC);
        assert_eq!(s[0].level, 1);
        assert_eq!(s[0].header, None);
        assert_eq!(s[0].index, 0);
        assert_eq!(s[0].content, "Lead text.\n");

        let s = extract_sections("== Heading first ==\nx");
        assert_eq!(s[0].content, "");
        assert_eq!(s.len(), 2);

        let s = extract_sections("");
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].content, "");
    }

    #[test]
    fn deeper_headings_are_absorbed() {
        let s = extract_sections(DOC);
        assert_eq!(s.len(), 3);
        assert_eq!(s[1].header.as_deref(), Some("History"));
        assert_eq!(s[1].level, 2);
        assert_eq!(
            s[1].content,
            "== History ==\nOld.\n=== Early ===\nVery old.\n"
        );
        assert_eq!(s[2].header.as_deref(), Some("Usage"));
        assert_eq!(s[2].index, DOC.find("== Usage").unwrap());
    }

    #[test]
    fn sections_are_contiguous() {
        let s = extract_sections(DOC);
        let joined: String = s.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(joined, DOC);
        for pair in s.windows(2) {
            assert_eq!(pair[0].index + pair[0].content.len(), pair[1].index);
        }
    }

    #[test]
    fn shallower_heading_after_deep_start() {
        let s = extract_sections("=== A ===\n== B ==\n==== C ====\n");
        let headers: Vec<&str> = s.iter().filter_map(|s| s.header.as_deref()).collect();
        assert_eq!(headers, vec!["A", "B"]);
    }

    #[test]
    fn uneven_runs() {
        assert_eq!(parse_heading("===Foo=="), Some((2, "=Foo".to_string())));
        assert_eq!(parse_heading("==Foo==== "), Some((2, "Foo==".to_string())));
        assert_eq!(
            parse_heading("======= Deep ======="),
            Some((6, "= Deep =".to_string()))
        );
        assert_eq!(parse_heading("=x="), Some((1, "x".to_string())));
    }

    #[test]
    fn not_headings() {
        assert_eq!(parse_heading("== open"), None);
        assert_eq!(parse_heading(" == indented =="), None);
        assert_eq!(parse_heading("=="), None);
        assert_eq!(parse_heading("plain"), None);
    }

    #[test]
    fn equals_only_lines() {
        assert_eq!(parse_heading("==="), Some((1, "=".to_string())));
        assert_eq!(parse_heading("===="), Some((1, "==".to_string())));
        assert_eq!(parse_heading("====="), Some((2, "=".to_string())));
    }

    #[test]
    fn subsections_keep_document_offsets() {
        let s = extract_sections(DOC);
        let subs = s[1].subsections();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].header.as_deref(), Some("Early"));
        assert_eq!(subs[0].level, 3);
        assert_eq!(subs[0].index, DOC.find("=== Early").unwrap());
        assert_eq!(subs[0].content, "=== Early ===\nVery old.\n");
        assert!(s[2].subsections().is_empty());
        assert!(s[0].subsections().is_empty());
    }

    #[test]
    fn crlf_lines() {
        let s = extract_sections("a\r\n== B ==\r\nb\r\n");
        assert_eq!(s[1].header.as_deref(), Some("B"));
        assert_eq!(s[1].index, 3);
    }
}
