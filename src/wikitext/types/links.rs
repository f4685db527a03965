/*!
Internal links, file embeds and category memberships.

All three are written `[[Target|rest]]`; which one you get depends on the namespace
the target resolves to:
- `File:` without a leading colon is a [`FileEmbed`], `rest` is its option string;
- `Category:` without a leading colon is a [`CategoryMembership`], `rest` is the
  sort key;
- anything else, including `[[:File:x]]` and `[[:Category:x]]`, is a [`Link`].

Only outermost `[[...]]` pairs are reported. A link inside an image caption stays
part of the file's `props`.
*/

use serde::Serialize;

use crate::hard_coded::{NS_CATEGORY, NS_FILE};
use crate::title::{NamespaceRegistry, Title};
use crate::wikitext::Entity;
use crate::wikitext::enums::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub target: Title,
    /// Text shown for the link. Without a pipe this is the target as written,
    /// minus a leading colon.
    pub display: String,
    pub wikitext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEmbed {
    pub target: Title,
    /// Everything after the first pipe, verbatim. Empty without a pipe.
    pub props: String,
    pub wikitext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryMembership {
    pub target: Title,
    /// `None` when there is no pipe at all, `Some("")` for `[[Category:X|]]`.
    pub sort_key: Option<String>,
    pub wikitext: String,
}

/// Output of [`extract_links`], each list in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedLinks {
    pub links: Vec<Link>,
    pub files: Vec<FileEmbed>,
    pub categories: Vec<CategoryMembership>,
}

impl ExtractedLinks {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.files.is_empty() && self.categories.is_empty()
    }
}

impl Entity for Link {
    fn kind(&self) -> EntityKind {
        EntityKind::Link
    }
    fn wikitext(&self) -> &str {
        &self.wikitext
    }
}

impl Entity for FileEmbed {
    fn kind(&self) -> EntityKind {
        EntityKind::FileEmbed
    }
    fn wikitext(&self) -> &str {
        &self.wikitext
    }
}

impl Entity for CategoryMembership {
    fn kind(&self) -> EntityKind {
        EntityKind::CategoryMembership
    }
    fn wikitext(&self) -> &str {
        &self.wikitext
    }
}

/// An open `[[` and the pairs that closed directly inside it.
struct OpenBracket {
    start: usize,
    closed: Vec<(usize, usize)>,
}

/// Byte ranges of the outermost matched `[[...]]` pairs, in document order.
///
/// One pass with a stack of open brackets. A pair inside a bracket that never
/// closes is still outermost, so those are promoted when the text ends.
fn outermost_pairs(bytes: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<OpenBracket> = Vec::new();
    let mut idx = 0;

    while idx + 1 < bytes.len() {
        match (bytes[idx], bytes[idx + 1]) {
            (b'[', b'[') => {
                open.push(OpenBracket {
                    start: idx,
                    closed: Vec::new(),
                });
                idx += 2;
            }
            (b']', b']') => {
                idx += 2;
                let Some(bracket) = open.pop() else {
                    continue;
                };
                match open.last_mut() {
                    Some(parent) => parent.closed.push((bracket.start, idx)),
                    None => spans.push((bracket.start, idx)),
                }
            }
            _ => idx += 1,
        }
    }

    for bracket in open {
        log::trace!("unterminated link at byte {}", bracket.start);
        spans.extend(bracket.closed);
    }
    spans
}

/// Split link content at the first pipe that is not inside a nested link or
/// template.
fn split_first_pipe(content: &str) -> (&str, Option<&str>) {
    let bytes = content.as_bytes();
    let mut brackets = 0usize;
    let mut braces = 0usize;
    let mut idx = 0;
    while idx < bytes.len() {
        let pair = bytes.get(idx + 1).map(|next| (bytes[idx], *next));
        match pair {
            Some((b'[', b'[')) => {
                brackets += 1;
                idx += 2;
                continue;
            }
            Some((b']', b']')) => {
                brackets = brackets.saturating_sub(1);
                idx += 2;
                continue;
            }
            Some((b'{', b'{')) => {
                braces += 1;
                idx += 2;
                continue;
            }
            Some((b'}', b'}')) => {
                braces = braces.saturating_sub(1);
                idx += 2;
                continue;
            }
            _ => {}
        }
        if bytes[idx] == b'|' && brackets == 0 && braces == 0 {
            return (&content[..idx], Some(&content[idx + 1..]));
        }
        idx += 1;
    }
    (content, None)
}

/// Classify one `[[...]]` span and file it under the right list.
fn classify(registry: &NamespaceRegistry, span: &str, out: &mut ExtractedLinks) {
    let content = &span[2..span.len() - 2];
    let (target, rest) = split_first_pipe(content);
    let escaped = target.trim_start().starts_with(':');

    let title = match Title::new(registry, target, None) {
        Ok(t) => t,
        Err(e) => {
            log::debug!("dropping link {:?}: {}", span, e);
            return;
        }
    };

    match title.namespace_id() {
        NS_FILE if !escaped => out.files.push(FileEmbed {
            target: title,
            props: rest.unwrap_or_default().to_string(),
            wikitext: span.to_string(),
        }),
        NS_CATEGORY if !escaped => out.categories.push(CategoryMembership {
            target: title,
            sort_key: rest.map(str::to_string),
            wikitext: span.to_string(),
        }),
        _ => {
            let display = match rest {
                Some(display) => display.to_string(),
                None => {
                    let trimmed = target.trim();
                    trimmed.strip_prefix(':').unwrap_or(trimmed).to_string()
                }
            };
            out.links.push(Link {
                target: title,
                display,
                wikitext: span.to_string(),
            });
        }
    }
}

/// Pull every top-level `[[...]]` out of `text`.
///
/// Targets that don't parse as titles (`[[{{PAGENAME}}]]`, `[[a|b]]` with
/// illegal characters, unterminated brackets) are left out.
pub fn extract_links(registry: &NamespaceRegistry, text: &str) -> ExtractedLinks {
    let mut out = ExtractedLinks::default();
    for (start, end) in outermost_pairs(text.as_bytes()) {
        classify(registry, &text[start..end], &mut out);
    }

    log::debug!(
        "extracted {} links, {} files, {} categories",
        out.links.len(),
        out.files.len(),
        out.categories.len()
    );
    out
}
