//! Template scanner.
//!
//! Walks the text once, keeping a stack of open `{{` templates and `{{{` parameters.
//! A template is captured when the stack empties again. Pipes only split
//! parameters when the captured template is the only thing open: a pipe inside a
//! nested template, a `{{{param|default}}}`, a `[[link|text]]`, an HTML comment or
//! a `<nowiki>` block belongs to that construct.
//!
//! Nested templates are found by scanning each captured template's interior again
//! in recursive mode.

use derive_builder::Builder;
use std::fmt;
use std::sync::Arc;

use crate::errors::{Result, WtError};
use crate::wikitext::types::templates::Template;

pub type NamePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type TemplatePredicate = Arc<dyn Fn(&Template) -> bool + Send + Sync>;

/// Options for [`extract_templates`].
///
/// ```ignore
/// let query = TemplateQueryBuilder::default()
///     .recursive(true)
///     .name_predicate(|name| name.eq_ignore_ascii_case("cite web"))
///     .build()?;
/// ```
#[derive(Clone, Default, Builder)]
#[builder(default)]
pub struct TemplateQuery {
    /// Also report templates nested inside other templates.
    pub recursive: bool,
    /// Keep only templates whose (trimmed) name passes.
    #[builder(setter(custom))]
    pub name_predicate: Option<NamePredicate>,
    /// Keep only templates that pass.
    #[builder(setter(custom))]
    pub template_predicate: Option<TemplatePredicate>,
    /// Stop scanning after this many top-level templates. Counted before the
    /// predicates are applied.
    #[builder(setter(strip_option))]
    pub count: Option<usize>,
}

impl TemplateQueryBuilder {
    pub fn name_predicate<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.name_predicate = Some(Some(Arc::new(predicate)));
        self
    }

    pub fn template_predicate<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Template) -> bool + Send + Sync + 'static,
    {
        self.template_predicate = Some(Some(Arc::new(predicate)));
        self
    }
}

impl fmt::Debug for TemplateQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateQuery")
            .field("recursive", &self.recursive)
            .field("name_predicate", &self.name_predicate.is_some())
            .field("template_predicate", &self.template_predicate.is_some())
            .field("count", &self.count)
            .finish()
    }
}

impl TemplateQuery {
    /// Everything, nested templates included.
    pub fn recursive() -> Self {
        TemplateQuery {
            recursive: true,
            ..Default::default()
        }
    }

    fn accepts(&self, template: &Template) -> bool {
        self.name_predicate
            .as_ref()
            .is_none_or(|pred| pred(&template.name))
            && self
                .template_predicate
                .as_ref()
                .is_none_or(|pred| pred(template))
    }
}

enum Frame {
    /// `{{` at `start`; offsets of the pipes that split its parameters.
    Template { start: usize, separators: Vec<usize> },
    /// `{{{`
    Param,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Comment,
    Nowiki,
}

/// Length of a `<nowiki ...>` opening tag at the start of `rest`. Self-closing
/// `<nowiki/>` doesn't open anything.
fn nowiki_open_len(rest: &str) -> Option<usize> {
    let head = rest.get(..7)?;
    if !head.eq_ignore_ascii_case("<nowiki") {
        return None;
    }
    let after = rest[7..].chars().next()?;
    if after != '>' && after != '/' && !after.is_whitespace() {
        return None;
    }
    let close = rest.find('>')?;
    if rest[7..close].trim_end().ends_with('/') {
        return None;
    }
    Some(close + 1)
}

/// Length of a `</nowiki>` closing tag at the start of `rest`, whitespace allowed
/// before the `>`.
fn nowiki_close_len(rest: &str) -> Option<usize> {
    let head = rest.get(..8)?;
    if !head.eq_ignore_ascii_case("</nowiki") {
        return None;
    }
    let tail = &rest[8..];
    let gap = tail.len() - tail.trim_start().len();
    tail[gap..].starts_with('>').then_some(8 + gap + 1)
}

/// An open `[[` inside a template. Pipes seen at the top template level while it
/// is open are held back until the matching `]]` shows they belong to the link.
struct OpenLink {
    depth: usize,
    pipes: Vec<usize>,
}

/// Drop links opened deeper than `depth`. Their held pipes were never closed
/// over, so they are returned as separators.
fn close_links_above(links: &mut Vec<OpenLink>, depth: usize, separators: &mut Vec<usize>) {
    while links.last().is_some_and(|l| l.depth > depth) {
        if let Some(link) = links.pop() {
            separators.extend(link.pipes);
        }
    }
}

/// Find top-level templates in `text`, in document order.
///
/// Unterminated templates are skipped. `limit` caps the number of captures.
fn scan_top_level(text: &str, limit: Option<usize>) -> Vec<Template> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut found = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut mode = Mode::Normal;
    let mut links: Vec<OpenLink> = Vec::new();
    let mut idx = 0;

    if limit == Some(0) {
        return found;
    }

    while idx < len {
        let rest = &bytes[idx..];
        match mode {
            Mode::Comment => {
                if rest.starts_with(b"-->") {
                    mode = Mode::Normal;
                    idx += 3;
                } else {
                    idx += 1;
                }
                continue;
            }
            Mode::Nowiki => {
                if bytes[idx] == b'<'
                    && let Some(close) = nowiki_close_len(&text[idx..])
                {
                    mode = Mode::Normal;
                    idx += close;
                } else {
                    idx += 1;
                }
                continue;
            }
            Mode::Normal => {}
        }

        if rest.starts_with(b"<!--") {
            mode = Mode::Comment;
            idx += 4;
            continue;
        }
        if bytes[idx] == b'<'
            && let Some(open) = nowiki_open_len(&text[idx..])
        {
            mode = Mode::Nowiki;
            idx += open;
            continue;
        }

        if rest.starts_with(b"{{{") && rest.get(3) != Some(&b'{') {
            stack.push(Frame::Param);
            idx += 3;
            continue;
        }
        if rest.starts_with(b"}}}") && matches!(stack.last(), Some(Frame::Param)) {
            stack.pop();
            close_links_above(&mut links, stack.len(), &mut Vec::new());
            idx += 3;
            continue;
        }
        if rest.starts_with(b"{{") {
            stack.push(Frame::Template {
                start: idx,
                separators: Vec::new(),
            });
            idx += 2;
            continue;
        }
        if rest.starts_with(b"}}") {
            idx += 2;
            if !matches!(stack.last(), Some(Frame::Template { .. })) {
                continue;
            }
            if let Some(Frame::Template {
                start,
                mut separators,
            }) = stack.pop()
            {
                close_links_above(&mut links, stack.len(), &mut separators);
                if !stack.is_empty() {
                    continue;
                }
                separators.sort_unstable();
                found.push(Template::from_span(
                    &text[start..idx],
                    &separators
                        .iter()
                        .map(|sep| sep - start)
                        .collect::<Vec<_>>(),
                ));
                if limit.is_some_and(|n| found.len() >= n) {
                    log::debug!("template scan stopped after {} captures", found.len());
                    return found;
                }
            }
            continue;
        }

        if stack.is_empty() {
            idx += 1;
            continue;
        }

        if rest.starts_with(b"[[") {
            links.push(OpenLink {
                depth: stack.len(),
                pipes: Vec::new(),
            });
            idx += 2;
            continue;
        }
        if rest.starts_with(b"]]") {
            if links.last().is_some_and(|l| l.depth == stack.len()) {
                links.pop();
            }
            idx += 2;
            continue;
        }
        if bytes[idx] == b'|' && stack.len() == 1 {
            match (links.last_mut(), stack.last_mut()) {
                (Some(link), _) => link.pipes.push(idx),
                (None, Some(Frame::Template { separators, .. })) => separators.push(idx),
                _ => {}
            }
        }
        idx += 1;
    }

    if let Some(Frame::Template { start, .. }) = stack.first() {
        log::debug!("unterminated template at byte {}", start);
    }
    found
}

/// Push `template` and, when recursing, everything nested inside it.
fn collect(template: Template, query: &TemplateQuery, out: &mut Vec<Template>) {
    let nested = if query.recursive {
        let inner = &template.wikitext[2..template.wikitext.len() - 2];
        scan_top_level(inner, None)
    } else {
        Vec::new()
    };
    if query.accepts(&template) {
        out.push(template);
    }
    for child in nested {
        collect(child, query, out);
    }
}

/// Extract template transclusions from `text`.
///
/// Output is in document order; in recursive mode an outer template comes before
/// the ones nested in it. Predicates only decide what is returned, recursion
/// still looks inside rejected templates.
pub fn extract_templates(text: &str, query: &TemplateQuery) -> Vec<Template> {
    let mut out = Vec::new();
    for template in scan_top_level(text, query.count) {
        collect(template, query, &mut out);
    }
    log::trace!("extracted {} templates ({:?})", out.len(), query);
    out
}

/// Parse `text` as exactly one template, surrounding whitespace allowed.
///
/// # Errors
/// - `ParseError` if the text doesn't start with `{{`, the template is never
///   closed, or something follows it.
pub fn parse_template(text: &str) -> Result<Template> {
    let lead = text.len() - text.trim_start().len();
    let body = text.trim();
    if !body.starts_with("{{") {
        return Err(WtError::parse("expected a template starting with '{{'"));
    }
    let Some(template) = scan_top_level(body, Some(1)).into_iter().next() else {
        return Err(WtError::parse_at("unterminated template", lead));
    };
    if template.wikitext.len() != body.len() {
        return Err(WtError::parse_at(
            "unexpected text after template",
            lead + template.wikitext.len(),
        ));
    }
    Ok(template)
}
