//! `Wikitext` document wrapper.
//!
//! Holds the page text and lazily computed views of it:
//! - links, file embeds and categories
//! - top-level templates
//! - sections
//! - the redirect target, if the page is a redirect
//!
//! Each view is computed on first use and cached. Editing the text through
//! [`Wikitext::remove_entity`] drops the caches.

use std::sync::OnceLock;

use crate::errors::{Result, WtError};
use crate::title::{NamespaceRegistry, Title};
use crate::wikitext::Entity;
use crate::wikitext::parser::{TemplateQuery, extract_templates};
use crate::wikitext::types::links::{ExtractedLinks, extract_links};
use crate::wikitext::types::sections::{Section, extract_sections};
use crate::wikitext::types::templates::Template;

#[derive(Debug, Clone)]
pub struct Wikitext<'r> {
    registry: &'r NamespaceRegistry,
    text: String,
    links_cache: OnceLock<ExtractedLinks>,
    templates_cache: OnceLock<Vec<Template>>,
    sections_cache: OnceLock<Vec<Section>>,
    redirect_cache: OnceLock<Option<Title>>,
}

/// Target of a `#REDIRECT [[Target]]` on the first non-empty line. Only
/// whitespace and one optional `:` may sit between the keyword and the link.
fn parse_redirect(registry: &NamespaceRegistry, input: &str) -> Option<Title> {
    let line = input.lines().map(str::trim).find(|l| !l.is_empty())?;
    if !line.get(..9)?.eq_ignore_ascii_case("#redirect") {
        return None;
    }
    let rest = line[9..].trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim_start();
    let link = rest.strip_prefix("[[")?;
    let len = link.find("]]")?;
    let inner = &link[..len];
    let target = inner.split('|').next().unwrap_or_default();
    Title::new_from_text(registry, target, None)
}

impl<'r> Wikitext<'r> {
    /// Wrap `text`. Nothing is parsed until a view is requested.
    pub fn new<S: Into<String>>(registry: &'r NamespaceRegistry, text: S) -> Self {
        Wikitext {
            registry,
            text: text.into(),
            links_cache: OnceLock::new(),
            templates_cache: OnceLock::new(),
            sections_cache: OnceLock::new(),
            redirect_cache: OnceLock::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn registry(&self) -> &'r NamespaceRegistry {
        self.registry
    }

    pub fn links(&self) -> &ExtractedLinks {
        self.links_cache
            .get_or_init(|| extract_links(self.registry, &self.text))
    }

    /// Top-level templates.
    pub fn templates(&self) -> &[Template] {
        self.templates_cache
            .get_or_init(|| extract_templates(&self.text, &TemplateQuery::default()))
    }

    /// Templates matching `query`. Not cached.
    pub fn find_templates(&self, query: &TemplateQuery) -> Vec<Template> {
        extract_templates(&self.text, query)
    }

    pub fn sections(&self) -> &[Section] {
        self.sections_cache
            .get_or_init(|| extract_sections(&self.text))
    }

    pub fn redirect_target(&self) -> Option<&Title> {
        self.redirect_cache
            .get_or_init(|| parse_redirect(self.registry, &self.text))
            .as_ref()
    }

    /// Delete the first occurrence of `entity`'s source text.
    ///
    /// # Errors
    /// - `NotFound` if the text no longer contains it, e.g. because it was removed
    ///   already.
    pub fn remove_entity<E: Entity + ?Sized>(&mut self, entity: &E) -> Result<()> {
        let span = entity.wikitext();
        let start = self.text.find(span).ok_or_else(|| {
            WtError::not_found(format!("{} {:?} is not in the text", entity.kind(), span))
        })?;
        self.text.replace_range(start..start + span.len(), "");
        self.reset_caches();
        log::debug!("removed {} at byte {}", entity.kind(), start);
        Ok(())
    }

    fn reset_caches(&mut self) {
        self.links_cache = OnceLock::new();
        self.templates_cache = OnceLock::new();
        self.sections_cache = OnceLock::new();
        self.redirect_cache = OnceLock::new();
    }
}
