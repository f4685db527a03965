//! Wikitext module root
//!
//! Declares the submodules of the structural parser and re-exports the items
//! callers use most, so `use crate::wikitext::...` is enough.

pub mod enums;
pub mod parser;
pub mod wiki_text;

pub mod types {
    pub mod links;
    pub mod sections;
    pub mod templates;
}

pub use enums::{EntityKind, QueryType};
pub use parser::{TemplateQuery, TemplateQueryBuilder, extract_templates, parse_template};
pub use types::links::{CategoryMembership, ExtractedLinks, FileEmbed, Link, extract_links};
pub use types::sections::{Section, extract_sections};
pub use types::templates::{Parameter, ParameterName, Template};
pub use wiki_text::Wikitext;

/// Something extracted from wikitext that remembers its exact source text.
pub trait Entity {
    fn kind(&self) -> EntityKind;
    /// The source span, verbatim.
    fn wikitext(&self) -> &str;
}
