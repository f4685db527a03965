//! Enums used by the wikitext module.
//!
//! - `QueryType` - strategies for matching template and parameter names.
//! - `EntityKind` - what sort of construct an extracted entity is.
//!
//! Both implement `Display` and `FromStr` so they can come from configuration or
//! the command line.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Strategy used when searching for templates, parameters, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Exact (case-insensitive) match.
    Exact,
    /// Prefix match (case-insensitive).
    StartsWith,
    /// Substring match (case-insensitive).
    Contains,
}

impl QueryType {
    /// Compare `candidate` against `query`, ignoring case and surrounding whitespace.
    pub fn matches(&self, candidate: &str, query: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        let query = query.trim().to_lowercase();
        match self {
            QueryType::Exact => candidate == query,
            QueryType::StartsWith => candidate.starts_with(&query),
            QueryType::Contains => candidate.contains(&query),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Exact => write!(f, "Exact"),
            QueryType::StartsWith => write!(f, "StartsWith"),
            QueryType::Contains => write!(f, "Contains"),
        }
    }
}

impl FromStr for QueryType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" | "eq" | "e" => Ok(QueryType::Exact),
            "startswith" | "start" | "prefix" | "s" => Ok(QueryType::StartsWith),
            "contains" | "contain" | "substr" | "c" => Ok(QueryType::Contains),
            other => Err(format!("unknown QueryType '{}'", other)),
        }
    }
}

/// The kind of an entity pulled out of wikitext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    /// `[[Target]]`, `[[Target|display]]`, or a colon-escaped file/category link.
    Link,
    /// `[[File:x.png|thumb|caption]]`
    FileEmbed,
    /// `[[Category:X|sort key]]`
    CategoryMembership,
    /// `{{name|...}}`
    Template,
    /// A heading and the text under it.
    Section,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Link => write!(f, "Link"),
            EntityKind::FileEmbed => write!(f, "FileEmbed"),
            EntityKind::CategoryMembership => write!(f, "CategoryMembership"),
            EntityKind::Template => write!(f, "Template"),
            EntityKind::Section => write!(f, "Section"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "link" | "links" => Ok(EntityKind::Link),
            "file" | "files" | "fileembed" => Ok(EntityKind::FileEmbed),
            "category" | "categories" | "categorymembership" => {
                Ok(EntityKind::CategoryMembership)
            }
            "template" | "templates" => Ok(EntityKind::Template),
            "section" | "sections" => Ok(EntityKind::Section),
            other => Err(format!("unknown EntityKind '{}'", other)),
        }
    }
}
