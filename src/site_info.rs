//! Site metadata consumed by the namespace registry.
//!
//! The shapes here mirror `action=query&meta=siteinfo&siprop=general|namespaces|namespacealiases`.
//! Both `formatversion=1` (`"*"` keys) and `formatversion=2` responses decode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::Result;

/// How the first letter of titles in a namespace is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum CaseMode {
    /// First letter is uppercased when canonicalising.
    #[default]
    #[serde(rename = "first-letter")]
    FirstLetter,
    /// Titles are stored exactly as written.
    #[serde(rename = "case-sensitive")]
    CaseSensitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamespaceInfo {
    pub id: i32,
    /// Localized name, empty for the main namespace.
    #[serde(alias = "*")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default)]
    pub case: CaseMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamespaceAlias {
    pub id: i32,
    #[serde(alias = "*")]
    pub alias: String,
}

/// The record the namespace registry is built from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    /// Character class body (no surrounding brackets), PHP regex flavour.
    pub legal_title_chars: String,
    pub namespaces: Vec<NamespaceInfo>,
    #[serde(default)]
    pub aliases: Vec<NamespaceAlias>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: ApiQuery,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    general: ApiGeneral,
    namespaces: HashMap<String, NamespaceInfo>,
    #[serde(default)]
    namespacealiases: Vec<NamespaceAlias>,
}

#[derive(Debug, Deserialize)]
struct ApiGeneral {
    legaltitlechars: String,
}

impl SiteInfo {
    /// Decode either a raw siteinfo API response or a serialized `SiteInfo`.
    pub fn from_json(raw: &str) -> Result<Self> {
        match serde_json::from_str::<ApiResponse>(raw) {
            Ok(resp) => Ok(Self::from(resp)),
            Err(api_err) => {
                log::debug!("not a siteinfo API response ({}), trying plain SiteInfo", api_err);
                Ok(serde_json::from_str::<SiteInfo>(raw)?)
            }
        }
    }

    /// Look up a namespace definition by id.
    pub fn namespace(&self, id: i32) -> Option<&NamespaceInfo> {
        self.namespaces.iter().find(|ns| ns.id == id)
    }
}

impl From<ApiResponse> for SiteInfo {
    fn from(value: ApiResponse) -> Self {
        let mut namespaces: Vec<NamespaceInfo> = value.query.namespaces.into_values().collect();
        namespaces.sort_by_key(|ns| ns.id);
        SiteInfo {
            legal_title_chars: value.query.general.legaltitlechars,
            namespaces,
            aliases: value.query.namespacealiases,
        }
    }
}
