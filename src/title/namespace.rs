//! Namespace registry: the per-wiki configuration every title is parsed against.
//!
//! A registry is built once from a [`SiteInfo`] and is read-only afterwards, so it can
//! be shared between threads freely. Callers that want a process-wide instance can
//! [`install`] one and fetch it with [`global`]; everything in this crate takes an
//! explicit `&NamespaceRegistry`, so several wikis can be handled side by side.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::errors::{Result, WtError};
use crate::hard_coded::NS_MAIN;
use crate::site_info::{CaseMode, SiteInfo};

#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    id_to_name: HashMap<i32, String>,
    name_to_id: HashMap<String, i32>,
    legal_title_chars: String,
    invalid: Regex,
    case_sensitive: HashSet<i32>,
}

/// Lookup key for namespace names: lowercase, spaces as underscores.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Turn a PHP-flavoured class body into one the `regex` crate accepts.
///
/// The server matches bytes, so `\x80-\xFF` there means "any non-ASCII".
fn widen_class(legal: &str) -> String {
    legal
        .replace(r"\x80-\xFF", r"\x{80}-\x{10FFFF}")
        .replace(r"\x80-\xff", r"\x{80}-\x{10FFFF}")
        .replace(r"\/", "/")
}

fn compile_invalid(legal: &str) -> Result<Regex> {
    if legal.trim().is_empty() {
        return Err(WtError::precondition("legal title chars are empty"));
    }
    let pattern = format!(
        r"[^{}]|%[0-9A-Fa-f]{{2}}|&[0-9A-Za-z\x{{80}}-\x{{10FFFF}}]+;",
        widen_class(legal)
    );
    Regex::new(&pattern).map_err(|e| {
        WtError::precondition(format!(
            "legal title chars {:?} do not form a character class: {}",
            legal, e
        ))
    })
}

impl NamespaceRegistry {
    /// Build a registry from site metadata.
    ///
    /// # Errors
    /// - `Precondition` if the legal-chars class does not compile, the main
    ///   namespace is missing, or an alias names an undefined namespace.
    pub fn from_site_info(info: &SiteInfo) -> Result<Self> {
        let invalid = compile_invalid(&info.legal_title_chars)?;

        let mut id_to_name = HashMap::new();
        let mut name_to_id = HashMap::new();
        let mut case_sensitive = HashSet::new();

        for ns in &info.namespaces {
            id_to_name.insert(ns.id, ns.name.clone());
            if !ns.name.is_empty() {
                name_to_id.insert(normalize_name(&ns.name), ns.id);
            }
            if let Some(canonical) = ns.canonical.as_deref().filter(|c| !c.is_empty()) {
                name_to_id.insert(normalize_name(canonical), ns.id);
            }
            if ns.case == CaseMode::CaseSensitive {
                case_sensitive.insert(ns.id);
            }
        }

        if !id_to_name.contains_key(&NS_MAIN) {
            return Err(WtError::precondition("siteinfo has no main namespace"));
        }

        for alias in &info.aliases {
            if !id_to_name.contains_key(&alias.id) {
                return Err(WtError::precondition(format!(
                    "alias {:?} refers to unknown namespace {}",
                    alias.alias, alias.id
                )));
            }
            name_to_id.insert(normalize_name(&alias.alias), alias.id);
        }

        log::debug!(
            "namespace registry: {} namespaces, {} names, {} case-sensitive",
            id_to_name.len(),
            name_to_id.len(),
            case_sensitive.len()
        );

        Ok(NamespaceRegistry {
            id_to_name,
            name_to_id,
            legal_title_chars: info.legal_title_chars.clone(),
            invalid,
            case_sensitive,
        })
    }

    /// Registry for the built-in English Wikipedia table.
    pub fn english_wikipedia() -> Result<Self> {
        Self::from_site_info(&SiteInfo::english_wikipedia())
    }

    /// Resolve a namespace name, alias or canonical name (case-insensitive,
    /// spaces and underscores interchangeable).
    pub fn namespace_id(&self, name: &str) -> Option<i32> {
        self.name_to_id.get(&normalize_name(name)).copied()
    }

    /// Localized name of a namespace (empty for main).
    pub fn namespace_name(&self, id: i32) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// `Name_with_underscores:` for the namespace, empty for main.
    pub fn namespace_prefix(&self, id: i32) -> Option<String> {
        let name = self.namespace_name(id)?;
        if id == NS_MAIN {
            Some(String::new())
        } else {
            Some(format!("{}:", name.replace(' ', "_")))
        }
    }

    pub fn is_known_namespace(&self, id: i32) -> bool {
        self.id_to_name.contains_key(&id)
    }

    pub fn is_case_sensitive(&self, id: i32) -> bool {
        self.case_sensitive.contains(&id)
    }

    pub fn legal_title_chars(&self) -> &str {
        &self.legal_title_chars
    }

    /// Matches the first illegal character, `%XX` escape or HTML entity.
    pub(crate) fn invalid_pattern(&self) -> &Regex {
        &self.invalid
    }
}

static GLOBAL: OnceLock<NamespaceRegistry> = OnceLock::new();

fn install_into(
    cell: &OnceLock<NamespaceRegistry>,
    registry: NamespaceRegistry,
) -> Result<&NamespaceRegistry> {
    cell.set(registry)
        .map_err(|_| WtError::precondition("namespace registry installed twice"))?;
    log::info!("namespace registry installed");
    get_from(cell)
}

fn get_from(cell: &OnceLock<NamespaceRegistry>) -> Result<&NamespaceRegistry> {
    cell.get()
        .ok_or_else(|| WtError::precondition("namespace registry used before it was installed"))
}

/// Install the process-wide registry. Can only happen once.
pub fn install(registry: NamespaceRegistry) -> Result<&'static NamespaceRegistry> {
    install_into(&GLOBAL, registry)
}

/// The process-wide registry.
///
/// # Errors
/// - `Precondition` if [`install`] has not been called yet. This is a setup bug.
pub fn global() -> Result<&'static NamespaceRegistry> {
    get_from(&GLOBAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hard_coded::{NS_FILE, NS_PROJECT, NS_USER_TALK};

    #[test]
    fn lookup_is_case_and_underscore_insensitive() {
        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        assert_eq!(reg.namespace_id("user talk"), Some(NS_USER_TALK));
        assert_eq!(reg.namespace_id("USER_TALK"), Some(NS_USER_TALK));
        assert_eq!(reg.namespace_id("Image"), Some(NS_FILE));
        assert_eq!(reg.namespace_id("project"), Some(NS_PROJECT));
        assert_eq!(reg.namespace_id("wp"), Some(NS_PROJECT));
        assert_eq!(reg.namespace_id("Nonsense"), None);
    }

    #[test]
    fn prefixes() {
        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        assert_eq!(reg.namespace_prefix(0).as_deref(), Some(""));
        assert_eq!(reg.namespace_prefix(5).as_deref(), Some("Wikipedia_talk:"));
        assert_eq!(reg.namespace_prefix(999), None);
    }

    #[test]
    fn case_sensitivity_comes_from_site_info() {
        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        assert!(reg.is_case_sensitive(2302));
        assert!(!reg.is_case_sensitive(0));
    }

    #[test]
    fn invalid_pattern_flags_illegal_chars() {
        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        let re = reg.invalid_pattern();
        assert!(re.is_match("a[b"));
        assert!(re.is_match("a%41b"));
        assert!(re.is_match("a&amp;b"));
        assert!(!re.is_match("Ünïcödé/page_(x)"));
        assert!(!re.is_match("emoji_😀"));
    }

    #[test]
    fn broken_char_class_is_a_precondition_error() {
        let mut info = SiteInfo::english_wikipedia();
        info.legal_title_chars = "a-".to_string() + "\\";
        let err = NamespaceRegistry::from_site_info(&info).expect_err("must fail");
        assert!(err.is_fatal());

        info.legal_title_chars = String::new();
        let err = NamespaceRegistry::from_site_info(&info).expect_err("must fail");
        assert!(err.is_fatal());
    }

    #[test]
    fn alias_to_unknown_namespace_is_rejected() {
        let mut info = SiteInfo::english_wikipedia();
        info.aliases.push(crate::site_info::NamespaceAlias {
            id: 4242,
            alias: "Ghost".to_string(),
        });
        let err = NamespaceRegistry::from_site_info(&info).expect_err("must fail");
        assert_eq!(err.kind(), "Precondition");
    }

    #[test]
    fn use_before_install_is_fatal() {
        let cell = OnceLock::new();
        let err = get_from(&cell).expect_err("nothing installed");
        assert!(err.is_fatal());
        assert_eq!(err.kind(), "Precondition");

        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        install_into(&cell, reg.clone()).expect("first install");
        assert!(get_from(&cell).is_ok());
        assert!(install_into(&cell, reg).expect_err("second install").is_fatal());
    }

    #[test]
    fn global_installs_once() {
        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        let installed = install(reg.clone()).expect("first install");
        assert_eq!(installed.namespace_id("talk"), Some(1));
        assert!(global().is_ok());
        let err = install(reg).expect_err("second install");
        assert!(err.is_fatal());
    }
}
