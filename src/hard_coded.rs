//! Some things are easier hard coded than fetched.
//!
//! The English Wikipedia namespace table, used when no siteinfo document is supplied
//! and as the fixture for tests. Anything talking to a different wiki should load that
//! wiki's siteinfo instead.

use crate::site_info::{CaseMode, NamespaceAlias, NamespaceInfo, SiteInfo};

/// `$wgLegalTitleChars` as reported by siteinfo on a stock install.
pub const DEFAULT_LEGAL_TITLE_CHARS: &str = r#" %!"$&'()*,\-.\/0-9:;=?@A-Z\\^_`a-z~\x80-\xFF+"#;

pub const NS_MEDIA: i32 = -2;
pub const NS_SPECIAL: i32 = -1;
pub const NS_MAIN: i32 = 0;
pub const NS_TALK: i32 = 1;
pub const NS_USER: i32 = 2;
pub const NS_USER_TALK: i32 = 3;
pub const NS_PROJECT: i32 = 4;
pub const NS_PROJECT_TALK: i32 = 5;
pub const NS_FILE: i32 = 6;
pub const NS_FILE_TALK: i32 = 7;
pub const NS_MEDIAWIKI: i32 = 8;
pub const NS_MEDIAWIKI_TALK: i32 = 9;
pub const NS_TEMPLATE: i32 = 10;
pub const NS_TEMPLATE_TALK: i32 = 11;
pub const NS_HELP: i32 = 12;
pub const NS_HELP_TALK: i32 = 13;
pub const NS_CATEGORY: i32 = 14;
pub const NS_CATEGORY_TALK: i32 = 15;

/// (id, localized name, canonical name, case mode)
const NAMESPACES: &[(i32, &str, Option<&str>, CaseMode)] = &[
    (NS_MEDIA, "Media", Some("Media"), CaseMode::FirstLetter),
    (NS_SPECIAL, "Special", Some("Special"), CaseMode::FirstLetter),
    (NS_MAIN, "", None, CaseMode::FirstLetter),
    (NS_TALK, "Talk", Some("Talk"), CaseMode::FirstLetter),
    (NS_USER, "User", Some("User"), CaseMode::FirstLetter),
    (NS_USER_TALK, "User talk", Some("User talk"), CaseMode::FirstLetter),
    (NS_PROJECT, "Wikipedia", Some("Project"), CaseMode::FirstLetter),
    (NS_PROJECT_TALK, "Wikipedia talk", Some("Project talk"), CaseMode::FirstLetter),
    (NS_FILE, "File", Some("File"), CaseMode::FirstLetter),
    (NS_FILE_TALK, "File talk", Some("File talk"), CaseMode::FirstLetter),
    (NS_MEDIAWIKI, "MediaWiki", Some("MediaWiki"), CaseMode::FirstLetter),
    (NS_MEDIAWIKI_TALK, "MediaWiki talk", Some("MediaWiki talk"), CaseMode::FirstLetter),
    (NS_TEMPLATE, "Template", Some("Template"), CaseMode::FirstLetter),
    (NS_TEMPLATE_TALK, "Template talk", Some("Template talk"), CaseMode::FirstLetter),
    (NS_HELP, "Help", Some("Help"), CaseMode::FirstLetter),
    (NS_HELP_TALK, "Help talk", Some("Help talk"), CaseMode::FirstLetter),
    (NS_CATEGORY, "Category", Some("Category"), CaseMode::FirstLetter),
    (NS_CATEGORY_TALK, "Category talk", Some("Category talk"), CaseMode::FirstLetter),
    (2300, "Gadget", Some("Gadget"), CaseMode::CaseSensitive),
    (2301, "Gadget talk", Some("Gadget talk"), CaseMode::CaseSensitive),
    (2302, "Gadget definition", Some("Gadget definition"), CaseMode::CaseSensitive),
    (2303, "Gadget definition talk", Some("Gadget definition talk"), CaseMode::CaseSensitive),
];

const ALIASES: &[(&str, i32)] = &[
    ("WP", NS_PROJECT),
    ("WT", NS_PROJECT_TALK),
    ("Image", NS_FILE),
    ("Image talk", NS_FILE_TALK),
];

impl SiteInfo {
    /// The English Wikipedia namespace layout.
    pub fn english_wikipedia() -> Self {
        SiteInfo {
            legal_title_chars: DEFAULT_LEGAL_TITLE_CHARS.to_string(),
            namespaces: NAMESPACES
                .iter()
                .map(|(id, name, canonical, case)| NamespaceInfo {
                    id: *id,
                    name: name.to_string(),
                    canonical: canonical.map(str::to_string),
                    case: *case,
                })
                .collect(),
            aliases: ALIASES
                .iter()
                .map(|(alias, id)| NamespaceAlias {
                    id: *id,
                    alias: alias.to_string(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_points_at_a_namespace() {
        let info = SiteInfo::english_wikipedia();
        for alias in &info.aliases {
            assert!(info.namespace(alias.id).is_some(), "{:?}", alias);
        }
    }

    #[test]
    fn talk_namespaces_follow_subjects() {
        let info = SiteInfo::english_wikipedia();
        for ns in info.namespaces.iter().filter(|ns| ns.id >= 0 && ns.id % 2 == 0) {
            assert!(info.namespace(ns.id + 1).is_some(), "no talk for {}", ns.id);
        }
    }
}
