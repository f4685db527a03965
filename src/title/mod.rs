//! Page titles.
//!
//! A [`Title`] is the canonical, comparable form of a page name: namespace id,
//! db key (underscores, first letter cased per namespace) and an optional fragment.
//! Titles are only ever produced by parsing against a [`NamespaceRegistry`]; once
//! built they do not change, and derived titles (talk page, subject page) are new
//! values.
//!
//! ```ignore
//! let reg = NamespaceRegistry::english_wikipedia()?;
//! let t = Title::new(&reg, "user talk:example#Top", None)?;
//! assert_eq!(t.prefixed_db(), "User_talk:Example");
//! ```

pub mod case_map;
pub mod namespace;
mod parse;
mod sanitize;

use serde::{Serialize, Serializer};
use std::fmt;

use crate::hard_coded::NS_MAIN;
use case_map::uppercase_first;

pub use namespace::NamespaceRegistry;
pub use parse::{InvalidTitle, TITLE_MAX_BYTES, legacy_byte_length};
pub use sanitize::FILENAME_MAX_BYTES;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title {
    namespace: i32,
    /// Db key without namespace prefix.
    main: String,
    fragment: Option<String>,
    /// Localized namespace name, with spaces. Empty for main.
    namespace_name: String,
}

/// Odd, positive namespace ids are talk namespaces.
pub fn is_talk_namespace(id: i32) -> bool {
    id > 0 && id % 2 == 1
}

/// Whether pages in `id` expect `~~~~` signatures: talk namespaces plus whatever the
/// wiki lists as extra signature namespaces.
pub fn wants_signatures_namespace(id: i32, extra: &[i32]) -> bool {
    is_talk_namespace(id) || extra.contains(&id)
}

impl Title {
    /// Parse `text`, falling back to `default_namespace` (main if `None`) when the
    /// text has no namespace prefix.
    ///
    /// # Errors
    /// The rule that rejected the text. See [`InvalidTitle`].
    pub fn new(
        registry: &NamespaceRegistry,
        text: &str,
        default_namespace: Option<i32>,
    ) -> Result<Self, InvalidTitle> {
        let parsed = parse::parse(registry, text, default_namespace)?;
        Ok(Title {
            namespace_name: registry
                .namespace_name(parsed.namespace)
                .unwrap_or_default()
                .to_string(),
            namespace: parsed.namespace,
            main: parsed.main,
            fragment: parsed.fragment,
        })
    }

    /// Like [`Title::new`] but discards the reason.
    pub fn new_from_text(
        registry: &NamespaceRegistry,
        text: &str,
        default_namespace: Option<i32>,
    ) -> Option<Self> {
        match Self::new(registry, text, default_namespace) {
            Ok(t) => Some(t),
            Err(e) => {
                log::trace!("{:?} is not a title: {}", text, e);
                None
            }
        }
    }

    /// Build a title from a namespace id and the text that goes after the prefix.
    pub fn make_title(registry: &NamespaceRegistry, namespace: i32, text: &str) -> Option<Self> {
        let prefix = registry.namespace_prefix(namespace)?;
        Self::new_from_text(registry, &format!("{}{}", prefix, text), None)
    }

    pub fn namespace_id(&self) -> i32 {
        self.namespace
    }

    /// Db key, e.g. `Foo_bar`.
    pub fn main(&self) -> &str {
        &self.main
    }

    /// Display form of the db key, e.g. `Foo bar`.
    pub fn main_text(&self) -> String {
        self.main.replace('_', " ")
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn has_fragment(&self) -> bool {
        self.fragment.is_some()
    }

    /// `Namespace_name:Db_key`, or just the db key in main.
    pub fn prefixed_db(&self) -> String {
        if self.namespace == NS_MAIN {
            self.main.clone()
        } else {
            format!("{}:{}", self.namespace_name.replace(' ', "_"), self.main)
        }
    }

    pub fn prefixed_text(&self) -> String {
        self.prefixed_db().replace('_', " ")
    }

    /// How to write this title from a page in `namespace`.
    ///
    /// Same namespace: the main text. Main-namespace titles seen from elsewhere get
    /// a leading colon so they aren't read as being in the other namespace.
    pub fn relative_text(&self, namespace: i32) -> String {
        if self.namespace == namespace {
            self.main_text()
        } else if self.namespace == NS_MAIN {
            format!(":{}", self.prefixed_text())
        } else {
            self.prefixed_text()
        }
    }

    /// Prefixed db key plus `#fragment`. Parsing this yields an equal title.
    pub fn to_canonical_string(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{}#{}", self.prefixed_db(), fragment.replace(' ', "_")),
            None => self.prefixed_db(),
        }
    }

    /// Text after the last dot of the main text, if non-empty.
    pub fn extension(&self) -> Option<&str> {
        let dot = self.main.rfind('.')?;
        let ext = &self.main[dot + 1..];
        (!ext.is_empty()).then_some(ext)
    }

    /// `.ext`, or an empty string without an extension.
    pub fn dot_extension(&self) -> String {
        self.extension()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }

    pub fn file_name_without_extension(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.main[..self.main.len() - ext.len() - 1],
            None => &self.main,
        }
    }

    pub fn file_name_text_without_extension(&self) -> String {
        self.file_name_without_extension().replace('_', " ")
    }

    pub fn is_talk_page(&self) -> bool {
        is_talk_namespace(self.namespace)
    }

    /// Virtual namespaces (Special, Media) have no talk pages.
    pub fn can_have_talk_page(&self) -> bool {
        self.namespace >= 0
    }

    /// The talk page for this title, or this title itself (without fragment) if it
    /// already is one.
    ///
    /// # Returns
    /// `None` for virtual namespaces, when the wiki defines no matching talk
    /// namespace, or for a bare fragment link.
    pub fn talk_page(&self, registry: &NamespaceRegistry) -> Option<Title> {
        if !self.can_have_talk_page() {
            return None;
        }
        let target = if self.is_talk_page() {
            self.namespace
        } else {
            self.namespace + 1
        };
        self.moved_to(registry, target)
    }

    /// The subject page for a talk page, or this title itself (without fragment).
    pub fn subject_page(&self, registry: &NamespaceRegistry) -> Option<Title> {
        let target = if self.is_talk_page() {
            self.namespace - 1
        } else {
            self.namespace
        };
        self.moved_to(registry, target)
    }

    /// Same db key in another namespace, re-cased for that namespace.
    fn moved_to(&self, registry: &NamespaceRegistry, namespace: i32) -> Option<Title> {
        if self.main.is_empty() {
            return None;
        }
        let name = registry.namespace_name(namespace)?;
        let main = if registry.is_case_sensitive(namespace) {
            self.main.clone()
        } else {
            uppercase_first(&self.main)
        };
        Some(Title {
            namespace,
            main,
            fragment: None,
            namespace_name: name.to_string(),
        })
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefixed_text())
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hard_coded::{NS_CATEGORY, NS_FILE, NS_FILE_TALK, NS_SPECIAL, NS_TALK, NS_USER};

    fn reg() -> NamespaceRegistry {
        NamespaceRegistry::english_wikipedia().unwrap()
    }

    fn title(text: &str) -> Title {
        Title::new(&reg(), text, None).unwrap()
    }

    #[test]
    fn canonical_form_is_idempotent() {
        let reg = reg();
        for text in [
            "foo bar",
            "  user_talk : some__user#Top section",
            "Wikipedia:Village pump (technical)",
            "wp:AN#  spaced",
            "Gadget definition:lowercase",
            "Image:example.PNG",
            "ǆungla",
            "#fragment only",
            "Foo#",
            "Special:Block/Example",
            "Category:Living people",
        ] {
            let first = Title::new(&reg, text, None).unwrap();
            let again = Title::new(&reg, &first.to_canonical_string(), None).unwrap();
            assert_eq!(first, again, "{:?} -> {:?}", text, first.to_canonical_string());
        }
    }

    #[test]
    fn case_sensitive_namespaces_keep_first_letter() {
        let reg = reg();
        for id in [0, NS_TALK, NS_USER, NS_FILE, NS_CATEGORY, 2300, 2301, 2302, 2303] {
            let t = Title::make_title(&reg, id, "lowercasepage").unwrap();
            if reg.is_case_sensitive(id) {
                assert_eq!(t.main(), "lowercasepage", "namespace {}", id);
            } else {
                assert_eq!(t.main(), "Lowercasepage", "namespace {}", id);
            }
        }
    }

    #[test]
    fn talk_round_trip_rejection() {
        let reg = reg();
        assert!(Title::new_from_text(&reg, "Talk:File:Example.svg", None).is_none());
        let t = title("File talk:Example.svg");
        assert_eq!(t.namespace_id(), NS_FILE_TALK);
        assert_eq!(t.main(), "Example.svg");
    }

    #[test]
    fn directory_traversal_rejection() {
        let reg = reg();
        assert!(Title::new_from_text(&reg, "Foo/../Sandbox", None).is_none());
        assert!(Title::new_from_text(&reg, ".", None).is_none());
        assert!(Title::new_from_text(&reg, "Foo/...", None).is_some());
    }

    #[test]
    fn string_forms() {
        let t = title("wikipedia talk:village_pump#Section one");
        assert_eq!(t.prefixed_db(), "Wikipedia_talk:Village_pump");
        assert_eq!(t.prefixed_text(), "Wikipedia talk:Village pump");
        assert_eq!(t.main_text(), "Village pump");
        assert_eq!(t.fragment(), Some("Section one"));
        assert!(t.has_fragment());
        assert_eq!(t.to_canonical_string(), "Wikipedia_talk:Village_pump#Section_one");
        assert_eq!(t.to_string(), "Wikipedia talk:Village pump");
    }

    #[test]
    fn default_namespace_and_make_title() {
        let reg = reg();
        let t = Title::new(&reg, "Example", Some(NS_USER)).unwrap();
        assert_eq!(t.prefixed_db(), "User:Example");
        let t = Title::make_title(&reg, NS_CATEGORY, "foo").unwrap();
        assert_eq!(t.prefixed_db(), "Category:Foo");
        assert!(Title::make_title(&reg, 4242, "foo").is_none());
    }

    #[test]
    fn relative_text() {
        let main = title("Foo bar");
        let user = title("User:Foo");
        assert_eq!(main.relative_text(0), "Foo bar");
        assert_eq!(main.relative_text(NS_USER), ":Foo bar");
        assert_eq!(user.relative_text(NS_USER), "Foo");
        assert_eq!(user.relative_text(0), "User:Foo");
    }

    #[test]
    fn file_helpers() {
        let t = title("File:Some file.tar.gz");
        assert_eq!(t.extension(), Some("gz"));
        assert_eq!(t.dot_extension(), ".gz");
        assert_eq!(t.file_name_without_extension(), "Some_file.tar");
        assert_eq!(t.file_name_text_without_extension(), "Some file.tar");

        let t = title("File:Trailing.");
        assert_eq!(t.extension(), None);
        assert_eq!(t.dot_extension(), "");
        assert_eq!(t.file_name_without_extension(), "Trailing.");

        assert_eq!(title("Plain").extension(), None);
    }

    #[test]
    fn talk_and_subject_pages() {
        let reg = reg();
        let t = title("File:Example.svg#Licensing");
        let talk = t.talk_page(&reg).unwrap();
        assert_eq!(talk.prefixed_db(), "File_talk:Example.svg");
        assert!(talk.is_talk_page());
        assert!(!talk.has_fragment());
        assert_eq!(talk.talk_page(&reg).unwrap(), talk);
        assert_eq!(talk.subject_page(&reg).unwrap().prefixed_db(), "File:Example.svg");

        let main = title("Foo");
        assert_eq!(main.talk_page(&reg).unwrap().prefixed_db(), "Talk:Foo");
        assert_eq!(main.subject_page(&reg).unwrap(), main);

        let special = title("Special:Random");
        assert_eq!(special.namespace_id(), NS_SPECIAL);
        assert!(!special.can_have_talk_page());
        assert!(special.talk_page(&reg).is_none());

        let gadget = title("Gadget definition:foo");
        assert_eq!(gadget.talk_page(&reg).unwrap().main(), "foo");
    }

    #[test]
    fn talk_namespace_predicates() {
        assert!(is_talk_namespace(1));
        assert!(is_talk_namespace(2303));
        assert!(!is_talk_namespace(0));
        assert!(!is_talk_namespace(-1));
        assert!(wants_signatures_namespace(3, &[]));
        assert!(wants_signatures_namespace(4, &[4]));
        assert!(!wants_signatures_namespace(4, &[]));
    }

    #[test]
    fn serializes_as_canonical_string() {
        let t = title("Help:Contents#Editing");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"Help:Contents#Editing\"");
    }
}
