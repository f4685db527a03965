//! Building titles from what people type into forms.
//!
//! `Title::new` rejects anything questionable. The constructors here repair input
//! instead: brackets become parentheses, illegal characters become dashes, overlong
//! names are cut down. Only input that is still unusable after that yields `None`.

use lazy_regex::regex;

use crate::hard_coded::{NS_FILE, NS_MAIN, NS_MEDIA, NS_SPECIAL};
use crate::title::Title;
use crate::title::namespace::NamespaceRegistry;
use crate::title::parse::{TITLE_MAX_BYTES, is_relative_path, normalize_whitespace, split_prefix};

/// Longest file name the upload backend accepts, extension included.
pub const FILENAME_MAX_BYTES: usize = 240;

/// Cut `s` to at most `max` bytes without splitting a character.
fn trim_to_byte_length(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Rewrite everything `Title::new` would reject.
fn sanitize(registry: &NamespaceRegistry, title: &str, file_rule: bool) -> String {
    let mut out = title.replace("~~~", "");
    out = regex!(r"[\x00-\x1f\x7f]").replace_all(&out, "").into_owned();
    out = regex!(r"%([0-9A-Fa-f]{2})")
        .replace_all(&out, "% ${1}")
        .into_owned();
    out = regex!(r"&((?:[A-Za-z0-9\x{80}-\x{10FFFF}]+|#[0-9]+|#x[0-9A-Fa-f]+);)")
        .replace_all(&out, "& ${1}")
        .into_owned();
    if file_rule {
        out = regex!(r"[:/\\]").replace_all(&out, "-").into_owned();
    }
    out = regex!(r"[}\]>]").replace_all(&out, ")").into_owned();
    out = regex!(r"[{\[<]").replace_all(&out, "(").into_owned();
    out = registry
        .invalid_pattern()
        .replace_all(&out, "-")
        .into_owned();
    if is_relative_path(&out) {
        out.clear();
    }
    out
}

impl Title {
    /// Build a title from user input, repairing it where possible.
    ///
    /// # Arguments
    /// - `default_namespace`: used when the text has no namespace prefix (main if `None`).
    /// - `for_uploading`: apply file name rules to the File namespace too. The Media
    ///   namespace always gets them.
    ///
    /// # Returns
    /// `None` if nothing usable is left, or a file name lacks an extension.
    pub fn new_from_user_input(
        registry: &NamespaceRegistry,
        text: &str,
        default_namespace: Option<i32>,
        for_uploading: bool,
    ) -> Option<Title> {
        let mut namespace = default_namespace.unwrap_or(NS_MAIN);
        let mut title = normalize_whitespace(text);

        if let Some(rest) = title.strip_prefix(':') {
            namespace = NS_MAIN;
            title = rest.trim_matches('_').to_string();
        }

        if let Some((prefix, rest)) = split_prefix(&title)
            && let Some(id) = registry.namespace_id(prefix)
        {
            namespace = id;
            title = rest.to_string();
        }

        if namespace == NS_MEDIA || (for_uploading && namespace == NS_FILE) {
            title = sanitize(registry, &title, true);
            let dot = title.rfind('.')?;
            if dot + 1 >= title.len() {
                log::debug!("file name {:?} has no extension", title);
                return None;
            }
            let ext = title[dot + 1..].to_string();
            let base = title[..dot].trim_matches('_');
            let budget = FILENAME_MAX_BYTES.saturating_sub(ext.len() + 1);
            title = format!("{}.{}", trim_to_byte_length(base, budget), ext);
        } else {
            title = sanitize(registry, &title, false);
            if namespace != NS_SPECIAL {
                title = trim_to_byte_length(&title, TITLE_MAX_BYTES).to_string();
            }
        }

        Title::new_from_text(registry, title.trim_start_matches(':'), Some(namespace))
    }

    /// Title for an uploaded file called `name`.
    pub fn new_from_file_name(registry: &NamespaceRegistry, name: &str) -> Option<Title> {
        Self::new_from_user_input(registry, &format!("File:{}", name), None, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hard_coded::{NS_CATEGORY, NS_USER};

    fn reg() -> NamespaceRegistry {
        NamespaceRegistry::english_wikipedia().unwrap()
    }

    fn user_input(text: &str) -> Option<String> {
        Title::new_from_user_input(&reg(), text, None, true).map(|t| t.prefixed_db())
    }

    #[test]
    fn brackets_become_parentheses() {
        assert_eq!(user_input("Foo [bar] {baz} <qux>").as_deref(), Some("Foo_(bar)_(baz)_(qux)"));
    }

    #[test]
    fn escapes_are_broken_up() {
        assert_eq!(user_input("100%25 sure").as_deref(), Some("100%_25_sure"));
        assert_eq!(user_input("Tom &amp; Jerry").as_deref(), Some("Tom_&_amp;_Jerry"));
    }

    #[test]
    fn remaining_illegal_chars_become_dashes() {
        assert_eq!(user_input("a|b").as_deref(), Some("A-b"));
        assert_eq!(user_input("a#b").as_deref(), Some("A-b"));
    }

    #[test]
    fn tildes_and_control_chars_are_dropped() {
        assert_eq!(user_input("Sig~~~nature").as_deref(), Some("Signature"));
        assert_eq!(user_input("Bell\u{7}char").as_deref(), Some("Bellchar"));
    }

    #[test]
    fn relative_paths_vanish() {
        assert_eq!(user_input(".."), None);
        assert_eq!(user_input("Foo/../Bar"), None);
        assert_eq!(user_input("Foo/...").as_deref(), Some("Foo/..."));
    }

    #[test]
    fn namespace_and_colons() {
        let reg = reg();
        let t = Title::new_from_user_input(&reg, "category: x", Some(NS_USER), false).unwrap();
        assert_eq!(t.namespace_id(), NS_CATEGORY);
        let t = Title::new_from_user_input(&reg, ":Foo", Some(NS_USER), false).unwrap();
        assert_eq!(t.namespace_id(), 0);
        let t = Title::new_from_user_input(&reg, "Talk:::Foo", None, false).unwrap();
        assert_eq!(t.prefixed_db(), "Talk:Foo");
    }

    #[test]
    fn overlong_titles_are_cut() {
        let t = user_input(&"a".repeat(300)).unwrap();
        assert_eq!(t.len(), TITLE_MAX_BYTES);
        let t = user_input(&"é".repeat(200)).unwrap();
        assert_eq!(t.len(), 254);
    }

    #[test]
    fn file_names() {
        let reg = reg();
        let t = Title::new_from_file_name(&reg, "my/photo: v2.JPG").unwrap();
        assert_eq!(t.prefixed_db(), "File:My-photo-_v2.JPG");
        assert!(Title::new_from_file_name(&reg, "no extension").is_none());
        assert!(Title::new_from_file_name(&reg, "dangling.").is_none());

        let long = format!("{}.png", "x".repeat(400));
        let t = Title::new_from_file_name(&reg, &long).unwrap();
        assert_eq!(t.main().len(), FILENAME_MAX_BYTES);
        assert_eq!(t.extension(), Some("png"));
    }

    #[test]
    fn file_rule_only_when_uploading() {
        let reg = reg();
        let t = Title::new_from_user_input(&reg, "File:a/b.png", None, false).unwrap();
        assert_eq!(t.main(), "A/b.png");
        let t = Title::new_from_user_input(&reg, "Media:a/b.png", None, false).unwrap();
        assert_eq!(t.main(), "A-b.png");
    }
}
