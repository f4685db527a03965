//! Title canonicalisation.
//!
//! Turns free text into `(namespace, db key, fragment)` or explains why it can't.
//! The rules are applied in a fixed order; changing the order changes which
//! inputs are accepted.

use lazy_regex::regex;
use std::error::Error;
use std::fmt;

use crate::hard_coded::{NS_MAIN, NS_SPECIAL, NS_TALK};
use crate::title::case_map::uppercase_first;
use crate::title::namespace::NamespaceRegistry;

/// Size of the `page_title` column.
pub const TITLE_MAX_BYTES: usize = 255;

/// Why a piece of text is not a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidTitle {
    /// Nothing left after trimming.
    Empty,
    /// The default namespace handed in is not defined on the wiki.
    UnknownNamespace(i32),
    /// U+FFFD usually means the text was mangled before it got here.
    ReplacementCharacter,
    /// `Talk:` followed by another namespace prefix, e.g. `Talk:File:X`.
    TalkNamespacePrefix { namespace: String },
    /// Characters outside the legal set, a `%XX` escape or an HTML entity.
    IllegalCharacters { found: String },
    /// `.`, `..`, `./x`, `x/../y` and friends.
    RelativePath,
    /// `~~~` expands to a signature on save.
    MagicTilde,
    TooLong { bytes: usize },
    /// A namespace prefix with nothing after it.
    NamespaceOnly { namespace: i32 },
    LeadingColon,
}

impl fmt::Display for InvalidTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidTitle::Empty => write!(f, "title is empty"),
            InvalidTitle::UnknownNamespace(id) => write!(f, "namespace {} is not defined", id),
            InvalidTitle::ReplacementCharacter => {
                write!(f, "title contains the Unicode replacement character")
            }
            InvalidTitle::TalkNamespacePrefix { namespace } => {
                write!(f, "talk page of a {:?} page must use its own talk namespace", namespace)
            }
            InvalidTitle::IllegalCharacters { found } => {
                write!(f, "title contains illegal characters: {:?}", found)
            }
            InvalidTitle::RelativePath => write!(f, "title looks like a relative path"),
            InvalidTitle::MagicTilde => write!(f, "title contains '~~~'"),
            InvalidTitle::TooLong { bytes } => {
                write!(f, "title is {} bytes, limit is {}", bytes, TITLE_MAX_BYTES)
            }
            InvalidTitle::NamespaceOnly { namespace } => {
                write!(f, "title is only a prefix for namespace {}", namespace)
            }
            InvalidTitle::LeadingColon => write!(f, "title starts with a colon"),
        }
    }
}

impl Error for InvalidTitle {}

/// The pieces of a successfully parsed title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedTitle {
    pub namespace: i32,
    /// Db key, first letter already cased.
    pub main: String,
    pub fragment: Option<String>,
}

/// Trim leading and trailing underscores.
pub(crate) fn trim_underscores(s: &str) -> &str {
    s.trim_matches('_')
}

/// Split `Prefix_:_rest` at the first colon. The prefix is non-empty.
pub(crate) fn split_prefix(s: &str) -> Option<(&str, &str)> {
    let caps = regex!(r"^(.+?)_*:_*(.*)$").captures(s)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Paths a browser or web server would resolve relative to the current one.
pub(crate) fn is_relative_path(title: &str) -> bool {
    title.contains('.')
        && (title == "."
            || title == ".."
            || title.starts_with("./")
            || title.starts_with("../")
            || title.contains("/./")
            || title.contains("/../")
            || title.ends_with("/.")
            || title.ends_with("/.."))
}

/// Byte size as counted by the old client-side check: code points are weighted by
/// the UTF-8 width of their range, and each half of a surrogate pair counts 2.
/// For a Rust `str` this is the same as `str::len`.
pub fn legacy_byte_length(s: &str) -> usize {
    s.chars()
        .map(|c| match c as u32 {
            0..=0x7F => 1,
            0x80..=0x7FF => 2,
            0x800..=0xFFFF => 3,
            _ => 4,
        })
        .sum()
}

/// Collapse whitespace, drop bidi marks, trim underscores.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    let stripped = regex!(r"[\x{200E}\x{200F}\x{202A}-\x{202E}]+").replace_all(text, "");
    let collapsed = regex!(
        r"[ _\x{A0}\x{1680}\x{180E}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}]+"
    )
    .replace_all(&stripped, "_");
    trim_underscores(&collapsed).to_string()
}

pub(crate) fn parse(
    registry: &NamespaceRegistry,
    text: &str,
    default_namespace: Option<i32>,
) -> Result<ParsedTitle, InvalidTitle> {
    let mut namespace = default_namespace.unwrap_or(NS_MAIN);
    if !registry.is_known_namespace(namespace) {
        return Err(InvalidTitle::UnknownNamespace(namespace));
    }

    let mut title = normalize_whitespace(text);

    if title.contains('\u{FFFD}') {
        return Err(InvalidTitle::ReplacementCharacter);
    }

    if let Some(rest) = title.strip_prefix(':') {
        namespace = NS_MAIN;
        title = trim_underscores(rest).to_string();
    }

    if title.is_empty() {
        return Err(InvalidTitle::Empty);
    }

    if let Some((prefix, rest)) = split_prefix(&title)
        && let Some(id) = registry.namespace_id(prefix)
    {
        if id == NS_TALK
            && let Some((inner, _)) = split_prefix(rest)
            && registry.namespace_id(inner).is_some()
        {
            return Err(InvalidTitle::TalkNamespacePrefix {
                namespace: inner.replace('_', " "),
            });
        }
        namespace = id;
        title = rest.to_string();
    }

    let mut fragment = None;
    if let Some(hash) = title.find('#') {
        fragment = Some(title[hash + 1..].replace('_', " "));
        title = trim_underscores(&title[..hash]).to_string();
    }

    if let Some(m) = registry.invalid_pattern().find(&title) {
        return Err(InvalidTitle::IllegalCharacters {
            found: m.as_str().to_string(),
        });
    }

    if is_relative_path(&title) {
        return Err(InvalidTitle::RelativePath);
    }

    if title.contains("~~~") {
        return Err(InvalidTitle::MagicTilde);
    }

    let bytes = legacy_byte_length(&title);
    if namespace != NS_SPECIAL && bytes > TITLE_MAX_BYTES {
        return Err(InvalidTitle::TooLong { bytes });
    }

    if title.is_empty() && namespace != NS_MAIN {
        return Err(InvalidTitle::NamespaceOnly { namespace });
    }

    if title.starts_with(':') {
        return Err(InvalidTitle::LeadingColon);
    }

    let main = if registry.is_case_sensitive(namespace) {
        title
    } else {
        uppercase_first(&title)
    };

    Ok(ParsedTitle {
        namespace,
        main,
        fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hard_coded::{NS_FILE, NS_FILE_TALK, NS_USER};

    fn reg() -> NamespaceRegistry {
        NamespaceRegistry::english_wikipedia().expect("registry")
    }

    fn ok(text: &str) -> ParsedTitle {
        parse(&reg(), text, None).unwrap_or_else(|e| panic!("{:?} should parse: {}", text, e))
    }

    fn err(text: &str) -> InvalidTitle {
        match parse(&reg(), text, None) {
            Ok(p) => panic!("{:?} should fail, got {:?}", text, p),
            Err(e) => e,
        }
    }

    #[test]
    fn whitespace_and_underscores_collapse() {
        let p = ok("  foo \u{00A0}_ bar\u{3000}");
        assert_eq!(p.namespace, 0);
        assert_eq!(p.main, "Foo_bar");
    }

    #[test]
    fn bidi_marks_are_removed() {
        assert_eq!(ok("Foo\u{200E}bar\u{202B}").main, "Foobar");
    }

    #[test]
    fn namespace_prefix_is_resolved() {
        let p = ok("user _: example");
        assert_eq!(p.namespace, NS_USER);
        assert_eq!(p.main, "Example");
        assert_eq!(ok("image:Foo.png").namespace, NS_FILE);
    }

    #[test]
    fn unknown_prefix_stays_in_title() {
        let p = ok("Foo: bar");
        assert_eq!(p.namespace, 0);
        assert_eq!(p.main, "Foo:_bar");
    }

    #[test]
    fn leading_colon_forces_main() {
        let p = parse(&reg(), ":Foo", Some(NS_USER)).unwrap();
        assert_eq!(p.namespace, 0);
        let p = parse(&reg(), "Foo", Some(NS_USER)).unwrap();
        assert_eq!(p.namespace, NS_USER);
        assert_eq!(err(":"), InvalidTitle::Empty);
        assert_eq!(ok(":Category:X").namespace, 14);
    }

    #[test]
    fn fragment_keeps_spaces_and_case() {
        let p = ok("Foo_bar#some_section_");
        assert_eq!(p.main, "Foo_bar");
        assert_eq!(p.fragment.as_deref(), Some("some section"));
        let p = ok("Foo# lead");
        assert_eq!(p.fragment.as_deref(), Some(" lead"));
        let p = ok("#only");
        assert_eq!(p.main, "");
        assert_eq!(p.fragment.as_deref(), Some("only"));
    }

    #[test]
    fn fragment_chars_are_not_validated() {
        let p = ok("Foo#[x]");
        assert_eq!(p.fragment.as_deref(), Some("[x]"));
    }

    #[test]
    fn talk_with_nested_namespace_is_rejected() {
        assert!(matches!(
            err("Talk:File:Example.svg"),
            InvalidTitle::TalkNamespacePrefix { .. }
        ));
        let p = ok("File talk:Example.svg");
        assert_eq!(p.namespace, NS_FILE_TALK);
        // an unknown inner prefix is just part of the title
        assert_eq!(ok("Talk:Foo:Bar").main, "Foo:Bar");
    }

    #[test]
    fn illegal_characters() {
        assert!(matches!(err("A[b]"), InvalidTitle::IllegalCharacters { .. }));
        assert!(matches!(err("A|b"), InvalidTitle::IllegalCharacters { .. }));
        assert!(matches!(err("100%25"), InvalidTitle::IllegalCharacters { .. }));
        assert!(matches!(err("A&amp;B"), InvalidTitle::IllegalCharacters { .. }));
        assert_eq!(ok("100%").main, "100%");
        assert_eq!(ok("A&B").main, "A&B");
        assert_eq!(err("a\u{FFFD}b"), InvalidTitle::ReplacementCharacter);
    }

    #[test]
    fn directory_traversal() {
        for bad in [".", "..", "./Sandbox", "../Sandbox", "Foo/./Sandbox", "Foo/../Sandbox", "Foo/.", "Foo/.."] {
            assert_eq!(err(bad), InvalidTitle::RelativePath, "{}", bad);
        }
        assert_eq!(ok("Foo/...").main, "Foo/...");
        assert_eq!(ok("Foo.").main, "Foo.");
        assert_eq!(ok(".Foo").main, ".Foo");
    }

    #[test]
    fn magic_tilde() {
        assert_eq!(err("Foo~~~bar"), InvalidTitle::MagicTilde);
        assert_eq!(ok("Foo~~bar").main, "Foo~~bar");
    }

    #[test]
    fn length_limit() {
        let max = "a".repeat(TITLE_MAX_BYTES);
        assert_eq!(ok(&max).main.len(), TITLE_MAX_BYTES);
        let over = "a".repeat(TITLE_MAX_BYTES + 1);
        assert_eq!(err(&over), InvalidTitle::TooLong { bytes: 256 });
        // 85 three-byte characters is exactly 255
        let cjk = "漢".repeat(85);
        assert!(parse(&reg(), &cjk, None).is_ok());
        assert!(parse(&reg(), &format!("{}a", cjk), None).is_err());
        // special pages may be longer
        assert!(parse(&reg(), &format!("Special:Block/{}", over), None).is_ok());
    }

    #[test]
    fn legacy_byte_length_matches_utf8() {
        for s in ["abc", "é", "漢字", "😀x", "a\u{7FF}\u{800}\u{FFFF}\u{10000}"] {
            assert_eq!(legacy_byte_length(s), s.len(), "{}", s);
        }
    }

    #[test]
    fn namespace_only_and_leading_colon() {
        assert_eq!(err("Talk:"), InvalidTitle::NamespaceOnly { namespace: 1 });
        assert_eq!(err("Talk:#frag"), InvalidTitle::NamespaceOnly { namespace: 1 });
        assert_eq!(err("Talk::Foo"), InvalidTitle::LeadingColon);
        assert_eq!(err("::Foo"), InvalidTitle::LeadingColon);
    }

    #[test]
    fn unknown_default_namespace() {
        assert_eq!(
            parse(&reg(), "Foo", Some(4242)),
            Err(InvalidTitle::UnknownNamespace(4242))
        );
    }

    #[test]
    fn first_letter_case() {
        assert_eq!(ok("foo").main, "Foo");
        assert_eq!(ok("ßar").main, "ßar");
        assert_eq!(ok("ǆungla").main, "ǅungla");
        assert_eq!(ok("Gadget definition:lowercase").main, "lowercase");
    }
}
