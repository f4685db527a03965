//! Template data types.
//!
//! A `Template` is one `{{name|param|name=value|...}}` transclusion as it appears
//! in the source: the name is kept as written (trimmed, not resolved), and every
//! parameter keeps its trimmed value and the exact `|...` text it came from.
//!
//! Positional parameters are numbered the way the parser assigns them: the lowest
//! number not yet claimed, where `2=x` claims 2. So in `{{t|a|2=b|c}}`, `c` is 3.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, WtError};
use crate::hard_coded::NS_TEMPLATE;
use crate::title::{NamespaceRegistry, Title};
use crate::wikitext::Entity;
use crate::wikitext::enums::{EntityKind, QueryType};

/// Parameter key: `{{t|a}}` gives `Positional(1)`, `{{t|x=a}}` gives `Named("x")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ParameterName {
    Positional(u32),
    Named(String),
}

impl ParameterName {
    /// Numeric slot the parameter occupies, if any. `Named("2")` counts, `Named("02")`
    /// does not.
    pub fn position(&self) -> Option<u32> {
        match self {
            ParameterName::Positional(n) => Some(*n),
            ParameterName::Named(s) => s.parse::<u32>().ok().filter(|n| n.to_string() == *s),
        }
    }

    /// The key as MediaWiki sees it: `1` and `1=` are the same parameter.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterName::Positional(n) => write!(f, "{}", n),
            ParameterName::Named(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: ParameterName,
    /// Value with surrounding whitespace trimmed, nested markup left as is.
    pub value: String,
    /// Source text including the leading pipe, e.g. `|name = value`.
    pub wikitext: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Name as written, trimmed. May carry a namespace, a leading colon or a
    /// parser-function prefix.
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// The full `{{...}}` span from the source.
    pub wikitext: String,
}

impl FromStr for Template {
    type Err = WtError;

    fn from_str(s: &str) -> Result<Self> {
        crate::wikitext::parser::parse_template(s)
    }
}

impl Entity for Template {
    fn kind(&self) -> EntityKind {
        EntityKind::Template
    }
    fn wikitext(&self) -> &str {
        &self.wikitext
    }
}

/// Lowest position >= 1 missing from `claimed`.
fn lowest_free(claimed: &BTreeSet<u32>) -> u32 {
    let mut n = 1;
    while claimed.contains(&n) {
        n += 1;
    }
    n
}

/// Split one parameter chunk (text between pipes) into name and value.
///
/// A chunk is named when it has an `=` that is not preceded by `{{`; the name is
/// trimmed by the caller.
fn split_chunk(chunk: &str) -> (Option<&str>, &str) {
    match chunk.find('=') {
        Some(eq) if !chunk[..eq].contains("{{") => (Some(chunk[..eq].trim()), &chunk[eq + 1..]),
        _ => (None, chunk),
    }
}

impl Template {
    /// A template with no parameters.
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into().trim().to_string();
        Template {
            wikitext: format!("{{{{{}}}}}", name),
            name,
            parameters: Vec::new(),
        }
    }

    /// Build a template from its source span and the byte offsets of the pipes that
    /// separate its parameters.
    ///
    /// # Arguments
    /// - `wikitext`: the whole `{{...}}` span.
    /// - `separators`: offsets into `wikitext` of top-level pipes, ascending.
    pub(crate) fn from_span(wikitext: &str, separators: &[usize]) -> Self {
        let inner_end = wikitext.len() - 2;
        let mut bounds = Vec::with_capacity(separators.len() + 2);
        bounds.push(2);
        bounds.extend(separators.iter().copied());
        bounds.push(inner_end);

        let name = wikitext[2..bounds[1]].trim().to_string();
        let mut template = Template {
            name,
            parameters: Vec::with_capacity(separators.len()),
            wikitext: wikitext.to_string(),
        };

        let mut claimed = BTreeSet::new();
        for pair in bounds[1..].windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let chunk = &wikitext[start + 1..end];
            let (name, value) = split_chunk(chunk);
            let name = match name {
                Some(n) => ParameterName::Named(n.to_string()),
                None => ParameterName::Positional(lowest_free(&claimed)),
            };
            if let Some(pos) = name.position() {
                claimed.insert(pos);
            }
            template.parameters.push(Parameter {
                name,
                value: value.trim().to_string(),
                wikitext: wikitext[start..end].to_string(),
            });
        }
        template
    }

    /// Parameter with the given key. With duplicates, the last one wins, as it does
    /// when the page is rendered.
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let name = name.trim();
        self.parameters.iter().rev().find(|p| p.name.key() == name)
    }

    /// Value of the given parameter, trimmed.
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get_param(name).map(|p| p.value.trim())
    }

    /// Like [`Template::get_value`] but a missing parameter is an error.
    pub fn require_value(&self, name: &str) -> Result<&str> {
        self.get_value(name).ok_or_else(|| {
            WtError::not_found(format!(
                "Parameter '{}' not found in template '{}'",
                name, self.name
            ))
        })
    }

    /// Value of positional parameter `n` (1-based), trimmed.
    pub fn positional(&self, n: u32) -> Option<&str> {
        self.get_value(&n.to_string())
    }

    /// All parameters whose key matches `query`.
    pub fn params_matching(&self, query: &str, qtype: QueryType) -> Vec<&Parameter> {
        self.parameters
            .iter()
            .filter(|p| qtype.matches(&p.name.key(), query))
            .collect()
    }

    /// Append a parameter. `None` adds the next free positional one.
    ///
    /// Only `parameters` changes; `wikitext` still holds the source span. Use
    /// [`Template::to_wikitext`] for the updated markup.
    pub fn add_param(&mut self, name: Option<&str>, value: &str) {
        let (name, wikitext) = match name {
            Some(n) => (
                ParameterName::Named(n.trim().to_string()),
                format!("|{}={}", n.trim(), value),
            ),
            None => {
                let claimed: BTreeSet<u32> =
                    self.parameters.iter().filter_map(|p| p.name.position()).collect();
                (
                    ParameterName::Positional(lowest_free(&claimed)),
                    format!("|{}", value),
                )
            }
        };
        self.parameters.push(Parameter {
            name,
            value: value.trim().to_string(),
            wikitext,
        });
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into().trim().to_string();
    }

    /// Rebuild the markup from the name and the parameters' source text.
    pub fn to_wikitext(&self) -> String {
        let mut s = String::new();
        s.push_str("{{");
        s.push_str(&self.name);
        for param in &self.parameters {
            s.push_str(&param.wikitext);
        }
        s.push_str("}}");
        s
    }

    /// The page this template transcludes. Bare names live in the Template
    /// namespace, `:X` is the main-namespace page `X`. `None` for parser functions
    /// and names that aren't titles.
    pub fn target(&self, registry: &NamespaceRegistry) -> Option<Title> {
        Title::new_from_text(registry, &self.name, Some(NS_TEMPLATE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipes(s: &str) -> Vec<usize> {
        // good enough for tests without nesting
        s.match_indices('|').map(|(i, _)| i).collect()
    }

    fn template(s: &str) -> Template {
        Template::from_span(s, &pipes(s))
    }

    #[test]
    fn positional_numbering_skips_claimed() {
        let t = template("{{t|a|2=b|c}}");
        let names: Vec<String> = t.parameters.iter().map(|p| p.name.key()).collect();
        assert_eq!(names, vec!["1", "2", "3"]);
        assert_eq!(t.parameters[0].name, ParameterName::Positional(1));
        assert_eq!(t.parameters[1].name, ParameterName::Named("2".into()));
        assert_eq!(t.parameters[2].name, ParameterName::Positional(3));
        assert_eq!(t.parameters[2].value, "c");
    }

    #[test]
    fn claimed_later_is_not_retroactive() {
        let t = template("{{t|a|b|1=c}}");
        assert_eq!(t.parameters[0].name, ParameterName::Positional(1));
        assert_eq!(t.parameters[1].name, ParameterName::Positional(2));
        // 1= overrides the first positional when rendered
        assert_eq!(t.get_value("1"), Some("c"));
    }

    #[test]
    fn values_are_trimmed_and_source_is_not() {
        let t = template("{{Infobox | name = Foo \n| 02=x|  y  }}");
        assert_eq!(t.name, "Infobox");
        let p = t.get_param("name").unwrap();
        assert_eq!(p.value, "Foo");
        assert_eq!(p.wikitext, "| name = Foo \n");
        assert_eq!(t.get_value("name"), Some("Foo"));
        assert_eq!(t.parameters[1].name.position(), None);
        assert_eq!(t.positional(1), Some("y"));
        assert_eq!(t.parameters[2].value, "y");
        assert_eq!(t.parameters[2].wikitext, "|  y  ");
    }

    #[test]
    fn equals_after_braces_is_positional() {
        let s = "{{t|{{x}}=y}}";
        let t = Template::from_span(s, &[3]);
        assert_eq!(t.parameters[0].name, ParameterName::Positional(1));
        assert_eq!(t.parameters[0].value, "{{x}}=y");
    }

    #[test]
    fn from_str_parses_one_template() {
        let t: Template = "{{Stub|date=May}}".parse().unwrap();
        assert_eq!(t.get_value("date"), Some("May"));
        assert!("{{Stub".parse::<Template>().is_err());
    }

    #[test]
    fn no_parameters() {
        let t = template("{{ Foo bar }}");
        assert_eq!(t.name, "Foo bar");
        assert!(t.parameters.is_empty());
        assert_eq!(t.to_wikitext(), "{{Foo bar}}");
    }

    #[test]
    fn missing_parameter() {
        let t = template("{{t|a}}");
        assert!(t.get_param("x").is_none());
        let err = t.require_value("x").unwrap_err();
        assert_eq!(err.kind(), "NotFound");
        assert_eq!(t.require_value("1").unwrap(), "a");
    }

    #[test]
    fn editing() {
        let mut t = Template::new("cite web");
        t.add_param(Some("url"), "https://example.org");
        t.add_param(None, "first");
        t.add_param(Some("3"), "third");
        t.add_param(None, "second");
        t.set_name("Cite web");
        assert_eq!(t.positional(2), Some("second"));
        assert_eq!(
            t.to_wikitext(),
            "{{Cite web|url=https://example.org|first|3=third|second}}"
        );
        assert_eq!(t.wikitext, "{{cite web}}");
    }

    #[test]
    fn query_parameters() {
        let t = template("{{t|date=1|access-date=2|url=3}}");
        let found = t.params_matching("date", QueryType::Contains);
        assert_eq!(found.len(), 2);
        assert_eq!(t.params_matching("URL", QueryType::Exact)[0].value, "3");
    }

    #[test]
    fn target_resolution() {
        let reg = NamespaceRegistry::english_wikipedia().unwrap();
        let t = Template::new("citation needed");
        assert_eq!(t.target(&reg).unwrap().prefixed_db(), "Template:Citation_needed");
        let t = Template::new(":Main Page");
        assert_eq!(t.target(&reg).unwrap().prefixed_db(), "Main_Page");
        let t = Template::new("User:Foo/box");
        assert_eq!(t.target(&reg).unwrap().namespace_id(), 2);
        let t = Template::new("#if:{{{1|}}}");
        assert!(t.target(&reg).is_none());
    }
}
