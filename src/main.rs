use std::{
    env, fs,
    io::{self, Read},
    path::PathBuf,
    str::FromStr,
};

use dotenv::dotenv;
use itertools::Itertools;
use serde::Serialize;

use wiki_parser::{
    NamespaceRegistry, Result, SiteInfo, Title, WtError,
    title::namespace,
    wikitext::{
        EntityKind, ExtractedLinks, QueryType, Section, Template, TemplateQueryBuilder, Wikitext,
    },
};

/// What gets printed. Views that were not asked for are left out.
#[derive(Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<&'a ExtractedLinks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    templates: Option<Vec<Template>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sections: Option<&'a [Section]>,
}

/// Siteinfo from `WIKI_SITEINFO`, or the built-in English Wikipedia table.
fn load_registry() -> Result<NamespaceRegistry> {
    match env::var("WIKI_SITEINFO") {
        Ok(path) => {
            log::info!("Loading siteinfo from {}", path);
            let raw = fs::read_to_string(&path)?;
            NamespaceRegistry::from_site_info(&SiteInfo::from_json(&raw)?)
        }
        Err(_) => {
            log::info!("WIKI_SITEINFO not set, using English Wikipedia namespaces");
            NamespaceRegistry::english_wikipedia()
        }
    }
}

/// First CLI argument as a path, stdin otherwise.
fn read_input() -> Result<String> {
    match env::args().nth(1) {
        Some(path) => Ok(fs::read_to_string(PathBuf::from(path))?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// `WIKI_ONLY=links,templates` restricts the report. Everything when unset.
fn wanted_kinds() -> Result<Vec<EntityKind>> {
    let Ok(raw) = env::var("WIKI_ONLY") else {
        return Ok(vec![
            EntityKind::Link,
            EntityKind::Template,
            EntityKind::Section,
        ]);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| EntityKind::from_str(s).map_err(WtError::precondition))
        .collect()
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn run() -> Result<()> {
    let registry = namespace::install(load_registry()?)?;
    let kinds = wanted_kinds()?;

    let mut builder = TemplateQueryBuilder::default();
    builder.recursive(env_flag("WIKI_RECURSIVE"));
    if let Ok(name) = env::var("WIKI_TEMPLATE") {
        let mode = match env::var("WIKI_MATCH") {
            Ok(m) => QueryType::from_str(&m).map_err(WtError::precondition)?,
            Err(_) => QueryType::Exact,
        };
        builder.name_predicate(move |candidate| mode.matches(candidate, &name));
    }
    let query = builder
        .build()
        .map_err(|e| WtError::precondition(e.to_string()))?;

    let page = Wikitext::new(registry, read_input()?);
    let links_wanted = kinds.iter().any(|k| {
        matches!(
            k,
            EntityKind::Link | EntityKind::FileEmbed | EntityKind::CategoryMembership
        )
    });

    let templates = kinds
        .contains(&EntityKind::Template)
        .then(|| page.find_templates(&query));
    if let Some(templates) = &templates {
        log::info!(
            "Templates used: {}",
            templates.iter().map(|t| t.name.as_str()).unique().join(", ")
        );
    }

    let report = Report {
        redirect: page.redirect_target(),
        links: links_wanted.then(|| page.links()),
        templates,
        sections: kinds
            .contains(&EntityKind::Section)
            .then(|| page.sections()),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() {
    dotenv().ok();
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}
