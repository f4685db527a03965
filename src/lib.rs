//! Title canonicalisation and structural wikitext parsing for MediaWiki sites.
//!
//! - [`title`]: turn page names into canonical [`Title`]s against a
//!   [`NamespaceRegistry`] built from the wiki's siteinfo.
//! - [`wikitext`]: pull links, file embeds, categories, templates and sections out
//!   of page text.
//!
//! ```ignore
//! let registry = NamespaceRegistry::english_wikipedia()?;
//! let page = Wikitext::new(&registry, "{{Stub}} See [[Help:Contents|help]].");
//! assert_eq!(page.templates()[0].name, "Stub");
//! assert_eq!(page.links().links[0].target.prefixed_db(), "Help:Contents");
//! ```

pub mod errors;
pub mod hard_coded;
pub mod site_info;
pub mod title;
pub mod wikitext;

pub use errors::{Result, WtError};
pub use site_info::SiteInfo;
pub use title::{InvalidTitle, NamespaceRegistry, Title};
pub use wikitext::Wikitext;
