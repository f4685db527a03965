//! Error types shared by the title and wikitext modules.
//!
//! Two kinds of failure exist and they are kept apart:
//! - malformed input (`InvalidTitle`, `ParseError`, `NotFound`) is an ordinary
//!   outcome of reading wiki content and can be inspected or ignored;
//! - `Precondition` means the library was driven incorrectly (no namespace
//!   registry installed, an unusable legal-title-chars class, ...). It must be
//!   surfaced to whoever configured the library and never retried.
//!
//! Exported items:
//! - `WtError` - main error enum.
//! - `Result<T>` - alias for `std::result::Result<T, WtError>`.

use std::error::Error;
use std::fmt;

use crate::title::InvalidTitle;

/// The canonical result type used across the crate.
pub type Result<T> = std::result::Result<T, WtError>;

/// Crate error with rich variants.
///
/// - `InvalidTitle` - text could not be canonicalised into a title. Carries the
///    rule that rejected it.
/// - `Precondition` - the caller broke a setup contract. Fatal.
/// - `ParseError` - a piece of wikitext was not the construct it was expected to
///    be. Includes the byte offset when known.
/// - `NotFound` - requested item was not present (parameter, entity span).
/// - `Io` - wrapper for I/O errors raised while loading configuration or input.
/// - `Json` - siteinfo could not be decoded, or output could not be encoded.
#[derive(Debug)]
pub enum WtError {
    InvalidTitle(InvalidTitle),
    Precondition {
        msg: String,
    },
    ParseError {
        msg: String,
        /// Byte offset in the source where the problem was detected, if known.
        offset: Option<usize>,
    },
    NotFound {
        msg: String,
    },
    Io {
        msg: String,
        source: std::io::Error,
    },
    Json {
        msg: String,
        source: serde_json::Error,
    },
}

impl WtError {
    /// Construct a parse error with a message.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        WtError::ParseError {
            msg: msg.into(),
            offset: None,
        }
    }

    /// Construct a parse error with a message and offset.
    pub fn parse_at<S: Into<String>>(msg: S, offset: usize) -> Self {
        WtError::ParseError {
            msg: msg.into(),
            offset: Some(offset),
        }
    }

    /// Construct a not-found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        WtError::NotFound { msg: msg.into() }
    }

    /// Construct a precondition violation.
    pub fn precondition<S: Into<String>>(msg: S) -> Self {
        WtError::Precondition { msg: msg.into() }
    }

    /// Returns a short, user-friendly description of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            WtError::InvalidTitle(_) => "InvalidTitle",
            WtError::Precondition { .. } => "Precondition",
            WtError::ParseError { .. } => "ParseError",
            WtError::NotFound { .. } => "NotFound",
            WtError::Io { .. } => "Io",
            WtError::Json { .. } => "Json",
        }
    }

    /// True for errors that indicate a caller bug rather than bad content.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WtError::Precondition { .. })
    }
}

impl fmt::Display for WtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WtError::InvalidTitle(reason) => write!(f, "Invalid title: {}", reason),
            WtError::Precondition { msg } => write!(f, "Precondition violated: {}", msg),
            WtError::ParseError { msg, offset } => {
                if let Some(off) = offset {
                    write!(f, "Parse error at {}: {}", off, msg)
                } else {
                    write!(f, "Parse error: {}", msg)
                }
            }
            WtError::NotFound { msg } => write!(f, "Not found: {}", msg),
            WtError::Io { msg, source } => write!(f, "IO error: {} (cause: {})", msg, source),
            WtError::Json { msg, source } => write!(f, "{} (cause: {})", msg, source),
        }
    }
}

impl Error for WtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WtError::InvalidTitle(reason) => Some(reason),
            WtError::Io { source, .. } => Some(source),
            WtError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<InvalidTitle> for WtError {
    fn from(e: InvalidTitle) -> Self {
        WtError::InvalidTitle(e)
    }
}

impl From<std::io::Error> for WtError {
    fn from(e: std::io::Error) -> Self {
        WtError::Io {
            msg: "I/O error".to_string(),
            source: e,
        }
    }
}

impl From<serde_json::Error> for WtError {
    fn from(e: serde_json::Error) -> Self {
        WtError::Json {
            msg: "JSON (de)serialization failed".to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_error_with_offset() {
        let e = WtError::parse_at("unterminated template", 123);
        let s = format!("{}", e);
        assert!(s.contains("123"));
        assert!(s.contains("unterminated template"));
    }

    #[test]
    fn precondition_is_fatal() {
        let e = WtError::precondition("namespace registry not installed");
        assert!(e.is_fatal());
        assert_eq!(e.kind(), "Precondition");
        assert!(!WtError::not_found("x").is_fatal());
    }

    #[test]
    fn invalid_title_keeps_reason_as_source() {
        let e: WtError = InvalidTitle::MagicTilde.into();
        assert_eq!(e.kind(), "InvalidTitle");
        assert!(e.source().is_some());
        assert!(!e.is_fatal());
    }

    #[test]
    fn io_conversion_has_source() {
        let io_err = std::io::Error::other("oh no");
        let e: WtError = io_err.into();
        let s = format!("{}", e);
        assert!(s.contains("I/O error"));
        assert!(s.contains("oh no"));
    }
}
