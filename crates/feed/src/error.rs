// ABOUTME: Error types for Atom feed decoding.
// ABOUTME: Provides FeedError with Parse, Invalid, and Charset variants.

use std::fmt;
use thiserror::Error;

/// Fatal errors that abort a parse. Per-entry problems never surface here.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The buffer is not well-formed XML (truncated, mismatched tags, bad attributes).
    #[error("failed to parse feed: {0}")]
    Parse(String),

    /// Well-formed XML that is not an Atom feed document.
    #[error("invalid feed: {0}")]
    Invalid(String),

    /// The declared character set could not be transcoded to UTF-8.
    #[error("unsupported charset {charset:?}: {reason}")]
    Charset { charset: String, reason: String },
}

impl FeedError {
    /// Creates a Parse error from an underlying XML error.
    pub fn parse(err: impl fmt::Display) -> Self {
        FeedError::Parse(err.to_string())
    }

    /// Creates an Invalid error with a custom message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        FeedError::Invalid(msg.into())
    }

    /// Creates a Charset error for the given declared label.
    pub fn charset(charset: impl Into<String>, reason: impl fmt::Display) -> Self {
        FeedError::Charset {
            charset: charset.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the input was not well-formed XML.
    pub fn is_parse(&self) -> bool {
        matches!(self, FeedError::Parse(_))
    }

    /// Returns true if the document had the wrong (or no) root element.
    pub fn is_invalid(&self) -> bool {
        matches!(self, FeedError::Invalid(_))
    }
}
