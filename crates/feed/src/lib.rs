// ABOUTME: Atom feed normalization library.
// ABOUTME: Decodes Atom XML and produces a deduplicated Feed suitable for incremental polling.

pub mod charset;
pub mod decoder;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod models;
pub mod options;
pub mod parser;
pub mod time_parse;

pub use charset::{CharsetAdapter, EncodingRsAdapter, Utf8OnlyAdapter};
pub use decoder::decode_document;
pub use diagnostics::{
    CollectingSink, DiagnosticSink, NoopSink, SkipReason, SkippedEntry, TracingSink,
};
pub use document::{Document, Entry, RawAuthor, RawImage, RawLink};
pub use error::FeedError;
pub use models::{Author, Enclosure, Feed, Image, Item, Link};
pub use options::{DateParser, ParserBuilder, ParserOptions, DEFAULT_REFRESH_INTERVAL};
pub use parser::{parse_atom, AtomParser};
pub use time_parse::parse_flexible_time;
