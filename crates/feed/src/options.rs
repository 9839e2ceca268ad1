// ABOUTME: Configuration for AtomParser: refresh interval, charset adapter, diagnostics, date parser.
// ABOUTME: ParserBuilder provides a fluent API for constructing parsers with custom settings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::charset::{CharsetAdapter, EncodingRsAdapter};
use crate::diagnostics::{DiagnosticSink, NoopSink};
use crate::parser::AtomParser;
use crate::time_parse::parse_flexible_time;

/// Signature of the timestamp parser used for entry dates.
pub type DateParser = fn(&str) -> Option<DateTime<Utc>>;

/// Suggested delay before a caller polls the same feed again.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Configuration options for the Atom parser.
#[derive(Clone)]
pub struct ParserOptions {
    pub refresh_interval: Duration,
    pub charset_adapter: Arc<dyn CharsetAdapter>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
    pub date_parser: DateParser,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            charset_adapter: Arc::new(EncodingRsAdapter),
            diagnostics: Arc::new(NoopSink),
            date_parser: parse_flexible_time,
        }
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("refresh_interval", &self.refresh_interval)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing AtomParser instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    opts: ParserOptions,
}

impl ParserBuilder {
    /// Create a new ParserBuilder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how far past "now" the feed's refresh hint lands.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.opts.refresh_interval = interval;
        self
    }

    /// Use a custom charset adapter for non-UTF-8 documents.
    pub fn charset_adapter(mut self, adapter: impl CharsetAdapter + 'static) -> Self {
        self.opts.charset_adapter = Arc::new(adapter);
        self
    }

    /// Route per-entry warnings to `sink`.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.opts.diagnostics = sink;
        self
    }

    /// Replace the entry date parser.
    pub fn date_parser(mut self, parser: DateParser) -> Self {
        self.opts.date_parser = parser;
        self
    }

    /// Build the parser with the configured options.
    pub fn build(self) -> AtomParser {
        AtomParser::new(self.opts)
    }
}
