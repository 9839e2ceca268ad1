// ABOUTME: Diagnostic sinks that observe entries skipped during normalization.
// ABOUTME: NoopSink is the default; TracingSink logs warnings; CollectingSink records them.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::document::Entry;

/// Why an entry was left out of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The raw identifier matched an item already accepted from this document.
    DuplicateId,
    /// The identifier was empty once normalized.
    MissingId,
    /// The normalized identifier matched an item already accepted.
    DuplicateNormalizedId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::DuplicateId => "duplicate id",
            SkipReason::MissingId => "missing id",
            SkipReason::DuplicateNormalizedId => "duplicate id after normalization",
        };
        write!(f, "{}", s)
    }
}

/// Summary of one skipped entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Position of the entry in the document, counting from zero.
    pub index: usize,
    pub reason: SkipReason,
    pub title: String,
    pub id: String,
}

/// Receives warnings raised while normalizing entries.
///
/// Both hooks default to no-ops. Implementations must not panic; nothing they
/// do can change the parse result.
pub trait DiagnosticSink: Send + Sync {
    /// Called once per skipped entry with a snapshot of the raw entry.
    fn entry_skipped(&self, _skipped: &SkippedEntry, _entry: &Entry) {}

    /// Called at most once per parse, after all entries, if any were skipped.
    fn finished_with_warnings(&self, _raw: &[u8], _skipped: &[SkippedEntry]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {}

/// Logs skipped entries through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn entry_skipped(&self, skipped: &SkippedEntry, entry: &Entry) {
        tracing::warn!(
            index = skipped.index,
            id = %skipped.id,
            title = %skipped.title,
            reason = %skipped.reason,
            "skipping feed entry"
        );
        tracing::debug!(?entry, "skipped entry snapshot");
    }

    fn finished_with_warnings(&self, raw: &[u8], skipped: &[SkippedEntry]) {
        tracing::warn!(skipped = skipped.len(), "feed parsed with warnings");
        tracing::debug!(raw = %String::from_utf8_lossy(raw), "raw feed input");
    }
}

/// Keeps every warning in memory. Useful for callers that report skips
/// themselves.
#[derive(Debug, Default)]
pub struct CollectingSink {
    skipped: Mutex<Vec<SkippedEntry>>,
    reports: Mutex<Vec<Vec<u8>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All skipped entries seen so far, in the order they were reported.
    pub fn skipped(&self) -> Vec<SkippedEntry> {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Raw inputs of every parse that finished with warnings.
    pub fn reports(&self) -> Vec<Vec<u8>> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn entry_skipped(&self, skipped: &SkippedEntry, _entry: &Entry) {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(skipped.clone());
    }

    fn finished_with_warnings(&self, raw: &[u8], _skipped: &[SkippedEntry]) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(raw.to_vec());
    }
}
