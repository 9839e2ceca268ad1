// ABOUTME: Atom normalization: feed metadata projection, entry normalization, and deduplication.
// ABOUTME: Only decoding can fail the parse; bad entries are skipped and reported to diagnostics.

use chrono::{DateTime, Utc};

use crate::decoder::decode_document;
use crate::diagnostics::{SkipReason, SkippedEntry};
use crate::document::{Entry, RawAuthor, RawImage, RawLink};
use crate::error::FeedError;
use crate::models::{Author, Enclosure, Feed, Image, Item, Link};
use crate::options::{ParserBuilder, ParserOptions};

/// Parses Atom documents into normalized feeds.
///
/// A parser holds only configuration, so one instance can serve many feeds,
/// including from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct AtomParser {
    opts: ParserOptions,
}

impl AtomParser {
    pub fn new(opts: ParserOptions) -> Self {
        Self { opts }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.opts
    }

    /// Parses an Atom document.
    ///
    /// # Returns
    /// * `Ok(Feed)` - Every entry that passed identity checks, in document order
    /// * `Err(FeedError)` - The input was not a well-formed Atom document
    pub fn parse(&self, data: &[u8]) -> Result<Feed, FeedError> {
        let doc = decode_document(data, self.opts.charset_adapter.as_ref())?;

        let mut feed = Feed::new(self.refresh_deadline(Utc::now()), doc.entries.len());
        feed.title = doc.title;
        feed.description = doc.subtitle;
        feed.author = project_author(&doc.author);
        feed.link = select_feed_link(&doc.links);
        feed.image = project_image(&doc.image);

        let sink = self.opts.diagnostics.as_ref();
        let mut skipped = Vec::new();
        for (index, entry) in doc.entries.iter().enumerate() {
            if let Err(reason) = self.accept_entry(&mut feed, entry) {
                let skip = SkippedEntry {
                    index,
                    reason,
                    title: entry.title.clone(),
                    id: entry.id.clone(),
                };
                sink.entry_skipped(&skip, entry);
                skipped.push(skip);
            }
        }

        if !skipped.is_empty() {
            sink.finished_with_warnings(data, &skipped);
        }

        tracing::debug!(
            items = feed.items.len(),
            skipped = skipped.len(),
            "parsed atom feed"
        );
        Ok(feed)
    }

    /// Runs the identity checks for one entry and appends it on success.
    fn accept_entry(&self, feed: &mut Feed, entry: &Entry) -> Result<(), SkipReason> {
        if feed.contains(&entry.id) {
            return Err(SkipReason::DuplicateId);
        }

        let item = self.normalize_entry(entry);

        if item.id.is_empty() {
            return Err(SkipReason::MissingId);
        }
        if feed.contains(&item.id) {
            return Err(SkipReason::DuplicateNormalizedId);
        }

        feed.accept(item);
        Ok(())
    }

    fn normalize_entry(&self, entry: &Entry) -> Item {
        let date = if entry.updated.is_empty() {
            None
        } else {
            (self.opts.date_parser)(&entry.updated)
        };

        // Later primary links overwrite earlier ones, unlike the feed level.
        let mut link = String::new();
        let mut enclosures = Vec::new();
        for raw in &entry.links {
            if is_primary_rel(&raw.rel) {
                link = raw.href.clone();
            } else {
                enclosures.push(enclosure_from(raw));
            }
        }

        Item {
            title: entry.title.clone(),
            summary: entry.summary.clone(),
            content: entry.content.clone(),
            id: normalize_id(&entry.id),
            link,
            enclosures,
            date,
            date_valid: date.is_some(),
            read: false,
        }
    }

    fn refresh_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.opts.refresh_interval)
            .ok()
            .and_then(|interval| now.checked_add_signed(interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Parses an Atom document with default options.
pub fn parse_atom(data: &[u8]) -> Result<Feed, FeedError> {
    AtomParser::default().parse(data)
}

fn is_primary_rel(rel: &str) -> bool {
    rel.is_empty() || rel == "alternate"
}

fn normalize_id(raw: &str) -> String {
    raw.trim().to_string()
}

/// The first primary link wins at the feed level.
fn select_feed_link(links: &[RawLink]) -> String {
    links
        .iter()
        .find(|link| is_primary_rel(&link.rel))
        .map(|link| link.href.clone())
        .unwrap_or_default()
}

fn enclosure_from(raw: &RawLink) -> Enclosure {
    Enclosure {
        url: raw.href.clone(),
        mime_type: (!raw.mime_type.is_empty()).then(|| raw.mime_type.clone()),
        length: raw.length.unwrap_or(0),
    }
}

fn project_author(raw: &RawAuthor) -> Author {
    Author {
        name: raw.name.clone(),
        uri: raw.uri.clone(),
        email: raw.email.clone(),
        extensions: raw
            .extensions
            .iter()
            .map(|ext| Link {
                href: ext.href.clone(),
                rel: ext.rel.clone(),
                mime_type: ext.mime_type.clone(),
            })
            .collect(),
    }
}

fn project_image(raw: &RawImage) -> Image {
    Image {
        title: raw.title.clone(),
        url: raw.url.clone(),
        height: u32::try_from(raw.height).unwrap_or(0),
        width: u32::try_from(raw.width).unwrap_or(0),
    }
}
