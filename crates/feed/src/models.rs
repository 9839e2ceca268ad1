// ABOUTME: Normalized feed models handed to callers after a parse.
// ABOUTME: Feed owns its items plus the identifier set used for duplicate detection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A non-primary link on an item, typically a media attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
    pub length: u64,
}

/// A link carried on an author record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub uri: String,
    pub email: String,
    pub extensions: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub title: String,
    pub url: String,
    pub height: u32,
    pub width: u32,
}

/// A single normalized entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub summary: String,
    /// Raw markup from the entry's `<content>`, passed through untouched.
    pub content: String,
    pub id: String,
    pub link: String,
    pub enclosures: Vec<Enclosure>,
    /// `None` unless the source date was present and parsed.
    pub date: Option<DateTime<Utc>>,
    pub date_valid: bool,
    pub read: bool,
}

/// A normalized feed.
///
/// `items` keeps document order with the first occurrence of each identifier,
/// and `item_ids` always holds exactly the identifiers of `items`. The set is
/// not serialized; deserializing rebuilds it from `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredFeed")]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub author: Author,
    pub link: String,
    pub image: Image,
    /// Earliest suggested time for the next poll.
    pub refresh: DateTime<Utc>,
    pub items: Vec<Item>,
    #[serde(skip_serializing)]
    pub item_ids: HashSet<String>,
    pub unread: u32,
}

/// Serialized shape of a `Feed`, without the derived identifier set.
#[derive(Deserialize)]
struct StoredFeed {
    title: String,
    description: String,
    author: Author,
    link: String,
    image: Image,
    refresh: DateTime<Utc>,
    items: Vec<Item>,
    unread: u32,
}

impl From<StoredFeed> for Feed {
    fn from(stored: StoredFeed) -> Self {
        let item_ids = stored.items.iter().map(|item| item.id.clone()).collect();
        Feed {
            title: stored.title,
            description: stored.description,
            author: stored.author,
            link: stored.link,
            image: stored.image,
            refresh: stored.refresh,
            items: stored.items,
            item_ids,
            unread: stored.unread,
        }
    }
}

impl Feed {
    pub(crate) fn new(refresh: DateTime<Utc>, capacity: usize) -> Self {
        Feed {
            title: String::new(),
            description: String::new(),
            author: Author::default(),
            link: String::new(),
            image: Image::default(),
            refresh,
            items: Vec::with_capacity(capacity),
            item_ids: HashSet::with_capacity(capacity),
            unread: 0,
        }
    }

    /// Returns true if an item with this identifier was accepted.
    pub fn contains(&self, id: &str) -> bool {
        self.item_ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up an accepted item by identifier.
    pub fn get(&self, id: &str) -> Option<&Item> {
        if !self.contains(id) {
            return None;
        }
        self.items.iter().find(|item| item.id == id)
    }

    // Caller has already checked that `item.id` is non-empty and unseen.
    pub(crate) fn accept(&mut self, mut item: Item) {
        item.read = false;
        self.item_ids.insert(item.id.clone());
        self.items.push(item);
        self.unread += 1;
    }
}
