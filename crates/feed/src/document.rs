// ABOUTME: Raw Atom document shape as it appears on the wire.
// ABOUTME: Populated by the decoder and consumed by the normalizer within a single parse.

/// The `<feed>` element with the children the normalizer reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub title: String,
    pub subtitle: String,
    pub author: RawAuthor,
    pub links: Vec<RawLink>,
    pub image: RawImage,
    pub entries: Vec<Entry>,
    pub updated: String,
}

/// One `<entry>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub title: String,
    pub summary: String,
    /// Inner markup of `<content>`, byte-for-byte. Never unescaped or parsed.
    pub content: String,
    pub links: Vec<RawLink>,
    pub updated: String,
    pub id: String,
}

/// A `<link>` element's attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLink {
    pub href: String,
    pub rel: String,
    pub mime_type: String,
    pub length: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAuthor {
    pub name: String,
    pub uri: String,
    pub email: String,
    pub extensions: Vec<RawLink>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawImage {
    pub title: String,
    pub url: String,
    pub height: i64,
    pub width: i64,
}
