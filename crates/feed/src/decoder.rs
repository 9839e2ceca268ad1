// ABOUTME: Decodes raw Atom XML bytes into the Document shape using quick-xml events.
// ABOUTME: Handles charset declarations via a CharsetAdapter and fails hard on malformed XML.

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::reader::Reader;

use crate::charset::CharsetAdapter;
use crate::document::{Document, Entry, RawAuthor, RawImage, RawLink};
use crate::error::FeedError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes an Atom document.
///
/// If the XML declaration names an encoding other than UTF-8, `adapter` is
/// asked to transcode the buffer first. Any structural problem aborts the
/// decode; no partial document is returned.
pub fn decode_document(data: &[u8], adapter: &dyn CharsetAdapter) -> Result<Document, FeedError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

    match declared_encoding(data)? {
        Some(label) if !label.eq_ignore_ascii_case("utf-8") => {
            let transcoded = adapter.adapt(&label, data)?;
            let transcoded = transcoded
                .strip_prefix(UTF8_BOM)
                .unwrap_or(&transcoded[..]);
            decode_utf8(transcoded)
        }
        _ => decode_utf8(data),
    }
}

/// Returns the `encoding` pseudo-attribute of the XML declaration, if any.
fn declared_encoding(data: &[u8]) -> Result<Option<String>, FeedError> {
    let mut reader = Reader::from_reader(data);
    match reader.read_event().map_err(FeedError::parse)? {
        Event::Decl(decl) => match decl.encoding() {
            Some(Ok(label)) => Ok(Some(String::from_utf8_lossy(&label).trim().to_string())),
            Some(Err(err)) => Err(FeedError::parse(err)),
            None => Ok(None),
        },
        _ => Ok(None),
    }
}

fn decode_utf8(data: &[u8]) -> Result<Document, FeedError> {
    let mut cursor = Cursor::new(data);

    loop {
        let (root, empty) = match cursor.next_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Eof => return Err(FeedError::invalid("document has no root element")),
            _ => continue,
        };

        if root.local_name().as_ref() != b"feed" {
            return Err(FeedError::invalid(format!(
                "expected <feed> root element, found <{}>",
                String::from_utf8_lossy(root.name().as_ref())
            )));
        }
        if empty {
            return Ok(Document::default());
        }
        // Anything after the root closes is ignored.
        return decode_feed(&mut cursor);
    }
}

fn decode_feed(cursor: &mut Cursor<'_>) -> Result<Document, FeedError> {
    let mut doc = Document::default();

    loop {
        let (start, empty) = match cursor.next_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(doc),
            Event::Eof => return Err(cursor.unexpected_eof("feed")),
            _ => continue,
        };

        match start.local_name().as_ref() {
            b"title" => doc.title = cursor.text(&start, empty)?,
            b"subtitle" => doc.subtitle = cursor.text(&start, empty)?,
            b"updated" => doc.updated = cursor.text(&start, empty)?,
            b"link" => doc.links.push(cursor.link(&start, empty)?),
            b"author" => decode_author(cursor, &mut doc.author, empty)?,
            b"image" => decode_image(cursor, &mut doc.image, empty)?,
            b"entry" => doc.entries.push(decode_entry(cursor, empty)?),
            _ => cursor.skip(&start, empty)?,
        }
    }
}

fn decode_entry(cursor: &mut Cursor<'_>, empty: bool) -> Result<Entry, FeedError> {
    let mut entry = Entry::default();
    if empty {
        return Ok(entry);
    }

    loop {
        let (start, empty) = match cursor.next_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(entry),
            Event::Eof => return Err(cursor.unexpected_eof("entry")),
            _ => continue,
        };

        match start.local_name().as_ref() {
            b"title" => entry.title = cursor.text(&start, empty)?,
            b"summary" => entry.summary = cursor.text(&start, empty)?,
            b"content" => entry.content = cursor.inner_markup(&start, empty)?,
            b"link" => entry.links.push(cursor.link(&start, empty)?),
            b"updated" => entry.updated = cursor.text(&start, empty)?,
            b"id" => entry.id = cursor.text(&start, empty)?,
            _ => cursor.skip(&start, empty)?,
        }
    }
}

// Repeated <author> elements merge into the same record.
fn decode_author(
    cursor: &mut Cursor<'_>,
    author: &mut RawAuthor,
    empty: bool,
) -> Result<(), FeedError> {
    if empty {
        return Ok(());
    }

    loop {
        let (start, empty) = match cursor.next_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(cursor.unexpected_eof("author")),
            _ => continue,
        };

        match start.local_name().as_ref() {
            b"name" => author.name = cursor.text(&start, empty)?,
            b"uri" => author.uri = cursor.text(&start, empty)?,
            b"email" => author.email = cursor.text(&start, empty)?,
            b"link" => author.extensions.push(cursor.link(&start, empty)?),
            _ => cursor.skip(&start, empty)?,
        }
    }
}

fn decode_image(
    cursor: &mut Cursor<'_>,
    image: &mut RawImage,
    empty: bool,
) -> Result<(), FeedError> {
    if empty {
        return Ok(());
    }

    loop {
        let (start, empty) = match cursor.next_event()? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(()),
            Event::Eof => return Err(cursor.unexpected_eof("image")),
            _ => continue,
        };

        match start.local_name().as_ref() {
            b"title" => image.title = cursor.text(&start, empty)?,
            b"url" => image.url = cursor.text(&start, empty)?,
            b"height" => image.height = parse_int(&cursor.text(&start, empty)?, "height"),
            b"width" => image.width = parse_int(&cursor.text(&start, empty)?, "width"),
            _ => cursor.skip(&start, empty)?,
        }
    }
}

fn parse_int(text: &str, field: &str) -> i64 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    text.parse().unwrap_or_else(|_| {
        tracing::debug!(field, value = text, "ignoring non-numeric image dimension");
        0
    })
}

/// Event reader over an in-memory UTF-8 buffer.
struct Cursor<'a> {
    data: &'a [u8],
    reader: Reader<&'a [u8]>,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            reader: Reader::from_reader(data),
        }
    }

    fn next_event(&mut self) -> Result<Event<'a>, FeedError> {
        match self.reader.read_event() {
            Ok(event) => Ok(event),
            Err(err) => Err(self.error_at(err)),
        }
    }

    fn error_at(&self, err: impl std::fmt::Display) -> FeedError {
        FeedError::parse(format!("{} at byte {}", err, self.reader.error_position()))
    }

    fn unexpected_eof(&self, element: &str) -> FeedError {
        FeedError::parse(format!(
            "unexpected end of input inside <{}> at byte {}",
            element,
            self.reader.buffer_position()
        ))
    }

    /// Skips the element just opened by `start`, including all descendants.
    fn skip(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<(), FeedError> {
        if empty {
            return Ok(());
        }
        match self.reader.read_to_end(start.name()) {
            Ok(_) => Ok(()),
            Err(err) => Err(self.error_at(err)),
        }
    }

    /// Collects the direct character data of an element. Nested elements are
    /// skipped; entity and character references are resolved.
    fn text(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<String, FeedError> {
        let mut out = String::new();
        if empty {
            return Ok(out);
        }

        loop {
            match self.next_event()? {
                Event::Text(t) => out.push_str(&t.decode().map_err(|e| self.error_at(e))?),
                Event::CData(c) => out.push_str(&c.decode().map_err(|e| self.error_at(e))?),
                Event::GeneralRef(r) => self.push_reference(&mut out, &r)?,
                Event::Start(nested) => self.skip(&nested, false)?,
                Event::End(_) => return Ok(out),
                Event::Eof => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    return Err(self.unexpected_eof(&name));
                }
                _ => {}
            }
        }
    }

    /// Returns the raw markup between the start and end tags, unmodified.
    fn inner_markup(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<String, FeedError> {
        if empty {
            return Ok(String::new());
        }
        let span = match self.reader.read_to_end(start.name()) {
            Ok(span) => span,
            Err(err) => return Err(self.error_at(err)),
        };
        let raw = self
            .data
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default();
        let raw = std::str::from_utf8(raw).map_err(|e| self.error_at(e))?;
        Ok(raw.to_owned())
    }

    /// Resolves one `&name;` reference into `out`.
    ///
    /// Used for both element text and attribute values. Character references
    /// must name a legal XML character; undeclared named entities (`&nbsp;`)
    /// are kept literally in either place.
    fn push_reference(&self, out: &mut String, r: &BytesRef<'_>) -> Result<(), FeedError> {
        if let Some(ch) = r.resolve_char_ref().map_err(|e| self.error_at(e))? {
            out.push(ch);
            return Ok(());
        }

        let name = r.decode().map_err(|e| self.error_at(e))?;
        match resolve_predefined_entity(&name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('&');
                out.push_str(&name);
                out.push(';');
            }
        }
        Ok(())
    }

    /// Unescapes an attribute value with the same reference rules as text.
    fn unescape_attribute(&self, raw: &str) -> Result<String, FeedError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let end = after
                .find(';')
                .ok_or_else(|| self.error_at("unterminated reference in attribute value"))?;
            self.push_reference(&mut out, &BytesRef::new(&after[..end]))?;
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Reads a `<link>`'s attributes and consumes the element.
    fn link(&mut self, start: &BytesStart<'a>, empty: bool) -> Result<RawLink, FeedError> {
        let mut link = RawLink::default();
        let decoder = self.reader.decoder();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.error_at(e))?;
            let raw = decoder.decode(&attr.value).map_err(|e| self.error_at(e))?;
            let value = self.unescape_attribute(&raw)?;

            match attr.key.local_name().as_ref() {
                b"href" => link.href = value,
                b"rel" => link.rel = value,
                b"type" => link.mime_type = value,
                b"length" => link.length = value.trim().parse().ok(),
                _ => {}
            }
        }

        self.skip(start, empty)?;
        Ok(link)
    }
}
