// ABOUTME: Integration tests for Atom normalization.
// ABOUTME: Covers deduplication, missing ids, link classification, dates, diagnostics, and hard failures.

use std::sync::Arc;
use std::time::Duration;

use atom_feed::{
    parse_atom, AtomParser, CollectingSink, Enclosure, FeedError, SkipReason, Utf8OnlyAdapter,
};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn atom(entries: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Example Feed</title>
    <subtitle>Notes and links</subtitle>
    <link href="https://example.com/feed.xml" rel="self"/>
    <link href="https://example.com/" rel="alternate"/>
    <updated>2024-01-15T10:00:00Z</updated>
{}
</feed>"#,
        entries
    )
}

fn ids(feed: &atom_feed::Feed) -> Vec<&str> {
    feed.items.iter().map(|i| i.id.as_str()).collect()
}

/// Two entries with the same id produce one item; the first one is kept.
#[test]
fn test_duplicate_ids_are_collapsed() {
    let xml = atom(
        r#"
    <entry><id>urn:a</id><title>First A</title></entry>
    <entry><id>urn:b</id><title>B</title></entry>
    <entry><id>urn:a</id><title>Second A</title></entry>"#,
    );

    let feed = parse_atom(xml.as_bytes()).unwrap();

    assert_eq!(ids(&feed), vec!["urn:a", "urn:b"]);
    assert_eq!(feed.items[0].title, "First A");
    assert_eq!(feed.unread, 2);
    assert_eq!(feed.item_ids.len(), 2);
}

/// Ids differing only by surrounding whitespace are the same item.
#[test]
fn test_duplicate_after_trimming_is_collapsed() {
    let xml = atom(
        r#"
    <entry><id>urn:a</id><title>A</title></entry>
    <entry><id>
        urn:a
    </id><title>A again</title></entry>"#,
    );

    let sink = Arc::new(CollectingSink::new());
    let parser = AtomParser::builder().diagnostics(sink.clone()).build();
    let feed = parser.parse(xml.as_bytes()).unwrap();

    assert_eq!(ids(&feed), vec!["urn:a"]);
    let skipped = sink.skipped();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].reason, SkipReason::DuplicateNormalizedId);
    assert_eq!(skipped[0].index, 1);
}

/// Entries with no id are dropped without affecting later entries.
#[test]
fn test_missing_id_is_excluded() {
    let xml = atom(
        r#"
    <entry><title>No id</title><link href="https://example.com/x"/></entry>
    <entry><id></id><title>Empty id</title></entry>
    <entry><id>   </id><title>Blank id</title></entry>
    <entry><id>urn:c</id><title>C</title></entry>"#,
    );

    let sink = Arc::new(CollectingSink::new());
    let parser = AtomParser::builder().diagnostics(sink.clone()).build();
    let feed = parser.parse(xml.as_bytes()).unwrap();

    assert_eq!(ids(&feed), vec!["urn:c"]);
    assert_eq!(feed.unread, 1);
    assert!(!feed.contains(""));

    let reasons: Vec<SkipReason> = sink.skipped().iter().map(|s| s.reason).collect();
    assert_eq!(reasons, vec![SkipReason::MissingId; 3]);
}

/// Item links: last primary wins. Feed links: first primary wins.
#[test]
fn test_primary_link_asymmetry() {
    let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <link href="https://example.com/A" rel="alternate"/>
    <link href="https://example.com/B" rel="related"/>
    <link href="https://example.com/C" rel="alternate"/>
    <entry>
        <id>urn:1</id>
        <link href="https://example.com/1/A" rel="alternate"/>
        <link href="https://example.com/1/B" rel="alternate"/>
    </entry>
</feed>"#;

    let feed = parse_atom(xml.as_bytes()).unwrap();

    assert_eq!(feed.link, "https://example.com/A");
    assert_eq!(feed.items[0].link, "https://example.com/1/B");
}

/// Feed link stays empty when no link qualifies.
#[test]
fn test_feed_link_empty_without_primary() {
    let xml = r#"<feed><link href="https://example.com/feed.xml" rel="self"/></feed>"#;
    let feed = parse_atom(xml.as_bytes()).unwrap();
    assert_eq!(feed.link, "");
}

/// Non-primary links become enclosures in document order, copied verbatim.
#[test]
fn test_enclosures_preserved_in_order() {
    let xml = atom(
        r#"
    <entry>
        <id>urn:ep1</id>
        <link rel="enclosure" href="https://cdn.example.com/ep1.mp3" type="audio/mpeg" length="12345"/>
        <link rel="alternate" href="https://example.com/ep1"/>
        <link rel="enclosure" href="https://cdn.example.com/ep1.ogg" type="audio/ogg" length="67890"/>
    </entry>"#,
    );

    let feed = parse_atom(xml.as_bytes()).unwrap();
    let item = &feed.items[0];

    assert_eq!(item.link, "https://example.com/ep1");
    assert_eq!(
        item.enclosures,
        vec![
            Enclosure {
                url: "https://cdn.example.com/ep1.mp3".to_string(),
                mime_type: Some("audio/mpeg".to_string()),
                length: 12345,
            },
            Enclosure {
                url: "https://cdn.example.com/ep1.ogg".to_string(),
                mime_type: Some("audio/ogg".to_string()),
                length: 67890,
            },
        ]
    );
}

/// Any rel other than "alternate" or empty is an enclosure, not only "enclosure".
#[test]
fn test_other_relations_become_enclosures() {
    let xml = atom(
        r#"
    <entry>
        <id>urn:x</id>
        <link rel="replies" href="https://example.com/x/comments"/>
    </entry>"#,
    );

    let feed = parse_atom(xml.as_bytes()).unwrap();
    let item = &feed.items[0];
    assert_eq!(item.link, "");
    assert_eq!(item.enclosures.len(), 1);
    assert_eq!(item.enclosures[0].mime_type, None);
    assert_eq!(item.enclosures[0].length, 0);
}

/// Unparseable dates leave the item accepted with no date.
#[test]
fn test_unparseable_date_falls_back() {
    let xml = atom(
        r#"
    <entry><id>urn:bad</id><updated>sometime last week</updated></entry>
    <entry><id>urn:none</id></entry>
    <entry><id>urn:good</id><updated>2024-01-15T10:00:00Z</updated></entry>"#,
    );

    let feed = parse_atom(xml.as_bytes()).unwrap();

    assert_eq!(feed.len(), 3);
    assert!(!feed.items[0].date_valid);
    assert_eq!(feed.items[0].date, None);
    assert!(!feed.items[1].date_valid);
    assert!(feed.items[2].date_valid);
    assert_eq!(
        feed.items[2].date,
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
    );
}

/// The compact numeric offset variant is accepted for entry dates.
#[test]
fn test_compact_offset_date() {
    let xml = atom(r#"<entry><id>urn:a</id><updated>2006-01-02T15:04:05-0700</updated></entry>"#);
    let feed = parse_atom(xml.as_bytes()).unwrap();
    assert_eq!(
        feed.items[0].date,
        Some(Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap())
    );
}

/// Truncated XML is a hard failure.
#[test]
fn test_truncated_input_fails() {
    let xml = atom(r#"<entry><id>urn:a</id></entry>"#);
    let truncated = &xml.as_bytes()[..xml.len() / 2];

    let result = parse_atom(truncated);
    assert!(matches!(result, Err(FeedError::Parse(_))));
}

#[test]
fn test_not_xml_fails() {
    let result = parse_atom(b"<feed><entry><id>a</id></entry></fee>");
    assert!(matches!(result, Err(FeedError::Parse(_))));
}

#[test]
fn test_wrong_root_fails() {
    let rss = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>x</title></channel></rss>"#;
    let result = parse_atom(rss.as_bytes());
    assert!(matches!(result, Err(FeedError::Invalid(_))));
}

/// Feed-level metadata is projected field by field.
#[test]
fn test_feed_metadata() {
    let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Example Feed</title>
    <subtitle>Notes and links</subtitle>
    <author>
        <name>Jane Doe</name>
        <uri>https://example.com/jane</uri>
        <email>jane@example.com</email>
        <link rel="me" href="https://social.example/@jane" type="text/html"/>
    </author>
    <image>
        <title>Logo</title>
        <url>https://example.com/logo.png</url>
        <height>64</height>
        <width>128</width>
    </image>
</feed>"#;

    let before = Utc::now();
    let feed = parse_atom(xml.as_bytes()).unwrap();
    let after = Utc::now();

    assert_eq!(feed.title, "Example Feed");
    assert_eq!(feed.description, "Notes and links");
    assert_eq!(feed.author.name, "Jane Doe");
    assert_eq!(feed.author.uri, "https://example.com/jane");
    assert_eq!(feed.author.email, "jane@example.com");
    assert_eq!(feed.author.extensions.len(), 1);
    assert_eq!(feed.author.extensions[0].href, "https://social.example/@jane");
    assert_eq!(feed.author.extensions[0].rel, "me");
    assert_eq!(feed.author.extensions[0].mime_type, "text/html");
    assert_eq!(feed.image.title, "Logo");
    assert_eq!(feed.image.height, 64);
    assert_eq!(feed.image.width, 128);
    assert!(feed.is_empty());

    let ten_minutes = chrono::Duration::minutes(10);
    assert!(feed.refresh >= before + ten_minutes);
    assert!(feed.refresh <= after + ten_minutes);
}

#[test]
fn test_custom_refresh_interval() {
    let parser = AtomParser::builder()
        .refresh_interval(Duration::from_secs(3600))
        .build();
    let before = Utc::now();
    let feed = parser.parse(b"<feed/>").unwrap();
    assert!(feed.refresh >= before + chrono::Duration::hours(1));
}

/// Content passes through as raw markup; title and summary are text.
#[test]
fn test_entry_fields_projection() {
    let xml = atom(
        r#"
    <entry>
        <id>urn:post</id>
        <title>Fish &amp; Chips</title>
        <summary type="html">&lt;p&gt;Short&lt;/p&gt;</summary>
        <content type="html">&lt;p&gt;Long &amp;amp; <![CDATA[<b>bold</b>]]>&lt;/p&gt;</content>
    </entry>"#,
    );

    let feed = parse_atom(xml.as_bytes()).unwrap();
    let item = &feed.items[0];

    assert_eq!(item.title, "Fish & Chips");
    assert_eq!(item.summary, "<p>Short</p>");
    assert_eq!(
        item.content,
        "&lt;p&gt;Long &amp;amp; <![CDATA[<b>bold</b>]]>&lt;/p&gt;"
    );
    assert!(!item.read);
}

/// Re-parsing the same bytes yields the same items in the same order.
#[test]
fn test_reparse_is_stable() {
    let xml = atom(
        r#"
    <entry><id>urn:3</id></entry>
    <entry><id>urn:1</id></entry>
    <entry><id>urn:2</id></entry>
    <entry><id>urn:1</id></entry>"#,
    );

    let first = parse_atom(xml.as_bytes()).unwrap();
    let second = parse_atom(xml.as_bytes()).unwrap();

    assert_eq!(ids(&first), vec!["urn:3", "urn:1", "urn:2"]);
    assert_eq!(first.items, second.items);
    assert_eq!(first.item_ids, second.item_ids);
}

/// Skips are reported per entry and once in aggregate with the raw input.
#[test]
fn test_diagnostics_receive_warnings() {
    let xml = atom(
        r#"
    <entry><id>urn:a</id><title>A</title></entry>
    <entry><id>urn:a</id><title>A dup</title></entry>
    <entry><title>Anonymous</title></entry>"#,
    );

    let sink = Arc::new(CollectingSink::new());
    let parser = AtomParser::builder().diagnostics(sink.clone()).build();
    parser.parse(xml.as_bytes()).unwrap();

    let skipped = sink.skipped();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].reason, SkipReason::DuplicateId);
    assert_eq!(skipped[0].title, "A dup");
    assert_eq!(skipped[1].reason, SkipReason::MissingId);
    assert_eq!(skipped[1].title, "Anonymous");
    assert_eq!(sink.reports(), vec![xml.into_bytes()]);
}

#[test]
fn test_clean_feed_reports_nothing() {
    let xml = atom(r#"<entry><id>urn:a</id></entry>"#);
    let sink = Arc::new(CollectingSink::new());
    let parser = AtomParser::builder().diagnostics(sink.clone()).build();
    parser.parse(xml.as_bytes()).unwrap();

    assert!(sink.skipped().is_empty());
    assert!(sink.reports().is_empty());
}

/// Invariant: the id set mirrors the item list exactly.
#[test]
fn test_item_ids_match_items() {
    let xml = atom(
        r#"
    <entry><id>urn:a</id></entry>
    <entry></entry>
    <entry><id>urn:b</id></entry>
    <entry><id>urn:a</id></entry>
    <entry><id> urn:b </id></entry>"#,
    );

    let feed = parse_atom(xml.as_bytes()).unwrap();
    assert_eq!(feed.item_ids.len(), feed.items.len());
    for item in &feed.items {
        assert!(!item.id.is_empty());
        assert!(feed.item_ids.contains(&item.id));
    }
    assert_eq!(feed.unread as usize, feed.items.len());
}

#[test]
fn test_latin1_feed() {
    let mut xml =
        b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><feed><entry><id>urn:1</id><title>Caf"
            .to_vec();
    xml.push(0xE9);
    xml.extend_from_slice(b"</title></entry></feed>");

    let feed = parse_atom(&xml).unwrap();
    assert_eq!(feed.items[0].title, "Café");

    let strict = AtomParser::builder().charset_adapter(Utf8OnlyAdapter).build();
    assert!(matches!(
        strict.parse(&xml),
        Err(FeedError::Charset { .. })
    ));
}

#[test]
fn test_parser_is_shareable_across_threads() {
    let parser = Arc::new(AtomParser::default());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let parser = Arc::clone(&parser);
            std::thread::spawn(move || {
                let xml = atom(&format!("<entry><id>urn:{}</id></entry>", n));
                parser.parse(xml.as_bytes()).map(|feed| feed.items[0].id.clone())
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap().unwrap(), format!("urn:{}", n));
    }
}
