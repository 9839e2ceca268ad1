// ABOUTME: Permissive timestamp parsing for Atom entry dates.
// ABOUTME: Accepts RFC 3339, compact numeric offsets, RFC 2822, named zones, and naive UTC forms.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// ISO-8601 shapes whose offset is not in strict RFC 3339 form,
/// e.g. "2006-01-02T15:04:05-0700" or "2006-01-02T15:04:05.000+07".
const OFFSET_VARIANTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%#z",
    "%Y-%m-%d %H:%M:%S %#z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %e %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%e %b %Y %H:%M:%S %z",
];

/// Shapes with no zone at all; interpreted as UTC.
const NAIVE_FORMS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%e %b %Y %H:%M:%S",
];

/// Bases tried in front of a named zone abbreviation.
const NAMED_ZONE_BASES: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%a, %e %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%e %b %Y %H:%M:%S",
];

/// Zone abbreviations seen in feeds, with their offsets in seconds.
/// Ambiguous names take their North American meaning.
const NAMED_ZONES: &[(&str, i32)] = &[
    ("GMT", 0),
    ("UTC", 0),
    ("UT", 0),
    ("Z", 0),
    ("EST", -5 * 3600),
    ("EDT", -4 * 3600),
    ("CST", -6 * 3600),
    ("CDT", -5 * 3600),
    ("MST", -7 * 3600),
    ("MDT", -6 * 3600),
    ("PST", -8 * 3600),
    ("PDT", -7 * 3600),
    ("AKST", -9 * 3600),
    ("AKDT", -8 * 3600),
    ("HST", -10 * 3600),
    ("AST", -4 * 3600),
    ("ADT", -3 * 3600),
    ("NST", -(3 * 3600 + 30 * 60)),
    ("NDT", -(2 * 3600 + 30 * 60)),
    ("WET", 0),
    ("WEST", 3600),
    ("CET", 3600),
    ("CEST", 2 * 3600),
    ("EET", 2 * 3600),
    ("EEST", 3 * 3600),
    ("BST", 3600),
    ("JST", 9 * 3600),
    ("KST", 9 * 3600),
    ("IST", 5 * 3600 + 30 * 60),
    ("AEST", 10 * 3600),
    ("AEDT", 11 * 3600),
    ("AWST", 8 * 3600),
    ("NZST", 12 * 3600),
    ("NZDT", 13 * 3600),
];

/// Parses a feed timestamp into UTC.
///
/// Returns `None` for empty or unrecognized input. Never panics and has no
/// side effects, so callers can treat failure as an ordinary outcome.
pub fn parse_flexible_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Strict Atom profile (also covers fractional seconds).
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_offset_variant(s) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_named_zone(s) {
        return Some(dt);
    }

    parse_naive(s)
}

fn parse_offset_variant(s: &str) -> Option<DateTime<Utc>> {
    OFFSET_VARIANTS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(s: &str) -> Option<DateTime<Utc>> {
    if let Some(naive) = NAIVE_FORMS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d %b %Y"))
        .ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// chrono's `%Z` cannot parse abbreviations, so they are mapped by hand.
fn parse_named_zone(s: &str) -> Option<DateTime<Utc>> {
    let (base, zone) = s.rsplit_once(' ')?;
    let offset_secs = NAMED_ZONES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(zone))
        .map(|(_, secs)| *secs)?;
    let offset = FixedOffset::east_opt(offset_secs)?;

    let base = base.trim_end();
    NAMED_ZONE_BASES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(base, fmt).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|dt| dt.with_timezone(&Utc))
}
