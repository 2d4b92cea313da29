use feed_rs::model::Entry;

use super::types::{PanelEntry, RawFeed, RawFeedEntry};

const REPLY_PREFIX: &str = "re: ";

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("unsupported feed format: only RSS and Atom documents are accepted")]
    UnsupportedFormat,
    #[error("xml feed parse error: {0}")]
    Xml(#[from] feed_rs::parser::ParseFeedError),
}

pub fn parse_feed_bytes(raw: &[u8]) -> Result<RawFeed, FeedParseError> {
    let trimmed = trim_leading_ascii_whitespace(raw);
    if trimmed.is_empty() {
        return Err(FeedParseError::EmptyPayload);
    }
    if trimmed[0] == b'{' {
        return Err(FeedParseError::UnsupportedFormat);
    }
    // A missing guid/id stays empty instead of becoming a generated identifier.
    let feed = feed_rs::parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(trimmed)?;
    let entries = feed.entries.iter().map(entry_from_xml).collect();
    Ok(RawFeed { entries })
}

/// Parses a fetched document, refusing payloads the server labels as JSON.
pub fn parse_feed_document(
    raw: &[u8],
    content_type: Option<&str>,
) -> Result<RawFeed, FeedParseError> {
    if content_type.is_some_and(is_json_content_type) {
        return Err(FeedParseError::UnsupportedFormat);
    }
    parse_feed_bytes(raw)
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

/// Filters, truncates and sorts raw entries into panel entries.
///
/// Entries are visited in document order. When `include_replies` is false any entry whose
/// title starts with `Re: ` (any casing) is skipped. Collection stops after `max_size`
/// complete entries; entries that cannot produce a complete [`PanelEntry`] are dropped and
/// do not count. The result is stably sorted by `last_updated_date` ascending, so equal
/// dates keep their encounter order.
pub fn normalize(feed: &RawFeed, max_size: usize, include_replies: bool) -> Vec<PanelEntry> {
    let mut panel_entries = Vec::with_capacity(max_size.min(feed.entries.len()));
    for entry in &feed.entries {
        if panel_entries.len() >= max_size {
            break;
        }
        if !include_replies && is_reply(entry.title.as_deref()) {
            continue;
        }
        match panel_entry_from(entry) {
            Some(panel_entry) => panel_entries.push(panel_entry),
            None => tracing::debug!(
                link = entry.link.as_deref().unwrap_or_default(),
                uri = entry.uri.as_deref().unwrap_or_default(),
                "skipping incomplete feed entry"
            ),
        }
    }
    panel_entries.sort_by(|a, b| a.last_updated_date.cmp(&b.last_updated_date));
    panel_entries
}

pub fn is_reply(title: Option<&str>) -> bool {
    title
        .and_then(|value| value.get(..REPLY_PREFIX.len()))
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(REPLY_PREFIX))
}

fn panel_entry_from(entry: &RawFeedEntry) -> Option<PanelEntry> {
    let last_updated_date = entry.updated.or(entry.published)?;
    let title = match &entry.title {
        Some(title) => title.clone(),
        None => title_from_link(entry.link.as_deref()?)?,
    };
    let link = resolve_link(entry.link.as_deref(), entry.uri.as_deref())?;
    if title.is_empty() {
        return None;
    }

    Some(PanelEntry {
        author: entry.author.clone(),
        title,
        link,
        last_updated_date,
    })
}

/// Last non-empty path segment of `link` with hyphens turned into spaces.
pub fn title_from_link(link: &str) -> Option<String> {
    link.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(|segment| segment.replace('-', " "))
}

pub fn resolve_link(link: Option<&str>, uri: Option<&str>) -> Option<String> {
    if let Some(link) = link.filter(|value| value.starts_with("http")) {
        return Some(link.to_string());
    }
    let uri = uri.filter(|value| !value.is_empty())?;
    let resolved = if is_github_wiki(uri) {
        uri.rfind('/').map_or(uri, |index| &uri[..index])
    } else {
        uri
    };
    Some(resolved.to_string())
}

fn is_github_wiki(uri: &str) -> bool {
    uri.starts_with("https://github.com") && uri.contains("/wiki/")
}

fn entry_from_xml(entry: &Entry) -> RawFeedEntry {
    let title = entry.title.as_ref().map(|text| text.content.clone());
    let link = entry
        .links
        .iter()
        .find(|entry_link| {
            entry_link
                .rel
                .as_deref()
                .is_none_or(|rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| entry.links.first())
        .map(|entry_link| entry_link.href.clone());
    let uri = Some(entry.id.trim())
        .filter(|id| !id.is_empty())
        .map(ToString::to_string);
    let author = entry.authors.first().map(|person| person.name.clone());

    RawFeedEntry {
        title,
        link,
        uri,
        author,
        updated: entry.updated,
        published: entry.published,
    }
}

fn trim_leading_ascii_whitespace(raw: &[u8]) -> &[u8] {
    let mut index = 0;
    while index < raw.len() && raw[index].is_ascii_whitespace() {
        index += 1;
    }
    &raw[index..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn raw_entry(title: Option<&str>, link: &str, day: u32) -> RawFeedEntry {
        RawFeedEntry {
            title: title.map(ToString::to_string),
            link: Some(link.to_string()),
            uri: None,
            author: Some("tester".to_string()),
            updated: Some(Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()),
            published: None,
        }
    }

    #[test]
    fn parses_rss_fixture_in_document_order() {
        let xml = include_bytes!("../../../fixtures/feeds/sample.rss.xml");
        let parsed = parse_feed_bytes(xml).expect("rss fixture must parse");

        assert_eq!(parsed.entries.len(), 4);
        assert_eq!(parsed.entries[0].title.as_deref(), Some("Release 3.5 is out"));
        assert_eq!(parsed.entries[1].title.as_deref(), Some("RE: Release 3.5 is out"));
        assert!(parsed.entries[0].published.is_some());
    }

    #[test]
    fn parses_atom_fixture_with_ids_and_authors() {
        let xml = include_bytes!("../../../fixtures/feeds/sample.atom");
        let parsed = parse_feed_bytes(xml).expect("atom fixture must parse");

        assert_eq!(parsed.entries.len(), 2);
        let first = &parsed.entries[0];
        assert_eq!(
            first.uri.as_deref(),
            Some("https://github.com/example/project/wiki/Getting-Started")
        );
        assert_eq!(first.author.as_deref(), Some("octocat"));
        assert!(first.updated.is_some());
    }

    #[test]
    fn rejects_empty_and_json_payloads() {
        assert!(matches!(
            parse_feed_bytes(b"  \n "),
            Err(FeedParseError::EmptyPayload)
        ));
        assert!(matches!(
            parse_feed_bytes(br#"{"version": "https://jsonfeed.org/version/1.1"}"#),
            Err(FeedParseError::UnsupportedFormat)
        ));
        assert!(matches!(
            parse_feed_bytes(b"<html><body>nope</body></html>"),
            Err(FeedParseError::Xml(_))
        ));
    }

    #[test]
    fn rss_item_without_link_or_guid_has_no_uri() {
        let xml = br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>https://a.example/</link><description>d</description>
  <item><title>No link here</title><pubDate>Tue, 10 Mar 2026 09:00:00 GMT</pubDate></item>
  <item><title>Linked</title><link>https://a.example/linked</link><pubDate>Wed, 11 Mar 2026 09:00:00 GMT</pubDate></item>
</channel></rss>"#;
        let parsed = parse_feed_bytes(xml).expect("rss must parse");

        assert_eq!(parsed.entries[0].uri, None);
        assert_eq!(parsed.entries[0].link, None);
        assert_eq!(parsed.entries[1].uri, None);

        let entries = normalize(&parsed, 8, true);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://a.example/linked");
    }

    #[test]
    fn prefers_alternate_link_over_edit_link() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>urn:example:feed</id>
  <title>t</title>
  <updated>2026-03-10T12:00:00Z</updated>
  <entry>
    <id>urn:example:post-1</id>
    <title>Post</title>
    <link rel="edit" href="https://api.example/edit/1"/>
    <link rel="alternate" href="https://example.com/post"/>
    <updated>2026-03-10T12:00:00Z</updated>
  </entry>
  <entry>
    <id>urn:example:post-2</id>
    <title>Edit only</title>
    <link rel="edit" href="https://api.example/edit/2"/>
    <updated>2026-03-11T12:00:00Z</updated>
  </entry>
</feed>"#;
        let parsed = parse_feed_bytes(xml).expect("atom must parse");

        assert_eq!(parsed.entries[0].link.as_deref(), Some("https://example.com/post"));
        assert_eq!(parsed.entries[1].link.as_deref(), Some("https://api.example/edit/2"));
    }

    #[test]
    fn rejects_json_labelled_documents() {
        let xml = include_bytes!("../../../fixtures/feeds/sample.rss.xml");
        assert!(matches!(
            parse_feed_document(xml, Some("application/feed+json; charset=utf-8")),
            Err(FeedParseError::UnsupportedFormat)
        ));
        assert!(matches!(
            parse_feed_document(xml, Some("Application/JSON")),
            Err(FeedParseError::UnsupportedFormat)
        ));
        assert_eq!(
            parse_feed_document(xml, Some("application/rss+xml"))
                .expect("rss must parse")
                .entries
                .len(),
            4
        );
        assert!(parse_feed_document(xml, None).is_ok());
    }

    #[test]
    fn skips_replies_in_any_casing_when_excluded() {
        let feed = RawFeed {
            entries: vec![
                raw_entry(Some("Re: question"), "https://a.example/1", 1),
                raw_entry(Some("RE: question"), "https://a.example/2", 2),
                raw_entry(Some("re: question"), "https://a.example/3", 3),
                raw_entry(Some("Regarding plans"), "https://a.example/4", 4),
            ],
        };

        let left = normalize(&feed, 8, false);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "Regarding plans");

        let right = normalize(&feed, 8, true);
        assert_eq!(right.len(), 4);
    }

    #[test]
    fn truncates_after_filtering() {
        let entries = (1..=12)
            .map(|day| {
                let title = if day % 2 == 0 { "Re: reply" } else { "topic" };
                raw_entry(Some(title), &format!("https://a.example/{day}"), day)
            })
            .collect();
        let feed = RawFeed { entries };

        let left = normalize(&feed, 3, false);
        assert_eq!(left.len(), 3);
        let links: Vec<&str> = left.iter().map(|entry| entry.link.as_str()).collect();
        assert_eq!(
            links,
            ["https://a.example/1", "https://a.example/3", "https://a.example/5"]
        );

        assert_eq!(normalize(&feed, 8, true).len(), 8);
        assert!(normalize(&feed, 0, true).is_empty());
    }

    #[test]
    fn sorts_ascending_and_keeps_encounter_order_on_ties() {
        let feed = RawFeed {
            entries: vec![
                raw_entry(Some("late"), "https://a.example/late", 20),
                raw_entry(Some("tie-a"), "https://a.example/tie-a", 5),
                raw_entry(Some("early"), "https://a.example/early", 1),
                raw_entry(Some("tie-b"), "https://a.example/tie-b", 5),
            ],
        };

        let titles: Vec<String> = normalize(&feed, 8, true)
            .into_iter()
            .map(|entry| entry.title)
            .collect();
        assert_eq!(titles, ["early", "tie-a", "tie-b", "late"]);
    }

    #[test]
    fn derives_missing_title_from_link() {
        let feed = RawFeed {
            entries: vec![raw_entry(None, "https://a.example/docs/foo-bar-baz", 1)],
        };
        let entries = normalize(&feed, 8, false);
        assert_eq!(entries[0].title, "foo bar baz");
        assert_eq!(title_from_link("https://a.example/x/last-one/").as_deref(), Some("last one"));
    }

    #[test]
    fn falls_back_to_uri_and_trims_github_wiki_pages() {
        assert_eq!(
            resolve_link(
                Some("/example/project/wiki/Some-Page"),
                Some("https://github.com/org/repo/wiki/Some-Page")
            )
            .as_deref(),
            Some("https://github.com/org/repo/wiki")
        );
        assert_eq!(
            resolve_link(None, Some("tag:example.com,2026:entry-1")).as_deref(),
            Some("tag:example.com,2026:entry-1")
        );
        assert_eq!(
            resolve_link(Some("https://a.example/post"), Some("ignored")).as_deref(),
            Some("https://a.example/post")
        );
        assert_eq!(resolve_link(Some("relative/post"), None), None);
    }

    #[test]
    fn uses_published_date_when_updated_is_missing() {
        let published = Utc.with_ymd_and_hms(2025, 12, 24, 18, 30, 0).unwrap();
        let feed = RawFeed {
            entries: vec![RawFeedEntry {
                title: Some("holiday notes".to_string()),
                link: Some("https://a.example/holiday".to_string()),
                published: Some(published),
                ..RawFeedEntry::default()
            }],
        };
        let entries = normalize(&feed, 8, false);
        assert_eq!(entries[0].last_updated_date, published);
        assert_eq!(entries[0].author, None);
    }

    #[test]
    fn drops_incomplete_entries_without_counting_them() {
        let mut undated = raw_entry(Some("undated"), "https://a.example/undated", 1);
        undated.updated = None;
        let mut unlinked = raw_entry(Some("unlinked"), "not-a-url", 2);
        unlinked.uri = None;
        let feed = RawFeed {
            entries: vec![
                undated,
                unlinked,
                raw_entry(Some("kept"), "https://a.example/kept", 3),
            ],
        };

        let entries = normalize(&feed, 1, true);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "kept");
    }

    #[test]
    fn normalizes_atom_fixture_into_wiki_links() {
        let xml = include_bytes!("../../../fixtures/feeds/sample.atom");
        let parsed = parse_feed_bytes(xml).expect("atom fixture must parse");
        let entries = normalize(&parsed, 8, false);

        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|entry| entry.link == "https://github.com/example/project/wiki"));
        assert_eq!(entries[0].title, "Installation Guide");
        assert_eq!(entries[1].title, "Getting Started");
    }
}
