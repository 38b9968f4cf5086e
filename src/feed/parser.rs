use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;

/// A feed document reduced to the fields podcasts and episodes are built from.
///
/// Text fields still carry whatever markup the publisher used.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

/// One `<item>` / `<entry>` of a feed.
#[derive(Debug, Clone, Default)]
pub struct ParsedEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    /// Second link relation of the entry, normally the audio enclosure.
    pub media_url: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let image = feed
        .logo
        .map(|logo| logo.uri)
        .or_else(|| feed.icon.map(|icon| icon.uri));

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content),
        summary: feed.description.map(|d| d.content),
        image,
        entries: feed.entries.into_iter().map(parse_entry).collect(),
    })
}

fn parse_entry(entry: Entry) -> ParsedEntry {
    // Link relations in document order: <link> elements, then enclosures.
    // The first is the episode page, the second the media file.
    let mut relations = entry
        .links
        .iter()
        .map(|l| l.href.clone())
        .chain(
            entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .filter_map(|c| c.url.as_ref().map(|u| u.to_string())),
        );
    let link = relations.next();
    let media_url = relations.next();

    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body));

    ParsedEntry {
        title: entry.title.map(|t| t.content),
        summary,
        link,
        media_url,
        published: entry.published.or(entry.updated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const PODCAST_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Rust Radio</title>
    <link>https://radio.example.com</link>
    <description>&lt;p&gt;Weekly &lt;b&gt;systems&lt;/b&gt; talk&lt;/p&gt;</description>
    <image>
      <url>https://radio.example.com/cover.jpg</url>
      <title>Rust Radio</title>
      <link>https://radio.example.com</link>
    </image>
    <item>
      <title>Ownership</title>
      <link>https://radio.example.com/ep/1</link>
      <description>All about borrowing</description>
      <enclosure url="https://cdn.example.com/ep1.mp3" length="1234" type="audio/mpeg"/>
      <pubDate>Tue, 02 Jan 2024 10:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Lifetimes</title>
      <link>https://radio.example.com/ep/2</link>
      <description>No audio yet</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_podcast_metadata() {
        let feed = parse_feed(PODCAST_RSS.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Rust Radio"));
        assert_eq!(feed.image.as_deref(), Some("https://radio.example.com/cover.jpg"));
        assert!(feed.summary.unwrap().contains("systems"));
        assert_eq!(feed.entries.len(), 2);
    }

    #[test]
    fn test_enclosure_is_second_link_relation() {
        let feed = parse_feed(PODCAST_RSS.as_bytes()).unwrap();
        let first = &feed.entries[0];
        assert_eq!(first.title.as_deref(), Some("Ownership"));
        assert_eq!(first.link.as_deref(), Some("https://radio.example.com/ep/1"));
        assert_eq!(first.media_url.as_deref(), Some("https://cdn.example.com/ep1.mp3"));
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_entry_without_enclosure_has_no_media() {
        let feed = parse_feed(PODCAST_RSS.as_bytes()).unwrap();
        let second = &feed.entries[1];
        assert_eq!(second.link.as_deref(), Some("https://radio.example.com/ep/2"));
        assert!(second.media_url.is_none());
        assert!(second.published.is_none());
    }

    #[test]
    fn test_atom_enclosure_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Cast</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-02-01T00:00:00Z</updated>
  <entry>
    <title>First</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <link href="https://atom.example.com/1"/>
    <link rel="enclosure" type="audio/mpeg" href="https://atom.example.com/1.mp3"/>
    <updated>2024-02-01T12:00:00Z</updated>
  </entry>
</feed>"#;
        let feed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Atom Cast"));
        let entry = &feed.entries[0];
        assert_eq!(entry.link.as_deref(), Some("https://atom.example.com/1"));
        assert_eq!(entry.media_url.as_deref(), Some("https://atom.example.com/1.mp3"));
        // No <published>, falls back to <updated>
        assert_eq!(
            entry.published,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_empty_channel() {
        let feed = parse_feed(
            br#"<?xml version="1.0"?><rss version="2.0"><channel><title>Quiet</title></channel></rss>"#,
        )
        .unwrap();
        assert!(feed.entries.is_empty());
    }

    #[test]
    fn test_malformed_document_is_error() {
        assert!(parse_feed(b"<not valid xml").is_err());
    }
}
