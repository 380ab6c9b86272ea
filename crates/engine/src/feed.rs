//! RSS 2.0 / Atom item parsing.

use chrono::DateTime;
use homedeck_core::FeedItem;
use roxmltree::{Document, Node};

/// Parse one fetched feed document. `fallback_title` labels items when the
/// feed omits its own title; `now` stands in for a missing or unparseable
/// publication date. Items without a link are dropped.
pub fn parse_items(xml: &str, fallback_title: &str, now: i64) -> Vec<FeedItem> {
    let doc = match Document::parse(xml) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(feed = fallback_title, "unparseable feed: {err}");
            return Vec::new();
        }
    };

    let root = doc.root_element();
    match root.tag_name().name() {
        "rss" => parse_rss(root, fallback_title, now),
        "feed" => parse_atom(root, fallback_title, now),
        other => {
            tracing::warn!(feed = fallback_title, "unknown feed root element <{other}>");
            Vec::new()
        }
    }
}

fn parse_rss(root: Node<'_, '_>, fallback_title: &str, now: i64) -> Vec<FeedItem> {
    let Some(channel) = named_children(root, "channel").next() else {
        return Vec::new();
    };
    let feed_title = child_text(channel, "title").unwrap_or_else(|| fallback_title.to_string());

    named_children(channel, "item")
        .filter_map(|item| {
            let link = child_text(item, "link")?;
            Some(FeedItem {
                title: child_text(item, "title").unwrap_or_else(|| "Untitled".to_string()),
                link,
                published: child_text(item, "pubDate")
                    .and_then(|date| parse_date(&date))
                    .unwrap_or(now),
                feed_title: feed_title.clone(),
            })
        })
        .collect()
}

fn parse_atom(root: Node<'_, '_>, fallback_title: &str, now: i64) -> Vec<FeedItem> {
    let feed_title = child_text(root, "title").unwrap_or_else(|| fallback_title.to_string());

    named_children(root, "entry")
        .filter_map(|entry| {
            let link = atom_link(entry)?;
            let date = child_text(entry, "published").or_else(|| child_text(entry, "updated"));
            Some(FeedItem {
                title: child_text(entry, "title").unwrap_or_else(|| "Untitled".to_string()),
                link,
                published: date.and_then(|date| parse_date(&date)).unwrap_or(now),
                feed_title: feed_title.clone(),
            })
        })
        .collect()
}

/// Atom entries carry several `link` elements; prefer the alternate one.
fn atom_link(entry: Node<'_, '_>) -> Option<String> {
    let links: Vec<Node<'_, '_>> = named_children(entry, "link").collect();
    links
        .iter()
        .find(|link| matches!(link.attribute("rel"), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|link| link.attribute("href"))
        .map(str::to_string)
}

/// Children matched by local name, so a default xmlns (Atom) or prefixed
/// extensions (`atom:link` inside RSS) do not hide elements.
fn named_children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn child_text(node: Node<'_, '_>, name: &'static str) -> Option<String> {
    named_children(node, name).find_map(|child| {
        let text = child.text()?.trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    })
}

/// Feeds in the wild use RFC 2822 (RSS) and RFC 3339 (Atom) dates about
/// interchangeably; accept both.
fn parse_date(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|date| date.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Example Blog</title>
    <atom:link href="https://blog.example.com/feed" rel="self"/>
    <item>
      <title>First post</title>
      <link>https://blog.example.com/1</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <link>https://blog.example.com/2</link>
    </item>
    <item>
      <title>No link, dropped</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <entry>
    <title>Entry</title>
    <link rel="self" href="https://feed.example.com/self"/>
    <link rel="alternate" href="https://feed.example.com/entry"/>
    <updated>2024-01-02T10:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_parse_with_dates() {
        let items = parse_items(RSS, "fallback", 42);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First post");
        assert_eq!(items[0].feed_title, "Example Blog");
        assert_eq!(items[0].published, 1704189600);
    }

    #[test]
    fn missing_title_and_date_get_defaults() {
        let items = parse_items(RSS, "fallback", 42);
        assert_eq!(items[1].title, "Untitled");
        assert_eq!(items[1].published, 42);
    }

    #[test]
    fn atom_feed_with_default_namespace_parses() {
        let items = parse_items(ATOM, "fallback", 0);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].feed_title, "Atom Feed");
    }

    #[test]
    fn atom_prefers_alternate_link() {
        let items = parse_items(ATOM, "fallback", 0);
        assert_eq!(items[0].link, "https://feed.example.com/entry");
        assert_eq!(items[0].published, 1704189600);
    }

    #[test]
    fn unknown_root_yields_nothing() {
        assert!(parse_items("<html></html>", "x", 0).is_empty());
        assert!(parse_items("not xml", "x", 0).is_empty());
    }
}
