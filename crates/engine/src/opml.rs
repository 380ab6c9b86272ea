//! OPML feed-list parsing.

use homedeck_core::FeedSource;

/// Every `outline` carrying an `xmlUrl` becomes a source. The title falls
/// back from `title` to `text` to the literal "Feed". A document that does
/// not parse yields no sources.
pub fn parse(text: &str) -> Vec<FeedSource> {
    let doc = match roxmltree::Document::parse(text) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!("unparseable OPML: {err}");
            return Vec::new();
        }
    };

    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "outline")
        .filter_map(|node| {
            let xml_url = node.attribute("xmlUrl")?;
            let title = node
                .attribute("title")
                .or_else(|| node.attribute("text"))
                .unwrap_or("Feed");
            Some(FeedSource {
                title: title.to_string(),
                xml_url: xml_url.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="1.0">
  <head><title>feeds</title></head>
  <body>
    <outline text="Tech">
      <outline title="Lobsters" text="lobste.rs" xmlUrl="https://lobste.rs/rss"/>
      <outline text="HN" xmlUrl="https://news.ycombinator.com/rss"/>
    </outline>
    <outline xmlUrl="https://blog.example.com/feed.xml"/>
  </body>
</opml>"#;

    #[test]
    fn outlines_with_xml_url_become_sources() {
        let sources = parse(OPML);
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].title, "Lobsters");
        assert_eq!(sources[0].xml_url, "https://lobste.rs/rss");
    }

    #[test]
    fn title_falls_back_text_then_feed() {
        let sources = parse(OPML);
        assert_eq!(sources[1].title, "HN");
        assert_eq!(sources[2].title, "Feed");
    }

    #[test]
    fn grouping_outlines_without_url_are_skipped() {
        let sources = parse(OPML);
        assert!(sources.iter().all(|s| !s.xml_url.is_empty()));
    }

    #[test]
    fn malformed_document_yields_nothing() {
        assert!(parse("<opml><body>").is_empty());
        assert!(parse("").is_empty());
    }
}
