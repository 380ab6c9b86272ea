//! Test helpers and fixtures.

use homedeck_core::{BookmarkNode, Settings, Theme};

pub fn make_settings(feed_item_limit: usize) -> Settings {
    Settings {
        theme: Theme::Dark,
        feed_item_limit,
        search_url: "https://duckduckgo.com/?q=".to_string(),
        chat_url: String::new(),
    }
}

/// A bookmark tree with a folder chain `depth` levels deep and
/// `links_per_folder` links at every level (root included): exactly
/// `links_per_folder * (depth + 1)` link leaves in total.
pub fn nested_tree(depth: usize, links_per_folder: usize) -> BookmarkNode {
    fn build(level: usize, depth: usize, links: usize) -> Vec<BookmarkNode> {
        let mut children: Vec<BookmarkNode> = (0..links)
            .map(|i| {
                BookmarkNode::link(
                    format!("link-{level}-{i}"),
                    format!("https://example.com/{level}/{i}"),
                )
            })
            .collect();
        if level < depth {
            children.push(BookmarkNode::folder(
                format!("folder-{}", level + 1),
                build(level + 1, depth, links),
            ));
        }
        children
    }
    BookmarkNode::root(build(0, depth, links_per_folder))
}

/// Render a tree the way browsers export it: unclosed `DT`s and the
/// `<DL><p>` / `</DL><p>` idiom.
pub fn render_export(tree: &BookmarkNode) -> String {
    let mut out = String::from(
        "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n<TITLE>Bookmarks</TITLE>\n<H1>Bookmarks</H1>\n",
    );
    render_list(tree.children(), &mut out);
    out
}

fn render_list(children: &[BookmarkNode], out: &mut String) {
    out.push_str("<DL><p>\n");
    for child in children {
        match child {
            BookmarkNode::Folder { name, children } => {
                out.push_str("<DT><H3>");
                out.push_str(&escape(name));
                out.push_str("</H3>\n");
                render_list(children, out);
            }
            BookmarkNode::Link { name, url } => {
                out.push_str("<DT><A HREF=\"");
                out.push_str(&escape(url));
                out.push_str("\">");
                out.push_str(&escape(name));
                out.push_str("</A>\n");
            }
        }
    }
    out.push_str("</DL><p>\n");
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use homedeck_application::{SearchHit, Searcher};
    use homedeck_engine::{bookmarks, links};

    #[test]
    fn builds_settings() {
        let settings = make_settings(12);
        assert_eq!(settings.feed_item_limit, 12);
    }

    fn round_trip(depth: usize, links_per_folder: usize) {
        let tree = nested_tree(depth, links_per_folder);
        let expected = links_per_folder * (depth + 1);
        assert_eq!(tree.link_count(), expected);

        let export = render_export(&tree);
        let parsed = bookmarks::parse_export(&export);
        assert_eq!(parsed.link_count(), expected, "depth {depth}");
    }

    #[test]
    fn export_round_trips_at_depth_one() {
        round_trip(1, 4);
    }

    #[test]
    fn export_round_trips_at_depth_two() {
        round_trip(2, 3);
    }

    #[test]
    fn export_round_trips_at_depth_five() {
        round_trip(5, 2);
    }

    #[test]
    fn round_trip_preserves_structure_exactly() {
        let tree = nested_tree(2, 2);
        let parsed = bookmarks::parse_export(&render_export(&tree));
        assert_eq!(parsed, tree);
    }

    #[test]
    fn names_with_markup_characters_survive_the_round_trip() {
        let tree = BookmarkNode::root(vec![BookmarkNode::link(
            "Q&A <tips> \"quoted\"",
            "https://example.com/?a=1&b=2",
        )]);
        let parsed = bookmarks::parse_export(&render_export(&tree));
        assert_eq!(parsed, tree);
    }

    #[test]
    fn link_file_scenario_from_two_lines() {
        let records = links::parse_links("https://example.com \"Example\" \nhttps://noname.org");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://example.com");
        assert_eq!(records[0].display_name, "Example");
        assert_eq!(records[0].image_path, "");
        assert_eq!(records[1].url, "https://noname.org");
        assert_eq!(records[1].display_name, "noname");
        assert_eq!(records[1].image_path, "");
    }

    #[test]
    fn query_missing_every_app_link_falls_through_to_bookmarks() {
        let apps = links::parse_links("https://mail.example.com \"Mail\"");
        let tree = bookmarks::parse_export(
            "<DL><p><DT><A HREF=\"https://wiki.example.com\">Team wiki</A></DL>",
        );
        let flat = tree.flatten();

        let searcher = Searcher::new();
        let hits = searcher.search(&apps, &[], &flat, "wiki");
        assert_eq!(hits.len(), 1);
        assert!(matches!(&hits[0], SearchHit::Link(l) if l.display_name == "Team wiki"));
    }
}
