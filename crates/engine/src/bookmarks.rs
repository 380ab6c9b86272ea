//! Netscape bookmark export parsing.
//!
//! A folder is a `DT` whose direct child is an `H3`; its contents are the
//! nearest `DL`, which sits either inside that `DT` or as the next sibling.
//! Same-level siblings are treated uniformly at every depth.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use homedeck_core::BookmarkNode;

use crate::markup::{self, Element};

/// Export filenames tried when `index.txt` names none, after today's date.
const FALLBACK_NAMES: &[&str] = &[
    "bookmarks.html",
    "Bookmarks.html",
    "firefox-bookmarks.html",
    "chrome-bookmarks.html",
    "export.html",
];

/// Parse an export into a tree rooted at a synthetic "Bookmarks" folder.
/// A document without any list still yields whatever absolute links it has.
pub fn parse_export(html: &str) -> BookmarkNode {
    let doc = markup::parse(html);
    let children = match first_list(&doc) {
        Some(dl) => parse_list(dl),
        None => loose_links(&doc),
    };
    BookmarkNode::root(children)
}

/// Pick the export file to load: `index.txt` entries first, else a
/// today's-date name followed by the common export names. First existing
/// file wins; none found is a valid empty state, not an error.
pub fn discover_export(dir: &Path, today: NaiveDate) -> Option<PathBuf> {
    let mut candidates: Vec<String> = Vec::new();
    if let Ok(index) = fs::read_to_string(dir.join("index.txt")) {
        candidates = index
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
    }
    if candidates.is_empty() {
        candidates.push(format!("{}.html", today.format("%Y-%m-%d")));
        candidates.extend(FALLBACK_NAMES.iter().map(|name| name.to_string()));
    }

    candidates
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn parse_list(dl: &Element) -> Vec<BookmarkNode> {
    let container = item_container(dl);
    let mut out = Vec::new();
    for item in container.child_elements().filter(|el| el.name == "dt") {
        if let Some(heading) = folder_heading(item) {
            let children = nested_list(container, item)
                .map(parse_list)
                .unwrap_or_default();
            out.push(BookmarkNode::folder(heading.text(), children));
        } else if let Some(link) = item_link(item) {
            out.push(link);
        }
        // A DT with neither heading nor usable anchor is dropped silently.
    }
    out
}

/// Items hang off the list's wrapping `P` when it has any; exporters also
/// emit an empty `P`, in which case the items are direct list children.
fn item_container(dl: &Element) -> &Element {
    match dl.find_child("p") {
        Some(p) if p.child_elements().any(|el| el.name == "dt") => p,
        _ => dl,
    }
}

fn folder_heading(dt: &Element) -> Option<&Element> {
    dt.find_child("h3")
}

/// A folder's list is a child of its own `DT`, or failing that the next
/// element sibling of the `DT`, checked in that order.
fn nested_list<'a>(container: &'a Element, dt: &'a Element) -> Option<&'a Element> {
    if let Some(inner) = dt.find_child("dl") {
        return Some(inner);
    }
    next_sibling_list(container, dt)
}

fn next_sibling_list<'a>(container: &'a Element, dt: &'a Element) -> Option<&'a Element> {
    let mut seen = false;
    for el in container.child_elements() {
        if seen {
            return (el.name == "dl").then_some(el);
        }
        if std::ptr::eq(el, dt) {
            seen = true;
        }
    }
    None
}

fn item_link(dt: &Element) -> Option<BookmarkNode> {
    let anchor = dt.find_child("a")?;
    let url = anchor.attr("href")?;
    if !is_http(url) {
        return None;
    }
    let mut name = anchor.text();
    if name.is_empty() {
        name = url.to_string();
    }
    Some(BookmarkNode::link(name, url))
}

/// No list structure at all: keep any absolute links the document carries.
fn loose_links(doc: &Element) -> Vec<BookmarkNode> {
    doc.descendants()
        .into_iter()
        .filter(|el| el.name == "a")
        .filter_map(|anchor| {
            let url = anchor.attr("href")?;
            if !is_http(url) {
                return None;
            }
            let mut name = anchor.text();
            if name.is_empty() {
                name = url.to_string();
            }
            Some(BookmarkNode::link(name, url))
        })
        .collect()
}

fn first_list(root: &Element) -> Option<&Element> {
    root.descendants().into_iter().find(|el| el.name == "dl")
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks Menu</H1>
<DL><p>
    <DT><H3>Dev</H3>
    <DL><p>
        <DT><A HREF="https://crates.io">crates.io</A>
        <DT><H3>Docs</H3>
        <DL><p>
            <DT><A HREF="https://doc.rust-lang.org">The Book</A>
            <DT><A HREF="ftp://old.example.com">old mirror</A>
        </DL><p>
    </DL><p>
    <DT><A HREF="https://news.ycombinator.com">HN</A>
    <DT><A HREF="javascript:void(0)">bookmarklet</A>
</DL>
"#;

    #[test]
    fn parses_nested_folders_and_root_links() {
        let tree = parse_export(EXPORT);
        assert_eq!(tree.name(), "Bookmarks");
        let children = tree.children();
        assert_eq!(children.len(), 2);

        let dev = &children[0];
        assert_eq!(dev.name(), "Dev");
        assert!(dev.is_folder());
        assert_eq!(dev.children().len(), 2);

        let docs = &dev.children()[1];
        assert_eq!(docs.name(), "Docs");
        // The ftp link is dropped, not an error.
        assert_eq!(docs.children().len(), 1);

        assert_eq!(children[1].name(), "HN");
        assert!(!children[1].is_folder());
    }

    #[test]
    fn non_http_links_are_dropped_silently() {
        let tree = parse_export(EXPORT);
        assert_eq!(tree.link_count(), 3);
    }

    #[test]
    fn sibling_list_placement_is_found() {
        let tree = parse_export(
            "<DL><p>\
             <DT><H3>F</H3></DT>\
             <DL><p><DT><A HREF=\"https://inner.example\">inner</A></DL>\
             </DL>",
        );
        let folder = &tree.children()[0];
        assert_eq!(folder.name(), "F");
        assert_eq!(folder.link_count(), 1);
    }

    #[test]
    fn empty_wrapping_paragraph_falls_back_to_list_children() {
        let tree = parse_export(
            "<DL><p></p>\
             <DT><A HREF=\"https://a.example\">a</A>\
             </DL>",
        );
        assert_eq!(tree.link_count(), 1);
    }

    #[test]
    fn document_without_folders_keeps_loose_links() {
        let tree = parse_export(
            "<DT><A HREF=\"https://a.example\">a</A>\
             <DT><A HREF=\"mailto:me@example.com\">mail</A>",
        );
        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.children()[0].name(), "a");
    }

    #[test]
    fn empty_document_yields_empty_tree() {
        let tree = parse_export("");
        assert!(tree.children().is_empty());
        assert_eq!(tree.link_count(), 0);
    }

    #[test]
    fn nameless_link_uses_its_url() {
        let tree = parse_export("<DL><p><DT><A HREF=\"https://a.example\"></A></DL>");
        assert_eq!(tree.children()[0].name(), "https://a.example");
    }

    #[test]
    fn discover_prefers_index_listing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.txt"), "# exports\ncustom.html\n").unwrap();
        fs::write(dir.path().join("custom.html"), "<DL></DL>").unwrap();
        fs::write(dir.path().join("bookmarks.html"), "<DL></DL>").unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let found = discover_export(dir.path(), today).unwrap();
        assert_eq!(found.file_name().unwrap(), "custom.html");
    }

    #[test]
    fn discover_tries_dated_name_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2024-05-01.html"), "<DL></DL>").unwrap();
        fs::write(dir.path().join("bookmarks.html"), "<DL></DL>").unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let found = discover_export(dir.path(), today).unwrap();
        assert_eq!(found.file_name().unwrap(), "2024-05-01.html");
    }

    #[test]
    fn discover_returns_none_when_nothing_exists() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(discover_export(dir.path(), today).is_none());
    }
}
