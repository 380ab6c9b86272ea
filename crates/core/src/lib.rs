//! Core domain types for homedeck.

use serde::{Deserialize, Serialize};

/// One entry of a links file: a URL, what to label it, and an optional
/// local icon name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub display_name: String,
    pub image_path: String,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
            image_path: String::new(),
        }
    }
}

/// A node of the imported bookmark tree. Built once per load and held
/// immutably; navigation tracks a path of child indices into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkNode {
    Folder {
        name: String,
        children: Vec<BookmarkNode>,
    },
    Link {
        name: String,
        url: String,
    },
}

impl BookmarkNode {
    pub fn root(children: Vec<BookmarkNode>) -> Self {
        BookmarkNode::Folder {
            name: "Bookmarks".to_string(),
            children,
        }
    }

    pub fn folder(name: impl Into<String>, children: Vec<BookmarkNode>) -> Self {
        BookmarkNode::Folder {
            name: name.into(),
            children,
        }
    }

    pub fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        BookmarkNode::Link {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BookmarkNode::Folder { name, .. } | BookmarkNode::Link { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, BookmarkNode::Folder { .. })
    }

    /// Children of a folder; a link has none.
    pub fn children(&self) -> &[BookmarkNode] {
        match self {
            BookmarkNode::Folder { children, .. } => children,
            BookmarkNode::Link { .. } => &[],
        }
    }

    /// Number of link leaves reachable by depth-first traversal.
    pub fn link_count(&self) -> usize {
        match self {
            BookmarkNode::Link { .. } => 1,
            BookmarkNode::Folder { children, .. } => {
                children.iter().map(BookmarkNode::link_count).sum()
            }
        }
    }

    /// Every link leaf as a flat list, depth-first.
    pub fn flatten(&self) -> Vec<LinkRecord> {
        let mut out = Vec::new();
        self.collect_links(&mut out);
        out
    }

    fn collect_links(&self, out: &mut Vec<LinkRecord>) {
        match self {
            BookmarkNode::Link { name, url } => out.push(LinkRecord::new(url, name)),
            BookmarkNode::Folder { children, .. } => {
                for child in children {
                    child.collect_links(out);
                }
            }
        }
    }
}

/// Which start-page surface is active. Exactly one at a time; every
/// transition goes through `AppContext::enter_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Grid,
    Search,
    BookmarkBrowse,
    BookmarkSearch,
    Rss,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Grid,
        Mode::Search,
        Mode::BookmarkBrowse,
        Mode::BookmarkSearch,
        Mode::Rss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Grid => "grid",
            Mode::Search => "search",
            Mode::BookmarkBrowse => "bookmarks",
            Mode::BookmarkSearch => "bookmark-search",
            Mode::Rss => "rss",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which item collection the keyboard cursor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelId {
    PrimaryGrid,
    SidePanel,
}

/// Keyboard selection. Only meaningful while navigation is enabled; the
/// index is clamped to the active collection on every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCursor {
    pub panel: PanelId,
    pub index: usize,
}

impl SelectionCursor {
    pub fn grid() -> Self {
        Self {
            panel: PanelId::PrimaryGrid,
            index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub feed_item_limit: usize,
    pub search_url: String,
    pub chat_url: String,
}

pub const DEFAULT_SEARCH_URL: &str = "https://duckduckgo.com/?q=";

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            feed_item_limit: 100,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            chat_url: String::new(),
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        self.feed_item_limit = self.feed_item_limit.clamp(1, 500);
        if self.search_url.trim().is_empty() {
            self.search_url = DEFAULT_SEARCH_URL.to_string();
        }
        self.search_url = self.search_url.trim().to_string();
        self.chat_url = self.chat_url.trim().to_string();
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }
}

/// One `outline` of the OPML feed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub title: String,
    pub xml_url: String,
}

/// One aggregated feed entry. `published` is unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: i64,
    pub feed_title: String,
}

/// A notes-navigator history entry: which fragment, and the title that was
/// shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentEntry {
    pub path: String,
    pub title: String,
}
