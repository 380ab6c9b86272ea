//! Application state for homedeck: the mode state machine, bookmark
//! navigation, selection, and search results.

mod cursor;
mod history;
mod search;

use std::collections::HashSet;

use homedeck_core::{
    BookmarkNode, FeedItem, FeedSource, FragmentEntry, LinkRecord, Mode, PanelId, SelectionCursor,
    Settings,
};

pub use cursor::{Direction, infer_columns, move_cursor, step};
pub use history::FragmentHistory;
pub use search::{SearchHit, Searcher};

/// Everything the terminal can show. Each mode owns a disjoint set; the
/// active mode's surfaces are the only ones drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    LauncherGrid,
    SidePanel,
    SearchInput,
    SearchResults,
    BookmarkBrowser,
    BookmarkSearchInput,
    BookmarkSearchResults,
    FeedList,
}

pub fn visible_surfaces(mode: Mode) -> &'static [Surface] {
    match mode {
        Mode::Grid => &[Surface::LauncherGrid, Surface::SidePanel],
        Mode::Search => &[Surface::SearchInput, Surface::SearchResults],
        Mode::BookmarkBrowse => &[Surface::BookmarkBrowser],
        Mode::BookmarkSearch => &[
            Surface::BookmarkSearchInput,
            Surface::BookmarkSearchResults,
        ],
        Mode::Rss => &[Surface::FeedList],
    }
}

/// What pressing back in the bookmark browser did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Popped,
    Exited,
}

/// What activating an item should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    OpenUrl(String),
    OpenedFolder,
    EnterRss,
}

#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub links: Vec<LinkRecord>,
    pub panel_links: Vec<LinkRecord>,
    pub bookmark_tree: Option<BookmarkNode>,
    pub bookmark_links: Vec<LinkRecord>,
    pub feed_sources: Vec<FeedSource>,
    pub notes_menu: Vec<FragmentEntry>,
    pub background: Option<String>,

    pub mode: Mode,
    pub search_query: String,
    pub search_hits: Vec<SearchHit>,
    pub bookmark_query: String,
    pub bookmark_hits: Vec<LinkRecord>,
    /// Child-index path from the bookmark root to the open folder.
    pub nav_path: Vec<usize>,
    /// `None` while keyboard navigation is disabled.
    pub cursor: Option<SelectionCursor>,
    /// `None` until Rss mode is first entered; cached for the session after.
    pub feed_items: Option<Vec<FeedItem>>,
    pub feed_selected: usize,
    pub visited: HashSet<String>,
    pub dirty_visited: Vec<String>,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            links: Vec::new(),
            panel_links: Vec::new(),
            bookmark_tree: None,
            bookmark_links: Vec::new(),
            feed_sources: Vec::new(),
            notes_menu: Vec::new(),
            background: None,
            mode: Mode::Grid,
            search_query: String::new(),
            search_hits: Vec::new(),
            bookmark_query: String::new(),
            bookmark_hits: Vec::new(),
            nav_path: Vec::new(),
            cursor: None,
            feed_items: None,
            feed_selected: 0,
            visited: HashSet::new(),
            dirty_visited: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<LinkRecord>, panel_links: Vec<LinkRecord>) -> Self {
        self.links = links;
        self.panel_links = panel_links;
        self
    }

    pub fn with_bookmarks(mut self, tree: Option<BookmarkNode>) -> Self {
        self.bookmark_links = tree.as_ref().map(BookmarkNode::flatten).unwrap_or_default();
        self.bookmark_tree = tree;
        self
    }

    pub fn with_feed_sources(mut self, sources: Vec<FeedSource>) -> Self {
        self.feed_sources = sources;
        self
    }

    pub fn with_notes_menu(mut self, menu: Vec<FragmentEntry>) -> Self {
        self.notes_menu = menu;
        self
    }

    pub fn with_background(mut self, background: Option<String>) -> Self {
        self.background = background;
        self
    }

    pub fn with_visited(mut self, visited: HashSet<String>) -> Self {
        self.visited = visited;
        self
    }

    /// The one place a mode change happens. Disables keyboard navigation and
    /// resets every piece of state the target mode does not own, so no other
    /// mode's surface can survive the switch.
    fn apply(&mut self, mode: Mode) {
        self.cursor = None;
        if mode != Mode::Search {
            self.search_query.clear();
            self.search_hits.clear();
        }
        if mode != Mode::BookmarkSearch {
            self.bookmark_query.clear();
            self.bookmark_hits.clear();
        }
        // The folder path survives a detour through bookmark search.
        if !matches!(mode, Mode::BookmarkBrowse | Mode::BookmarkSearch) {
            self.nav_path.clear();
        }
        if mode != Mode::Rss {
            self.feed_selected = 0;
        }
        self.mode = mode;
    }

    /// Grid → Search. A triggering alphanumeric key seeds the query.
    pub fn enter_search(&mut self, seed: Option<char>) {
        self.apply(Mode::Search);
        if let Some(ch) = seed {
            self.search_query.push(ch);
        }
    }

    pub fn exit_search(&mut self) {
        self.apply(Mode::Grid);
    }

    /// Grid → BookmarkBrowse at the root. Returns false (leaving the mode
    /// unchanged) when no bookmark tree has loaded; callers log that and
    /// carry on.
    pub fn enter_browse(&mut self) -> bool {
        if self.bookmark_tree.is_none() {
            return false;
        }
        self.apply(Mode::BookmarkBrowse);
        self.nav_path.clear();
        true
    }

    pub fn exit_browse(&mut self) {
        self.apply(Mode::Grid);
    }

    /// BookmarkBrowse → BookmarkSearch; the open folder is kept so closing
    /// the search restores it.
    pub fn enter_bookmark_search(&mut self) {
        self.apply(Mode::BookmarkSearch);
    }

    pub fn exit_bookmark_search(&mut self) {
        self.apply(Mode::BookmarkBrowse);
    }

    pub fn enter_rss(&mut self) {
        self.apply(Mode::Rss);
    }

    pub fn exit_rss(&mut self) {
        self.apply(Mode::Grid);
    }

    /// The shared close control. Which mode it closes depends on what is
    /// active, checked in a fixed priority order: Rss, BookmarkSearch,
    /// BookmarkBrowse. Returns false when nothing was open.
    pub fn close_active(&mut self) -> bool {
        match self.mode {
            Mode::Rss => {
                self.exit_rss();
                true
            }
            Mode::BookmarkSearch => {
                self.exit_bookmark_search();
                true
            }
            Mode::BookmarkBrowse => {
                self.exit_browse();
                true
            }
            Mode::Search => {
                self.exit_search();
                true
            }
            Mode::Grid => false,
        }
    }

    /// The folder the browser is showing; the root when the path is empty.
    pub fn current_folder(&self) -> Option<&BookmarkNode> {
        let mut node = self.bookmark_tree.as_ref()?;
        for &index in &self.nav_path {
            node = node.children().get(index)?;
        }
        Some(node)
    }

    /// Descend into a folder child of the current folder.
    pub fn open_folder(&mut self, child_index: usize) -> bool {
        let is_folder = self
            .current_folder()
            .and_then(|folder| folder.children().get(child_index))
            .is_some_and(BookmarkNode::is_folder);
        if !is_folder {
            return false;
        }
        self.nav_path.push(child_index);
        self.cursor = None;
        true
    }

    /// Pop one folder level; popping past the root exits to Grid.
    pub fn go_back(&mut self) -> BackOutcome {
        if self.nav_path.pop().is_some() {
            self.cursor = None;
            BackOutcome::Popped
        } else {
            self.exit_browse();
            BackOutcome::Exited
        }
    }

    pub fn run_search(&mut self, searcher: &Searcher) {
        self.search_hits = searcher.search(
            &self.links,
            &self.panel_links,
            &self.bookmark_links,
            &self.search_query,
        );
    }

    pub fn run_bookmark_search(&mut self, searcher: &Searcher) {
        self.bookmark_hits = searcher.filter_links(&self.bookmark_links, &self.bookmark_query);
    }

    /// How many items the cursor can currently range over.
    pub fn collection_len(&self, panel: PanelId) -> usize {
        if panel == PanelId::SidePanel {
            return self.panel_links.len();
        }
        match self.mode {
            Mode::Grid => self.links.len(),
            Mode::Search => self.search_hits.len(),
            Mode::BookmarkBrowse => self
                .current_folder()
                .map(|folder| folder.children().len())
                .unwrap_or(0),
            Mode::BookmarkSearch => self.bookmark_hits.len(),
            Mode::Rss => self.feed_items.as_ref().map(Vec::len).unwrap_or(0),
        }
    }

    /// Resolve what activating item `index` of `panel` means in the active
    /// mode. Folder entry happens here; URLs are returned for the caller to
    /// open.
    pub fn activate(&mut self, panel: PanelId, index: usize) -> Option<Activation> {
        if panel == PanelId::SidePanel {
            return self
                .panel_links
                .get(index)
                .map(|link| Activation::OpenUrl(link.url.clone()));
        }
        match self.mode {
            Mode::Grid => self
                .links
                .get(index)
                .map(|link| Activation::OpenUrl(link.url.clone())),
            Mode::Search => match self.search_hits.get(index)? {
                SearchHit::Link(record) => Some(Activation::OpenUrl(record.url.clone())),
                SearchHit::FeedEntry => Some(Activation::EnterRss),
            },
            Mode::BookmarkBrowse => {
                let child = self.current_folder()?.children().get(index)?;
                match child {
                    BookmarkNode::Folder { .. } => {
                        self.open_folder(index);
                        Some(Activation::OpenedFolder)
                    }
                    BookmarkNode::Link { url, .. } => Some(Activation::OpenUrl(url.clone())),
                }
            }
            Mode::BookmarkSearch => self
                .bookmark_hits
                .get(index)
                .map(|link| Activation::OpenUrl(link.url.clone())),
            Mode::Rss => None,
        }
    }

    pub fn mark_visited(&mut self, url: &str) {
        if self.visited.insert(url.to_string()) {
            self.dirty_visited.push(url.to_string());
        }
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }
}
