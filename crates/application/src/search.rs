//! Fuzzy search over app links, panel links, and bookmarks.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use homedeck_core::LinkRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchHit {
    Link(LinkRecord),
    /// The pseudo-entry that jumps to the feed reader.
    FeedEntry,
}

pub struct Searcher {
    matcher: SkimMatcherV2,
}

impl Searcher {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
        }
    }

    /// App and panel links first; a non-empty query with zero app matches
    /// falls through to the flat bookmark list. The feed pseudo-entry is
    /// appended whenever the query is a fragment of "feed" or "rss".
    pub fn search(
        &self,
        links: &[LinkRecord],
        panel_links: &[LinkRecord],
        bookmarks: &[LinkRecord],
        query: &str,
    ) -> Vec<SearchHit> {
        let query = query.trim().to_lowercase();

        let mut hits: Vec<SearchHit> = if query.is_empty() {
            links
                .iter()
                .chain(panel_links)
                .cloned()
                .map(SearchHit::Link)
                .collect()
        } else {
            let mut matched = self.rank(links.iter().chain(panel_links), &query);
            if matched.is_empty() {
                matched = self.rank(bookmarks.iter(), &query);
            }
            matched.into_iter().map(SearchHit::Link).collect()
        };

        if "feed".contains(&query) || "rss".contains(&query) {
            hits.push(SearchHit::FeedEntry);
        }
        hits
    }

    /// Bookmark-search mode: every bookmark when the query is empty, ranked
    /// matches otherwise.
    pub fn filter_links(&self, links: &[LinkRecord], query: &str) -> Vec<LinkRecord> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return links.to_vec();
        }
        self.rank(links.iter(), &query)
    }

    fn rank<'a>(
        &self,
        records: impl Iterator<Item = &'a LinkRecord>,
        query: &str,
    ) -> Vec<LinkRecord> {
        let mut scored: Vec<(i64, &LinkRecord)> = records
            .filter_map(|record| self.score(record, query).map(|score| (score, record)))
            .collect();
        scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));
        scored.into_iter().map(|(_, record)| record.clone()).collect()
    }

    fn score(&self, record: &LinkRecord, query: &str) -> Option<i64> {
        let name = self.matcher.fuzzy_match(&record.display_name, query);
        let url = self.matcher.fuzzy_match(&record.url, query);
        name.max(url)
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str, name: &str) -> LinkRecord {
        LinkRecord::new(url, name)
    }

    fn apps() -> Vec<LinkRecord> {
        vec![
            link("https://mail.example.com", "Mail"),
            link("https://calendar.example.com", "Calendar"),
        ]
    }

    #[test]
    fn empty_query_lists_app_then_panel_links() {
        let searcher = Searcher::new();
        let hits = searcher.search(
            &apps(),
            &[link("https://panel.example", "Panel")],
            &[],
            "",
        );
        // All links plus the feed pseudo-entry (an empty query is a fragment
        // of everything).
        assert_eq!(hits.len(), 4);
        assert!(matches!(&hits[0], SearchHit::Link(l) if l.display_name == "Mail"));
        assert!(matches!(hits.last(), Some(SearchHit::FeedEntry)));
    }

    #[test]
    fn name_match_ranks_results() {
        let searcher = Searcher::new();
        let hits = searcher.search(&apps(), &[], &[], "cal");
        assert!(
            matches!(&hits[0], SearchHit::Link(l) if l.display_name == "Calendar"),
            "got {hits:?}"
        );
    }

    #[test]
    fn zero_app_matches_fall_through_to_bookmarks() {
        let searcher = Searcher::new();
        let bookmarks = vec![link("https://wiki.example.com", "Team wiki")];
        let hits = searcher.search(&apps(), &[], &bookmarks, "wiki");
        assert_eq!(hits.len(), 1);
        assert!(matches!(&hits[0], SearchHit::Link(l) if l.display_name == "Team wiki"));
    }

    #[test]
    fn bookmarks_stay_out_of_results_when_apps_match() {
        let searcher = Searcher::new();
        let bookmarks = vec![link("https://mail.bookmark.example", "Mail archive")];
        let hits = searcher.search(&apps(), &[], &bookmarks, "mail");
        assert!(
            hits.iter().all(|hit| match hit {
                SearchHit::Link(l) => l.url != "https://mail.bookmark.example",
                SearchHit::FeedEntry => true,
            }),
            "bookmarks leaked into app results: {hits:?}"
        );
    }

    #[test]
    fn feed_fragment_appends_the_pseudo_entry() {
        let searcher = Searcher::new();
        let hits = searcher.search(&[], &[], &[], "fee");
        assert_eq!(hits, vec![SearchHit::FeedEntry]);
        let hits = searcher.search(&[], &[], &[], "rs");
        assert_eq!(hits, vec![SearchHit::FeedEntry]);
        let hits = searcher.search(&[], &[], &[], "xyzzy");
        assert!(hits.is_empty());
    }

    #[test]
    fn filter_links_with_empty_query_returns_everything() {
        let searcher = Searcher::new();
        let all = vec![link("https://a", "a"), link("https://b", "b")];
        assert_eq!(searcher.filter_links(&all, ""), all);
        assert_eq!(searcher.filter_links(&all, "a").len(), 1);
    }
}
