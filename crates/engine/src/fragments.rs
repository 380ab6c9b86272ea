//! Notes fragments: a menu of small text files swapped into the content
//! pane. Loads are memoized for the session; content is assumed static.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use homedeck_core::FragmentEntry;

use crate::links;

const FRAGMENT_EXTENSIONS: &[&str] = &["md", "txt", "html"];

pub struct FragmentStore {
    root: PathBuf,
    cache: RefCell<HashMap<String, String>>,
}

impl FragmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Menu entries from `menu.txt` (`<file> ["Title"]`, same quoting rules
    /// as the links files), else a directory scan of known extensions.
    pub fn menu(&self) -> Vec<FragmentEntry> {
        if let Ok(text) = fs::read_to_string(self.root.join("menu.txt")) {
            let entries = menu_from_listing(&text);
            if !entries.is_empty() {
                return entries;
            }
        }
        self.scan_menu()
    }

    fn scan_menu(&self) -> Vec<FragmentEntry> {
        let Ok(read_dir) = fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = read_dir
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let ext = path.extension()?.to_str()?.to_ascii_lowercase();
                if !FRAGMENT_EXTENSIONS.contains(&ext.as_str()) {
                    return None;
                }
                path.file_name()?.to_str().map(String::from)
            })
            .collect();
        names.sort();
        names
            .into_iter()
            .map(|name| FragmentEntry {
                title: title_from_name(&name),
                path: name,
            })
            .collect()
    }

    /// Fragment text by menu path, served from the cache after first load.
    pub fn load(&self, path: &str) -> anyhow::Result<String> {
        if let Some(hit) = self.cache.borrow().get(path) {
            return Ok(hit.clone());
        }
        let file = self.root.join(path);
        let text = fs::read_to_string(&file)
            .with_context(|| format!("read fragment {}", file.display()))?;
        self.cache
            .borrow_mut()
            .insert(path.to_string(), text.clone());
        Ok(text)
    }
}

fn menu_from_listing(text: &str) -> Vec<FragmentEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut tokens = links::split_tokens(line).into_iter();
            let path = tokens.next()?;
            let title = tokens
                .next()
                .unwrap_or_else(|| title_from_name(&path));
            Some(FragmentEntry { path, title })
        })
        .collect()
}

fn title_from_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    stem.replace(['-', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn menu_listing_wins_over_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("menu.txt"), "about.md \"About Me\"\nlab.md\n").unwrap();
        fs::write(dir.path().join("zzz.md"), "ignored").unwrap();

        let store = FragmentStore::new(dir.path());
        let menu = store.menu();
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].title, "About Me");
        assert_eq!(menu[1].title, "lab");
    }

    #[test]
    fn scan_orders_by_name_and_prettifies_titles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b-notes.md"), "b").unwrap();
        fs::write(dir.path().join("a_first.txt"), "a").unwrap();
        fs::write(dir.path().join("skip.png"), "x").unwrap();

        let store = FragmentStore::new(dir.path());
        let menu = store.menu();
        let titles: Vec<&str> = menu.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["a first", "b notes"]);
    }

    #[test]
    fn load_is_memoized_for_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("note.md");
        fs::write(&file, "first").unwrap();

        let store = FragmentStore::new(dir.path());
        assert_eq!(store.load("note.md").unwrap(), "first");

        fs::write(&file, "second").unwrap();
        // Still the cached copy; the cache is never invalidated.
        assert_eq!(store.load("note.md").unwrap(), "first");
    }

    #[test]
    fn missing_fragment_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FragmentStore::new(dir.path());
        assert!(store.load("absent.md").is_err());
    }
}
