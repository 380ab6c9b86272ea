//! Sqlite-backed persistence for settings and visited feed items.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context as _;
use homedeck_core::{Settings, Theme};
use rusqlite::{Connection, OptionalExtension as _};

pub mod remote;

pub use remote::{RemoteVisited, VisitedSync};

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                theme TEXT NOT NULL,
                feed_item_limit INTEGER NOT NULL,
                search_url TEXT NOT NULL,
                chat_url TEXT NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, theme, feed_item_limit, search_url, chat_url)
            VALUES (1, 'dark', 100, 'https://duckduckgo.com/?q=', '');

            CREATE TABLE IF NOT EXISTS visited (
                url TEXT PRIMARY KEY,
                visited_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;
        Ok(())
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT theme, feed_item_limit, search_url, chat_url FROM settings WHERE id = 1",
                [],
                |row| {
                    let theme: String = row.get(0)?;
                    let feed_item_limit: i64 = row.get(1)?;
                    let search_url: String = row.get(2)?;
                    let chat_url: String = row.get(3)?;
                    Ok((theme, feed_item_limit, search_url, chat_url))
                },
            )
            .optional()?;

        let defaults = Settings::default();
        let (theme, feed_item_limit, search_url, chat_url) = match row {
            Some(value) => value,
            None => {
                return Ok(defaults);
            }
        };

        let mut settings = Settings {
            theme: theme.parse::<Theme>().unwrap_or(defaults.theme),
            feed_item_limit: usize::try_from(feed_item_limit)
                .unwrap_or(defaults.feed_item_limit),
            search_url,
            chat_url,
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        self.conn.execute(
            "UPDATE settings SET theme = ?, feed_item_limit = ?, search_url = ?, chat_url = ? WHERE id = 1",
            (
                settings.theme.as_str(),
                settings.feed_item_limit as i64,
                &settings.search_url,
                &settings.chat_url,
            ),
        )?;
        Ok(())
    }

    pub fn list_visited(&self) -> anyhow::Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT url FROM visited")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<HashSet<_>, _>>()?)
    }

    pub fn mark_visited(&self, url: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO visited (url) VALUES (?)",
            [url],
        )?;
        Ok(())
    }

    /// Fold a fetched remote copy into the local mirror.
    pub fn merge_visited(&self, urls: &[String]) -> anyhow::Result<()> {
        for url in urls {
            self.mark_visited(url)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_in_memory() -> anyhow::Result<Storage> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn };
        storage.migrate()?;
        Ok(storage)
    }

    #[test]
    fn settings_roundtrip() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let mut settings = storage.load_settings()?;
        settings.theme = Theme::Light;
        settings.feed_item_limit = 25;
        settings.search_url = "https://search.example/?q=".to_string();
        settings.chat_url = "https://chat.example/?q=".to_string();
        storage.save_settings(&settings)?;

        let settings2 = storage.load_settings()?;
        assert_eq!(settings2, settings);
        Ok(())
    }

    #[test]
    fn fresh_db_loads_defaults() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        let settings = storage.load_settings()?;
        assert_eq!(settings, Settings::default());
        Ok(())
    }

    #[test]
    fn visited_roundtrip_is_idempotent() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.mark_visited("https://a.example")?;
        storage.mark_visited("https://a.example")?;
        storage.mark_visited("https://b.example")?;

        let visited = storage.list_visited()?;
        assert_eq!(visited.len(), 2);
        assert!(visited.contains("https://a.example"));
        Ok(())
    }

    #[test]
    fn merge_folds_in_a_remote_copy() -> anyhow::Result<()> {
        let storage = open_in_memory()?;
        storage.mark_visited("https://local.example")?;
        storage.merge_visited(&[
            "https://remote.example".to_string(),
            "https://local.example".to_string(),
        ])?;

        let visited = storage.list_visited()?;
        assert_eq!(visited.len(), 2);
        Ok(())
    }
}
