//! Best-effort mirror of the visited list on a remote JSON document.
//!
//! The document is a plain JSON array of URLs behind basic auth. Reads
//! prefer the remote copy when reachable; writes try the remote first and
//! then hit the local store unconditionally, so a remote failure never
//! loses the record.

use std::collections::HashSet;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::Storage;

const SYNC_URL_VAR: &str = "HOMEDECK_SYNC_URL";
const SYNC_USER_VAR: &str = "HOMEDECK_SYNC_USER";
const SYNC_PASSWORD_VAR: &str = "HOMEDECK_SYNC_PASSWORD";

pub struct RemoteVisited {
    url: String,
    auth: Option<String>,
}

impl RemoteVisited {
    pub fn new(url: impl Into<String>, user: &str, password: &str) -> Self {
        let auth = if user.is_empty() && password.is_empty() {
            None
        } else {
            let credentials = STANDARD.encode(format!("{user}:{password}"));
            Some(format!("Basic {credentials}"))
        };
        Self {
            url: url.into(),
            auth,
        }
    }

    /// Credentials come from the environment, never from source. No URL set
    /// means the local tier runs alone.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(SYNC_URL_VAR).ok()?;
        if url.trim().is_empty() {
            return None;
        }
        let user = std::env::var(SYNC_USER_VAR).unwrap_or_default();
        let password = std::env::var(SYNC_PASSWORD_VAR).unwrap_or_default();
        Some(Self::new(url.trim(), &user, &password))
    }

    pub fn fetch(&self) -> anyhow::Result<Vec<String>> {
        let body = self
            .request(ureq::get(&self.url))
            .call()
            .context("fetch remote visited list")?
            .into_string()
            .context("read remote visited list")?;
        serde_json::from_str(&body).context("decode remote visited list")
    }

    pub fn push(&self, urls: &[String]) -> anyhow::Result<()> {
        let body = serde_json::to_string(urls).context("encode visited list")?;
        self.request(ureq::put(&self.url))
            .set("Content-Type", "application/json")
            .send_string(&body)
            .context("push remote visited list")?;
        Ok(())
    }

    fn request(&self, request: ureq::Request) -> ureq::Request {
        match &self.auth {
            Some(auth) => request.set("Authorization", auth),
            None => request,
        }
    }
}

pub struct VisitedSync {
    remote: Option<RemoteVisited>,
}

impl VisitedSync {
    pub fn new(remote: Option<RemoteVisited>) -> Self {
        Self { remote }
    }

    pub fn from_env() -> Self {
        Self::new(RemoteVisited::from_env())
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// The visited set for this session: the remote copy when reachable
    /// (folded into the local mirror), else whatever is stored locally.
    pub fn load(&self, storage: &Storage) -> HashSet<String> {
        if let Some(remote) = &self.remote {
            match remote.fetch() {
                Ok(urls) => {
                    if let Err(err) = storage.merge_visited(&urls) {
                        tracing::warn!("mirror remote visited list locally: {err:#}");
                    }
                    return urls.into_iter().collect();
                }
                Err(err) => {
                    tracing::warn!("remote visited list unreachable: {err:#}");
                }
            }
        }
        storage.list_visited().unwrap_or_else(|err| {
            tracing::warn!("load local visited list: {err:#}");
            HashSet::new()
        })
    }

    /// Two-tier write: the full list goes to the remote document (best
    /// effort), the new URLs land in the local store unconditionally.
    pub fn flush(&self, storage: &Storage, full: &[String], new: &[String]) {
        if new.is_empty() {
            return;
        }
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.push(full) {
                tracing::warn!("push remote visited list: {err:#}");
            }
        }
        for url in new {
            if let Err(err) = storage.mark_visited(url) {
                tracing::warn!(url = %url, "record visited locally: {err:#}");
            }
        }
    }
}
