//! Favicon cache keyed by hostname and leading path segments.
//!
//! Saves are buffered and written in one batch after a quiet period. Lookups
//! prefer the longest stored path prefix of a URL.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::store::{KeyValuePersistence, StoreResult, Values};

pub const FAVICON_PREFIX: &str = "favIcon:";

fn is_web_url(url: &str) -> bool {
    url.starts_with("http:") || url.starts_with("https:")
}

/// Lookup keys for `url`, shortest first: the host key followed by one key
/// per path segment up to `path_limit`.
pub fn favicon_keys(url: &str, path_limit: usize) -> Option<Vec<String>> {
    if !is_web_url(url) {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    let mut keys = vec![format!("{FAVICON_PREFIX}{}", parsed.host_str().unwrap_or_default())];
    for segment in parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .take(path_limit)
    {
        let last = keys.last().cloned().unwrap_or_default();
        keys.push(format!("{last}/{segment}"));
    }
    Some(keys)
}

struct Inner {
    persistence: Arc<dyn KeyValuePersistence>,
    pending: Mutex<Values>,
    /// Bumped by every save; a scheduled write only runs if it is still the
    /// latest one when its quiet period ends.
    generation: AtomicU64,
}

impl Inner {
    async fn flush(&self) -> StoreResult<usize> {
        let batch = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
        if batch.is_empty() {
            return Ok(0);
        }
        let count = batch.len();
        self.persistence.set(batch).await?;
        tracing::debug!(count, "saved favicons");
        Ok(count)
    }
}

pub struct FaviconCache {
    inner: Arc<Inner>,
    path_limit: usize,
    debounce: Duration,
}

impl FaviconCache {
    pub fn new(persistence: Arc<dyn KeyValuePersistence>, path_limit: usize, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                persistence,
                pending: Mutex::new(Values::new()),
                generation: AtomicU64::new(0),
            }),
            path_limit,
            debounce,
        }
    }

    /// Buffer `icon` for `url` and (re)schedule the batch write.
    ///
    /// Non-web URLs and empty icons are ignored. Must be called from within
    /// a tokio runtime.
    pub fn save(&self, url: &str, icon: &str) {
        if icon.is_empty() {
            return;
        }
        let Some(keys) = favicon_keys(url, self.path_limit) else {
            return;
        };
        {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            for key in keys {
                pending.insert(key, Value::String(icon.to_string()));
            }
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let quiet = self.debounce;
        // Superseded writes skip after sleeping; one already writing finishes.
        tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            if let Err(e) = inner.flush().await {
                tracing::warn!(error = %e, "failed to save favicons");
            }
        });
    }

    /// Write buffered icons now.
    pub async fn flush(&self) -> StoreResult<usize> {
        self.inner.flush().await
    }

    /// Cancel the scheduled write and flush what is buffered.
    pub async fn shutdown(&self) -> StoreResult<usize> {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.flush().await
    }

    /// Icon for each URL with a stored entry, using the longest matching prefix.
    ///
    /// A storage failure yields an empty map.
    pub async fn resolve(&self, urls: &[String]) -> HashMap<String, String> {
        let per_url: Vec<(&String, Vec<String>)> = urls
            .iter()
            .filter_map(|u| favicon_keys(u, self.path_limit).map(|k| (u, k)))
            .collect();
        let wanted: Vec<String> = per_url
            .iter()
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if wanted.is_empty() {
            return HashMap::new();
        }
        let stored = match self.inner.persistence.get(Some(&wanted)).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "favicon lookup failed");
                return HashMap::new();
            }
        };
        per_url
            .into_iter()
            .filter_map(|(url, keys)| {
                keys.iter()
                    .rev()
                    .find_map(|k| stored.get(k).and_then(Value::as_str))
                    .map(|icon| (url.clone(), icon.to_string()))
            })
            .collect()
    }
}

impl Drop for FaviconCache {
    fn drop(&mut self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }
}
