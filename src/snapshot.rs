//! Browser state loaded from a JSON snapshot.
//!
//! [`SnapshotSources`] serves tabs, bookmarks, history and permissions from
//! memory and applies lifecycle calls to that copy. It backs the command line
//! tool and doubles as a fake browser.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::launcher::Sources;
use crate::sources::{
    BookmarkNode, BookmarkSource, HistoryEntry, HistoryQuery, HistorySource, MoveTarget,
    PermissionGate, SourceError, SourceResult, Tab, TabLifecycle, TabSource, TabUpdate,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub bookmarks: Vec<BookmarkNode>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Snapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

fn matches(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(&needle.to_lowercase())
}

fn search_tree(nodes: &[BookmarkNode], query: &str) -> Vec<BookmarkNode> {
    nodes
        .iter()
        .flat_map(|n| {
            let hit = n.url.as_deref().is_some_and(|u| matches(u, query)) || matches(&n.title, query);
            let this = (hit && n.url.is_some()).then(|| BookmarkNode {
                children: Vec::new(),
                ..n.clone()
            });
            this.into_iter().chain(search_tree(&n.children, query))
        })
        .collect()
}

fn remove_from_tree(nodes: &mut Vec<BookmarkNode>, id: &str) -> bool {
    if let Some(pos) = nodes.iter().position(|n| n.id == id) {
        nodes.remove(pos);
        return true;
    }
    nodes.iter_mut().any(|n| remove_from_tree(&mut n.children, id))
}

#[derive(Debug, Default)]
pub struct SnapshotSources {
    state: Mutex<Snapshot>,
}

impl SnapshotSources {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(Snapshot::load(path)?))
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.clone()
    }

    /// All collaborator roles served by one shared snapshot.
    pub fn into_sources(self: Arc<Self>) -> Sources {
        Sources {
            tabs: self.clone(),
            lifecycle: self.clone(),
            bookmarks: self.clone(),
            history: self.clone(),
            permissions: self,
        }
    }

    async fn with_tab<R>(&self, id: i64, f: impl FnOnce(&mut Tab) -> R) -> SourceResult<R> {
        let mut state = self.state.lock().await;
        state
            .tabs
            .iter_mut()
            .find(|t| t.id == id)
            .map(f)
            .ok_or_else(|| SourceError::new(format!("no tab with id {id}")))
    }
}

#[async_trait]
impl TabSource for SnapshotSources {
    async fn list_tabs(&self) -> SourceResult<Vec<Tab>> {
        Ok(self.state.lock().await.tabs.clone())
    }
}

#[async_trait]
impl TabLifecycle for SnapshotSources {
    async fn close(&self, id: i64) -> SourceResult<()> {
        let mut state = self.state.lock().await;
        let before = state.tabs.len();
        state.tabs.retain(|t| t.id != id);
        if state.tabs.len() == before {
            return Err(SourceError::new(format!("no tab with id {id}")));
        }
        Ok(())
    }

    async fn move_tabs(&self, ids: &[i64], target: MoveTarget) -> SourceResult<()> {
        let mut state = self.state.lock().await;
        for (offset, tab) in state
            .tabs
            .iter_mut()
            .filter(|t| ids.contains(&t.id))
            .enumerate()
        {
            tab.window_id = target.window_id;
            tab.index = target.index + 1 + offset as u32;
        }
        Ok(())
    }

    async fn highlight_and_focus(&self, tab: &Tab) -> SourceResult<()> {
        let mut state = self.state.lock().await;
        for t in state.tabs.iter_mut().filter(|t| t.window_id == tab.window_id) {
            t.active = t.id == tab.id;
            t.highlighted = t.id == tab.id;
        }
        Ok(())
    }

    async fn duplicate(&self, id: i64) -> SourceResult<()> {
        let mut state = self.state.lock().await;
        let copy = state
            .tabs
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| SourceError::new(format!("no tab with id {id}")))?;
        let next_id = state.tabs.iter().map(|t| t.id).max().unwrap_or_default() + 1;
        state.tabs.push(Tab {
            id: next_id,
            active: false,
            highlighted: false,
            selected: false,
            ..copy
        });
        Ok(())
    }

    async fn update(&self, id: i64, update: TabUpdate) -> SourceResult<()> {
        self.with_tab(id, |tab| {
            if let Some(muted) = update.muted {
                tab.muted_info.muted = muted;
            }
            if let Some(pinned) = update.pinned {
                tab.pinned = pinned;
            }
        })
        .await
    }

    async fn reload(&self) -> SourceResult<()> {
        Ok(())
    }

    async fn go_back(&self, id: i64) -> SourceResult<()> {
        self.with_tab(id, |_| ()).await
    }

    async fn go_forward(&self, id: i64) -> SourceResult<()> {
        self.with_tab(id, |_| ()).await
    }
}

#[async_trait]
impl BookmarkSource for SnapshotSources {
    async fn list_recent(&self, limit: usize) -> SourceResult<Vec<BookmarkNode>> {
        Ok(self
            .state
            .lock()
            .await
            .bookmarks
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn search(&self, query: &str) -> SourceResult<Vec<BookmarkNode>> {
        Ok(search_tree(&self.state.lock().await.bookmarks, query))
    }

    async fn create(&self, title: &str, url: &str) -> SourceResult<BookmarkNode> {
        let node = BookmarkNode {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            url: Some(url.to_string()),
            children: Vec::new(),
        };
        self.state.lock().await.bookmarks.insert(0, node.clone());
        Ok(node)
    }

    async fn remove(&self, id: &str) -> SourceResult<()> {
        if remove_from_tree(&mut self.state.lock().await.bookmarks, id) {
            Ok(())
        } else {
            Err(SourceError::new(format!("no bookmark with id {id}")))
        }
    }
}

#[async_trait]
impl HistorySource for SnapshotSources {
    async fn search(&self, query: HistoryQuery) -> SourceResult<Vec<HistoryEntry>> {
        let start = query.start_time_ms as f64;
        Ok(self
            .state
            .lock()
            .await
            .history
            .iter()
            .filter(|e| e.last_visit_time.map_or(true, |t| t >= start))
            .filter(|e| matches(&e.title, &query.text) || matches(&e.url, &query.text))
            .take(query.max_results)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PermissionGate for SnapshotSources {
    async fn contains(&self, name: &str) -> SourceResult<bool> {
        Ok(self.state.lock().await.permissions.iter().any(|p| p == name))
    }

    async fn request(&self, name: &str) -> SourceResult<bool> {
        let mut state = self.state.lock().await;
        if !state.permissions.iter().any(|p| p == name) {
            state.permissions.push(name.to_string());
        }
        Ok(true)
    }

    async fn remove(&self, name: &str) -> SourceResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.permissions.len();
        state.permissions.retain(|p| p != name);
        Ok(state.permissions.len() != before)
    }

    async fn list_granted(&self) -> SourceResult<Vec<String>> {
        Ok(self.state.lock().await.permissions.clone())
    }
}
