//! Interfaces to the browser host.
//!
//! The launcher never talks to a browser directly. Everything it needs from the
//! host (tabs, bookmarks, history, permissions) comes through the traits below,
//! which keeps the core testable with in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SourceError(pub String);

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutedInfo {
    #[serde(default)]
    pub muted: bool,
}

/// A live browser tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: i64,
    /// Position of the tab inside its window.
    #[serde(default)]
    pub index: u32,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    pub window_id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default)]
    pub selected: bool,
    /// Host tab-group id. Browsers report `-1` for ungrouped tabs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub muted_info: MutedInfo,
    #[serde(default)]
    pub pinned: bool,
}

impl Tab {
    pub fn new(id: i64, window_id: i64, url: &str) -> Self {
        Self {
            id,
            index: 0,
            url: url.to_string(),
            title: String::new(),
            fav_icon_url: None,
            window_id,
            active: false,
            highlighted: false,
            selected: false,
            group_id: None,
            muted_info: MutedInfo::default(),
            pinned: false,
        }
    }

    pub fn in_group(&self) -> bool {
        self.group_id.is_some_and(|g| g >= 0)
    }

    pub fn is_muted(&self) -> bool {
        self.muted_info.muted
    }
}

/// Tab lifecycle notifications used to trigger a debounced refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    Created(i64),
    Removed(i64),
    Updated(i64),
    Replaced { added: i64, removed: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget {
    pub window_id: i64,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabUpdate {
    pub muted: Option<bool>,
    pub pinned: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visit_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub text: String,
    pub max_results: usize,
    pub start_time_ms: u64,
}

#[async_trait]
pub trait TabSource: Send + Sync {
    async fn list_tabs(&self) -> SourceResult<Vec<Tab>>;

    /// The tab the palette was opened on. Defaults to the first active tab.
    async fn current_tab(&self) -> SourceResult<Option<Tab>> {
        Ok(self.list_tabs().await?.into_iter().find(|t| t.active))
    }
}

#[async_trait]
pub trait TabLifecycle: Send + Sync {
    async fn close(&self, id: i64) -> SourceResult<()>;
    async fn move_tabs(&self, ids: &[i64], target: MoveTarget) -> SourceResult<()>;
    async fn highlight_and_focus(&self, tab: &Tab) -> SourceResult<()>;
    async fn duplicate(&self, id: i64) -> SourceResult<()>;
    async fn update(&self, id: i64, update: TabUpdate) -> SourceResult<()>;
    async fn reload(&self) -> SourceResult<()>;
    async fn go_back(&self, id: i64) -> SourceResult<()>;
    async fn go_forward(&self, id: i64) -> SourceResult<()>;
}

#[async_trait]
pub trait BookmarkSource: Send + Sync {
    async fn list_recent(&self, limit: usize) -> SourceResult<Vec<BookmarkNode>>;
    async fn search(&self, query: &str) -> SourceResult<Vec<BookmarkNode>>;
    async fn create(&self, title: &str, url: &str) -> SourceResult<BookmarkNode>;
    async fn remove(&self, id: &str) -> SourceResult<()>;
}

#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn search(&self, query: HistoryQuery) -> SourceResult<Vec<HistoryEntry>>;
}

#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn contains(&self, name: &str) -> SourceResult<bool>;
    async fn request(&self, name: &str) -> SourceResult<bool>;
    async fn remove(&self, name: &str) -> SourceResult<bool>;
    async fn list_granted(&self) -> SourceResult<Vec<String>>;
}
