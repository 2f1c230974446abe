use serde::{Deserialize, Serialize};

use crate::sources::{BookmarkNode, HistoryEntry, Tab};

pub mod activation;
pub mod catalog;
pub mod commands;

pub const BOOKMARK_EMOJI: &str = "⭐️";
pub const HISTORY_EMOJI: &str = "🏛";

/// Everything the palette knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionTag {
    NewTab,
    CreateBookmark,
    Pin,
    Unpin,
    Fullscreen,
    Mute,
    Unmute,
    Reload,
    Email,
    Url,
    History,
    Incognito,
    Downloads,
    Extensions,
    Settings,
    ScrollBottom,
    ScrollTop,
    GoBack,
    GoForward,
    DuplicateTab,
    CloseTab,
    CloseWindow,
    ManageData,
    ClearAllBrowsingData,
    ClearHistory,
    ClearCookies,
    ClearCache,
    ClearLocalStorage,
    ClearPasswords,
    Options,
    RemoveDuplicateTabs,
    SwitchTab,
    Bookmark,
    CustomSearch,
}

impl ActionTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTag::NewTab => "new-tab",
            ActionTag::CreateBookmark => "create-bookmark",
            ActionTag::Pin => "pin",
            ActionTag::Unpin => "unpin",
            ActionTag::Fullscreen => "fullscreen",
            ActionTag::Mute => "mute",
            ActionTag::Unmute => "unmute",
            ActionTag::Reload => "reload",
            ActionTag::Email => "email",
            ActionTag::Url => "url",
            ActionTag::History => "history",
            ActionTag::Incognito => "incognito",
            ActionTag::Downloads => "downloads",
            ActionTag::Extensions => "extensions",
            ActionTag::Settings => "settings",
            ActionTag::ScrollBottom => "scroll-bottom",
            ActionTag::ScrollTop => "scroll-top",
            ActionTag::GoBack => "go-back",
            ActionTag::GoForward => "go-forward",
            ActionTag::DuplicateTab => "duplicate-tab",
            ActionTag::CloseTab => "close-tab",
            ActionTag::CloseWindow => "close-window",
            ActionTag::ManageData => "manage-data",
            ActionTag::ClearAllBrowsingData => "clear-all-browsing-data",
            ActionTag::ClearHistory => "clear-history",
            ActionTag::ClearCookies => "clear-cookies",
            ActionTag::ClearCache => "clear-cache",
            ActionTag::ClearLocalStorage => "clear-local-storage",
            ActionTag::ClearPasswords => "clear-passwords",
            ActionTag::Options => "options",
            ActionTag::RemoveDuplicateTabs => "remove-duplicate-tabs",
            ActionTag::SwitchTab => "switch-tab",
            ActionTag::Bookmark => "bookmark",
            ActionTag::CustomSearch => "custom-search",
        }
    }
}

impl std::fmt::Display for ActionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host permission an action needs before it can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequirement {
    pub name: String,
    /// Filled in at aggregation time from the live permission set.
    #[serde(default)]
    pub granted: bool,
}

impl PermissionRequirement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            granted: false,
        }
    }
}

/// A user-defined search shortcut, persisted one per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub desc: String,
    /// URL template containing a `{searchTerms}` placeholder.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    /// Where the OpenSearch description came from, if imported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_search_xml_url: Option<String>,
}

pub const SEARCH_TERMS_PLACEHOLDER: &str = "{searchTerms}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemKind {
    #[serde(rename_all = "camelCase")]
    Command { search_prefix: String, shortcut: String },
    #[serde(rename_all = "camelCase")]
    Tab { tab: Tab, is_duplicate: bool },
    Bookmark { url: String },
    History { url: String },
    CustomSearch { custom: CustomAction },
    StaticAction {
        action: ActionTag,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission: Option<PermissionRequirement>,
    },
}

/// One selectable row of the palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Key symbols shown next to the item. Empty when there is no binding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_binding: Vec<String>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl Item {
    pub fn static_action(title: &str, desc: &str, action: ActionTag) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            desc: desc.to_string(),
            fav_icon_url: None,
            emoji: None,
            key_binding: Vec::new(),
            kind: ItemKind::StaticAction {
                action,
                url: None,
                permission: None,
            },
        }
    }

    pub fn url_action(title: &str, desc: &str, url: &str) -> Self {
        let mut item = Self::static_action(title, desc, ActionTag::Url);
        if let ItemKind::StaticAction { url: slot, .. } = &mut item.kind {
            *slot = Some(url.to_string());
        }
        item
    }

    pub fn with_emoji(mut self, emoji: &str) -> Self {
        self.emoji = Some(emoji.to_string());
        self
    }

    pub fn with_keys(mut self, keys: &[&str]) -> Self {
        self.key_binding = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_permission(mut self, name: &str) -> Self {
        if let ItemKind::StaticAction { permission, .. } = &mut self.kind {
            *permission = Some(PermissionRequirement::new(name));
        }
        self
    }

    pub fn from_tab(tab: Tab, is_duplicate: bool) -> Self {
        Self {
            id: Some(tab.id.to_string()),
            title: tab.title.clone(),
            desc: "Chrome tab".into(),
            fav_icon_url: tab.fav_icon_url.clone(),
            emoji: None,
            key_binding: Vec::new(),
            kind: ItemKind::Tab { tab, is_duplicate },
        }
    }

    /// Folders have no URL and yield `None`.
    pub fn from_bookmark(node: &BookmarkNode) -> Option<Self> {
        let url = node.url.clone()?;
        Some(Self {
            id: Some(node.id.clone()),
            title: node.title.clone(),
            desc: "Bookmark".into(),
            fav_icon_url: None,
            emoji: Some(BOOKMARK_EMOJI.into()),
            key_binding: Vec::new(),
            kind: ItemKind::Bookmark { url },
        })
    }

    pub fn from_history(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            desc: "History".into(),
            fav_icon_url: None,
            emoji: Some(HISTORY_EMOJI.into()),
            key_binding: Vec::new(),
            kind: ItemKind::History { url: entry.url },
        }
    }

    pub fn from_custom(custom: CustomAction) -> Self {
        Self {
            id: custom.id.clone(),
            title: custom.title.clone(),
            desc: if custom.desc.is_empty() {
                custom.title.clone()
            } else {
                custom.desc.clone()
            },
            fav_icon_url: custom.fav_icon_url.clone(),
            emoji: None,
            key_binding: Vec::new(),
            kind: ItemKind::CustomSearch { custom },
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Tab { tab, .. } => Some(tab.url.as_str()),
            ItemKind::Bookmark { url } | ItemKind::History { url } => Some(url.as_str()),
            ItemKind::CustomSearch { custom } => Some(custom.url.as_str()),
            ItemKind::StaticAction { url, .. } => url.as_deref(),
            ItemKind::Command { .. } => None,
        }
    }

    pub fn shortcut(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Command { shortcut, .. } => Some(shortcut.as_str()),
            ItemKind::CustomSearch { custom } => custom.shortcut.as_deref(),
            _ => None,
        }
    }

    /// The tag handed to the execution layer. Commands only change scope.
    pub fn action_tag(&self) -> Option<ActionTag> {
        match &self.kind {
            ItemKind::Command { .. } => None,
            ItemKind::Tab { .. } => Some(ActionTag::SwitchTab),
            ItemKind::Bookmark { .. } => Some(ActionTag::Bookmark),
            ItemKind::History { .. } => Some(ActionTag::Url),
            ItemKind::CustomSearch { .. } => Some(ActionTag::CustomSearch),
            ItemKind::StaticAction { action, .. } => Some(*action),
        }
    }

    /// `None` when the item is not gated on a permission.
    pub fn has_permission(&self) -> Option<bool> {
        match &self.kind {
            ItemKind::StaticAction {
                permission: Some(p),
                ..
            } => Some(p.granted),
            _ => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self.kind, ItemKind::Tab { is_duplicate: true, .. })
    }

    pub fn is_tab(&self) -> bool {
        matches!(self.kind, ItemKind::Tab { .. })
    }

    pub fn is_bookmark(&self) -> bool {
        matches!(self.kind, ItemKind::Bookmark { .. })
    }

    pub fn is_history(&self) -> bool {
        matches!(self.kind, ItemKind::History { .. })
    }

    pub fn is_static_action(&self) -> bool {
        matches!(self.kind, ItemKind::StaticAction { .. })
    }

    pub fn is_custom_search(&self) -> bool {
        matches!(self.kind, ItemKind::CustomSearch { .. })
    }
}
