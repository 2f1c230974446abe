//! Orchestration of the palette: loading items, running queries and acting on
//! activations.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use crate::actions::activation::{resolve_activation, Activation, Modifiers};
use crate::actions::catalog::static_actions;
use crate::actions::{ActionTag, Item};
use crate::aggregate::{aggregate, flatten_bookmarks, AggregateInput};
use crate::canonical::one_per_url;
use crate::common::{debounce, QueryGeneration};
use crate::custom_actions::CustomActions;
use crate::duplicates::{close_tabs, find_duplicates, CloseReport, DuplicateGroup};
use crate::favicons::FaviconCache;
use crate::filter::{shortcut_matches, ActionFilter, Scope};
use crate::hosts::HostIgnoreHashList;
use crate::settings::Settings;
use crate::sources::{
    BookmarkSource, HistoryQuery, HistorySource, PermissionGate, SourceResult, Tab, TabEvent,
    TabLifecycle, TabSource, TabUpdate,
};

/// The browser-side collaborators.
#[derive(Clone)]
pub struct Sources {
    pub tabs: Arc<dyn TabSource>,
    pub lifecycle: Arc<dyn TabLifecycle>,
    pub bookmarks: Arc<dyn BookmarkSource>,
    pub history: Arc<dyn HistorySource>,
    pub permissions: Arc<dyn PermissionGate>,
}

/// Unwrap a collaborator result, degrading a failure to the default value.
fn or_empty<T: Default>(what: &str, result: SourceResult<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(source = what, error = %e, "source failed; using empty result");
        T::default()
    })
}

pub struct Launcher {
    sources: Sources,
    settings: Settings,
    custom_actions: Arc<CustomActions>,
    hosts: Arc<HostIgnoreHashList>,
    favicons: Arc<FaviconCache>,
    filter: ActionFilter,
    generation: QueryGeneration,
}

impl Launcher {
    pub fn new(
        sources: Sources,
        settings: Settings,
        custom_actions: Arc<CustomActions>,
        hosts: Arc<HostIgnoreHashList>,
        favicons: Arc<FaviconCache>,
    ) -> Self {
        let filter = ActionFilter::new(settings.fuzzy_fallback);
        Self {
            sources,
            settings,
            custom_actions,
            hosts,
            favicons,
            filter,
            generation: QueryGeneration::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Aggregate every source into the palette's item list.
    ///
    /// Browser sources that fail contribute nothing. Store failures abort.
    pub async fn load_items(&self) -> anyhow::Result<Vec<Item>> {
        let tabs = or_empty("tabs", self.sources.tabs.list_tabs().await);
        let bookmarks = or_empty(
            "bookmarks",
            self.sources
                .bookmarks
                .list_recent(self.settings.recent_bookmarks_limit)
                .await,
        );
        let granted: HashSet<String> = or_empty(
            "permissions",
            self.sources.permissions.list_granted().await,
        )
        .into_iter()
        .collect();
        let custom_actions = self
            .custom_actions
            .list()
            .await
            .context("loading custom actions")?;
        let ignored_hosts = self.hosts.hosts().await.context("loading host list")?;

        for tab in &tabs {
            if let Some(icon) = &tab.fav_icon_url {
                self.favicons.save(&tab.url, icon);
            }
        }

        let current = tabs.iter().find(|t| t.active);
        let input = AggregateInput {
            static_actions: static_actions(current),
            tabs,
            custom_actions,
            bookmarks,
            granted_permissions: granted,
            platform: self.settings.platform(),
            ignored_hosts,
            priority_url_patterns: self.settings.priority_url_patterns.clone(),
        };
        let mut items = aggregate(input);
        self.fill_favicons(&mut items).await;
        Ok(items)
    }

    async fn fill_favicons(&self, items: &mut [Item]) {
        let missing: Vec<String> = items
            .iter()
            .filter(|i| i.fav_icon_url.is_none() && (i.is_bookmark() || i.is_history()))
            .filter_map(|i| i.url().map(str::to_string))
            .collect();
        if missing.is_empty() {
            return;
        }
        let icons = self.favicons.resolve(&missing).await;
        for item in items.iter_mut().filter(|i| i.fav_icon_url.is_none()) {
            if let Some(icon) = item.url().and_then(|u| icons.get(u)) {
                item.fav_icon_url = Some(icon.clone());
            }
        }
    }

    async fn history_items(&self, text: &str, max_results: usize) -> anyhow::Result<Vec<Item>> {
        let query = HistoryQuery {
            text: text.to_string(),
            max_results,
            start_time_ms: self.settings.history_start_time_ms,
        };
        let entries = or_empty("history", self.sources.history.search(query).await);
        let ignored_hosts = self.hosts.hosts().await.context("loading host list")?;
        let entries = one_per_url(entries, |e| Some(e.url.as_str()), &ignored_hosts);
        let mut items: Vec<Item> = entries.into_iter().map(Item::from_history).collect();
        self.fill_favicons(&mut items).await;
        Ok(items)
    }

    /// Run `query` against `items`, querying history and bookmarks as the
    /// scope requires.
    ///
    /// Returns `Ok(None)` when a newer search started while this one was
    /// waiting on a source; its results are stale.
    pub async fn search(&self, query: &str, items: &[Item]) -> anyhow::Result<Option<Vec<Item>>> {
        let generation = self.generation.next();
        let (scope, rest) = Scope::parse(query);

        let mut results = match scope {
            Scope::History => {
                let history = self
                    .history_items(rest, self.settings.history_scope_limit(rest))
                    .await?;
                self.filter.filter(query, &history)
            }
            Scope::Bookmarks if !rest.trim().is_empty() => {
                let found = or_empty("bookmarks", self.sources.bookmarks.search(rest).await);
                flatten_bookmarks(&found)
            }
            Scope::FreeText => {
                let mut results = self.filter.filter(query, items);
                let first_word = query.split(' ').next().unwrap_or_default().to_lowercase();
                let custom_match = items
                    .iter()
                    .any(|i| i.is_custom_search() && shortcut_matches(i, &first_word));
                if !query.is_empty() && !custom_match {
                    let history = self
                        .history_items(query, self.settings.history_max_results)
                        .await?;
                    results.extend(history);
                }
                results
            }
            _ => self.filter.filter(query, items),
        };

        if !self.generation.is_current(generation) {
            tracing::debug!(query, "discarding superseded results");
            return Ok(None);
        }
        results.truncate(self.settings.result_limit);
        Ok(Some(results))
    }

    pub async fn duplicate_groups(&self) -> anyhow::Result<Vec<DuplicateGroup>> {
        let tabs = self.sources.tabs.list_tabs().await?;
        let hosts = self.hosts.hosts().await?;
        Ok(find_duplicates(&tabs, &hosts))
    }

    /// Close every duplicate except the survivor of each group. Called once
    /// the groups from [`Activation::ReviewDuplicates`] are confirmed.
    pub async fn close_duplicate_tabs(&self) -> anyhow::Result<CloseReport> {
        let ids: Vec<i64> = self
            .duplicate_groups()
            .await?
            .iter()
            .filter_map(DuplicateGroup::removal_plan)
            .flat_map(|plan| plan.remove_ids())
            .collect();
        let report = close_tabs(
            self.sources.lifecycle.as_ref(),
            &ids,
            self.settings.tab_close_delay(),
        )
        .await;
        tracing::info!(
            closed = report.closed.len(),
            failed = report.failed.len(),
            "closed duplicate tabs"
        );
        Ok(report)
    }

    async fn current_tab(&self) -> anyhow::Result<Tab> {
        self.sources
            .tabs
            .current_tab()
            .await?
            .context("no active tab")
    }

    /// Resolve what activating `item` means and carry out the parts that
    /// only need the collaborators.
    ///
    /// The returned activation tells the caller what is left to do, such as
    /// opening a URL or entering a scope.
    pub async fn activate(
        &self,
        item: &Item,
        scope: Scope,
        modifiers: Modifiers,
    ) -> anyhow::Result<Activation> {
        let activation = match resolve_activation(item, scope, modifiers) {
            // Closing waits for the user to confirm the groups.
            Activation::Execute(ActionTag::RemoveDuplicateTabs) => {
                Activation::ReviewDuplicates(self.duplicate_groups().await?)
            }
            other => other,
        };
        let lifecycle = &self.sources.lifecycle;
        match &activation {
            Activation::GrantPermission(name) => {
                let granted = self.sources.permissions.request(name).await?;
                tracing::info!(permission = %name, granted, "permission requested");
            }
            Activation::RemoveTab(id) => lifecycle.close(*id).await?,
            Activation::RemoveBookmark(id) => self.sources.bookmarks.remove(id).await?,
            Activation::SwitchTab(tab) => lifecycle.highlight_and_focus(tab).await?,
            Activation::Execute(tag) => self.execute(*tag).await?,
            Activation::EnterScope(_)
            | Activation::OpenUrl { .. }
            | Activation::ReviewDuplicates(_) => {}
        }
        Ok(activation)
    }

    async fn execute(&self, tag: ActionTag) -> anyhow::Result<()> {
        let lifecycle = &self.sources.lifecycle;
        let update = |muted: Option<bool>, pinned: Option<bool>| TabUpdate { muted, pinned };
        match tag {
            ActionTag::Pin | ActionTag::Unpin => {
                let tab = self.current_tab().await?;
                lifecycle
                    .update(tab.id, update(None, Some(tag == ActionTag::Pin)))
                    .await?;
            }
            ActionTag::Mute | ActionTag::Unmute => {
                let tab = self.current_tab().await?;
                lifecycle
                    .update(tab.id, update(Some(tag == ActionTag::Mute), None))
                    .await?;
            }
            ActionTag::DuplicateTab => lifecycle.duplicate(self.current_tab().await?.id).await?,
            ActionTag::CloseTab => lifecycle.close(self.current_tab().await?.id).await?,
            ActionTag::Reload => lifecycle.reload().await?,
            ActionTag::GoBack => lifecycle.go_back(self.current_tab().await?.id).await?,
            ActionTag::GoForward => lifecycle.go_forward(self.current_tab().await?.id).await?,
            ActionTag::CreateBookmark => {
                let tab = self.current_tab().await?;
                self.sources.bookmarks.create(&tab.title, &tab.url).await?;
            }
            other => tracing::debug!(action = %other, "left to the host"),
        }
        Ok(())
    }

    /// Collapse bursts of typed queries.
    pub fn debounce_queries(&self, queries: mpsc::Receiver<String>) -> mpsc::Receiver<String> {
        debounce(queries, self.settings.query_debounce())
    }

    /// Collapse bursts of tab events into refresh triggers.
    pub fn debounce_tab_events(&self, events: mpsc::Receiver<TabEvent>) -> mpsc::Receiver<TabEvent> {
        debounce(events, self.settings.tab_event_debounce())
    }
}
