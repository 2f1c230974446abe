//! Merge every item source into the single list the palette filters.
//!
//! Display order is fixed: tabs (behind a "remove duplicates" row when
//! duplicates exist), then custom and static actions, then bookmarks.

use std::collections::HashSet;

use crate::actions::catalog::remove_duplicates_action;
use crate::actions::{CustomAction, Item, ItemKind};
use crate::duplicates::{duplicate_ids, find_duplicates, total_removals};
use crate::keys::{adjust_key_binding, Platform};
use crate::sources::{BookmarkNode, Tab};

/// Everything one aggregation pass consumes.
#[derive(Debug, Clone)]
pub struct AggregateInput {
    pub tabs: Vec<Tab>,
    pub static_actions: Vec<Item>,
    pub custom_actions: Vec<CustomAction>,
    pub bookmarks: Vec<BookmarkNode>,
    pub granted_permissions: HashSet<String>,
    pub platform: Platform,
    pub ignored_hosts: Vec<String>,
    pub priority_url_patterns: Vec<String>,
}

fn is_priority(tab: &Tab, patterns: &[String]) -> bool {
    patterns.iter().any(|p| tab.url.contains(p.as_str()))
}

/// Tab items with duplicate flags, priority tabs first.
pub fn tab_items(tabs: Vec<Tab>, ignored_hosts: &[String], priority: &[String]) -> Vec<Item> {
    let groups = find_duplicates(&tabs, ignored_hosts);
    let dup_ids = duplicate_ids(&groups);
    let removals = total_removals(&groups);

    let mut tabs = tabs;
    // Stable: non-priority tabs keep their host order.
    tabs.sort_by_key(|t| !is_priority(t, priority));

    let mut items = Vec::with_capacity(tabs.len() + 1);
    if removals > 0 {
        items.push(remove_duplicates_action(removals));
    }
    items.extend(tabs.into_iter().map(|t| {
        let dup = dup_ids.contains(&t.id);
        Item::from_tab(t, dup)
    }));
    items
}

/// Depth-first flattening of a bookmark tree, dropping folders.
pub fn flatten_bookmarks(nodes: &[BookmarkNode]) -> Vec<Item> {
    nodes
        .iter()
        .flat_map(|node| {
            Item::from_bookmark(node)
                .into_iter()
                .chain(flatten_bookmarks(&node.children))
        })
        .collect()
}

/// Fill in `granted` on every permission-gated item.
pub fn apply_permissions(items: &mut [Item], granted: &HashSet<String>) {
    for item in items {
        if let ItemKind::StaticAction {
            permission: Some(p),
            ..
        } = &mut item.kind
        {
            p.granted = granted.contains(&p.name);
        }
    }
}

pub fn aggregate(input: AggregateInput) -> Vec<Item> {
    let AggregateInput {
        tabs,
        static_actions,
        custom_actions,
        bookmarks,
        granted_permissions,
        platform,
        ignored_hosts,
        priority_url_patterns,
    } = input;

    let mut items = tab_items(tabs, &ignored_hosts, &priority_url_patterns);

    let mut actions: Vec<Item> = custom_actions
        .into_iter()
        .map(Item::from_custom)
        .chain(static_actions)
        .collect();
    apply_permissions(&mut actions, &granted_permissions);
    for action in &mut actions {
        adjust_key_binding(action, platform);
    }
    items.extend(actions);

    items.extend(flatten_bookmarks(&bookmarks));
    tracing::debug!(count = items.len(), "aggregated items");
    items
}
