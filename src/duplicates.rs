use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::canonical::group_by_url;
use crate::sources::{MoveTarget, SourceError, Tab, TabLifecycle};

/// Two or more tabs that share a canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub key: String,
    pub tabs: Vec<Tab>,
}

/// Which tab of a group survives consolidation and which ones are closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub keep: Tab,
    pub remove: Vec<Tab>,
}

impl RemovalPlan {
    pub fn remove_ids(&self) -> Vec<i64> {
        self.remove.iter().map(|t| t.id).collect()
    }
}

/// Group tabs by canonical URL and keep only groups with at least two tabs.
///
/// Groups come back in the order their first tab appeared in `tabs`.
pub fn find_duplicates(tabs: &[Tab], ignored_hosts: &[String]) -> Vec<DuplicateGroup> {
    group_by_url(tabs.to_vec(), |t: &Tab| Some(t.url.as_str()), ignored_hosts)
        .into_iter()
        .filter(|(_, tabs)| tabs.len() > 1)
        .map(|(key, tabs)| DuplicateGroup { key, tabs })
        .collect()
}

/// Ids of every tab that belongs to some duplicate group.
pub fn duplicate_ids(groups: &[DuplicateGroup]) -> HashSet<i64> {
    groups
        .iter()
        .flat_map(|g| g.tabs.iter().map(|t| t.id))
        .collect()
}

/// Number of tabs a full consolidation would close.
pub fn total_removals(groups: &[DuplicateGroup]) -> usize {
    groups.iter().map(|g| g.tabs.len().saturating_sub(1)).sum()
}

/// Keep-first ordering: tabs that sort earlier are kept.
///
/// Grouped tabs first, then the active tab, then non-highlighted, then
/// non-selected, then the lowest id.
pub fn removal_priority(a: &Tab, b: &Tab) -> Ordering {
    b.in_group()
        .cmp(&a.in_group())
        .then_with(|| b.active.cmp(&a.active))
        .then_with(|| a.highlighted.cmp(&b.highlighted))
        .then_with(|| a.selected.cmp(&b.selected))
        .then_with(|| a.id.cmp(&b.id))
}

impl DuplicateGroup {
    /// `None` only for an empty group, which `find_duplicates` never builds.
    pub fn removal_plan(&self) -> Option<RemovalPlan> {
        let mut ordered = self.tabs.clone();
        ordered.sort_by(removal_priority);
        let mut iter = ordered.into_iter();
        let keep = iter.next()?;
        Some(RemovalPlan {
            keep,
            remove: iter.collect(),
        })
    }

    /// Tabs of this group partitioned by window, windows in ascending id order.
    pub fn by_window(&self) -> BTreeMap<i64, Vec<&Tab>> {
        let mut windows: BTreeMap<i64, Vec<&Tab>> = BTreeMap::new();
        for tab in &self.tabs {
            windows.entry(tab.window_id).or_default().push(tab);
        }
        windows
    }

    pub fn window_count(&self) -> usize {
        self.by_window().len()
    }

    /// The first title that is not just the URL repeated back.
    pub fn display_title(&self) -> &str {
        self.tabs
            .iter()
            .find(|t| t.title != t.url)
            .or_else(|| self.tabs.first())
            .map(|t| t.title.as_str())
            .unwrap_or_default()
    }

    pub fn fav_icon_url(&self) -> Option<&str> {
        self.tabs.first().and_then(|t| t.fav_icon_url.as_deref())
    }
}

#[derive(Debug, Default)]
pub struct CloseReport {
    pub closed: Vec<i64>,
    pub failed: Vec<(i64, SourceError)>,
}

impl CloseReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Close tabs one at a time, pausing `delay` before each close.
///
/// A failed close is logged and recorded; the remaining tabs are still closed.
pub async fn close_tabs(
    lifecycle: &dyn TabLifecycle,
    ids: &[i64],
    delay: Duration,
) -> CloseReport {
    tracing::debug!(count = ids.len(), "closing tabs");
    let mut report = CloseReport::default();
    for &id in ids {
        tokio::time::sleep(delay).await;
        match lifecycle.close(id).await {
            Ok(()) => report.closed.push(id),
            Err(e) => {
                tracing::warn!(tab_id = id, error = %e, "failed to close tab");
                report.failed.push((id, e));
            }
        }
    }
    report
}

/// Move every tab of `tabs` next to the first one.
pub async fn gather_into_first_window(
    lifecycle: &dyn TabLifecycle,
    tabs: &[&Tab],
) -> Result<(), SourceError> {
    let Some((first, rest)) = tabs.split_first() else {
        return Ok(());
    };
    if rest.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = rest.iter().map(|t| t.id).collect();
    lifecycle
        .move_tabs(
            &ids,
            MoveTarget {
                window_id: first.window_id,
                index: first.index,
            },
        )
        .await
}

pub async fn focus(lifecycle: &dyn TabLifecycle, tab: &Tab) -> Result<(), SourceError> {
    lifecycle.highlight_and_focus(tab).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: i64, window_id: i64, url: &str) -> Tab {
        Tab::new(id, window_id, url)
    }

    #[test]
    fn groups_exact_urls_only() {
        let tabs = vec![
            tab(1, 1, "https://a.com"),
            tab(2, 1, "https://a.com"),
            tab(3, 1, "https://b.com"),
        ];
        let groups = find_duplicates(&tabs, &[]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "https://a.com");
        let ids: Vec<i64> = groups[0].tabs.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn active_tab_survives_regardless_of_id() {
        let mut b = tab(1, 1, "https://a.com");
        b.active = false;
        let mut a = tab(9, 1, "https://a.com");
        a.active = true;
        let group = DuplicateGroup {
            key: "https://a.com".into(),
            tabs: vec![b, a],
        };
        let plan = group.removal_plan().unwrap();
        assert_eq!(plan.keep.id, 9);
        assert_eq!(plan.remove_ids(), vec![1]);
    }

    #[test]
    fn grouped_tab_outranks_active_tab() {
        let mut active = tab(1, 1, "https://a.com");
        active.active = true;
        let mut grouped = tab(2, 1, "https://a.com");
        grouped.group_id = Some(4);
        let ungrouped = {
            let mut t = tab(3, 1, "https://a.com");
            t.group_id = Some(-1);
            t
        };
        let group = DuplicateGroup {
            key: "k".into(),
            tabs: vec![active, grouped, ungrouped],
        };
        let plan = group.removal_plan().unwrap();
        assert_eq!(plan.keep.id, 2);
        assert_eq!(plan.remove_ids(), vec![1, 3]);
    }

    #[test]
    fn lowest_id_breaks_ties() {
        let group = DuplicateGroup {
            key: "k".into(),
            tabs: vec![tab(7, 1, "u"), tab(3, 2, "u"), tab(5, 1, "u")],
        };
        let plan = group.removal_plan().unwrap();
        assert_eq!(plan.keep.id, 3);
        assert_eq!(plan.remove_ids(), vec![5, 7]);
    }

    #[test]
    fn removal_count_is_group_size_minus_one() {
        let tabs: Vec<Tab> = (1..=6)
            .map(|id| tab(id, id % 2, if id <= 4 { "https://x.io/" } else { "https://y.io/" }))
            .collect();
        let groups = find_duplicates(&tabs, &[]);
        for g in &groups {
            assert_eq!(g.removal_plan().unwrap().remove.len(), g.tabs.len() - 1);
        }
        assert_eq!(total_removals(&groups), 4);
    }

    #[test]
    fn by_window_orders_windows_ascending() {
        let group = DuplicateGroup {
            key: "k".into(),
            tabs: vec![tab(1, 9, "u"), tab(2, 3, "u"), tab(3, 9, "u")],
        };
        let windows = group.by_window();
        let keys: Vec<i64> = windows.keys().copied().collect();
        assert_eq!(keys, vec![3, 9]);
        assert_eq!(windows[&9].len(), 2);
        assert_eq!(group.window_count(), 2);
    }

    #[test]
    fn display_title_skips_url_titles() {
        let mut first = tab(1, 1, "https://a.com");
        first.title = "https://a.com".into();
        let mut second = tab(2, 1, "https://a.com");
        second.title = "A".into();
        let group = DuplicateGroup {
            key: "k".into(),
            tabs: vec![first, second],
        };
        assert_eq!(group.display_title(), "A");
    }
}
