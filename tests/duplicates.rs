use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use omni_launcher::duplicates::{close_tabs, find_duplicates, focus, gather_into_first_window};
use omni_launcher::sources::{MoveTarget, SourceError, SourceResult, Tab, TabLifecycle, TabUpdate};
use tokio::time::Instant;

#[derive(Default)]
struct RecordingLifecycle {
    closes: Mutex<Vec<(i64, Instant)>>,
    moves: Mutex<Vec<(Vec<i64>, MoveTarget)>>,
    focused: Mutex<Vec<i64>>,
    fail_on: Option<i64>,
}

#[async_trait]
impl TabLifecycle for RecordingLifecycle {
    async fn close(&self, id: i64) -> SourceResult<()> {
        self.closes.lock().unwrap().push((id, Instant::now()));
        if self.fail_on == Some(id) {
            return Err(SourceError::new("tab is gone"));
        }
        Ok(())
    }

    async fn move_tabs(&self, ids: &[i64], target: MoveTarget) -> SourceResult<()> {
        self.moves.lock().unwrap().push((ids.to_vec(), target));
        Ok(())
    }

    async fn highlight_and_focus(&self, tab: &Tab) -> SourceResult<()> {
        self.focused.lock().unwrap().push(tab.id);
        Ok(())
    }

    async fn duplicate(&self, _id: i64) -> SourceResult<()> {
        Ok(())
    }

    async fn update(&self, _id: i64, _update: TabUpdate) -> SourceResult<()> {
        Ok(())
    }

    async fn reload(&self) -> SourceResult<()> {
        Ok(())
    }

    async fn go_back(&self, _id: i64) -> SourceResult<()> {
        Ok(())
    }

    async fn go_forward(&self, _id: i64) -> SourceResult<()> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn closes_are_sequential_paced_and_best_effort() {
    let lifecycle = RecordingLifecycle {
        fail_on: Some(2),
        ..Default::default()
    };
    let start = Instant::now();
    let report = close_tabs(&lifecycle, &[1, 2, 3], Duration::from_millis(50)).await;

    assert_eq!(report.closed, vec![1, 3]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 2);
    assert!(!report.is_complete());

    let closes = lifecycle.closes.lock().unwrap();
    let ids: Vec<i64> = closes.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(closes[0].1 - start >= Duration::from_millis(50));
    for pair in closes.windows(2) {
        assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(50));
    }
}

#[tokio::test]
async fn gather_moves_rest_next_to_first() {
    let mut first = Tab::new(1, 10, "https://a.com");
    first.index = 4;
    let second = Tab::new(2, 20, "https://a.com");
    let third = Tab::new(3, 30, "https://a.com");
    let lifecycle = RecordingLifecycle::default();

    gather_into_first_window(&lifecycle, &[&first, &second, &third])
        .await
        .unwrap();
    focus(&lifecycle, &first).await.unwrap();

    let moves = lifecycle.moves.lock().unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].0, vec![2, 3]);
    assert_eq!(
        moves[0].1,
        MoveTarget {
            window_id: 10,
            index: 4
        }
    );
    assert_eq!(*lifecycle.focused.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn gather_single_tab_is_noop() {
    let only = Tab::new(1, 1, "https://a.com");
    let lifecycle = RecordingLifecycle::default();
    gather_into_first_window(&lifecycle, &[&only]).await.unwrap();
    assert!(lifecycle.moves.lock().unwrap().is_empty());
}

#[test]
fn ignored_hosts_group_by_path() {
    let hosts = vec!["docs.google.com".to_string()];
    let tabs = vec![
        Tab::new(1, 1, "https://docs.google.com/document/d/x#h1"),
        Tab::new(2, 2, "https://docs.google.com/document/d/x#h2"),
        Tab::new(3, 1, "https://example.com/#a"),
        Tab::new(4, 1, "https://example.com/#b"),
        Tab::new(5, 1, "not a url"),
        Tab::new(6, 1, "not a url"),
    ];
    let groups = find_duplicates(&tabs, &hosts);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "https://docs.google.com/document/d/x");
    assert_eq!(groups[0].window_count(), 2);
}

#[test]
fn blank_ignored_host_does_not_merge_distinct_pages() {
    let tabs = vec![
        Tab::new(1, 1, "https://www.google.com/search?q=rust"),
        Tab::new(2, 1, "https://www.google.com/search?q=cats"),
    ];
    let hosts = vec![String::new(), ".quip.com".to_string()];
    assert!(find_duplicates(&tabs, &hosts).is_empty());
}
