use std::sync::Arc;

use omni_launcher::actions::CustomAction;
use omni_launcher::custom_actions::{self, CustomActions, SearchEngine, CUSTOM_ACTION_PREFIX};
use omni_launcher::store::{MemoryPersistence, PersistentStore, StoreContext};
use serde_json::json;

fn service(values: serde_json::Value) -> (CustomActions, Arc<MemoryPersistence>) {
    let backend = Arc::new(MemoryPersistence::with_values(
        values.as_object().cloned().unwrap_or_default(),
    ));
    let store = PersistentStore::new(
        backend.clone(),
        custom_actions::store_options(StoreContext::Background),
    );
    (CustomActions::new(Arc::new(store)), backend)
}

fn action(title: &str, url: &str) -> CustomAction {
    CustomAction {
        id: None,
        title: title.into(),
        desc: String::new(),
        url: url.into(),
        shortcut: None,
        fav_icon_url: None,
        open_search_xml_url: None,
    }
}

#[tokio::test]
async fn duplicate_urls_are_removed_keeping_first_key() {
    let (service, backend) = service(json!({
        "custom-action:a": {"id": "a", "title": "One", "url": "https://x.com/?q={searchTerms}"},
        "custom-action:b": {"id": "b", "title": "Two", "url": "https://x.com/?q={searchTerms}"},
        "custom-action:c": {"id": "c", "title": "Three", "url": "https://y.com/?q={searchTerms}"}
    }));
    let list = service.list().await.unwrap();
    let ids: Vec<_> = list.iter().filter_map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let stored = backend.snapshot().await;
    assert!(stored.contains_key("custom-action:a"));
    assert!(!stored.contains_key("custom-action:b"));
}

#[tokio::test]
async fn legacy_array_is_migrated_and_deduplicated() {
    let (service, backend) = service(json!({
        "customActions": [
            {"id": "1", "title": "A", "url": "https://a.com/?q={searchTerms}"},
            {"id": "2", "title": "A again", "url": "https://a.com/?q={searchTerms}"}
        ]
    }));
    let list = service.list().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id.as_deref(), Some("1"));
    let stored = backend.snapshot().await;
    assert!(!stored.contains_key(custom_actions::LEGACY_KEY));
    assert_eq!(stored.keys().filter(|k| k.starts_with(CUSTOM_ACTION_PREFIX)).count(), 1);
}

#[tokio::test]
async fn upsert_fills_defaults_and_delete_removes() {
    let (service, _) = service(json!({}));
    let saved = service
        .upsert(action("Wikipedia", "https://www.wikipedia.org/w?search={searchTerms}"))
        .await
        .unwrap();
    let id = saved.id.clone().unwrap();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(saved.desc, "Wikipedia");
    assert_eq!(saved.shortcut.as_deref(), Some("wikipedia.org"));
    assert_eq!(service.list().await.unwrap(), vec![saved.clone()]);

    let renamed = CustomAction {
        title: "Wiki".into(),
        ..saved
    };
    service.upsert(renamed).await.unwrap();
    let list = service.list().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "Wiki");

    service.delete(&id).await.unwrap();
    assert!(service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_engine_from_same_description_is_added_once() {
    let (service, _) = service(json!({}));
    let engine = SearchEngine {
        title: "DuckDuckGo".into(),
        url: "https://duckduckgo.com/?q={searchTerms}".into(),
        open_search_xml_url: "https://duckduckgo.com/opensearch.xml".into(),
        fav_icon_url: None,
    };
    assert!(service.add_search_engine(engine.clone()).await.unwrap().is_some());
    assert!(service.add_search_engine(engine).await.unwrap().is_none());
    let found = service
        .find_by_open_search_xml_url("https://duckduckgo.com/opensearch.xml")
        .await
        .unwrap();
    assert_eq!(found.map(|a| a.title), Some("DuckDuckGo".to_string()));
}

#[tokio::test]
async fn concurrent_lists_agree() {
    let (service, _) = service(json!({
        "custom-action:a": {"id": "a", "title": "One", "url": "https://x.com/?q={searchTerms}"}
    }));
    let (a, b) = tokio::join!(service.list(), service.list());
    assert_eq!(a.unwrap(), b.unwrap());
}
