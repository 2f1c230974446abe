//! User-defined search shortcuts, stored one per `custom-action:<id>` key.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::actions::CustomAction;
use crate::common::{strip_prefix_ci, Coalescer};
use crate::store::{
    Migration, MigrationContext, PersistentStore, StoreContext, StoreOptions, StoreResult, Values,
};

pub const STORE_NAME: &str = "custom-actions";
pub const CUSTOM_ACTION_PREFIX: &str = "custom-action:";
/// Older versions kept every action in one array under this key.
pub const LEGACY_KEY: &str = "customActions";

pub fn storage_key(id: &str) -> String {
    format!("{CUSTOM_ACTION_PREFIX}{id}")
}

/// Split the legacy `customActions` array into one key per action.
pub struct LegacyActionsMigration;

impl Migration for LegacyActionsMigration {
    fn name(&self) -> &str {
        "legacy-custom-actions"
    }

    fn migrate(&self, mut values: Values, ctx: &mut MigrationContext) -> anyhow::Result<Values> {
        let Some(legacy) = values.remove(LEGACY_KEY) else {
            return Ok(values);
        };
        ctx.remove(LEGACY_KEY);
        let Value::Array(entries) = legacy else {
            tracing::warn!("legacy custom actions are not an array; dropping them");
            return Ok(values);
        };
        for mut entry in entries {
            let Some(obj) = entry.as_object_mut() else {
                continue;
            };
            let id = match obj.get("id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => {
                    let id = Uuid::new_v4().to_string();
                    obj.insert("id".into(), Value::String(id.clone()));
                    id
                }
            };
            values.entry(storage_key(&id)).or_insert(entry);
        }
        Ok(values)
    }
}

/// Delete every custom action whose URL was already seen, keeping the first
/// in key order.
pub struct RemoveDuplicates;

impl Migration for RemoveDuplicates {
    fn name(&self) -> &str {
        "remove-duplicate-custom-actions"
    }

    fn migrate(&self, mut values: Values, ctx: &mut MigrationContext) -> anyhow::Result<Values> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for (key, value) in values.iter() {
            if !key.starts_with(CUSTOM_ACTION_PREFIX) {
                continue;
            }
            let Some(url) = value.get("url").and_then(Value::as_str) else {
                continue;
            };
            if !seen.insert(url.to_string()) {
                duplicates.push(key.clone());
            }
        }
        for key in duplicates {
            tracing::warn!(key = %key, "removing duplicate custom action");
            values.remove(&key);
            ctx.remove(key);
        }
        Ok(values)
    }
}

pub fn store_options(context: StoreContext) -> StoreOptions {
    StoreOptions::new(STORE_NAME)
        .migration(Arc::new(LegacyActionsMigration))
        .migration(Arc::new(RemoveDuplicates))
        .context(context)
}

/// Shortcut derived from the template's host, without `www.` labels.
pub fn default_shortcut(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut host = parsed.host_str()?;
    while let Some(rest) = strip_prefix_ci(host, "www.") {
        host = rest;
    }
    (!host.is_empty()).then(|| host.to_string())
}

/// A search engine discovered through an OpenSearch description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngine {
    pub title: String,
    pub url: String,
    pub open_search_xml_url: String,
    pub fav_icon_url: Option<String>,
}

pub struct CustomActions {
    store: Arc<PersistentStore>,
    list_calls: Coalescer<(), StoreResult<Vec<CustomAction>>>,
}

impl CustomActions {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self {
            store,
            list_calls: Coalescer::new(),
        }
    }

    pub fn store(&self) -> &Arc<PersistentStore> {
        &self.store
    }

    /// Every stored action in key order. Concurrent calls share one read.
    pub async fn list(&self) -> StoreResult<Vec<CustomAction>> {
        let store = &self.store;
        self.list_calls
            .run((), move || async move {
                let values = store.get_all(CUSTOM_ACTION_PREFIX).await?;
                Ok(values
                    .into_iter()
                    .filter_map(|(key, value)| match serde_json::from_value::<CustomAction>(value) {
                        Ok(action) => Some(action),
                        Err(e) => {
                            tracing::warn!(key = %key, error = %e, "skipping unreadable custom action");
                            None
                        }
                    })
                    .collect())
            })
            .await
    }

    pub async fn find_by_open_search_xml_url(&self, url: &str) -> StoreResult<Option<CustomAction>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|a| a.open_search_xml_url.as_deref() == Some(url)))
    }

    /// Insert or replace `action`, filling in a missing id, description and
    /// shortcut.
    pub async fn upsert(&self, mut action: CustomAction) -> StoreResult<CustomAction> {
        let id = action
            .id
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        if action.desc.is_empty() {
            action.desc = action.title.clone();
        }
        if action.shortcut.is_none() {
            action.shortcut = default_shortcut(&action.url);
        }
        self.store.set(&storage_key(&id), &action).await?;
        tracing::debug!(id = %id, "custom action saved");
        Ok(action)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.remove(&storage_key(id)).await
    }

    /// Register `engine` unless one from the same description already exists.
    pub async fn add_search_engine(&self, engine: SearchEngine) -> StoreResult<Option<CustomAction>> {
        if self
            .find_by_open_search_xml_url(&engine.open_search_xml_url)
            .await?
            .is_some()
        {
            tracing::debug!(source = %engine.open_search_xml_url, "search engine already registered");
            return Ok(None);
        }
        let action = CustomAction {
            id: None,
            title: engine.title,
            desc: String::new(),
            url: engine.url,
            shortcut: None,
            fav_icon_url: engine.fav_icon_url,
            open_search_xml_url: Some(engine.open_search_xml_url),
        };
        self.upsert(action).await.map(Some)
    }
}
