//! Cached key/value store with migrations and cross-context invalidation.
//!
//! A [`PersistentStore`] wraps a [`KeyValuePersistence`] backend. The first
//! operation (or [`PersistentStore::open`]) loads the selected keys, runs the
//! migration chain and caches the result. The cache lives behind one async
//! mutex which is held for the whole initialisation, so concurrent callers all
//! wait for the same run and at most one runs at a time.
//!
//! Stores opened in a foreground context publish [`StoreEvent::Invalidated`]
//! after every write. The background store listens for these events and
//! re-runs its initialisation so its cache and migrations catch up.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// Stored values keyed by name. Iterates in key order.
pub type Values = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("migration '{name}' failed: {message}")]
    Migration { name: String, message: String },
    #[error("serialization failed: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Persistence(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait KeyValuePersistence: Send + Sync {
    /// Values for `keys`, or every stored value when `keys` is `None`.
    /// Missing keys are simply absent from the result.
    async fn get(&self, keys: Option<&[String]>) -> StoreResult<Values>;
    async fn set(&self, values: Values) -> StoreResult<()>;
    async fn remove(&self, keys: &[String]) -> StoreResult<()>;
}

fn select(all: &Values, keys: Option<&[String]>) -> Values {
    match keys {
        None => all.clone(),
        Some(keys) => keys
            .iter()
            .filter_map(|k| all.get(k).map(|v| (k.clone(), v.clone())))
            .collect(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryPersistence {
    values: Mutex<Values>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Values) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    pub async fn snapshot(&self) -> Values {
        self.values.lock().await.clone()
    }
}

#[async_trait]
impl KeyValuePersistence for MemoryPersistence {
    async fn get(&self, keys: Option<&[String]>) -> StoreResult<Values> {
        Ok(select(&*self.values.lock().await, keys))
    }

    async fn set(&self, values: Values) -> StoreResult<()> {
        self.values.lock().await.extend(values);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> StoreResult<()> {
        let mut guard = self.values.lock().await;
        for key in keys {
            guard.remove(key);
        }
        Ok(())
    }
}

/// Key/value state kept as one pretty-printed JSON object on disk.
#[derive(Debug)]
pub struct JsonFilePersistence {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> StoreResult<Values> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Values::new()),
            Err(e) => {
                return Err(StoreError::Persistence(format!(
                    "reading {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Values::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, values: &Values) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValuePersistence for JsonFilePersistence {
    async fn get(&self, keys: Option<&[String]>) -> StoreResult<Values> {
        let _guard = self.lock.lock().await;
        Ok(select(&self.read()?, keys))
    }

    async fn set(&self, values: Values) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read()?;
        all.extend(values);
        self.write(&all)
    }

    async fn remove(&self, keys: &[String]) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read()?;
        for key in keys {
            all.remove(key);
        }
        self.write(&all)
    }
}

/// Handed to each migration so it can delete keys from persistence.
#[derive(Debug, Default)]
pub struct MigrationContext {
    removed: Vec<String>,
}

impl MigrationContext {
    pub fn remove(&mut self, key: impl Into<String>) {
        self.removed.push(key.into());
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }
}

/// One step of a store's migration chain.
///
/// Migrations must be idempotent: applied to their own output they return it
/// unchanged and remove nothing.
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;
    fn migrate(&self, values: Values, ctx: &mut MigrationContext) -> anyhow::Result<Values>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection {
    All,
    Keys(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Invalidated { store: String },
}

/// Where a store instance runs.
#[derive(Debug, Clone)]
pub enum StoreContext {
    /// The long-lived context. Listens for invalidations.
    Background,
    /// A short-lived context. Publishes an invalidation after every write.
    Foreground(broadcast::Sender<StoreEvent>),
}

pub struct StoreOptions {
    pub name: String,
    pub keys: KeySelection,
    /// Values used for keys that are not stored yet. Never written back.
    pub defaults: Values,
    pub migrations: Vec<Arc<dyn Migration>>,
    pub context: StoreContext,
}

impl StoreOptions {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keys: KeySelection::All,
            defaults: Values::new(),
            migrations: Vec::new(),
            context: StoreContext::Background,
        }
    }

    pub fn keys(mut self, keys: KeySelection) -> Self {
        self.keys = keys;
        self
    }

    pub fn defaults(mut self, defaults: Values) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn migration(mut self, migration: Arc<dyn Migration>) -> Self {
        self.migrations.push(migration);
        self
    }

    pub fn context(mut self, context: StoreContext) -> Self {
        self.context = context;
        self
    }
}

pub struct PersistentStore {
    name: String,
    persistence: Arc<dyn KeyValuePersistence>,
    keys: KeySelection,
    defaults: Values,
    migrations: Vec<Arc<dyn Migration>>,
    context: StoreContext,
    /// `None` until initialised.
    cache: Mutex<Option<Values>>,
}

impl PersistentStore {
    /// Create a store without touching persistence. Initialisation happens on
    /// the first operation.
    pub fn new(persistence: Arc<dyn KeyValuePersistence>, options: StoreOptions) -> Self {
        Self {
            name: options.name,
            persistence,
            keys: options.keys,
            defaults: options.defaults,
            migrations: options.migrations,
            context: options.context,
            cache: Mutex::new(None),
        }
    }

    /// Create a store and start initialising it in the background.
    ///
    /// A failure is logged here and reported again by the next operation.
    pub fn open(persistence: Arc<dyn KeyValuePersistence>, options: StoreOptions) -> Arc<Self> {
        let store = Arc::new(Self::new(persistence, options));
        let bg = Arc::clone(&store);
        tokio::spawn(async move {
            if let Err(e) = bg.initialize().await {
                tracing::error!(store = %bg.name, error = %e, "store initialisation failed");
            }
        });
        store
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> StoreResult<Values> {
        let requested: Option<Vec<String>> = match &self.keys {
            KeySelection::All => None,
            KeySelection::Keys(keys) => Some(keys.clone()),
        };
        let mut values = self.persistence.get(requested.as_deref()).await?;

        for migration in &self.migrations {
            let mut ctx = MigrationContext::default();
            let migrated = migration
                .migrate(values.clone(), &mut ctx)
                .map_err(|e| StoreError::Migration {
                    name: migration.name().to_string(),
                    message: format!("{e:#}"),
                })?;
            if !ctx.removed.is_empty() {
                self.persistence.remove(&ctx.removed).await?;
            }
            if migrated != values {
                self.persistence.set(migrated.clone()).await?;
                tracing::info!(
                    store = %self.name,
                    migration = migration.name(),
                    removed = ctx.removed.len(),
                    "migration applied"
                );
                values = migrated;
            }
        }
        // Defaults only fill the cache so a migration never persists them.
        for (key, default) in &self.defaults {
            if !values.contains_key(key) {
                values.insert(key.clone(), default.clone());
            }
        }
        Ok(values)
    }

    /// Initialise if needed. Concurrent callers wait for the same run.
    pub async fn initialize(&self) -> StoreResult<()> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(())
    }

    /// Reload from persistence and re-run every migration.
    pub async fn reinitialize(&self) -> StoreResult<()> {
        let mut cache = self.cache.lock().await;
        *cache = Some(self.load().await?);
        tracing::debug!(store = %self.name, "store reinitialised");
        Ok(())
    }

    async fn with_cache<R>(&self, f: impl FnOnce(&Values) -> R) -> StoreResult<R> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(f(cache.as_ref().unwrap_or(&Values::new())))
    }

    pub async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.with_cache(|values| values.get(key).cloned()).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Every cached value whose key starts with `prefix`, in key order.
    pub async fn get_all(&self, prefix: &str) -> StoreResult<Values> {
        self.with_cache(|values| {
            values
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .await
    }

    pub async fn set(&self, key: &str, value: impl Serialize) -> StoreResult<()> {
        let mut values = Values::new();
        values.insert(key.to_string(), serde_json::to_value(value)?);
        self.set_many(values).await
    }

    pub async fn set_many(&self, values: Values) -> StoreResult<()> {
        {
            let mut cache = self.cache.lock().await;
            if cache.is_none() {
                *cache = Some(self.load().await?);
            }
            self.persistence.set(values.clone()).await?;
            if let Some(cached) = cache.as_mut() {
                cached.extend(values);
            }
        }
        self.notify();
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        self.remove_many(&[key.to_string()]).await
    }

    pub async fn remove_many(&self, keys: &[String]) -> StoreResult<()> {
        {
            let mut cache = self.cache.lock().await;
            if cache.is_none() {
                *cache = Some(self.load().await?);
            }
            self.persistence.remove(keys).await?;
            if let Some(cached) = cache.as_mut() {
                for key in keys {
                    cached.remove(key);
                }
            }
        }
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        if let StoreContext::Foreground(tx) = &self.context {
            // No receivers just means no background context is running.
            let _ = tx.send(StoreEvent::Invalidated {
                store: self.name.clone(),
            });
        }
    }

    /// Re-initialise this store once for every invalidation of its name.
    pub fn spawn_invalidation_listener(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<StoreEvent>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreEvent::Invalidated { store: name }) if name == store.name => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(store = %store.name, skipped, "invalidation events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                if let Err(e) = store.reinitialize().await {
                    tracing::error!(store = %store.name, error = %e, "reinitialisation failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Rename;

    impl Migration for Rename {
        fn name(&self) -> &str {
            "rename"
        }

        fn migrate(&self, mut values: Values, ctx: &mut MigrationContext) -> anyhow::Result<Values> {
            if let Some(v) = values.remove("old") {
                ctx.remove("old");
                values.insert("new".into(), v);
            }
            Ok(values)
        }
    }

    struct Broken;

    impl Migration for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn migrate(&self, _: Values, _: &mut MigrationContext) -> anyhow::Result<Values> {
            anyhow::bail!("cannot read legacy data")
        }
    }

    fn values(v: Value) -> Values {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn migration_result_is_persisted() {
        let backend = Arc::new(MemoryPersistence::with_values(values(json!({"old": 1}))));
        let store = PersistentStore::new(
            backend.clone(),
            StoreOptions::new("t").migration(Arc::new(Rename)),
        );
        assert_eq!(store.get("new").await.unwrap(), Some(json!(1)));
        assert_eq!(backend.snapshot().await, values(json!({"new": 1})));
    }

    #[tokio::test]
    async fn defaults_fill_missing_keys_only() {
        let backend = Arc::new(MemoryPersistence::with_values(values(json!({"a": 1}))));
        let store = PersistentStore::new(
            backend.clone(),
            StoreOptions::new("t")
                .keys(KeySelection::Keys(vec!["a".into(), "b".into()]))
                .defaults(values(json!({"a": 0, "b": 2}))),
        );
        assert_eq!(store.get("a").await.unwrap(), Some(json!(1)));
        assert_eq!(store.get("b").await.unwrap(), Some(json!(2)));
        assert!(!backend.snapshot().await.contains_key("b"));
    }

    #[tokio::test]
    async fn failing_migration_propagates() {
        let store = PersistentStore::new(
            Arc::new(MemoryPersistence::new()),
            StoreOptions::new("t").migration(Arc::new(Broken)),
        );
        let err = store.get("x").await.unwrap_err();
        assert!(matches!(err, StoreError::Migration { ref name, .. } if name == "broken"));
    }

    #[tokio::test]
    async fn get_all_filters_by_prefix() {
        let backend = Arc::new(MemoryPersistence::with_values(values(
            json!({"p:b": 2, "p:a": 1, "q": 3}),
        )));
        let store = PersistentStore::new(backend, StoreOptions::new("t"));
        let found = store.get_all("p:").await.unwrap();
        let keys: Vec<_> = found.keys().cloned().collect();
        assert_eq!(keys, vec!["p:a", "p:b"]);
    }

    #[tokio::test]
    async fn file_persistence_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFilePersistence::new(dir.path().join("state.json"));
        assert!(file.get(None).await.unwrap().is_empty());
        file.set(values(json!({"a": [1, 2], "b": "x"}))).await.unwrap();
        file.remove(&["b".into()]).await.unwrap();
        assert_eq!(file.get(None).await.unwrap(), values(json!({"a": [1, 2]})));
    }

    #[tokio::test]
    async fn unreadable_file_is_an_error_and_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut bytes = br#"{"custom-action:a": {"title": "A"}}"#.to_vec();
        bytes.insert(2, 0xFF);
        std::fs::write(&path, &bytes).unwrap();

        let file = JsonFilePersistence::new(&path);
        assert!(matches!(file.get(None).await, Err(StoreError::Persistence(_))));
        assert!(file.set(values(json!({"k": 1}))).await.is_err());
        assert!(file.remove(&["custom-action:a".into()]).await.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[tokio::test]
    async fn migrations_do_not_persist_defaults() {
        let backend = Arc::new(MemoryPersistence::with_values(values(json!({"old": 1}))));
        let store = PersistentStore::new(
            backend.clone(),
            StoreOptions::new("t")
                .defaults(values(json!({"seed": true})))
                .migration(Arc::new(Rename)),
        );
        assert_eq!(store.get("seed").await.unwrap(), Some(json!(true)));
        assert_eq!(store.get("new").await.unwrap(), Some(json!(1)));
        assert_eq!(backend.snapshot().await, values(json!({"new": 1})));
    }
}
