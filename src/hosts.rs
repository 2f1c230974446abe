//! Hosts whose URL fragment does not identify a separate page.

use std::sync::Arc;

use serde_json::Value;

use crate::store::{KeySelection, PersistentStore, StoreContext, StoreOptions, StoreResult, Values};

pub const STORE_NAME: &str = "hosts";
pub const HOSTS_KEY: &str = "hostsWithoutHash";

pub fn default_hosts() -> Vec<String> {
    vec!["docs.google.com".into(), ".quip.com".into()]
}

pub fn store_options(context: StoreContext) -> StoreOptions {
    let mut defaults = Values::new();
    defaults.insert(
        HOSTS_KEY.into(),
        Value::Array(default_hosts().into_iter().map(Value::String).collect()),
    );
    StoreOptions::new(STORE_NAME)
        .keys(KeySelection::Keys(vec![HOSTS_KEY.into()]))
        .defaults(defaults)
        .context(context)
}

pub struct HostIgnoreHashList {
    store: Arc<PersistentStore>,
}

impl HostIgnoreHashList {
    pub fn new(store: Arc<PersistentStore>) -> Self {
        Self { store }
    }

    pub async fn hosts(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .get_as::<Vec<String>>(HOSTS_KEY)
            .await?
            .unwrap_or_else(default_hosts))
    }

    async fn save(&self, hosts: &[String]) -> StoreResult<()> {
        self.store.set(HOSTS_KEY, hosts).await
    }

    pub async fn add(&self, host: &str) -> StoreResult<Vec<String>> {
        let mut hosts = self.hosts().await?;
        let host = host.trim();
        if host.is_empty() {
            return Ok(hosts);
        }
        hosts.push(host.to_string());
        self.save(&hosts).await?;
        Ok(hosts)
    }

    /// Replace the entry at `index`. Out-of-range indexes and blank hosts
    /// change nothing.
    pub async fn update(&self, index: usize, host: &str) -> StoreResult<Vec<String>> {
        let mut hosts = self.hosts().await?;
        let host = host.trim();
        let Some(slot) = hosts.get_mut(index).filter(|_| !host.is_empty()) else {
            return Ok(hosts);
        };
        *slot = host.to_string();
        self.save(&hosts).await?;
        Ok(hosts)
    }

    /// Remove the entry at `index` and return the remaining hosts.
    pub async fn remove(&self, index: usize) -> StoreResult<Vec<String>> {
        let mut hosts = self.hosts().await?;
        if index >= hosts.len() {
            return Ok(hosts);
        }
        hosts.remove(index);
        self.save(&hosts).await?;
        Ok(hosts)
    }
}
