// crates/adapt/src/gateway.rs
//! The single in-memory config document plus its two persistence targets.
//! - Load order: remote row (merged over defaults), then local cache
//!   (adopted as stored), then defaults.
//! - Every state change after load is mirrored to the local cache.
//! - Explicit saves and resets also upsert the remote row; failures there
//!   are logged and dropped.

use domain::{merge, AppConfig};
use parking_lot::RwLock;
use serde_json::Value as Json;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

use crate::cache::{LocalCache, CACHE_KEY};
use crate::store::{upsert, RemoteStore};

/// Where the document in memory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Default,
}

pub struct ConfigStore {
    state: RwLock<AppConfig>,
    loading: AtomicBool,
    remote: Option<Arc<dyn RemoteStore>>,
    cache: Arc<dyn LocalCache>,
}

impl ConfigStore {
    /// Starts in the loading state holding the default document.
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, cache: Arc<dyn LocalCache>) -> Self {
        if remote.is_none() {
            info!("no remote store configured; changes are kept in the local cache only");
        }
        Self {
            state: RwLock::new(AppConfig::default()),
            loading: AtomicBool::new(true),
            remote,
            cache,
        }
    }

    pub fn current(&self) -> AppConfig {
        self.state.read().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Resolve the startup document and leave the loading state.
    #[tracing::instrument(skip_all)]
    pub async fn load(&self) -> LoadSource {
        self.loading.store(true, Ordering::Release);

        let (config, source) = match self.load_remote().await {
            Some(config) => (config, LoadSource::Remote),
            None => match self.load_cached() {
                Some(config) => (config, LoadSource::Cache),
                None => (AppConfig::default(), LoadSource::Default),
            },
        };
        info!(?source, "config loaded");

        {
            let mut state = self.state.write();
            *state = config;
            self.loading.store(false, Ordering::Release);
            self.write_cache(&state);
        }
        source
    }

    async fn load_remote(&self) -> Option<AppConfig> {
        let remote = self.remote.as_ref()?;
        let row = match remote.fetch().await {
            Ok(Some(row)) => row,
            Ok(None) => {
                debug!("remote has no config row");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "remote fetch failed; falling back to cache");
                return None;
            }
        };

        let data = match row.data {
            Json::Object(map) if !map.is_empty() => map,
            _ => {
                debug!("remote config row has no data");
                return None;
            }
        };
        match merge(&AppConfig::default(), &data) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "remote config is malformed; falling back to cache");
                None
            }
        }
    }

    /// Cached documents are adopted as stored, without merging over defaults.
    fn load_cached(&self) -> Option<AppConfig> {
        let text = match self.cache.get(CACHE_KEY) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "cached config is not valid JSON; ignoring");
                None
            }
        }
    }

    /// Callers hold the state write guard so the cache never lags behind a
    /// concurrent edit.
    fn write_cache(&self, config: &AppConfig) {
        if self.is_loading() {
            return;
        }
        let text = match serde_json::to_string(config) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "could not serialize config for cache");
                return;
            }
        };
        if let Err(e) = self.cache.set(CACHE_KEY, &text) {
            warn!(error = %e, "cache write failed");
        }
    }

    /// Replace the in-memory document without touching the remote.
    pub fn replace(&self, config: AppConfig) {
        let mut state = self.state.write();
        *state = config;
        self.write_cache(&state);
    }

    /// Apply `f` to the current document and store the result.
    pub fn modify<F>(&self, f: F) -> AppConfig
    where
        F: FnOnce(&AppConfig) -> AppConfig,
    {
        let mut state = self.state.write();
        let updated = f(&state);
        *state = updated;
        self.write_cache(&state);
        state.clone()
    }

    /// Commit `config` locally and push it to the remote.
    #[tracing::instrument(skip_all)]
    pub async fn update_config(&self, config: AppConfig) {
        self.replace(config.clone());
        self.push_remote(&config).await;
    }

    /// Restore the default document locally and remotely.
    #[tracing::instrument(skip_all)]
    pub async fn reset_config(&self) {
        let config = AppConfig::default();
        self.replace(config.clone());
        self.push_remote(&config).await;
    }

    async fn push_remote(&self, config: &AppConfig) {
        let Some(remote) = self.remote.as_ref() else {
            return;
        };
        let data = match serde_json::to_value(config) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "could not serialize config for remote");
                return;
            }
        };
        match upsert(remote.as_ref(), data).await {
            Ok(row) => debug!(id = %row.id, "remote config saved"),
            Err(e) => warn!(error = %e, "remote save failed; kept local copy"),
        }
    }
}
