//! Storage for the enrollment record.
//!
//! Updates are shallow merges and never suspend, so a caller holding a lock
//! across `get`/`update` keeps the whole sequence atomic.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tn_core::connect_config::{ConnectConfig, ConnectConfigPatch, ServiceUrls};
use tn_core::persist::save_json_atomic;
use tn_error::{ConnectError, ConnectResult};

pub trait ConnectCache: Send + Sync {
    fn get(&self) -> ConnectResult<ConnectConfig>;

    /// Merge `patch` into the stored record and return the result.
    fn update(&self, patch: ConnectConfigPatch) -> ConnectResult<ConnectConfig>;
}

fn lock(config: &Mutex<ConnectConfig>) -> MutexGuard<'_, ConnectConfig> {
    // The record is replaced wholesale on update; a poisoned guard still
    // holds a complete value.
    config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-lifetime cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    config: Mutex<ConnectConfig>,
}

impl MemoryCache {
    pub fn new(urls: ServiceUrls) -> Self {
        Self {
            config: Mutex::new(ConnectConfig::new(urls)),
        }
    }
}

impl ConnectCache for MemoryCache {
    fn get(&self) -> ConnectResult<ConnectConfig> {
        Ok(lock(&self.config).clone())
    }

    fn update(&self, patch: ConnectConfigPatch) -> ConnectResult<ConnectConfig> {
        let mut config = lock(&self.config);
        config.apply(patch);
        Ok(config.clone())
    }
}

/// Cache backed by a JSON file that is rewritten atomically on every update.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    config: Mutex<ConnectConfig>,
}

impl JsonFileCache {
    /// Start a disabled record at `path`, replacing whatever an earlier run
    /// left there. Enrollment never carries over between processes.
    pub fn create(path: impl Into<PathBuf>, urls: ServiceUrls) -> ConnectResult<Self> {
        let path = path.into();
        let config = ConnectConfig::new(urls);
        save_json_atomic(&path, &config)
            .map_err(|err| ConnectError::Cache(format!("{:#}", err)))?;
        log::info!("Connect cache reset at {}", path.display());
        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectCache for JsonFileCache {
    fn get(&self) -> ConnectResult<ConnectConfig> {
        Ok(lock(&self.config).clone())
    }

    fn update(&self, patch: ConnectConfigPatch) -> ConnectResult<ConnectConfig> {
        let mut config = lock(&self.config);
        let mut next = config.clone();
        next.apply(patch);
        save_json_atomic(&self.path, &next).map_err(|err| {
            log::error!("Failed to write {}: {:#}", self.path.display(), err);
            ConnectError::Cache(format!("{:#}", err))
        })?;
        *config = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_cache_merges_shallowly() {
        let cache = MemoryCache::default();
        cache
            .update(ConnectConfigPatch {
                ips: Some(vec!["192.0.2.1".parse().unwrap()]),
                ..Default::default()
            })
            .unwrap();
        let config = cache
            .update(ConnectConfigPatch {
                enabled: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert!(config.enabled);
        assert_eq!(config.ips.len(), 1);
    }

    #[test]
    fn file_cache_persists_updates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("connect.json");
        let cache = JsonFileCache::create(&path, ServiceUrls::default()).unwrap();
        assert!(!cache.get().unwrap().enabled);
        cache
            .update(ConnectConfigPatch {
                system_id: Some("abc".into()),
                ..Default::default()
            })
            .unwrap();

        let on_disk: ConnectConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.system_id.as_deref(), Some("abc"));
    }

    #[test]
    fn recreating_discards_previous_enrollment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connect.json");
        let earlier = JsonFileCache::create(&path, ServiceUrls::default()).unwrap();
        earlier
            .update(ConnectConfigPatch {
                enabled: Some(true),
                claim_token: Some("stale".into()),
                initialization_in_progress: Some(true),
                ..Default::default()
            })
            .unwrap();

        let fresh = JsonFileCache::create(&path, ServiceUrls::default()).unwrap();
        assert_eq!(fresh.get().unwrap(), ConnectConfig::default());
        let on_disk: ConnectConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!on_disk.enabled);
        assert!(on_disk.claim_token.is_none());
    }

    #[test]
    fn failed_write_leaves_record_unchanged() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("connect.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        let cache = JsonFileCache {
            path: path.clone(),
            config: Mutex::new(ConnectConfig::default()),
        };
        let err = cache
            .update(ConnectConfigPatch {
                enabled: Some(true),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConnectError::Cache(_)));
        assert!(!cache.get().unwrap().enabled);
    }

    #[test]
    fn unwritable_path_is_a_cache_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connect.json");
        std::fs::create_dir_all(path.join("occupied")).unwrap();
        assert!(matches!(
            JsonFileCache::create(&path, ServiceUrls::default()),
            Err(ConnectError::Cache(_))
        ));
    }
}
