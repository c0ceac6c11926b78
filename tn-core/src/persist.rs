//! Small JSON documents persisted with atomic replace.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let tmp_path = temp_path(path);
    let payload = serde_json::to_string_pretty(value).context("Failed to serialize document")?;

    let mut file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file: {}", tmp_path.display()))?;
    file.write_all(payload.as_bytes())
        .context("Failed to write document")?;
    file.sync_all().context("Failed to flush document")?;

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to atomically replace {}", path.display()))?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            dir.sync_all().ok();
        }
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document.json");
    path.with_file_name(format!("{}.tmp", file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_config::ConnectConfig;
    use tempfile::tempdir;

    fn read(path: &Path) -> ConnectConfig {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn save_replaces_without_leaving_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/connect.json");
        let mut cfg = ConnectConfig::default();
        save_json_atomic(&path, &cfg).unwrap();
        cfg.enabled = true;
        save_json_atomic(&path, &cfg).unwrap();

        assert!(read(&path).enabled);
        assert!(!dir.path().join("nested/connect.json.tmp").exists());
    }

    #[test]
    fn blocked_destination_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("connect.json");
        fs::create_dir_all(path.join("occupied")).unwrap();
        assert!(save_json_atomic(&path, &ConnectConfig::default()).is_err());
    }
}
