//! `/sys/block` enumeration.

use crate::{HalError, HalResult};
use std::fs;
use std::path::Path;

/// Kernel name prefixes that are never install targets: loop/ram disks,
/// zvols, device-mapper and md arrays, optical drives.
const IGNORED_PREFIXES: &[&str] = &["loop", "ram", "zram", "zd", "dm-", "md", "sr"];

const SECTOR_SIZE: u64 = 512;

/// One whole-disk entry under `/sys/block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysBlockEntry {
    pub name: String,
    pub bytes: u64,
    pub model: Option<String>,
    /// `device/serial`, or `device/wwid` when the former is absent.
    pub serial: Option<String>,
}

pub fn is_candidate_name(name: &str) -> bool {
    !IGNORED_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Capacity of the device at `dev_dir`, in bytes.
pub fn capacity_bytes(dev_dir: &Path) -> HalResult<u64> {
    let raw = fs::read_to_string(dev_dir.join("size"))?;
    raw.trim()
        .parse::<u64>()
        .map(|sectors| sectors.saturating_mul(SECTOR_SIZE))
        .map_err(|e| HalError::Parse(format!("{}/size: {}", dev_dir.display(), e)))
}

fn attr(dev_dir: &Path, rel: &str) -> Option<String> {
    let value = fs::read_to_string(dev_dir.join(rel)).ok()?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// List candidate disks below `root`, sorted by name.
///
/// Entries with an unreadable or zero size are left out.
pub fn list_sys_block(root: &Path) -> HalResult<Vec<SysBlockEntry>> {
    let mut entries: Vec<SysBlockEntry> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().into_string().ok()?;
            if !is_candidate_name(&name) {
                return None;
            }
            let dir = e.path();
            let bytes = capacity_bytes(&dir).ok().filter(|b| *b > 0)?;
            Some(SysBlockEntry {
                model: attr(&dir, "device/model"),
                serial: attr(&dir, "device/serial").or_else(|| attr(&dir, "device/wwid")),
                name,
                bytes,
            })
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("{} entries under {}", entries.len(), root.display());
    Ok(entries)
}
