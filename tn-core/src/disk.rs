//! Candidate installation media.

use serde::{Deserialize, Serialize};

/// Pool name used by the installed system for its root filesystem.
pub const BOOT_POOL: &str = "boot-pool";

/// Membership of a disk (or one of its partitions) in a ZFS pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZfsMember {
    pub pool: String,
}

/// Snapshot of a storage device taken once per enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub name: String,
    pub model: String,
    pub label: String,
    pub size: u64,
    #[serde(default)]
    pub zfs_members: Vec<ZfsMember>,
}

impl Disk {
    pub fn new(name: impl Into<String>, model: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            label: String::new(),
            size,
            zfs_members: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.zfs_members.push(ZfsMember { pool: pool.into() });
        self
    }

    pub fn has_boot_pool(&self) -> bool {
        self.zfs_members.iter().any(|m| m.pool == BOOT_POOL)
    }

    /// One checklist row: model and label padded to 15 columns, then size.
    pub fn summary(&self) -> String {
        format!(
            "{} {} -- {}",
            pad15(&self.model),
            pad15(&self.label),
            format_size_binary(self.size)
        )
    }
}

fn pad15(value: &str) -> String {
    let cut: String = value.chars().take(15).collect();
    format!("{:<15}", cut)
}

/// Render a byte count with binary units, e.g. `931.51 GiB`.
pub fn format_size_binary(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = "bytes";
    for candidate in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = candidate;
    }
    let rendered = format!("{:.2}", value);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_pool_membership_is_detected() {
        let disk = Disk::new("sda", "Samsung", 1).with_pool("tank");
        assert!(!disk.has_boot_pool());
        let disk = disk.with_pool(BOOT_POOL);
        assert!(disk.has_boot_pool());
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size_binary(512), "512 bytes");
        assert_eq!(format_size_binary(1024), "1 KiB");
        assert_eq!(format_size_binary(1536), "1.5 KiB");
        assert_eq!(format_size_binary(16 * 1024 * 1024 * 1024), "16 GiB");
    }

    #[test]
    fn summary_pads_and_truncates_columns() {
        let disk = Disk::new("sda", "A-very-long-model-name", 1024).with_label("boot");
        assert_eq!(disk.summary(), "A-very-long-mod boot            -- 1 KiB");
    }
}
