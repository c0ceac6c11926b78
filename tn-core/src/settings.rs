//! Installer settings loaded from TOML.
//!
//! Every key is optional; a missing file means "all defaults". CLI flags are
//! applied on top by the binary.

use crate::connect_config::ServiceUrls;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_PATH: &str = "/etc/tn-installer/installer.toml";
pub const DEFAULT_INSTALL_COMMAND: &str = "/usr/sbin/truenas-install";
pub const DEFAULT_CONNECT_CACHE: &str = "/var/lib/tn-installer/connect.json";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Vendor whose deployments always create the admin user.
const ADMIN_ONLY_VENDOR: &str = "HexOS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerSettings {
    pub vendor: String,
    pub version: String,
    /// Skip the authentication menu and always create the admin user.
    /// Unset means "only for the HexOS vendor".
    pub force_admin_user: Option<bool>,
    pub listen: SocketAddr,
    pub install_command: PathBuf,
    pub connect_cache_path: PathBuf,
    pub connect: ServiceUrls,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            vendor: "TrueNAS".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            force_admin_user: None,
            listen: DEFAULT_LISTEN
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8080))),
            install_command: PathBuf::from(DEFAULT_INSTALL_COMMAND),
            connect_cache_path: PathBuf::from(DEFAULT_CONNECT_CACHE),
            connect: ServiceUrls::default(),
        }
    }
}

impl InstallerSettings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid settings: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn forces_admin_user(&self) -> bool {
        self.force_admin_user
            .unwrap_or(self.vendor == ADMIN_ONLY_VENDOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = InstallerSettings::load(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(settings, InstallerSettings::default());
        assert!(!settings.forces_admin_user());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let settings = InstallerSettings::parse(
            r#"
vendor = "HexOS"
version = "25.04.1"

[connect]
account_service_base_url = "https://account.example.net/"
leca_service_base_url = "https://leca.example.net/"
heartbeat_service_base_url = "https://hb.example.net/"
tnc_base_url = "https://tnc.example.net/"
"#,
        )
        .unwrap();
        assert_eq!(settings.vendor, "HexOS");
        assert_eq!(settings.version, "25.04.1");
        assert!(settings.forces_admin_user());
        assert_eq!(settings.connect.tnc_base_url.as_str(), "https://tnc.example.net/");
        assert_eq!(settings.install_command, PathBuf::from(DEFAULT_INSTALL_COMMAND));
    }

    #[test]
    fn explicit_flag_beats_vendor_default() {
        let settings =
            InstallerSettings::parse("vendor = \"HexOS\"\nforce_admin_user = false\n").unwrap();
        assert!(!settings.forces_admin_user());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(InstallerSettings::parse("vendr = \"typo\"").is_err());
    }
}
