//! Linux HAL implementation using real system state.

use super::net_ops::select_addresses;
use super::{
    DiskInventory, HostInfo, InterfaceAddr, InterfaceAddresses, NetworkDiscovery, SystemActions,
};
use crate::sysfs::block::list_sys_block;
use crate::{HalError, HalResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;
use tn_core::disk::{Disk, ZfsMember};

/// Real HAL implementation for Linux systems.
///
/// All filesystem reads are relative to `root` so tests can point it at a
/// fixture tree.
#[derive(Debug, Clone)]
pub struct LinuxHal {
    root: PathBuf,
}

impl Default for LinuxHal {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxHal {
    pub fn new() -> Self {
        Self::with_root("/")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

async fn run_command(program: &str, args: &[&str]) -> HalResult<String> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|e| map_command_err(program, e))?;
    if !output.status.success() {
        return Err(HalError::CommandFailed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8(output.stdout)?)
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkRow>,
}

#[derive(Debug, Deserialize)]
struct LsblkRow {
    name: String,
    pkname: Option<String>,
    fstype: Option<String>,
    label: Option<String>,
}

/// Map each whole disk to the ZFS pools found on it or its partitions.
///
/// Input is `lsblk --json --list --output NAME,PKNAME,FSTYPE,LABEL`; for a
/// `zfs_member` the label is the pool name.
pub fn parse_lsblk_pools(json: &str) -> HalResult<BTreeMap<String, Vec<ZfsMember>>> {
    let parsed: LsblkOutput =
        serde_json::from_str(json).map_err(|e| HalError::Parse(format!("lsblk: {}", e)))?;
    let mut pools: BTreeMap<String, Vec<ZfsMember>> = BTreeMap::new();
    for row in parsed.blockdevices {
        if row.fstype.as_deref() != Some("zfs_member") {
            continue;
        }
        let Some(pool) = row.label.filter(|l| !l.is_empty()) else {
            continue;
        };
        let disk = row.pkname.unwrap_or(row.name);
        let members = pools.entry(disk).or_default();
        if !members.iter().any(|m| m.pool == pool) {
            members.push(ZfsMember { pool });
        }
    }
    Ok(pools)
}

impl DiskInventory for LinuxHal {
    async fn list_disks(&self) -> HalResult<Vec<Disk>> {
        let devices = list_sys_block(&self.path("sys/block"))?;
        if devices.is_empty() {
            return Ok(Vec::new());
        }

        let lsblk = run_command(
            "lsblk",
            &["--json", "--list", "--output", "NAME,PKNAME,FSTYPE,LABEL"],
        )
        .await?;
        let mut pools = parse_lsblk_pools(&lsblk)?;

        let disks = devices
            .into_iter()
            .map(|dev| Disk {
                zfs_members: pools.remove(&dev.name).unwrap_or_default(),
                model: dev.model.unwrap_or_else(|| "Unknown".to_string()),
                label: dev.serial.unwrap_or_default(),
                size: dev.bytes,
                name: dev.name,
            })
            .collect::<Vec<_>>();
        log::info!("Found {} candidate disk(s)", disks.len());
        Ok(disks)
    }
}

impl HostInfo for LinuxHal {
    fn is_efi(&self) -> bool {
        self.path("sys/firmware/efi").exists()
    }

    fn product_model(&self) -> Option<String> {
        fs::read_to_string(self.path("sys/class/dmi/id/product_name"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn proc_cmdline(&self) -> HalResult<String> {
        Ok(fs::read_to_string(self.path("proc/cmdline"))?)
    }
}

impl SystemActions for LinuxHal {
    async fn reboot(&self) -> HalResult<()> {
        log::info!("Rebooting system");
        run_command("reboot", &[]).await.map(|_| ())
    }

    async fn shutdown(&self) -> HalResult<()> {
        log::info!("Shutting down system");
        run_command("shutdown", &["now"]).await.map(|_| ())
    }
}

fn interface_entries() -> HalResult<Vec<InterfaceAddr>> {
    use nix::net::if_::InterfaceFlags;

    let mut entries = Vec::new();
    for ifaddr in nix::ifaddrs::getifaddrs()? {
        let addr = ifaddr.address.as_ref().and_then(|storage| {
            if let Some(v4) = storage.as_sockaddr_in() {
                Some(IpAddr::V4(v4.ip()))
            } else {
                storage.as_sockaddr_in6().map(|v6| IpAddr::V6(v6.ip()))
            }
        });
        entries.push(InterfaceAddr {
            interface: ifaddr.interface_name,
            addr,
            loopback: ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK),
        });
    }
    Ok(entries)
}

impl NetworkDiscovery for LinuxHal {
    fn available_ip_addresses(&self) -> HalResult<InterfaceAddresses> {
        select_addresses(&interface_entries()?, None)
    }

    fn interface_ips(&self, names: &[String]) -> HalResult<InterfaceAddresses> {
        select_addresses(&interface_entries()?, Some(names))
    }
}
