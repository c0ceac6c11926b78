//! Network address discovery.

use crate::{HalError, HalResult};
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Addresses found on one or more interfaces, split by family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceAddresses {
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
}

impl InterfaceAddresses {
    /// IPv4 addresses first, then IPv6, each in discovery order.
    pub fn combined(&self) -> Vec<IpAddr> {
        self.ipv4
            .iter()
            .copied()
            .map(IpAddr::V4)
            .chain(self.ipv6.iter().copied().map(IpAddr::V6))
            .collect()
    }

    fn push(&mut self, addr: IpAddr) {
        match addr {
            IpAddr::V4(v4) if !self.ipv4.contains(&v4) => self.ipv4.push(v4),
            IpAddr::V6(v6) if !self.ipv6.contains(&v6) => self.ipv6.push(v6),
            _ => {}
        }
    }
}

/// One `getifaddrs` entry. Interfaces without an address still show up so
/// that their names can be validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub interface: String,
    pub addr: Option<IpAddr>,
    pub loopback: bool,
}

pub trait NetworkDiscovery {
    /// Every routable address on every non-loopback interface.
    fn available_ip_addresses(&self) -> HalResult<InterfaceAddresses>;

    /// Addresses of the named interfaces. Unknown names are a validation error.
    fn interface_ips(&self, names: &[String]) -> HalResult<InterfaceAddresses>;
}

fn is_registrable(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => !v4.is_loopback() && !v4.is_link_local() && !v4.is_unspecified(),
        // fe80::/10
        IpAddr::V6(v6) => {
            !v6.is_loopback() && !v6.is_unspecified() && (v6.segments()[0] & 0xffc0) != 0xfe80
        }
    }
}

/// Filter raw interface entries down to the addresses worth registering.
///
/// With `only = Some(names)` every name must exist among `entries`.
pub fn select_addresses(
    entries: &[InterfaceAddr],
    only: Option<&[String]>,
) -> HalResult<InterfaceAddresses> {
    if let Some(names) = only {
        let known: BTreeSet<&str> = entries.iter().map(|e| e.interface.as_str()).collect();
        let missing: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(HalError::ValidationFailed(format!(
                "Interface(s) not found: {}",
                missing.join(", ")
            )));
        }
    }

    let mut out = InterfaceAddresses::default();
    for entry in entries {
        if entry.loopback {
            continue;
        }
        if let Some(names) = only {
            if !names.iter().any(|n| n == &entry.interface) {
                continue;
            }
        }
        if let Some(addr) = entry.addr.filter(is_registrable) {
            out.push(addr);
        }
    }
    Ok(out)
}
