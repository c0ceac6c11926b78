//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing CI-safe testing without root privileges or real hardware.

use super::net_ops::select_addresses;
use super::{
    DiskInventory, HostInfo, InstallProcedure, InterfaceAddr, InterfaceAddresses,
    NetworkDiscovery, SystemActions,
};
use crate::{HalError, HalResult, InstallError};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use tn_core::disk::Disk;
use tn_core::plan::InstallationPlan;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListDisks,
    Install {
        destinations: Vec<String>,
        wipe: Vec<String>,
        allow_efi: bool,
        username: Option<String>,
    },
    Reboot,
    Shutdown,
}

#[derive(Debug, Clone, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    disks: Vec<Disk>,
    interfaces: Vec<InterfaceAddr>,
    efi: bool,
    model: Option<String>,
    cmdline: String,
    install_failure: Option<String>,
    power_failure: Option<String>,
}

/// Fake HAL that records operations and answers from canned state.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disks(self, disks: Vec<Disk>) -> Self {
        self.state.lock().unwrap().disks = disks;
        self
    }

    /// Add an interface; an empty address list still makes the name known.
    pub fn with_interface(self, name: &str, addrs: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.interfaces.push(InterfaceAddr {
                interface: name.to_string(),
                addr: None,
                loopback: name == "lo",
            });
            for addr in addrs {
                let addr: IpAddr = addr.parse().unwrap();
                state.interfaces.push(InterfaceAddr {
                    interface: name.to_string(),
                    addr: Some(addr),
                    loopback: name == "lo",
                });
            }
        }
        self
    }

    pub fn with_efi(self, efi: bool) -> Self {
        self.state.lock().unwrap().efi = efi;
        self
    }

    pub fn with_model(self, model: &str) -> Self {
        self.state.lock().unwrap().model = Some(model.to_string());
        self
    }

    pub fn with_cmdline(self, cmdline: &str) -> Self {
        self.state.lock().unwrap().cmdline = cmdline.to_string();
        self
    }

    /// Make every install attempt fail with `message`.
    pub fn failing_install(self, message: &str) -> Self {
        self.state.lock().unwrap().install_failure = Some(message.to_string());
        self
    }

    /// Make reboot/shutdown fail with `message`.
    pub fn failing_power(self, message: &str) -> Self {
        self.state.lock().unwrap().power_failure = Some(message.to_string());
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    pub fn install_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| matches!(op, Operation::Install { .. }))
            .count()
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }

    fn power(&self, op: Operation) -> HalResult<()> {
        self.record_operation(op);
        match self.state.lock().unwrap().power_failure.clone() {
            Some(message) => Err(HalError::Other(message)),
            None => Ok(()),
        }
    }
}

impl DiskInventory for FakeHal {
    async fn list_disks(&self) -> HalResult<Vec<Disk>> {
        self.record_operation(Operation::ListDisks);
        Ok(self.state.lock().unwrap().disks.clone())
    }
}

impl InstallProcedure for FakeHal {
    async fn install(
        &self,
        plan: &InstallationPlan,
        progress: &(dyn Fn(f64, &str) + Sync),
    ) -> Result<(), InstallError> {
        self.record_operation(Operation::Install {
            destinations: plan.destination_names(),
            wipe: plan.wipe_names(),
            allow_efi: plan.allow_efi,
            username: plan.authentication.username().map(str::to_string),
        });
        progress(0.0, "Partitioning");
        if let Some(message) = self.state.lock().unwrap().install_failure.clone() {
            return Err(InstallError::new(message));
        }
        progress(1.0, "Done");
        Ok(())
    }
}

impl SystemActions for FakeHal {
    async fn reboot(&self) -> HalResult<()> {
        self.power(Operation::Reboot)
    }

    async fn shutdown(&self) -> HalResult<()> {
        self.power(Operation::Shutdown)
    }
}

impl HostInfo for FakeHal {
    fn is_efi(&self) -> bool {
        self.state.lock().unwrap().efi
    }

    fn product_model(&self) -> Option<String> {
        self.state.lock().unwrap().model.clone()
    }

    fn proc_cmdline(&self) -> HalResult<String> {
        Ok(self.state.lock().unwrap().cmdline.clone())
    }
}

impl NetworkDiscovery for FakeHal {
    fn available_ip_addresses(&self) -> HalResult<InterfaceAddresses> {
        select_addresses(&self.state.lock().unwrap().interfaces, None)
    }

    fn interface_ips(&self, names: &[String]) -> HalResult<InterfaceAddresses> {
        select_addresses(&self.state.lock().unwrap().interfaces, Some(names))
    }
}
