//! Host abstraction layer.
//!
//! Everything that touches the outside world (block devices, the install
//! helper, power actions, network interfaces, firmware and kernel state) goes
//! through the traits in [`hal`] so the workflows can be tested against
//! [`FakeHal`] without root or real hardware.

pub mod hal;
pub mod sysfs;

pub use hal::{
    CommandInstaller, DiskInventory, DryRunHal, FakeHal, HostInfo, InstallProcedure, InterfaceAddr,
    InterfaceAddresses, LinuxHal, NetworkDiscovery, Operation, SystemActions,
};
pub use tn_error::{HalError, HalResult, InstallError};
