//! HAL trait definitions and implementations.
//!
//! This module defines the traits for host operations and provides the real
//! (`LinuxHal`), dry-run (`DryRunHal`) and recording (`FakeHal`) backends.

pub mod command_installer;
pub mod disk_ops;
pub mod dry_run;
pub mod fake_hal;
pub mod host_info_ops;
pub mod install_ops;
pub mod linux_hal;
pub mod net_ops;
pub mod power_ops;

pub use command_installer::{CommandInstaller, InstallRequest};
pub use disk_ops::DiskInventory;
pub use dry_run::DryRunHal;
pub use fake_hal::{FakeHal, Operation};
pub use host_info_ops::HostInfo;
pub use install_ops::InstallProcedure;
pub use linux_hal::LinuxHal;
pub use net_ops::{InterfaceAddr, InterfaceAddresses, NetworkDiscovery};
pub use power_ops::SystemActions;
