//! Host information (read-only).
//!
//! This is "world-touching" (reads `/sys`, `/proc`) and belongs in the HAL.

use crate::HalResult;
use tn_core::plan::SerialConsole;

pub trait HostInfo {
    /// Whether the running installer was itself booted through EFI.
    fn is_efi(&self) -> bool;

    /// Hardware model string (DMI product name), if known.
    fn product_model(&self) -> Option<String>;

    fn proc_cmdline(&self) -> HalResult<String>;

    /// Serial console the installer was booted with, if any.
    fn serial_console(&self) -> Option<SerialConsole> {
        match self.proc_cmdline() {
            Ok(cmdline) => SerialConsole::from_cmdline(&cmdline),
            Err(err) => {
                log::warn!("Could not read kernel command line: {}", err);
                None
            }
        }
    }
}
