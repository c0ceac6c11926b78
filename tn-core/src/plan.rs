//! Validated installation plan handed to the install procedure.

use crate::disk::Disk;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ADMIN_USERNAME: &str = "truenas_admin";
pub const ROOT_USERNAME: &str = "root";

/// How the installed system's web UI login gets its first credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthenticationMethod {
    AdminUser { password: String },
    RootUser { password: String },
    /// Nothing collected on the console; configured later in the browser.
    WebUiDeferred,
}

impl AuthenticationMethod {
    pub fn username(&self) -> Option<&'static str> {
        match self {
            AuthenticationMethod::AdminUser { .. } => Some(ADMIN_USERNAME),
            AuthenticationMethod::RootUser { .. } => Some(ROOT_USERNAME),
            AuthenticationMethod::WebUiDeferred => None,
        }
    }

    pub fn password(&self) -> Option<&str> {
        match self {
            AuthenticationMethod::AdminUser { password }
            | AuthenticationMethod::RootUser { password } => Some(password),
            AuthenticationMethod::WebUiDeferred => None,
        }
    }
}

impl fmt::Debug for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.username() {
            Some(user) => write!(f, "{}(password: <redacted>)", user),
            None => write!(f, "WebUiDeferred"),
        }
    }
}

/// Serial console the installer itself was booted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConsole {
    pub port: String,
    pub speed: u32,
}

impl SerialConsole {
    /// Pick the last `console=ttyS*` entry from a kernel command line.
    ///
    /// `console=ttyS0,115200n8` yields port `ttyS0`, speed `115200`. Without a
    /// speed the kernel default of 9600 applies.
    pub fn from_cmdline(cmdline: &str) -> Option<Self> {
        cmdline
            .split_whitespace()
            .filter_map(|arg| arg.strip_prefix("console="))
            .filter(|value| value.starts_with("ttyS"))
            .last()
            .map(|value| {
                let (port, options) = value.split_once(',').unwrap_or((value, ""));
                let digits: String = options.chars().take_while(|c| c.is_ascii_digit()).collect();
                SerialConsole {
                    port: port.to_string(),
                    speed: digits.parse().unwrap_or(9600),
                }
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPlan {
    pub destinations: Vec<Disk>,
    /// Disks carrying a stale boot pool that were not chosen as destinations.
    pub wipe: Vec<Disk>,
    /// Forwarded to the install procedure as the legacy PMBR flag.
    pub allow_efi: bool,
    pub authentication: AuthenticationMethod,
    pub serial: Option<SerialConsole>,
}

impl InstallationPlan {
    pub fn destination_names(&self) -> Vec<String> {
        self.destinations.iter().map(|d| d.name.clone()).collect()
    }

    pub fn wipe_names(&self) -> Vec<String> {
        self.wipe.iter().map(|d| d.name.clone()).collect()
    }
}
