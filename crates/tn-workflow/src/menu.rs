//! Main menu state machine.

use crate::destination::{select_destination, SelectionOutcome, SelectionSettings};
use crate::dialog::Dialog;
use crate::install_runner::run_install;
use anyhow::Result;
use tn_core::settings::InstallerSettings;
use tn_hal::{DiskInventory, HostInfo, InstallProcedure, SystemActions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    Install,
    Shell,
    Reboot,
    Shutdown,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 4] = [
        MenuEntry::Install,
        MenuEntry::Shell,
        MenuEntry::Reboot,
        MenuEntry::Shutdown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuEntry::Install => "Install/Upgrade",
            MenuEntry::Shell => "Shell",
            MenuEntry::Reboot => "Reboot System",
            MenuEntry::Shutdown => "Shutdown System",
        }
    }
}

/// How the menu loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    Shell,
    PowerAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub vendor: String,
    pub version: String,
    pub force_admin_user: bool,
}

impl ConsoleSettings {
    pub fn title(&self) -> String {
        format!("{} {} Console Setup", self.vendor, self.version)
    }
}

impl From<&InstallerSettings> for ConsoleSettings {
    fn from(settings: &InstallerSettings) -> Self {
        Self {
            vendor: settings.vendor.clone(),
            version: settings.version.clone(),
            force_admin_user: settings.forces_admin_user(),
        }
    }
}

pub struct MainMenu<'a, D, H, I, P> {
    dialog: &'a D,
    host: &'a H,
    installer: &'a I,
    power: &'a P,
    settings: ConsoleSettings,
}

impl<'a, D, H, I, P> MainMenu<'a, D, H, I, P>
where
    D: Dialog,
    H: DiskInventory + HostInfo,
    I: InstallProcedure,
    P: SystemActions,
{
    pub fn new(
        dialog: &'a D,
        host: &'a H,
        installer: &'a I,
        power: &'a P,
        settings: ConsoleSettings,
    ) -> Self {
        Self {
            dialog,
            host,
            installer,
            power,
            settings,
        }
    }

    /// Show the menu until the operator leaves it.
    pub async fn run(&self) -> Result<MenuExit> {
        let title = self.settings.title();
        let labels: Vec<&str> = MenuEntry::ALL.iter().map(|e| e.label()).collect();
        loop {
            let Some(entry) = self
                .dialog
                .menu(&title, &labels)
                .await?
                .and_then(|idx| MenuEntry::ALL.get(idx).copied())
            else {
                continue;
            };
            log::info!("Main menu: {}", entry.label());

            match entry {
                MenuEntry::Install => self.install().await?,
                MenuEntry::Shell => return Ok(MenuExit::Shell),
                MenuEntry::Reboot | MenuEntry::Shutdown => {
                    if self.power_action(entry).await? {
                        return Ok(MenuExit::PowerAction);
                    }
                }
            }
        }
    }

    async fn install(&self) -> Result<()> {
        let disks = match self.host.list_disks().await {
            Ok(disks) => disks,
            Err(err) => {
                log::error!("Disk inventory failed: {}", err);
                self.dialog
                    .msgbox("Choose Destination Media", &err.to_string())
                    .await?;
                return Ok(());
            }
        };

        let selection = SelectionSettings {
            vendor: self.settings.vendor.clone(),
            force_admin_user: self.settings.force_admin_user,
        };
        match select_destination(self.dialog, self.host, &disks, &selection).await? {
            SelectionOutcome::Proceed(plan) => {
                run_install(self.dialog, self.installer, &self.settings.vendor, &plan).await?;
            }
            SelectionOutcome::NotProceeding => log::info!("Installation not started"),
        }
        Ok(())
    }

    /// Returns `true` once the action ran to completion.
    async fn power_action(&self, entry: MenuEntry) -> Result<bool> {
        let result = match entry {
            MenuEntry::Reboot => self.power.reboot().await,
            _ => self.power.shutdown().await,
        };
        match result {
            Ok(()) => Ok(true),
            Err(err) => {
                log::error!("{} failed: {}", entry.label(), err);
                self.dialog
                    .msgbox(entry.label(), &format!("{} failed: {}", entry.label(), err))
                    .await?;
                Ok(false)
            }
        }
    }
}
