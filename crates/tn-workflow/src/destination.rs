//! Destination media selection.
//!
//! Turns a disk inventory plus operator input into a validated
//! [`InstallationPlan`]. Nothing destructive happens here; backing out at
//! any prompt yields [`SelectionOutcome::NotProceeding`].

use crate::auth::choose_authentication;
use crate::dialog::Dialog;
use anyhow::Result;
use tn_core::disk::Disk;
use tn_core::plan::InstallationPlan;
use tn_hal::HostInfo;

pub const CHOOSE_MEDIA_TITLE: &str = "Choose Destination Media";
pub const LEGACY_BOOT_TITLE: &str = "Legacy Boot";
/// The stale boot-pool prompt keeps this title regardless of vendor.
pub const STALE_BOOT_POOL_TITLE: &str = "TrueNAS Installation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Proceed(InstallationPlan),
    NotProceeding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSettings {
    pub vendor: String,
    pub force_admin_user: bool,
}

/// Disks that carry a boot pool but were not chosen as destinations.
///
/// Leaving them alone would leave several `boot-pool`s behind with different
/// GUIDs and break pool import on first boot. Inventory order is kept.
pub fn compute_wipe_disks<'a>(disks: &'a [Disk], destinations: &[String]) -> Vec<&'a Disk> {
    disks
        .iter()
        .filter(|disk| disk.has_boot_pool() && !destinations.contains(&disk.name))
        .collect()
}

pub fn stale_boot_pool_warning(wipe: &[String]) -> String {
    let names = wipe.join(", ");
    [
        format!(
            "Disk(s) {} contain existing TrueNAS boot pool, but they were not selected for \
             TrueNAS installation. This configuration will not work unless these disks are erased.",
            names
        ),
        String::new(),
        format!("Proceed with erasing {}?", names),
    ]
    .join("\n")
}

pub fn erase_warning(destinations: &[String], wipe: &[String]) -> String {
    let mut erased: Vec<&str> = wipe
        .iter()
        .chain(destinations.iter())
        .map(String::as_str)
        .collect();
    erased.sort_unstable();
    [
        "WARNING:".to_string(),
        format!("- This erases ALL partitions and data on {}.", erased.join(", ")),
        format!(
            "- {} will be unavailable for use in storage pools.",
            destinations.join(", ")
        ),
        String::new(),
        "NOTE:".to_string(),
        "- Installing on SATA, SAS, or NVMe flash media is recommended.".to_string(),
        "  USB flash sticks are discouraged.".to_string(),
        String::new(),
        "Proceed with the installation?".to_string(),
    ]
    .join("\n")
}

fn checklist_text(vendor: &str) -> String {
    format!(
        "Install {vendor} to a drive. If desired, select multiple drives to provide redundancy. \
         {vendor} installation drive(s) are not available for use in storage pools. Use arrow \
         keys to navigate options. Press spacebar to select."
    )
}

fn select_disks(disks: &[Disk], names: &[String]) -> Vec<Disk> {
    names
        .iter()
        .filter_map(|name| disks.iter().find(|d| &d.name == name).cloned())
        .collect()
}

/// Run the selection workflow over `disks`.
pub async fn select_destination<D, H>(
    dialog: &D,
    host: &H,
    disks: &[Disk],
    settings: &SelectionSettings,
) -> Result<SelectionOutcome>
where
    D: Dialog,
    H: HostInfo,
{
    if disks.is_empty() {
        dialog.msgbox(CHOOSE_MEDIA_TITLE, "No drives available").await?;
        return Ok(SelectionOutcome::NotProceeding);
    }

    let rows: Vec<(String, String)> = disks
        .iter()
        .map(|disk| (disk.name.clone(), disk.summary()))
        .collect();

    let (destinations, wipe) = loop {
        let Some(chosen) = dialog
            .checklist(CHOOSE_MEDIA_TITLE, &checklist_text(&settings.vendor), &rows)
            .await?
        else {
            log::info!("Destination selection cancelled");
            return Ok(SelectionOutcome::NotProceeding);
        };

        // Keep only names that exist in this inventory.
        let destinations: Vec<String> = chosen
            .into_iter()
            .filter(|name| disks.iter().any(|d| &d.name == name))
            .collect();
        if destinations.is_empty() {
            dialog
                .msgbox(
                    CHOOSE_MEDIA_TITLE,
                    "Select at least one disk to proceed with the installation.",
                )
                .await?;
            continue;
        }

        let wipe: Vec<String> = compute_wipe_disks(disks, &destinations)
            .into_iter()
            .map(|d| d.name.clone())
            .collect();
        if !wipe.is_empty()
            && !dialog
                .yesno(STALE_BOOT_POOL_TITLE, &stale_boot_pool_warning(&wipe))
                .await?
        {
            continue;
        }

        break (destinations, wipe);
    };

    if !dialog
        .yesno(
            &format!("{} Installation", settings.vendor),
            &erase_warning(&destinations, &wipe),
        )
        .await?
    {
        log::info!("Installation declined at final confirmation");
        return Ok(SelectionOutcome::NotProceeding);
    }

    let Some(authentication) = choose_authentication(dialog, settings.force_admin_user).await?
    else {
        log::info!("Authentication setup cancelled");
        return Ok(SelectionOutcome::NotProceeding);
    };

    let allow_efi = if host.is_efi() {
        false
    } else {
        dialog
            .yesno(
                LEGACY_BOOT_TITLE,
                "Allow EFI boot? Enter Yes for systems with newer components such as NVMe \
                 devices. Enter No when system hardware requires legacy BIOS boot workaround.",
            )
            .await?
    };

    let plan = InstallationPlan {
        destinations: select_disks(disks, &destinations),
        wipe: select_disks(disks, &wipe),
        allow_efi,
        authentication,
        serial: host.serial_console(),
    };
    log::info!(
        "Plan ready: destinations={:?} wipe={:?} allow_efi={}",
        plan.destination_names(),
        plan.wipe_names(),
        plan.allow_efi
    );
    Ok(SelectionOutcome::Proceed(plan))
}
