//! Runs the install procedure for an approved plan and reports the result.

use crate::dialog::Dialog;
use anyhow::Result;
use std::io::Write;
use tn_core::plan::InstallationPlan;
use tn_hal::InstallProcedure;

pub const ERROR_TITLE: &str = "Installation Error";
pub const SUCCESS_TITLE: &str = "Installation Succeeded";

/// `0.42, "Copying"` -> `[42%] Copying`
pub fn render_progress(fraction: f64, message: &str) -> String {
    // Truncated so 100% only shows once the helper reports completion.
    let pct = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
    format!("[{}%] {}", pct, message)
}

pub fn success_message(vendor: &str, plan: &InstallationPlan) -> String {
    format!(
        "The {} installation on {} succeeded!\nPlease reboot and remove the installation media.",
        vendor,
        plan.destination_names().join(", ")
    )
}

/// Install `plan`, then tell the operator how it went.
///
/// Returns whether the install succeeded. An install failure is not an
/// `Err`: it is shown and the caller goes back to the menu.
pub async fn run_install<D, I>(
    dialog: &D,
    installer: &I,
    vendor: &str,
    plan: &InstallationPlan,
) -> Result<bool>
where
    D: Dialog,
    I: InstallProcedure,
{
    log::info!("Starting installation onto {:?}", plan.destination_names());
    let progress = |fraction: f64, message: &str| {
        let line = render_progress(fraction, message);
        log::info!("{}", line);
        // Progress output is best effort.
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    };

    match installer.install(plan, &progress).await {
        Ok(()) => {
            log::info!("Installation finished");
            dialog
                .msgbox(SUCCESS_TITLE, &success_message(vendor, plan))
                .await?;
            Ok(true)
        }
        Err(err) => {
            log::error!("Installation failed: {}", err.message);
            dialog.msgbox(ERROR_TITLE, &err.message).await?;
            Ok(false)
        }
    }
}
