//! Dry-run backend: logs destructive actions instead of performing them.

use super::{InstallProcedure, SystemActions};
use crate::{HalResult, InstallError};
use std::time::Duration;
use tn_core::plan::InstallationPlan;

const STEPS: [&str; 5] = [
    "Erasing stale boot pool disks",
    "Partitioning destination disks",
    "Creating boot pool",
    "Installing base system",
    "Applying authentication settings",
];

#[derive(Debug, Clone, Default)]
pub struct DryRunHal {
    step_delay: Duration,
}

impl DryRunHal {
    pub fn new(step_delay: Duration) -> Self {
        Self { step_delay }
    }
}

impl InstallProcedure for DryRunHal {
    async fn install(
        &self,
        plan: &InstallationPlan,
        progress: &(dyn Fn(f64, &str) + Sync),
    ) -> Result<(), InstallError> {
        log::info!(
            "DRY RUN: would install to {:?}, wipe {:?}, set_pmbr={}, auth={:?}",
            plan.destination_names(),
            plan.wipe_names(),
            plan.allow_efi,
            plan.authentication
        );
        for (idx, step) in STEPS.iter().enumerate() {
            progress(idx as f64 / STEPS.len() as f64, &format!("[dry-run] {}", step));
            tokio::time::sleep(self.step_delay).await;
        }
        progress(1.0, "[dry-run] Done");
        Ok(())
    }
}

impl SystemActions for DryRunHal {
    async fn reboot(&self) -> HalResult<()> {
        log::info!("DRY RUN: would reboot");
        Ok(())
    }

    async fn shutdown(&self) -> HalResult<()> {
        log::info!("DRY RUN: would shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tn_core::disk::Disk;
    use tn_core::plan::AuthenticationMethod;

    #[tokio::test]
    async fn dry_run_reports_monotonic_progress_to_completion() {
        let plan = InstallationPlan {
            destinations: vec![Disk::new("sda", "m", 1)],
            wipe: Vec::new(),
            allow_efi: false,
            authentication: AuthenticationMethod::WebUiDeferred,
            serial: None,
        };
        let seen = Mutex::new(Vec::new());
        DryRunHal::default()
            .install(&plan, &|p, _| seen.lock().unwrap().push(p))
            .await
            .unwrap();
        let seen = seen.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last().copied(), Some(1.0));
    }
}
