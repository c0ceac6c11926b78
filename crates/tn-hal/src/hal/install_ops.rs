//! External install procedure trait.

use crate::InstallError;
use tn_core::plan::InstallationPlan;

/// Wipes, partitions and provisions disks according to a validated plan.
#[allow(async_fn_in_trait)]
pub trait InstallProcedure {
    /// Run the install.
    ///
    /// `progress` receives a non-decreasing fraction in `[0, 1]` and a status
    /// message for every step. Implementations must not hold on to the plan's
    /// password after returning.
    async fn install(
        &self,
        plan: &InstallationPlan,
        progress: &(dyn Fn(f64, &str) + Sync),
    ) -> Result<(), InstallError>;
}
