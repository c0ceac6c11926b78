//! Disk inventory trait.

use crate::HalResult;
use tn_core::disk::Disk;

/// Source of candidate installation media.
#[allow(async_fn_in_trait)]
pub trait DiskInventory {
    /// Enumerate disks with their current ZFS pool memberships.
    ///
    /// An empty list is a valid answer (no usable drives).
    async fn list_disks(&self) -> HalResult<Vec<Disk>>;
}
