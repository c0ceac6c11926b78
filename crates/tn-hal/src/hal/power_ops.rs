//! Power actions offered by the main menu.

use crate::HalResult;

#[allow(async_fn_in_trait)]
pub trait SystemActions {
    /// Run `reboot` and wait for it to return.
    async fn reboot(&self) -> HalResult<()>;

    /// Run `shutdown now` and wait for it to return.
    async fn shutdown(&self) -> HalResult<()>;
}
