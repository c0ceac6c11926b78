//! Web UI authentication method selection.

use crate::dialog::Dialog;
use anyhow::Result;
use tn_core::plan::AuthenticationMethod;

pub const AUTH_MENU_TITLE: &str = "Web UI Authentication Method";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChoice {
    AdminUser,
    RootUser,
    WebUi,
}

impl AuthChoice {
    pub const ALL: [AuthChoice; 3] = [AuthChoice::AdminUser, AuthChoice::RootUser, AuthChoice::WebUi];

    pub fn label(self) -> &'static str {
        match self {
            AuthChoice::AdminUser => "Administrative user (truenas_admin)",
            AuthChoice::RootUser => "Root user (not recommended)",
            AuthChoice::WebUi => "Configure using Web UI",
        }
    }
}

/// Ask which account to create, unless the deployment forces the admin user.
///
/// `None` means the operator backed out and the install must not proceed.
pub async fn choose_authentication<D: Dialog>(
    dialog: &D,
    force_admin_user: bool,
) -> Result<Option<AuthenticationMethod>> {
    if force_admin_user {
        return resolve(dialog, AuthChoice::AdminUser).await;
    }

    let labels: Vec<&str> = AuthChoice::ALL.iter().map(|c| c.label()).collect();
    match dialog.menu(AUTH_MENU_TITLE, &labels).await? {
        Some(idx) => match AuthChoice::ALL.get(idx) {
            Some(choice) => resolve(dialog, *choice).await,
            None => Ok(None),
        },
        None => Ok(None),
    }
}

/// Collect whatever the chosen method needs.
pub async fn resolve<D: Dialog>(
    dialog: &D,
    choice: AuthChoice,
) -> Result<Option<AuthenticationMethod>> {
    let method = match choice {
        AuthChoice::AdminUser => {
            prompt_password(
                dialog,
                "Enter your \"truenas_admin\" user password. Root password login will be disabled.",
            )
            .await?
            .map(|password| AuthenticationMethod::AdminUser { password })
        }
        AuthChoice::RootUser => prompt_password(dialog, "Enter your root password.")
            .await?
            .map(|password| AuthenticationMethod::RootUser { password }),
        AuthChoice::WebUi => Some(AuthenticationMethod::WebUiDeferred),
    };
    Ok(method)
}

async fn prompt_password<D: Dialog>(dialog: &D, title: &str) -> Result<Option<String>> {
    Ok(dialog.password(title).await?.filter(|p| !p.is_empty()))
}
