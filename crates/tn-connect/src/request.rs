//! `configure_tnc` parameters, parsed at the API boundary.

use serde::Deserialize;
use std::net::IpAddr;
use tn_core::connect_config::ConnectConfigPatch;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigureRequest {
    pub enabled: bool,
    #[serde(default)]
    pub ips: Option<Vec<IpAddr>>,
    #[serde(default)]
    pub interfaces: Option<Vec<String>>,
    #[serde(default)]
    pub use_all_interfaces: Option<bool>,
    #[serde(default)]
    pub account_service_base_url: Option<Url>,
    #[serde(default)]
    pub leca_service_base_url: Option<Url>,
    #[serde(default)]
    pub heartbeat_service_base_url: Option<Url>,
    #[serde(default)]
    pub tnc_base_url: Option<Url>,
}

impl ConfigureRequest {
    pub fn enable() -> Self {
        Self::with_enabled(true)
    }

    pub fn disable() -> Self {
        Self::with_enabled(false)
    }

    fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            ips: None,
            interfaces: None,
            use_all_interfaces: None,
            account_service_base_url: None,
            leca_service_base_url: None,
            heartbeat_service_base_url: None,
            tnc_base_url: None,
        }
    }

    pub fn interface_names(&self) -> &[String] {
        self.interfaces.as_deref().unwrap_or_default()
    }

    /// Fields exactly as the caller supplied them.
    pub fn to_patch(&self) -> ConnectConfigPatch {
        ConnectConfigPatch {
            enabled: Some(self.enabled),
            ips: self.ips.clone(),
            interfaces: self.interfaces.clone(),
            use_all_interfaces: self.use_all_interfaces,
            account_service_base_url: self.account_service_base_url.clone(),
            leca_service_base_url: self.leca_service_base_url.clone(),
            heartbeat_service_base_url: self.heartbeat_service_base_url.clone(),
            tnc_base_url: self.tnc_base_url.clone(),
            ..ConnectConfigPatch::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enabled_is_required() {
        let err = serde_json::from_value::<ConfigureRequest>(json!({"ips": []})).unwrap_err();
        assert!(err.to_string().contains("enabled"));
    }

    #[test]
    fn unknown_fields_and_bad_addresses_are_rejected() {
        assert!(serde_json::from_value::<ConfigureRequest>(
            json!({"enabled": true, "claim_token": "x"})
        )
        .is_err());
        assert!(serde_json::from_value::<ConfigureRequest>(
            json!({"enabled": true, "ips": ["not-an-ip"]})
        )
        .is_err());
        assert!(serde_json::from_value::<ConfigureRequest>(
            json!({"enabled": true, "tnc_base_url": "::nope"})
        )
        .is_err());
    }

    #[test]
    fn patch_carries_only_supplied_fields() {
        let req: ConfigureRequest = serde_json::from_value(json!({
            "enabled": true,
            "ips": ["192.0.2.10", "2001:db8::1"],
        }))
        .unwrap();
        let patch = req.to_patch();
        assert_eq!(patch.enabled, Some(true));
        assert_eq!(patch.ips.as_ref().map(Vec::len), Some(2));
        assert_eq!(patch.interfaces, None);
        assert_eq!(patch.use_all_interfaces, None);
        assert_eq!(patch.claim_token, None);
    }
}
