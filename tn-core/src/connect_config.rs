//! TrueNAS Connect enrollment record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::Url;

pub const DEFAULT_ACCOUNT_SERVICE_URL: &str = "https://account-service.tys1.truenasconnect.net/";
pub const DEFAULT_LECA_SERVICE_URL: &str = "https://dns-service.tys1.truenasconnect.net/";
pub const DEFAULT_HEARTBEAT_SERVICE_URL: &str = "https://heartbeat-service.tys1.truenasconnect.net/";
pub const DEFAULT_TNC_URL: &str = "https://web.truenasconnect.net/";

/// Base URLs of the remote services involved in enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceUrls {
    pub account_service_base_url: Url,
    pub leca_service_base_url: Url,
    pub heartbeat_service_base_url: Url,
    pub tnc_base_url: Url,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        // The constants above are known-good URLs.
        let parse = |raw: &str| Url::parse(raw).unwrap_or_else(|_| unreachable!("{}", raw));
        Self {
            account_service_base_url: parse(DEFAULT_ACCOUNT_SERVICE_URL),
            leca_service_base_url: parse(DEFAULT_LECA_SERVICE_URL),
            heartbeat_service_base_url: parse(DEFAULT_HEARTBEAT_SERVICE_URL),
            tnc_base_url: parse(DEFAULT_TNC_URL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectConfig {
    pub enabled: bool,
    pub ips: Vec<IpAddr>,
    pub interfaces: Vec<String>,
    pub use_all_interfaces: bool,
    pub interfaces_ips: Vec<IpAddr>,
    pub account_service_base_url: Url,
    pub leca_service_base_url: Url,
    pub heartbeat_service_base_url: Url,
    pub tnc_base_url: Url,
    pub claim_token: Option<String>,
    pub claim_token_expiration: Option<DateTime<Utc>>,
    pub system_id: Option<String>,
    pub truenas_version: Option<String>,
    pub initialization_in_progress: bool,
    pub jwt_token: Option<String>,
}

impl ConnectConfig {
    /// Disabled record as created at process start.
    pub fn new(urls: ServiceUrls) -> Self {
        Self {
            enabled: false,
            ips: Vec::new(),
            interfaces: Vec::new(),
            use_all_interfaces: true,
            interfaces_ips: Vec::new(),
            account_service_base_url: urls.account_service_base_url,
            leca_service_base_url: urls.leca_service_base_url,
            heartbeat_service_base_url: urls.heartbeat_service_base_url,
            tnc_base_url: urls.tnc_base_url,
            claim_token: None,
            claim_token_expiration: None,
            system_id: None,
            truenas_version: None,
            initialization_in_progress: false,
            jwt_token: None,
        }
    }

    /// Shallow merge: every field present in `patch` replaces the stored one.
    pub fn apply(&mut self, patch: ConnectConfigPatch) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        set(&mut self.enabled, patch.enabled);
        set(&mut self.ips, patch.ips);
        set(&mut self.interfaces, patch.interfaces);
        set(&mut self.use_all_interfaces, patch.use_all_interfaces);
        set(&mut self.interfaces_ips, patch.interfaces_ips);
        set(&mut self.account_service_base_url, patch.account_service_base_url);
        set(&mut self.leca_service_base_url, patch.leca_service_base_url);
        set(&mut self.heartbeat_service_base_url, patch.heartbeat_service_base_url);
        set(&mut self.tnc_base_url, patch.tnc_base_url);
        set(&mut self.initialization_in_progress, patch.initialization_in_progress);
        if patch.claim_token.is_some() {
            self.claim_token = patch.claim_token;
        }
        if patch.claim_token_expiration.is_some() {
            self.claim_token_expiration = patch.claim_token_expiration;
        }
        if patch.system_id.is_some() {
            self.system_id = patch.system_id;
        }
        if patch.truenas_version.is_some() {
            self.truenas_version = patch.truenas_version;
        }
        if patch.jwt_token.is_some() {
            self.jwt_token = patch.jwt_token;
        }
    }
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self::new(ServiceUrls::default())
    }
}

/// Partial update of a [`ConnectConfig`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<IpAddr>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_all_interfaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces_ips: Option<Vec<IpAddr>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_service_base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leca_service_base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_service_base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tnc_base_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_token_expiration: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truenas_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialization_in_progress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_disabled() {
        let cfg = ConnectConfig::default();
        assert!(!cfg.enabled);
        assert!(!cfg.initialization_in_progress);
        assert!(cfg.claim_token.is_none());
        assert_eq!(cfg.tnc_base_url.as_str(), DEFAULT_TNC_URL);
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut cfg = ConnectConfig::default();
        cfg.apply(ConnectConfigPatch {
            ips: Some(vec!["10.0.0.5".parse().unwrap()]),
            system_id: Some("abc".into()),
            ..Default::default()
        });
        assert_eq!(cfg.ips.len(), 1);
        assert_eq!(cfg.system_id.as_deref(), Some("abc"));
        assert!(!cfg.enabled);
        assert!(cfg.use_all_interfaces);

        cfg.apply(ConnectConfigPatch {
            enabled: Some(true),
            ..Default::default()
        });
        assert!(cfg.enabled);
        assert_eq!(cfg.system_id.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let json = serde_json::to_string(&ConnectConfigPatch::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
