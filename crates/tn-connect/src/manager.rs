//! One-shot TrueNAS Connect enrollment.

use crate::cache::ConnectCache;
use crate::finalizer::RegistrationFinalizer;
use crate::request::ConfigureRequest;
use crate::scheduler::TaskSpawner;
use crate::uri::{model_identifier, registration_uri};
use chrono::{Duration, Utc};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use tn_core::connect_config::ConnectConfig;
use tn_error::{ConnectError, ConnectResult, HalError};
use tn_hal::NetworkDiscovery;
use uuid::Uuid;

pub const CLAIM_TOKEN_LIFETIME_MINUTES: i64 = 45;

/// What the running installer reports about itself during enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    pub version: String,
    /// DMI product name, as read at startup.
    pub model: Option<String>,
}

pub struct ConnectManager {
    cache: Arc<dyn ConnectCache>,
    network: Arc<dyn NetworkDiscovery + Send + Sync>,
    finalizer: Arc<dyn RegistrationFinalizer>,
    spawner: Arc<dyn TaskSpawner>,
    identity: SystemIdentity,
    /// Set once an enable request has been accepted; never cleared.
    configured: Mutex<bool>,
}

impl ConnectManager {
    pub fn new(
        cache: Arc<dyn ConnectCache>,
        network: Arc<dyn NetworkDiscovery + Send + Sync>,
        finalizer: Arc<dyn RegistrationFinalizer>,
        spawner: Arc<dyn TaskSpawner>,
        identity: SystemIdentity,
    ) -> Self {
        Self {
            cache,
            network,
            finalizer,
            spawner,
            identity,
            configured: Mutex::new(false),
        }
    }

    pub fn config(&self) -> ConnectResult<ConnectConfig> {
        self.cache.get()
    }

    pub fn configure(&self, request: ConfigureRequest) -> ConnectResult<ConnectConfig> {
        // Held until the record is stored, so concurrent callers serialize here.
        let mut configured = self
            .configured
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *configured {
            return Err(ConnectError::AlreadyConfigured);
        }

        let mut patch = request.to_patch();
        if !request.enabled {
            let stored = self.cache.update(patch)?;
            log::info!("TrueNAS Connect stored as disabled");
            return Ok(stored);
        }

        let (use_all_interfaces, interfaces_ips) = self.resolve_addresses(&request)?;
        let expires = Utc::now() + Duration::minutes(CLAIM_TOKEN_LIFETIME_MINUTES);
        patch.use_all_interfaces = Some(use_all_interfaces);
        patch.interfaces_ips = Some(interfaces_ips);
        patch.claim_token = Some(Uuid::new_v4().to_string());
        patch.claim_token_expiration = Some(expires);
        patch.system_id = Some(Uuid::new_v4().to_string());
        patch.truenas_version = Some(self.identity.version.clone());
        patch.initialization_in_progress = Some(true);

        // One write: either the whole enrollment lands or nothing does.
        let stored = self.cache.update(patch)?;
        *configured = true;
        log::info!(
            "TrueNAS Connect enabled for system {}, claim expires {}",
            stored.system_id.as_deref().unwrap_or_default(),
            expires
        );
        self.spawner
            .spawn("tnc-finalize-registration", self.finalizer.finalize());
        Ok(stored)
    }

    pub fn registration_uri(&self) -> ConnectResult<String> {
        let config = self.cache.get()?;
        if !config.initialization_in_progress {
            return Err(ConnectError::NotEnabled);
        }
        registration_uri(&config, &model_identifier(self.identity.model.as_deref()))
    }

    /// Work out `use_all_interfaces` and the interface-derived addresses
    /// for an enable request.
    fn resolve_addresses(&self, request: &ConfigureRequest) -> ConnectResult<(bool, Vec<IpAddr>)> {
        let interfaces = request.interface_names();
        if !interfaces.is_empty() && request.use_all_interfaces.unwrap_or(true) {
            return Err(ConnectError::AmbiguousInterfaces);
        }
        let use_all_interfaces = request
            .use_all_interfaces
            .unwrap_or(interfaces.is_empty());

        let interfaces_ips = if !interfaces.is_empty() {
            self.network
                .interface_ips(interfaces)
                .map_err(|err| match err {
                    HalError::ValidationFailed(msg) => ConnectError::InvalidInterface(msg),
                    other => ConnectError::Discovery(other.to_string()),
                })?
                .combined()
        } else if use_all_interfaces {
            self.network
                .available_ip_addresses()
                .map_err(|err| ConnectError::Discovery(err.to_string()))?
                .combined()
        } else {
            Vec::new()
        };

        let user_ips = request.ips.as_deref().unwrap_or_default();
        if user_ips.is_empty() && interfaces_ips.is_empty() {
            return Err(ConnectError::NoAddresses);
        }
        Ok((use_all_interfaces, interfaces_ips))
    }
}
