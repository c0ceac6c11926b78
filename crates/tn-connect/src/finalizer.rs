//! Completes enrollment once the operator has claimed the system.

use crate::cache::ConnectCache;
use crate::scheduler::BoxFuture;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tn_core::connect_config::ConnectConfigPatch;

pub const FINALIZE_PATH: &str = "v1/systems/finalize";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub trait RegistrationFinalizer: Send + Sync {
    /// Future that runs to completion in the background.
    fn finalize(&self) -> BoxFuture<()>;
}

#[derive(Debug, Serialize)]
struct FinalizeRequest<'a> {
    system_id: &'a str,
    claim_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct FinalizeResponse {
    token: String,
}

/// Polls the account service until the claim is accepted or expires.
#[derive(Clone)]
pub struct HttpFinalizer {
    client: reqwest::Client,
    cache: Arc<dyn ConnectCache>,
    poll_interval: Duration,
}

impl HttpFinalizer {
    pub fn new(cache: Arc<dyn ConnectCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tn-installer/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            cache,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn run(&self) -> Result<()> {
        let config = self.cache.get()?;
        let (Some(system_id), Some(claim_token), Some(expires)) = (
            config.system_id.as_deref(),
            config.claim_token.as_deref(),
            config.claim_token_expiration,
        ) else {
            log::warn!("Finalization requested without a claim token");
            return Ok(());
        };
        let endpoint = config
            .account_service_base_url
            .join(FINALIZE_PATH)
            .context("Invalid account service URL")?;
        let body = FinalizeRequest {
            system_id,
            claim_token,
        };

        log::info!("Waiting for system {} to be claimed", system_id);
        loop {
            if Utc::now() >= expires {
                log::warn!("Claim token for system {} expired", system_id);
                self.cache.update(ConnectConfigPatch {
                    initialization_in_progress: Some(false),
                    ..Default::default()
                })?;
                return Ok(());
            }

            match self.client.post(endpoint.clone()).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    let issued: FinalizeResponse = response
                        .json()
                        .await
                        .context("Failed to parse finalize response")?;
                    self.cache.update(ConnectConfigPatch {
                        jwt_token: Some(issued.token),
                        initialization_in_progress: Some(false),
                        ..Default::default()
                    })?;
                    log::info!("System {} registered with TrueNAS Connect", system_id);
                    return Ok(());
                }
                Ok(response) => log::debug!("Not claimed yet ({})", response.status()),
                Err(err) => log::warn!("Finalize request failed: {}", err),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl RegistrationFinalizer for HttpFinalizer {
    fn finalize(&self) -> BoxFuture<()> {
        let this = self.clone();
        Box::pin(async move {
            if let Err(err) = this.run().await {
                log::error!("Connect registration failed: {:#}", err);
            }
        })
    }
}
