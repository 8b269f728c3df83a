//! Reachability probes
//!
//! A probe answers one question: is the provider's base endpoint reachable
//! right now. The default probe issues a plain GET; any status below 400
//! counts as reachable.

use crate::utils::error::{GatewayError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Reachability check against a provider endpoint
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe `base_url`, failing if it is unreachable or answers with an error status
    async fn probe(&self, provider_id: &str, base_url: &str) -> Result<()>;
}

/// HTTP GET probe
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a probe around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, provider_id: &str, base_url: &str) -> Result<()> {
        let response = self.client.get(base_url).send().await?;
        let status = response.status();
        debug!("Probe for {} returned {}", provider_id, status);

        if status.as_u16() < 400 {
            Ok(())
        } else {
            Err(GatewayError::ProbeFailed(format!(
                "{} answered {}",
                provider_id, status
            )))
        }
    }
}
