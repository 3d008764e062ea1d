use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::error::Result;
use crate::provider::ResourceBackend;
use crate::record::Resource;

use super::policy::{Policy, relative};
use super::restful_cli::UnifiClient;

#[derive(Clone, PartialEq)]
pub enum Auth {
    ApiKey(String),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Auth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
        }
    }
}

/// Connection settings for a UniFi Network controller
#[derive(Debug, Clone)]
pub struct UnifiCfg {
    /// e.g. `https://192.168.1.1/proxy/network/integration/v1`
    pub base_url: String,
    pub site_id: String,
    pub auth: Auth,
    pub insecure_tls: bool,
    pub timeout: Option<Duration>,
    pub retries: u32,
    pub backoff: Duration,
}

impl UnifiCfg {
    pub fn new(base_url: impl Into<String>, site_id: impl Into<String>, auth: Auth) -> Self {
        Self {
            base_url: base_url.into(),
            site_id: site_id.into(),
            auth,
            insecure_tls: false,
            timeout: Some(Duration::from_secs(30)),
            retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

/// DNS policies of one UniFi site, as a resource backend.
///
/// Policies are site-wide; a zone selects the ones whose domain is the zone
/// apex or below it.
pub struct Unifi {
    cli: UnifiClient,
}

impl Unifi {
    pub fn new(cfg: UnifiCfg) -> Result<Self> {
        Ok(Self {
            cli: UnifiClient::new(cfg)?,
        })
    }
}

#[async_trait]
impl ResourceBackend for Unifi {
    async fn list(&self, zone: &str) -> Result<Vec<Resource>> {
        let policies = self.cli.policies_list().await?;
        let total = policies.len();

        let resources: Vec<Resource> = policies
            .into_iter()
            .filter(|p| relative(&p.domain, zone).is_some())
            .map(|p| p.into_resource(zone))
            .collect();

        debug!(
            "unifi: {} of {} dns policies belong to {}",
            resources.len(),
            total,
            zone
        );
        Ok(resources)
    }

    async fn create(&self, zone: &str, resource: &Resource) -> Result<Resource> {
        let policy = Policy::from_resource(resource, zone)?;
        let created = self.cli.policy_create(&policy).await?;
        debug!("unifi: created {} as {:?}", resource.describe(), created.id);
        Ok(created.into_resource(zone))
    }

    async fn update(&self, zone: &str, id: &str, resource: &Resource) -> Result<Resource> {
        let mut policy = Policy::from_resource(resource, zone)?;
        policy.id = Some(id.to_string());
        let updated = self.cli.policy_update(id, &policy).await?;
        debug!("unifi: updated {} ({})", resource.describe(), id);
        Ok(updated.into_resource(zone))
    }

    async fn delete(&self, zone: &str, id: &str) -> Result<()> {
        self.cli.policy_delete(id).await?;
        debug!("unifi: deleted {} from {}", id, zone);
        Ok(())
    }
}
