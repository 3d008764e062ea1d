use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::error::Result;
use crate::wrapper::http::{Client, ClientOptions, Header, HeaderKey, Response};

use super::policy::{Page, Policy};
use super::unifi::{Auth, UnifiCfg};

const PAGE_LIMIT: u64 = 200;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Doubles a retry delay, capped at `MAX_BACKOFF`.
pub(super) fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}

impl From<Auth> for Vec<Header> {
    fn from(auth: Auth) -> Self {
        match auth {
            Auth::ApiKey(key) => vec![Header::new(
                HeaderKey::Custom("X-API-KEY".to_string()),
                key,
            )],
        }
    }
}

pub(super) struct UnifiClient {
    base_url: String,
    site_id: String,
    retries: u32,
    backoff: Duration,
    cli: Client,
}

impl UnifiClient {
    pub fn new(cfg: UnifiCfg) -> Result<Self> {
        let mut cli = Client::new(&ClientOptions {
            timeout: cfg.timeout,
            accept_invalid_certs: cfg.insecure_tls,
        })?;

        let mut headers: Vec<Header> = cfg.auth.into();
        headers.push(Header::new(
            HeaderKey::Accept,
            "application/json".to_string(),
        ));
        headers.push(Header::new(
            HeaderKey::ContentType,
            "application/json".to_string(),
        ));
        cli.set_default_headers(headers);

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            site_id: cfg.site_id,
            retries: cfg.retries,
            backoff: cfg.backoff,
            cli,
        })
    }

    fn policies_url(&self) -> String {
        format!("{}/sites/{}/dns/policies", self.base_url, self.site_id)
    }

    fn policy_url(&self, id: &str) -> String {
        format!("{}/{}", self.policies_url(), id)
    }

    /// Retries 429 responses with a doubling, capped delay, and for idempotent
    /// requests also transport failures and 5xx. Other responses are
    /// returned to the caller unchecked.
    async fn with_retry<F, Fut>(&self, what: &str, idempotent: bool, send: F) -> Result<Response>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Response>>,
    {
        let mut delay = self.backoff;
        let mut attempt = 0;

        loop {
            let result = send().await;
            let retryable = match &result {
                Ok(resp) => resp.status == 429 || (idempotent && resp.status >= 500),
                Err(_) => idempotent,
            };

            if !retryable || attempt >= self.retries {
                return result;
            }

            attempt += 1;
            match &result {
                Ok(resp) => warn!(
                    "{}: status {}, retry {}/{} in {:?}",
                    what, resp.status, attempt, self.retries, delay
                ),
                Err(e) => warn!(
                    "{}: {}, retry {}/{} in {:?}",
                    what, e, attempt, self.retries, delay
                ),
            }
            tokio::time::sleep(delay).await;
            delay = next_backoff(delay);
        }
    }
}

impl UnifiClient {
    pub async fn policies_list(&self) -> Result<Vec<Policy>> {
        let mut policies = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let url = format!(
                "{}?offset={}&limit={}",
                self.policies_url(),
                offset,
                PAGE_LIMIT
            );
            let resp = self.with_retry("list dns policies", true, || self.cli.get(&url)).await?;
            let page: Page = resp.into_json()?;

            let fetched = page.data.len() as u64;
            debug!(
                "dns policies page at offset {}: {} of {}",
                offset, fetched, page.total_count
            );
            policies.extend(page.data);
            offset += fetched;

            if fetched == 0 || offset >= page.total_count {
                break;
            }
        }

        Ok(policies)
    }

    pub async fn policy_create(&self, policy: &Policy) -> Result<Policy> {
        let url = self.policies_url();
        let body = serde_json::to_string(policy)?;
        let resp = self
            .with_retry("create dns policy", false, || self.cli.post(&url, body.clone()))
            .await?;
        resp.into_json()
    }

    pub async fn policy_update(&self, id: &str, policy: &Policy) -> Result<Policy> {
        let url = self.policy_url(id);
        let body = serde_json::to_string(policy)?;
        let resp = self
            .with_retry("update dns policy", true, || self.cli.put(&url, body.clone()))
            .await?;
        resp.into_json()
    }

    pub async fn policy_delete(&self, id: &str) -> Result<()> {
        let url = self.policy_url(id);
        let resp = self
            .with_retry("delete dns policy", true, || self.cli.delete(&url))
            .await?;
        resp.into_body()?;
        Ok(())
    }
}
