use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use unifi_dns::error::Error;
use unifi_dns::error::Result;
use unifi_dns::provider::Auth;
use unifi_dns::provider::UnifiCfg;
use unifi_dns::reconciler::ReconcilerCfg;
use unifi_dns::record::ZoneName;

////////////////////////////////////////////////////////////
// Parameters
////////////////////////////////////////////////////////////
#[derive(Debug, Clone, Deserialize)]
pub struct CfgParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CfgParamList(Vec<CfgParam>);

impl CfgParamList {
    pub fn iter(&self) -> impl Iterator<Item = &CfgParam> {
        self.0.iter()
    }
}

impl From<Vec<CfgParam>> for CfgParamList {
    fn from(params: Vec<CfgParam>) -> Self {
        Self(params)
    }
}

////////////////////////////////////////////////////////////
// Provider
////////////////////////////////////////////////////////////
#[derive(Debug, Clone, Deserialize)]
pub struct CfgProviderAuthentication {
    pub method: String,
    pub params: CfgParamList,
}

impl CfgProviderAuthentication {
    pub fn api_key(key: String) -> Self {
        Self {
            method: "api_key".to_string(),
            params: vec![CfgParam {
                name: "api_key".to_string(),
                value: key,
            }]
            .into(),
        }
    }

    pub fn get_value_ref(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == key)
            .map(|p| p.value.as_str())
    }
}

impl TryFrom<CfgProviderAuthentication> for Auth {
    type Error = Error;

    fn try_from(cfg: CfgProviderAuthentication) -> Result<Self> {
        if cfg.method == "api_key" {
            let key = cfg.get_value_ref("api_key").ok_or(Error::ConfigError(
                "unifi authentication method is declared as api_key, but api_key is not found"
                    .to_string(),
            ))?;
            Ok(Auth::ApiKey(key.to_string()))
        } else {
            Err(Error::ConfigError(format!(
                "{}: unsupported authentication method for unifi provider",
                cfg.method
            )))
        }
    }
}

fn unifi() -> String {
    "unifi".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CfgProvider {
    #[serde(default = "unifi")]
    pub r#type: String,

    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub site_id: Option<String>,

    #[serde(default)]
    pub authentication: Option<CfgProviderAuthentication>,

    #[serde(default)]
    pub insecure_tls: bool,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub retries: Option<u32>,
}

impl Default for CfgProvider {
    fn default() -> Self {
        Self {
            r#type: unifi(),
            base_url: None,
            site_id: None,
            authentication: None,
            insecure_tls: false,
            timeout: None,
            retries: None,
        }
    }
}

impl TryFrom<CfgProvider> for UnifiCfg {
    type Error = Error;

    fn try_from(cfg: CfgProvider) -> Result<Self> {
        if cfg.r#type != "unifi" {
            return Err(Error::ConfigError(format!(
                "{}: unsupported provider type",
                cfg.r#type
            )));
        }

        let base_url = cfg.base_url.ok_or(Error::ConfigError(
            "base url is not set (--base-url, UNIFI_BASE_URL or provider.base_url)".to_string(),
        ))?;
        let site_id = cfg.site_id.ok_or(Error::ConfigError(
            "site id is not set (--site-id, UNIFI_SITE_ID or provider.site_id)".to_string(),
        ))?;
        let auth: Auth = cfg
            .authentication
            .ok_or(Error::ConfigError(
                "api key is not set (--api-key, UNIFI_API_KEY or provider.authentication)"
                    .to_string(),
            ))?
            .try_into()?;

        let mut unifi = UnifiCfg::new(base_url, site_id, auth);
        unifi.insecure_tls = cfg.insecure_tls;
        if let Some(secs) = cfg.timeout {
            unifi.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(retries) = cfg.retries {
            unifi.retries = retries;
        }

        Ok(unifi)
    }
}

////////////////////////////////////////////////////////////
// Yaml parser
////////////////////////////////////////////////////////////
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Cfg {
    #[serde(default)]
    pub zone: Option<ZoneName>,

    #[serde(default)]
    pub provider: Option<CfgProvider>,

    #[serde(default)]
    pub reconciler: ReconcilerCfg,
}

pub struct Parser;

impl Parser {
    pub fn parse_yaml<P: AsRef<Path>>(path: P) -> Result<Cfg> {
        let reader = Self::file_reader(path)?;
        let config: Cfg = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    fn file_reader<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
        let f = std::fs::File::open(path)?;
        Ok(BufReader::new(f))
    }
}

////////////////////////////////////////////////////////////
// Unit test
////////////////////////////////////////////////////////////
#[cfg(test)]
#[path = "config_test.rs"]
mod test;
