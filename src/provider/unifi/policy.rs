use serde::{Deserialize, Serialize};

use crate::error::{Error, MappingError, Result};
use crate::record::{RecordType, Resource, ResourceValue};

const A_RECORD: &str = "A_RECORD";
const AAAA_RECORD: &str = "AAAA_RECORD";
const CNAME_RECORD: &str = "CNAME_RECORD";
const TXT_RECORD: &str = "TXT_RECORD";
const MX_RECORD: &str = "MX_RECORD";
const SRV_RECORD: &str = "SRV_RECORD";

/// A DNS policy as exchanged with the controller.
///
/// Fields not used by any supported type are kept in `extra` so that
/// policies such as `FORWARD_DOMAIN` survive as opaque resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub policy_type: String,

    #[serde(default = "enabled")]
    pub enabled: bool,

    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_server_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn enabled() -> bool {
    true
}

/// One page of a list call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Page {
    #[serde(default)]
    pub total_count: u64,

    #[serde(default)]
    pub data: Vec<Policy>,
}

/// Fully qualified domain of `name` in `zone`, without trailing dot.
pub(super) fn fqdn(name: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.');
    match name {
        "" | "@" => zone.to_string(),
        abs if abs.ends_with('.') => abs.trim_end_matches('.').to_string(),
        rel => format!("{}.{}", rel, zone),
    }
}

/// Name of `domain` relative to `zone`, `None` if it lies outside.
pub(super) fn relative(domain: &str, zone: &str) -> Option<String> {
    let zone = zone.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_end_matches('.');
    let lower = domain.to_ascii_lowercase();

    if lower == zone {
        return Some("@".to_string());
    }

    // ASCII lowercasing keeps byte offsets, so the cut is a char boundary
    lower
        .strip_suffix(zone.as_str())
        .filter(|head| head.ends_with('.') && head.len() > 1)
        .map(|head| domain[..head.len() - 1].to_string())
}

impl Policy {
    pub fn into_resource(self, zone: &str) -> Resource {
        let name = relative(&self.domain, zone).unwrap_or_else(|| format!("{}.", self.domain));
        let ttl = self.ttl_seconds.unwrap_or(0);
        let id = self.id.clone();

        let (rtype, value) = match self.policy_type.as_str() {
            A_RECORD => (
                RecordType::A.as_str().to_string(),
                ResourceValue::Content(self.ipv4_address.unwrap_or_default()),
            ),
            AAAA_RECORD => (
                RecordType::AAAA.as_str().to_string(),
                ResourceValue::Content(self.ipv6_address.unwrap_or_default()),
            ),
            CNAME_RECORD => (
                RecordType::CNAME.as_str().to_string(),
                ResourceValue::Content(self.target_domain.unwrap_or_default()),
            ),
            TXT_RECORD => (
                RecordType::TXT.as_str().to_string(),
                ResourceValue::Content(self.text.unwrap_or_default()),
            ),
            MX_RECORD => (
                RecordType::MX.as_str().to_string(),
                ResourceValue::Mx {
                    preference: self.priority.unwrap_or_default(),
                    target: self.mail_server_domain.unwrap_or_default(),
                },
            ),
            SRV_RECORD => (
                RecordType::SRV.as_str().to_string(),
                ResourceValue::Srv {
                    service: self.service.unwrap_or_default(),
                    transport: self.protocol.unwrap_or_default(),
                    priority: self.priority.unwrap_or_default(),
                    weight: self.weight.unwrap_or_default(),
                    port: self.port.unwrap_or_default(),
                    target: self.server_domain.unwrap_or_default(),
                },
            ),
            other => {
                let rtype = other.to_string();
                let raw = serde_json::to_value(&self).unwrap_or_default();
                (rtype, ResourceValue::Opaque(raw))
            }
        };

        Resource {
            id,
            rtype,
            name,
            ttl,
            value,
        }
    }

    pub fn from_resource(resource: &Resource, zone: &str) -> Result<Self> {
        let rtype: RecordType = resource.rtype.parse().map_err(|_| {
            Error::mapping(
                None,
                MappingError::UnsupportedType {
                    name: resource.name.clone(),
                    rtype: resource.rtype.clone(),
                },
            )
        })?;

        let mut policy = Policy {
            id: resource.id.clone(),
            enabled: true,
            domain: fqdn(&resource.name, zone),
            ttl_seconds: Some(resource.ttl),
            ..Default::default()
        };

        match (rtype, &resource.value) {
            (RecordType::A, ResourceValue::Content(ip)) => {
                policy.policy_type = A_RECORD.to_string();
                policy.ipv4_address = Some(ip.clone());
            }
            (RecordType::AAAA, ResourceValue::Content(ip)) => {
                policy.policy_type = AAAA_RECORD.to_string();
                policy.ipv6_address = Some(ip.clone());
            }
            (RecordType::CNAME, ResourceValue::Content(target)) => {
                policy.policy_type = CNAME_RECORD.to_string();
                policy.target_domain = Some(target.clone());
            }
            (RecordType::TXT, ResourceValue::Content(text)) => {
                policy.policy_type = TXT_RECORD.to_string();
                policy.text = Some(text.clone());
            }
            (RecordType::MX, ResourceValue::Mx { preference, target }) => {
                policy.policy_type = MX_RECORD.to_string();
                policy.priority = Some(*preference);
                policy.mail_server_domain = Some(target.clone());
            }
            (
                RecordType::SRV,
                ResourceValue::Srv {
                    service,
                    transport,
                    priority,
                    weight,
                    port,
                    target,
                },
            ) => {
                policy.policy_type = SRV_RECORD.to_string();
                policy.service = Some(service.clone());
                policy.protocol = Some(transport.clone());
                policy.priority = Some(*priority);
                policy.weight = Some(*weight);
                policy.port = Some(*port);
                policy.server_domain = Some(target.clone());
            }
            (rtype, value) => {
                return Err(Error::mapping(
                    None,
                    MappingError::TypeMismatch {
                        name: resource.name.clone(),
                        rtype: rtype.as_str().to_string(),
                        value: format!("{:?}", value),
                    },
                ));
            }
        }

        Ok(policy)
    }
}
