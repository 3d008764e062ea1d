//! Translation between host records and backend resources.
//!
//! Both directions are pure. `to_record(&to_resource(r)?)` gives back `r`
//! for every record whose targets carry no trailing dot and whose TTL is a
//! whole number of seconds.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::MappingError;

use super::entry::{Address, Cname, Mx, Record, RecordType, Srv, Txt};
use super::resource::{Resource, ResourceValue};

type Result<T> = std::result::Result<T, MappingError>;

pub fn to_resource(record: &Record) -> Result<Resource> {
    let name = record.name();
    let value = match record {
        Record::Address(r) => ResourceValue::Content(r.ip.to_string()),
        Record::Cname(r) => ResourceValue::Content(normalize_target(&r.target).to_string()),
        Record::Txt(r) => ResourceValue::Content(r.text.clone()),
        Record::Mx(r) => ResourceValue::Mx {
            preference: i64::from(r.preference),
            target: normalize_target(&r.target).to_string(),
        },
        Record::Srv(r) => ResourceValue::Srv {
            service: r.service.clone(),
            transport: r.transport.clone(),
            priority: i64::from(r.priority),
            weight: i64::from(r.weight),
            port: i64::from(r.port),
            target: normalize_target(&r.target).to_string(),
        },
    };

    Ok(Resource {
        id: None,
        rtype: record.record_type().as_str().to_string(),
        name: name.to_string(),
        ttl: ttl_secs(name, record.ttl())?,
        value,
    })
}

pub fn to_record(resource: &Resource) -> Result<Record> {
    let name = resource.name.clone();
    let ttl = Duration::from_secs(u64::from(resource.ttl));

    let rtype = resource
        .record_type()
        .ok_or_else(|| MappingError::UnsupportedType {
            name: name.clone(),
            rtype: resource.rtype.clone(),
        })?;

    let record = match (rtype, &resource.value) {
        (RecordType::A | RecordType::AAAA, ResourceValue::Content(text)) => {
            let ip = parse_ip(&name, rtype, text)?;
            Record::Address(Address { name, ip, ttl })
        }
        (RecordType::CNAME, ResourceValue::Content(target)) => Record::Cname(Cname {
            target: required_target(&name, target)?,
            name,
            ttl,
        }),
        (RecordType::TXT, ResourceValue::Content(text)) => Record::Txt(Txt {
            name,
            text: text.clone(),
            ttl,
        }),
        (RecordType::MX, ResourceValue::Mx { preference, target }) => Record::Mx(Mx {
            preference: to_u16(&name, "preference", *preference)?,
            target: required_target(&name, target)?,
            name,
            ttl,
        }),
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
        ) => Record::Srv(Srv {
            service: service.clone(),
            transport: transport.clone(),
            priority: to_u16(&name, "priority", *priority)?,
            weight: to_u16(&name, "weight", *weight)?,
            port: to_u16(&name, "port", *port)?,
            target: required_target(&name, target)?,
            name,
            ttl,
        }),
        (rtype, value) => {
            return Err(MappingError::TypeMismatch {
                name,
                rtype: rtype.as_str().to_string(),
                value: format!("{:?}", value),
            });
        }
    };

    Ok(record)
}

/// Target names are kept without the trailing dot, which is what the
/// controller stores.
pub(crate) fn normalize_target(target: &str) -> &str {
    target.strip_suffix('.').unwrap_or(target)
}

fn parse_ip(name: &str, rtype: RecordType, text: &str) -> Result<IpAddr> {
    if text.is_empty() {
        return Err(MappingError::MissingValue {
            name: name.to_string(),
            field: "address",
        });
    }

    let ip: IpAddr = text.trim().parse().map_err(|_| MappingError::InvalidAddress {
        name: name.to_string(),
        value: text.to_string(),
    })?;

    match (rtype, ip) {
        (RecordType::A, IpAddr::V4(_)) | (RecordType::AAAA, IpAddr::V6(_)) => Ok(ip),
        _ => Err(MappingError::TypeMismatch {
            name: name.to_string(),
            rtype: rtype.as_str().to_string(),
            value: text.to_string(),
        }),
    }
}

fn required_target(name: &str, target: &str) -> Result<String> {
    let target = normalize_target(target);
    if target.is_empty() {
        return Err(MappingError::MissingValue {
            name: name.to_string(),
            field: "target",
        });
    }
    Ok(target.to_string())
}

fn to_u16(name: &str, field: &'static str, value: i64) -> Result<u16> {
    u16::try_from(value).map_err(|_| MappingError::OutOfRange {
        name: name.to_string(),
        field,
        value,
    })
}

fn ttl_secs(name: &str, ttl: Duration) -> Result<u32> {
    if ttl.subsec_nanos() != 0 {
        return Err(MappingError::InvalidTtl {
            name: name.to_string(),
            ttl,
        });
    }
    u32::try_from(ttl.as_secs()).map_err(|_| MappingError::InvalidTtl {
        name: name.to_string(),
        ttl,
    })
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod test;
