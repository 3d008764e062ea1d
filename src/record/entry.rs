use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Backend type tag of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    TXT,
    MX,
    SRV,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::CNAME => "CNAME",
            RecordType::TXT => "TXT",
            RecordType::MX => "MX",
            RecordType::SRV => "SRV",
        }
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::AAAA),
            "CNAME" => Ok(RecordType::CNAME),
            "TXT" => Ok(RecordType::TXT),
            "MX" => Ok(RecordType::MX),
            "SRV" => Ok(RecordType::SRV),
            _ => Err(Error::ParseError(format!("unknown record type: {}", s))),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts TTLs as integer seconds or numeric strings.
fn deserialize_ttl<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct TTLVisitor;

    impl serde::de::Visitor<'_> for TTLVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a TTL in seconds")
        }

        fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let secs: u64 = v.trim().parse().map_err(E::custom)?;
            Ok(Duration::from_secs(secs))
        }

        fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            u64::try_from(v)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("negative TTL: {}", v)))
        }
    }

    deserializer.deserialize_any(TTLVisitor)
}

/// An A or AAAA record, the IP version decides which
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Address {
    pub name: String,

    #[serde(alias = "content", alias = "value")]
    pub ip: IpAddr,

    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cname {
    pub name: String,

    #[serde(alias = "content", alias = "value")]
    pub target: String,

    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Txt {
    pub name: String,

    #[serde(alias = "content", alias = "value")]
    pub text: String,

    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Mx {
    pub name: String,

    #[serde(alias = "priority")]
    pub preference: u16,

    #[serde(alias = "content", alias = "value")]
    pub target: String,

    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub ttl: Duration,
}

/// SRV record. `service` and `transport` are kept apart from `name`,
/// e.g. `_sip` and `_tcp`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Srv {
    pub name: String,
    pub service: String,

    #[serde(alias = "protocol")]
    pub transport: String,

    pub priority: u16,
    pub weight: u16,
    pub port: u16,

    #[serde(alias = "content", alias = "value")]
    pub target: String,

    #[serde(default, deserialize_with = "deserialize_ttl")]
    pub ttl: Duration,
}

/// DNS record as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    #[serde(rename = "A", alias = "AAAA", alias = "a", alias = "aaaa")]
    Address(Address),
    #[serde(rename = "CNAME", alias = "cname")]
    Cname(Cname),
    #[serde(rename = "TXT", alias = "txt")]
    Txt(Txt),
    #[serde(rename = "MX", alias = "mx")]
    Mx(Mx),
    #[serde(rename = "SRV", alias = "srv")]
    Srv(Srv),
}

impl Record {
    pub fn name(&self) -> &str {
        match self {
            Record::Address(r) => &r.name,
            Record::Cname(r) => &r.name,
            Record::Txt(r) => &r.name,
            Record::Mx(r) => &r.name,
            Record::Srv(r) => &r.name,
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Record::Address(r) => r.ttl,
            Record::Cname(r) => r.ttl,
            Record::Txt(r) => r.ttl,
            Record::Mx(r) => r.ttl,
            Record::Srv(r) => r.ttl,
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Address(r) if r.ip.is_ipv4() => RecordType::A,
            Record::Address(_) => RecordType::AAAA,
            Record::Cname(_) => RecordType::CNAME,
            Record::Txt(_) => RecordType::TXT,
            Record::Mx(_) => RecordType::MX,
            Record::Srv(_) => RecordType::SRV,
        }
    }

    /// `name/TYPE`, used in logs and errors.
    pub fn describe(&self) -> String {
        format!("{}/{}", self.name(), self.record_type())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ttl = self.ttl().as_secs();
        match self {
            Record::Address(r) => write!(f, "{} {} {} {}", r.name, ttl, self.record_type(), r.ip),
            Record::Cname(r) => write!(f, "{} {} CNAME {}", r.name, ttl, r.target),
            Record::Txt(r) => write!(f, "{} {} TXT {:?}", r.name, ttl, r.text),
            Record::Mx(r) => write!(f, "{} {} MX {} {}", r.name, ttl, r.preference, r.target),
            Record::Srv(r) => write!(
                f,
                "{}.{}.{} {} SRV {} {} {} {}",
                r.service, r.transport, r.name, ttl, r.priority, r.weight, r.port, r.target
            ),
        }
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rtype = self.record_type().as_str();
        match self {
            Record::Address(r) => {
                let mut state = serializer.serialize_struct("Address", 4)?;
                state.serialize_field("type", rtype)?;
                state.serialize_field("name", &r.name)?;
                state.serialize_field("ip", &r.ip.to_string())?;
                state.serialize_field("ttl", &r.ttl.as_secs())?;
                state.end()
            }
            Record::Cname(r) => {
                let mut state = serializer.serialize_struct("Cname", 4)?;
                state.serialize_field("type", rtype)?;
                state.serialize_field("name", &r.name)?;
                state.serialize_field("target", &r.target)?;
                state.serialize_field("ttl", &r.ttl.as_secs())?;
                state.end()
            }
            Record::Txt(r) => {
                let mut state = serializer.serialize_struct("Txt", 4)?;
                state.serialize_field("type", rtype)?;
                state.serialize_field("name", &r.name)?;
                state.serialize_field("text", &r.text)?;
                state.serialize_field("ttl", &r.ttl.as_secs())?;
                state.end()
            }
            Record::Mx(r) => {
                let mut state = serializer.serialize_struct("Mx", 5)?;
                state.serialize_field("type", rtype)?;
                state.serialize_field("name", &r.name)?;
                state.serialize_field("preference", &r.preference)?;
                state.serialize_field("target", &r.target)?;
                state.serialize_field("ttl", &r.ttl.as_secs())?;
                state.end()
            }
            Record::Srv(r) => {
                let mut state = serializer.serialize_struct("Srv", 9)?;
                state.serialize_field("type", rtype)?;
                state.serialize_field("name", &r.name)?;
                state.serialize_field("service", &r.service)?;
                state.serialize_field("transport", &r.transport)?;
                state.serialize_field("priority", &r.priority)?;
                state.serialize_field("weight", &r.weight)?;
                state.serialize_field("port", &r.port)?;
                state.serialize_field("target", &r.target)?;
                state.serialize_field("ttl", &r.ttl.as_secs())?;
                state.end()
            }
        }
    }
}

impl From<Address> for Record {
    fn from(r: Address) -> Self {
        Record::Address(r)
    }
}

impl From<Cname> for Record {
    fn from(r: Cname) -> Self {
        Record::Cname(r)
    }
}

impl From<Txt> for Record {
    fn from(r: Txt) -> Self {
        Record::Txt(r)
    }
}

impl From<Mx> for Record {
    fn from(r: Mx) -> Self {
        Record::Mx(r)
    }
}

impl From<Srv> for Record {
    fn from(r: Srv) -> Self {
        Record::Srv(r)
    }
}

/// A list of records, as read from a YAML record file
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RecordList {
    pub records: Vec<Record>,
}

impl RecordList {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let list: RecordList = serde_yaml::from_str(yaml)?;
        Ok(list)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
