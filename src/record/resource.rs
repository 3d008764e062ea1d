use super::entry::RecordType;

/// Identifier assigned by the backend on creation
pub type ResourceId = String;

/// Type-specific payload of a backend resource.
///
/// Numeric fields are wider than their DNS counterparts so out-of-range
/// values reported by a backend can be represented and rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    /// A, AAAA, CNAME and TXT: one textual value
    Content(String),
    Mx {
        preference: i64,
        target: String,
    },
    Srv {
        service: String,
        transport: String,
        priority: i64,
        weight: i64,
        port: i64,
        target: String,
    },
    /// Payload of a resource kind outside the supported set
    Opaque(serde_json::Value),
}

/// A DNS record as owned by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: Option<ResourceId>,
    pub rtype: String,
    pub name: String,
    pub ttl: u32,
    pub value: ResourceValue,
}

impl Resource {
    pub fn record_type(&self) -> Option<RecordType> {
        self.rtype.parse().ok()
    }

    pub fn is_supported(&self) -> bool {
        self.record_type().is_some()
    }

    pub fn with_id(mut self, id: impl Into<ResourceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// `name/TYPE`, used in logs and errors.
    pub fn describe(&self) -> String {
        format!("{}/{}", self.name, self.rtype)
    }
}
