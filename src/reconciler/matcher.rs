//! Matching of requested records against a zone snapshot.
//!
//! Set matches loosely on [`IdentityKey`] (name and type tag), Delete matches
//! strictly with [`same_record`] (name, type and every value field, TTL
//! excluded). The two are kept apart on purpose.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::record::{Record, Resource, ResourceId, to_record};
use crate::record::mapper::normalize_target;

/// Which candidate to act on when several resources match one record.
///
/// Duplicates are never rejected: Set and Delete must stay usable to clean
/// up exactly that state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// First match in the backend's listing order
    #[default]
    First,
    /// Last match in the backend's listing order
    Last,
}

impl TieBreak {
    pub fn pick<T: Copy>(&self, candidates: &[T]) -> Option<T> {
        match self {
            TieBreak::First => candidates.first().copied(),
            TieBreak::Last => candidates.last().copied(),
        }
    }
}

/// Name relative to `zone`, lowercased, `@` for the apex.
pub fn relative_name(name: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.').to_ascii_lowercase();
    let name = name.to_ascii_lowercase();

    match name.strip_suffix('.') {
        Some(abs) if abs == zone => "@".to_string(),
        Some(abs) => match abs.strip_suffix(zone.as_str()) {
            Some(rel) if rel.ends_with('.') => rel.trim_end_matches('.').to_string(),
            _ => format!("{}.", abs),
        },
        None if name.is_empty() => "@".to_string(),
        None => name,
    }
}

/// Upsert identity: the relative name plus the backend type tag, so A and
/// AAAA records of one name are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub rtype: String,
}

impl IdentityKey {
    pub fn of_record(record: &Record, zone: &str) -> Self {
        Self {
            name: relative_name(record.name(), zone),
            rtype: record.record_type().as_str().to_string(),
        }
    }

    pub fn of_resource(resource: &Resource, zone: &str) -> Self {
        Self {
            name: relative_name(&resource.name, zone),
            rtype: resource.rtype.to_ascii_uppercase(),
        }
    }
}

fn same_target(a: &str, b: &str) -> bool {
    normalize_target(a).eq_ignore_ascii_case(normalize_target(b))
}

/// Full equality of two records within `zone`, ignoring TTL.
pub fn same_record(a: &Record, b: &Record, zone: &str) -> bool {
    if relative_name(a.name(), zone) != relative_name(b.name(), zone) {
        return false;
    }

    match (a, b) {
        (Record::Address(x), Record::Address(y)) => x.ip == y.ip,
        (Record::Cname(x), Record::Cname(y)) => same_target(&x.target, &y.target),
        (Record::Txt(x), Record::Txt(y)) => x.text == y.text,
        (Record::Mx(x), Record::Mx(y)) => {
            x.preference == y.preference && same_target(&x.target, &y.target)
        }
        (Record::Srv(x), Record::Srv(y)) => {
            x.service.eq_ignore_ascii_case(&y.service)
                && x.transport.eq_ignore_ascii_case(&y.transport)
                && x.priority == y.priority
                && x.weight == y.weight
                && x.port == y.port
                && same_target(&x.target, &y.target)
        }
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub id: ResourceId,
    pub key: IdentityKey,
    /// `None` when the resource is of an unsupported type or fails to map
    pub record: Option<Record>,
}

/// Immutable view of a zone, taken once per Set or Delete call.
///
/// The view is never refreshed while a batch runs, so it goes stale if the
/// zone is changed from outside during the call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn new(zone: &str, resources: Vec<Resource>) -> Self {
        let mut entries = Vec::with_capacity(resources.len());

        for resource in resources {
            let Some(id) = resource.id.clone() else {
                warn!("ignoring {} in {}: no identifier", resource.describe(), zone);
                continue;
            };

            let record = match to_record(&resource) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!("{} in {} not comparable: {}", resource.describe(), zone, e);
                    None
                }
            };

            entries.push(SnapshotEntry {
                id,
                key: IdentityKey::of_resource(&resource, zone),
                record,
            });
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_identity(&self, key: &IdentityKey) -> Vec<&SnapshotEntry> {
        self.entries.iter().filter(|e| &e.key == key).collect()
    }

    pub fn by_equality(&self, record: &Record, zone: &str) -> Vec<&SnapshotEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(&e.record, Some(r) if same_record(r, record, zone)))
            .collect()
    }
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod test;
