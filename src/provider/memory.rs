use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use log::debug;

use crate::error::{Error, Result};
use crate::record::Resource;

use super::ResourceBackend;

/// Backend operations, as recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct State {
    zones: HashMap<String, Vec<Resource>>,
    next_id: u64,
    calls: Vec<Op>,
    failures: Vec<Op>,
}

/// Backend keeping resources in process memory.
///
/// Zones are independent ordered lists; identifiers are sequential. The call
/// log and one-shot failure injection exist for tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores resources as-is, assigning identifiers to those without one.
    pub fn seed(&self, zone: &str, resources: Vec<Resource>) -> Result<()> {
        let mut state = self.lock()?;
        for mut resource in resources {
            if resource.id.is_none() {
                resource.id = Some(state.assign_id());
            }
            state.zones.entry(zone_key(zone)).or_default().push(resource);
        }
        Ok(())
    }

    /// Resources of a zone without going through the call log.
    pub fn resources(&self, zone: &str) -> Result<Vec<Resource>> {
        let state = self.lock()?;
        Ok(state.zones.get(&zone_key(zone)).cloned().unwrap_or_default())
    }

    pub fn calls(&self) -> Result<Vec<Op>> {
        Ok(self.lock()?.calls.clone())
    }

    pub fn count_calls(&self, op: Op) -> Result<usize> {
        Ok(self.lock()?.calls.iter().filter(|c| **c == op).count())
    }

    /// Makes the next call of `op` fail with an HTTP error.
    pub fn fail_next(&self, op: Op) -> Result<()> {
        self.lock()?.failures.push(op);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::HttpError("failed to lock memory backend".to_string()))
    }

    fn begin(&self, op: Op) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock()?;
        state.calls.push(op);
        if let Some(pos) = state.failures.iter().position(|f| *f == op) {
            state.failures.remove(pos);
            return Err(Error::HttpError(format!("injected {:?} failure", op)));
        }
        Ok(state)
    }
}

impl State {
    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{:04}", self.next_id)
    }
}

fn zone_key(zone: &str) -> String {
    zone.trim_end_matches('.').to_ascii_lowercase()
}

fn not_found(zone: &str, id: &str) -> Error {
    Error::HttpError(format!("status: 404, resource {} not found in zone {}", id, zone))
}

#[async_trait]
impl ResourceBackend for MemoryBackend {
    async fn list(&self, zone: &str) -> Result<Vec<Resource>> {
        let state = self.begin(Op::List)?;
        Ok(state.zones.get(&zone_key(zone)).cloned().unwrap_or_default())
    }

    async fn create(&self, zone: &str, resource: &Resource) -> Result<Resource> {
        let mut state = self.begin(Op::Create)?;
        let id = state.assign_id();
        let created = resource.clone().with_id(id);
        debug!("memory: create {} in {}", created.describe(), zone);
        state
            .zones
            .entry(zone_key(zone))
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update(&self, zone: &str, id: &str, resource: &Resource) -> Result<Resource> {
        let mut state = self.begin(Op::Update)?;
        let slot = state
            .zones
            .get_mut(&zone_key(zone))
            .and_then(|rs| rs.iter_mut().find(|r| r.id.as_deref() == Some(id)))
            .ok_or_else(|| not_found(zone, id))?;

        *slot = resource.clone().with_id(id);
        debug!("memory: update {} ({}) in {}", slot.describe(), id, zone);
        Ok(slot.clone())
    }

    async fn delete(&self, zone: &str, id: &str) -> Result<()> {
        let mut state = self.begin(Op::Delete)?;
        let resources = state
            .zones
            .get_mut(&zone_key(zone))
            .ok_or_else(|| not_found(zone, id))?;
        let pos = resources
            .iter()
            .position(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| not_found(zone, id))?;

        let removed = resources.remove(pos);
        debug!("memory: delete {} ({}) in {}", removed.describe(), id, zone);
        Ok(())
    }
}
