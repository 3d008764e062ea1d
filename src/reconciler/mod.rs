//! The four record verbs on top of a [`ResourceBackend`].
//!
//! Every verb processes its input in order and awaits one backend call at a
//! time. Nothing is kept between calls; Set and Delete take a fresh
//! [`Snapshot`] of the zone each time. Concurrent callers working on the same
//! zone must serialize themselves.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::provider::ResourceBackend;
use crate::record::{Record, Resource, to_record, to_resource};

mod batch;
pub use batch::*;

pub mod matcher;
pub use matcher::{IdentityKey, Snapshot, TieBreak};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReconcilerCfg {
    #[serde(default)]
    pub tie_break: TieBreak,
}

pub struct Reconciler<B> {
    backend: B,
    tie_break: TieBreak,
}

impl<B: ResourceBackend> Reconciler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tie_break: TieBreak::default(),
        }
    }

    pub fn from_cfg(backend: B, cfg: &ReconcilerCfg) -> Self {
        Self::new(backend).with_tie_break(cfg.tie_break)
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads every supported record of the zone. Resources of other types
    /// are skipped; supported ones that fail to map are reported.
    pub async fn get(&self, zone: &str, cancel: &CancellationToken) -> Batch<Record> {
        let mut batch = Batch::default();
        if cancel.is_cancelled() {
            batch.fail(Error::Cancelled { index: 0 });
            return batch;
        }

        let resources = match self.list(zone).await {
            Ok(resources) => resources,
            Err(e) => {
                batch.fail(e);
                return batch;
            }
        };

        for resource in resources {
            if !resource.is_supported() {
                debug!("skipping {} in {}: unsupported type", resource.describe(), zone);
                continue;
            }

            match to_record(&resource) {
                Ok(record) => batch.push(record),
                Err(e) => batch.fail(Error::mapping(None, e)),
            }
        }

        info!("get {}: {} record(s)", zone, batch.len());
        batch
    }

    /// Creates every record, without looking at what the zone holds.
    pub async fn append(
        &self,
        zone: &str,
        records: &[Record],
        cancel: &CancellationToken,
    ) -> Batch<Record> {
        let mut batch = Batch::default();

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                batch.fail(Error::Cancelled { index });
                break;
            }

            let resource = match to_resource(record) {
                Ok(resource) => resource,
                Err(e) => {
                    batch.fail(Error::mapping(Some(index), e));
                    continue;
                }
            };

            debug!("append {}: create {}", zone, record);
            let result = self.backend.create(zone, &resource).await;
            if !collect(&mut batch, index, record, result) {
                break;
            }
        }

        info!("append {}: {}/{} record(s)", zone, batch.len(), records.len());
        batch
    }

    /// Upserts each record by (name, type): the matching resource is
    /// overwritten in place, otherwise a new one is created.
    pub async fn set(
        &self,
        zone: &str,
        records: &[Record],
        cancel: &CancellationToken,
    ) -> Batch<Record> {
        let mut batch = Batch::default();
        if records.is_empty() {
            return batch;
        }

        let snapshot = match self.snapshot(zone, cancel).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                batch.fail(e);
                return batch;
            }
        };

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                batch.fail(Error::Cancelled { index });
                break;
            }

            let resource = match to_resource(record) {
                Ok(resource) => resource,
                Err(e) => {
                    batch.fail(Error::mapping(Some(index), e));
                    continue;
                }
            };

            let key = IdentityKey::of_record(record, zone);
            let candidates = snapshot.by_identity(&key);
            if candidates.len() > 1 {
                warn!(
                    "{} matches {} resources in {}, updating the {:?} one",
                    record.describe(),
                    candidates.len(),
                    zone,
                    self.tie_break
                );
            }

            let result = match self.tie_break.pick(&candidates) {
                Some(entry) => {
                    debug!("set {}: update {} -> {}", zone, entry.id, record);
                    self.backend.update(zone, &entry.id, &resource).await
                }
                None => {
                    debug!("set {}: create {}", zone, record);
                    self.backend.create(zone, &resource).await
                }
            };

            if !collect(&mut batch, index, record, result) {
                break;
            }
        }

        info!("set {}: {}/{} record(s)", zone, batch.len(), records.len());
        batch
    }

    /// Removes resources equal to the given records, TTL aside. Records
    /// with no match are reported absent.
    pub async fn delete(
        &self,
        zone: &str,
        records: &[Record],
        cancel: &CancellationToken,
    ) -> Batch<Deletion> {
        let mut batch = Batch::default();
        if records.is_empty() {
            return batch;
        }

        let snapshot = match self.snapshot(zone, cancel).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                batch.fail(e);
                return batch;
            }
        };

        // ids deleted by this call
        let mut gone: HashSet<&str> = HashSet::new();

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                batch.fail(Error::Cancelled { index });
                break;
            }

            let candidates: Vec<_> = snapshot
                .by_equality(record, zone)
                .into_iter()
                .filter(|e| !gone.contains(e.id.as_str()))
                .collect();

            let Some(entry) = self.tie_break.pick(&candidates) else {
                debug!("delete {}: {} absent", zone, record);
                batch.push(Deletion::absent(record.clone()));
                continue;
            };

            if candidates.len() > 1 {
                warn!(
                    "{} matches {} resources in {}, deleting the {:?} one only",
                    record.describe(),
                    candidates.len(),
                    zone,
                    self.tie_break
                );
            }

            debug!("delete {}: {} ({})", zone, record, entry.id);
            if let Err(e) = self.backend.delete(zone, &entry.id).await {
                batch.fail(Error::backend(Some(index), record.describe(), e));
                break;
            }

            gone.insert(entry.id.as_str());
            let deleted = entry.record.clone().unwrap_or_else(|| record.clone());
            batch.push(Deletion::deleted(deleted));
        }

        info!(
            "delete {}: {} deleted, {} absent",
            zone,
            batch.deleted().count(),
            batch.absent().count()
        );
        batch
    }

    async fn list(&self, zone: &str) -> Result<Vec<Resource>> {
        debug!("listing resources of {}", zone);
        self.backend
            .list(zone)
            .await
            .map_err(|e| Error::backend(None, zone, e))
    }

    async fn snapshot(&self, zone: &str, cancel: &CancellationToken) -> Result<Snapshot> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { index: 0 });
        }
        let snapshot = Snapshot::new(zone, self.list(zone).await?);
        debug!("snapshot of {}: {} resource(s)", zone, snapshot.len());
        Ok(snapshot)
    }
}

/// Maps a created or updated resource back into the batch. Returns false
/// when the backend call failed and the batch must stop.
fn collect(
    batch: &mut Batch<Record>,
    index: usize,
    record: &Record,
    result: Result<Resource>,
) -> bool {
    match result {
        Ok(resource) => {
            match to_record(&resource) {
                Ok(mapped) => batch.push(mapped),
                Err(e) => batch.fail(Error::mapping(Some(index), e)),
            }
            true
        }
        Err(e) => {
            batch.fail(Error::backend(Some(index), record.describe(), e));
            false
        }
    }
}
