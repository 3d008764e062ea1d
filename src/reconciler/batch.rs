use log::warn;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::record::Record;

/// Result of one verb: what was done, plus the first error met.
///
/// A batch with an error may still hold records; those were applied on the
/// backend before the failure and are not rolled back.
#[derive(Debug)]
pub struct Batch<T> {
    pub records: Vec<T>,
    pub error: Option<Error>,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            records: vec![],
            error: None,
        }
    }
}

impl<T> Batch<T> {
    pub(crate) fn push(&mut self, item: T) {
        self.records.push(item);
    }

    /// Keeps the first error; later ones are only logged.
    pub(crate) fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        } else {
            warn!("{}", err);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<Error>) {
        (self.records, self.error)
    }

    /// Drops partial results if an error occurred.
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            None => Ok(self.records),
            Some(err) => Err(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteState {
    Deleted,
    /// Nothing matched; treated as success
    Absent,
}

/// Outcome of deleting one requested record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deletion {
    #[serde(flatten)]
    pub record: Record,
    pub state: DeleteState,
}

impl Deletion {
    pub fn deleted(record: Record) -> Self {
        Self {
            record,
            state: DeleteState::Deleted,
        }
    }

    pub fn absent(record: Record) -> Self {
        Self {
            record,
            state: DeleteState::Absent,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.state == DeleteState::Deleted
    }
}

impl Batch<Deletion> {
    pub fn deleted(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(|d| d.is_deleted())
            .map(|d| &d.record)
    }

    pub fn absent(&self) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(|d| !d.is_deleted())
            .map(|d| &d.record)
    }
}
