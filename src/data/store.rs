use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, error};

use super::loader::load_file;
use super::model::RecordSet;
use crate::error::{DashError, Result};

// ---------------------------------------------------------------------------
// RecordStore – load-once owner of the canonical RecordSet
// ---------------------------------------------------------------------------

/// Owns the dataset for the lifetime of the process.
///
/// Built once at startup and handed by reference to every filter /
/// aggregation call site. The first [`RecordStore::load`] reads and
/// normalises the source; later calls return the cached set. The set is never
/// mutated after that, so shared `&RecordStore` reads need no locking.
#[derive(Debug)]
pub struct RecordStore {
    source: PathBuf,
    records: OnceLock<RecordSet>,
}

impl RecordStore {
    /// Point the store at a dataset file without reading it yet.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            records: OnceLock::new(),
        }
    }

    /// A store that is already populated, e.g. from an in-memory dataset.
    pub fn from_records(records: RecordSet) -> Self {
        Self {
            source: PathBuf::from("<memory>"),
            records: OnceLock::from(records),
        }
    }

    /// Return the canonical record set, reading the source on first use.
    ///
    /// Any retrieval or parse failure is reported as
    /// [`DashError::DataUnavailable`]; there is no partially loaded state.
    pub fn load(&self) -> Result<&RecordSet> {
        if let Some(records) = self.records.get() {
            debug!("record store cache hit ({} flights)", records.len());
            return Ok(records);
        }
        let loaded = load_file(&self.source).map_err(|err| {
            error!("failed to load {}: {err:#}", self.source.display());
            DashError::DataUnavailable {
                path: self.source.clone(),
                reason: format!("{err:#}"),
            }
        })?;
        Ok(self.records.get_or_init(|| loaded))
    }

    /// Whether the dataset has been read already.
    pub fn is_loaded(&self) -> bool {
        self.records.get().is_some()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}
