//! Fetch and Store over a root directory.
//!
//! Both operations work one record at a time in input order. A record that
//! fails to parse or write is logged and reported as an [`ItemFailure`];
//! the rest of the batch still runs.

use crate::core::codec::{self, RecordFormat};
use crate::core::error::{ItemFailure, TbcError};
use crate::core::record::Record;
use crate::core::resolver::{self, Resolution};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RecordMap = BTreeMap<String, Record>;

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: RecordMap,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Default)]
pub struct StoreOutcome {
    /// Ids written, in input order (duplicates included).
    pub stored: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

/// `collection -> id -> record`. Merging a collection replaces only that
/// collection's entries.
#[derive(Debug, Default, Clone)]
pub struct FetchResults {
    collections: BTreeMap<String, RecordMap>,
}

impl FetchResults {
    pub fn merge(&mut self, collection: &str, records: RecordMap) {
        self.collections.insert(collection.to_string(), records);
    }

    pub fn collection(&self, collection: &str) -> Option<&RecordMap> {
        self.collections.get(collection)
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<&Record> {
        self.collections.get(collection).and_then(|m| m.get(id))
    }

    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}

/// `collection -> [stored ids]`, merged the same way as [`FetchResults`].
#[derive(Debug, Default, Clone)]
pub struct StoreResults {
    collections: BTreeMap<String, Vec<String>>,
}

impl StoreResults {
    pub fn merge(&mut self, collection: &str, ids: Vec<String>) {
        self.collections.insert(collection.to_string(), ids);
    }

    pub fn collection(&self, collection: &str) -> Option<&[String]> {
        self.collections.get(collection).map(Vec::as_slice)
    }

    /// One `collection: ids` line per collection, for result reporting.
    pub fn summary_lines(&self) -> Vec<String> {
        self.collections
            .iter()
            .map(|(c, ids)| format!("{}: {}", c, ids.join(", ")))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        resolver::collection_dir(&self.root, collection)
    }

    pub fn fetch(&self, collection: &str, ids: &[String]) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        for id in ids {
            match resolver::resolve(&self.root, collection, id) {
                Resolution::Found(record) => {
                    outcome.records.insert(id.clone(), record);
                }
                Resolution::NotFound => {
                    log::debug!("No record {} in {}", id, collection);
                }
                Resolution::Failed(failure) => outcome.failures.push(failure),
            }
        }
        outcome
    }

    /// Fetches `ids` and merges them into `acc` under `collection`.
    pub fn fetch_into(&self, acc: &mut FetchResults, collection: &str, ids: &[String]) -> FetchOutcome {
        let outcome = self.fetch(collection, ids);
        acc.merge(collection, outcome.records.clone());
        outcome
    }

    /// Every markdown record id in `collection`.
    pub fn fetch_all_ids(&self, collection: &str) -> Result<Vec<String>, TbcError> {
        resolver::list_markdown_ids(&self.root, collection)
    }

    /// Writes `records` into `collection`, creating it if needed.
    ///
    /// Fails as a whole only when the collection directory cannot be created.
    pub fn store(&self, collection: &str, records: &[Record]) -> Result<StoreOutcome, TbcError> {
        let collection_path = self.collection_path(collection);
        fs::create_dir_all(&collection_path)?;

        let mut outcome = StoreOutcome::default();
        for record in records {
            if record.id.is_empty() {
                log::error!("Record missing id: {:?}", record.to_attributes());
                outcome
                    .failures
                    .push(ItemFailure::new(None, None, "record missing id"));
                continue;
            }

            match write_record(&collection_path, record) {
                Ok(path) => {
                    log::debug!("Stored {} at {}", record.id, path.display());
                    outcome.stored.push(record.id.clone());
                }
                Err(failure) => {
                    log::error!("Error storing record {}", failure);
                    outcome.failures.push(failure);
                }
            }
        }
        Ok(outcome)
    }

    /// Stores `records` and merges the stored ids into `acc`.
    pub fn store_into(
        &self,
        acc: &mut StoreResults,
        collection: &str,
        records: &[Record],
    ) -> Result<StoreOutcome, TbcError> {
        let outcome = self.store(collection, records)?;
        acc.merge(collection, outcome.stored.clone());
        Ok(outcome)
    }
}

fn relative_target(record: &Record, format: RecordFormat) -> Result<PathBuf, String> {
    let name = match &record.filename {
        Some(f) if !f.is_empty() => f.clone(),
        _ => format.default_filename(&record.id),
    };
    let path = PathBuf::from(&name);
    if resolver::escapes_collection(&path) {
        return Err(format!("filename must stay inside the collection: {}", name));
    }
    Ok(path)
}

fn write_record(collection_path: &Path, record: &Record) -> Result<PathBuf, ItemFailure> {
    let format = RecordFormat::for_record(record);
    let id = Some(record.id.as_str());
    let target = relative_target(record, format)
        .map(|rel| collection_path.join(rel))
        .map_err(|reason| ItemFailure::new(id, None, reason))?;

    let text = codec::encode(record, format)
        .map_err(|e| ItemFailure::new(id, Some(target.clone()), e.to_string()))?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ItemFailure::new(id, Some(target.clone()), e.to_string()))?;
    }
    fs::write(&target, text).map_err(|e| ItemFailure::new(id, Some(target.clone()), e.to_string()))?;
    Ok(target)
}
