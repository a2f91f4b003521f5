//! Regeneration of the `dex` collection from current records.

use crate::core::config::TbcConfig;
use crate::core::dex::{self, EXTENSIONS_COLLECTION, ROOT_COLLECTION, ROOT_ID, SPECS_COLLECTION};
use crate::core::error::{ItemFailure, TbcError};
use crate::core::lifecycle::stages;
use crate::core::record::Record;
use crate::core::record_store::{FetchResults, RecordMap, RecordStore, StoreOutcome};
use crate::core::stage::run_stage;
use crate::core::validate::{DEX_DIR, VAULT_DIR};
use std::path::Path;

#[derive(Debug, Default)]
pub struct RefreshReport {
    pub fetched: usize,
    pub fetch_failures: Vec<ItemFailure>,
    pub stored: StoreOutcome,
}

struct Refresher<'a> {
    store: RecordStore,
    config: &'a TbcConfig,
    fetched: FetchResults,
    report: RefreshReport,
}

impl<'a> Refresher<'a> {
    fn new(root: &Path, config: &'a TbcConfig) -> Self {
        Self {
            store: RecordStore::new(root),
            config,
            fetched: FetchResults::default(),
            report: RefreshReport::default(),
        }
    }

    /// Fetches `ids` (every markdown record when `None`) into the accumulator.
    fn fetch(&mut self, collection: &str, ids: Option<&[String]>) -> Result<(), TbcError> {
        let policy = self.config.stage_policy(stages::FETCH_RECORDS);
        let store = &self.store;
        let outcome = run_stage(stages::FETCH_RECORDS, policy, || {
            let ids = match ids {
                Some(ids) => ids.to_vec(),
                None => store.fetch_all_ids(collection)?,
            };
            Ok(store.fetch(collection, &ids))
        })?;
        log::debug!("Fetched {} records from {}", outcome.records.len(), collection);
        self.report.fetched += outcome.records.len();
        self.report.fetch_failures.extend(outcome.failures);
        self.fetched.merge(collection, outcome.records);
        Ok(())
    }

    fn store(mut self, records: Vec<Record>) -> Result<RefreshReport, TbcError> {
        let policy = self.config.stage_policy(stages::STORE_RECORDS);
        let store = &self.store;
        self.report.stored = run_stage(stages::STORE_RECORDS, policy, || {
            store.store(DEX_DIR, &records)
        })?;
        Ok(self.report)
    }
}

/// `vault` grouped by `record_type` into `dex/<type>.md`.
pub fn refresh_records(root: &Path, config: &TbcConfig) -> Result<RefreshReport, TbcError> {
    let mut r = Refresher::new(root, config);
    r.fetch(VAULT_DIR, None)?;
    let groups = r
        .fetched
        .collection(VAULT_DIR)
        .map(dex::group_by_type)
        .unwrap_or_default();
    let indexes = dex::type_indexes(&groups);
    r.store(indexes)
}

/// Root document, specs and extensions into `dex/core.md`.
pub fn refresh_core(root: &Path, config: &TbcConfig) -> Result<RefreshReport, TbcError> {
    let mut r = Refresher::new(root, config);
    let root_ids = vec![ROOT_ID.to_string()];
    r.fetch(ROOT_COLLECTION, Some(root_ids.as_slice()))?;
    r.fetch(SPECS_COLLECTION, None)?;
    r.fetch(EXTENSIONS_COLLECTION, None)?;
    let core = dex::core_index(&r.fetched);
    r.store(vec![core])
}

/// `tbc/extensions` listed into `dex/extensions.md`.
pub fn refresh_extensions(root: &Path, config: &TbcConfig) -> Result<RefreshReport, TbcError> {
    let mut r = Refresher::new(root, config);
    r.fetch(EXTENSIONS_COLLECTION, None)?;
    let empty = RecordMap::new();
    let index = dex::extensions_index(r.fetched.collection(EXTENSIONS_COLLECTION).unwrap_or(&empty));
    r.store(vec![index])
}
