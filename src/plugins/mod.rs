//! Agent interface generators.
//!
//! Each generator turns the current companion into the configuration file a
//! particular agent tool reads, stored relative to the root directory.

pub mod copilot;
pub mod goose;
pub mod kilocode;

use crate::core::config::TbcConfig;
use crate::core::error::TbcError;
use crate::core::lifecycle::{COMPANION_ID_FILE, stages};
use crate::core::record::Record;
use crate::core::record_store::{RecordStore, StoreOutcome};
use crate::core::resolver::{self, Resolution};
use crate::core::stage::run_stage;
use crate::core::validate::{TBC_DIR, VAULT_DIR};
use std::fs;
use std::path::Path;

/// Collection for files written at the top of the root directory.
pub const ROOT_LEVEL: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AgentInterface {
    Kilocode,
    Copilot,
    Goose,
}

impl AgentInterface {
    pub fn records(self, companion: &str) -> Vec<Record> {
        match self {
            AgentInterface::Kilocode => kilocode::core_records(companion),
            AgentInterface::Copilot => copilot::core_records(companion),
            AgentInterface::Goose => goose::core_records(companion),
        }
    }
}

pub fn role_definition(companion: &str) -> String {
    format!(
        "At the start of an iteration, ALWAYS read @tbc/root.md file at the root of the repository, \
         and follow all specifications from it recursively until you have read and understood. \
         ALWAYS read top level @dex/core.md and @dex/extensions.md when available or execute the \
         script to generate it. For the interaction, you will act as {}",
        companion
    )
}

/// Companion name: `tbc/companion.id` -> `vault/<id>` -> `title`.
pub fn resolve_companion_name(root: &Path) -> Result<String, TbcError> {
    let marker = root.join(TBC_DIR).join(COMPANION_ID_FILE);
    let id = fs::read_to_string(&marker)
        .map_err(|e| TbcError::MissingInput(format!("{}: {}", marker.display(), e)))?
        .trim()
        .to_string();
    if id.is_empty() {
        return Err(TbcError::MissingInput(format!("{} is empty", marker.display())));
    }

    match resolver::resolve(root, VAULT_DIR, &id) {
        Resolution::Found(record) => record.title.ok_or_else(|| {
            TbcError::MissingInput(format!("companion record {} has no title", id))
        }),
        Resolution::NotFound => Err(TbcError::NotFound(format!("companion record {}", id))),
        Resolution::Failed(failure) => Err(TbcError::ValidationError(failure.to_string())),
    }
}

/// Resolves the companion and stores the interface's records.
pub fn generate(
    root: &Path,
    config: &TbcConfig,
    interface: AgentInterface,
) -> Result<StoreOutcome, TbcError> {
    let companion = resolve_companion_name(root)?;
    log::debug!("Generating {:?} interface for {}", interface, companion);
    let records = interface.records(&companion);
    let store = RecordStore::new(root);
    run_stage(
        stages::STORE_RECORDS,
        config.stage_policy(stages::STORE_RECORDS),
        || store.store(ROOT_LEVEL, &records),
    )
}
