//! Init / Upgrade / Abort for a root directory.
//!
//! The branch is decided once from the root's validity, the upgrade flag and
//! the identity parameters. Each branch runs its stages in a fixed order;
//! every stage is wrapped in [`run_stage`] with the policy configured for its
//! name. Results accumulate in an [`InitReport`] so the caller can print
//! them in one pass.

use crate::core::assets::{self, AssetSource};
use crate::core::backup;
use crate::core::config::TbcConfig;
use crate::core::dex::{ROOT_COLLECTION, ROOT_ID};
use crate::core::error::TbcError;
use crate::core::record::{Attributes, Record};
use crate::core::record_store::{RecordStore, StoreOutcome};
use crate::core::stage::run_stage;
use crate::core::time;
use crate::core::validate::{self, DEX_DIR, TBC_DIR, VAULT_DIR, Validation};
use chrono::Utc;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPANION_ID_FILE: &str = "companion.id";
pub const PRIME_ID_FILE: &str = "prime.id";

pub const ABORT_EXISTING: &str =
    "TBC companion already exists at this location. Use --upgrade to upgrade existing companion.";
pub const ABORT_NO_IDENTITY: &str =
    "Not a TBC root. Provide --companion NAME and --prime NAME to initialize a new companion.";

pub mod stages {
    pub const INIT_DIRS: &str = "init-dirs";
    pub const STORE_RECORDS: &str = "store-records";
    pub const WRITE_IDS: &str = "write-ids";
    pub const COPY_ASSETS: &str = "copy-assets";
    pub const GENERATE_ROOT: &str = "generate-root";
    pub const BACKUP_TBC: &str = "backup-tbc";
    pub const RESTORE_ROOT: &str = "restore-root";
    pub const RESTORE_EXTENSIONS: &str = "restore-extensions";
    pub const FETCH_RECORDS: &str = "fetch-records";
    pub const VALIDATE: &str = "validate";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub companion: String,
    pub prime: String,
}

impl Identity {
    pub fn new(companion: impl Into<String>, prime: impl Into<String>) -> Self {
        Self {
            companion: companion.into(),
            prime: prime.into(),
        }
    }

    pub fn agent_tag(&self) -> String {
        format!("c/agent/{}", lower_snake(&self.companion))
    }
}

fn lower_snake(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Init,
    Upgrade,
    Abort(AbortReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    AlreadyInitialized,
    MissingIdentity,
}

impl AbortReason {
    pub fn message(self) -> &'static str {
        match self {
            AbortReason::AlreadyInitialized => ABORT_EXISTING,
            AbortReason::MissingIdentity => ABORT_NO_IDENTITY,
        }
    }
}

pub fn decide(is_valid_root: bool, upgrade: bool, has_identity: bool) -> Branch {
    match (is_valid_root, upgrade, has_identity) {
        (true, true, _) => Branch::Upgrade,
        (true, false, _) => Branch::Abort(AbortReason::AlreadyInitialized),
        (false, _, true) => Branch::Init,
        (false, _, false) => Branch::Abort(AbortReason::MissingIdentity),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIds {
    pub companion: String,
    pub prime: String,
    pub memory: String,
}

impl RecordIds {
    pub fn generate() -> Self {
        Self {
            companion: time::new_uuid(),
            prime: time::new_uuid(),
            memory: time::new_uuid(),
        }
    }

    pub fn as_vec(&self) -> Vec<String> {
        vec![self.companion.clone(), self.prime.clone(), self.memory.clone()]
    }
}

/// Per-stage results. `None` means the branch did not run that stage.
#[derive(Debug, Default)]
pub struct InitReport {
    pub generated_ids: Option<Vec<String>>,
    pub records: Option<StoreOutcome>,
    pub id_writes: Option<Vec<String>>,
    pub backup: Option<PathBuf>,
    pub init_dirs: Option<Vec<String>>,
    pub copy_assets: Option<Vec<String>>,
    pub generate_root: Option<StoreOutcome>,
    pub restores: Option<Vec<String>>,
    pub validation: Option<Validation>,
}

/// Party and structure records for a new companion.
pub fn init_records(identity: &Identity, ids: &RecordIds) -> Vec<Record> {
    let Identity { companion, prime } = identity;
    let tags = vec![identity.agent_tag()];

    let mut agent = Record::new(&ids.companion);
    agent.record_type = Some("party".into());
    agent.record_tags = Some(tags.clone());
    agent.extra.insert("party_type".into(), json!("agent"));
    agent.title = Some(companion.clone());
    agent.set_content(format!(
        "{companion} is the AI Assistant in the Third Brain Companion System, instantiated to assist \
         Prime User {prime}. As an agent, {companion} engages in interactions, evolves motivations to \
         align with the Prime User's, and operates within the vault system for memory persistence."
    ));

    let mut person = Record::new(&ids.prime);
    person.record_type = Some("party".into());
    person.record_tags = Some(tags.clone());
    person.extra.insert("party_type".into(), json!("person"));
    person.title = Some(prime.clone());
    person.set_content(format!(
        "{prime} is the Prime User of the Third Brain Companion System, the primary human actor \
         initiating and guiding {companion}. As the owner of the system, they direct motivations, \
         confirm identities, and delegate memory persistence when needed."
    ));

    let mut memory = Record::new(&ids.memory);
    memory.record_type = Some("structure".into());
    memory.record_tags = Some(tags);
    memory.title = Some("Map of Memories".into());
    memory.set_content(
        "The Companion Agent to list the other records here - any type, with any number of sections.",
    );

    for r in [&mut agent, &mut person, &mut memory] {
        r.content_type = Some("markdown".into());
    }
    vec![agent, person, memory]
}

/// Root document for a freshly initialised companion.
pub fn identity_root(identity: &Identity, ids: &RecordIds) -> Record {
    let Identity { companion, prime } = identity;
    let mut root = Record::new(ROOT_ID);
    root.record_type = Some("root".into());
    root.record_tags = Some(vec![identity.agent_tag()]);
    root.title = Some(format!("{} Root", companion));
    root.content_type = Some("markdown".into());
    root.set_content(format!(
        "# {companion} Root

## Definitions

- Agent: [{companion}](/vault/{agent_id}.md)
- Prime User: [{prime}](/vault/{prime_id}.md)
- Specifications: [core](/dex/core.md)
  - use 'Refresh Core Index' method if not available

## Agent Identity

{companion} is the AI Assistant as per the Third Brain Companion System Definitions.

## Motivation

1. Assist the Prime User in their activities, engage in their interactions.
2. Evolve motivations with clarity to align with motivations of the Prime User.

## Memories

- [root map of memories](/vault/{memory_id}.md)
",
        agent_id = ids.companion,
        prime_id = ids.prime,
        memory_id = ids.memory,
    ));
    root
}

/// Placeholder root used by upgrade when no root document survives.
pub fn generic_root() -> Record {
    let mut root = Record::new(ROOT_ID);
    root.record_type = Some("note".into());
    root.record_tags = Some(vec![
        "c/agent/your-agent-name".into(),
        "c/personal/your-name".into(),
    ]);
    root.extra.insert(
        "record_create_date".into(),
        Value::String(Utc::now().to_rfc3339()),
    );
    root.title = Some("Your Agent Root".into());
    root.content_type = Some("markdown".into());
    root.set_content(
        "# Your Agent Root

## Definitions

- Agent: Your Agent Name
- Prime User: Your Name
- Specifications: [core](/dex/core.md)
  - use 'Refresh Core Index' Method if not present

## Agent Identity

[Describe your agent's identity]

## Motivation

[Describe motivations]

## Memories

[List of memory records]
",
    );
    root
}

/// Fills attributes missing from `existing` with the template's. The
/// existing body and values are kept.
pub fn merge_root(existing: &Record, template: &Record) -> Record {
    let mut attrs: Attributes = existing.persisted_attributes();
    for (key, value) in template.persisted_attributes() {
        attrs.entry(key).or_insert(value);
    }
    let mut merged = Record::from(attrs);
    merged.id = ROOT_ID.to_string();
    merged
}

fn id_marker(name: &str, id: &str) -> Record {
    let mut r = Record::new(name);
    r.filename = Some(name.to_string());
    r.content_type = Some("raw".into());
    r.set_content(id);
    r
}

pub struct Lifecycle<'a> {
    root: PathBuf,
    config: &'a TbcConfig,
    store: RecordStore,
}

impl<'a> Lifecycle<'a> {
    pub fn new(root: impl Into<PathBuf>, config: &'a TbcConfig) -> Self {
        let root = root.into();
        Self {
            store: RecordStore::new(root.clone()),
            root,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stage<T, F>(&self, name: &str, f: F) -> Result<T, TbcError>
    where
        F: FnMut() -> Result<T, TbcError>,
    {
        run_stage(name, self.config.stage_policy(name), f)
    }

    fn asset_source(&self) -> AssetSource {
        AssetSource::from_config(self.config.assets.dir.as_deref())
    }

    /// Validates, picks a branch and runs it.
    pub fn run(&self, upgrade: bool, identity: Option<&Identity>) -> Result<InitReport, TbcError> {
        let validation = validate::validate_root(&self.root);
        let branch = decide(validation.is_valid_root, upgrade, identity.is_some());
        log::debug!("init branch: {:?}", branch);
        match (branch, identity) {
            (Branch::Init, Some(identity)) => self.init(identity),
            (Branch::Upgrade, _) => self.upgrade(),
            (Branch::Abort(reason), _) => Err(TbcError::Fatal(reason.message().to_string())),
            (Branch::Init, None) => Err(TbcError::Fatal(ABORT_NO_IDENTITY.to_string())),
        }
    }

    fn init_dirs(&self) -> Result<Vec<String>, TbcError> {
        let mut results = Vec::new();
        for dir in [TBC_DIR, VAULT_DIR, DEX_DIR] {
            let path = self.root.join(dir);
            if path.is_dir() {
                results.push(format!("Directory already exists: {}", path.display()));
            } else {
                fs::create_dir_all(&path)?;
                results.push(format!("Created directory: {}", path.display()));
            }
        }
        Ok(results)
    }

    fn write_ids(&self, ids: &RecordIds) -> Result<Vec<String>, TbcError> {
        let markers = [
            id_marker(COMPANION_ID_FILE, &ids.companion),
            id_marker(PRIME_ID_FILE, &ids.prime),
        ];
        let outcome = self.store.store(TBC_DIR, &markers)?;
        if let Some(failure) = outcome.failures.first() {
            return Err(TbcError::ValidationError(format!("write ids: {}", failure)));
        }
        let tbc = self.store.collection_path(TBC_DIR);
        Ok(outcome
            .stored
            .iter()
            .map(|name| format!("Wrote {} at {}", name, tbc.join(name).display()))
            .collect())
    }

    fn copy_assets(&self) -> Result<Vec<String>, TbcError> {
        assets::copy_assets(&self.asset_source(), &self.root.join(TBC_DIR))
    }

    fn store_root(&self, root: &Record) -> Result<StoreOutcome, TbcError> {
        let outcome = self.store.store(ROOT_COLLECTION, std::slice::from_ref(root))?;
        if let Some(failure) = outcome.failures.first() {
            return Err(TbcError::ValidationError(format!("generate root: {}", failure)));
        }
        Ok(outcome)
    }

    /// New companion: ids, vault records, directories, id markers, assets,
    /// root document, validation.
    pub fn init(&self, identity: &Identity) -> Result<InitReport, TbcError> {
        let mut report = InitReport::default();

        let ids = RecordIds::generate();
        report.generated_ids = Some(ids.as_vec());
        let records = init_records(identity, &ids);

        report.init_dirs = Some(self.stage(stages::INIT_DIRS, || self.init_dirs())?);
        report.records = Some(self.stage(stages::STORE_RECORDS, || {
            self.store.store(VAULT_DIR, &records)
        })?);
        report.id_writes = Some(self.stage(stages::WRITE_IDS, || self.write_ids(&ids))?);
        report.copy_assets = Some(self.stage(stages::COPY_ASSETS, || self.copy_assets())?);

        let root = identity_root(identity, &ids);
        report.generate_root = Some(self.stage(stages::GENERATE_ROOT, || self.store_root(&root))?);
        report.validation = Some(self.stage(stages::VALIDATE, || {
            Ok(validate::validate_root(&self.root))
        })?);
        Ok(report)
    }

    fn check_upgrade_markers(&self) -> Result<(), TbcError> {
        let tbc = self.root.join(TBC_DIR);
        let missing: Vec<&str> = [COMPANION_ID_FILE, PRIME_ID_FILE]
            .into_iter()
            .filter(|f| !tbc.join(f).is_file())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(TbcError::Fatal(format!(
            "Cannot upgrade: missing {} in {}. Only companions created by init can be upgraded.",
            missing.join(" and "),
            tbc.display()
        )))
    }

    /// Existing companion: snapshot, refresh directories and assets, bring
    /// back the root document and extensions, validate, drop the snapshot.
    pub fn upgrade(&self) -> Result<InitReport, TbcError> {
        self.check_upgrade_markers()?;

        let mut report = InitReport::default();
        let snapshot = self.stage(stages::BACKUP_TBC, || backup::backup_tbc(&self.root))?;
        report.backup = Some(snapshot.clone());

        if let Err(e) = self.upgrade_from_snapshot(&snapshot, &mut report) {
            log::error!("Upgrade stopped; snapshot kept at {}", snapshot.display());
            return Err(e);
        }

        report.validation = Some(self.stage(stages::VALIDATE, || {
            Ok(validate::validate_root(&self.root))
        })?);
        backup::remove_snapshot(&snapshot)?;
        Ok(report)
    }

    fn upgrade_from_snapshot(
        &self,
        snapshot: &Path,
        report: &mut InitReport,
    ) -> Result<(), TbcError> {
        let mut restores = Vec::new();

        report.init_dirs = Some(self.stage(stages::INIT_DIRS, || self.init_dirs())?);
        report.copy_assets = Some(self.stage(stages::COPY_ASSETS, || self.copy_assets())?);

        let root_restored = self.stage(stages::RESTORE_ROOT, || {
            backup::restore_root(&self.root, snapshot)
        })?;
        restores.push(restore_line(backup::ROOT_DOCUMENT, root_restored));

        let root = if root_restored {
            let fetched = self.store.fetch(ROOT_COLLECTION, &[ROOT_ID.to_string()]);
            match (fetched.records.get(ROOT_ID), fetched.failures.first()) {
                (Some(existing), _) => Some(merge_root(existing, &generic_root())),
                (None, Some(failure)) => {
                    // Unparseable user root: leave the restored file as is.
                    log::warn!("Keeping restored {} unchanged: {}", backup::ROOT_DOCUMENT, failure);
                    restores.push(format!(
                        "Kept {} unchanged; it could not be parsed ({})",
                        backup::ROOT_DOCUMENT,
                        failure
                    ));
                    None
                }
                (None, None) => Some(generic_root()),
            }
        } else {
            Some(generic_root())
        };
        if let Some(root) = root {
            report.generate_root =
                Some(self.stage(stages::GENERATE_ROOT, || self.store_root(&root))?);
        }

        let ext_restored = self.stage(stages::RESTORE_EXTENSIONS, || {
            backup::restore_extensions(&self.root, snapshot)
        })?;
        restores.push(restore_line(backup::EXTENSIONS_DIR, ext_restored));

        report.restores = Some(restores);
        Ok(())
    }
}

fn restore_line(what: &str, restored: bool) -> String {
    if restored {
        format!("Restored {} from backup", what)
    } else {
        format!("No {} in backup; nothing restored", what)
    }
}
