//! Locates and parses the file backing a record id within a collection.
//!
//! Candidate order: `{id}.json`, `{id}.md`, `{id}`, then every other file
//! whose name starts with `{id}.` in directory-listing order. The first
//! candidate that exists and parses wins.

use crate::core::codec;
use crate::core::error::{ItemFailure, TbcError};
use crate::core::record::Record;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Outcome of resolving one id.
#[derive(Debug)]
pub enum Resolution {
    Found(Record),
    /// No candidate file exists. Not an error.
    NotFound,
    /// Candidates exist but none could be read or parsed.
    Failed(ItemFailure),
}

pub fn collection_dir(root: &Path, collection: &str) -> PathBuf {
    collection
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// True when `path` would leave the directory it is joined onto.
pub fn escapes_collection(path: &Path) -> bool {
    path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

pub fn candidate_paths(collection_path: &Path, id: &str) -> Vec<PathBuf> {
    let mut candidates = vec![
        collection_path.join(format!("{}.json", id)),
        collection_path.join(format!("{}.md", id)),
        collection_path.join(id),
    ];

    let prefix = format!("{}.", id);
    if let Ok(entries) = fs::read_dir(collection_path) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) {
                let path = entry.path();
                if !candidates.contains(&path) {
                    candidates.push(path);
                }
            }
        }
    }
    candidates
}

fn read_candidate(path: &Path) -> Result<Record, TbcError> {
    let text = fs::read_to_string(path)?;
    codec::decode(path, &text)
}

/// Resolves `id` in `collection` under `root`.
pub fn resolve(root: &Path, collection: &str, id: &str) -> Resolution {
    if id.is_empty() || escapes_collection(Path::new(id)) {
        return Resolution::Failed(ItemFailure::new(
            Some(id),
            None,
            format!("id must stay inside the collection: {}", id),
        ));
    }
    let collection_path = collection_dir(root, collection);
    let mut last_failure: Option<ItemFailure> = None;

    for path in candidate_paths(&collection_path, id) {
        if !path.is_file() {
            continue;
        }
        match read_candidate(&path) {
            Ok(mut record) => {
                record.id = id.to_string();
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                record.origin = Some(if collection.is_empty() || collection == "." {
                    file_name
                } else {
                    format!("{}/{}", collection.trim_end_matches('/'), file_name)
                });
                return Resolution::Found(record);
            }
            Err(e) => {
                log::error!("Error parsing file {}: {}", path.display(), e);
                last_failure = Some(ItemFailure::new(Some(id), Some(path.clone()), e.to_string()));
            }
        }
    }

    match last_failure {
        Some(failure) => Resolution::Failed(failure),
        None => Resolution::NotFound,
    }
}

/// Ids of every `*.md` file directly inside a collection, sorted.
///
/// A missing collection directory yields no ids.
pub fn list_markdown_ids(root: &Path, collection: &str) -> Result<Vec<String>, TbcError> {
    let collection_path = collection_dir(root, collection);
    let entries = match fs::read_dir(&collection_path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(TbcError::IoError(e)),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(id) = name.strip_suffix(".md") {
            if entry.path().is_file() {
                ids.push(id.to_string());
            }
        }
    }
    ids.sort();
    Ok(ids)
}
