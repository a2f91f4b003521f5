//! Single-use snapshot of `tbc/` taken before an upgrade.
//!
//! The snapshot lives beside `tbc/` as `tbc-YYYYMMDDHHmmss` (with a `-N`
//! suffix if that name is taken). Restores pull individual pieces back;
//! the snapshot is removed once the restores have run.

use crate::core::error::TbcError;
use crate::core::time;
use crate::core::validate::TBC_DIR;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const ROOT_DOCUMENT: &str = "root.md";
pub const EXTENSIONS_DIR: &str = "extensions";

static SNAPSHOT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tbc-\d{14}(-\d+)?$").expect("snapshot pattern compiles"));

pub fn is_snapshot_name(name: &str) -> bool {
    SNAPSHOT_NAME.is_match(name)
}

/// Snapshot directories currently under `root`, sorted by name.
pub fn list_snapshots(root: &Path) -> Result<Vec<PathBuf>, TbcError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let is_match = entry.file_name().to_str().is_some_and(is_snapshot_name);
        if is_match && entry.path().is_dir() {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

fn snapshot_path(root: &Path, stamp: &str) -> PathBuf {
    let base = root.join(format!("{}-{}", TBC_DIR, stamp));
    if !base.exists() {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = root.join(format!("{}-{}-{}", TBC_DIR, stamp, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), TbcError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

/// Copies `root/tbc` into a fresh snapshot directory and returns its path.
pub fn backup_tbc(root: &Path) -> Result<PathBuf, TbcError> {
    let source = root.join(TBC_DIR);
    if !source.is_dir() {
        return Err(TbcError::NotFound(format!("{}", source.display())));
    }
    let target = snapshot_path(root, &time::now_compact_utc());
    copy_dir_recursive(&source, &target)?;
    log::debug!("Backed up {} to {}", source.display(), target.display());
    Ok(target)
}

/// Copies `root.md` from the snapshot into `tbc/`. Returns whether it existed.
pub fn restore_root(root: &Path, snapshot: &Path) -> Result<bool, TbcError> {
    let from = snapshot.join(ROOT_DOCUMENT);
    if !from.is_file() {
        log::debug!("No {} in {}", ROOT_DOCUMENT, snapshot.display());
        return Ok(false);
    }
    let tbc = root.join(TBC_DIR);
    fs::create_dir_all(&tbc)?;
    fs::copy(&from, tbc.join(ROOT_DOCUMENT))?;
    Ok(true)
}

/// Copies `extensions/` from the snapshot into `tbc/extensions`. Returns
/// whether it existed.
pub fn restore_extensions(root: &Path, snapshot: &Path) -> Result<bool, TbcError> {
    let from = snapshot.join(EXTENSIONS_DIR);
    if !from.is_dir() {
        log::debug!("No {}/ in {}", EXTENSIONS_DIR, snapshot.display());
        return Ok(false);
    }
    copy_dir_recursive(&from, &root.join(TBC_DIR).join(EXTENSIONS_DIR))?;
    Ok(true)
}

pub fn remove_snapshot(snapshot: &Path) -> Result<(), TbcError> {
    if snapshot.exists() {
        fs::remove_dir_all(snapshot)?;
        log::debug!("Removed snapshot {}", snapshot.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_root() -> tempfile::TempDir {
        let tmp = tempdir().expect("tempdir");
        let tbc = tmp.path().join("tbc");
        fs::create_dir_all(tbc.join("extensions/deep")).expect("mkdir");
        fs::write(tbc.join("root.md"), "# Mine\n").expect("write");
        fs::write(tbc.join("extensions/deep/x.md"), "ext").expect("write");
        tmp
    }

    #[test]
    fn snapshot_names_match_pattern() {
        assert!(is_snapshot_name("tbc-20251214004918"));
        assert!(is_snapshot_name("tbc-20251214004918-2"));
        assert!(!is_snapshot_name("20251214004918-tbc"));
        assert!(!is_snapshot_name("tbc"));
    }

    #[test]
    fn backup_copies_tree_and_avoids_collisions() {
        let tmp = seeded_root();
        let first = backup_tbc(tmp.path()).expect("backup");
        let second = backup_tbc(tmp.path()).expect("backup again");
        assert_ne!(first, second);
        assert!(first.join("extensions/deep/x.md").is_file());
        assert_eq!(list_snapshots(tmp.path()).expect("list").len(), 2);
    }

    #[test]
    fn restores_then_removes_snapshot() {
        let tmp = seeded_root();
        let snap = backup_tbc(tmp.path()).expect("backup");
        fs::remove_dir_all(tmp.path().join("tbc")).expect("wipe");

        assert!(restore_root(tmp.path(), &snap).expect("root"));
        assert!(restore_extensions(tmp.path(), &snap).expect("ext"));
        assert_eq!(
            fs::read_to_string(tmp.path().join("tbc/root.md")).expect("read"),
            "# Mine\n"
        );
        assert!(tmp.path().join("tbc/extensions/deep/x.md").is_file());

        remove_snapshot(&snap).expect("remove");
        assert!(list_snapshots(tmp.path()).expect("list").is_empty());
    }

    #[test]
    fn restore_without_content_is_a_no_op() {
        let tmp = tempdir().expect("tempdir");
        fs::create_dir_all(tmp.path().join("tbc")).expect("mkdir");
        let snap = backup_tbc(tmp.path()).expect("backup");
        assert!(!restore_root(tmp.path(), &snap).expect("root"));
        assert!(!restore_extensions(tmp.path(), &snap).expect("ext"));
    }
}
