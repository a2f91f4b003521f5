//! Template assets copied into `tbc/` by init and upgrade.
//!
//! The `specs/` and `tools/` trees are embedded at compile time. A directory
//! configured under `[assets] dir` replaces the embedded set entirely.

use crate::core::error::TbcError;
use rust_embed::RustEmbed;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "specs/**"]
#[include = "tools/**"]
struct TemplateAssets;

/// Subtrees copied into `tbc/`, in copy order.
pub const ASSET_TREES: &[&str] = &["specs", "tools"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Embedded,
    Directory(PathBuf),
}

impl AssetSource {
    pub fn from_config(dir: Option<&Path>) -> Self {
        match dir {
            Some(d) => AssetSource::Directory(d.to_path_buf()),
            None => AssetSource::Embedded,
        }
    }

    fn describe(&self, tree: &str) -> String {
        match self {
            AssetSource::Embedded => format!("embedded {}", tree),
            AssetSource::Directory(d) => d.join(tree).display().to_string(),
        }
    }

    /// `(relative path within tree, bytes)` for every file under `tree`.
    fn files(&self, tree: &str) -> Result<Vec<(String, Cow<'static, [u8]>)>, TbcError> {
        match self {
            AssetSource::Embedded => {
                let prefix = format!("{}/", tree);
                let mut out = Vec::new();
                for name in TemplateAssets::iter() {
                    let Some(rel) = name.strip_prefix(&prefix) else { continue };
                    if let Some(file) = TemplateAssets::get(&name) {
                        out.push((rel.to_string(), file.data));
                    }
                }
                if out.is_empty() {
                    return Err(TbcError::NotFound(format!("embedded asset tree {}", tree)));
                }
                out.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(out)
            }
            AssetSource::Directory(dir) => {
                let base = dir.join(tree);
                if !base.is_dir() {
                    return Err(TbcError::NotFound(format!(
                        "asset directory {}",
                        base.display()
                    )));
                }
                let mut paths = Vec::new();
                collect_files(&base, &mut paths)?;
                let mut out = Vec::new();
                for path in paths {
                    let rel = path
                        .strip_prefix(&base)
                        .map_err(|e| TbcError::ValidationError(e.to_string()))?
                        .to_string_lossy()
                        .replace('\\', "/");
                    out.push((rel, Cow::Owned(fs::read(&path)?)));
                }
                out.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(out)
            }
        }
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), TbcError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Names of embedded asset files (`specs/...`, `tools/...`).
pub fn list_embedded() -> Vec<String> {
    let mut names: Vec<String> = TemplateAssets::iter().map(|n| n.into_owned()).collect();
    names.sort();
    names
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), TbcError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), TbcError> {
    Ok(())
}

/// Copies every asset tree into `tbc_dir`. Files already identical on disk
/// are left untouched.
pub fn copy_assets(source: &AssetSource, tbc_dir: &Path) -> Result<Vec<String>, TbcError> {
    let mut results = Vec::new();
    for tree in ASSET_TREES {
        let target = tbc_dir.join(tree);
        let files = source.files(tree).map_err(|e| {
            TbcError::ValidationError(format!("Failed to copy {}: {}", tree, e))
        })?;

        let mut written = 0usize;
        let mut unchanged = 0usize;
        for (rel, data) in files {
            let dest = target.join(&rel);
            if dest.is_file() {
                let existing = fs::read(&dest)?;
                if sha256_hex(&existing) == sha256_hex(&data) {
                    unchanged += 1;
                    continue;
                }
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, &data)?;
            if rel.ends_with(".sh") {
                mark_executable(&dest)?;
            }
            written += 1;
        }

        results.push(format!(
            "Copied {} from {} to {} ({} written, {} unchanged)",
            tree,
            source.describe(tree),
            target.display(),
            written,
            unchanged
        ));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn embedded_trees_are_present() {
        let names = list_embedded();
        assert!(names.iter().any(|n| n.starts_with("specs/")));
        assert!(names.iter().any(|n| n.starts_with("tools/")));
    }

    #[test]
    fn second_copy_reports_everything_unchanged() {
        let tmp = tempdir().expect("tempdir");
        let tbc = tmp.path().join("tbc");
        let first = copy_assets(&AssetSource::Embedded, &tbc).expect("copy");
        assert_eq!(first.len(), 2);
        assert!(first[0].contains("0 unchanged"));
        let second = copy_assets(&AssetSource::Embedded, &tbc).expect("copy again");
        assert!(second.iter().all(|l| l.contains(" 0 written")));
    }

    #[test]
    fn directory_source_replaces_embedded_set() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("templates");
        fs::create_dir_all(src.join("specs/nested")).expect("mkdir");
        fs::create_dir_all(src.join("tools")).expect("mkdir");
        fs::write(src.join("specs/nested/custom.md"), "# Custom\n").expect("write");
        fs::write(src.join("tools/run.sh"), "#!/bin/sh\n").expect("write");

        let tbc = tmp.path().join("root/tbc");
        copy_assets(&AssetSource::Directory(src), &tbc).expect("copy");
        assert!(tbc.join("specs/nested/custom.md").is_file());
        assert!(tbc.join("tools/run.sh").is_file());
    }

    #[test]
    fn missing_tree_in_directory_source_fails() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("templates");
        fs::create_dir_all(src.join("specs")).expect("mkdir");
        let err = copy_assets(&AssetSource::Directory(src), &tmp.path().join("tbc"))
            .expect_err("tools missing");
        assert!(err.to_string().contains("Failed to copy tools"));
    }
}
