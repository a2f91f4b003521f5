//! Structural check of a root directory.
//!
//! Never fails: missing pieces become messages. A root is valid when both
//! `tbc/` and `vault/` exist; `dex/` is optional.

use std::path::Path;

pub const TBC_DIR: &str = "tbc";
pub const VAULT_DIR: &str = "vault";
pub const DEX_DIR: &str = "dex";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid_root: bool,
    pub is_git_repository: bool,
    pub messages: Vec<String>,
}

pub fn validate_root(root: &Path) -> Validation {
    let mut messages = Vec::new();
    log::debug!("Inspecting directory: {}", root.display());

    let tbc_exists = root.join(TBC_DIR).exists();
    messages.push(format!(
        "tbc/ directory: {}",
        if tbc_exists { "✓ Found" } else { "✗ Missing" }
    ));

    let vault_exists = root.join(VAULT_DIR).exists();
    messages.push(format!(
        "vault/ directory: {}",
        if vault_exists { "✓ Found" } else { "✗ Missing" }
    ));

    let dex_exists = root.join(DEX_DIR).exists();
    messages.push(format!(
        "dex/ directory: {}",
        if dex_exists {
            "Found (optional)"
        } else {
            "Optional (will be created if missing)"
        }
    ));

    let git_exists = root.join(".git").exists();
    messages.push(format!(
        ".git/ directory: {}",
        if git_exists { "✓ Found" } else { "Not found" }
    ));

    let is_valid_root = tbc_exists && vault_exists;
    messages.push(if is_valid_root {
        "✅ This appears to be a valid TBC root directory.".to_string()
    } else {
        "❌ This does not appear to be a valid TBC root directory.".to_string()
    });

    for m in &messages {
        log::debug!("{}", m);
    }

    Validation {
        is_valid_root,
        is_git_repository: git_exists,
        messages,
    }
}
