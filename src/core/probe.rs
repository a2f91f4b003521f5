//! Environment summary for `tbc probe`.

use crate::core::validate;
use chrono::{Local, Utc};
use std::env;
use std::fs;
use std::path::Path;

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn env_or_unknown(keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| env::var(k).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// System uptime as `Xh Ym`, where the platform exposes it.
fn uptime() -> Option<String> {
    let raw = fs::read_to_string("/proc/uptime").ok()?;
    let secs = raw.split_whitespace().next()?.parse::<f64>().ok()? as u64;
    Some(format!("{}h {}m", secs / 3600, (secs % 3600) / 60))
}

pub fn probe(root: &Path) -> Vec<String> {
    let validation = validate::validate_root(root);
    vec![
        format!("{}: {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        format!("TBC Root: {}", root.display()),
        format!("TBC Root Valid: {}", yes_no(validation.is_valid_root)),
        format!("Git Repository: {}", yes_no(validation.is_git_repository)),
        format!("User: {}", env_or_unknown(&["USER", "USERNAME"])),
        format!("Uptime: {}", uptime().unwrap_or_else(|| "unknown".to_string())),
        format!("Local Time: {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
        format!("UTC Time: {}", Utc::now().to_rfc3339()),
        format!("OS: {} ({})", env::consts::OS, env::consts::ARCH),
        format!("Platform: {}", env::consts::FAMILY),
        format!("Shell: {}", env_or_unknown(&["SHELL", "COMSPEC"])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn probe_reports_root_state() {
        let tmp = tempdir().expect("tempdir");
        let lines = probe(tmp.path());
        assert!(lines[0].starts_with("tbc: "));
        assert!(lines.contains(&"TBC Root Valid: No".to_string()));
        assert!(lines.contains(&"Git Repository: No".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("UTC Time: ")));
    }
}
