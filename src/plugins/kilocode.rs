//! `.kilocodemodes`: a single project mode acting as the companion.

use crate::core::record::Record;
use crate::plugins::role_definition;
use serde_json::json;

pub const MODES_FILE: &str = ".kilocodemodes";

pub fn core_records(companion: &str) -> Vec<Record> {
    let mut record = Record::new("kilocode-modes");
    record.filename = Some(MODES_FILE.to_string());
    record.content_type = Some("yaml".to_string());
    record.content = Some(json!({
        "customModes": [{
            "slug": companion.to_lowercase(),
            "name": companion,
            "roleDefinition": role_definition(companion),
            "groups": ["read", "edit", "browser", "command", "mcp"],
            "source": "project",
        }]
    }));
    vec![record]
}
