//! Index ("dex") records derived from fetched records.
//!
//! Pure transforms: input is fetch output, output is records ready for
//! [`RecordStore::store`](crate::core::record_store::RecordStore::store)
//! into the `dex` collection.

use crate::core::record::{
    ATTR_CONTENT, ATTR_FILENAME, ATTR_FULL_CONTENT, ATTR_RECORD_TYPE, Record,
};
use crate::core::record_store::{FetchResults, RecordMap};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEX_RECORD_TYPE: &str = "dex";
pub const CORE_INDEX_ID: &str = "core";
pub const EXTENSIONS_INDEX_ID: &str = "extensions";

pub const ROOT_COLLECTION: &str = "tbc";
pub const ROOT_ID: &str = "root";
pub const SPECS_COLLECTION: &str = "tbc/specs";
pub const EXTENSIONS_COLLECTION: &str = "tbc/extensions";

const EXCLUDED_KEYS: &[&str] = &[ATTR_RECORD_TYPE, ATTR_CONTENT, ATTR_FULL_CONTENT, ATTR_FILENAME];

pub type RecordsByType = BTreeMap<String, Vec<Record>>;

/// Groups records by `record_type`. Untyped records are left out.
pub fn group_by_type(records: &RecordMap) -> RecordsByType {
    let mut groups = RecordsByType::new();
    for record in records.values() {
        match record.record_type.as_deref() {
            Some(t) if !t.is_empty() => groups.entry(t.to_string()).or_default().push(record.clone()),
            _ => log::warn!("Record {} has no record_type; not indexed", record.id),
        }
    }
    groups
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn simple_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `key: value, ...` over the record's scalar attributes.
pub fn index_line(record: &Record) -> String {
    record
        .to_attributes()
        .iter()
        .filter(|(k, _)| !EXCLUDED_KEYS.contains(&k.as_str()))
        .filter_map(|(k, v)| simple_value(v).map(|v| format!("{}: {}", k, v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn index_body(header: &str, records: &[Record]) -> String {
    let mut body = format!("=== {} ===\n", header);
    for record in records {
        body.push_str("- ");
        body.push_str(&index_line(record));
        body.push('\n');
    }
    body
}

fn dex_record(id: &str, filename: &str, title: &str, content: String) -> Record {
    let mut record = Record::new(id);
    record.filename = Some(filename.to_string());
    record.content_type = Some("markdown".to_string());
    record.title = Some(title.to_string());
    record.record_type = Some(DEX_RECORD_TYPE.to_string());
    record.set_content(content);
    record
}

pub fn type_index(record_type: &str, records: &[Record]) -> Record {
    let title = format!("{} Records Index", capitalize(record_type));
    dex_record(
        &format!("{}-index", record_type),
        &format!("{}.md", record_type),
        &title,
        index_body(&title, records),
    )
}

/// One index record per group, in type order.
pub fn type_indexes(groups: &RecordsByType) -> Vec<Record> {
    groups
        .iter()
        .map(|(record_type, records)| type_index(record_type, records))
        .collect()
}

pub fn extensions_index(records: &RecordMap) -> Record {
    let all: Vec<Record> = records.values().cloned().collect();
    dex_record(
        EXTENSIONS_INDEX_ID,
        "extensions.md",
        "Extensions Index",
        index_body("Extensions Index", &all),
    )
}

fn section_label(record: &Record) -> Option<&str> {
    record.origin.as_deref().or(record.filename.as_deref())
}

fn push_sections(lines: &mut Vec<String>, records: Option<&RecordMap>) {
    let Some(records) = records else { return };
    for record in records.values() {
        let (Some(label), Some(full)) = (section_label(record), record.full_content.as_deref())
        else {
            log::debug!("Skipping {} in core index: no file content", record.id);
            continue;
        };
        lines.push(format!("=== {} ===", label));
        lines.push(full.to_string());
        lines.push(String::new());
    }
}

/// Root record, specs and extensions concatenated into `core.md`.
pub fn core_index(fetched: &FetchResults) -> Record {
    let mut lines = vec!["=== Root Record ===".to_string()];
    if let Some(full) = fetched
        .get(ROOT_COLLECTION, ROOT_ID)
        .and_then(|r| r.full_content.as_deref())
    {
        lines.push(full.to_string());
    }
    lines.push(String::new());
    lines.push("=== TBC System Definitions ===".to_string());
    push_sections(&mut lines, fetched.collection(SPECS_COLLECTION));
    push_sections(&mut lines, fetched.collection(EXTENSIONS_COLLECTION));

    dex_record(
        CORE_INDEX_ID,
        "core.md",
        "Core System Definitions",
        lines.join("\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn party(id: &str, title: &str) -> Record {
        let mut r = Record::new(id);
        r.record_type = Some("party".into());
        r.title = Some(title.into());
        r.record_tags = Some(vec!["c/agent/nova".into()]);
        r.extra.insert("party_type".into(), json!("agent"));
        r.extra.insert("rank".into(), json!(3));
        r.set_content("body");
        r.full_content = Some("---\n---\nbody".into());
        r
    }

    #[test]
    fn index_line_keeps_only_scalars() {
        let line = index_line(&party("a1", "Nova"));
        assert_eq!(line, "id: a1, title: Nova, party_type: agent, rank: 3");
    }

    #[test]
    fn groups_skip_untyped_records() {
        let mut map = RecordMap::new();
        map.insert("a1".into(), party("a1", "Nova"));
        map.insert("n1".into(), Record::new("n1"));
        let groups = group_by_type(&map);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["party"].len(), 1);
    }

    #[test]
    fn type_index_shape() {
        let idx = type_index("party", &[party("a1", "Nova")]);
        assert_eq!(idx.id, "party-index");
        assert_eq!(idx.filename.as_deref(), Some("party.md"));
        assert_eq!(idx.title.as_deref(), Some("Party Records Index"));
        assert_eq!(
            idx.content_text(),
            Some("=== Party Records Index ===\n- id: a1, title: Nova, party_type: agent, rank: 3\n")
        );
    }

    #[test]
    fn core_index_sections_in_order() {
        let mut fetched = FetchResults::default();
        let mut root = Record::new("root");
        root.full_content = Some("ROOT".into());
        fetched.merge("tbc", RecordMap::from([("root".to_string(), root)]));

        let mut spec = Record::new("records");
        spec.full_content = Some("SPEC".into());
        spec.origin = Some("tbc/specs/records.md".into());
        fetched.merge("tbc/specs", RecordMap::from([("records".to_string(), spec)]));

        let mut ext = Record::new("mine");
        ext.full_content = Some("EXT".into());
        ext.origin = Some("tbc/extensions/mine.md".into());
        fetched.merge("tbc/extensions", RecordMap::from([("mine".to_string(), ext)]));

        let core = core_index(&fetched);
        assert_eq!(core.id, "core");
        assert_eq!(
            core.content_text(),
            Some(
                "=== Root Record ===\nROOT\n\n=== TBC System Definitions ===\n\
                 === tbc/specs/records.md ===\nSPEC\n\n\
                 === tbc/extensions/mine.md ===\nEXT\n"
            )
        );
    }

    #[test]
    fn core_index_without_inputs_still_has_headers() {
        let core = core_index(&FetchResults::default());
        assert_eq!(
            core.content_text(),
            Some("=== Root Record ===\n\n=== TBC System Definitions ===")
        );
    }
}
