use crate::core::record::Record;
use crate::plugins::role_definition;

pub const HINTS_FILE: &str = ".goosehints";

/// `.goosehints` holds the bare role definition.
pub fn core_records(companion: &str) -> Vec<Record> {
    let mut record = Record::new("goose-hints");
    record.filename = Some(HINTS_FILE.to_string());
    record.content_type = Some("text".to_string());
    record.set_content(role_definition(companion));
    vec![record]
}
