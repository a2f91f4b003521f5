//! GitHub Copilot custom agent under `.github/agents/`.

use crate::core::record::{Attributes, Record};
use crate::plugins::role_definition;
use serde_json::json;

pub const TOOLS: &[&str] = &["execute", "read", "edit", "search"];

pub fn core_records(companion: &str) -> Vec<Record> {
    let slug = companion.to_lowercase();
    let mut header = Attributes::new();
    header.insert(
        "description".into(),
        json!(format!(
            "This custom agent personifies {}, the AI Assistant in the Third Brain Companion \
             system. It always begins by reading the root definitions and specifications to align \
             with its identity and motivations.",
            companion
        )),
    );
    header.insert("tools".into(), json!(TOOLS));

    let mut record = Record::new(format!("github-copilot-agent-{}", slug));
    record.filename = Some(format!(".github/agents/{}.agent.md", slug));
    record.content_type = Some("markdown".to_string());
    record.frontmatter = Some(header);
    record.set_content(role_definition(companion));
    vec![record]
}
