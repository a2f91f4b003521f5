//! On-disk record formats.
//!
//! Four formats are written (markdown with a YAML header, JSON, YAML, raw
//! text). Reading dispatches on the file extension only: `.json` and `.md`
//! are parsed, everything else comes back as raw text.

use crate::core::error::TbcError;
use crate::core::record::{ATTR_CONTENT, ATTR_FRONTMATTER, ATTR_TITLE, Attributes, Record};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

const DELIMITER: &str = "---";

static FIRST_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("heading pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Markdown,
    Json,
    Yaml,
    Raw,
}

impl RecordFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" => Some(RecordFormat::Markdown),
            "json" => Some(RecordFormat::Json),
            "yaml" | "yml" => Some(RecordFormat::Yaml),
            _ => None,
        }
    }

    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.to_ascii_lowercase().as_str() {
            "markdown" => Some(RecordFormat::Markdown),
            "json" => Some(RecordFormat::Json),
            "yaml" => Some(RecordFormat::Yaml),
            _ => None,
        }
    }

    /// Explicit filename extension, then `contentType`, then raw.
    pub fn for_record(record: &Record) -> Self {
        record
            .filename
            .as_deref()
            .and_then(|f| Path::new(f).extension())
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .or_else(|| {
                record
                    .content_type
                    .as_deref()
                    .and_then(Self::from_content_type)
            })
            .unwrap_or(RecordFormat::Raw)
    }

    pub fn default_filename(self, id: &str) -> String {
        match self {
            RecordFormat::Markdown => format!("{}.md", id),
            RecordFormat::Json => format!("{}.json", id),
            RecordFormat::Yaml => format!("{}.yaml", id),
            RecordFormat::Raw => id.to_string(),
        }
    }
}

/// Serializes a record in the given format.
pub fn encode(record: &Record, format: RecordFormat) -> Result<String, TbcError> {
    match format {
        RecordFormat::Markdown => {
            let header = match &record.frontmatter {
                Some(explicit) => explicit.clone(),
                None => {
                    let mut attrs = record.persisted_attributes();
                    attrs.shift_remove(ATTR_CONTENT);
                    attrs
                }
            };
            render_front_matter(&header, &record.content_string())
        }
        RecordFormat::Json => Ok(serde_json::to_string_pretty(&Value::Object(
            record.persisted_attributes(),
        ))?),
        RecordFormat::Yaml => match &record.content {
            Some(content) => Ok(serde_yaml::to_string(content)?),
            None => Ok(serde_yaml::to_string(&Value::Object(
                record.persisted_attributes(),
            ))?),
        },
        RecordFormat::Raw => Ok(record.content_string()),
    }
}

/// Parses file text into a record according to the file's extension.
///
/// The returned record carries no id; the resolver assigns it.
pub fn decode(path: &Path, text: &str) -> Result<Record, TbcError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => match serde_json::from_str::<Value>(text)? {
            Value::Object(attrs) => Ok(Record::from(attrs)),
            other => Err(TbcError::ValidationError(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        },
        Some("md") => {
            let (header, body) = parse_front_matter(text)?;
            let mut record = Record::from(header);
            let needs_title = record.title.as_deref().is_none_or(str::is_empty)
                && !record.extra.contains_key(ATTR_TITLE);
            if needs_title {
                if let Some(title) = first_heading(&body) {
                    record.title = Some(title);
                }
            }
            record.set_content(body);
            record.full_content = Some(text.to_string());
            Ok(record)
        }
        _ => {
            let mut record = Record::new("");
            record.set_content(text);
            record.full_content = Some(text.to_string());
            Ok(record)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Text of the first top-level `# ` heading.
pub fn first_heading(body: &str) -> Option<String> {
    FIRST_HEADING
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn strip_line_break(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

/// Splits `---` delimited YAML front matter from the body.
///
/// Text that does not open with a delimiter line has an empty header. An
/// unterminated header consumes the rest of the file.
pub fn parse_front_matter(text: &str) -> Result<(Attributes, String), TbcError> {
    let Some(after_open) = text.strip_prefix(DELIMITER) else {
        return Ok((Attributes::new(), text.to_string()));
    };
    let rest = match strip_line_break(after_open) {
        Some(rest) => rest,
        None if after_open.is_empty() => after_open,
        None => return Ok((Attributes::new(), text.to_string())),
    };

    let mut offset = 0;
    let mut header_end = rest.len();
    let mut body_start = rest.len();
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            header_end = offset;
            body_start = offset + line.len();
            break;
        }
        offset += line.len();
    }

    let header = parse_yaml_header(&rest[..header_end])?;
    Ok((header, rest[body_start..].to_string()))
}

fn parse_yaml_header(block: &str) -> Result<Attributes, TbcError> {
    if block.trim().is_empty() {
        return Ok(Attributes::new());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(block)?;
    match serde_json::to_value(yaml)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Attributes::new()),
        other => Err(TbcError::ValidationError(format!(
            "front matter must be a mapping, found {}",
            json_kind(&other)
        ))),
    }
}

/// Renders a YAML header followed by the body. An empty header is omitted.
pub fn render_front_matter(header: &Attributes, body: &str) -> Result<String, TbcError> {
    let mut header = header.clone();
    header.shift_remove(ATTR_FRONTMATTER);
    if header.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(&Value::Object(header))?;
    Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(value: Value) -> Record {
        serde_json::from_value(value).expect("record")
    }

    #[test]
    fn format_prefers_filename_extension_over_content_type() {
        let r = record_with(json!({"id": "x", "filename": "x.json", "contentType": "markdown"}));
        assert_eq!(RecordFormat::for_record(&r), RecordFormat::Json);

        let r = record_with(json!({"id": "x", "filename": "conf.yml"}));
        assert_eq!(RecordFormat::for_record(&r), RecordFormat::Yaml);

        let r = record_with(json!({"id": "x", "contentType": "markdown"}));
        assert_eq!(RecordFormat::for_record(&r), RecordFormat::Markdown);

        let r = record_with(json!({"id": "companion.id", "filename": "companion.id", "contentType": "raw"}));
        assert_eq!(RecordFormat::for_record(&r), RecordFormat::Raw);

        let r = record_with(json!({"id": "hints", "filename": ".goosehints", "contentType": "text"}));
        assert_eq!(RecordFormat::for_record(&r), RecordFormat::Raw);

        let r = record_with(json!({"id": "modes", "filename": ".kilocodemodes", "contentType": "yaml"}));
        assert_eq!(RecordFormat::for_record(&r), RecordFormat::Yaml);
    }

    #[test]
    fn default_filenames_follow_format() {
        assert_eq!(RecordFormat::Markdown.default_filename("a"), "a.md");
        assert_eq!(RecordFormat::Json.default_filename("a"), "a.json");
        assert_eq!(RecordFormat::Yaml.default_filename("a"), "a.yaml");
        assert_eq!(RecordFormat::Raw.default_filename("a"), "a");
    }

    #[test]
    fn markdown_header_excludes_content_and_body_follows() {
        let r = record_with(json!({
            "id": "n1",
            "record_type": "note",
            "title": "Hello",
            "contentType": "markdown",
            "content": "# Hello\n\nBody text\n"
        }));
        let text = encode(&r, RecordFormat::Markdown).expect("encode");
        assert!(text.starts_with("---\nid: n1\n"));
        assert!(text.contains("record_type: note\n"));
        assert!(!text.contains("content: "));
        assert!(text.ends_with("---\n# Hello\n\nBody text\n"));
    }

    #[test]
    fn explicit_frontmatter_replaces_record_attributes() {
        let r = record_with(json!({
            "id": "agent",
            "filename": ".github/agents/nova.agent.md",
            "content": "role",
            "frontmatter": {"description": "Nova agent", "tools": ["read", "edit"]}
        }));
        let text = encode(&r, RecordFormat::Markdown).expect("encode");
        assert!(text.contains("description: Nova agent"));
        assert!(text.contains("- read"));
        assert!(!text.contains("id: agent"));
        assert!(!text.contains("filename:"));
        assert!(text.ends_with("---\nrole"));
    }

    #[test]
    fn yaml_dumps_content_when_present() {
        let r = record_with(json!({
            "id": "modes",
            "contentType": "yaml",
            "content": {"customModes": [{"slug": "nova"}]}
        }));
        let text = encode(&r, RecordFormat::Yaml).expect("encode");
        assert!(text.contains("customModes:"));
        assert!(text.contains("slug: nova"));
        assert!(!text.contains("id: modes"));

        let bare = record_with(json!({"id": "cfg", "contentType": "yaml", "level": 3}));
        let text = encode(&bare, RecordFormat::Yaml).expect("encode");
        assert!(text.contains("id: cfg"));
        assert!(text.contains("level: 3"));
    }

    #[test]
    fn raw_writes_content_only() {
        let r = record_with(json!({"id": "prime.id", "contentType": "raw", "content": "0190-abc"}));
        assert_eq!(encode(&r, RecordFormat::Raw).expect("encode"), "0190-abc");
    }

    #[test]
    fn json_is_pretty_and_keeps_id() {
        let r = record_with(json!({"id": "j1", "title": "T"}));
        let text = encode(&r, RecordFormat::Json).expect("encode");
        assert_eq!(text, "{\n  \"id\": \"j1\",\n  \"title\": \"T\"\n}");
    }

    #[test]
    fn markdown_decode_reads_header_body_and_full_text() {
        let text = "---\nid: wrong\nrecord_type: party\ntags_extra: 3\n---\n# Nova\n\nAgent.\n";
        let r = decode(Path::new("vault/a1.md"), text).expect("decode");
        assert_eq!(r.record_type.as_deref(), Some("party"));
        assert_eq!(r.title.as_deref(), Some("Nova"));
        assert_eq!(r.content_text(), Some("# Nova\n\nAgent.\n"));
        assert_eq!(r.full_content.as_deref(), Some(text));
        assert_eq!(r.extra.get("tags_extra"), Some(&json!(3)));
    }

    #[test]
    fn markdown_title_from_header_wins_over_heading() {
        let text = "---\ntitle: Declared\n---\n# Heading\n";
        let r = decode(Path::new("x.md"), text).expect("decode");
        assert_eq!(r.title.as_deref(), Some("Declared"));
    }

    #[test]
    fn markdown_without_header_is_all_body() {
        let text = "Just text\n# Later heading\n";
        let r = decode(Path::new("plain.md"), text).expect("decode");
        assert_eq!(r.content_text(), Some(text));
        assert_eq!(r.title.as_deref(), Some("Later heading"));
    }

    #[test]
    fn empty_header_block_parses() {
        let (header, body) = parse_front_matter("---\n---\nbody").expect("parse");
        assert!(header.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn crlf_delimiters_are_accepted() {
        let (header, body) = parse_front_matter("---\r\na: 1\r\n---\r\nbody\r\n").expect("parse");
        assert_eq!(header.get("a"), Some(&json!(1)));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn non_mapping_header_is_an_error() {
        assert!(parse_front_matter("---\n- a\n- b\n---\nbody").is_err());
    }

    #[test]
    fn json_decode_requires_object() {
        assert!(decode(Path::new("x.json"), "[1, 2]").is_err());
        assert!(decode(Path::new("x.json"), "{ nope").is_err());
        let r = decode(Path::new("x.json"), "{\"title\": \"J\"}").expect("decode");
        assert_eq!(r.title.as_deref(), Some("J"));
        assert!(r.full_content.is_none());
    }

    #[test]
    fn other_extensions_decode_as_raw() {
        let r = decode(Path::new("tbc/companion.id"), "0190-abc").expect("decode");
        assert_eq!(r.content_text(), Some("0190-abc"));
        assert_eq!(r.full_content.as_deref(), Some("0190-abc"));
    }

    #[test]
    fn empty_header_renders_body_only() {
        assert_eq!(
            render_front_matter(&Attributes::new(), "body").expect("render"),
            "body"
        );
    }
}
