//! Record model shared by the resolver, codec, store and index generators.
//!
//! A record is an open attribute map with a handful of well-known keys. The
//! well-known keys are lifted into typed fields; anything else (and any
//! well-known key whose value has an unexpected shape) lives in `extra` and
//! is written back exactly as it was read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered attribute map (insertion order is preserved).
pub type Attributes = Map<String, Value>;

pub const ATTR_ID: &str = "id";
pub const ATTR_RECORD_TYPE: &str = "record_type";
pub const ATTR_RECORD_TAGS: &str = "record_tags";
pub const ATTR_TITLE: &str = "title";
pub const ATTR_FILENAME: &str = "filename";
pub const ATTR_CONTENT_TYPE: &str = "contentType";
pub const ATTR_CONTENT: &str = "content";
pub const ATTR_FULL_CONTENT: &str = "fullContent";
pub const ATTR_FRONTMATTER: &str = "frontmatter";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Attributes", into = "Attributes")]
pub struct Record {
    pub id: String,
    pub record_type: Option<String>,
    pub record_tags: Option<Vec<String>>,
    pub title: Option<String>,
    /// Explicit on-disk name relative to the collection; may contain subdirectories.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub content: Option<Value>,
    /// Raw file text as read by fetch. Never persisted.
    pub full_content: Option<String>,
    /// Explicit markdown header, used instead of the record's own attributes.
    pub frontmatter: Option<Attributes>,
    pub extra: Attributes,
    /// `<collection>/<file name>` the record was fetched from. Not an attribute.
    pub origin: Option<String>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Body as text when it is a plain string.
    pub fn content_text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }

    /// Body rendered for formats that carry no metadata.
    pub fn content_string(&self) -> String {
        match &self.content {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(Value::String(content.into()));
    }

    /// Looks up any attribute, well-known or not.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.to_attributes().shift_remove(key)
    }

    /// All attributes in a stable order: identity and classification first,
    /// then free-form attributes, then storage hints and the body.
    pub fn to_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        if !self.id.is_empty() {
            attrs.insert(ATTR_ID.into(), Value::String(self.id.clone()));
        }
        if let Some(t) = &self.record_type {
            attrs.insert(ATTR_RECORD_TYPE.into(), Value::String(t.clone()));
        }
        if let Some(tags) = &self.record_tags {
            let tags = tags.iter().cloned().map(Value::String).collect();
            attrs.insert(ATTR_RECORD_TAGS.into(), Value::Array(tags));
        }
        if let Some(title) = &self.title {
            attrs.insert(ATTR_TITLE.into(), Value::String(title.clone()));
        }
        for (k, v) in &self.extra {
            attrs.insert(k.clone(), v.clone());
        }
        if let Some(f) = &self.filename {
            attrs.insert(ATTR_FILENAME.into(), Value::String(f.clone()));
        }
        if let Some(ct) = &self.content_type {
            attrs.insert(ATTR_CONTENT_TYPE.into(), Value::String(ct.clone()));
        }
        if let Some(c) = &self.content {
            attrs.insert(ATTR_CONTENT.into(), c.clone());
        }
        if let Some(fc) = &self.full_content {
            attrs.insert(ATTR_FULL_CONTENT.into(), Value::String(fc.clone()));
        }
        if let Some(fm) = &self.frontmatter {
            attrs.insert(ATTR_FRONTMATTER.into(), Value::Object(fm.clone()));
        }
        attrs
    }

    /// Attributes that are written to disk (`fullContent` is derived on read).
    pub fn persisted_attributes(&self) -> Attributes {
        let mut attrs = self.to_attributes();
        attrs.shift_remove(ATTR_FULL_CONTENT);
        attrs
    }
}

fn take_string(attrs: &mut Attributes, key: &str) -> Option<String> {
    match attrs.get(key) {
        Some(Value::String(_)) => attrs.shift_remove(key).and_then(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        }),
        _ => None,
    }
}

fn take_string_list(attrs: &mut Attributes, key: &str) -> Option<Vec<String>> {
    let all_strings = match attrs.get(key) {
        Some(Value::Array(items)) => items.iter().all(Value::is_string),
        _ => false,
    };
    if !all_strings {
        return None;
    }
    match attrs.shift_remove(key) {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn take_object(attrs: &mut Attributes, key: &str) -> Option<Attributes> {
    match attrs.get(key) {
        Some(Value::Object(_)) => match attrs.shift_remove(key) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

impl From<Attributes> for Record {
    fn from(mut attrs: Attributes) -> Self {
        let id = match attrs.get(ATTR_ID) {
            Some(Value::Number(n)) => {
                let id = n.to_string();
                attrs.shift_remove(ATTR_ID);
                id
            }
            _ => take_string(&mut attrs, ATTR_ID).unwrap_or_default(),
        };
        let record_type = take_string(&mut attrs, ATTR_RECORD_TYPE);
        let record_tags = take_string_list(&mut attrs, ATTR_RECORD_TAGS);
        let title = take_string(&mut attrs, ATTR_TITLE);
        let filename = take_string(&mut attrs, ATTR_FILENAME);
        let content_type = take_string(&mut attrs, ATTR_CONTENT_TYPE);
        let content = attrs.shift_remove(ATTR_CONTENT);
        let full_content = take_string(&mut attrs, ATTR_FULL_CONTENT);
        let frontmatter = take_object(&mut attrs, ATTR_FRONTMATTER);

        Record {
            id,
            record_type,
            record_tags,
            title,
            filename,
            content_type,
            content,
            full_content,
            frontmatter,
            extra: attrs,
            origin: None,
        }
    }
}

impl From<Record> for Attributes {
    fn from(record: Record) -> Self {
        record.to_attributes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn known_fields_are_lifted_and_unknown_kept() {
        let record = Record::from(attrs(json!({
            "id": "a1",
            "record_type": "party",
            "record_tags": ["c/agent/nova"],
            "party_type": "agent",
            "title": "Nova",
            "content": "body"
        })));
        assert_eq!(record.id, "a1");
        assert_eq!(record.record_type.as_deref(), Some("party"));
        assert_eq!(record.record_tags, Some(vec!["c/agent/nova".to_string()]));
        assert_eq!(record.title.as_deref(), Some("Nova"));
        assert_eq!(record.content_text(), Some("body"));
        assert_eq!(record.extra.get("party_type"), Some(&json!("agent")));
    }

    #[test]
    fn misshapen_known_keys_fall_back_to_extra() {
        let record = Record::from(attrs(json!({
            "id": "x",
            "record_tags": "not-a-list",
            "title": 42
        })));
        assert!(record.record_tags.is_none());
        assert!(record.title.is_none());
        assert_eq!(record.extra.get("record_tags"), Some(&json!("not-a-list")));
        assert_eq!(record.extra.get("title"), Some(&json!(42)));

        let back = record.to_attributes();
        assert_eq!(back.get("record_tags"), Some(&json!("not-a-list")));
        assert_eq!(back.get("title"), Some(&json!(42)));
    }

    #[test]
    fn numeric_id_is_stringified() {
        let record = Record::from(attrs(json!({ "id": 7 })));
        assert_eq!(record.id, "7");
    }

    #[test]
    fn extra_attribute_order_survives_conversion() {
        let record = Record::from(attrs(json!({
            "id": "r",
            "zeta": 1,
            "alpha": 2,
            "mid": 3
        })));
        let keys: Vec<_> = record.to_attributes().keys().cloned().collect();
        assert_eq!(keys, vec!["id", "zeta", "alpha", "mid"]);
    }

    #[test]
    fn persisted_attributes_drop_full_content() {
        let mut record = Record::new("r");
        record.full_content = Some("raw".into());
        assert!(record.to_attributes().contains_key(ATTR_FULL_CONTENT));
        assert!(!record.persisted_attributes().contains_key(ATTR_FULL_CONTENT));
    }

    #[test]
    fn serde_goes_through_attribute_map() {
        let record: Record =
            serde_json::from_value(json!({ "id": "j", "title": "T", "n": 3 })).expect("decode");
        assert_eq!(record.title.as_deref(), Some("T"));
        let value = serde_json::to_value(&record).expect("encode");
        assert_eq!(value, json!({ "id": "j", "title": "T", "n": 3 }));
    }
}
