use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    geofile::feature::{PropertyMap, SourceId},
    graph::entity::Tags,
};

/// Mapping from source property keys to output tag keys, edited by the user.
///
/// An empty mapping passes every property through under its own name. As soon as one entry
/// exists, only mapped properties make it into the tags.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    entries: BTreeMap<String, String>,
}

/// One row of the field mapping table shown to the user.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRow {
    pub source_key: String,
    /// The current mapped tag key, else the sample feature's value for the key.
    pub placeholder: String,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `source_key` to `tag_key`. An empty tag key removes the entry.
    pub fn set(&mut self, source_key: &str, tag_key: &str) {
        if tag_key.is_empty() {
            self.entries.remove(source_key);
        } else {
            self.entries
                .insert(source_key.to_string(), tag_key.to_string());
        }
    }

    pub fn get(&self, source_key: &str) -> Option<&str> {
        self.entries.get(source_key).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rewrite a property bag into a tag set.
    ///
    /// The `source_id_key` property never becomes a tag; its value is returned next to the tags.
    pub fn apply(&self, properties: &PropertyMap, source_id_key: &str) -> (Tags, Option<SourceId>) {
        let source_id = properties.get(source_id_key).and_then(SourceId::from_json);

        let tags = if self.entries.is_empty() {
            properties
                .iter()
                .filter(|(key, _)| key.as_str() != source_id_key)
                .filter_map(|(key, value)| tag_value(value).map(|value| (key.clone(), value)))
                .collect()
        } else {
            self.entries
                .iter()
                .filter(|(source_key, _)| source_key.as_str() != source_id_key)
                .filter_map(|(source_key, tag_key)| {
                    properties
                        .get(source_key)
                        .filter(|value| is_truthy(value))
                        .and_then(tag_value)
                        .map(|value| (tag_key.clone(), value))
                })
                .collect()
        };
        (tags, source_id)
    }

    /// Rows for the mapping table, one per property key of the sample feature.
    pub fn field_table(&self, sample: &PropertyMap) -> Vec<FieldRow> {
        sample
            .iter()
            .map(|(key, value)| FieldRow {
                source_key: key.clone(),
                placeholder: match self.get(key) {
                    Some(tag_key) => tag_key.to_string(),
                    None => tag_value(value).unwrap_or_default(),
                },
            })
            .collect()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |x| x != 0.0 && !x.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a property value as a tag value. Null has no tag representation.
fn tag_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
