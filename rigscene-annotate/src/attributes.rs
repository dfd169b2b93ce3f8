//! Attribute translation.
//!
//! Recordings name attributes by their human title; the target label schema
//! stores them under opaque keys. [`AttributeMap`] holds that title → key
//! dictionary (supplied from outside, read only here) and normalizes values.

use crate::error::AnnotateError;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Attributes always passed through as booleans.
pub const BOOLEAN_ATTRIBUTES: [&str; 1] = ["carrying"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    keys: HashMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(title.into(), key.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Accept either a flat `{title: key}` object or a label-schema recipe.
    pub fn from_document(document: &JsonValue) -> Result<Self, AnnotateError> {
        let object = document.as_object().ok_or_else(|| {
            AnnotateError::InvalidAttributeMap("expected a JSON object".to_string())
        })?;

        if object.contains_key("metadata") {
            return Ok(Self::from_recipe(document));
        }

        let mut map = Self::new();
        for (title, key) in object {
            let key = key.as_str().ok_or_else(|| {
                AnnotateError::InvalidAttributeMap(format!("key for '{title}' is not a string"))
            })?;
            map.insert(title.clone(), key);
        }
        Ok(map)
    }

    /// Collect `title → key` from the annotation-context instructions of a
    /// recipe document. Instructions without both fields are ignored.
    pub fn from_recipe(recipe: &JsonValue) -> Self {
        let mut map = Self::new();
        let instructions = recipe
            .pointer("/metadata/system/script/entryPoints")
            .and_then(|entry_points| entry_points.get("annotation:context:set"))
            .and_then(|context| context.get("_instructions"))
            .and_then(JsonValue::as_array);

        for block in instructions.into_iter().flatten() {
            let nested = block
                .pointer("/body/block/_instructions")
                .and_then(JsonValue::as_array);
            for instruction in nested.into_iter().flatten() {
                let title = instruction.get("title").and_then(JsonValue::as_str);
                let key = instruction.pointer("/body/key").and_then(JsonValue::as_str);
                if let (Some(title), Some(key)) = (title, key) {
                    map.insert(title, key);
                }
            }
        }
        debug!("Read {} attribute keys from recipe", map.len());
        map
    }

    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnnotateError> {
        let document: JsonValue = serde_json::from_slice(&std::fs::read(path.as_ref())?)?;
        let map = Self::from_document(&document)?;
        info!("Loaded {} attribute keys", map.len());
        Ok(map)
    }

    /// Schema key for `title`; unknown titles keep their title.
    pub fn key_for<'a>(&'a self, title: &'a str) -> &'a str {
        match self.keys.get(title) {
            Some(key) => key.as_str(),
            None => {
                debug!("No schema key for attribute '{}'", title);
                title
            }
        }
    }

    /// Translate a raw attribute set into schema keys and normalized values.
    pub fn translate(&self, attributes: &IndexMap<String, JsonValue>) -> IndexMap<String, JsonValue> {
        attributes
            .iter()
            .map(|(title, value)| {
                (
                    self.key_for(title).to_string(),
                    translate_value(title, value),
                )
            })
            .collect()
    }
}

/// Booleans (and the named boolean attributes) pass through; everything
/// else becomes a trimmed string with `" %"` folded to `"%"`.
pub fn translate_value(title: &str, value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Bool(_) | JsonValue::Null => value.clone(),
        _ if BOOLEAN_ATTRIBUTES.contains(&title) => match value {
            JsonValue::String(s) if s.trim().eq_ignore_ascii_case("true") => JsonValue::Bool(true),
            JsonValue::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                JsonValue::Bool(false)
            }
            other => other.clone(),
        },
        JsonValue::String(s) => JsonValue::String(normalize_text(s)),
        other => JsonValue::String(normalize_text(&other.to_string())),
    }
}

fn normalize_text(text: &str) -> String {
    text.replace(" %", "%").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, JsonValue)]) -> IndexMap<String, JsonValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_translate_values() {
        let mut map = AttributeMap::new();
        map.insert("occlusion", "a1");
        map.insert("carrying", "a2");
        map.insert("pedestrian", "a3");

        let translated = map.translate(&raw(&[
            ("occlusion", json!(" 25 % ")),
            ("carrying", json!("True")),
            ("pedestrian", json!(false)),
            ("lanes", json!(2)),
        ]));

        assert_eq!(translated["a1"], json!("25%"));
        assert_eq!(translated["a2"], json!(true));
        assert_eq!(translated["a3"], json!(false));
        // unknown title keeps its name, numbers become text
        assert_eq!(translated["lanes"], json!("2"));
    }

    #[test]
    fn test_translate_keeps_order() {
        let map = AttributeMap::new();
        let translated = map.translate(&raw(&[("z", json!("1")), ("a", json!("2"))]));
        let keys: Vec<&str> = translated.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn test_list_values_become_text() {
        assert_eq!(translate_value("tags", &json!(["a", "b"])), json!(r#"["a","b"]"#));
        assert_eq!(translate_value("carrying", &json!("bag")), json!("bag"));
    }

    #[test]
    fn test_from_flat_document() {
        let map = AttributeMap::from_document(&json!({"occlusion": "k1"})).unwrap();
        assert_eq!(map.key_for("occlusion"), "k1");
        assert!(AttributeMap::from_document(&json!({"occlusion": 3})).is_err());
        assert!(AttributeMap::from_document(&json!([1])).is_err());
    }

    #[test]
    fn test_from_recipe() {
        let recipe = json!({
            "metadata": {"system": {"script": {"entryPoints": {"annotation:context:set": {
                "_instructions": [
                    {"body": {"block": {"_instructions": [
                        {"title": "occlusion", "body": {"key": "k-occ"}},
                        {"title": "truncation", "body": {"key": "k-trunc"}},
                        {"body": {"key": "orphan"}}
                    ]}}},
                    {"body": {}}
                ]
            }}}}}
        });
        let map = AttributeMap::from_document(&recipe).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.key_for("truncation"), "k-trunc");
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attributes.json");
        std::fs::write(&path, br#"{"occlusion": "k1"}"#).unwrap();
        assert_eq!(AttributeMap::from_path(&path).unwrap().len(), 1);
    }
}
