//! Lenient access to the loosely typed `fields` object of a fragment request.
//!
//! Every accessor is total: a missing key or a value of the wrong shape reads
//! as the empty default, so formatting never fails on bad input.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values attached to a fragment request, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful in tests and the CLI.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String value of `key`. Numbers and booleans are stringified.
    pub fn text(&self, key: &str) -> String {
        self.0.get(key).and_then(scalar_to_string).unwrap_or_default()
    }

    /// First non-empty string among `keys`, for fields with legacy aliases.
    pub fn first_text(&self, keys: &[&str]) -> String {
        keys.iter()
            .map(|key| self.text(key))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    /// Boolean value of `key`. Accepts JSON booleans and common truthy strings.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
            _ => false,
        }
    }

    /// List value of `key`.
    ///
    /// A JSON array yields its scalar items in order; a string is split into
    /// lines (the editor sends "one per line" textareas), dropping blank ones.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(Value::String(s)) => s
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Table value of `key`: an array of rows, each an array of cells.
    pub fn table(&self, key: &str) -> Vec<Vec<String>> {
        let Some(Value::Array(rows)) = self.0.get(key) else {
            return Vec::new();
        };
        rows.iter()
            .filter_map(|row| match row {
                Value::Array(cells) => Some(
                    cells
                        .iter()
                        .map(|cell| scalar_to_string(cell).unwrap_or_default())
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_defaults_to_empty() {
        let f = fields(json!({"a": null, "b": [1], "c": {"x": 1}}));
        assert_eq!(f.text("a"), "");
        assert_eq!(f.text("b"), "");
        assert_eq!(f.text("c"), "");
        assert_eq!(f.text("missing"), "");
    }

    #[test]
    fn test_text_stringifies_numbers() {
        let f = fields(json!({"maxdepth": 2, "scale": 50.5}));
        assert_eq!(f.text("maxdepth"), "2");
        assert_eq!(f.text("scale"), "50.5");
    }

    #[test]
    fn test_first_text_skips_empty_aliases() {
        let f = fields(json!({"path": "", "image_url": "img.png"}));
        assert_eq!(f.first_text(&["path", "image_url"]), "img.png");
    }

    #[test]
    fn test_flag_variants() {
        let f = fields(json!({"a": true, "b": "Yes", "c": "no", "d": 1}));
        assert!(f.flag("a"));
        assert!(f.flag("b"));
        assert!(!f.flag("c"));
        assert!(!f.flag("d"));
        assert!(!f.flag("missing"));
    }

    #[test]
    fn test_list_from_array_and_lines() {
        let f = fields(json!({
            "arr": ["intro", null, 3],
            "lines": "intro\n\n  usage  \n"
        }));
        assert_eq!(f.list("arr"), vec!["intro", "3"]);
        assert_eq!(f.list("lines"), vec!["intro", "usage"]);
        assert!(f.list("missing").is_empty());
    }

    #[test]
    fn test_table_ignores_non_rows() {
        let f = fields(json!({"rows": [["a", "b"], "junk", [1, null]]}));
        assert_eq!(
            f.table("rows"),
            vec![vec!["a".to_string(), "b".to_string()], vec!["1".to_string(), String::new()]]
        );
    }
}
