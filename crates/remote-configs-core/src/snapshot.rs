//! The configuration document held in memory and on disk.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version reported when the document carries no usable version.
pub const VERSION_NONE: i64 = -1;

/// Default JSON key holding the document version.
pub const DEFAULT_VERSION_KEY: &str = "v";

/// An immutable JSON object fetched from the remote server.
///
/// Typed reads return `None` rather than failing when a key is missing or
/// its value has another shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigSnapshot {
    values: Map<String, Value>,
}

impl ConfigSnapshot {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Parse a JSON document. Anything but an object at the top level is rejected.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Integer stored under `version_key`, or `VERSION_NONE`.
    pub fn version(&self, version_key: &str) -> i64 {
        self.get_int(version_key).unwrap_or(VERSION_NONE)
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        self.values.get(key)?.as_bool()
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key)?.as_i64()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key)?.as_str().map(str::to_string)
    }

    pub fn get_boolean_array(&self, key: &str) -> Option<Vec<bool>> {
        self.array_of(key, Value::as_bool)
    }

    pub fn get_int_array(&self, key: &str) -> Option<Vec<i64>> {
        self.array_of(key, Value::as_i64)
    }

    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        self.array_of(key, |v| v.as_str().map(str::to_string))
    }

    /// Elements that don't convert are dropped, not treated as an error.
    fn array_of<T>(&self, key: &str, convert: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
        let items = self.values.get(key)?.as_array()?;
        Some(items.iter().filter_map(convert).collect())
    }
}

impl From<Map<String, Value>> for ConfigSnapshot {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigSnapshot {
        let value = json!({
            "v": 3,
            "myString": "Hello there",
            "myInt": 100,
            "myFloat": 1.5,
            "myBoolean": true,
            "myList": ["one", "two", 3, false],
            "flags": [true, "yes", false],
            "numbers": [1, "2", 3.5, 4],
            "nested": {"a": 1}
        });
        serde_json::from_value(value).expect("sample snapshot")
    }

    #[test]
    fn test_typed_reads() {
        let snapshot = sample();
        assert_eq!(snapshot.get_string("myString").as_deref(), Some("Hello there"));
        assert_eq!(snapshot.get_int("myInt"), Some(100));
        assert_eq!(snapshot.get_boolean("myBoolean"), Some(true));
        assert!(snapshot.get("nested").map(Value::is_object).unwrap_or(false));
    }

    #[test]
    fn test_wrong_shape_reads_as_none() {
        let snapshot = sample();
        assert_eq!(snapshot.get_string("myInt"), None);
        assert_eq!(snapshot.get_int("myString"), None);
        assert_eq!(snapshot.get_int("myFloat"), None);
        assert_eq!(snapshot.get_boolean("myString"), None);
        assert_eq!(snapshot.get_string_array("myString"), None);
        assert_eq!(snapshot.get_string("missing"), None);
    }

    #[test]
    fn test_arrays_drop_mismatched_elements() {
        let snapshot = sample();
        assert_eq!(
            snapshot.get_string_array("myList"),
            Some(vec!["one".to_string(), "two".to_string()])
        );
        assert_eq!(snapshot.get_boolean_array("flags"), Some(vec![true, false]));
        assert_eq!(snapshot.get_int_array("numbers"), Some(vec![1, 4]));
        assert_eq!(snapshot.get_int_array("myList"), Some(vec![3]));
    }

    #[test]
    fn test_version_extraction() {
        assert_eq!(sample().version(DEFAULT_VERSION_KEY), 3);
        assert_eq!(ConfigSnapshot::default().version(DEFAULT_VERSION_KEY), VERSION_NONE);

        let string_version: ConfigSnapshot =
            serde_json::from_value(json!({"v": "1"})).expect("snapshot");
        assert_eq!(string_version.version("v"), VERSION_NONE);

        let custom: ConfigSnapshot =
            serde_json::from_value(json!({"configVersion": 7})).expect("snapshot");
        assert_eq!(custom.version("configVersion"), 7);
        assert_eq!(custom.version("v"), VERSION_NONE);
    }

    #[test]
    fn test_from_json_str_requires_object() {
        assert!(ConfigSnapshot::from_json_str(r#"{"test":"cache"}"#).is_ok());
        assert!(ConfigSnapshot::from_json_str(r#"["test"]"#).is_err());
        assert!(ConfigSnapshot::from_json_str("42").is_err());
        assert!(ConfigSnapshot::from_json_str("{not json").is_err());
    }

    #[test]
    fn test_keys() {
        let keys = sample().keys();
        assert!(keys.contains("v"));
        assert!(keys.contains("nested"));
        assert_eq!(keys.len(), 9);
    }
}
