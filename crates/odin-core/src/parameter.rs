//! Addressable parameters discovered in an adapter's parameter tree.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::datatype::{DataType, runtime_type_name};

/// Keys that mark a mapping as a metadata object rather than a branch
const METADATA_MARKER_KEYS: [&str; 2] = ["type", "writeable"];

/// Check whether a mapping is a parameter metadata object (always a leaf)
pub fn is_metadata_object(map: &Map<String, Value>) -> bool {
    METADATA_MARKER_KEYS.iter().all(|key| map.contains_key(*key))
}

/// Typed metadata of a parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    /// Value at discovery time
    pub value: Value,
    /// Declared type name (`float`, `int`, `bool`, `str`, or anything else)
    pub type_name: String,
    pub writeable: bool,
    /// Enumerated values the parameter may take, keyed by index
    pub allowed_values: Option<BTreeMap<i64, String>>,
}

impl ParameterMetadata {
    pub fn new(value: Value, type_name: impl Into<String>, writeable: bool) -> Self {
        Self {
            value,
            type_name: type_name.into(),
            writeable,
            allowed_values: None,
        }
    }

    /// Read metadata from a metadata object.
    ///
    /// Malformed fields degrade rather than fail: a non-string `type` becomes
    /// its JSON text (and is later rejected as unsupported), a non-boolean
    /// `writeable` is read as `false`.
    pub fn from_object(map: &Map<String, Value>) -> Self {
        let type_name = match map.get("type") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => String::from("none"),
        };

        Self {
            value: map.get("value").cloned().unwrap_or(Value::Null),
            type_name,
            writeable: map.get("writeable").and_then(Value::as_bool).unwrap_or(false),
            allowed_values: map.get("allowed_values").and_then(parse_allowed_values),
        }
    }

    /// Infer metadata for a bare value from its runtime type.
    ///
    /// Values anywhere under a `config` segment are writeable.
    pub fn infer(value: Value, uri: &[String]) -> Self {
        let type_name = runtime_type_name(&value);
        let writeable = uri.iter().any(|segment| segment == "config");
        Self::new(value, type_name, writeable)
    }

    /// Supported data type, if the declared type is one
    pub fn datatype(&self) -> Option<DataType> {
        DataType::from_type_name(&self.type_name)
    }
}

fn parse_allowed_values(value: &Value) -> Option<BTreeMap<i64, String>> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, label)| Some((key.parse().ok()?, display_value(label))))
            .collect(),
        Value::Array(values) => Some(
            values
                .iter()
                .enumerate()
                .map(|(idx, label)| (idx as i64, display_value(label)))
                .collect(),
        ),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A leaf of the parameter tree.
///
/// `uri` is the absolute location of the leaf below the owning node's API
/// prefix. `path` is the reduced path used for naming and grouping; when it
/// has not been set (or was reduced to nothing) it falls back to `uri`.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    uri: Vec<String>,
    path: Vec<String>,
    pub metadata: ParameterMetadata,
}

impl Parameter {
    pub fn new(uri: Vec<String>, metadata: ParameterMetadata) -> Self {
        Self {
            uri,
            path: Vec::new(),
            metadata,
        }
    }

    /// Builder-style variant of [`Parameter::set_path`]
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.set_path(path);
        self
    }

    pub fn uri(&self) -> &[String] {
        &self.uri
    }

    /// Reduced path of the parameter
    pub fn path(&self) -> &[String] {
        if self.path.is_empty() {
            &self.uri
        } else {
            &self.path
        }
    }

    /// Unique name of the parameter within its node
    pub fn name(&self) -> String {
        self.path().join("_")
    }

    /// Override the reduced path used for naming
    pub fn set_path(&mut self, path: Vec<String>) {
        self.path = path;
    }

    /// Re-home the parameter under a node whose API prefix already contains
    /// the first `n` segments of the uri. The reduced path is reset.
    pub fn rebase(self, n: usize) -> Self {
        let uri = self.uri.into_iter().skip(n).collect();
        Self {
            uri,
            path: Vec::new(),
            metadata: self.metadata,
        }
    }

    /// Segment of the uri at `idx`, if present
    pub fn uri_segment(&self, idx: usize) -> Option<&str> {
        self.uri.get(idx).map(String::as_str)
    }

    pub fn uri_tail(&self, from: usize) -> Vec<String> {
        self.uri.iter().skip(from).cloned().collect()
    }

    /// Whether the reduced path contains `segment`
    pub fn path_contains(&self, segment: &str) -> bool {
        self.path().iter().any(|s| s == segment)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.uri.join("/"), self.metadata.type_name)
    }
}

/// Split elements in two by predicate: `(matched, remainder)`.
///
/// Both lists keep the input order.
pub fn partition<T>(elements: Vec<T>, predicate: impl FnMut(&T) -> bool) -> (Vec<T>, Vec<T>) {
    elements.into_iter().partition(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_metadata_round_trip() {
        let object = json!({
            "value": 2,
            "type": "int",
            "writeable": true,
            "allowed_values": {"0": "off", "1": "on", "2": "auto"},
        });
        let metadata = ParameterMetadata::from_object(object.as_object().unwrap());

        assert_eq!(metadata.value, json!(2));
        assert_eq!(metadata.type_name, "int");
        assert!(metadata.writeable);
        let allowed = metadata.allowed_values.unwrap();
        assert_eq!(allowed.len(), 3);
        assert_eq!(allowed[&0], "off");
        assert_eq!(allowed[&2], "auto");
    }

    #[test]
    fn test_allowed_values_from_list() {
        let object = json!({
            "value": "b",
            "type": "str",
            "writeable": false,
            "allowed_values": ["a", "b"]
        });
        let metadata = ParameterMetadata::from_object(object.as_object().unwrap());
        assert_eq!(metadata.allowed_values.unwrap()[&1], "b");
    }

    #[test]
    fn test_infer_metadata() {
        let metadata = ParameterMetadata::infer(json!(1.5), &segments(&["config", "exposure"]));
        assert_eq!(metadata.type_name, "float");
        assert!(metadata.writeable);

        let metadata = ParameterMetadata::infer(json!("idle"), &segments(&["status", "state"]));
        assert_eq!(metadata.type_name, "str");
        assert!(!metadata.writeable);
    }

    #[test]
    fn test_path_falls_back_to_uri() {
        let mut parameter = Parameter::new(
            segments(&["status", "hdf", "frames_written"]),
            ParameterMetadata::new(json!(0), "int", false),
        );
        assert_eq!(parameter.name(), "status_hdf_frames_written");

        parameter.set_path(segments(&["hdf", "frames_written"]));
        assert_eq!(parameter.name(), "hdf_frames_written");

        parameter.set_path(Vec::new());
        assert_eq!(parameter.name(), "status_hdf_frames_written");
    }

    #[test]
    fn test_rebase() {
        let parameter = Parameter::new(
            segments(&["0", "config", "hdf", "frames"]),
            ParameterMetadata::new(json!(0), "int", true),
        )
        .with_path(segments(&["frames"]));

        let rebased = parameter.rebase(1);
        assert_eq!(rebased.uri(), segments(&["config", "hdf", "frames"]));
        assert_eq!(rebased.path(), rebased.uri());
    }

    #[test]
    fn test_partition() {
        let (even, odd) = partition(vec![1, 2, 3, 4, 5], |n| n % 2 == 0);
        assert_eq!(even, vec![2, 4]);
        assert_eq!(odd, vec![1, 3, 5]);
    }
}
