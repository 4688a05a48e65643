//! Flatten a parameter tree response into addressable parameters.
//!
//! The tree is a mapping whose values are one of:
//!
//! - a nested mapping (branch)
//! - a non-empty list of mappings (one branch per index)
//! - a metadata object (leaf, regardless of depth)
//! - a bare scalar or list (leaf with inferred metadata)

use serde_json::{Map, Value};

use crate::parameter::{Parameter, ParameterMetadata, is_metadata_object};

/// Walk a parameter tree and create one [`Parameter`] per leaf.
///
/// Leaves are returned depth-first in the iteration order of the input.
/// Anything other than a mapping at the top level has no leaves.
pub fn walk(tree: &Value) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    if let Value::Object(map) = tree {
        walk_branch(map, &[], &mut parameters);
    }
    parameters
}

fn walk_branch(tree: &Map<String, Value>, path: &[String], out: &mut Vec<Parameter>) {
    for (node_name, node_value) in tree {
        let node_path = extend(path, node_name.clone());

        match node_value {
            Value::Object(map) if is_metadata_object(map) => {
                out.push(Parameter::new(node_path, ParameterMetadata::from_object(map)));
            }
            Value::Object(map) => walk_branch(map, &node_path, out),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
                for (idx, item) in items.iter().enumerate() {
                    if let Value::Object(map) = item {
                        walk_branch(map, &extend(&node_path, idx.to_string()), out);
                    }
                }
            }
            Value::Array(items) => walk_list_leaf(items, node_path, out),
            scalar => {
                let metadata = ParameterMetadata::infer(scalar.clone(), &node_path);
                out.push(Parameter::new(node_path, metadata));
            }
        }
    }
}

/// Lists under `config` are split so each element can be set on its own;
/// anything else is shown as one read-only string.
fn walk_list_leaf(items: &[Value], node_path: Vec<String>, out: &mut Vec<Parameter>) {
    let in_config = node_path.iter().any(|segment| segment == "config");

    if in_config && !items.is_empty() {
        for (idx, item) in items.iter().enumerate() {
            let item_path = extend(&node_path, idx.to_string());
            let metadata = ParameterMetadata::infer(item.clone(), &item_path);
            out.push(Parameter::new(item_path, metadata));
        }
    } else {
        let display = Value::String(Value::Array(items.to_vec()).to_string());
        let metadata = ParameterMetadata::new(display, "str", false);
        out.push(Parameter::new(node_path, metadata));
    }
}

fn extend(path: &[String], segment: String) -> Vec<String> {
    let mut extended = Vec::with_capacity(path.len() + 1);
    extended.extend_from_slice(path);
    extended.push(segment);
    extended
}
