//! Attribute data types and value coercion.

use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};

/// Type of an attribute value, as declared by parameter tree metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Float,
    Int,
    Bool,
    String,
}

impl DataType {
    /// Parse a metadata type name (`float`, `int`, `bool`, `str`)
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            "bool" => Some(Self::Bool),
            "str" => Some(Self::String),
            _ => None,
        }
    }

    /// Metadata type name for this type
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::String => "str",
        }
    }

    /// Value used when nothing has been read yet
    pub fn default_value(&self) -> Value {
        match self {
            Self::Float => Value::from(0.0),
            Self::Int => Value::from(0),
            Self::Bool => Value::Bool(false),
            Self::String => Value::String(String::new()),
        }
    }

    /// Check a value against this type, converting numbers where lossless.
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        let coerced = match (self, value) {
            (Self::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
            (Self::Int, Value::Number(n)) => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| Value::from(f as i64)),
            (Self::Float, Value::Number(n)) => n.as_f64().map(Value::from),
            (Self::Bool, Value::Bool(_)) => Some(value.clone()),
            (Self::String, Value::String(_)) => Some(value.clone()),
            _ => None,
        };
        coerced.ok_or_else(|| Error::type_mismatch(self, value))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Runtime type name of a JSON value, in the vocabulary of metadata type names.
pub fn runtime_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "none",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
