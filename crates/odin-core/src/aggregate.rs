//! Derived attributes aggregating many sibling attributes.
//!
//! - [`StatusSummaryUpdater`] (fan-in) reduces the cached values of one
//!   attribute found on every node matched by a path filter.
//! - [`ConfigFanSender`] (fan-out) forwards one write to many attributes.

use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::attribute::{Attribute, DEFAULT_UPDATE_PERIOD, Sender, Updater};
use crate::error::{Error, Result};
use crate::node::ControlNode;

// ─────────────────────────────────────────────────────────────────────────────
// Path Filters
// ─────────────────────────────────────────────────────────────────────────────

/// One step down the node hierarchy
#[derive(Debug, Clone)]
pub enum PathStep {
    /// Exactly this child; missing is an error
    Exact(String),
    /// Each of these children that exists
    AnyOf(Vec<String>),
    /// Every child whose name matches
    Pattern(Regex),
}

impl PathStep {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf(names.into_iter().map(Into::into).collect())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }
}

/// Resolve a path filter against the current hierarchy below `node`.
///
/// Branches produced by `AnyOf` and `Pattern` steps continue independently;
/// their results are concatenated in child order.
pub fn resolve_nodes<'a>(
    node: &'a ControlNode,
    steps: &[PathStep],
) -> Result<Vec<&'a ControlNode>> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(vec![node]);
    };

    let matched: Vec<&ControlNode> = match step {
        PathStep::Exact(name) => vec![
            node.child(name)
                .ok_or_else(|| Error::node_not_found(node.api_prefix(), name.as_str()))?,
        ],
        PathStep::AnyOf(names) => names.iter().filter_map(|name| node.child(name)).collect(),
        PathStep::Pattern(pattern) => node
            .children()
            .filter(|(name, _)| pattern.is_match(name))
            .map(|(_, child)| child)
            .collect(),
    };

    let mut resolved = Vec::new();
    for child in matched {
        resolved.extend(resolve_nodes(child, rest)?);
    }
    Ok(resolved)
}

// ─────────────────────────────────────────────────────────────────────────────
// Fan-in
// ─────────────────────────────────────────────────────────────────────────────

/// Reduction applied to the collected values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Numeric sum; integer unless any value is a float
    Sum,
    /// True if any value is truthy
    Any,
    /// True if every value is truthy
    All,
}

impl Reducer {
    pub fn reduce(&self, values: &[Value]) -> Value {
        match self {
            Self::Sum => sum(values),
            Self::Any => Value::Bool(values.iter().any(truthy)),
            Self::All => Value::Bool(values.iter().all(truthy)),
        }
    }
}

fn sum(values: &[Value]) -> Value {
    let numbers: Vec<&Value> = values.iter().filter(|v| v.is_number() || v.is_boolean()).collect();

    if numbers.iter().all(|v| v.is_i64() || v.is_boolean()) {
        let total: i64 = numbers
            .iter()
            .map(|v| v.as_i64().unwrap_or_else(|| i64::from(v.as_bool() == Some(true))))
            .sum();
        Value::from(total)
    } else {
        let total: f64 = numbers
            .iter()
            .map(|v| v.as_f64().unwrap_or_else(|| f64::from(u8::from(v.as_bool() == Some(true)))))
            .sum();
        Value::from(total)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Accumulates an attribute across sub nodes into a high-level summary
#[derive(Debug, Clone)]
pub struct StatusSummaryUpdater {
    path_filter: Vec<PathStep>,
    attribute_name: String,
    reducer: Reducer,
    update_period: Duration,
}

impl StatusSummaryUpdater {
    pub fn new(
        path_filter: Vec<PathStep>,
        attribute_name: impl Into<String>,
        reducer: Reducer,
    ) -> Self {
        Self {
            path_filter,
            attribute_name: attribute_name.into(),
            reducer,
            update_period: DEFAULT_UPDATE_PERIOD,
        }
    }

    pub fn with_update_period(mut self, update_period: Duration) -> Self {
        self.update_period = update_period;
        self
    }

    /// Last cached values of the summarised attribute on every matched node
    pub async fn collect(&self, node: &ControlNode) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        for sub_node in resolve_nodes(node, &self.path_filter)? {
            let attribute = sub_node
                .attribute(&self.attribute_name)
                .ok_or_else(|| Error::AttributeNotFound {
                    node: sub_node.api_prefix().to_string(),
                    attribute: self.attribute_name.clone(),
                })?;
            values.push(attribute.get().await);
        }
        Ok(values)
    }
}

#[async_trait]
impl Updater for StatusSummaryUpdater {
    fn update_period(&self) -> Duration {
        self.update_period
    }

    async fn update(&self, node: &ControlNode, attr: &Attribute) -> Result<()> {
        let values = self.collect(node).await?;
        attr.set(&self.reducer.reduce(&values)).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fan-out
// ─────────────────────────────────────────────────────────────────────────────

/// Fans out puts to underlying attributes
pub struct ConfigFanSender {
    targets: Vec<Arc<Attribute>>,
}

impl ConfigFanSender {
    pub fn new(targets: Vec<Arc<Attribute>>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[Arc<Attribute>] {
        &self.targets
    }
}

#[async_trait]
impl Sender for ConfigFanSender {
    async fn put(&self, attr: &Attribute, value: &Value) -> Result<()> {
        let results = join_all(self.targets.iter().map(|target| target.put(value))).await;
        let failed = results.iter().filter(|result| result.is_err()).count();

        if attr.access().readable() {
            attr.set(value).await?;
        }

        if failed == 0 {
            Ok(())
        } else {
            Err(Error::FanOut {
                attribute: attr.name().to_string(),
                failed,
                total: self.targets.len(),
            })
        }
    }
}

/// Create fan-out attributes for the config parameters of every node below
/// `node`.
///
/// Parameters whose uri starts with `config` and whose last segment is not in
/// `unique_config` are grouped by name across all descendants; each group
/// becomes one attribute writing to every member.
pub fn fan_out_attributes(node: &ControlNode, unique_config: &[&str]) -> Result<Vec<Attribute>> {
    let mut groups: IndexMap<String, Vec<Arc<Attribute>>> = IndexMap::new();

    for sub_node in node.descendants() {
        for parameter in sub_node.parameters() {
            let (Some(mode), Some(key)) = (parameter.uri().first(), parameter.uri().last()) else {
                continue;
            };
            if mode != "config" || unique_config.contains(&key.as_str()) {
                continue;
            }

            let name = parameter.name().replace('.', "");
            match sub_node.attribute(&name) {
                Some(attribute) if attribute.access().writable() => {
                    groups.entry(name).or_default().push(attribute.clone());
                }
                Some(_) => debug!(attribute = %name, "Skipping read only config attribute"),
                None => warn!(
                    node = %sub_node.api_prefix(),
                    parameter = %parameter,
                    "Node has parameter but no corresponding attribute {}",
                    name
                ),
            }
        }
    }

    groups
        .into_iter()
        .map(|(name, targets)| fan_out_attribute(name, targets))
        .collect()
}

fn fan_out_attribute(name: String, targets: Vec<Arc<Attribute>>) -> Result<Attribute> {
    let first = targets[0].clone();
    if targets.iter().any(|target| target.datatype() != first.datatype()) {
        let types: Vec<String> = targets.iter().map(|t| t.datatype().to_string()).collect();
        return Err(Error::FanOutTypeMismatch {
            attribute: name,
            types: types.join(", "),
        });
    }

    Ok(Attribute::new(name, first.datatype(), first.access())
        .with_group(first.group().map(String::from))
        .with_allowed_values(first.allowed_values().cloned())
        .with_sender(Arc::new(ConfigFanSender::new(targets))))
}
