//! Control nodes: the tree handed to the host runtime.
//!
//! Each node owns the parameters no child has claimed, its children keyed by
//! name, and its attributes keyed by name. Nodes are built once during
//! discovery and never rebuilt; only attribute values change afterwards.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::attribute::{Attribute, synthesize};
use crate::builder::BuildContext;
use crate::error::{Error, Result};
use crate::parameter::{Parameter, partition};

#[derive(Debug, Default)]
pub struct ControlNode {
    /// API path the node's parameter uris are relative to
    api_prefix: String,
    /// Parameters not handed to a child
    parameters: Vec<Parameter>,
    children: IndexMap<String, ControlNode>,
    attributes: IndexMap<String, Arc<Attribute>>,
}

impl ControlNode {
    pub fn new(api_prefix: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            parameters,
            children: IndexMap::new(),
            attributes: IndexMap::new(),
        }
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Parameters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Move out the parameters matching `predicate`, keeping the rest.
    pub fn take_parameters(&mut self, predicate: impl FnMut(&Parameter) -> bool) -> Vec<Parameter> {
        let (matched, remainder) = partition(std::mem::take(&mut self.parameters), predicate);
        self.parameters = remainder;
        matched
    }

    /// Transform every residual parameter in place
    pub fn map_parameters(&mut self, f: impl FnMut(Parameter) -> Parameter) {
        self.parameters = std::mem::take(&mut self.parameters).into_iter().map(f).collect();
    }

    /// Parameters of this node and every descendant
    pub fn subtree_parameters(&self) -> Vec<&Parameter> {
        let mut parameters: Vec<&Parameter> = self.parameters.iter().collect();
        for child in self.children.values() {
            parameters.extend(child.subtree_parameters());
        }
        parameters
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Children
    // ─────────────────────────────────────────────────────────────────────────

    pub fn add_child(&mut self, name: impl Into<String>, child: ControlNode) -> Result<()> {
        let name = name.into();
        if self.children.contains_key(&name) {
            return Err(Error::Other(format!(
                "Node {} already defined in {}",
                name, self.api_prefix
            )));
        }
        self.children.insert(name, child);
        Ok(())
    }

    pub fn child(&self, name: &str) -> Option<&ControlNode> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ControlNode)> {
        self.children.iter().map(|(name, child)| (name.as_str(), child))
    }

    /// Every descendant node, depth first, parents before their children
    pub fn descendants(&self) -> Vec<&ControlNode> {
        let mut nodes = Vec::new();
        for child in self.children.values() {
            nodes.push(child);
            nodes.extend(child.descendants());
        }
        nodes
    }

    /// Follow a path of child names
    pub fn descend<S: AsRef<str>>(&self, path: &[S]) -> Option<&ControlNode> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an attribute; names must be unique on a node.
    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<Arc<Attribute>> {
        let name = attribute.name().to_string();
        if self.attributes.contains_key(&name) {
            return Err(Error::DuplicateAttribute {
                node: self.api_prefix.clone(),
                attribute: name,
            });
        }
        let attribute = Arc::new(attribute);
        self.attributes.insert(name, attribute.clone());
        Ok(attribute)
    }

    /// Create attributes for the parameters left on this node
    pub fn synthesize_attributes(&mut self, ctx: &BuildContext) -> Result<()> {
        for attribute in synthesize(&self.parameters, &self.api_prefix, ctx) {
            self.add_attribute(attribute)?;
        }
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<Attribute>> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Arc<Attribute>)> {
        self.attributes.iter().map(|(name, attr)| (name.as_str(), attr))
    }

    /// Look up an attribute by dot-separated path, e.g. `FP.FP0.HDF.frames`
    pub fn find_attribute(&self, dotted: &str) -> Result<&Arc<Attribute>> {
        let segments: Vec<&str> = dotted.split('.').collect();
        let (name, path) = segments
            .split_last()
            .ok_or_else(|| Error::Other(format!("Invalid attribute path: {}", dotted)))?;

        let mut node = self;
        for segment in path {
            node = node
                .child(segment)
                .ok_or_else(|| Error::node_not_found(node.api_prefix.clone(), *segment))?;
        }
        node.attribute(name).ok_or_else(|| Error::AttributeNotFound {
            node: node.api_prefix.clone(),
            attribute: name.to_string(),
        })
    }

    /// Every attribute in the subtree with the child-name path of its node
    pub fn subtree_attributes(&self) -> Vec<(Vec<String>, Arc<Attribute>)> {
        let mut found = Vec::new();
        self.collect_attributes(&mut Vec::new(), &mut found);
        found
    }

    fn collect_attributes(
        &self,
        path: &mut Vec<String>,
        found: &mut Vec<(Vec<String>, Arc<Attribute>)>,
    ) {
        for attribute in self.attributes.values() {
            found.push((path.clone(), attribute.clone()));
        }
        for (name, child) in &self.children {
            path.push(name.clone());
            child.collect_attributes(path, found);
            path.pop();
        }
    }
}
