//! Typed, pollable and writable endpoints exposed to the host runtime.
//!
//! An [`Attribute`] is either *direct*, bound to one remote address through a
//! [`ParamTreeHandler`], or *derived*, bound to other attributes through a
//! fan-in [`Updater`] or fan-out [`Sender`] (see [`crate::aggregate`]).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::error;

use crate::datatype::DataType;
use crate::error::{Error, Result};
use crate::node::ControlNode;

mod handler;
mod synthesis;

pub use handler::ParamTreeHandler;
pub use synthesis::{group_name, synthesize};

/// Default poll period of an attribute
pub const DEFAULT_UPDATE_PERIOD: Duration = Duration::from_millis(200);

/// How the host runtime may access an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    pub fn readable(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn writable(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Read => "R",
            Self::Write => "W",
            Self::ReadWrite => "RW",
        };
        f.write_str(label)
    }
}

/// Refreshes an attribute's cached value
#[async_trait]
pub trait Updater: Send + Sync {
    /// Period between refreshes
    fn update_period(&self) -> Duration {
        DEFAULT_UPDATE_PERIOD
    }

    /// Refresh `attr`, which is owned by `node`.
    async fn update(&self, node: &ControlNode, attr: &Attribute) -> Result<()>;
}

/// Forwards writes of an attribute
#[async_trait]
pub trait Sender: Send + Sync {
    async fn put(&self, attr: &Attribute, value: &Value) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Cached {
    value: Value,
    updated_at: Option<DateTime<Utc>>,
}

/// A named, typed endpoint on a [`ControlNode`]
pub struct Attribute {
    name: String,
    datatype: DataType,
    access: AccessMode,
    group: Option<String>,
    allowed_values: Option<BTreeMap<i64, String>>,
    /// Remote address of a direct attribute
    address: Option<String>,
    updater: Option<Arc<dyn Updater>>,
    sender: Option<Arc<dyn Sender>>,
    cache: RwLock<Cached>,
}

impl Attribute {
    /// Create an attribute with no handlers, seeded with the type default
    pub fn new(name: impl Into<String>, datatype: DataType, access: AccessMode) -> Self {
        Self {
            name: name.into(),
            datatype,
            access,
            group: None,
            allowed_values: None,
            address: None,
            updater: None,
            sender: None,
            cache: RwLock::new(Cached {
                value: datatype.default_value(),
                updated_at: None,
            }),
        }
    }

    /// Create a direct attribute bound to a remote path.
    ///
    /// Readable attributes poll the path, writable ones put to it.
    pub fn remote(
        name: impl Into<String>,
        datatype: DataType,
        access: AccessMode,
        handler: ParamTreeHandler,
    ) -> Self {
        let address = handler.path().to_string();
        let handler = Arc::new(handler);
        let mut attribute = Self::new(name, datatype, access);
        attribute.address = Some(address);
        if access.readable() {
            attribute.updater = Some(handler.clone());
        }
        if access.writable() {
            attribute.sender = Some(handler);
        }
        attribute
    }

    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    pub fn with_allowed_values(mut self, allowed_values: Option<BTreeMap<i64, String>>) -> Self {
        self.allowed_values = allowed_values;
        self
    }

    pub fn with_updater(mut self, updater: Arc<dyn Updater>) -> Self {
        self.updater = Some(updater);
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn Sender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Seed the cache with a discovered value, if it fits the type
    pub fn with_initial_value(mut self, value: &Value) -> Self {
        if let Ok(value) = self.datatype.coerce(value) {
            self.cache.get_mut().value = value;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> DataType {
        self.datatype
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn allowed_values(&self) -> Option<&BTreeMap<i64, String>> {
        self.allowed_values.as_ref()
    }

    /// Remote address, `None` for derived attributes
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_derived(&self) -> bool {
        self.address.is_none()
    }

    /// Poll period, if the attribute is refreshed at all
    pub fn update_period(&self) -> Option<Duration> {
        self.updater.as_ref().map(|updater| updater.update_period())
    }

    /// Last cached value
    pub async fn get(&self) -> Value {
        self.cache.read().await.value.clone()
    }

    /// When the cache was last written, `None` if only seeded
    pub async fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.cache.read().await.updated_at
    }

    /// Store a new value in the cache after checking its type
    pub async fn set(&self, value: &Value) -> Result<()> {
        let value = self.datatype.coerce(value)?;
        let mut cached = self.cache.write().await;
        cached.value = value;
        cached.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Refresh the cached value through the updater.
    ///
    /// Failures are logged and leave the cached value unchanged.
    pub async fn update(&self, node: &ControlNode) -> Result<()> {
        let Some(updater) = &self.updater else {
            return Ok(());
        };

        updater.update(node, self).await.inspect_err(|e| {
            error!(
                attribute = %self.name,
                path = self.address.as_deref().unwrap_or("<derived>"),
                error = %e,
                "Update failed"
            );
        })
    }

    /// Write a value through the sender.
    ///
    /// Failures are logged and returned; nothing is retried.
    pub async fn put(&self, value: &Value) -> Result<()> {
        let result = self.try_put(value).await;
        if let Err(e) = &result {
            error!(
                attribute = %self.name,
                path = self.address.as_deref().unwrap_or("<derived>"),
                value = %value,
                error = %e,
                "Put failed"
            );
        }
        result
    }

    async fn try_put(&self, value: &Value) -> Result<()> {
        if !self.access.writable() {
            return Err(Error::ReadOnly(self.name.clone()));
        }
        let value = self.datatype.coerce(value)?;
        self.check_allowed(&value)?;

        match &self.sender {
            Some(sender) => sender.put(self, &value).await,
            None => Err(Error::Other(format!("Attribute {} has no sender", self.name))),
        }
    }

    fn check_allowed(&self, value: &Value) -> Result<()> {
        let Some(allowed) = &self.allowed_values else {
            return Ok(());
        };

        let is_key = value.as_i64().is_some_and(|key| allowed.contains_key(&key));
        let is_label = value
            .as_str()
            .is_some_and(|label| allowed.values().any(|allowed| allowed == label));
        if is_key || is_label {
            Ok(())
        } else {
            Err(Error::NotAllowed {
                attribute: self.name.clone(),
                value: value.to_string(),
            })
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("datatype", &self.datatype)
            .field("access", &self.access)
            .field("group", &self.group)
            .field("address", &self.address)
            .finish()
    }
}
