//! odin-core - Control tree introspection for odin control servers
//!
//! This crate turns the parameter trees served by an odin control server into
//! a hierarchy of named, typed, pollable attributes:
//!
//! - **walker**: Flatten a metadata-annotated JSON tree into parameters
//! - **builder**: Partition parameters into adapter-specific sub-hierarchies
//! - **attribute**: Attributes bound to remote paths or to other attributes
//! - **aggregate**: Fan-in summaries and fan-out config writes across nodes
//! - **discovery**: Enumerate adapters and build the root of the tree
//! - **poller**: Keep attribute caches fresh
//! - **transport**: HTTP connection to the control server

pub mod aggregate;
pub mod attribute;
pub mod builder;
pub mod datatype;
pub mod discovery;
pub mod error;
pub mod node;
pub mod parameter;
pub mod poller;
pub mod settings;
pub mod transport;
pub mod walker;

// Re-export commonly used types
pub use attribute::{AccessMode, Attribute};
pub use datatype::DataType;
pub use discovery::{AdapterRegistry, Discovery};
pub use error::{Error, Result};
pub use node::ControlNode;
pub use poller::Poller;
pub use settings::BridgeSettings;
pub use transport::{Connection, HttpConnection};
