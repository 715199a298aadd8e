//! Hierarchical configuration tree.
//!
//! A [`ConfigTree`] holds nested configuration as leaves (opaque values) and
//! branches (keyed children). It converts to and from a dynamic
//! [`serde_json::Value`], addresses nodes by dotted path, and layers sources
//! with a shallow merge where later sources override earlier ones.
//!
//! ```
//! use conftree::ConfigTree;
//! use serde_json::json;
//!
//! let mut config = ConfigTree::from_value(json!({"server": {"port": 80}}));
//! let _ = config.merge(&ConfigTree::from_value(json!({"server.port": 8080})));
//!
//! assert_eq!(config.get("server.port").and_then(|n| n.value()), Some(&json!(8080)));
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod tree_traits;
pub mod util;

pub use application::{ApplicationError, ApplicationResult, ConfigLayers, Source};
pub use domain::{ConfigTree, MergeReport, SharedNode, Value, SEPARATOR};
