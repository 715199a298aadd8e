//! Domain layer: the configuration tree
//!
//! Pure data structure code: no I/O, no CLI, no config loading.

pub mod merge;
pub mod node;
pub mod path;
pub mod value;

pub use merge::MergeReport;
pub use node::{ConfigTree, SharedNode};
pub use path::{join, split_first, SEPARATOR};
pub use value::{from_toml, Value};
