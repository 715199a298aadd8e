//! Application layer: configuration sources and layering
//!
//! This layer turns files, inline documents and environment variables into
//! trees and folds them with the domain merge.

pub mod error;
pub mod error_ext;
pub mod layers;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use layers::{load_env, load_file, parse_json, parse_toml, ConfigLayers, Source};
