//! Durable storage: data-dir paths and the atomic JSON primitive.

mod json;
mod paths;

pub use json::{read_json, write_json};
pub use paths::StorePaths;
