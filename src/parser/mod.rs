//! Readers for both input formats: share links and Clash YAML documents.

pub mod explodes;
pub mod yaml;

pub use explodes::{explode, implode, SchemeCodec};
pub use yaml::parse_clash_yaml;
