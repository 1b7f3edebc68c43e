//! Writers for both output formats: Clash YAML documents and share links.

pub mod yaml;

// Re-export format converters
pub use crate::parser::explodes::implode as proxy_to_link;
pub use yaml::{proxy_to_clash, render_proxies};
