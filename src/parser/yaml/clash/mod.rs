mod parsers;
mod proxy_types;

pub use parsers::parse_clash_yaml;
pub use proxy_types::proxy_from_mapping;
