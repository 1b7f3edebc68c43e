pub mod clash;

pub use clash::parse_clash_yaml;
