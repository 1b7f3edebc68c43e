//! Bidirectional conversion between Clash proxy lists and proxy share links
//! (`ss://`, `ssr://`, `vmess://`, `vless://`, `trojan://`, `hysteria://`,
//! `hysteria2://`, `tuic://`, `socks5://`, `http(s)://`).
//!
//! ```rust
//! use urlclash_converter::{clash_to_link, link_to_clash, OutputMode};
//!
//! let result = link_to_clash(&["trojan://secret@example.com:443#Node"], OutputMode::Proxies);
//! assert!(result.success);
//!
//! let back = clash_to_link(&result.data);
//! assert!(back.success);
//! assert!(back.data.starts_with("trojan://secret@example.com:443"));
//! ```

pub mod error;
pub mod generator;
pub mod interfaces;
pub mod models;
pub mod parser;
pub mod utils;

#[cfg(target_arch = "wasm32")]
pub mod api;

pub use error::{ConvertError, Result};
pub use interfaces::{clash_to_link, document_to_links, link_to_clash, links_to_document};
pub use models::{ConversionReport, ConversionResult, OutputMode, Proxy, ProxyType};
