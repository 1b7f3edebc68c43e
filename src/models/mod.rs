//! Core data models for the converter
//!
//! This module contains the primary data structures used throughout the crate,
//! separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use urlclash_converter::models::{Credentials, Proxy, ProxyType};
//!
//! let proxy = Proxy::new(
//!     "",
//!     "example.com",
//!     8388,
//!     Credentials::Shadowsocks {
//!         cipher: "aes-256-gcm".to_string(),
//!         password: "secret".to_string(),
//!     },
//! );
//! assert_eq!(proxy.proxy_type(), ProxyType::Shadowsocks);
//! assert_eq!(proxy.name, "example.com:8388");
//! ```

mod proxy;
mod report;

pub use proxy::*;
pub use report::*;
