pub mod clash;

pub use clash::{proxy_to_clash, render_proxies};
