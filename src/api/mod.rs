//! JavaScript bindings, compiled for `wasm32` only.

mod convert;
mod init;

pub use convert::{clash_to_link, link_to_clash};
pub use init::init_wasm_logging;
