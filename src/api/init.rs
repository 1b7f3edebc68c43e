use log::Level;
use wasm_bindgen::prelude::*;

/// Route `log` output to the browser console and install the panic hook.
/// Safe to call more than once; later calls leave the first logger in place.
#[wasm_bindgen(js_name = initWasmLogging)]
pub fn init_wasm_logging(level: Option<String>) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let log_level = match level.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("error") => Level::Error,
        Some("warn") => Level::Warn,
        Some("info") => Level::Info,
        Some("debug") => Level::Debug,
        Some("trace") => Level::Trace,
        _ => Level::Info, // Default to Info level
    };

    match console_log::init_with_level(log_level) {
        Ok(()) => log::info!("WASM logging initialized at level: {}", log_level),
        Err(e) => log::debug!("WASM logging already initialized: {}", e),
    }
    Ok(())
}
