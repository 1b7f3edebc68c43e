use wasm_bindgen::prelude::*;

use crate::interfaces::converter;
use crate::models::{ConversionResult, OutputMode};

fn to_js(result: &ConversionResult) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(result)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize result: {}", e)))
}

/// `clashToLink(yaml) -> {success, data}`
#[wasm_bindgen(js_name = clashToLink)]
pub fn clash_to_link(content: &str) -> Result<JsValue, JsValue> {
    to_js(&converter::clash_to_link(content))
}

/// `linkToClash(links, mode?) -> {success, data}`; `mode` is `proxies`
/// (the default), `payload` or `none`.
#[wasm_bindgen(js_name = linkToClash)]
pub fn link_to_clash(links: Vec<String>, mode: Option<String>) -> Result<JsValue, JsValue> {
    let mode = match mode.as_deref().map(str::parse::<OutputMode>) {
        None => OutputMode::default(),
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            log::error!("linkToClash rejected: {}", e);
            return to_js(&ConversionResult::failure(e.to_string()));
        }
    };
    to_js(&converter::link_to_clash(&links, mode))
}
