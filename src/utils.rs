//! Formatting helpers shared across the frontend.

use serde_json::Value;

use crate::models::Device;

/// Render a metric for display, or `None` when it is absent/null so the
/// caller can substitute a placeholder.
///
/// With `decimals` the value is coerced to a number and fixed-point
/// formatted; without it the raw value is shown as the backend sent it
/// (numbers verbatim, numeric strings trimmed).
pub fn metric_display(device: &Device, key: &str, decimals: Option<usize>) -> Option<String> {
    match decimals {
        Some(dp) => device.metric_f64(key).map(|v| format!("{:.*}", dp, v)),
        None => match device.metric_value(key)? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        },
    }
}

/// External map link for a coordinate pair.
pub fn maps_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps?q={},{}", lat, lng)
}

/// Short human-readable coordinate pair for the link text.
pub fn format_coordinates(lat: f64, lng: f64) -> String {
    format!("{:.4}, {:.4}", lat, lng)
}

/// Format a backend timestamp via the browser locale.  Falls back to the
/// raw string when the browser cannot parse it.
pub fn format_timestamp(raw: &Value) -> Option<String> {
    let text = raw.as_str()?;
    let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_str(text));
    if date.get_time().is_nan() {
        return Some(text.to_string());
    }
    Some(String::from(date.to_locale_string(
        "default",
        &wasm_bindgen::JsValue::UNDEFINED,
    )))
}
