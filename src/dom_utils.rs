//! dom_utils.rs – thin helper layer for repetitive DOM operations.
//!
//! The page controllers work against fixed HTML fragments; these wrappers
//! keep element lookup, show/hide and navigation from being re-spelled at
//! every call site.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document on window"))
}

/// Fetch a mandatory element by id.  Missing fixed markup is a deployment
/// bug, so this surfaces it as an error instead of silently skipping.
pub fn element(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{}", id)))
}

/// Fetch an optional element by id.
pub fn maybe_element(document: &Document, id: &str) -> Option<Element> {
    document.get_element_by_id(id)
}

/// Fetch an element by id and cast it to a concrete HTML type.
pub fn typed<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    element(document, id)?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{} has an unexpected type", id)))
}

pub fn input_value(document: &Document, id: &str) -> String {
    maybe_element(document, id)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn show(el: &Element) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().remove_property("display");
    }
}

pub fn hide(el: &Element) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property("display", "none");
    }
}

pub fn set_visible(el: &Element, visible: bool) {
    if visible {
        show(el);
    } else {
        hide(el);
    }
}

/// Point the browser at another page of the app.
pub fn navigate_to(target: &str) -> Result<(), JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no global window"))?
        .location()
        .set_href(target)
}
