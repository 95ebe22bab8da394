//! FleetLink telemetry console.
//!
//! One WASM bundle serves three pages (login, dashboard, device detail)
//! plus the service-worker entry points in [`worker`].  Startup resolves
//! the brand, registers the worker and routes to the controller for the
//! current page.

use std::rc::Rc;

use wasm_bindgen::prelude::*;

pub mod branding;
pub mod constants;
pub mod dom_utils;
pub mod models;
pub mod network;
pub mod pages;
pub mod session;
pub mod utils;
pub mod worker;

use network::{ApiClient, ApiConfig};
use session::SessionStore;

// Main entry point for the WASM application
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Initialize better panic messages
    console_error_panic_hook::set_once();

    // The service-worker shim loads this same bundle without a window and
    // drives the exported worker_* functions itself.
    let window = match web_sys::window() {
        Some(window) => window,
        None => return Ok(()),
    };
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document on window"))?;

    let session = SessionStore::new()?;
    branding::apply_branding(&document, &session)?;
    worker::register(&window);

    let api = Rc::new(ApiClient::new(ApiConfig::new(), session.clone()));

    let path = window.location().pathname()?;
    if path.contains("dashboard") {
        pages::dashboard::init(&document, api, session)
    } else if path.contains("device") {
        pages::device::init(&document, api, session)
    } else {
        pages::login::init(&document, api, session)
    }
}
