//! Session state over browser storage.
//!
//! The auth token and cached user profile live in `localStorage` so a login
//! survives the tab; the selected device and resolved brand live in
//! `sessionStorage` so they stay scoped to the current tab.  All operations
//! are synchronous; token expiry is discovered reactively through 401
//! responses, never checked here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::constants::{KEY_BRAND, KEY_SELECTED_DEVICE, KEY_TOKEN, KEY_USER};
use crate::models::{BrandProfile, Device, UserProfile};

#[derive(Clone)]
pub struct SessionStore {
    local: Storage,
    session: Storage,
}

impl SessionStore {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let local = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage is unavailable"))?;
        let session = window
            .session_storage()?
            .ok_or_else(|| JsValue::from_str("sessionStorage is unavailable"))?;
        Ok(Self { local, session })
    }

    // Auth token --------------------------------------------------------

    pub fn token(&self) -> Option<String> {
        self.local.get_item(KEY_TOKEN).ok().flatten()
    }

    pub fn set_token(&self, token: &str) -> Result<(), JsValue> {
        self.local.set_item(KEY_TOKEN, token)
    }

    /// Token presence only; expiry is the backend's call.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Drop the credentials.  The selected device deliberately survives: a
    /// re-login in the same tab lands back on the same detail page.
    pub fn clear(&self) {
        let _ = self.local.remove_item(KEY_TOKEN);
        let _ = self.local.remove_item(KEY_USER);
    }

    // User profile ------------------------------------------------------

    pub fn user(&self) -> Option<UserProfile> {
        read_json(&self.local, KEY_USER)
    }

    pub fn set_user(&self, user: &UserProfile) -> Result<(), JsValue> {
        write_json(&self.local, KEY_USER, user)
    }

    // Selected device (per-tab) -----------------------------------------

    pub fn selected_device(&self) -> Option<Device> {
        read_json(&self.session, KEY_SELECTED_DEVICE)
    }

    pub fn set_selected_device(&self, device: &Device) -> Result<(), JsValue> {
        write_json(&self.session, KEY_SELECTED_DEVICE, device)
    }

    // Brand (per-tab) ---------------------------------------------------

    pub fn brand(&self) -> Option<BrandProfile> {
        read_json(&self.session, KEY_BRAND)
    }

    pub fn set_brand(&self, brand: &BrandProfile) -> Result<(), JsValue> {
        write_json(&self.session, KEY_BRAND, brand)
    }
}

/// Read and decode a JSON blob.  A blob that no longer parses (e.g. written
/// by an older build) reads as absent after a console warning instead of
/// wedging the page.
fn read_json<T: DeserializeOwned>(storage: &Storage, key: &str) -> Option<T> {
    let raw = storage.get_item(key).ok().flatten()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            web_sys::console::warn_1(&format!("Discarding unreadable '{}' blob: {}", key, e).into());
            None
        }
    }
}

fn write_json<T: Serialize>(storage: &Storage, key: &str, value: &T) -> Result<(), JsValue> {
    let raw = serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
    storage.set_item(key, &raw)
}

// wasm-bindgen tests ----------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn store() -> SessionStore {
        let store = SessionStore::new().unwrap();
        store.clear();
        let _ = store.session.remove_item(KEY_SELECTED_DEVICE);
        let _ = store.session.remove_item(KEY_BRAND);
        store
    }

    #[wasm_bindgen_test]
    fn token_presence_drives_is_authenticated() {
        let store = store();
        assert!(!store.is_authenticated());
        store.set_token("tok-123").unwrap();
        assert!(store.is_authenticated());
        store.clear();
        assert!(!store.is_authenticated());
    }

    #[wasm_bindgen_test]
    fn clear_removes_user_but_keeps_selected_device() {
        let store = store();
        store.set_token("tok-123").unwrap();
        store
            .set_user(&serde_json::from_value(json!({ "userFirstName": "Dana" })).unwrap())
            .unwrap();
        let device: Device =
            serde_json::from_value(json!({ "ESN": "A100", "name": "Pump 7" })).unwrap();
        store.set_selected_device(&device).unwrap();

        store.clear();

        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert_eq!(store.selected_device(), Some(device));
    }

    #[wasm_bindgen_test]
    fn selected_device_round_trips_field_for_field() {
        let store = store();
        let device: Device = serde_json::from_value(json!({
            "ESN": "A100",
            "name": "Pump 7",
            "deviceClass": "standalone",
            "compositeState": {
                "ConnectionState": { "value": true, "time": "2024-05-02T10:15:00.000Z" },
                "Engine_Speed": { "value": 1500, "time": "2024-05-02T10:14:58.000Z" }
            }
        }))
        .unwrap();

        store.set_selected_device(&device).unwrap();
        assert_eq!(store.selected_device(), Some(device));
    }

    #[wasm_bindgen_test]
    fn unreadable_blob_reads_as_absent() {
        let store = store();
        store.local.set_item(KEY_USER, "{not json").unwrap();
        assert!(store.user().is_none());
    }
}
