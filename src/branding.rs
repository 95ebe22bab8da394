//! Brand resolution and application.
//!
//! The same bundle serves more than one storefront; which visual identity a
//! page wears is a pure function of its URL.  Detection runs once per page
//! load, mutates the fixed branding elements and caches the profile in
//! session storage for sibling pages.

use lazy_static::lazy_static;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, HtmlImageElement};

use crate::models::BrandProfile;
use crate::session::SessionStore;

lazy_static! {
    /// Baseline identity used when no brand signal matches.
    pub static ref BASELINE_BRAND: BrandProfile = BrandProfile {
        key: "fleetlink".to_string(),
        name: "FleetLink".to_string(),
        logo: "img/fleetlink-logo.svg".to_string(),
        sub_branding: None,
        theme_color: "#0891b2".to_string(),
    };
    /// White-label identity for the Northstar Rentals storefront.
    pub static ref NORTHSTAR_BRAND: BrandProfile = BrandProfile {
        key: "northstar".to_string(),
        name: "Northstar Rentals".to_string(),
        logo: "img/northstar-logo.png".to_string(),
        sub_branding: Some("powered by FleetLink".to_string()),
        theme_color: "#b45309".to_string(),
    };
}

/// Pick a brand from the page URL.  Case-insensitive, idempotent, defaults
/// to the baseline profile.
pub fn detect_brand(hostname: &str, pathname: &str, query: &str) -> BrandProfile {
    let hostname = hostname.to_ascii_lowercase();
    let pathname = pathname.to_ascii_lowercase();
    let query = query.to_ascii_lowercase();

    if hostname.contains("northstar")
        || pathname.contains("northstar")
        || query.contains("brand=northstar")
    {
        return NORTHSTAR_BRAND.clone();
    }
    BASELINE_BRAND.clone()
}

/// Query string that carries the brand across page navigation.  Empty for
/// the baseline so default URLs stay clean.
pub fn brand_query_param(brand: &BrandProfile) -> String {
    if brand.key == BASELINE_BRAND.key {
        String::new()
    } else {
        format!("?brand={}", brand.key)
    }
}

/// Resolve the brand from the current URL, restyle the page and persist the
/// profile for the rest of the tab.
pub fn apply_branding(document: &Document, session: &SessionStore) -> Result<BrandProfile, JsValue> {
    let location = web_sys::window()
        .ok_or_else(|| JsValue::from_str("no global window"))?
        .location();
    let brand = detect_brand(
        &location.hostname()?,
        &location.pathname()?,
        &location.search()?,
    );

    // Logo images on both the login and header layouts.
    let logos = document.query_selector_all(".header-logo, .login-logo")?;
    for i in 0..logos.length() {
        if let Some(node) = logos.item(i) {
            if let Ok(img) = node.dyn_into::<HtmlImageElement>() {
                img.set_src(&brand.logo);
                img.set_alt(&brand.name);
            }
        }
    }

    document.set_title(&document.title().replace(&BASELINE_BRAND.name, &brand.name));

    apply_sub_branding(document, &brand)?;

    if let Some(root) = document.document_element() {
        if let Some(html) = root.dyn_ref::<HtmlElement>() {
            html.style().set_property("--accent", &brand.theme_color)?;
        }
    }

    if session.set_brand(&brand).is_err() {
        web_sys::console::warn_1(&"Failed to persist brand profile".into());
    }
    Ok(brand)
}

/// Fill, create or remove the `.sub-branding` label depending on whether
/// the brand carries one.
fn apply_sub_branding(document: &Document, brand: &BrandProfile) -> Result<(), JsValue> {
    let existing = document.query_selector(".sub-branding")?;
    match (&brand.sub_branding, existing) {
        (Some(text), Some(label)) => label.set_text_content(Some(text.as_str())),
        (Some(text), None) => {
            if let Some(header) = document.query_selector(".header h1")? {
                let label = document.create_element("span")?;
                label.set_class_name("sub-branding");
                label.set_text_content(Some(text.as_str()));
                header.append_child(&label)?;
            }
        }
        (None, Some(label)) => label.remove(),
        (None, None) => {}
    }
    Ok(())
}
