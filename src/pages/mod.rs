// src/pages/mod.rs
//
// Per-page controllers.  Each page gets an explicit controller constructed
// with its dependencies injected; nothing reaches into ambient globals.

pub mod dashboard;
pub mod device;
pub mod login;

use crate::branding;
use crate::session::SessionStore;

/// Target URL that carries the resolved brand across navigation.
pub(crate) fn with_brand(page: &str, session: &SessionStore) -> String {
    match session.brand() {
        Some(brand) => format!("{}{}", page, branding::brand_query_param(&brand)),
        None => page.to_string(),
    }
}
