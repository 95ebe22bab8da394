//! Offline cache for the static app shell.
//!
//! The service-worker shim (`sw.js`) loads this bundle and forwards its
//! `install` / `activate` / `fetch` events to the exported entry points
//! below.  Only static GETs are handled; backend traffic always goes to the
//! network so the API never serves stale data.

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::{Cache, CacheStorage, FetchEvent, Request, Response, ServiceWorkerGlobalScope, Window};

use crate::constants::{API_PATH_MARKER, STATIC_ASSETS, STATIC_CACHE_NAME};

/// Whether a request may be served from the static cache: GETs only, and
/// never anything addressed at the backend.
pub fn is_cacheable(method: &str, url: &str) -> bool {
    method.eq_ignore_ascii_case("GET") && !url.contains(API_PATH_MARKER)
}

fn worker_scope() -> Result<ServiceWorkerGlobalScope, JsValue> {
    js_sys::global()
        .dyn_into::<ServiceWorkerGlobalScope>()
        .map_err(|_| JsValue::from_str("not running in a service worker scope"))
}

async fn open_cache(caches: &CacheStorage) -> Result<Cache, JsValue> {
    JsFuture::from(caches.open(STATIC_CACHE_NAME))
        .await?
        .dyn_into::<Cache>()
        .map_err(|_| JsValue::from_str("cache open returned a non-cache"))
}

/// Install: pre-populate the app-shell manifest, then activate immediately.
#[wasm_bindgen]
pub async fn worker_install() -> Result<(), JsValue> {
    let scope = worker_scope()?;
    let cache = open_cache(&scope.caches()?).await?;

    let manifest = Array::new();
    for asset in STATIC_ASSETS {
        manifest.push(&JsValue::from_str(asset));
    }
    JsFuture::from(cache.add_all_with_str_sequence(&manifest)).await?;

    JsFuture::from(scope.skip_waiting()?).await?;
    Ok(())
}

/// Activate: drop caches from previous versions and take over open pages.
#[wasm_bindgen]
pub async fn worker_activate() -> Result<(), JsValue> {
    let scope = worker_scope()?;
    let caches = scope.caches()?;

    let keys: Array = JsFuture::from(caches.keys()).await?.dyn_into()?;
    for key in keys.iter() {
        if key.as_string().as_deref() != Some(STATIC_CACHE_NAME) {
            if let Some(name) = key.as_string() {
                JsFuture::from(caches.delete(&name)).await?;
            }
        }
    }

    JsFuture::from(scope.clients().claim()).await?;
    Ok(())
}

/// Fetch: respond from the cache when possible.  A cached entry answers
/// immediately while the cache refreshes from the network in the
/// background; a miss waits on the network and caches a 2xx response.
#[wasm_bindgen]
pub fn worker_fetch(event: &FetchEvent) -> Result<(), JsValue> {
    let request = event.request();
    if !is_cacheable(&request.method(), &request.url()) {
        // Untouched; the browser performs the request normally.
        return Ok(());
    }
    event.respond_with(&future_to_promise(respond(request)))?;
    Ok(())
}

async fn respond(request: Request) -> Result<JsValue, JsValue> {
    let scope = worker_scope()?;
    let caches = scope.caches()?;
    let url = request.url();

    let cached = JsFuture::from(caches.match_with_str(&url)).await?;
    if cached.is_instance_of::<Response>() {
        // Serve the cached copy now, refresh it behind the response.
        let refresh_url = url.clone();
        spawn_local(async move {
            if let Err(err) = refresh_cache(&refresh_url).await {
                web_sys::console::warn_1(
                    &format!("Background cache refresh failed for {}: {:?}", refresh_url, err)
                        .into(),
                );
            }
        });
        return Ok(cached);
    }

    // Cache miss: the network is the only source.
    let response: Response = JsFuture::from(scope.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    if response.ok() {
        let cache = open_cache(&caches).await?;
        let copy = response.clone()?;
        JsFuture::from(cache.put_with_str(&url, &copy)).await?;
    }
    Ok(response.into())
}

/// Fetch a fresh copy and overwrite the cached entry on success; a network
/// failure keeps the existing entry.
async fn refresh_cache(url: &str) -> Result<(), JsValue> {
    let scope = worker_scope()?;
    let response: Response = JsFuture::from(scope.fetch_with_str(url)).await?.dyn_into()?;
    if response.ok() {
        let cache = open_cache(&scope.caches()?).await?;
        JsFuture::from(cache.put_with_str(url, &response)).await?;
    }
    Ok(())
}

/// Page side: register the service worker at startup.  Registration failure
/// only costs offline support, so it is logged and otherwise ignored.
pub fn register(window: &Window) {
    let container = window.navigator().service_worker();
    spawn_local(async move {
        if let Err(err) = JsFuture::from(container.register("sw.js")).await {
            web_sys::console::warn_1(
                &format!("Service worker registration failed: {:?}", err).into(),
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_assets_are_cacheable() {
        for asset in STATIC_ASSETS {
            assert!(is_cacheable("GET", asset), "{} should be cacheable", asset);
        }
    }

    #[test]
    fn api_traffic_is_never_cacheable() {
        assert!(!is_cacheable("GET", "https://backend.example/api/login"));
        assert!(!is_cacheable(
            "GET",
            "https://backend.example/api/v2/last_value_query?page=0"
        ));
        assert!(!is_cacheable("POST", "https://backend.example/api/command"));
    }

    #[test]
    fn only_gets_are_cacheable() {
        assert!(is_cacheable("get", "/dashboard.html"));
        assert!(!is_cacheable("POST", "/dashboard.html"));
        assert!(!is_cacheable("HEAD", "/dashboard.html"));
    }

    #[test]
    fn non_manifest_static_gets_are_still_cacheable() {
        assert!(is_cacheable("GET", "/img/fleetlink-logo.svg"));
    }
}
