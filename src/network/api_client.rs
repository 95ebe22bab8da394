//! HTTP client for the telemetry backend.
//!
//! Every network call in the app funnels through [`ApiClient::request`] so
//! auth headers and the session-expiry reaction live in exactly one place.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use super::config::ApiConfig;
use crate::constants::{FULL_FETCH_PAGE_LIMIT, LOGIN_PAGE, MAX_PAGE_SIZE};
use crate::dom_utils;
use crate::models::{Device, DevicePage, LoginResponse};
use crate::session::SessionStore;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend rejected a previously valid token.  The client has
    /// already been logged out and redirected; callers just abandon their
    /// work.
    #[error("Session expired")]
    SessionExpired,
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("{0}")]
    RequestFailed(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<ApiError> for JsValue {
    fn from(err: ApiError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

fn js_error(value: JsValue) -> ApiError {
    ApiError::Network(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

/// A 401 means "log out and start over" only when the call actually carried
/// a token.  A 401 on a bad login attempt is an ordinary failure the login
/// page renders inline; redirecting there would loop.
fn is_forced_logout(status: u16, request_had_token: bool) -> bool {
    status == 401 && request_had_token
}

/// `resultsPerPage` has a hard backend ceiling; asking for more gets the
/// request rejected rather than truncated.
fn clamp_page_size(page_size: u32) -> u32 {
    page_size.min(MAX_PAGE_SIZE)
}

/// Outcome of a sequential full-set fetch.
pub struct FullFetch {
    pub items: Vec<Device>,
    pub requests: u32,
    /// Set when the page bound was hit before the backend returned a short
    /// page; the result is a truncated prefix of the fleet.
    pub truncated: bool,
}

/// Drive `fetch_page` one page at a time, concatenating results until a page
/// comes back strictly shorter than `page_size`.  `page_limit` bounds the
/// loop against a backend that never signals end-of-pages.
pub async fn collect_all_pages<F, Fut>(
    mut fetch_page: F,
    page_size: u32,
    page_limit: u32,
) -> Result<FullFetch, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<DevicePage, ApiError>>,
{
    let mut items = Vec::new();
    let mut requests = 0;
    for page in 0..page_limit {
        let fetched = fetch_page(page).await?;
        requests += 1;
        let short = (fetched.items.len() as u32) < page_size;
        items.extend(fetched.items);
        if short {
            return Ok(FullFetch {
                items,
                requests,
                truncated: false,
            });
        }
    }
    Ok(FullFetch {
        items,
        requests,
        truncated: true,
    })
}

/// REST client for the telemetry backend.
pub struct ApiClient {
    config: ApiConfig,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: SessionStore) -> Self {
        Self { config, session }
    }

    /// Issue one request against the backend and parse the JSON body.
    ///
    /// Attaches `Authorization: Bearer <token>` when a token is stored.  On
    /// a 401 for an authenticated call the session is cleared and the
    /// browser is sent back to the login page; the returned
    /// `SessionExpired` only tells the caller to stop.  No retries.
    pub async fn request(
        &self,
        path: &str,
        method: &str,
        body: Option<String>,
    ) -> Result<Value, ApiError> {
        let url = self.config.url(path);

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);

        let headers = Headers::new().map_err(js_error)?;
        let token = self.session.token();
        let request_had_token = token.is_some();
        if let Some(token) = token {
            headers
                .append("Authorization", &format!("Bearer {}", token))
                .map_err(js_error)?;
        }
        if let Some(ref data) = body {
            opts.set_body(&JsValue::from_str(data));
            headers
                .append("Content-Type", "application/json")
                .map_err(js_error)?;
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;
        let window = web_sys::window().ok_or_else(|| ApiError::Network("no window".into()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let resp: Response = resp_value.dyn_into().map_err(js_error)?;

        if is_forced_logout(resp.status(), request_had_token) {
            self.session.clear();
            let _ = dom_utils::navigate_to(LOGIN_PAGE);
            return Err(ApiError::SessionExpired);
        }

        let text = JsFuture::from(resp.text().map_err(js_error)?)
            .await
            .map_err(js_error)?
            .as_string()
            .unwrap_or_default();

        if !resp.ok() {
            // Prefer the backend's own message field when the body carries one.
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| {
                    format!("Request failed ({} {})", resp.status(), resp.status_text())
                });
            return Err(ApiError::RequestFailed(message));
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// POST credentials; on success persist the token and user profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password }).to_string();
        let value = match self.request("/api/login", "POST", Some(body)).await {
            Ok(value) => value,
            // Bad credentials come back as a non-2xx with a message.
            Err(ApiError::RequestFailed(message)) => {
                return Err(ApiError::InvalidCredentials(message))
            }
            Err(other) => return Err(other),
        };

        let response: LoginResponse =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;

        match (&response.token, response.success) {
            (Some(token), true) => {
                self.session
                    .set_token(token)
                    .map_err(|_| ApiError::Network("failed to persist token".into()))?;
                if let Some(ref user) = response.user {
                    if self.session.set_user(user).is_err() {
                        web_sys::console::warn_1(&"Failed to cache user profile".into());
                    }
                }
                Ok(response)
            }
            _ => Err(ApiError::InvalidCredentials(
                response
                    .message
                    .unwrap_or_else(|| "Login failed".to_string()),
            )),
        }
    }

    /// Drop the session and return to the login page.  Pure side effect; the
    /// backend keeps no session state worth telling about.
    pub fn logout(&self) {
        self.session.clear();
        let _ = dom_utils::navigate_to(LOGIN_PAGE);
    }

    /// Fetch one page of the device listing, optionally search-filtered.
    /// `page` is zero-indexed; `attribute` defaults to `All`.
    pub async fn get_devices(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
        attribute: Option<&str>,
    ) -> Result<DevicePage, ApiError> {
        let mut path = format!(
            "/api/v2/last_value_query?page={}&resultsPerPage={}&attribute={}",
            page,
            clamp_page_size(page_size),
            attribute.unwrap_or("All"),
        );
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            path.push_str("&search=");
            path.push_str(&String::from(js_sys::encode_uri_component(term)));
        }

        let value = self.request(&path, "GET", None).await?;
        DevicePage::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetch the whole fleet, one maximum-size page at a time.  Only used
    /// where full-set semantics are required; the dashboard paginates.
    pub async fn get_all_devices(&self) -> Result<Vec<Device>, ApiError> {
        let fetched = collect_all_pages(
            |page| self.get_devices(page, MAX_PAGE_SIZE, None, None),
            MAX_PAGE_SIZE,
            FULL_FETCH_PAGE_LIMIT,
        )
        .await?;
        if fetched.truncated {
            web_sys::console::warn_1(
                &format!(
                    "Full device fetch stopped after {} pages without a short page; result truncated",
                    fetched.requests
                )
                .into(),
            );
        }
        Ok(fetched.items)
    }

    /// Dispatch a remote command.  Command names are not validated here;
    /// the backend decides what a given device accepts.
    pub async fn send_command(&self, device_id: &str, command: &str) -> Result<Value, ApiError> {
        let path = format!(
            "/api/command?command={}",
            String::from(js_sys::encode_uri_component(command))
        );
        let body = serde_json::json!({ "deviceId": device_id }).to_string();
        self.request(&path, "POST", Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    fn devices(n: usize, page: u32) -> Vec<Device> {
        (0..n)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "ESN": format!("E{}-{}", page, i)
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn collect_all_pages_concatenates_until_short_page() {
        let sizes = [200usize, 200, 150];
        let requested = RefCell::new(Vec::new());

        let fetched = block_on(collect_all_pages(
            |page| {
                requested.borrow_mut().push(page);
                let items = devices(sizes[page as usize], page);
                async move {
                    Ok(DevicePage {
                        items,
                        count: None,
                    })
                }
            },
            200,
            FULL_FETCH_PAGE_LIMIT,
        ))
        .unwrap();

        assert_eq!(fetched.items.len(), 550);
        assert_eq!(fetched.requests, 3);
        assert!(!fetched.truncated);
        assert_eq!(*requested.borrow(), vec![0, 1, 2]);
        // Pages stay in fetch order.
        assert_eq!(fetched.items[0].esn, "E0-0");
        assert_eq!(fetched.items[549].esn, "E2-149");
    }

    #[test]
    fn collect_all_pages_stops_at_the_page_bound() {
        // A backend that always returns full pages must not loop forever.
        let fetched = block_on(collect_all_pages(
            |page| {
                let items = devices(200, page);
                async move {
                    Ok(DevicePage {
                        items,
                        count: None,
                    })
                }
            },
            200,
            5,
        ))
        .unwrap();

        assert_eq!(fetched.requests, 5);
        assert_eq!(fetched.items.len(), 1000);
        assert!(fetched.truncated);
    }

    #[test]
    fn collect_all_pages_propagates_the_first_error() {
        let result = block_on(collect_all_pages(
            |page| async move {
                if page == 0 {
                    Ok(DevicePage {
                        items: devices(10, 0),
                        count: None,
                    })
                } else {
                    Err(ApiError::RequestFailed("boom".into()))
                }
            },
            10,
            5,
        ));
        assert!(matches!(result, Err(ApiError::RequestFailed(_))));
    }

    #[test]
    fn page_size_is_capped_at_the_backend_ceiling() {
        assert_eq!(clamp_page_size(20), 20);
        assert_eq!(clamp_page_size(MAX_PAGE_SIZE), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(10_000), MAX_PAGE_SIZE);
    }

    #[test]
    fn forced_logout_only_for_authenticated_401s() {
        assert!(is_forced_logout(401, true));
        assert!(!is_forced_logout(401, false));
        assert!(!is_forced_logout(403, true));
        assert!(!is_forced_logout(500, true));
    }
}
