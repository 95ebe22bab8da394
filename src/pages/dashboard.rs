//! Dashboard page controller: paginated, searchable device listing.
//!
//! The list state ([`DeviceList`]) is deliberately DOM-free so pagination
//! accumulation, the stale-fetch guard and the retry semantics of a failed
//! "load more" can be unit-tested without a browser.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlSelectElement};

use crate::constants::{DEVICE_PAGE, DEVICE_PAGE_SIZE, LOGIN_PAGE, SEARCH_DEBOUNCE_MS};
use crate::dom_utils;
use crate::models::{Device, DevicePage, DeviceStatus};
use crate::network::ApiClient;
use crate::pages::with_brand;
use crate::session::SessionStore;

// Pure list state -------------------------------------------------------

/// Accumulated device listing plus the bookkeeping for incremental fetches.
///
/// Pages append in fetch order; identity is fetch order, not ESN, so an
/// unstable backend sort can surface duplicates.  Every fetch carries a
/// sequence number and only the most recently issued fetch may commit,
/// which keeps a slow stale response from overwriting fresher state.
pub struct DeviceList {
    pub items: Vec<Device>,
    page: u32,
    page_size: u32,
    /// Backend-reported total when it sent one; advisory only.
    pub total: Option<u64>,
    /// Heuristic: the last applied page came back full, so more may exist.
    pub has_more: bool,
    seq: u64,
}

/// Ticket for one in-flight fetch.
pub struct PendingFetch {
    seq: u64,
    pub page: u32,
    replace: bool,
}

impl DeviceList {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            page_size,
            total: None,
            has_more: false,
            seq: 0,
        }
    }

    /// Start a fetch of page 0 that replaces the accumulated list (initial
    /// load, new search term, manual refresh).
    pub fn begin_refresh(&mut self) -> PendingFetch {
        self.next(0, true)
    }

    /// Start a fetch of the next page.  The page index only advances when
    /// the page applies, so a failed load-more retries the same page.
    pub fn begin_load_more(&mut self) -> PendingFetch {
        self.next(self.page + 1, false)
    }

    fn next(&mut self, page: u32, replace: bool) -> PendingFetch {
        self.seq += 1;
        PendingFetch {
            seq: self.seq,
            page,
            replace,
        }
    }

    /// Whether this ticket is still the most recently issued fetch.
    pub fn is_current(&self, pending: &PendingFetch) -> bool {
        pending.seq == self.seq
    }

    /// Commit a fetched page.  Returns false (and changes nothing) when a
    /// newer fetch was issued after this one.
    pub fn apply(&mut self, pending: &PendingFetch, page: DevicePage) -> bool {
        if !self.is_current(pending) {
            return false;
        }
        let fetched = page.items.len() as u32;
        if pending.replace {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.page = pending.page;
        if page.count.is_some() {
            self.total = page.count;
        }
        self.has_more = fetched == self.page_size;
        true
    }

    /// Count badge next to the page heading, e.g. `(40+)` while more pages
    /// may exist.
    pub fn count_badge(&self) -> String {
        format!(
            "({}{})",
            self.items.len(),
            if self.has_more { "+" } else { "" }
        )
    }

    /// Loaded devices passing the client-side status filter.
    pub fn visible(&self, filter: Option<DeviceStatus>) -> Vec<&Device> {
        self.items
            .iter()
            .filter(|d| filter.map_or(true, |wanted| d.status() == wanted))
            .collect()
    }
}

/// Value of the status `<select>`; `None` is "all".
pub fn parse_status_filter(raw: &str) -> Option<DeviceStatus> {
    match raw {
        "running" => Some(DeviceStatus::Running),
        "online" => Some(DeviceStatus::Online),
        "offline" => Some(DeviceStatus::Offline),
        _ => None,
    }
}

/// Placeholder shown instead of device cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMessage {
    /// No devices loaded and no search active: the fleet is empty.
    EmptyFleet,
    /// No devices loaded while a search is active.
    NoSearchResults,
    /// Devices are loaded but the status filter hides all of them.
    NoFilterResults,
}

pub fn list_message(
    loaded: usize,
    visible: usize,
    search_active: bool,
    filter_active: bool,
) -> Option<ListMessage> {
    if loaded == 0 {
        return Some(if search_active {
            ListMessage::NoSearchResults
        } else {
            ListMessage::EmptyFleet
        });
    }
    if visible == 0 && filter_active {
        return Some(ListMessage::NoFilterResults);
    }
    None
}

// Controller ------------------------------------------------------------

pub struct DashboardController {
    api: Rc<ApiClient>,
    session: SessionStore,
    list: DeviceList,
    filter: Option<DeviceStatus>,
    /// Single debounce handle; replacing it cancels the pending trigger.
    debounce: Option<Timeout>,
    loading: bool,
}

pub fn init(document: &Document, api: Rc<ApiClient>, session: SessionStore) -> Result<(), JsValue> {
    if !session.is_authenticated() {
        return dom_utils::navigate_to(LOGIN_PAGE);
    }

    if let Some(el) = dom_utils::maybe_element(document, "userName") {
        let first_name = session
            .user()
            .and_then(|u| u.first_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "User".to_string());
        dom_utils::set_text(&el, &first_name);
    }

    let ctrl = Rc::new(RefCell::new(DashboardController {
        api,
        session,
        list: DeviceList::new(DEVICE_PAGE_SIZE),
        filter: None,
        debounce: None,
        loading: false,
    }));

    wire_search(document, &ctrl)?;
    wire_filter(document, &ctrl)?;
    wire_buttons(document, &ctrl)?;

    start_refresh(&ctrl);
    Ok(())
}

fn wire_search(document: &Document, ctrl: &Rc<RefCell<DashboardController>>) -> Result<(), JsValue> {
    let input = match dom_utils::maybe_element(document, "searchInput") {
        Some(el) => el,
        None => return Ok(()),
    };
    let ctrl = Rc::clone(ctrl);
    let on_input = Closure::wrap(Box::new(move |_: web_sys::Event| {
        let trigger = {
            let ctrl = Rc::clone(&ctrl);
            move || start_refresh(&ctrl)
        };
        // Dropping the previous handle cancels its pending trigger.
        ctrl.borrow_mut().debounce = Some(Timeout::new(SEARCH_DEBOUNCE_MS, trigger));
    }) as Box<dyn FnMut(_)>);
    input.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
    on_input.forget();
    Ok(())
}

fn wire_filter(document: &Document, ctrl: &Rc<RefCell<DashboardController>>) -> Result<(), JsValue> {
    let select: HtmlSelectElement = match dom_utils::typed(document, "statusFilter") {
        Ok(el) => el,
        Err(_) => return Ok(()),
    };
    let ctrl = Rc::clone(ctrl);
    let handle = select.clone();
    let on_change = Closure::wrap(Box::new(move |_: web_sys::Event| {
        let document = match dom_utils::document() {
            Ok(d) => d,
            Err(_) => return,
        };
        let mut c = ctrl.borrow_mut();
        c.filter = parse_status_filter(&handle.value());
        let _ = render_list(&document, &c);
    }) as Box<dyn FnMut(_)>);
    select.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
    on_change.forget();
    Ok(())
}

fn wire_buttons(document: &Document, ctrl: &Rc<RefCell<DashboardController>>) -> Result<(), JsValue> {
    if let Some(button) = dom_utils::maybe_element(document, "refreshBtn") {
        let ctrl = Rc::clone(ctrl);
        let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            start_refresh(&ctrl);
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    if let Some(button) = dom_utils::maybe_element(document, "loadMoreBtn") {
        let ctrl = Rc::clone(ctrl);
        let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            start_load_more(&ctrl);
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    if let Some(button) = dom_utils::maybe_element(document, "logoutBtn") {
        let ctrl = Rc::clone(ctrl);
        let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            ctrl.borrow().api.logout();
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    Ok(())
}

// Fetching --------------------------------------------------------------

fn search_term(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Fetch page 0 with the current search term, replacing the list.
fn start_refresh(ctrl: &Rc<RefCell<DashboardController>>) {
    let ctrl = Rc::clone(ctrl);
    spawn_local(async move {
        let document = match dom_utils::document() {
            Ok(d) => d,
            Err(_) => return,
        };
        let (api, pending) = {
            let mut c = ctrl.borrow_mut();
            // This refresh supersedes any debounce still pending.
            drop(c.debounce.take());
            c.loading = true;
            (Rc::clone(&c.api), c.list.begin_refresh())
        };
        let search = dom_utils::input_value(&document, "searchInput");
        show_initial_loading(&document);

        let result = api
            .get_devices(pending.page, DEVICE_PAGE_SIZE, search_term(&search), None)
            .await;

        if let Some(el) = dom_utils::maybe_element(&document, "loading") {
            dom_utils::hide(&el);
        }
        let mut c = ctrl.borrow_mut();
        c.loading = false;
        match result {
            Ok(page) => {
                if c.list.apply(&pending, page) {
                    let _ = render_list(&document, &c);
                }
            }
            Err(err) => {
                // A stale failure is irrelevant; a current one replaces the
                // list area with an inline error.
                if c.list.is_current(&pending) {
                    let _ = render_initial_error(&document, &err.to_string());
                }
            }
        }
    });
}

/// Fetch the next page and append it.
fn start_load_more(ctrl: &Rc<RefCell<DashboardController>>) {
    let ctrl = Rc::clone(ctrl);
    spawn_local(async move {
        let document = match dom_utils::document() {
            Ok(d) => d,
            Err(_) => return,
        };
        let (api, pending) = {
            let mut c = ctrl.borrow_mut();
            if c.loading {
                return;
            }
            c.loading = true;
            (Rc::clone(&c.api), c.list.begin_load_more())
        };
        let search = dom_utils::input_value(&document, "searchInput");
        set_load_more_label(&document, "Loading…");

        let result = api
            .get_devices(pending.page, DEVICE_PAGE_SIZE, search_term(&search), None)
            .await;

        let mut c = ctrl.borrow_mut();
        c.loading = false;
        match result {
            Ok(page) => {
                if c.list.apply(&pending, page) {
                    let _ = render_list(&document, &c);
                }
            }
            Err(_) => {
                // Existing list stays intact; clicking again retries the
                // same page because the index never advanced.
                if c.list.is_current(&pending) {
                    set_load_more_label(&document, "Failed to load more");
                }
            }
        }
    });
}

// Rendering -------------------------------------------------------------

fn show_initial_loading(document: &Document) {
    if let Some(el) = dom_utils::maybe_element(document, "loading") {
        dom_utils::show(&el);
    }
    if let Some(el) = dom_utils::maybe_element(document, "deviceList") {
        el.set_inner_html("");
    }
    for id in ["emptyState", "noResults", "loadMoreBtn"] {
        if let Some(el) = dom_utils::maybe_element(document, id) {
            dom_utils::hide(&el);
        }
    }
}

fn set_load_more_label(document: &Document, label: &str) {
    if let Some(button) = dom_utils::maybe_element(document, "loadMoreBtn") {
        dom_utils::set_text(&button, label);
    }
}

fn render_list(document: &Document, c: &DashboardController) -> Result<(), JsValue> {
    let list_el = dom_utils::element(document, "deviceList")?;
    list_el.set_inner_html("");

    let visible = c.list.visible(c.filter);
    for device in &visible {
        list_el.append_child(&device_card(document, device, &c.session)?.into())?;
    }

    if let Some(el) = dom_utils::maybe_element(document, "deviceCount") {
        dom_utils::set_text(&el, &c.list.count_badge());
    }

    if let Some(button) = dom_utils::maybe_element(document, "loadMoreBtn") {
        dom_utils::set_text(&button, "Load More");
        dom_utils::set_visible(&button, c.list.has_more);
    }

    let search_active = !dom_utils::input_value(document, "searchInput")
        .trim()
        .is_empty();
    render_placeholder(
        document,
        list_message(
            c.list.items.len(),
            visible.len(),
            search_active,
            c.filter.is_some(),
        ),
    );
    Ok(())
}

fn render_placeholder(document: &Document, message: Option<ListMessage>) {
    if let Some(ref el) = dom_utils::maybe_element(document, "emptyState") {
        dom_utils::set_visible(el, message == Some(ListMessage::EmptyFleet));
    }
    if let Some(ref el) = dom_utils::maybe_element(document, "noResults") {
        match message {
            Some(ListMessage::NoSearchResults) => {
                dom_utils::set_text(el, "No devices match your search.");
                dom_utils::show(el);
            }
            Some(ListMessage::NoFilterResults) => {
                dom_utils::set_text(el, "No devices match the selected filter.");
                dom_utils::show(el);
            }
            _ => dom_utils::hide(el),
        }
    }
}

fn render_initial_error(document: &Document, message: &str) -> Result<(), JsValue> {
    let list_el = dom_utils::element(document, "deviceList")?;
    list_el.set_inner_html("");

    let wrapper = document.create_element("div")?;
    wrapper.set_class_name("empty-state");

    let icon = document.create_element("div")?;
    icon.set_class_name("empty-state-icon");
    icon.set_text_content(Some("⚠️"));
    wrapper.append_child(&icon)?;

    let headline = document.create_element("p")?;
    headline.set_text_content(Some("Failed to load devices"));
    wrapper.append_child(&headline)?;

    let detail = document.create_element("p")?;
    detail.set_class_name("error-detail");
    detail.set_text_content(Some(message));
    wrapper.append_child(&detail)?;

    list_el.append_child(&wrapper)?;
    Ok(())
}

/// One clickable device row; clicking stores the snapshot and opens the
/// detail page.
fn device_card(
    document: &Document,
    device: &Device,
    session: &SessionStore,
) -> Result<Element, JsValue> {
    let card = document.create_element("div")?;
    card.set_class_name("card card-clickable device-card");

    let dot = document.create_element("div")?;
    dot.set_class_name(&format!("device-status {}", device.status().as_str()));
    card.append_child(&dot)?;

    let info = document.create_element("div")?;
    info.set_class_name("device-info");
    let name = document.create_element("div")?;
    name.set_class_name("device-name");
    name.set_text_content(Some(device.display_name()));
    info.append_child(&name)?;
    let esn = document.create_element("div")?;
    esn.set_class_name("device-esn");
    esn.set_text_content(Some(&device.esn));
    info.append_child(&esn)?;
    card.append_child(&info)?;

    let arrow = document.create_element("div")?;
    arrow.set_class_name("device-arrow");
    arrow.set_text_content(Some("›"));
    card.append_child(&arrow)?;

    let session = session.clone();
    let snapshot = device.clone();
    let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
        if session.set_selected_device(&snapshot).is_err() {
            web_sys::console::warn_1(&"Failed to store selected device".into());
            return;
        }
        let _ = dom_utils::navigate_to(&with_brand(DEVICE_PAGE, &session));
    }) as Box<dyn FnMut(_)>);
    card.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn devices(n: usize, tag: &str) -> Vec<Device> {
        (0..n)
            .map(|i| serde_json::from_value(json!({ "ESN": format!("{}-{}", tag, i) })).unwrap())
            .collect()
    }

    fn page(items: Vec<Device>, count: Option<u64>) -> DevicePage {
        DevicePage { items, count }
    }

    #[test]
    fn pages_accumulate_in_fetch_order() {
        let mut list = DeviceList::new(20);

        let first = list.begin_refresh();
        assert!(list.apply(&first, page(devices(20, "p0"), Some(45))));
        assert_eq!(list.items.len(), 20);
        assert_eq!(list.total, Some(45));
        assert!(list.has_more);

        let second = list.begin_load_more();
        assert_eq!(second.page, 1);
        assert!(list.apply(&second, page(devices(20, "p1"), Some(45))));
        assert_eq!(list.items.len(), 40);
        assert_eq!(list.count_badge(), "(40+)");

        // A short page ends pagination.
        let third = list.begin_load_more();
        assert_eq!(third.page, 2);
        assert!(list.apply(&third, page(devices(5, "p2"), Some(45))));
        assert_eq!(list.items.len(), 45);
        assert!(!list.has_more);
        assert_eq!(list.count_badge(), "(45)");
    }

    #[test]
    fn stale_fetch_results_are_discarded() {
        let mut list = DeviceList::new(20);

        let older = list.begin_refresh();
        let newer = list.begin_refresh();

        // The older fetch finishes last but must not win.
        assert!(list.apply(&newer, page(devices(3, "fresh"), None)));
        assert!(!list.apply(&older, page(devices(20, "stale"), None)));

        assert_eq!(list.items.len(), 3);
        assert_eq!(list.items[0].esn, "fresh-0");
    }

    #[test]
    fn failed_load_more_retries_the_same_page() {
        let mut list = DeviceList::new(20);
        let first = list.begin_refresh();
        assert!(list.apply(&first, page(devices(20, "p0"), None)));

        // Fetch of page 1 fails: nothing applied, index unchanged.
        let failed = list.begin_load_more();
        assert_eq!(failed.page, 1);

        let retried = list.begin_load_more();
        assert_eq!(retried.page, 1);
        assert!(list.apply(&retried, page(devices(20, "p1"), None)));
        assert_eq!(list.items.len(), 40);

        let next = list.begin_load_more();
        assert_eq!(next.page, 2);
    }

    #[test]
    fn refresh_replaces_the_accumulated_list() {
        let mut list = DeviceList::new(20);
        let first = list.begin_refresh();
        assert!(list.apply(&first, page(devices(20, "p0"), None)));
        let more = list.begin_load_more();
        assert!(list.apply(&more, page(devices(20, "p1"), None)));
        assert_eq!(list.items.len(), 40);

        let refreshed = list.begin_refresh();
        assert!(list.apply(&refreshed, page(devices(7, "new"), None)));
        assert_eq!(list.items.len(), 7);
        assert!(!list.has_more);
    }

    #[test]
    fn status_filter_narrows_visible_devices() {
        let running = json!({ "ESN": "R", "compositeState": {
            "ConnectionState": { "value": true }, "Engine_Speed": { "value": 1500 } } });
        let online = json!({ "ESN": "O", "compositeState": {
            "ConnectionState": { "value": true }, "Engine_Speed": { "value": 0 } } });
        let offline = json!({ "ESN": "X" });

        let mut list = DeviceList::new(20);
        let pending = list.begin_refresh();
        let items = vec![running, online, offline]
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        assert!(list.apply(&pending, page(items, None)));

        assert_eq!(list.visible(None).len(), 3);
        assert_eq!(list.visible(Some(DeviceStatus::Running)).len(), 1);
        assert_eq!(list.visible(Some(DeviceStatus::Online)).len(), 1);
        assert_eq!(list.visible(Some(DeviceStatus::Offline)).len(), 1);
        assert_eq!(list.visible(Some(DeviceStatus::Running))[0].esn, "R");
    }

    #[test]
    fn parse_status_filter_maps_select_values() {
        assert_eq!(parse_status_filter("all"), None);
        assert_eq!(parse_status_filter("running"), Some(DeviceStatus::Running));
        assert_eq!(parse_status_filter("online"), Some(DeviceStatus::Online));
        assert_eq!(parse_status_filter("offline"), Some(DeviceStatus::Offline));
        assert_eq!(parse_status_filter("bogus"), None);
    }

    #[test]
    fn placeholder_distinguishes_empty_fleet_from_no_results() {
        // Zero devices ever vs zero matching an active search.
        assert_eq!(
            list_message(0, 0, false, false),
            Some(ListMessage::EmptyFleet)
        );
        assert_eq!(
            list_message(0, 0, true, false),
            Some(ListMessage::NoSearchResults)
        );
        // Loaded devices hidden by the status filter.
        assert_eq!(
            list_message(12, 0, false, true),
            Some(ListMessage::NoFilterResults)
        );
        // Devices visible: no placeholder.
        assert_eq!(list_message(12, 4, true, true), None);
        // Nothing visible but no filter active either: cards simply render.
        assert_eq!(list_message(12, 12, false, false), None);
    }
}
