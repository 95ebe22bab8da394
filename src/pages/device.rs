//! Device detail page controller: metric snapshot, manual refresh and
//! remote engine commands.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

use crate::constants::{
    COMMAND_NOTICE_MS, COMMAND_START_ENGINE, COMMAND_STOP_ENGINE, DASHBOARD_PAGE, LOGIN_PAGE,
    METRIC_BATTERY_VOLTAGE, METRIC_ENGINE_HOURS, METRIC_ENGINE_SPEED, METRIC_ENGINE_TEMPERATURE,
    METRIC_FUEL_LEVEL, METRIC_FUEL_RATE, METRIC_OIL_PRESSURE, METRIC_TOTAL_FUEL_USED,
    REFRESH_PROBE_SIZE,
};
use crate::dom_utils;
use crate::models::Device;
use crate::network::ApiClient;
use crate::pages::with_brand;
use crate::session::SessionStore;
use crate::utils::{format_coordinates, format_timestamp, maps_url, metric_display};

pub struct DeviceDetailController {
    api: Rc<ApiClient>,
    session: SessionStore,
    device: Device,
}

pub fn init(document: &Document, api: Rc<ApiClient>, session: SessionStore) -> Result<(), JsValue> {
    if !session.is_authenticated() {
        return dom_utils::navigate_to(LOGIN_PAGE);
    }
    // The dashboard hands the snapshot over through session storage; landing
    // here without one just bounces back.
    let device = match session.selected_device() {
        Some(device) => device,
        None => return dom_utils::navigate_to(&with_brand(DASHBOARD_PAGE, &session)),
    };

    let ctrl = Rc::new(RefCell::new(DeviceDetailController {
        api,
        session,
        device,
    }));

    render(document, &ctrl.borrow().device)?;

    if let Some(button) = dom_utils::maybe_element(document, "refreshBtn") {
        let ctrl = Rc::clone(&ctrl);
        let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let ctrl = Rc::clone(&ctrl);
            spawn_local(async move { refresh(ctrl).await });
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    wire_command(document, &ctrl, "startEngineBtn", COMMAND_START_ENGINE)?;
    wire_command(document, &ctrl, "stopEngineBtn", COMMAND_STOP_ENGINE)?;

    Ok(())
}

/// Re-query the backend by ESN and replace the snapshot.  A failed refresh
/// is logged and the displayed data stays as it was.
async fn refresh(ctrl: Rc<RefCell<DeviceDetailController>>) {
    let (api, esn) = {
        let c = ctrl.borrow();
        (Rc::clone(&c.api), c.device.esn.clone())
    };

    match api
        .get_devices(0, REFRESH_PROBE_SIZE, Some(&esn), None)
        .await
    {
        Ok(page) => {
            let updated = match reconcile_refresh(page.items, &esn) {
                Some(device) => device,
                None => return,
            };
            let document = match dom_utils::document() {
                Ok(d) => d,
                Err(_) => return,
            };
            {
                let mut c = ctrl.borrow_mut();
                if c.session.set_selected_device(&updated).is_err() {
                    web_sys::console::warn_1(&"Failed to persist refreshed device".into());
                }
                c.device = updated;
            }
            if let Err(err) = render(&document, &ctrl.borrow().device) {
                web_sys::console::error_1(&err);
            }
        }
        Err(err) => {
            web_sys::console::warn_1(&format!("Device refresh failed: {}", err).into());
        }
    }
}

/// Pick the refreshed snapshot out of a search result.  The search can
/// return near-matches, so an exact ESN wins; failing that, trust the
/// first row.
pub(crate) fn reconcile_refresh(mut items: Vec<Device>, esn: &str) -> Option<Device> {
    if let Some(i) = items.iter().position(|d| d.esn == esn) {
        return Some(items.swap_remove(i));
    }
    items.into_iter().next()
}

fn wire_command(
    document: &Document,
    ctrl: &Rc<RefCell<DeviceDetailController>>,
    button_id: &str,
    command: &'static str,
) -> Result<(), JsValue> {
    let button = match dom_utils::maybe_element(document, button_id) {
        Some(el) => el,
        None => return Ok(()),
    };
    let ctrl = Rc::clone(ctrl);
    let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
        let ctrl = Rc::clone(&ctrl);
        spawn_local(async move { dispatch_command(ctrl, command).await });
    }) as Box<dyn FnMut(_)>);
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

/// Send one command and show the outcome on the inline status line.  No
/// automatic re-fetch afterwards; the refresh button stays the user's call.
async fn dispatch_command(ctrl: Rc<RefCell<DeviceDetailController>>, command: &'static str) {
    let (api, esn) = {
        let c = ctrl.borrow();
        (Rc::clone(&c.api), c.device.esn.clone())
    };

    let notice = match api.send_command(&esn, command).await {
        Ok(_) => "Command sent".to_string(),
        Err(err) => err.to_string(),
    };

    let document = match dom_utils::document() {
        Ok(d) => d,
        Err(_) => return,
    };
    if let Some(line) = dom_utils::maybe_element(&document, "commandStatus") {
        dom_utils::set_text(&line, &notice);
        dom_utils::show(&line);
        TimeoutFuture::new(COMMAND_NOTICE_MS).await;
        dom_utils::set_text(&line, "");
        dom_utils::hide(&line);
    }
}

// Rendering -------------------------------------------------------------

fn render(document: &Document, device: &Device) -> Result<(), JsValue> {
    if let Some(el) = dom_utils::maybe_element(document, "deviceName") {
        dom_utils::set_text(&el, device.display_name());
    }
    if let Some(el) = dom_utils::maybe_element(document, "deviceEsn") {
        dom_utils::set_text(&el, &device.esn);
    }

    render_status_badge(document, device)?;

    // Engine metrics.
    set_metric(document, "engineSpeed", metric_display(device, METRIC_ENGINE_SPEED, None), "RPM")?;
    set_metric(document, "engineHours", metric_display(device, METRIC_ENGINE_HOURS, Some(1)), "hrs")?;
    set_metric(document, "engineTemp", metric_display(device, METRIC_ENGINE_TEMPERATURE, None), "°F")?;
    set_metric(document, "oilPressure", metric_display(device, METRIC_OIL_PRESSURE, None), "kPa")?;

    // Power and fuel.
    set_metric(document, "batteryVoltage", metric_display(device, METRIC_BATTERY_VOLTAGE, Some(1)), "V")?;
    set_metric(document, "fuelLevel", metric_display(device, METRIC_FUEL_LEVEL, Some(0)), "%")?;
    set_metric(document, "fuelRate", metric_display(device, METRIC_FUEL_RATE, Some(1)), "L/hr")?;
    set_metric(document, "totalFuel", metric_display(device, METRIC_TOTAL_FUEL_USED, Some(0)), "L")?;

    render_location(document, device)?;

    if let Some(el) = dom_utils::maybe_element(document, "cellSignal") {
        dom_utils::set_text(&el, &format!("{}/6 bars", device.cell_bars()));
    }

    if let Some(el) = dom_utils::maybe_element(document, "lastUpdate") {
        let text = device
            .last_update()
            .and_then(format_timestamp)
            .unwrap_or_else(|| "N/A".to_string());
        dom_utils::set_text(&el, &text);
    }

    Ok(())
}

fn render_status_badge(document: &Document, device: &Device) -> Result<(), JsValue> {
    let badge = match dom_utils::maybe_element(document, "connectionBadge") {
        Some(el) => el,
        None => return Ok(()),
    };
    let status = device.status();
    badge.set_class_name(&format!("connection-badge {}", status.as_str()));
    badge.set_inner_html("");

    let dot = document.create_element("span")?;
    dot.set_class_name(&format!("device-status {}", status.as_str()));
    badge.append_child(&dot)?;
    badge.append_child(&document.create_text_node(status.label()))?;
    Ok(())
}

/// Value plus a `<span class="unit">` suffix, or the `N/A` placeholder when
/// the metric is absent.  Never fails on missing telemetry.
fn set_metric(
    document: &Document,
    id: &str,
    value: Option<String>,
    unit: &str,
) -> Result<(), JsValue> {
    let el = match dom_utils::maybe_element(document, id) {
        Some(el) => el,
        None => return Ok(()),
    };
    match value {
        Some(text) => {
            el.set_inner_html("");
            el.append_child(&document.create_text_node(&text))?;
            let unit_el = document.create_element("span")?;
            unit_el.set_class_name("unit");
            unit_el.set_text_content(Some(unit));
            el.append_child(&unit_el)?;
        }
        None => dom_utils::set_text(&el, "N/A"),
    }
    Ok(())
}

fn render_location(document: &Document, device: &Device) -> Result<(), JsValue> {
    let el = match dom_utils::maybe_element(document, "location") {
        Some(el) => el,
        None => return Ok(()),
    };
    match device.location() {
        Some((lat, lng)) => {
            el.set_inner_html("");
            let link = document.create_element("a")?;
            link.set_attribute("href", &maps_url(lat, lng))?;
            link.set_attribute("target", "_blank")?;
            link.set_attribute("rel", "noopener")?;
            link.set_text_content(Some(&format_coordinates(lat, lng)));
            el.append_child(&link)?;
        }
        None => dom_utils::set_text(&el, "N/A"),
    }
    Ok(())
}
