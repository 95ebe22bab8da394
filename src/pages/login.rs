//! Login page controller.

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlButtonElement};

use crate::constants::DASHBOARD_PAGE;
use crate::dom_utils;
use crate::network::ApiClient;
use crate::pages::with_brand;
use crate::session::SessionStore;

pub fn init(document: &Document, api: Rc<ApiClient>, session: SessionStore) -> Result<(), JsValue> {
    // A visitor with a live session skips the form entirely.
    if session.is_authenticated() {
        return dom_utils::navigate_to(&with_brand(DASHBOARD_PAGE, &session));
    }

    let submit = {
        let document = document.clone();
        Rc::new(move || {
            let document = document.clone();
            let api = api.clone();
            let session = session.clone();
            spawn_local(async move {
                if let Err(err) = attempt_login(&document, &api, &session).await {
                    web_sys::console::error_1(&err);
                }
            });
        })
    };

    if let Some(button) = dom_utils::maybe_element(document, "loginBtn") {
        let submit = submit.clone();
        let on_click = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            submit();
        }) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    // Enter submits from either field.
    for id in ["emailInput", "passwordInput"] {
        if let Some(field) = dom_utils::maybe_element(document, id) {
            let submit = submit.clone();
            let on_key = Closure::wrap(Box::new(move |event: web_sys::KeyboardEvent| {
                if event.key() == "Enter" {
                    submit();
                }
            }) as Box<dyn FnMut(_)>);
            field.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
            on_key.forget();
        }
    }

    Ok(())
}

async fn attempt_login(
    document: &Document,
    api: &ApiClient,
    session: &SessionStore,
) -> Result<(), JsValue> {
    let email = dom_utils::input_value(document, "emailInput");
    let password = dom_utils::input_value(document, "passwordInput");

    if email.trim().is_empty() || password.is_empty() {
        show_error(document, "Enter your email and password.");
        return Ok(());
    }

    let button: HtmlButtonElement = dom_utils::typed(document, "loginBtn")?;
    button.set_disabled(true);
    button.set_text_content(Some("Signing in…"));
    clear_error(document);

    match api.login(email.trim(), &password).await {
        Ok(_) => dom_utils::navigate_to(&with_brand(DASHBOARD_PAGE, session)),
        Err(err) => {
            show_error(document, &err.to_string());
            button.set_disabled(false);
            button.set_text_content(Some("Sign In"));
            Ok(())
        }
    }
}

fn show_error(document: &Document, message: &str) {
    if let Some(line) = dom_utils::maybe_element(document, "loginError") {
        dom_utils::set_text(&line, message);
        dom_utils::show(&line);
    }
}

fn clear_error(document: &Document) {
    if let Some(line) = dom_utils::maybe_element(document, "loginError") {
        dom_utils::set_text(&line, "");
        dom_utils::hide(&line);
    }
}
