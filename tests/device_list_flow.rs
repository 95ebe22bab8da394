//! End-to-end flow over the pure core: backend payload normalization,
//! pagination accumulation, stale-fetch handling and client-side status
//! filtering, exercised exactly the way the dashboard drives them.

use serde_json::json;

use fleetlink_frontend::models::{DevicePage, DeviceStatus};
use fleetlink_frontend::network::api_client::collect_all_pages;
use fleetlink_frontend::pages::dashboard::{
    list_message, parse_status_filter, DeviceList, ListMessage,
};

fn v2_page(esns: &[&str], count: u64) -> DevicePage {
    let items: Vec<serde_json::Value> = esns
        .iter()
        .enumerate()
        .map(|(i, esn)| {
            json!({
                "ESN": esn,
                "name": format!("Unit {}", i),
                "compositeState": {
                    "ConnectionState": { "value": i % 2 == 0 },
                    "Engine_Speed": { "value": if i == 0 { 1800 } else { 0 } }
                }
            })
        })
        .collect();
    DevicePage::from_value(json!({ "result": { "items": items, "count": count } })).unwrap()
}

#[test]
fn dashboard_session_accumulates_filters_and_recovers() {
    let mut list = DeviceList::new(2);

    // Initial load: page 0 out of a v2-wrapped payload.
    let initial = list.begin_refresh();
    assert!(list.apply(&initial, v2_page(&["A100", "A101"], 5)));
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.total, Some(5));
    assert!(list.has_more, "a full page implies more may exist");
    assert_eq!(list.count_badge(), "(2+)");

    // Load more appends; a legacy bare-array page is normalized the same way.
    let more = list.begin_load_more();
    let legacy = DevicePage::from_value(json!([{ "ESN": "A102" }])).unwrap();
    assert_eq!(legacy.count, None);
    assert!(list.apply(&more, legacy));
    assert_eq!(list.items.len(), 3);
    assert!(!list.has_more, "a short page ends pagination");
    // An absent count keeps the previous estimate.
    assert_eq!(list.total, Some(5));

    // Client-side filter narrows without touching the accumulated list.
    let filter = parse_status_filter("running");
    assert_eq!(filter, Some(DeviceStatus::Running));
    let running = list.visible(filter);
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].esn, "A100");
    assert_eq!(list.items.len(), 3);
}

#[test]
fn stale_search_response_never_overwrites_a_newer_one() {
    let mut list = DeviceList::new(20);

    // Two keystrokes, two fetches; the older completes last.
    let for_pum = list.begin_refresh();
    let for_pump = list.begin_refresh();

    assert!(list.apply(&for_pump, v2_page(&["PUMP-7"], 1)));
    assert!(!list.apply(&for_pum, v2_page(&["PUMP-7", "PUMICE-1"], 2)));

    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].esn, "PUMP-7");
}

#[test]
fn empty_fleet_and_empty_search_render_different_messages() {
    let mut list = DeviceList::new(20);
    let pending = list.begin_refresh();
    assert!(list.apply(&pending, DevicePage::default()));

    // Same zero-device list, different framing depending on search state.
    assert_eq!(
        list_message(list.items.len(), 0, false, false),
        Some(ListMessage::EmptyFleet)
    );
    assert_eq!(
        list_message(list.items.len(), 0, true, false),
        Some(ListMessage::NoSearchResults)
    );
}

#[test]
fn full_fleet_fetch_walks_pages_sequentially() {
    let pages = vec![
        v2_page(&["A", "B"], 5),
        v2_page(&["C", "D"], 5),
        v2_page(&["E"], 5),
    ];
    let mut served = pages.into_iter();

    let fetched = futures::executor::block_on(collect_all_pages(
        move |_page| {
            let page = served.next().expect("no page should be requested past the short one");
            async move { Ok(page) }
        },
        2,
        50,
    ))
    .unwrap();

    assert_eq!(fetched.requests, 3);
    assert_eq!(fetched.items.len(), 5);
    assert!(!fetched.truncated);
    let esns: Vec<&str> = fetched.items.iter().map(|d| d.esn.as_str()).collect();
    assert_eq!(esns, ["A", "B", "C", "D", "E"]);
}
