//! Constants shared across the frontend.
//!
//! Centralizes storage keys, metric names and tuning values so the rest of
//! the codebase never spells them inline.

// Backend ---------------------------------------------------------------

/// Fixed backend origin; overridable at compile time via `API_BASE_URL`.
pub const DEFAULT_API_ORIGIN: &str = "https://telemetry.fleetlink.example";

/// Path fragment that marks a request as backend traffic.  The offline
/// cache must never intercept these.
pub const API_PATH_MARKER: &str = "/api/";

/// Hard ceiling the backend enforces on `resultsPerPage`.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Page size used by the dashboard listing.
pub const DEVICE_PAGE_SIZE: u32 = 20;

/// Upper bound on sequential pages fetched by a full-set query.  Guards
/// against a backend that never returns a short page.
pub const FULL_FETCH_PAGE_LIMIT: u32 = 50;

/// Results requested when the detail page refreshes a single device by ESN.
/// A few extra rows let us reconcile an exact ESN among near-matches.
pub const REFRESH_PROBE_SIZE: u32 = 5;

// Storage keys ----------------------------------------------------------

/// Auth token (localStorage, survives the tab).
pub const KEY_TOKEN: &str = "fleetlink_token";
/// Cached user profile blob (localStorage).
pub const KEY_USER: &str = "fleetlink_user";
/// Device snapshot handed from the dashboard to the detail page
/// (sessionStorage, per-tab).
pub const KEY_SELECTED_DEVICE: &str = "fleetlink_selected_device";
/// Resolved brand profile (sessionStorage, per-tab).
pub const KEY_BRAND: &str = "fleetlink_brand";

// Metric keys -----------------------------------------------------------

pub const METRIC_CONNECTION_STATE: &str = "ConnectionState";
pub const METRIC_ENGINE_SPEED: &str = "Engine_Speed";
pub const METRIC_ENGINE_HOURS: &str = "Engine_Hours";
pub const METRIC_ENGINE_TEMPERATURE: &str = "Engine_Temperature";
pub const METRIC_OIL_PRESSURE: &str = "Engine_Oil_Pressure";
pub const METRIC_BATTERY_VOLTAGE: &str = "Battery_Voltage";
pub const METRIC_FUEL_LEVEL: &str = "Fuel_Level";
pub const METRIC_FUEL_RATE: &str = "Fuel_Rate";
pub const METRIC_TOTAL_FUEL_USED: &str = "Total_Fuel_Used";
pub const METRIC_LATITUDE: &str = "Latitude";
pub const METRIC_LONGITUDE: &str = "Longitude";
pub const METRIC_CELL_BARS: &str = "Cell_Bar_Icon";

// Classification --------------------------------------------------------

/// Engine speed above which a connected device counts as "running".
/// Kept as the backend convention; values at or below are idle.
pub const ENGINE_IDLE_RPM: f64 = 10.0;

// Dashboard -------------------------------------------------------------

/// Quiet period after the last keystroke before a search fires.
pub const SEARCH_DEBOUNCE_MS: u32 = 500;

// Device commands -------------------------------------------------------

pub const COMMAND_START_ENGINE: &str = "Start_Engine";
pub const COMMAND_STOP_ENGINE: &str = "Stop_Engine";

/// How long the inline command feedback stays on screen.
pub const COMMAND_NOTICE_MS: u32 = 4000;

// Offline cache ---------------------------------------------------------

/// Versioned cache name; bump the suffix to invalidate old app shells.
pub const STATIC_CACHE_NAME: &str = "fleetlink-static-v1";

/// App-shell assets pre-populated at service-worker install time.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/dashboard.html",
    "/device.html",
    "/css/styles.css",
    "/pkg/fleetlink_frontend.js",
    "/pkg/fleetlink_frontend_bg.wasm",
];

// Pages -----------------------------------------------------------------

/// Login entry point; unauthenticated users land here.
pub const LOGIN_PAGE: &str = "index.html";
pub const DASHBOARD_PAGE: &str = "dashboard.html";
pub const DEVICE_PAGE: &str = "device.html";
