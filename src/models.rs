use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    ENGINE_IDLE_RPM, METRIC_CELL_BARS, METRIC_CONNECTION_STATE, METRIC_ENGINE_SPEED,
    METRIC_LATITUDE, METRIC_LONGITUDE,
};

/// One metric entry inside a device's composite state: the latest reported
/// value plus the timestamp it was reported at.  The backend is loose about
/// types (booleans, numbers, numeric strings) so both fields stay raw JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,
}

/// An immutable device snapshot as returned by the listing endpoint.
///
/// `extra` captures every field we do not model so that a snapshot written
/// to session storage and read back on the detail page is field-for-field
/// identical to what the backend sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Equipment Serial Number – the stable, case-sensitive identity.
    #[serde(default, rename = "ESN")]
    pub esn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "compositeState",
        skip_serializing_if = "Option::is_none"
    )]
    pub composite_state: Option<HashMap<String, MetricSample>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Three-way connectivity classification used by the dashboard filter and
/// the detail status badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceStatus {
    Running,
    Online,
    Offline,
}

impl DeviceStatus {
    /// Lowercase form used for CSS classes and filter values.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Running => "running",
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        }
    }

    /// Human label for the status badge.
    pub fn label(&self) -> &'static str {
        match self {
            DeviceStatus::Running => "Engine Running",
            DeviceStatus::Online => "Online",
            DeviceStatus::Offline => "Offline",
        }
    }
}

impl Device {
    pub fn metric(&self, key: &str) -> Option<&MetricSample> {
        self.composite_state.as_ref()?.get(key)
    }

    pub fn metric_value(&self, key: &str) -> Option<&Value> {
        self.metric(key)?.value.as_ref()
    }

    /// Numeric read of a metric, coercing numeric strings the way the
    /// backend sometimes delivers them.
    pub fn metric_f64(&self, key: &str) -> Option<f64> {
        match self.metric_value(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A device is connected only when `ConnectionState` is strictly `true`.
    pub fn is_connected(&self) -> bool {
        matches!(
            self.metric_value(METRIC_CONNECTION_STATE),
            Some(Value::Bool(true))
        )
    }

    /// Classify the device as running / online / offline.
    ///
    /// Running requires a live connection and an engine speed above the idle
    /// threshold; anything without a strict `true` connection is offline.
    pub fn status(&self) -> DeviceStatus {
        if !self.is_connected() {
            return DeviceStatus::Offline;
        }
        let speed = self.metric_f64(METRIC_ENGINE_SPEED).unwrap_or(0.0);
        if speed > ENGINE_IDLE_RPM {
            DeviceStatus::Running
        } else {
            DeviceStatus::Online
        }
    }

    /// Display name, falling back to the ESN when unnamed (empty strings
    /// count as unnamed).
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.esn.is_empty() => &self.esn,
            _ => "Unknown device",
        }
    }

    /// Latitude/longitude pair when both are present and non-zero.  Zero is
    /// what the modem reports before its first GPS fix, so it renders as
    /// "no location" rather than a link into the ocean.
    pub fn location(&self) -> Option<(f64, f64)> {
        let lat = self.metric_f64(METRIC_LATITUDE)?;
        let lng = self.metric_f64(METRIC_LONGITUDE)?;
        if lat == 0.0 || lng == 0.0 {
            return None;
        }
        Some((lat, lng))
    }

    /// Cell signal strength on the backend's 0..=6 scale.
    pub fn cell_bars(&self) -> u8 {
        self.metric_f64(METRIC_CELL_BARS).unwrap_or(0.0) as u8
    }

    /// Timestamp of the most recent connectivity report, if any.
    pub fn last_update(&self) -> Option<&Value> {
        self.metric(METRIC_CONNECTION_STATE)?.time.as_ref()
    }
}

/// One page of a device listing, normalized from whichever shape the
/// backend produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DevicePage {
    pub items: Vec<Device>,
    /// Total matching devices when the backend reports it.
    pub count: Option<u64>,
}

impl DevicePage {
    /// Normalize a listing response.
    ///
    /// The v2 endpoint wraps its payload as `{result: {items, count}}`; the
    /// legacy endpoint returns `{items, count}` or a bare array.  Absent
    /// items become an empty page and an absent count stays unknown rather
    /// than failing.
    pub fn from_value(value: Value) -> Result<DevicePage, serde_json::Error> {
        let body = match value {
            Value::Object(mut map) => match map.remove("result") {
                Some(inner) if !inner.is_null() => inner,
                _ => Value::Object(map),
            },
            other => other,
        };

        match body {
            Value::Array(_) => Ok(DevicePage {
                items: serde_json::from_value(body)?,
                count: None,
            }),
            Value::Object(mut map) => {
                let count = map
                    .remove("count")
                    .and_then(|c| c.as_u64().or_else(|| c.as_f64().map(|f| f as u64)));
                let items = match map.remove("items") {
                    Some(v) if !v.is_null() => serde_json::from_value(v)?,
                    _ => Vec::new(),
                };
                Ok(DevicePage { items, count })
            }
            _ => Ok(DevicePage::default()),
        }
    }
}

/// Visual identity resolved once per page load from the URL and cached in
/// session storage so sibling pages reuse it without re-detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub key: String,
    pub name: String,
    pub logo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_branding: Option<String>,
    pub theme_color: String,
}

// API models that match the backend schema ------------------------------

/// Cached profile of the logged-in user.  The backend sends more fields
/// than we render; `extra` keeps them intact in storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(
        default,
        rename = "userFirstName",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_name: Option<String>,
    #[serde(
        default,
        rename = "userLastName",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Response body of the login endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub message: Option<String>,
}
