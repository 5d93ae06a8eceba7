//! GBFS feed DTOs.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::json::nullable_list;

/// The `gbfs.json` discovery document.
///
/// `data` maps a language code to its feed list. Some publishers wrap the
/// list in `{"feeds": [...]}`, others put the list there directly, so the
/// block is kept as raw JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub data: Option<Value>,
}

impl DiscoveryResponse {
    /// Feed name → URL, taken from the English block when there is one and
    /// from any other language block otherwise.
    pub fn feed_urls(&self) -> HashMap<String, String> {
        let Some(Value::Object(languages)) = &self.data else {
            return HashMap::new();
        };

        let block = languages.get("en").or_else(|| languages.values().next());
        let items = match block {
            Some(Value::Object(block)) => block.get("feeds").and_then(Value::as_array),
            Some(Value::Array(items)) => Some(items),
            _ => None,
        };

        items
            .into_iter()
            .flatten()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?;
                let url = item.get("url")?.as_str()?;
                (!name.is_empty() && !url.is_empty()).then(|| (name.to_string(), url.to_string()))
            })
            .collect()
    }
}

/// Envelope shared by the station feeds: `{"data": {"stations": [...]}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct StationsFeed<T> {
    #[serde(default)]
    pub data: StationsData<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct StationsData<T> {
    #[serde(default, deserialize_with = "nullable_list")]
    pub stations: Vec<T>,
}

impl<T> Default for StationsData<T> {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
        }
    }
}

/// One entry of `station_information`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationInformationDto {
    pub station_id: Option<Value>,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// One entry of `station_status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationStatusDto {
    pub station_id: Option<Value>,
    pub num_bikes_available: Option<i64>,
    pub num_docks_available: Option<i64>,
    pub num_ebikes_available: Option<i64>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub vehicle_types_available: Vec<VehicleTypeCount>,
}

/// Per-vehicle-type availability (GBFS 2.1+).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleTypeCount {
    pub vehicle_type_id: Option<String>,
    pub count: Option<i64>,
}
