use bevy::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use constants::camera::{DEFAULT_FOV_DEGREES, DEFAULT_MAX_VOLUME_SIZE};

use crate::constants::render_settings::{DEFAULT_MIN_RADIUS, DEFAULT_RADIUS_SCALE};

/// Camera pose saved by the page between visits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedCameraPose {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

/// Viewer tuning the page may override. Missing keys keep their defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub radius_scale: f32,
    pub min_radius: Option<f32>,
    pub fov: f32,
    pub max_volume_size: f32,
    pub post_processing: bool,
    /// Place the initial camera on the -z side of the skeleton.
    pub front_to_back: bool,
    pub colour_override: Option<[f32; 3]>,
    pub abstraction_threshold: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            radius_scale: DEFAULT_RADIUS_SCALE,
            min_radius: DEFAULT_MIN_RADIUS,
            fov: DEFAULT_FOV_DEGREES,
            max_volume_size: DEFAULT_MAX_VOLUME_SIZE,
            post_processing: true,
            front_to_back: false,
            colour_override: None,
            abstraction_threshold: 1.0,
        }
    }
}

/// Page state handed to the viewer as `page_data.json`.
#[derive(Asset, TypePath, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageData {
    #[serde(default = "default_true")]
    pub neuron_ready: bool,
    /// First visit of this proofreading session. Clears persisted labels.
    #[serde(default)]
    pub initial_load: bool,
    /// Node indices per section, in skeleton node order.
    #[serde(default)]
    pub sections: Vec<Vec<usize>>,
    /// Flat `[x, y, z, ...]` synapse coordinates.
    #[serde(default)]
    pub synapse_cloud: Vec<f32>,
    #[serde(default, deserialize_with = "deserialize_optional_ids")]
    pub synapse_ids: Option<Vec<String>>,
    #[serde(default)]
    pub active_section: Option<usize>,
    /// Accepts an array or a JSON encoded array string.
    #[serde(default, deserialize_with = "deserialize_ids")]
    pub active_synapse_ids: Vec<String>,
    #[serde(default)]
    pub camera: Option<SavedCameraPose>,
    #[serde(default)]
    pub viewer: ViewerSettings,
}

impl Default for PageData {
    fn default() -> Self {
        Self {
            neuron_ready: true,
            initial_load: false,
            sections: Vec::new(),
            synapse_cloud: Vec::new(),
            synapse_ids: None,
            active_section: None,
            active_synapse_ids: Vec::new(),
            camera: None,
            viewer: ViewerSettings::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Normalise a loosely typed id list: strings and numbers, optionally JSON encoded.
pub fn ids_from_value(value: serde_json::Value) -> Result<Vec<String>, String> {
    use serde_json::Value;

    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::String(single)) => Ok(vec![single]),
            Ok(decoded) => ids_from_value(decoded),
            Err(_) => Ok(vec![text]),
        },
        Value::Number(number) => Ok(vec![number.to_string()]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(id) => Ok(id),
                Value::Number(number) => Ok(number.to_string()),
                other => Err(format!("unsupported synapse id {}", other)),
            })
            .collect(),
        other => Err(format!("unsupported synapse id list {}", other)),
    }
}

fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    ids_from_value(value).map_err(serde::de::Error::custom)
}

fn deserialize_optional_ids<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    ids_from_value(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}
