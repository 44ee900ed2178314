use std::collections::BTreeSet;

use bevy::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::engine::assets::page_data::ids_from_value;
use crate::tools::synapse_labels::{SynapseColour, SynapseKey, SynapseUpdate};

/// Page-issued command, decoded from a JSON-RPC call and dispatched to the
/// systems that own the affected state.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    Resize { width: u32, height: u32 },
    Render,
    UpdateSynapse(SynapseUpdate),
    GreyOutSections(BTreeSet<usize>),
    /// `None` clears the highlight.
    SelectSection(Option<usize>),
    SelectSynapses(Vec<String>),
    SetAbstractionThreshold(f32),
    ResetView,
    ResetAroundFirstNeuron,
    SetPostProcessing(bool),
    NavigateToSection(usize),
    ReloadSkeleton,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Method not found: {0}")]
    UnknownMethod(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}

fn parse<T: for<'de> Deserialize<'de>>(params: &Value, expected: &str) -> Result<T, CommandError> {
    serde_json::from_value(params.clone())
        .map_err(|e| CommandError::InvalidParams(format!("expected {} ({})", expected, e)))
}

#[derive(Deserialize)]
struct ResizeParams {
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct UpdateSynapseParams {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    position: Option<[f32; 3]>,
    #[serde(default, alias = "color")]
    colour: Option<SynapseColour>,
    #[serde(default)]
    size: Option<f32>,
    #[serde(default)]
    persist: bool,
}

#[derive(Deserialize)]
struct SectionsParams {
    sections: BTreeSet<usize>,
}

#[derive(Deserialize)]
struct SelectSectionParams {
    section: Option<usize>,
}

#[derive(Deserialize)]
struct NavigateParams {
    section: usize,
}

#[derive(Deserialize)]
struct ThresholdParams {
    threshold: f32,
}

#[derive(Deserialize)]
struct PostProcessingParams {
    enabled: bool,
}

fn synapse_key(id: Option<Value>, index: Option<usize>) -> Result<SynapseKey, CommandError> {
    match (id, index) {
        (Some(Value::String(id)), _) => Ok(SynapseKey::Id(id)),
        (Some(Value::Number(number)), _) => Ok(SynapseKey::Id(number.to_string())),
        (Some(Value::Null) | None, Some(index)) => Ok(SynapseKey::Index(index)),
        (Some(other), _) => Err(CommandError::InvalidParams(format!(
            "unsupported synapse id {}",
            other
        ))),
        (None, None) => Err(CommandError::InvalidParams(
            "expected 'id' or 'index'".to_string(),
        )),
    }
}

impl ViewerCommand {
    pub fn from_rpc(method: &str, params: &Value) -> Result<Self, CommandError> {
        match method {
            "resize" => {
                let size: ResizeParams = parse(params, "'width' and 'height'")?;
                if !(size.width > 0.0 && size.height > 0.0) {
                    return Err(CommandError::InvalidParams(format!(
                        "viewport {}x{} has no area",
                        size.width, size.height
                    )));
                }
                Ok(ViewerCommand::Resize {
                    width: size.width.round() as u32,
                    height: size.height.round() as u32,
                })
            }
            "render" => Ok(ViewerCommand::Render),
            "update_synapse" => {
                let update: UpdateSynapseParams = parse(params, "a synapse update")?;
                Ok(ViewerCommand::UpdateSynapse(SynapseUpdate {
                    key: synapse_key(update.id, update.index)?,
                    position: update.position.map(Vec3::from_array),
                    colour: update.colour,
                    size: update.size,
                    persist: update.persist,
                }))
            }
            "grey_out_sections" => {
                let sections: SectionsParams = parse(params, "'sections'")?;
                Ok(ViewerCommand::GreyOutSections(sections.sections))
            }
            "select_section" => {
                let selection: SelectSectionParams = parse(params, "'section'")?;
                Ok(ViewerCommand::SelectSection(selection.section))
            }
            "select_synapses" => {
                let ids = match params {
                    Value::Object(fields) => fields.get("ids").cloned().unwrap_or(Value::Null),
                    other => other.clone(),
                };
                ids_from_value(ids)
                    .map(ViewerCommand::SelectSynapses)
                    .map_err(CommandError::InvalidParams)
            }
            "set_abstraction_threshold" => {
                let threshold: ThresholdParams = parse(params, "'threshold'")?;
                if !threshold.threshold.is_finite() {
                    return Err(CommandError::InvalidParams(
                        "threshold must be finite".to_string(),
                    ));
                }
                Ok(ViewerCommand::SetAbstractionThreshold(
                    threshold.threshold.clamp(0.0, 1.0),
                ))
            }
            "reset_view" => Ok(ViewerCommand::ResetView),
            "reset_around_first_neuron" => Ok(ViewerCommand::ResetAroundFirstNeuron),
            "set_post_processing" => {
                let toggle: PostProcessingParams = parse(params, "'enabled'")?;
                Ok(ViewerCommand::SetPostProcessing(toggle.enabled))
            }
            "navigate_to_section" => {
                let target: NavigateParams = parse(params, "'section'")?;
                Ok(ViewerCommand::NavigateToSection(target.section))
            }
            "reload_skeleton" => Ok(ViewerCommand::ReloadSkeleton),
            _ => Err(CommandError::UnknownMethod(method.to_string())),
        }
    }
}
