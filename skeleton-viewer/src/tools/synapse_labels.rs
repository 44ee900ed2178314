use std::collections::{BTreeMap, BTreeSet, HashMap};

use bevy::prelude::*;
use bevy::window::RequestRedraw;
use serde::{Deserialize, Serialize};

use constants::synapse::{
    ACTIVE_SYNAPSE_SIZE, DEFAULT_SYNAPSE_SIZE, INACTIVE_SYNAPSE_ALPHA, SYNAPSE_GREEN,
    SYNAPSE_LABEL_STORAGE_KEY, SYNAPSE_RED, SYNAPSE_YELLOW,
};

use super::refocus::{RefocusRetry, request_refocus};
use super::session_store::{SessionStorage, SessionStore};
use crate::engine::assets::page_data::PageData;
use crate::engine::camera::orbit_camera::OrbitController;
use crate::engine::mesh::synapse_mesh::SynapseBuffer;
use crate::error::ViewerError;
use crate::rpc::commands::ViewerCommand;

/// Stable synapse identifier, from the page or derived from the coordinates.
pub type SynapseId = String;

/// Proofreading verdict on a synapse. Synapses nobody has labelled are yellow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynapseLabel {
    Green,
    #[default]
    Yellow,
    Red,
}

impl SynapseLabel {
    pub fn colour(self) -> [f32; 3] {
        match self {
            SynapseLabel::Green => SYNAPSE_GREEN,
            SynapseLabel::Yellow => SYNAPSE_YELLOW,
            SynapseLabel::Red => SYNAPSE_RED,
        }
    }
}

/// How the page names a synapse in a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynapseKey {
    Id(SynapseId),
    Index(usize),
}

/// A label (recoloured and persisted as such) or a raw RGB override.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SynapseColour {
    Label(SynapseLabel),
    Rgb([f32; 3]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynapseUpdate {
    pub key: SynapseKey,
    pub position: Option<Vec3>,
    pub colour: Option<SynapseColour>,
    pub size: Option<f32>,
    /// Write the label map to session storage after applying.
    pub persist: bool,
}

/// Synapse cloud render state plus the label map it is coloured from.
#[derive(Resource, Debug, Clone, Default)]
pub struct SynapseCloudState {
    ids: Vec<SynapseId>,
    labels: BTreeMap<SynapseId, SynapseLabel>,
    active: BTreeSet<usize>,
    colour_overrides: Vec<Option<[f32; 3]>>,
    size_overrides: Vec<Option<f32>>,
    buffer: SynapseBuffer,
}

impl SynapseCloudState {
    pub fn from_page(page: &PageData) -> Result<Self, ViewerError> {
        let buffer = SynapseBuffer::from_flat_coordinates(&page.synapse_cloud)?;
        let count = buffer.len();

        let ids = match &page.synapse_ids {
            Some(ids) if ids.len() == count => ids.clone(),
            Some(ids) => {
                warn!(
                    "Page lists {} synapse ids for {} synapses, deriving ids from coordinates",
                    ids.len(),
                    count
                );
                derive_ids(&buffer.positions)
            }
            None => derive_ids(&buffer.positions),
        };

        let mut state = Self {
            ids,
            labels: BTreeMap::new(),
            active: BTreeSet::new(),
            colour_overrides: vec![None; count],
            size_overrides: vec![None; count],
            buffer,
        };
        state.set_active_ids(&page.active_synapse_ids);
        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &SynapseBuffer {
        &self.buffer
    }

    pub fn id_at(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// Ids are matched first; a numeric string falls back to a positional index.
    pub fn resolve(&self, key: &SynapseKey) -> Option<usize> {
        match key {
            SynapseKey::Id(id) => self.ids.iter().position(|known| known == id).or_else(|| {
                id.parse::<usize>()
                    .ok()
                    .filter(|index| *index < self.len())
            }),
            SynapseKey::Index(index) => (*index < self.len()).then_some(*index),
        }
    }

    pub fn label(&self, index: usize) -> SynapseLabel {
        self.ids
            .get(index)
            .and_then(|id| self.labels.get(id))
            .copied()
            .unwrap_or_default()
    }

    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.iter().copied()
    }

    pub fn first_active_position(&self) -> Option<Vec3> {
        self.active
            .first()
            .and_then(|index| self.buffer.positions.get(*index))
            .copied()
    }

    /// Replace the active selection. Returns how many ids resolved.
    pub fn set_active_ids(&mut self, ids: &[String]) -> usize {
        self.active = ids
            .iter()
            .filter_map(|id| self.resolve(&SynapseKey::Id(id.clone())))
            .collect();
        self.apply_visuals();
        self.active.len()
    }

    pub fn update(&mut self, update: &SynapseUpdate) -> Result<usize, ViewerError> {
        let index = self
            .resolve(&update.key)
            .ok_or_else(|| ViewerError::Payload(format!("unknown synapse {:?}", update.key)))?;

        if let Some(position) = update.position {
            self.buffer.positions[index] = position;
        }

        match update.colour {
            Some(SynapseColour::Label(label)) => {
                if let Some(id) = self.ids.get(index) {
                    self.labels.insert(id.clone(), label);
                }
                self.colour_overrides[index] = None;
            }
            Some(SynapseColour::Rgb(rgb)) => self.colour_overrides[index] = Some(rgb),
            None => {}
        }

        if let Some(size) = update.size {
            self.size_overrides[index] = Some(size);
        }

        self.apply_visuals();
        Ok(index)
    }

    /// Recompute colour, size and alpha from labels, overrides and the selection.
    pub fn apply_visuals(&mut self) {
        let any_active = !self.active.is_empty();
        for index in 0..self.len() {
            let active = self.active.contains(&index);
            self.buffer.colours[index] =
                self.colour_overrides[index].unwrap_or_else(|| self.label(index).colour());
            self.buffer.sizes[index] = self.size_overrides[index].unwrap_or(if active {
                ACTIVE_SYNAPSE_SIZE
            } else {
                DEFAULT_SYNAPSE_SIZE
            });
            self.buffer.alphas[index] = if !any_active || active {
                1.0
            } else {
                INACTIVE_SYNAPSE_ALPHA
            };
        }
    }

    /// Sprites for the on-top marker: active synapses only, fully opaque.
    pub fn active_marker(&self) -> SynapseBuffer {
        let mut marker = SynapseBuffer::default();
        for index in self.active_indices() {
            marker.positions.push(self.buffer.positions[index]);
            marker.colours.push(self.buffer.colours[index]);
            marker.sizes.push(ACTIVE_SYNAPSE_SIZE);
            marker.alphas.push(1.0);
        }
        marker
    }

    /// Write the whole label map, including labels from other pages of the session.
    pub fn persist_labels(&self, store: &dyn SessionStore) -> Result<(), ViewerError> {
        let json = serde_json::to_string(&self.labels)
            .map_err(|e| ViewerError::Storage(e.to_string()))?;
        store.set(SYNAPSE_LABEL_STORAGE_KEY, &json)
    }

    pub fn restore_labels(&mut self, store: &dyn SessionStore) -> Result<usize, ViewerError> {
        let Some(json) = store.get(SYNAPSE_LABEL_STORAGE_KEY)? else {
            return Ok(0);
        };
        self.labels = serde_json::from_str(&json)
            .map_err(|e| ViewerError::Storage(format!("label map unreadable: {}", e)))?;
        self.apply_visuals();
        Ok(self.labels.len())
    }

    pub fn clear_labels(&mut self, store: &dyn SessionStore) -> Result<(), ViewerError> {
        self.labels.clear();
        self.apply_visuals();
        store.remove(SYNAPSE_LABEL_STORAGE_KEY)
    }
}

/// Identifiers for synapses the page did not name, built from the coordinates.
/// Repeated coordinates get a `_n` suffix so each synapse keeps its own label.
pub fn derive_ids(positions: &[Vec3]) -> Vec<SynapseId> {
    let mut repeats: HashMap<SynapseId, usize> = HashMap::new();
    positions
        .iter()
        .map(|position| {
            let base = format!("{}_{}_{}", position.x, position.y, position.z);
            let seen = repeats.entry(base.clone()).or_insert(0);
            let id = match *seen {
                0 => base,
                n => format!("{}_{}", base, n),
            };
            *seen += 1;
            id
        })
        .collect()
}

pub fn handle_synapse_commands(
    mut events: EventReader<ViewerCommand>,
    mut state: ResMut<SynapseCloudState>,
    storage: Res<SessionStorage>,
    mut controller: ResMut<OrbitController>,
    mut retry: ResMut<RefocusRetry>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    for command in events.read() {
        match command {
            ViewerCommand::UpdateSynapse(update) => match state.update(update) {
                Ok(index) => {
                    if update.persist {
                        if let Err(e) = state.persist_labels(storage.0.as_ref()) {
                            error!("Synapse labels not persisted: {}", e);
                        }
                    }
                    debug!("Synapse {} updated", index);
                    redraw.write(RequestRedraw);
                }
                Err(e) => warn!("Synapse update ignored: {}", e),
            },
            ViewerCommand::SelectSynapses(ids) => {
                let resolved = state.set_active_ids(ids);
                if resolved < ids.len() {
                    warn!("{} of {} active synapse ids unknown", ids.len() - resolved, ids.len());
                }
                if let Some(point) = state.first_active_position() {
                    if request_refocus(controller.bypass_change_detection(), &mut retry, point) {
                        controller.set_changed();
                    }
                }
                redraw.write(RequestRedraw);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::session_store::MemorySessionStore;

    fn page() -> PageData {
        PageData {
            synapse_cloud: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0],
            synapse_ids: Some(vec!["a".into(), "b".into(), "c".into()]),
            ..PageData::default()
        }
    }

    fn label_update(id: &str, label: SynapseLabel) -> SynapseUpdate {
        SynapseUpdate {
            key: SynapseKey::Id(id.to_string()),
            position: None,
            colour: Some(SynapseColour::Label(label)),
            size: None,
            persist: true,
        }
    }

    #[test]
    fn unlabelled_synapses_are_yellow() {
        let state = SynapseCloudState::from_page(&page()).unwrap();
        assert_eq!(state.label(1), SynapseLabel::Yellow);
        assert_eq!(state.buffer().colours[1], SYNAPSE_YELLOW);
        assert_eq!(state.buffer().alphas, vec![1.0; 3]);
    }

    #[test]
    fn labels_survive_a_reload_through_session_storage() {
        let store = MemorySessionStore::default();
        let mut state = SynapseCloudState::from_page(&page()).unwrap();
        state.update(&label_update("b", SynapseLabel::Green)).unwrap();
        state.persist_labels(&store).unwrap();

        let mut reloaded = SynapseCloudState::from_page(&page()).unwrap();
        assert_eq!(reloaded.restore_labels(&store).unwrap(), 1);
        assert_eq!(reloaded.label(1), SynapseLabel::Green);
        assert_eq!(reloaded.buffer().colours[1], SYNAPSE_GREEN);
    }

    #[test]
    fn labels_follow_ids_not_positions() {
        let store = MemorySessionStore::default();
        let mut state = SynapseCloudState::from_page(&page()).unwrap();
        state.update(&label_update("c", SynapseLabel::Red)).unwrap();
        state.persist_labels(&store).unwrap();

        let mut reordered = page();
        reordered.synapse_cloud = vec![2.0, 2.0, 2.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        reordered.synapse_ids = Some(vec!["c".into(), "a".into(), "b".into()]);
        let mut reloaded = SynapseCloudState::from_page(&reordered).unwrap();
        reloaded.restore_labels(&store).unwrap();
        assert_eq!(reloaded.label(0), SynapseLabel::Red);
        assert_eq!(reloaded.label(2), SynapseLabel::Yellow);
    }

    #[test]
    fn initial_load_clears_stored_labels() {
        let store = MemorySessionStore::default();
        let mut state = SynapseCloudState::from_page(&page()).unwrap();
        state.update(&label_update("a", SynapseLabel::Green)).unwrap();
        state.persist_labels(&store).unwrap();

        state.clear_labels(&store).unwrap();
        assert_eq!(state.label(0), SynapseLabel::Yellow);
        assert_eq!(store.get(SYNAPSE_LABEL_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn active_selection_dims_the_rest() {
        let mut state = SynapseCloudState::from_page(&page()).unwrap();
        assert_eq!(state.set_active_ids(&["b".to_string()]), 1);

        let buffer = state.buffer();
        assert_eq!(buffer.alphas, vec![INACTIVE_SYNAPSE_ALPHA, 1.0, INACTIVE_SYNAPSE_ALPHA]);
        assert_eq!(buffer.sizes[1], ACTIVE_SYNAPSE_SIZE);
        assert_eq!(buffer.sizes[0], DEFAULT_SYNAPSE_SIZE);
        assert_eq!(state.first_active_position(), Some(Vec3::ONE));
        assert_eq!(state.active_marker().len(), 1);

        state.set_active_ids(&[]);
        assert_eq!(state.buffer().alphas, vec![1.0; 3]);
    }

    #[test]
    fn numeric_ids_fall_back_to_index() {
        let mut without_ids = page();
        without_ids.synapse_ids = None;
        let state = SynapseCloudState::from_page(&without_ids).unwrap();
        assert_eq!(state.id_at(1), Some("1_1_1"));
        assert_eq!(state.resolve(&SynapseKey::Id("2".into())), Some(2));
        assert_eq!(state.resolve(&SynapseKey::Id("1_1_1".into())), Some(1));
        assert_eq!(state.resolve(&SynapseKey::Index(3)), None);
    }

    #[test]
    fn coincident_synapses_get_their_own_ids() {
        let mut stacked = page();
        stacked.synapse_ids = None;
        stacked.synapse_cloud = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        let mut state = SynapseCloudState::from_page(&stacked).unwrap();

        assert_eq!(state.id_at(0), Some("1_1_1"));
        assert_eq!(state.id_at(1), Some("1_1_1_1"));
        assert_eq!(state.id_at(2), Some("2_2_2"));
        assert_eq!(state.resolve(&SynapseKey::Id("1_1_1_1".into())), Some(1));

        state.update(&label_update("1_1_1_1", SynapseLabel::Red)).unwrap();
        assert_eq!(state.label(0), SynapseLabel::Yellow);
        assert_eq!(state.label(1), SynapseLabel::Red);
    }

    #[test]
    fn rgb_and_size_overrides_apply_immediately() {
        let mut state = SynapseCloudState::from_page(&page()).unwrap();
        state
            .update(&SynapseUpdate {
                key: SynapseKey::Index(0),
                position: Some(Vec3::new(9.0, 9.0, 9.0)),
                colour: Some(SynapseColour::Rgb([0.1, 0.2, 0.3])),
                size: Some(40.0),
                persist: false,
            })
            .unwrap();

        let buffer = state.buffer();
        assert_eq!(buffer.positions[0], Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(buffer.colours[0], [0.1, 0.2, 0.3]);
        assert_eq!(buffer.sizes[0], 40.0);
        assert_eq!(state.label(0), SynapseLabel::Yellow);
    }

    #[test]
    fn unknown_synapse_is_rejected() {
        let mut state = SynapseCloudState::from_page(&page()).unwrap();
        let result = state.update(&label_update("zzz", SynapseLabel::Red));
        assert!(matches!(result, Err(ViewerError::Payload(_))));
    }
}
