pub const SYNAPSE_GREEN: [f32; 3] = [0.0, 0.8, 0.2];
pub const SYNAPSE_YELLOW: [f32; 3] = [1.0, 0.85, 0.0];
pub const SYNAPSE_RED: [f32; 3] = [0.9, 0.1, 0.1];

/// Point size of a synapse that is neither active nor selected.
pub const DEFAULT_SYNAPSE_SIZE: f32 = 12.0;

/// Point size of active synapses.
pub const ACTIVE_SYNAPSE_SIZE: f32 = 24.0;

/// Alpha of inactive synapses while some other synapse is active.
pub const INACTIVE_SYNAPSE_ALPHA: f32 = 0.3;

/// Session storage key holding the synapse label map.
pub const SYNAPSE_LABEL_STORAGE_KEY: &str = "synapse_labels";
