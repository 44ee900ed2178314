/// Vertical field of view used when no page setting overrides it (degrees).
pub const DEFAULT_FOV_DEGREES: f32 = 45.0;

/// Closest the orbit camera may dolly towards its target.
pub const MIN_ORBIT_DISTANCE: f32 = 15.0;

/// Edge length of the largest volume the viewer frames. Also the max orbit distance.
pub const DEFAULT_MAX_VOLUME_SIZE: f32 = 100_000.0;

/// Near plane as a fraction of the framing distance after a refocus.
pub const NEAR_PLANE_FACTOR: f32 = 0.01;

/// Lower bound for the refocused near plane.
pub const MIN_NEAR_PLANE: f32 = 0.1;

/// Far plane as a multiple of the framing distance after a refocus.
pub const FAR_PLANE_FACTOR: f32 = 20.0;

/// Radians of orbit per pixel of pointer drag.
pub const ORBIT_SPEED: f32 = 0.005;

/// Dolly factor applied per wheel line.
pub const ZOOM_STEP: f32 = 0.95;

/// Delay before a refocus is retried when the camera is not yet set up (milliseconds).
pub const REFOCUS_RETRY_DELAY_MS: u64 = 500;

/// Settling delay applied to container resize requests (milliseconds).
pub const RESIZE_DEBOUNCE_MS: u64 = 100;
