use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, RequestRedraw};

use constants::camera::{
    FAR_PLANE_FACTOR, MIN_NEAR_PLANE, MIN_ORBIT_DISTANCE, NEAR_PLANE_FACTOR, ORBIT_SPEED,
    ZOOM_STEP,
};

use crate::engine::assets::bounds::{BoundingSphere, compute_camera_position};
use crate::engine::assets::page_data::{SavedCameraPose, ViewerSettings};
use crate::engine::scene::skeleton_scene::{LoadedSkeletons, SkeletonEntry};
use crate::error::ViewerError;
use crate::rpc::commands::ViewerCommand;
use crate::rpc::web_rpc::WebRpcInterface;

/// Marks the camera driven by the orbit controller.
#[derive(Component)]
pub struct MainCamera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Orbit,
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrbitState {
    #[default]
    Idle,
    Dragging(DragMode),
    /// Moving to a new target. Transitions snap, so this never outlives a call.
    AnimatingToTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl CameraPose {
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 100.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Orbit camera state for the single viewer in the page.
///
/// Methods that move the camera return `true` when the pose changed so the
/// calling system can flag the resource for `apply_camera_pose`.
#[derive(Resource, Debug, Clone)]
pub struct OrbitController {
    state: OrbitState,
    pose: CameraPose,
    default_pose: CameraPose,
    fov_degrees: f32,
    near: f32,
    far: f32,
    max_distance: f32,
    initialised: bool,
}

impl OrbitController {
    pub fn new(fov_degrees: f32, max_volume_size: f32) -> Self {
        let pose = CameraPose::default();
        let mut controller = Self {
            state: OrbitState::Idle,
            pose,
            default_pose: pose,
            fov_degrees,
            near: MIN_NEAR_PLANE,
            far: 1.0,
            max_distance: max_volume_size.max(MIN_ORBIT_DISTANCE),
            initialised: false,
        };
        controller.update_clip_planes();
        controller
    }

    pub fn state(&self) -> OrbitState {
        self.state
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn default_pose(&self) -> CameraPose {
        self.default_pose
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn distance(&self) -> f32 {
        self.pose.distance()
    }

    /// True once a skeleton framing or a saved pose has been applied.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn set_fov(&mut self, fov_degrees: f32, max_volume_size: f32) {
        self.fov_degrees = fov_degrees;
        self.max_distance = max_volume_size.max(MIN_ORBIT_DISTANCE);
    }

    pub fn pointer_down(&mut self, mode: DragMode) {
        self.state = OrbitState::Dragging(mode);
    }

    pub fn pointer_up(&mut self) {
        self.state = OrbitState::Idle;
    }

    /// Apply a pointer drag of `delta` pixels according to the current drag mode.
    pub fn apply_drag(&mut self, delta: Vec2, viewport_height: f32) -> bool {
        match self.state {
            OrbitState::Dragging(DragMode::Orbit) => self.orbit(delta),
            OrbitState::Dragging(DragMode::Pan) => self.pan(delta, viewport_height),
            OrbitState::Idle | OrbitState::AnimatingToTarget => false,
        }
    }

    /// Rotate around the target. Up rotates with the camera, so there is no pole lock.
    pub fn orbit(&mut self, delta: Vec2) -> bool {
        if delta == Vec2::ZERO {
            return false;
        }

        let offset = self.pose.position - self.pose.target;
        let forward = self.pose.forward();
        let right = forward.cross(self.pose.up).normalize_or(Vec3::X);

        let yaw = Quat::from_axis_angle(self.pose.up, -delta.x * ORBIT_SPEED);
        let pitch = Quat::from_axis_angle(right, -delta.y * ORBIT_SPEED);
        let rotation = yaw * pitch;

        self.pose.position = self.pose.target + rotation * offset;
        let up = rotation * self.pose.up;
        let forward = self.pose.forward();
        self.pose.up = (up - forward * up.dot(forward)).normalize_or(Vec3::Y);
        true
    }

    /// Translate camera and target together in the view plane.
    pub fn pan(&mut self, delta: Vec2, viewport_height: f32) -> bool {
        if delta == Vec2::ZERO || viewport_height <= 0.0 {
            return false;
        }

        let half_fov = (self.fov_degrees * 0.5).to_radians();
        let world_per_pixel = 2.0 * self.distance() * half_fov.tan() / viewport_height;

        let forward = self.pose.forward();
        let right = forward.cross(self.pose.up).normalize_or(Vec3::X);
        let camera_up = right.cross(forward);
        let shift = (-delta.x * right + delta.y * camera_up) * world_per_pixel;

        self.pose.position += shift;
        self.pose.target += shift;
        true
    }

    /// Dolly by `ZOOM_STEP` per wheel line, keeping the distance in range.
    /// Near and far follow the new distance.
    pub fn zoom(&mut self, lines: f32) -> bool {
        if lines.abs() <= f32::EPSILON {
            return false;
        }

        let offset = self.pose.position - self.pose.target;
        let distance = offset.length();
        let new_distance =
            (distance * ZOOM_STEP.powf(lines)).clamp(MIN_ORBIT_DISTANCE, self.max_distance);
        if (new_distance - distance).abs() <= f32::EPSILON {
            return false;
        }

        self.pose.position =
            self.pose.target + offset.normalize_or(Vec3::Z) * new_distance;
        self.update_clip_planes();
        true
    }

    /// Return to the default pose with a level horizon.
    pub fn reset_view(&mut self) -> bool {
        self.state = OrbitState::Idle;
        self.pose = CameraPose {
            up: Vec3::Y,
            ..self.default_pose
        };
        true
    }

    /// Frame `sphere` and make that framing the new default pose.
    pub fn reset_around(
        &mut self,
        sphere: &BoundingSphere,
        front_to_back: bool,
        max_volume_size: f32,
    ) -> bool {
        self.state = OrbitState::AnimatingToTarget;
        self.max_distance = max_volume_size.max(MIN_ORBIT_DISTANCE);
        let position =
            compute_camera_position(self.fov_degrees, sphere, front_to_back, max_volume_size);

        self.pose = CameraPose {
            position,
            target: sphere.center,
            up: Vec3::Y,
        };
        self.default_pose = self.pose;
        self.update_clip_planes();
        self.initialised = true;
        self.state = OrbitState::Idle;
        true
    }

    /// Recentre the orbit on `point`, keeping the viewing direction and distance.
    pub fn refocus(&mut self, point: Vec3) -> Result<bool, ViewerError> {
        if !self.initialised {
            return Err(ViewerError::UninitializedController);
        }

        self.state = OrbitState::AnimatingToTarget;
        let offset = self.pose.position - self.pose.target;
        self.pose.target = point;
        self.pose.position = point + offset;
        self.update_clip_planes();
        self.state = OrbitState::Idle;
        Ok(true)
    }

    /// Pose in the shape the page stores between visits.
    pub fn save_pose(&self) -> SavedCameraPose {
        SavedCameraPose {
            position: self.pose.position.to_array(),
            target: self.pose.target.to_array(),
        }
    }

    pub fn restore_pose(&mut self, saved: &SavedCameraPose) -> bool {
        self.pose = CameraPose {
            position: Vec3::from_array(saved.position),
            target: Vec3::from_array(saved.target),
            up: Vec3::Y,
        };
        self.update_clip_planes();
        self.initialised = true;
        true
    }

    fn update_clip_planes(&mut self) {
        let distance = self.distance();
        self.near = (distance * NEAR_PLANE_FACTOR).max(MIN_NEAR_PLANE);
        self.far = (distance * FAR_PLANE_FACTOR).max(self.near * 2.0);
    }
}

pub fn orbit_camera_controller(
    mut controller: ResMut<OrbitController>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let cursor_inside = window.cursor_position().is_some();

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }

    let mut moved = false;
    {
        let controller = controller.bypass_change_detection();

        if cursor_inside {
            if mouse_button.just_pressed(MouseButton::Left) {
                controller.pointer_down(DragMode::Orbit);
            } else if mouse_button.just_pressed(MouseButton::Right) {
                controller.pointer_down(DragMode::Pan);
            }
        }

        if !mouse_button.any_pressed([MouseButton::Left, MouseButton::Right])
            && matches!(controller.state(), OrbitState::Dragging(_))
        {
            controller.pointer_up();
        }

        if mouse_delta != Vec2::ZERO {
            moved |= controller.apply_drag(mouse_delta, window.height());
        }

        if cursor_inside {
            moved |= controller.zoom(scroll_accum);
        }
    }

    if moved {
        controller.set_changed();
    }
}

pub fn handle_camera_commands(
    mut events: EventReader<ViewerCommand>,
    mut controller: ResMut<OrbitController>,
    loaded: Res<LoadedSkeletons>,
    entries: Query<&SkeletonEntry>,
    settings: Res<ViewerSettings>,
) {
    for command in events.read() {
        match command {
            ViewerCommand::ResetView => {
                controller.reset_view();
            }
            ViewerCommand::ResetAroundFirstNeuron => {
                let Some(entry) = loaded.first().and_then(|entry| entries.get(entry).ok()) else {
                    warn!("{}", ViewerError::MissingSceneObject("first neuron"));
                    continue;
                };
                controller.reset_around(
                    &entry.sphere,
                    settings.front_to_back,
                    settings.max_volume_size,
                );
            }
            _ => {}
        }
    }
}

/// Push the controller pose to the camera and tell the page where it is.
pub fn apply_camera_pose(
    controller: Res<OrbitController>,
    mut cameras: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
    mut redraw: EventWriter<RequestRedraw>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !controller.is_changed() {
        return;
    }

    let Ok((mut transform, mut projection)) = cameras.single_mut() else {
        warn!("{}", ViewerError::MissingSceneObject("main camera"));
        return;
    };

    let pose = controller.pose();
    *transform = Transform::from_translation(pose.position).looking_at(pose.target, pose.up);

    if let Projection::Perspective(perspective) = projection.as_mut() {
        perspective.fov = controller.fov_degrees().to_radians();
        perspective.near = controller.near();
        perspective.far = controller.far();
    }

    redraw.write(RequestRedraw);

    if controller.is_initialised() {
        match serde_json::to_value(controller.save_pose()) {
            Ok(saved) => rpc_interface.send_notification("camera_changed", saved),
            Err(e) => error!("Camera pose not reported: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-3;

    fn framed() -> OrbitController {
        let mut controller = OrbitController::new(60.0, 1_000.0);
        controller.reset_around(
            &BoundingSphere {
                center: Vec3::new(5.0, 5.0, 5.0),
                radius: 50.0,
            },
            false,
            1_000.0,
        );
        controller
    }

    #[test]
    fn pointer_events_drive_drag_state() {
        let mut controller = framed();
        assert_eq!(controller.state(), OrbitState::Idle);
        assert!(!controller.apply_drag(Vec2::new(10.0, 0.0), 600.0));

        controller.pointer_down(DragMode::Orbit);
        assert_eq!(controller.state(), OrbitState::Dragging(DragMode::Orbit));
        assert!(controller.apply_drag(Vec2::new(10.0, 0.0), 600.0));

        controller.pointer_up();
        assert_eq!(controller.state(), OrbitState::Idle);
    }

    #[test]
    fn orbit_keeps_distance_and_passes_the_poles() {
        let mut controller = framed();
        let distance = controller.distance();
        let start = controller.pose().position - controller.pose().target;

        // Half a turn vertically goes over the top without clamping.
        let half_turn = std::f32::consts::PI / ORBIT_SPEED;
        controller.orbit(Vec2::new(0.0, half_turn));

        let end = controller.pose().position - controller.pose().target;
        assert!((controller.distance() - distance).abs() < EPSILON * distance);
        assert!((end + start).length() < EPSILON * distance);
        assert!(controller.pose().up.dot(Vec3::Y) < 0.0);
    }

    #[test]
    fn pan_moves_target_with_camera() {
        let mut controller = framed();
        let before = controller.pose();
        controller.pan(Vec2::new(25.0, -10.0), 600.0);
        let after = controller.pose();

        let shift = after.target - before.target;
        assert!(shift.length() > 0.0);
        assert!((after.position - before.position - shift).length() < EPSILON);
        assert!((controller.distance() - before.distance()).abs() < EPSILON);
    }

    #[test]
    fn zoom_is_clamped_to_orbit_range() {
        let mut controller = framed();
        for _ in 0..500 {
            controller.zoom(1.0);
        }
        assert!((controller.distance() - MIN_ORBIT_DISTANCE).abs() < EPSILON);

        for _ in 0..500 {
            controller.zoom(-1.0);
        }
        assert!((controller.distance() - 1_000.0).abs() < 0.1);
    }

    #[test]
    fn clip_planes_follow_zoom() {
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 50.0,
        };
        let mut controller = OrbitController::new(60.0, 100_000.0);
        controller.reset_around(&sphere, false, 100_000.0);
        let framing_far = controller.far();

        for _ in 0..100 {
            controller.zoom(-1.0);
        }
        let distance = controller.distance();
        assert!(distance > framing_far);
        assert!((controller.far() - distance * FAR_PLANE_FACTOR).abs() < 1.0);
        assert!((controller.near() - distance * NEAR_PLANE_FACTOR).abs() < EPSILON * distance);

        for _ in 0..200 {
            controller.zoom(1.0);
        }
        assert!((controller.far() - MIN_ORBIT_DISTANCE * FAR_PLANE_FACTOR).abs() < EPSILON);
    }

    #[test]
    fn reset_view_returns_to_framing_with_level_up() {
        let mut controller = framed();
        let framing = controller.pose();
        controller.orbit(Vec2::new(120.0, 340.0));
        controller.pan(Vec2::new(40.0, 40.0), 600.0);

        assert!(controller.reset_view());
        let pose = controller.pose();
        assert_eq!(pose.position, framing.position);
        assert_eq!(pose.target, framing.target);
        assert_eq!(pose.up, Vec3::Y);
    }

    #[test]
    fn reset_around_frames_sphere_and_snaps() {
        let controller = framed();
        assert_eq!(controller.state(), OrbitState::Idle);
        assert!(controller.is_initialised());
        assert_eq!(controller.pose().target, Vec3::new(5.0, 5.0, 5.0));
        // radius / sin(30deg) = 100
        assert!((controller.distance() - 100.0).abs() < EPSILON);
        assert!((controller.near() - 1.0).abs() < EPSILON);
        assert!((controller.far() - 2_000.0).abs() < 0.1);
    }

    #[test]
    fn refocus_requires_initialised_controller() {
        let mut controller = OrbitController::new(45.0, 1_000.0);
        assert!(matches!(
            controller.refocus(Vec3::ONE),
            Err(ViewerError::UninitializedController)
        ));

        let mut controller = framed();
        let offset = controller.pose().position - controller.pose().target;
        controller.refocus(Vec3::new(-3.0, 2.0, 8.0)).unwrap();
        assert_eq!(controller.pose().target, Vec3::new(-3.0, 2.0, 8.0));
        assert!((controller.pose().position - controller.pose().target - offset).length() < EPSILON);
    }

    #[test]
    fn saved_pose_round_trips_through_restore() {
        let mut controller = framed();
        controller.pan(Vec2::new(30.0, 12.0), 600.0);
        let saved = controller.save_pose();

        let mut restored = OrbitController::new(60.0, 1_000.0);
        assert!(!restored.is_initialised());
        restored.restore_pose(&saved);
        assert!(restored.is_initialised());
        assert_eq!(restored.pose().position, controller.pose().position);
        assert_eq!(restored.pose().target, controller.pose().target);
    }

    #[test]
    fn near_plane_is_floored() {
        let mut controller = OrbitController::new(45.0, 1_000.0);
        controller.restore_pose(&SavedCameraPose {
            position: [0.0, 0.0, 2.0],
            target: [0.0, 0.0, 0.0],
        });
        assert_eq!(controller.near(), MIN_NEAR_PLANE);
        assert!((controller.far() - 40.0).abs() < EPSILON);
    }
}
