use std::time::Duration;

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, RequestRedraw};

use constants::camera::RESIZE_DEBOUNCE_MS;

use super::orbit_camera::MainCamera;
use crate::rpc::commands::ViewerCommand;

/// Pixel size of the viewer canvas. Width, height and aspect only change together.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    aspect: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        let mut viewport = Self {
            width: 1,
            height: 1,
            aspect: 1.0,
        };
        viewport.set_size(width, height);
        viewport
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Returns `false` and keeps the old size for a zero-area request.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        self.aspect = width as f32 / height as f32;
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Latest container size requested by the page, applied once requests settle.
#[derive(Resource, Debug)]
pub struct PendingResize {
    size: Option<(u32, u32)>,
    timer: Timer,
}

impl Default for PendingResize {
    fn default() -> Self {
        Self {
            size: None,
            timer: Timer::new(Duration::from_millis(RESIZE_DEBOUNCE_MS), TimerMode::Once),
        }
    }
}

impl PendingResize {
    pub fn request(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
        self.timer.reset();
    }

    /// Advance the debounce timer; yields the size once it has been stable long enough.
    pub fn poll(&mut self, delta: Duration) -> Option<(u32, u32)> {
        self.size?;
        self.timer.tick(delta);
        if self.timer.finished() {
            self.size.take()
        } else {
            None
        }
    }
}

pub fn handle_viewport_commands(
    mut events: EventReader<ViewerCommand>,
    mut pending: ResMut<PendingResize>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    for command in events.read() {
        match command {
            ViewerCommand::Resize { width, height } => pending.request(*width, *height),
            ViewerCommand::Render => {
                redraw.write(RequestRedraw);
            }
            _ => {}
        }
    }
}

pub fn apply_pending_resize(
    time: Res<Time>,
    mut pending: ResMut<PendingResize>,
    mut viewport: ResMut<Viewport>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
    mut redraw: EventWriter<RequestRedraw>,
) {
    let Some((width, height)) = pending.poll(time.delta()) else {
        return;
    };

    if !viewport.set_size(width, height) {
        warn!("Ignoring resize to {}x{}", width, height);
        return;
    }

    if let Ok(mut window) = windows.single_mut() {
        window.resolution.set(width as f32, height as f32);
    }

    for mut projection in &mut cameras {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = viewport.aspect();
        }
    }

    redraw.write(RequestRedraw);
    debug!("Viewport resized to {}x{}", width, height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use crate::engine::assets::bounds::{compute_bounding_box, compute_bounding_sphere};
    use crate::engine::assets::swc::parse_swc;

    #[test]
    fn resize_keeps_aspect_consistent() {
        let nodes = parse_swc("1 0 0 0 0 1 -1\n2 0 10 0 0 1 1\n").unwrap();
        let sphere = compute_bounding_sphere(&nodes, &compute_bounding_box(&nodes));

        let mut viewport = Viewport::new(800, 600);
        assert!(viewport.set_size(400, 300));
        assert_eq!(viewport.width(), 400);
        assert_eq!(viewport.height(), 300);
        assert!((viewport.aspect() - 4.0 / 3.0).abs() < 1e-6);

        let after = compute_bounding_sphere(&nodes, &compute_bounding_box(&nodes));
        assert_eq!(sphere, after);
    }

    #[test]
    fn zero_area_is_ignored() {
        let mut viewport = Viewport::new(800, 600);
        assert!(!viewport.set_size(0, 300));
        assert_eq!(viewport.width(), 800);
    }

    #[test]
    fn resize_requests_are_debounced() {
        let mut pending = PendingResize::default();
        assert_eq!(pending.poll(Duration::from_millis(500)), None);

        pending.request(640, 480);
        assert_eq!(pending.poll(Duration::from_millis(60)), None);

        pending.request(800, 600);
        assert_eq!(pending.poll(Duration::from_millis(60)), None);
        assert_eq!(pending.poll(Duration::from_millis(50)), Some((800, 600)));
        assert_eq!(pending.poll(Duration::from_millis(200)), None);
    }

    fn advance(world: &mut World, millis: u64) {
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_millis(millis));
        world.insert_resource(time);
        world
            .run_system_once(apply_pending_resize)
            .expect("resize system runs");
    }

    #[test]
    fn settled_resize_updates_window_and_projection() {
        let mut world = World::new();
        world.init_resource::<Viewport>();
        world.init_resource::<PendingResize>();
        world.init_resource::<Events<RequestRedraw>>();
        let window = world.spawn((Window::default(), PrimaryWindow)).id();
        let camera = world
            .spawn((
                Projection::Perspective(PerspectiveProjection::default()),
                MainCamera,
            ))
            .id();

        world.resource_mut::<PendingResize>().request(900, 300);
        advance(&mut world, RESIZE_DEBOUNCE_MS / 2);
        assert_eq!(world.resource::<Viewport>().width(), 1280);

        advance(&mut world, RESIZE_DEBOUNCE_MS);
        let viewport = *world.resource::<Viewport>();
        assert_eq!((viewport.width(), viewport.height()), (900, 300));
        assert!((viewport.aspect() - 3.0).abs() < 1e-6);

        let resolution = &world.get::<Window>(window).unwrap().resolution;
        assert_eq!((resolution.width(), resolution.height()), (900.0, 300.0));

        match world.get::<Projection>(camera).unwrap() {
            Projection::Perspective(perspective) => {
                assert!((perspective.aspect_ratio - viewport.aspect()).abs() < 1e-6)
            }
            other => panic!("unexpected projection {:?}", other),
        }
        assert!(!world.resource::<Events<RequestRedraw>>().is_empty());
    }
}
