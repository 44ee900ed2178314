use std::time::Duration;

use bevy::prelude::*;

use constants::camera::REFOCUS_RETRY_DELAY_MS;

use crate::engine::camera::orbit_camera::OrbitController;
use crate::error::ViewerError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefocusOutcome {
    Idle,
    Waiting,
    Apply(Vec3),
    /// Controller still not ready after the retry.
    Abandon(Vec3),
}

/// A refocus that arrived before the camera was framed, retried once.
#[derive(Resource, Debug, Default)]
pub struct RefocusRetry {
    pending: Option<(Vec3, Timer)>,
}

impl RefocusRetry {
    /// Replaces any refocus already waiting.
    pub fn schedule(&mut self, point: Vec3) {
        self.pending = Some((
            point,
            Timer::new(
                Duration::from_millis(REFOCUS_RETRY_DELAY_MS),
                TimerMode::Once,
            ),
        ));
    }

    /// Drop a waiting refocus that a direct one has superseded.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, delta: Duration, controller_ready: bool) -> RefocusOutcome {
        let Some((point, timer)) = self.pending.as_mut() else {
            return RefocusOutcome::Idle;
        };

        timer.tick(delta);
        if !timer.finished() {
            return RefocusOutcome::Waiting;
        }

        let point = *point;
        self.pending = None;
        if controller_ready {
            RefocusOutcome::Apply(point)
        } else {
            RefocusOutcome::Abandon(point)
        }
    }
}

/// Refocus now, or schedule the single retry when the controller is not ready.
/// Returns `true` when the pose moved.
pub fn request_refocus(
    controller: &mut OrbitController,
    retry: &mut RefocusRetry,
    point: Vec3,
) -> bool {
    match controller.refocus(point) {
        Ok(moved) => moved,
        Err(ViewerError::UninitializedController) => {
            debug!("Camera not framed yet, retrying refocus on {}", point);
            retry.schedule(point);
            false
        }
        Err(e) => {
            error!("Refocus failed: {}", e);
            false
        }
    }
}

pub fn retry_refocus(
    time: Res<Time>,
    mut retry: ResMut<RefocusRetry>,
    mut controller: ResMut<OrbitController>,
) {
    if !retry.is_pending() {
        return;
    }

    match retry.poll(time.delta(), controller.is_initialised()) {
        RefocusOutcome::Apply(point) => {
            if let Err(e) = controller.refocus(point) {
                error!("Refocus retry failed: {}", e);
            }
        }
        RefocusOutcome::Abandon(point) => {
            error!(
                "{}; dropping refocus on {}",
                ViewerError::UninitializedController,
                point
            );
        }
        RefocusOutcome::Idle | RefocusOutcome::Waiting => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::bounds::BoundingSphere;

    #[test]
    fn uninitialised_controller_schedules_one_retry() {
        let mut controller = OrbitController::new(45.0, 1_000.0);
        let mut retry = RefocusRetry::default();

        assert!(!request_refocus(&mut controller, &mut retry, Vec3::ONE));
        assert!(retry.is_pending());
        assert_eq!(
            retry.poll(Duration::from_millis(200), false),
            RefocusOutcome::Waiting
        );
        assert_eq!(
            retry.poll(Duration::from_millis(400), false),
            RefocusOutcome::Abandon(Vec3::ONE)
        );
        assert_eq!(
            retry.poll(Duration::from_millis(400), false),
            RefocusOutcome::Idle
        );
    }

    #[test]
    fn retry_applies_once_controller_is_framed() {
        let mut controller = OrbitController::new(45.0, 1_000.0);
        let mut retry = RefocusRetry::default();
        request_refocus(&mut controller, &mut retry, Vec3::new(1.0, 2.0, 3.0));

        controller.reset_around(
            &BoundingSphere {
                center: Vec3::ZERO,
                radius: 10.0,
            },
            false,
            1_000.0,
        );
        assert_eq!(
            retry.poll(Duration::from_millis(500), controller.is_initialised()),
            RefocusOutcome::Apply(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn framed_controller_refocuses_immediately() {
        let mut controller = OrbitController::new(45.0, 1_000.0);
        controller.reset_around(
            &BoundingSphere {
                center: Vec3::ZERO,
                radius: 10.0,
            },
            false,
            1_000.0,
        );
        let mut retry = RefocusRetry::default();
        assert!(request_refocus(&mut controller, &mut retry, Vec3::X));
        assert!(!retry.is_pending());
        assert_eq!(controller.pose().target, Vec3::X);
    }
}
