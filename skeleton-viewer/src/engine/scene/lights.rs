use bevy::prelude::*;

use crate::engine::render::materials::{
    ConeImposterMaterial, IMPOSTER_LIGHT, ParticleImposterMaterial,
};
use crate::engine::scene::skeleton_scene::ImposterMaterials;

/// Camera-mounted key light. The imposter shaders shade in view space, so the
/// light's local transform is already its view-space direction.
#[derive(Component, Debug, Clone, Copy)]
pub struct ImposterLight {
    /// Ambient term in [0, 1] under the diffuse contribution.
    pub ambient: f32,
}

pub fn spawn_headlight(commands: &mut Commands, main_camera: Entity) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: false,
            ..default()
        },
        Transform::default().looking_to(-IMPOSTER_LIGHT.truncate(), Vec3::Y),
        ImposterLight {
            ambient: IMPOSTER_LIGHT.w,
        },
        ChildOf(main_camera),
    ));
}

/// Direction towards the light (xyz) and ambient term (w), as the shaders expect.
pub fn view_space_light(transform: &Transform, light: &ImposterLight) -> Vec4 {
    transform.back().as_vec3().extend(light.ambient)
}

pub fn sync_imposter_light(
    lights: Query<(&Transform, &ImposterLight), Changed<Transform>>,
    materials: Option<Res<ImposterMaterials>>,
    mut particles: ResMut<Assets<ParticleImposterMaterial>>,
    mut cones: ResMut<Assets<ConeImposterMaterial>>,
) {
    let Some(materials) = materials else {
        return;
    };
    let Ok((transform, light)) = lights.single() else {
        return;
    };

    let value = view_space_light(transform, light);
    if let Some(material) = particles.get_mut(&materials.particles) {
        material.light = value;
    }
    if let Some(material) = cones.get_mut(&materials.cones) {
        material.light = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headlight_points_along_the_default_light() {
        let transform = Transform::default().looking_to(-IMPOSTER_LIGHT.truncate(), Vec3::Y);
        let value = view_space_light(&transform, &ImposterLight { ambient: 0.35 });

        let expected = IMPOSTER_LIGHT.truncate().normalize();
        assert!((value.truncate() - expected).length() < 1e-5);
        assert_eq!(value.w, 0.35);
    }
}
