use glam::{Mat4, Quat, Vec3, Vec4};
use itertools::iproduct;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::scene_graph::{
    light::Light,
    material::Material,
    primitives,
    scene::{MeshInstance, Model, ModelInstance, Scene},
    transform::Transform,
};

#[derive(Debug, Clone)]
pub struct DemoSceneConfig {
    /// Model instances are laid out on a `grid_size` x `grid_size` grid.
    pub grid_size: u32,
    pub spacing: f32,
    pub seed: u64,
}

impl Default for DemoSceneConfig {
    fn default() -> Self {
        Self {
            grid_size: 24,
            spacing: 3.0,
            seed: 0x5eed,
        }
    }
}

/// Builds a static scene of rigid multi-mesh models scattered on a grid.
pub fn build_demo_scene(config: &DemoSceneConfig) -> Scene {
    let mut scene = Scene::new();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let stone = scene.add_material(Material::new("Stone", Vec4::new(0.55, 0.55, 0.6, 1.0)));
    let wood = scene.add_material(Material::new("Wood", Vec4::new(0.6, 0.4, 0.2, 1.0)));
    let glow = scene.add_material(Material::new("Glow", Vec4::new(1.0, 0.85, 0.4, 1.0)));
    let crystal = scene.add_material(Material::new("Crystal", Vec4::new(0.3, 0.7, 0.9, 1.0)));

    let crate_mesh = scene.add_mesh(primitives::cube("Crate", wood));
    let pole_mesh = scene.add_mesh(primitives::cube("Lamp pole", stone));
    let lamp_head_mesh = scene.add_mesh(primitives::octahedron("Lamp head", glow));
    let crystal_mesh = scene.add_mesh(primitives::octahedron("Crystal", crystal));

    let crate_model = scene.add_model(
        Model::new("Crate").with_mesh(
            crate_mesh,
            vec![MeshInstance::new(Mat4::from_translation(Vec3::Y * 0.5))],
        ),
    );

    let lamp_model = scene.add_model(
        Model::new("Lamp")
            .with_mesh(
                pole_mesh,
                vec![MeshInstance::new(Mat4::from_scale_rotation_translation(
                    Vec3::new(0.15, 2.0, 0.15),
                    Quat::IDENTITY,
                    Vec3::Y,
                ))],
            )
            .with_mesh(
                lamp_head_mesh,
                vec![MeshInstance::new(Mat4::from_scale_rotation_translation(
                    Vec3::splat(0.3),
                    Quat::IDENTITY,
                    Vec3::Y * 2.2,
                ))],
            ),
    );

    let crystal_offsets = [
        Vec3::new(0.0, 0.8, 0.0),
        Vec3::new(0.6, 0.4, 0.3),
        Vec3::new(-0.5, 0.35, -0.4),
    ];
    let crystal_model = scene.add_model(
        Model::new("Crystal cluster").with_mesh(
            crystal_mesh,
            crystal_offsets
                .iter()
                .map(|offset| {
                    MeshInstance::new(Mat4::from_scale_rotation_translation(
                        Vec3::new(0.3, 0.8, 0.3),
                        Quat::IDENTITY,
                        *offset,
                    ))
                })
                .collect(),
        ),
    );

    let models = [crate_model, lamp_model, crystal_model];
    let half_extent = (config.grid_size as f32 - 1.0) * config.spacing * 0.5;

    for (index, (x, z)) in iproduct!(0..config.grid_size, 0..config.grid_size).enumerate() {
        let model = models[index % models.len()];
        let translation = Vec3::new(
            x as f32 * config.spacing - half_extent,
            0.0,
            z as f32 * config.spacing - half_extent,
        );
        let rotation = Quat::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU));
        let scale = Vec3::splat(rng.gen_range(0.75..1.25));

        let name = format!("{} ({}, {})", scene.models[model].model.name, x, z);

        scene.add_model_instance(
            model,
            ModelInstance::new(name, Transform::new(translation, rotation, scale)),
        );
    }

    scene.add_light(Light::directional(
        Vec3::new(-0.4, -1.0, -0.3),
        Vec3::new(1.0, 0.95, 0.9),
        0.8,
    ));
    scene.add_light(Light::point(
        Vec3::new(0.0, 4.0, 0.0),
        Vec3::new(1.0, 0.6, 0.3),
        3.0,
        half_extent.max(10.0),
    ));

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::scene::SceneGraph;

    #[test]
    fn grid_fills_every_cell() {
        let config = DemoSceneConfig {
            grid_size: 4,
            ..Default::default()
        };
        let scene = build_demo_scene(&config);

        let instances: usize = (0..scene.model_count())
            .map(|model| scene.model_instance_count(model))
            .sum();
        assert_eq!(instances, 16);
        assert_eq!(scene.lights().len(), 2);
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let config = DemoSceneConfig::default();
        let a = build_demo_scene(&config);
        let b = build_demo_scene(&config);

        for model in 0..a.model_count() {
            for instance in 0..a.model_instance_count(model) {
                assert_eq!(
                    a.model_instance(model, instance).matrix(),
                    b.model_instance(model, instance).matrix()
                );
            }
        }
    }
}
