use crate::{
    rendering::draw_list::{
        draw_item::{DrawItem, DrawSource},
        error::DrawListError,
        transforms::ItemTransforms,
    },
    scene_graph::SceneGraph,
};

/// Number of draw items `enumerate_draw_items` produces for `scene`.
pub fn draw_item_count(scene: &dyn SceneGraph) -> usize {
    (0..scene.model_count())
        .map(|model| {
            let meshes: usize = (0..scene.mesh_count(model))
                .map(|mesh| scene.mesh_instance_count(model, mesh))
                .sum();
            scene.model_instance_count(model) * meshes
        })
        .sum()
}

/// Refuses scenes containing any skinned mesh, instanced or not.
pub fn validate_rigid(scene: &dyn SceneGraph) -> Result<(), DrawListError> {
    for model in 0..scene.model_count() {
        for mesh in 0..scene.mesh_count(model) {
            let data = scene.mesh_data(scene.mesh(model, mesh));

            if data.skinned {
                return Err(DrawListError::SkinnedMesh {
                    model,
                    mesh,
                    name: data.name.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Walks models, then model instances, then meshes, then mesh instances and
/// assigns draw ids in that order. The order is stable for an unchanged scene.
pub fn enumerate_draw_items(scene: &dyn SceneGraph) -> Result<Vec<DrawItem>, DrawListError> {
    validate_rigid(scene)?;

    let mut items = Vec::with_capacity(draw_item_count(scene));

    for model in 0..scene.model_count() {
        for model_instance in 0..scene.model_instance_count(model) {
            let instance = scene.model_instance(model, model_instance);
            let (matrix, prev_matrix) = (instance.matrix(), instance.prev_matrix());

            for mesh in 0..scene.mesh_count(model) {
                let mesh_id = scene.mesh(model, mesh);
                let material = scene.mesh_data(mesh_id).material;

                for mesh_instance in 0..scene.mesh_instance_count(model, mesh) {
                    let local = scene.mesh_instance(model, mesh, mesh_instance).local_transform;

                    items.push(DrawItem {
                        source: DrawSource {
                            model,
                            model_instance,
                            mesh,
                            mesh_instance,
                        },
                        mesh: mesh_id,
                        material,
                        mesh_id: mesh_id.index() as u32,
                        draw_id: items.len() as u32,
                        transforms: ItemTransforms::compute(matrix, prev_matrix, local),
                    });
                }
            }
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::scene_graph::{
        primitives, Material, MeshInstance, Model, ModelInstance, Scene, Transform,
    };

    fn two_model_scene() -> Scene {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::default());
        let cube = scene.add_mesh(primitives::cube("cube", material));
        let gem = scene.add_mesh(primitives::octahedron("gem", material));

        let a = scene.add_model(Model::new("a").with_mesh(
            cube,
            vec![
                MeshInstance::default(),
                MeshInstance::new(Mat4::from_translation(Vec3::Y)),
            ],
        ));
        let b = scene.add_model(
            Model::new("b")
                .with_mesh(gem, vec![MeshInstance::default()])
                .with_mesh(cube, vec![MeshInstance::default()]),
        );

        for i in 0..3 {
            let offset = Transform::from_translation(Vec3::new(i as f32, 0.0, 0.0));
            scene.add_model_instance(a, ModelInstance::new(format!("a{i}"), offset));
        }
        scene.add_model_instance(b, ModelInstance::new("b0", Transform::IDENTITY));

        scene
    }

    #[test]
    fn count_matches_nested_sum() {
        let scene = two_model_scene();
        let items = enumerate_draw_items(&scene).unwrap();

        // 3 instances x 2 mesh instances + 1 instance x 2 meshes
        assert_eq!(draw_item_count(&scene), 8);
        assert_eq!(items.len(), 8);
    }

    #[test]
    fn order_is_models_instances_meshes_mesh_instances() {
        let scene = two_model_scene();
        let items = enumerate_draw_items(&scene).unwrap();

        let sources: Vec<_> = items
            .iter()
            .map(|item| {
                let s = item.source;
                (s.model, s.model_instance, s.mesh, s.mesh_instance)
            })
            .collect();

        assert_eq!(
            sources,
            vec![
                (0, 0, 0, 0),
                (0, 0, 0, 1),
                (0, 1, 0, 0),
                (0, 1, 0, 1),
                (0, 2, 0, 0),
                (0, 2, 0, 1),
                (1, 0, 0, 0),
                (1, 0, 1, 0),
            ]
        );

        for (index, item) in items.iter().enumerate() {
            assert_eq!(item.draw_id, index as u32);
        }
    }

    #[test]
    fn world_matrix_combines_instance_and_local() {
        let scene = two_model_scene();
        let items = enumerate_draw_items(&scene).unwrap();

        // Model instance a1, mesh instance 1
        let item = &items[3];
        let expected = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0))
            * Mat4::from_translation(Vec3::Y);

        assert_eq!(item.transforms.world, expected);
        assert_eq!(item.current_transforms(&scene), item.transforms);
    }

    #[test]
    fn skinned_mesh_is_refused() {
        let mut scene = two_model_scene();
        let gem = scene.mesh(1, 0);
        scene.meshes[gem].skinned = true;

        let error = enumerate_draw_items(&scene).unwrap_err();

        assert_eq!(
            error,
            DrawListError::SkinnedMesh {
                model: 1,
                mesh: 0,
                name: "gem".to_string(),
            }
        );
    }

    #[test]
    fn skinned_mesh_without_instances_is_still_refused() {
        let mut scene = two_model_scene();
        let material = scene.add_material(Material::default());
        let mut skinned = primitives::cube("skinned", material);
        skinned.skinned = true;
        let mesh = scene.add_mesh(skinned);
        scene.add_model(Model::new("unplaced").with_mesh(mesh, vec![MeshInstance::default()]));

        assert!(matches!(
            enumerate_draw_items(&scene),
            Err(DrawListError::SkinnedMesh { model: 2, .. })
        ));
    }
}
