use crate::{
    camera::CameraUniform,
    rendering::{backend::RenderBackend, binding_offsets::ShaderBindingOffsets},
    scene_graph::{GpuLight, Light},
};

/// Writes camera state and the light list into the shared per-frame block.
/// Members the current shader variant lacks are skipped. Lights beyond the
/// shader's array capacity are dropped.
pub fn bind_per_frame(
    backend: &mut dyn RenderBackend,
    offsets: &ShaderBindingOffsets,
    camera: &CameraUniform,
    lights: &[Light],
) {
    if let Some(offset) = offsets.camera.get() {
        backend.write_per_frame(offset, bytemuck::bytes_of(camera));
    }

    let lights = &lights[..lights.len().min(offsets.light_capacity as usize)];

    if let Some(offset) = offsets.light_count.get() {
        backend.write_per_frame(offset, bytemuck::bytes_of(&(lights.len() as u32)));
    }

    if let Some(offset) = offsets.lights.get() {
        if !lights.is_empty() {
            let gpu_lights: Vec<GpuLight> = lights.iter().map(Light::to_gpu).collect();
            backend.write_per_frame(offset, bytemuck::cast_slice(&gpu_lights));
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::rendering::{
        backend::{BackendCall, RecordingBackend},
        binding_offsets::PER_FRAME_BLOCK,
        reflection::StaticReflection,
        render_mode::RenderMode,
    };

    fn lights(count: usize) -> Vec<Light> {
        (0..count)
            .map(|i| Light::point(Vec3::X * i as f32, Vec3::ONE, 1.0, 10.0))
            .collect()
    }

    #[test]
    fn writes_camera_and_lights() {
        let mut backend = RecordingBackend::new();
        backend
            .select_permutation(&RenderMode::Explicit.permutation())
            .unwrap();
        let offsets = ShaderBindingOffsets::resolve(backend.reflection());

        bind_per_frame(&mut backend, &offsets, &CameraUniform::default(), &lights(2));

        let writes: Vec<_> = backend
            .calls()
            .iter()
            .map(|call| match call {
                BackendCall::WritePerFrame { offset, data } => (*offset, data.len()),
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(writes, vec![(0, 208), (208, 4), (224, 128)]);
    }

    #[test]
    fn skips_lights_when_shader_has_none() {
        let reflection = StaticReflection::new()
            .with_block(PER_FRAME_BLOCK, 208)
            .with_member(PER_FRAME_BLOCK, "camera", 0);
        let mut backend = RecordingBackend::new().with_reflection(reflection);
        let offsets = ShaderBindingOffsets::resolve(backend.reflection());

        bind_per_frame(&mut backend, &offsets, &CameraUniform::default(), &lights(3));

        assert_eq!(backend.calls().len(), 1);
        assert!(matches!(
            backend.calls()[0],
            BackendCall::WritePerFrame { offset: 0, .. }
        ));
    }

    #[test]
    fn light_list_is_clamped_to_capacity() {
        let reflection = StaticReflection::new()
            .with_member(PER_FRAME_BLOCK, "light_count", 0)
            .with_array(PER_FRAME_BLOCK, "lights", 16, 2);
        let mut backend = RecordingBackend::new().with_reflection(reflection);
        let offsets = ShaderBindingOffsets::resolve(backend.reflection());

        bind_per_frame(&mut backend, &offsets, &CameraUniform::default(), &lights(5));

        assert_eq!(
            backend.calls()[0],
            BackendCall::WritePerFrame {
                offset: 0,
                data: 2u32.to_ne_bytes().to_vec(),
            }
        );
        assert!(matches!(
            &backend.calls()[1],
            BackendCall::WritePerFrame { offset: 16, data } if data.len() == 128
        ));
    }
}
