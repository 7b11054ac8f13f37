use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use sceneconfig::SceneConfig;

use crate::camera::OrbitCamera;

/// CPU mirror of the `SceneParams` std140 block at group 0.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub diffuse_color: [f32; 4],
    /// x: metalness, y: roughness.
    pub material_params: [f32; 4],
    /// World-space direction toward the directional light.
    pub light_direction: [f32; 4],
    /// Colour premultiplied by intensity.
    pub light_color: [f32; 4],
    pub ambient_color: [f32; 4],
}

impl SceneUniforms {
    /// Static scene terms from configuration; camera terms start at identity
    /// until [`Self::set_camera`] runs.
    pub fn new(config: &SceneConfig) -> Self {
        let [r, g, b] = config.material.color.to_linear();
        let lights = &config.lights;
        let direction = Vec3::from_array(lights.directional_position).normalize_or_zero();
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            normal: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            diffuse_color: [r, g, b, 1.0],
            material_params: [config.material.metalness, config.material.roughness, 0.0, 0.0],
            light_direction: direction.extend(0.0).to_array(),
            light_color: scaled(lights.directional_color.to_linear(), lights.directional_intensity),
            ambient_color: scaled(lights.ambient_color.to_linear(), lights.ambient_intensity),
        }
    }

    pub fn set_camera(&mut self, camera: &OrbitCamera, aspect: f32) {
        let model = Mat4::IDENTITY;
        let view = camera.view();
        let normal = (view * model).inverse().transpose();
        self.model = model.to_cols_array_2d();
        self.view = view.to_cols_array_2d();
        self.projection = camera.projection(aspect).to_cols_array_2d();
        self.normal = normal.to_cols_array_2d();
        self.camera_position = camera.position().extend(1.0).to_array();
    }
}

fn scaled([r, g, b]: [f32; 3], intensity: f32) -> [f32; 4] {
    [r * intensity, g * intensity, b * intensity, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn scene_uniforms_match_std140_layout() {
        assert_eq!(size_of::<SceneUniforms>(), 4 * 64 + 6 * 16);
        assert_eq!(align_of::<SceneUniforms>(), 16);

        let uniforms = SceneUniforms::zeroed();
        let base = &uniforms as *const _ as usize;
        let offset = |field: *const u8| field as usize - base;
        assert_eq!(offset(uniforms.view.as_ptr() as *const u8), 64);
        assert_eq!(offset(uniforms.normal.as_ptr() as *const u8), 192);
        assert_eq!(offset(uniforms.camera_position.as_ptr() as *const u8), 256);
        assert_eq!(offset(uniforms.material_params.as_ptr() as *const u8), 288);
        assert_eq!(offset(uniforms.ambient_color.as_ptr() as *const u8), 336);
    }

    #[test]
    fn config_terms_are_linear_and_scaled() {
        let config = SceneConfig::default();
        let uniforms = SceneUniforms::new(&config);
        assert_eq!(uniforms.material_params[0], 0.1);
        assert_eq!(uniforms.material_params[1], 0.2);
        let direction = Vec3::from_slice(&uniforms.light_direction[..3]);
        assert!((direction.length() - 1.0).abs() < 1e-5);
        let [r, g, b] = config.lights.directional_color.to_linear();
        assert!((uniforms.light_color[0] - r * 0.6).abs() < 1e-6);
        assert!((uniforms.light_color[1] - g * 0.6).abs() < 1e-6);
        assert!((uniforms.light_color[2] - b * 0.6).abs() < 1e-6);
    }

    #[test]
    fn camera_terms_follow_the_orbit() {
        let config = SceneConfig::default();
        let camera = OrbitCamera::new(Vec3::new(0.0, 0.0, 2.0), 75.0, 0.1);
        let mut uniforms = SceneUniforms::new(&config);
        uniforms.set_camera(&camera, 16.0 / 9.0);
        let eye = Vec3::from_slice(&uniforms.camera_position[..3]);
        assert!((eye - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
        assert_eq!(uniforms.camera_position[3], 1.0);
        let view = Mat4::from_cols_array_2d(&uniforms.view);
        let origin = view.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }
}
