use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::settings::Settings;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

const fn vertex(position: [f32; 3], tex_coord: [f32; 2]) -> Vertex {
    Vertex {
        position,
        tex_coord,
    }
}

/// Unit cube with four vertices per face so each face gets its own UVs.
pub const CUBE_VERTICES: [Vertex; 24] = [
    // Front
    vertex([-1.0, -1.0, -1.0], [0.0, 1.0]),
    vertex([-1.0, 1.0, -1.0], [0.0, 0.0]),
    vertex([1.0, 1.0, -1.0], [1.0, 0.0]),
    vertex([1.0, -1.0, -1.0], [1.0, 1.0]),
    // Back
    vertex([-1.0, -1.0, 1.0], [0.0, 1.0]),
    vertex([1.0, -1.0, 1.0], [0.0, 0.0]),
    vertex([1.0, 1.0, 1.0], [1.0, 0.0]),
    vertex([-1.0, 1.0, 1.0], [1.0, 1.0]),
    // Top
    vertex([-1.0, 1.0, -1.0], [0.0, 1.0]),
    vertex([-1.0, 1.0, 1.0], [0.0, 0.0]),
    vertex([1.0, 1.0, 1.0], [1.0, 0.0]),
    vertex([1.0, 1.0, -1.0], [1.0, 1.0]),
    // Bottom
    vertex([-1.0, -1.0, -1.0], [0.0, 1.0]),
    vertex([1.0, -1.0, -1.0], [0.0, 0.0]),
    vertex([1.0, -1.0, 1.0], [1.0, 0.0]),
    vertex([-1.0, -1.0, 1.0], [1.0, 1.0]),
    // Left
    vertex([-1.0, -1.0, 1.0], [0.0, 1.0]),
    vertex([-1.0, 1.0, 1.0], [0.0, 0.0]),
    vertex([-1.0, 1.0, -1.0], [1.0, 0.0]),
    vertex([-1.0, -1.0, -1.0], [1.0, 1.0]),
    // Right
    vertex([1.0, -1.0, -1.0], [0.0, 1.0]),
    vertex([1.0, 1.0, -1.0], [0.0, 0.0]),
    vertex([1.0, 1.0, 1.0], [1.0, 0.0]),
    vertex([1.0, -1.0, 1.0], [1.0, 1.0]),
];

/// Two clockwise triangles per face, shared by both cubes.
#[rustfmt::skip]
pub const CUBE_INDICES: [u32; 36] = [
     0,  1,  2,   0,  2,  3,
     4,  5,  6,   4,  6,  7,
     8,  9, 10,   8, 10, 11,
    12, 13, 14,  12, 14, 15,
    16, 17, 18,  16, 18, 19,
    20, 21, 22,  20, 22, 23,
];

pub const CUBE_INDEX_COUNT: u32 = CUBE_INDICES.len() as u32;

/// Vertex shader constant buffer contents for one draw.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    /// World-view-projection, transposed for `mul(position, wvp)` in HLSL.
    pub wvp: [f32; 16],
}

impl ObjectConstants {
    pub fn new(world: Mat4, view_projection: Mat4) -> Self {
        let wvp = view_projection * world;
        Self {
            wvp: wvp.transpose().to_cols_array(),
        }
    }
}

/// Fixed left-handed camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Camera {
    pub const EYE: Vec3 = Vec3::new(0.0, 3.0, -8.0);
    pub const TARGET: Vec3 = Vec3::ZERO;
    pub const UP: Vec3 = Vec3::Y;
    pub const FOV_Y: f32 = PI * 0.4;
    pub const Z_NEAR: f32 = 1.0;
    pub const Z_FAR: f32 = 1000.0;

    pub fn new(settings: &Settings) -> Self {
        if !settings.has_area() {
            log::warn!(
                "client area is {}x{}; using a square projection",
                settings.screen_width,
                settings.screen_height
            );
        }

        Self {
            view: Mat4::look_at_lh(Self::EYE, Self::TARGET, Self::UP),
            projection: Mat4::perspective_lh(
                Self::FOV_Y,
                settings.aspect_ratio(),
                Self::Z_NEAR,
                Self::Z_FAR,
            ),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

/// The two-cube scene: one shared rotation angle, two derived world matrices.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    rotation: f32,
    rotation_step: f32,
    cube1_world: Mat4,
    cube2_world: Mat4,
}

impl Scene {
    const ORBIT_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 4.0);
    const CUBE2_SCALE: f32 = 1.3;

    pub fn new(initial_rotation: f32, rotation_step: f32) -> Self {
        Self {
            rotation: initial_rotation.rem_euclid(TAU),
            rotation_step,
            cube1_world: Mat4::IDENTITY,
            cube2_world: Mat4::IDENTITY,
        }
    }

    /// Advances the angle by one step and rebuilds both world matrices.
    ///
    /// The step is per call, so rotation speed tracks the frame rate.
    pub fn update(&mut self) {
        self.rotation += self.rotation_step;
        if !(0.0..TAU).contains(&self.rotation) {
            self.rotation = 0.0;
        }

        let (cube1_angle, cube2_angle) = self.cube_angles();

        // Translate, then rotate: the first cube orbits the origin.
        self.cube1_world =
            Mat4::from_rotation_y(cube1_angle) * Mat4::from_translation(Self::ORBIT_OFFSET);

        // Rotate, then scale: the second cube spins in place the other way.
        self.cube2_world = Mat4::from_scale(Vec3::splat(Self::CUBE2_SCALE))
            * Mat4::from_rotation_y(cube2_angle);
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn cube_angles(&self) -> (f32, f32) {
        (self.rotation(), -self.rotation())
    }

    /// World matrices in draw order.
    pub fn worlds(&self) -> [Mat4; 2] {
        [self.cube1_world, self.cube2_world]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    #[test]
    fn cube_geometry_shape() {
        assert_eq!(CUBE_VERTICES.len(), 24);
        assert_eq!(CUBE_INDEX_COUNT, 36);
        assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < CUBE_VERTICES.len()));
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 64);
    }

    #[test]
    fn every_vertex_is_referenced_by_its_face() {
        for face in 0..6u32 {
            let indices = &CUBE_INDICES[(face * 6) as usize..((face + 1) * 6) as usize];
            for corner in face * 4..face * 4 + 4 {
                assert!(indices.contains(&corner), "face {face} misses vertex {corner}");
            }
        }
    }

    #[test]
    fn rotation_stays_in_one_turn_and_cubes_mirror_each_other() {
        // Large step so the wrap happens many times.
        let mut scene = Scene::new(0.01, 0.37);

        for _ in 0..10_000 {
            scene.update();
            let angle = scene.rotation();
            assert!((0.0..TAU).contains(&angle), "angle {angle} out of range");

            let (cube1, cube2) = scene.cube_angles();
            assert_eq!(cube1, -cube2);
        }
    }

    #[test]
    fn default_step_wraps_after_a_full_turn() {
        let mut scene = Scene::new(0.01, 0.0005);
        // f32 accumulation drifts a little, so allow some slack past one turn.
        let max_calls = ((TAU - 0.01) / 0.0005).ceil() as usize + 100;

        let mut wrapped = false;
        for _ in 0..max_calls {
            let before = scene.rotation();
            scene.update();
            if scene.rotation() < before {
                wrapped = true;
                assert_eq!(scene.rotation(), 0.0);
                assert!(before + 0.0005 >= TAU);
                break;
            }
        }
        assert!(wrapped);
    }

    #[test]
    fn cube1_orbits_at_fixed_distance() {
        let mut scene = Scene::new(0.0, 0.25);

        for _ in 0..32 {
            scene.update();
            let [cube1, _] = scene.worlds();
            let centre = cube1.transform_point3(Vec3::ZERO);

            assert_relative_eq!(centre.y, 0.0);
            assert_relative_eq!(centre.length(), 4.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn cube2_stays_at_origin_and_is_scaled() {
        let mut scene = Scene::new(0.0, 0.5);
        scene.update();

        let [_, cube2] = scene.worlds();
        let centre = cube2.transform_point3(Vec3::ZERO);
        let corner = cube2.transform_point3(Vec3::new(1.0, 1.0, 1.0));

        assert_relative_eq!(centre.length(), 0.0);
        assert_relative_eq!(corner.length(), 1.3 * 3f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn camera_looks_at_origin_from_behind_and_above() {
        let camera = Camera::new(&Settings::from_client_size((1440, 1080), false, false));

        let eye_in_view = camera.view.transform_point3(Camera::EYE);
        let origin_in_view = camera.view.transform_point3(Vec3::ZERO);

        assert_relative_eq!(eye_in_view.length(), 0.0, epsilon = 1e-5);
        // Left-handed: the target is straight ahead along +Z.
        assert_relative_eq!(origin_in_view.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(origin_in_view.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(origin_in_view.z, Camera::EYE.length(), epsilon = 1e-5);
    }

    #[test]
    fn camera_with_zero_area_has_finite_projection() {
        let camera = Camera::new(&Settings::from_client_size((0, 0), false, false));
        assert!(camera.projection.is_finite());
    }

    #[test]
    fn constants_hold_transposed_wvp() {
        let camera = Camera::new(&Settings::from_client_size((800, 600), false, false));
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0));
        let constants = ObjectConstants::new(world, camera.view_projection());

        // HLSL reads the buffer column-major; mul(row, M) with the transposed
        // matrix must equal the column-vector product on the CPU.
        let uploaded = Mat4::from_cols_array(&constants.wvp);
        let point = Vec4::new(1.0, -1.0, 1.0, 1.0);
        let expected = camera.view_projection() * world * point;
        let row_vector = uploaded.transpose() * point;

        assert_relative_eq!(expected.x, row_vector.x, epsilon = 1e-4);
        assert_relative_eq!(expected.y, row_vector.y, epsilon = 1e-4);
        assert_relative_eq!(expected.z, row_vector.z, epsilon = 1e-4);
        assert_relative_eq!(expected.w, row_vector.w, epsilon = 1e-4);
    }
}
