//! Camera and per-cube transforms.

use glam::{Mat4, Vec3};

/// Where each cube sits in world space.
pub const CUBE_POSITIONS: [Vec3; 10] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(2.0, 5.0, -15.0),
    Vec3::new(-1.5, -2.2, -2.5),
    Vec3::new(-3.8, -2.0, -12.3),
    Vec3::new(2.4, -0.4, -3.5),
    Vec3::new(-1.7, 3.0, -7.5),
    Vec3::new(1.3, -2.0, -2.5),
    Vec3::new(1.5, 2.0, -2.5),
    Vec3::new(1.5, 0.2, -1.5),
    Vec3::new(-1.3, 1.0, -1.5),
];

const CAMERA_DISTANCE: f32 = 3.0;
/// Degrees per second the whole scene turns around (1, 1, 1).
const VIEW_SPIN_DEG: f32 = 10.0;
/// Degrees of extra tilt per cube index.
const MODEL_TILT_DEG: f32 = 20.0;

const FOV_Y_DEG: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Camera pulled back along +z, with the scene turning over `seconds`.
pub fn view(seconds: f32) -> Mat4 {
    let spin = (VIEW_SPIN_DEG * seconds).to_radians();
    Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE))
        * Mat4::from_axis_angle(Vec3::ONE.normalize(), spin)
}

/// Right-handed perspective with a 0..1 depth range.
pub fn projection(aspect_ratio: f32) -> Mat4 {
    Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect_ratio, Z_NEAR, Z_FAR)
}

/// Model matrix of cube `index`.
pub fn model(index: usize) -> Mat4 {
    let position = CUBE_POSITIONS
        .get(index)
        .copied()
        .unwrap_or(Vec3::ZERO);
    let tilt = (MODEL_TILT_DEG * index as f32).to_radians();

    Mat4::from_translation(position)
        * Mat4::from_axis_angle(Vec3::new(1.0, 0.3, 0.5).normalize(), tilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f32 = 1e-5;

    #[test]
    fn view_at_time_zero_only_pulls_the_camera_back() {
        let origin = view(0.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.abs_diff_eq(Vec4::new(0.0, 0.0, -3.0, 1.0), EPS));
        assert!(view(0.0).abs_diff_eq(Mat4::from_translation(Vec3::Z * -3.0), EPS));
    }

    #[test]
    fn view_rotation_keeps_the_spin_axis_fixed() {
        // Points on the (1, 1, 1) axis only get the camera translation.
        let on_axis = Vec3::ONE;
        let moved = view(7.5).transform_point3(on_axis);
        assert!(moved.abs_diff_eq(on_axis - Vec3::Z * 3.0, EPS));
    }

    #[test]
    fn first_model_is_identity() {
        assert!(model(0).abs_diff_eq(Mat4::IDENTITY, EPS));
    }

    #[test]
    fn models_place_each_cube_at_its_position() {
        for (index, position) in CUBE_POSITIONS.iter().enumerate() {
            let centre = model(index).transform_point3(Vec3::ZERO);
            assert!(centre.abs_diff_eq(*position, EPS), "cube {index}");
        }
    }

    #[test]
    fn projection_maps_near_and_far_planes_to_the_depth_range() {
        let proj = projection(800.0 / 600.0);

        let near = proj.project_point3(Vec3::new(0.0, 0.0, -Z_NEAR));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -Z_FAR));
        assert!((near.z - 0.0).abs() < EPS);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn wider_aspect_squeezes_x() {
        let point = Vec3::new(1.0, 1.0, -5.0);
        let square = projection(1.0).project_point3(point);
        let wide = projection(2.0).project_point3(point);
        assert!((wide.x - square.x / 2.0).abs() < EPS);
        assert!((wide.y - square.y).abs() < EPS);
    }
}
