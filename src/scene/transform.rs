use glam::{EulerRot, Mat4, Quat, Vec3};

/// Euler angles in degrees as `Rz * Ry * Rx`: a vector is rotated about X
/// first, then Y, then Z.
pub fn euler_degrees_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::ZYX,
        degrees.z.to_radians(),
        degrees.y.to_radians(),
        degrees.x.to_radians(),
    )
}

/// `T * R * S`.
pub fn trs_matrix(translation: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, euler_degrees_to_quat(rotation_degrees), translation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_pose_is_identity() {
        let m = trs_matrix(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn translate_then_scale_ok() {
        let m = trs_matrix(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::splat(2.0));
        let p = m.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        // (1,0,0) -> (2,0,0) -> (3,2,3)
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn translation_survives_any_rotation_and_scale() {
        let t = Vec3::new(-4.0, 0.5, 12.0);
        for (r, s) in [
            (Vec3::new(30.0, 45.0, 60.0), Vec3::ONE),
            (Vec3::new(-90.0, 180.0, 5.0), Vec3::new(2.0, 0.5, 3.0)),
            (Vec3::new(359.0, 0.0, -720.0), Vec3::splat(0.1)),
        ] {
            let m = trs_matrix(t, r, s);
            assert!(m.w_axis.truncate().abs_diff_eq(t, 1e-5));
            assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(t, 1e-5));

            let (scale, _, translation) = m.to_scale_rotation_translation();
            assert!(translation.abs_diff_eq(t, 1e-5));
            assert!(scale.abs_diff_eq(s, 1e-4));
        }
    }

    #[test]
    fn z_rotation_turns_x_into_y() {
        let q = euler_degrees_to_quat(Vec3::new(0.0, 0.0, 90.0));
        assert!((q * Vec3::X).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn x_is_applied_before_z() {
        // X by 90 maps Y to Z; Z by 90 then leaves Z alone.
        let q = euler_degrees_to_quat(Vec3::new(90.0, 0.0, 90.0));
        assert!((q * Vec3::Y).abs_diff_eq(Vec3::Z, 1e-6));
    }
}
