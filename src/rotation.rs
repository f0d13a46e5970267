use nalgebra::{matrix, vector, Matrix3, Vector3};

use crate::datatypes::RotationAngles;

/// Builds the rotation matrix about the x axis
///
/// # Arguments
/// * `angle` - Rotation angle in radians
pub fn rotation_x(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    matrix![
        1., 0., 0.;
        0., c, -s;
        0., s, c;
    ]
}

/// Builds the rotation matrix about the y axis
///
/// # Arguments
/// * `angle` - Rotation angle in radians
pub fn rotation_y(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    matrix![
        c, 0., s;
        0., 1., 0.;
        -s, 0., c;
    ]
}

/// Builds the rotation matrix about the z axis
///
/// # Arguments
/// * `angle` - Rotation angle in radians
pub fn rotation_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    matrix![
        c, -s, 0.;
        s, c, 0.;
        0., 0., 1.;
    ]
}

/// Builds the transform that undoes a scan's misalignment
///
/// # Arguments
/// * `angles` - The registration angles of the scan, in degrees
///
/// # Returns
/// `Rx⁻¹ · (Ry⁻¹ · Rz⁻¹)`
pub fn inverse_transform(angles: &RotationAngles) -> Matrix3<f64> {
    // orthonormal, so each inverse is the transpose
    let rx_inv = rotation_x(angles.x.to_radians()).transpose();
    let ry_inv = rotation_y(angles.y.to_radians()).transpose();
    let rz_inv = rotation_z(angles.z.to_radians()).transpose();

    rx_inv * (ry_inv * rz_inv)
}

/// Computes the loading vector for a scan
///
/// The unrotated load is a displacement of `applied_strain * total_length`
/// along z.
///
/// # Arguments
/// * `angles` - The registration angles of the scan, in degrees
/// * `applied_strain` - Applied compressive strain (negative in compression)
/// * `total_length` - Height of the model in millimetres
pub fn loading_vector(
    angles: &RotationAngles,
    applied_strain: f64,
    total_length: f64,
) -> Vector3<f64> {
    let v0 = vector![0., 0., applied_strain * total_length];
    inverse_transform(angles) * v0
}

/// Unit direction of a loading vector along with its magnitude
pub fn unit_direction(v: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let magnitude = v.norm();
    (v / magnitude, magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_angles_leave_vector_untouched() {
        let v = loading_vector(&RotationAngles::default(), -0.01, 9.02);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
        assert_eq!(v.z, -0.01 * 9.02);
    }

    #[test]
    fn rotation_preserves_magnitude() {
        let cases = [
            (1.5, -2.25, 0.75),
            (30.0, 45.0, 60.0),
            (-90.0, 0.0, 180.0),
            (0.01, 12.0, -7.5),
        ];
        let expected = (0.01f64 * 10.1976).abs();
        for (x, y, z) in cases {
            let v = loading_vector(&RotationAngles { x, y, z }, -0.01, 10.1976);
            assert!((v.norm() - expected).abs() < 1e-12, "angles {x} {y} {z}");
        }
    }

    #[test]
    fn inverse_transform_is_orthogonal() {
        let r = inverse_transform(&RotationAngles {
            x: 3.0,
            y: -4.0,
            z: 5.0,
        });
        let product = r * r.transpose();
        assert!((product - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn rotation_about_x_tilts_load_into_y() {
        // Rx(θ)⁻¹ · (0,0,1) = (0, sin θ, cos θ)
        let v = loading_vector(
            &RotationAngles {
                x: 90.0,
                y: 0.0,
                z: 0.0,
            },
            1.0,
            1.0,
        );
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
        assert!(v.z.abs() < 1e-12);
    }

    #[test]
    fn combined_x_and_y_tilt() {
        // Rx⁻¹ · Ry⁻¹ · (0,0,1) = (-sin y, sin x cos y, cos x cos y)
        let (ax, ay): (f64, f64) = (12.0, -20.0);
        let v = loading_vector(
            &RotationAngles {
                x: ax,
                y: ay,
                z: 0.0,
            },
            1.0,
            1.0,
        );
        let (sx, cx) = ax.to_radians().sin_cos();
        let (sy, cy) = ay.to_radians().sin_cos();

        assert!((v.x + sy).abs() < 1e-12);
        assert!((v.y - sx * cy).abs() < 1e-12);
        assert!((v.z - cx * cy).abs() < 1e-12);
    }

    #[test]
    fn composition_applies_z_first() {
        // z about the load axis is a no-op only when it is applied first
        let with_z = loading_vector(
            &RotationAngles {
                x: 12.0,
                y: -20.0,
                z: 35.0,
            },
            -0.01,
            9.02,
        );
        let without_z = loading_vector(
            &RotationAngles {
                x: 12.0,
                y: -20.0,
                z: 0.0,
            },
            -0.01,
            9.02,
        );
        assert!((with_z - without_z).norm() < 1e-15);
    }

    #[test]
    fn z_rotation_alone_leaves_vector_untouched() {
        let v = loading_vector(
            &RotationAngles {
                x: 0.0,
                y: 0.0,
                z: 47.0,
            },
            -0.01,
            9.02,
        );
        assert_eq!(v, vector![0., 0., -0.01 * 9.02]);
    }

    #[test]
    fn unit_direction_is_normalised() {
        let (u, m) = unit_direction(&vector![3.0, 0.0, -4.0]);
        assert!((m - 5.0).abs() < 1e-12);
        assert!((u.norm() - 1.0).abs() < 1e-12);
        assert!((u.z + 0.8).abs() < 1e-12);
    }
}
