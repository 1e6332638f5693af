//! Covariance and coordinate helpers for scene producers
//!
//! Gaussians are usually authored as a per-axis scale and a rotation. The
//! renderer wants the 3D covariance `R * diag(s^2) * R^T` in the packed
//! upper-triangle form of [`SceneInput`].

use glam::{Mat3, Quat, Vec3};

use crate::scene::SceneInput;

/// Packed covariance `[xx, xy, xz, yy, yz, zz]` from scale and rotation
///
/// The quaternion is normalized first; a zero quaternion is treated as identity.
pub fn covariance_from_scale_rotation(scale: Vec3, rotation: Quat) -> [f32; 6] {
    let length = rotation.length();
    let rotation = if length > f32::EPSILON && length.is_finite() {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    };
    let r = Mat3::from_quat(rotation);
    let m = r * Mat3::from_diagonal(scale);
    let sigma = m * m.transpose();

    [
        sigma.x_axis.x,
        sigma.y_axis.x,
        sigma.z_axis.x,
        sigma.y_axis.y,
        sigma.z_axis.y,
        sigma.z_axis.z,
    ]
}

/// Convert from a y-down, z-forward capture convention to the viewer's y-up frame
///
/// Negating y and z is a rotation by pi about x, so the xy and xz covariance
/// terms flip sign while yz is unchanged.
pub fn flip_yz(position: Vec3, covariance: [f32; 6]) -> (Vec3, [f32; 6]) {
    let [xx, xy, xz, yy, yz, zz] = covariance;
    (
        Vec3::new(position.x, -position.y, -position.z),
        [xx, -xy, -xz, yy, yz, zz],
    )
}

/// Uniformly rescale a scene so its largest axis extent fits in [-1, 1]
///
/// Positions are centred on the bounding box. Covariance scales with the
/// square of the factor. Returns the factor applied (1.0 for degenerate scenes).
pub fn normalize_extent(scene: &mut SceneInput) -> f32 {
    if scene.is_empty() {
        return 1.0;
    }

    let (min, max) = scene
        .positions
        .chunks_exact(3)
        .map(Vec3::from_slice)
        .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });

    let extent = (max - min).max_element();
    if !(extent > 0.0) || !extent.is_finite() {
        return 1.0;
    }

    let center = (min + max) * 0.5;
    let factor = 2.0 / extent;

    for p in scene.positions.chunks_exact_mut(3) {
        let v = (Vec3::from_slice(p) - center) * factor;
        p.copy_from_slice(&v.to_array());
    }
    let factor_sq = factor * factor;
    for c in scene.covariance.iter_mut() {
        *c *= factor_sq;
    }

    factor
}
