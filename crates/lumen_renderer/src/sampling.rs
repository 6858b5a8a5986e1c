//! Sampling utilities shared by the BSDF and light code.

use std::f32::consts::PI;

use lumen_math::Vec3;

/// Map two uniform variates to a cosine-weighted direction in the local
/// frame (+z is the surface normal). PDF is cos(theta) / pi.
pub fn cosine_hemisphere_sample(u1: f32, u2: f32) -> Vec3 {
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let x = r * phi.cos();
    let y = r * phi.sin();
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    Vec3::new(x, y, z)
}

/// Solid-angle pdf of `cosine_hemisphere_sample` for a world-space direction.
#[inline]
pub fn cosine_hemisphere_pdf(normal: Vec3, direction: Vec3) -> f32 {
    normal.dot(direction).max(0.0) / PI
}

/// Map two uniform variates to a uniform direction in the local hemisphere.
pub fn uniform_hemisphere_sample(u1: f32, u2: f32) -> Vec3 {
    let z = u1;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Solid-angle pdf of `uniform_hemisphere_sample`.
#[inline]
pub fn uniform_hemisphere_pdf() -> f32 {
    1.0 / (2.0 * PI)
}

/// Map two uniform variates to barycentric coordinates uniform over a
/// triangle's area.
pub fn uniform_triangle_sample(u1: f32, u2: f32) -> (f32, f32, f32) {
    let su = u1.sqrt();
    let u = 1.0 - su;
    let v = u2 * su;
    (u, v, 1.0 - u - v)
}

/// Power heuristic for combining two sampling strategies.
///
/// Returns f^2 / (f^2 + g^2), with the 0/0 case defined as 0 so degenerate
/// strategies drop out cleanly.
#[inline]
pub fn power_heuristic(f: f32, g: f32) -> f32 {
    let f2 = f * f;
    let g2 = g * g;
    if f2 + g2 > 0.0 {
        f2 / (f2 + g2)
    } else {
        0.0
    }
}
