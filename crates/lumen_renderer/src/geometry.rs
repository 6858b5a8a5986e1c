//! Ray/triangle intersection.

use lumen_math::{Onb, Ray, Vec3};

/// Barycentric coordinates of a point inside a triangle, with `u` weighting
/// the first vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentrics {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

/// Record of a ray/triangle intersection.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    /// Signed parametric distance along the ray. Callers filter for t > 0.
    pub t: f32,
    /// Index of the hit triangle
    pub triangle: u32,
    /// World-space hit point, origin + t * direction
    pub point: Vec3,
    /// Unit geometric normal, facing the ray origin
    pub normal: Vec3,
    /// Unit tangent orthogonal to the normal, for the shading frame
    pub tangent: Vec3,
    /// Barycentric coordinates of the hit
    pub bary: Barycentrics,
}

/// Intersect a ray with one indexed triangle.
///
/// Scenes wind triangles clockwise as seen from the front, so the winding
/// normal `ab x ac` points away from the viewer; the test culls the back
/// face (`d . n <= 0`, which also rejects grazing and degenerate triangles)
/// and reports the normal flipped to face the ray origin.
///
/// No positivity filter is applied to `t` here; the caller decides which
/// side of the origin counts as a hit.
pub fn intersect_triangle(
    ray: &Ray,
    triangle: u32,
    indices: &[u32],
    vertices: &[Vec3],
) -> Option<Intersection> {
    let base = 3 * triangle as usize;
    let a = vertices[indices[base] as usize];
    let b = vertices[indices[base + 1] as usize];
    let c = vertices[indices[base + 2] as usize];

    let ab = b - a;
    let ac = c - a;
    let n = ab.cross(ac);

    let d = ray.direction.dot(n);
    if d <= 0.0 {
        return None;
    }

    // Scaled barycentrics from the edge triple products; normalize by 1/d
    // only after the inside tests pass.
    let e = ray.direction.cross(ray.origin - a);
    let v = ac.dot(e);
    if v < 0.0 || v > d {
        return None;
    }
    let w = -ab.dot(e);
    if w < 0.0 || v + w > d {
        return None;
    }

    let ood = 1.0 / d;
    let t = (a - ray.origin).dot(n) * ood;
    let v = v * ood;
    let w = w * ood;
    let u = 1.0 - v - w;

    let normal = (-n).normalize();
    let tangent = Onb::from_normal(normal).tangent;

    Some(Intersection {
        t,
        triangle,
        point: ray.at(t),
        normal,
        tangent,
        bary: Barycentrics { u, v, w },
    })
}

/// Area of an indexed triangle.
pub fn triangle_area(triangle: u32, indices: &[u32], vertices: &[Vec3]) -> f32 {
    let base = 3 * triangle as usize;
    let a = vertices[indices[base] as usize];
    let b = vertices[indices[base + 1] as usize];
    let c = vertices[indices[base + 2] as usize];
    0.5 * (b - a).cross(c - a).length()
}
