use crate::Vec3;

/// An orthonormal basis around a surface normal.
///
/// Used to move directions between world space and the local shading frame
/// where the normal is the +z axis.
#[derive(Debug, Copy, Clone)]
pub struct Onb {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl Onb {
    /// Build a frame from a unit normal alone, choosing an arbitrary tangent.
    ///
    /// Branchless construction from Duff et al., "Building an Orthonormal
    /// Basis, Revisited".
    pub fn from_normal(n: Vec3) -> Self {
        let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;

        let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

        Self {
            tangent,
            bitangent,
            normal: n,
        }
    }

    /// Build a frame from a unit tangent and unit normal.
    pub fn from_tangent_normal(tangent: Vec3, normal: Vec3) -> Self {
        Self {
            tangent,
            bitangent: normal.cross(tangent),
            normal,
        }
    }

    /// Transform a local-frame vector into world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        local.x * self.tangent + local.y * self.bitangent + local.z * self.normal
    }

    /// Transform a world-space vector into the local frame.
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(
            world.dot(self.tangent),
            world.dot(self.bitangent),
            world.dot(self.normal),
        )
    }
}
