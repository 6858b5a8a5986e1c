//! Linear RGB color operations.

use lumen_math::Vec3;

/// Color type alias. Linear RGB; addition and component-wise multiplication
/// come from the vector type.
pub type Color = Vec3;

/// Luminance of a linear RGB color (Rec. 709 weights).
#[inline]
pub fn luminance(c: Color) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}
