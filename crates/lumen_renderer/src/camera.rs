//! Pinhole camera.

use lumen_math::{Ray, Vec3};
use rand::Rng;

/// Default image-plane scale; smaller values narrow the field of view.
pub const DEFAULT_IMAGE_PLANE_SCALE: f32 = 0.25;

/// A pinhole camera at a fixed position, looking toward -z with +y up.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub image_plane_scale: f32,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            image_plane_scale: DEFAULT_IMAGE_PLANE_SCALE,
        }
    }

    /// Builder method to set the image-plane scale (field of view).
    pub fn with_image_plane_scale(mut self, scale: f32) -> Self {
        self.image_plane_scale = scale;
        self
    }

    /// Generate a jittered primary ray through pixel (x, y).
    ///
    /// The jittered pixel position maps to normalized device coordinates in
    /// [-1, 1]; the y axis flips so row 0 is the top of the image. The
    /// image-plane point at z = -1 feeds the normalizing ray constructor.
    pub fn sample_ray(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        rng: &mut impl Rng,
    ) -> Ray {
        let sx = (x as f32 + rng.gen::<f32>()) / width as f32 * 2.0 - 1.0;
        let sy = -((y as f32 + rng.gen::<f32>()) / height as f32 * 2.0 - 1.0);
        Ray::new(
            self.position,
            Vec3::new(
                sx * self.image_plane_scale,
                sy * self.image_plane_scale,
                -1.0,
            ),
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
