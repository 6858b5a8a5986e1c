//! Linear HDR image container.

use lumen_math::Vec3;

/// A floating-point RGB image, row-major.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Vec3>,
}

impl Image {
    /// Create a new image filled with black.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; width * height],
        }
    }

    /// Create an image from existing pixel data.
    ///
    /// Panics if `pixels.len() != width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Vec3>) -> Self {
        assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Get the pixel at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Vec3 {
        self.pixels[y * self.width + x]
    }

    /// Set the pixel at (x, y).
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: Vec3) {
        self.pixels[y * self.width + x] = value;
    }

    /// Texel column containing a horizontal coordinate, wrapping on both
    /// ends. `u` is in image space where 1.0 spans the full width; texel `x`
    /// covers `[x/W, (x+1)/W)`, so pixel-center coordinates map back to the
    /// pixel they came from.
    pub fn texel_u(&self, u: f32) -> usize {
        let x = (u - u.floor()) * self.width as f32;
        x as usize % self.width
    }

    /// Texel row containing a vertical coordinate, wrapping on both ends.
    pub fn texel_v(&self, v: f32) -> usize {
        let y = (v - v.floor()) * self.height as f32;
        y as usize % self.height
    }

    /// Bilinearly filtered lookup with wrap on both axes.
    pub fn fetch_bilinear_wrap(&self, u: f32, v: f32) -> Vec3 {
        let x = (u - u.floor()) * self.width as f32;
        let y = (v - v.floor()) * self.height as f32;

        let x0 = x as usize;
        let y0 = y as usize;
        let x1 = (x0 + 1) % self.width;
        let y1 = (y0 + 1) % self.height;

        let m00 = self.get(x0, y0);
        let m01 = self.get(x1, y0);
        let m10 = self.get(x0, y1);
        let m11 = self.get(x1, y1);

        let tx = x - x0 as f32;
        let ty = y - y0 as f32;

        let m0 = m00.lerp(m01, tx);
        let m1 = m10.lerp(m11, tx);
        m0.lerp(m1, ty)
    }
}
