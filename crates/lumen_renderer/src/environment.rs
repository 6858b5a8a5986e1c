//! Environment (skydome) light: equirectangular lookup and importance
//! sampling.
//!
//! The map is importance-sampled through a 2D piecewise-constant inverse CDF
//! over `luminance * sin(theta)`, so sampling frequency tracks luminous
//! power per unit solid angle. Light samples are placed on a conceptual
//! bounding sphere of fixed radius; the radius cancels against the geometry
//! term as long as the radiance, pdf and sample paths agree on it.

use std::f32::consts::PI;

use lumen_core::Image;
use lumen_math::Vec3;

use crate::color::{luminance, Color};
use crate::light::{EmitterHit, LightSample};

/// Radius of the conceptual skydome sphere carrying environment samples.
pub const SKYDOME_RADIUS: f32 = 6.0;

/// An equirectangular environment map with precomputed sampling CDFs.
pub struct Environment {
    image: Image,
    /// Unnormalized marginal CDF over columns, length W
    cdf_u: Vec<f32>,
    /// Unnormalized conditional CDFs per column, column-major `x * H + y`
    cdf_v: Vec<f32>,
}

impl Environment {
    /// Wrap an image and precompute its sampling distribution.
    pub fn new(image: Image) -> Self {
        let width = image.width;
        let height = image.height;
        let theta_step = PI / height as f32;

        let mut cdf_u = vec![0.0f32; width];
        let mut cdf_v = vec![0.0f32; width * height];

        let mut sum_u = 0.0;
        for x in 0..width {
            let column = &mut cdf_v[x * height..(x + 1) * height];
            let mut sum_v = 0.0;
            for (y, entry) in column.iter_mut().enumerate() {
                let theta = (y as f32 + 0.5) * theta_step;
                sum_v += luminance(image.get(x, y)) * theta.sin();
                *entry = sum_v;
            }
            sum_u += sum_v;
            cdf_u[x] = sum_u;
        }

        log::info!("Environment map {width}x{height}, total weight {sum_u}");

        Self {
            image,
            cdf_u,
            cdf_v,
        }
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Bilinearly filtered radiance toward a direction.
    pub fn radiance(&self, direction: Vec3) -> Color {
        let (u, v) = direction_to_uv(direction);
        self.image.fetch_bilinear_wrap(u, v)
    }

    /// Conceptual emitter geometry behind a missed ray: radiance plus the
    /// skydome point and its inward normal.
    pub fn emitter_hit(&self, direction: Vec3) -> EmitterHit {
        EmitterHit {
            radiance: self.radiance(direction),
            point: direction * SKYDOME_RADIUS,
            normal: -direction,
        }
    }

    /// Importance-sample a direction from the luminance distribution.
    ///
    /// Returns `None` when the map (or the chosen column) carries no energy.
    pub fn sample(&self, u1: f32, u2: f32) -> Option<LightSample> {
        let width = self.image.width;
        let height = self.image.height;

        let total = *self.cdf_u.last()?;
        if total <= 0.0 {
            return None;
        }

        let x = self
            .cdf_u
            .partition_point(|&c| c < u1 * total)
            .min(width - 1);

        let column = &self.cdf_v[x * height..(x + 1) * height];
        let column_total = column[height - 1];
        if column_total <= 0.0 {
            return None;
        }
        let y = column
            .partition_point(|&c| c < u2 * column_total)
            .min(height - 1);

        let phi = (x as f32 + 0.5) * 2.0 * PI / width as f32;
        let theta = (y as f32 + 0.5) * PI / height as f32;
        let sin_theta = theta.sin();
        let direction = Vec3::new(
            sin_theta * phi.cos(),
            theta.cos(),
            sin_theta * phi.sin(),
        );

        Some(LightSample {
            triangle: None,
            radiance: self.image.get(x, y),
            point: direction * SKYDOME_RADIUS,
            normal: -direction,
            pdf: self.pdf_pixel(x, y),
        })
    }

    /// Area-domain pdf of sampling the given direction.
    pub fn pdf(&self, direction: Vec3) -> f32 {
        let (u, v) = direction_to_uv(direction);
        self.pdf_pixel(self.image.texel_u(u), self.image.texel_v(v))
    }

    /// Area-domain pdf of the pixel `(x, y)`: discrete pixel probability
    /// over the pixel's solid angle, projected onto the skydome sphere.
    fn pdf_pixel(&self, x: usize, y: usize) -> f32 {
        let width = self.image.width;
        let height = self.image.height;

        let total = self.cdf_u[width - 1];
        if total <= 0.0 {
            return 0.0;
        }
        let column = &self.cdf_v[x * height..(x + 1) * height];
        let column_total = column[height - 1];
        if column_total <= 0.0 {
            return 0.0;
        }

        let p_u = (self.cdf_u[x] - if x > 0 { self.cdf_u[x - 1] } else { 0.0 }) / total;
        let p_v = (column[y] - if y > 0 { column[y - 1] } else { 0.0 }) / column_total;

        let theta = (y as f32 + 0.5) * PI / height as f32;
        let pixel_solid_angle = theta.sin() * 2.0 * PI * PI / (width * height) as f32;
        if pixel_solid_angle <= 0.0 {
            return 0.0;
        }

        p_u * p_v / (pixel_solid_angle * SKYDOME_RADIUS * SKYDOME_RADIUS)
    }
}

/// Map a unit direction to equirectangular coordinates; `u` and `v` span one
/// full period in [0, 1) after fractional wrap.
fn direction_to_uv(direction: Vec3) -> (f32, f32) {
    let u = direction.z.atan2(direction.x) / (2.0 * PI);
    let v = direction.y.clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}
