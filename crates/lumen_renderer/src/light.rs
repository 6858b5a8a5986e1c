//! Light dispatch: emissive geometry vs. environment skydome.
//!
//! A scene carries exactly one implicit emitter kind. Area-lit scenes credit
//! rays that hit emissive triangles; environment-lit scenes credit rays that
//! miss everything. The tagged enum keeps the two from double counting.

use lumen_math::Vec3;

use crate::color::Color;
use crate::environment::Environment;

/// A run of consecutive emissive triangles belonging to one mesh.
#[derive(Debug, Clone, Copy)]
pub struct LightRun {
    pub first_triangle: u32,
    pub triangle_count: u32,
}

/// The scene's light source.
pub enum Light {
    /// Emissive triangles, addressed through runs for O(1) picking
    Area {
        runs: Vec<LightRun>,
        total_area: f32,
    },
    /// Equirectangular skydome with importance sampling
    Environment(Environment),
}

/// A position sample on a light, in the area domain.
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    /// Index of the sampled emissive triangle; `None` for the environment
    pub triangle: Option<u32>,
    /// Emitted radiance toward the receiver
    pub radiance: Color,
    /// Sampled point on the light
    pub point: Vec3,
    /// Unit normal of the light at the sample
    pub normal: Vec3,
    /// Area-domain probability density of the sample
    pub pdf: f32,
}

/// Emitter geometry seen by a ray that found the implicit light.
#[derive(Debug, Clone, Copy)]
pub struct EmitterHit {
    pub radiance: Color,
    pub point: Vec3,
    pub normal: Vec3,
}

impl Light {
    /// Radiance for a ray that missed all geometry. Only the environment
    /// emits on a miss.
    pub fn miss_radiance(&self, direction: Vec3) -> Option<EmitterHit> {
        match self {
            Light::Environment(environment) => Some(environment.emitter_hit(direction)),
            Light::Area { .. } => None,
        }
    }

    /// Area-domain pdf the light sampler assigns to the given direction.
    pub fn pdf(&self, direction: Vec3) -> f32 {
        match self {
            Light::Area { total_area, .. } => {
                if *total_area > 0.0 {
                    1.0 / total_area
                } else {
                    0.0
                }
            }
            Light::Environment(environment) => environment.pdf(direction),
        }
    }

    /// True when implicit credit applies to emissive triangle hits.
    pub fn credits_emissive_hits(&self) -> bool {
        matches!(self, Light::Area { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::Image;

    #[test]
    fn test_area_light_pdf_is_reciprocal_area() {
        let light = Light::Area {
            runs: vec![LightRun {
                first_triangle: 0,
                triangle_count: 2,
            }],
            total_area: 4.0,
        };
        assert_eq!(light.pdf(Vec3::Y), 0.25);
        assert!(light.miss_radiance(Vec3::Y).is_none());
        assert!(light.credits_emissive_hits());
    }

    #[test]
    fn test_environment_light_emits_on_miss() {
        let mut image = Image::new(4, 2);
        for pixel in &mut image.pixels {
            *pixel = Vec3::splat(2.0);
        }
        let light = Light::Environment(Environment::new(image));

        let hit = light.miss_radiance(Vec3::Y).unwrap();
        assert!((hit.radiance - Vec3::splat(2.0)).length() < 1e-5);
        assert!((hit.normal + Vec3::Y).length() < 1e-6);
        assert!(!light.credits_emissive_hits());
        assert!(light.pdf(Vec3::Y) > 0.0);
    }
}
