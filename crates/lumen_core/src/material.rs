//! Surface material description.

use lumen_math::Vec3;

/// A surface material.
///
/// Plain value object with no references; the renderer reads these fields
/// directly when shading.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Diffuse reflectance (albedo), per channel in [0, 1]
    pub diffuse: Vec3,

    /// Specular tint applied to the microfacet lobe
    pub specular: Vec3,

    /// Emitted radiance; non-zero makes the material a light
    pub emissive: Vec3,

    /// Index of refraction, >= 1
    pub ior: f32,

    /// Microfacet roughness, 0 = mirror-like, 1 = fully rough
    pub roughness: f32,

    /// True iff `emissive` is non-zero
    pub is_light: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ZERO,
            emissive: Vec3::ZERO,
            ior: 1.5,
            roughness: 1.0,
            is_light: false,
        }
    }
}

impl Material {
    /// Create a plain diffuse material.
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            diffuse: color,
            ..Default::default()
        }
    }

    /// Create an emitter with the given radiance.
    pub fn emitter(radiance: Vec3) -> Self {
        Self {
            diffuse: Vec3::ZERO,
            emissive: radiance,
            is_light: radiance != Vec3::ZERO,
            ..Default::default()
        }
    }

    /// Builder method to set the diffuse reflectance.
    pub fn with_diffuse(mut self, color: Vec3) -> Self {
        self.diffuse = color;
        self
    }

    /// Builder method to set the specular tint.
    pub fn with_specular(mut self, tint: Vec3) -> Self {
        self.specular = tint;
        self
    }

    /// Builder method to set the emitted radiance (updates `is_light`).
    pub fn with_emissive(mut self, radiance: Vec3) -> Self {
        self.emissive = radiance;
        self.is_light = radiance != Vec3::ZERO;
        self
    }

    /// Builder method to set the index of refraction (clamped to >= 1).
    pub fn with_ior(mut self, ior: f32) -> Self {
        self.ior = ior.max(1.0);
        self
    }

    /// Builder method to set the roughness (clamped to [0, 1]).
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Remap a Phong-style shininess exponent to microfacet roughness.
    pub fn roughness_from_shininess(shininess: f32) -> f32 {
        (2.0 / (shininess + 2.0)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_is_light() {
        let mat = Material::emitter(Vec3::ONE);
        assert!(mat.is_light);

        let dark = Material::emitter(Vec3::ZERO);
        assert!(!dark.is_light);
    }

    #[test]
    fn test_with_emissive_updates_flag() {
        let mat = Material::diffuse(Vec3::splat(0.5));
        assert!(!mat.is_light);
        let lit = mat.with_emissive(Vec3::new(1.0, 0.5, 0.0));
        assert!(lit.is_light);
    }

    #[test]
    fn test_roughness_from_shininess() {
        // Shininess 0 is fully rough
        assert!((Material::roughness_from_shininess(0.0) - 1.0).abs() < 1e-6);
        // Higher shininess means smoother
        let rough = Material::roughness_from_shininess(10.0);
        let smooth = Material::roughness_from_shininess(1000.0);
        assert!(smooth < rough);
        assert!(smooth > 0.0);
    }

    #[test]
    fn test_ior_clamped() {
        let mat = Material::default().with_ior(0.5);
        assert_eq!(mat.ior, 1.0);
    }
}
