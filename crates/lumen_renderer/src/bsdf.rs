//! Surface scattering: Lambert diffuse + GGX/Smith microfacet specular.
//!
//! Each lobe implements the `eval` / `pdf` / `sample_direction` trio; the
//! surface BSDF mixes the two as a uniform strategy ensemble: evaluation
//! sums the lobes, the pdf averages them, and sampling flips a fair coin.

use std::f32::consts::PI;

use lumen_core::Material;
use lumen_math::{Onb, Vec3};

use crate::color::Color;
use crate::sampling::{cosine_hemisphere_pdf, cosine_hemisphere_sample};

/// Result of sampling an outgoing direction from the surface BSDF.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    /// Sampled world-space direction
    pub direction: Vec3,
    /// Combined reflectance of all lobes for that direction
    pub reflectance: Color,
    /// Mixture pdf of the sampled direction
    pub pdf: f32,
}

/// A single scattering lobe, evaluated in a shared shading frame.
pub trait BsdfLobe {
    /// Reflectance for the given directions (both pointing away from the
    /// surface).
    fn eval(&self, frame: &Onb, wo: Vec3, wi: Vec3) -> Color;

    /// Solid-angle pdf this lobe's sampler assigns to `wi`.
    fn pdf(&self, frame: &Onb, wo: Vec3, wi: Vec3) -> f32;

    /// Draw a direction from this lobe's sampling strategy.
    fn sample_direction(&self, frame: &Onb, wo: Vec3, u1: f32, u2: f32) -> Vec3;
}

/// Lambertian diffuse lobe.
#[derive(Debug, Clone, Copy)]
pub struct LambertLobe {
    pub albedo: Color,
}

impl BsdfLobe for LambertLobe {
    fn eval(&self, frame: &Onb, wo: Vec3, wi: Vec3) -> Color {
        if frame.normal.dot(wi) > 0.0 && frame.normal.dot(wo) > 0.0 {
            self.albedo / PI
        } else {
            Color::ZERO
        }
    }

    fn pdf(&self, frame: &Onb, _wo: Vec3, wi: Vec3) -> f32 {
        cosine_hemisphere_pdf(frame.normal, wi)
    }

    fn sample_direction(&self, frame: &Onb, _wo: Vec3, u1: f32, u2: f32) -> Vec3 {
        frame.to_world(cosine_hemisphere_sample(u1, u2))
    }
}

/// GGX/Smith microfacet specular lobe (isotropic, dielectric Fresnel).
#[derive(Debug, Clone, Copy)]
pub struct GgxLobe {
    pub tint: Color,
    pub alpha: f32,
    pub ior: f32,
}

impl BsdfLobe for GgxLobe {
    fn eval(&self, frame: &Onb, wo: Vec3, wi: Vec3) -> Color {
        let n = frame.normal;
        let cos_o = n.dot(wo);
        let cos_i = n.dot(wi);
        if cos_o <= 0.0 || cos_i <= 0.0 {
            return Color::ZERO;
        }

        let h = (wo + wi).normalize();
        let d = ggx_distribution(n.dot(h), self.alpha);
        let g = smith_shadowing(cos_i, self.alpha) * smith_shadowing(cos_o, self.alpha);
        let f = fresnel_dielectric(wi.dot(h), self.ior);

        self.tint * (f * g * d / (4.0 * cos_i * cos_o))
    }

    fn pdf(&self, frame: &Onb, wo: Vec3, wi: Vec3) -> f32 {
        let h = (wo + wi).normalize();
        let o_dot_h = wo.dot(h);
        if o_dot_h <= 0.0 {
            return 0.0;
        }
        let n_dot_h = frame.normal.dot(h);
        ggx_distribution(n_dot_h, self.alpha) * n_dot_h.max(0.0) / (4.0 * o_dot_h)
    }

    fn sample_direction(&self, frame: &Onb, wo: Vec3, u1: f32, u2: f32) -> Vec3 {
        // Inverse-CDF draw of the microfacet normal from the GGX
        // distribution, then mirror reflection of wo about it.
        let theta = (self.alpha * u1.sqrt() / (1.0 - u1).sqrt()).atan();
        let phi = 2.0 * PI * u2;

        let sin_theta = theta.sin();
        let local = Vec3::new(
            sin_theta * phi.cos(),
            sin_theta * phi.sin(),
            theta.cos(),
        );
        let mut h = frame.to_world(local);
        if h.dot(wo) < 0.0 {
            h = -h;
        }
        2.0 * wo.dot(h) * h - wo
    }
}

/// GGX (Trowbridge-Reitz) normal distribution. Zero below the horizon.
#[inline]
pub fn ggx_distribution(n_dot_h: f32, alpha: f32) -> f32 {
    if n_dot_h <= 0.0 {
        return 0.0;
    }
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

/// One-sided Smith shadowing/masking term for GGX.
#[inline]
pub fn smith_shadowing(cos_theta: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    2.0 * cos_theta / (cos_theta + (a2 + (1.0 - a2) * cos_theta * cos_theta).sqrt())
}

/// Exact Fresnel reflectance for a dielectric interface.
///
/// `cos_i` is measured against the microfacet normal; total internal
/// reflection returns 1.
pub fn fresnel_dielectric(cos_i: f32, ior: f32) -> f32 {
    let cos_i = cos_i.clamp(0.0, 1.0);
    let sin2_t = (1.0 - cos_i * cos_i) / (ior * ior);
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();

    let r_parallel = (ior * cos_i - cos_t) / (ior * cos_i + cos_t);
    let r_perpendicular = (cos_i - ior * cos_t) / (cos_i + ior * cos_t);
    0.5 * (r_parallel * r_parallel + r_perpendicular * r_perpendicular)
}

/// The full surface BSDF: a uniform mixture over the lobe set.
pub struct SurfaceBsdf {
    frame: Onb,
    lambert: LambertLobe,
    ggx: GgxLobe,
}

impl SurfaceBsdf {
    /// Build the shading-point BSDF from a material and the intersection
    /// frame.
    pub fn new(material: &Material, normal: Vec3, tangent: Vec3) -> Self {
        Self {
            frame: Onb::from_tangent_normal(tangent, normal),
            lambert: LambertLobe {
                albedo: material.diffuse,
            },
            ggx: GgxLobe {
                tint: material.specular,
                alpha: material.roughness,
                ior: material.ior,
            },
        }
    }

    fn lobes(&self) -> [&dyn BsdfLobe; 2] {
        [&self.lambert, &self.ggx]
    }

    /// Combined reflectance: the sum over lobes.
    pub fn eval(&self, wo: Vec3, wi: Vec3) -> Color {
        self.lobes()
            .iter()
            .map(|lobe| lobe.eval(&self.frame, wo, wi))
            .sum()
    }

    /// Mixture pdf: the average over lobe pdfs.
    pub fn pdf(&self, wo: Vec3, wi: Vec3) -> f32 {
        let lobes = self.lobes();
        let total: f32 = lobes.iter().map(|lobe| lobe.pdf(&self.frame, wo, wi)).sum();
        total / lobes.len() as f32
    }

    /// Draw a direction by picking a strategy uniformly, and report the
    /// summed reflectance with the mixture pdf.
    pub fn sample(&self, wo: Vec3, u_lobe: f32, u1: f32, u2: f32) -> BsdfSample {
        let lobes = self.lobes();
        let index = ((u_lobe * lobes.len() as f32) as usize).min(lobes.len() - 1);
        let direction = lobes[index].sample_direction(&self.frame, wo, u1, u2);
        BsdfSample {
            direction,
            reflectance: self.eval(wo, direction),
            pdf: self.pdf(wo, direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::{uniform_hemisphere_pdf, uniform_hemisphere_sample};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn frame() -> Onb {
        Onb::from_normal(Vec3::Z)
    }

    #[test]
    fn test_lambert_reciprocity_and_value() {
        let lobe = LambertLobe {
            albedo: Color::splat(0.6),
        };
        let f = frame();
        let wo = Vec3::new(0.0, 0.5, 0.8).normalize();
        let wi = Vec3::new(0.4, -0.1, 0.9).normalize();
        let forward = lobe.eval(&f, wo, wi);
        let reverse = lobe.eval(&f, wi, wo);
        assert!((forward - reverse).length() < 1e-6);
        assert!((forward.x - 0.6 / PI).abs() < 1e-6);
    }

    #[test]
    fn test_lambert_below_horizon_is_black() {
        let lobe = LambertLobe {
            albedo: Color::ONE,
        };
        let f = frame();
        let wo = Vec3::Z;
        let below = Vec3::new(0.0, 0.5, -0.5).normalize();
        assert_eq!(lobe.eval(&f, wo, below), Color::ZERO);
        assert_eq!(lobe.pdf(&f, wo, below), 0.0);
    }

    #[test]
    fn test_fresnel_limits() {
        // Normal incidence on glass: ((n-1)/(n+1))^2 ~= 0.04
        let normal = fresnel_dielectric(1.0, 1.5);
        assert!((normal - 0.04).abs() < 0.001);
        // Grazing incidence reflects everything
        let grazing = fresnel_dielectric(0.0, 1.5);
        assert!((grazing - 1.0).abs() < 1e-4);
        // Fresnel is a reflectance, always in [0, 1]
        for i in 0..=10 {
            let f = fresnel_dielectric(i as f32 / 10.0, 1.5);
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn test_ggx_distribution_clamps_horizon() {
        assert_eq!(ggx_distribution(0.0, 0.5), 0.0);
        assert_eq!(ggx_distribution(-0.5, 0.5), 0.0);
        assert!(ggx_distribution(1.0, 0.5) > 0.0);
    }

    #[test]
    fn test_ggx_sample_pdf_consistency() {
        // The pdf reported for sampled directions must match the analytic
        // half-vector pdf: D(n.h) * (n.h) / (4 * (wo.h))
        let lobe = GgxLobe {
            tint: Color::ONE,
            alpha: 0.4,
            ior: 1.5,
        };
        let f = frame();
        let wo = Vec3::new(0.3, -0.2, 0.9).normalize();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..1000 {
            let wi = lobe.sample_direction(&f, wo, rng.gen(), rng.gen());
            let pdf = lobe.pdf(&f, wo, wi);
            if wi.z <= 0.0 {
                continue; // reflected under the horizon; eval would be zero
            }
            let h = (wo + wi).normalize();
            let expected = ggx_distribution(f.normal.dot(h), lobe.alpha) * f.normal.dot(h)
                / (4.0 * wo.dot(h));
            assert!((pdf - expected).abs() < 1e-3 * expected.max(1.0));
        }
    }

    #[test]
    fn test_lambert_energy_bound() {
        // Hemisphere integral of f * cos must not exceed 1 for albedo <= 1
        let lobe = LambertLobe {
            albedo: Color::ONE,
        };
        let f = frame();
        let wo = Vec3::new(0.2, 0.1, 0.95).normalize();
        let mut rng = StdRng::seed_from_u64(6);
        let n = 200_000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let wi = uniform_hemisphere_sample(rng.gen(), rng.gen());
            let value = lobe.eval(&f, wo, wi) * wi.z / uniform_hemisphere_pdf();
            sum += value.x as f64;
        }
        let integral = sum / n as f64;
        assert!(integral < 1.01, "integral {integral}");
        assert!(integral > 0.9, "integral {integral}");
    }

    #[test]
    fn test_ggx_energy_bound() {
        let f = frame();
        let wo = Vec3::new(0.0, 0.4, 0.9).normalize();
        let mut rng = StdRng::seed_from_u64(7);
        for alpha in [0.1, 0.3, 0.7, 1.0] {
            let lobe = GgxLobe {
                tint: Color::ONE,
                alpha,
                ior: 1.5,
            };
            let n = 200_000;
            let mut sum = 0.0f64;
            for _ in 0..n {
                let wi = uniform_hemisphere_sample(rng.gen(), rng.gen());
                let value = lobe.eval(&f, wo, wi) * wi.z / uniform_hemisphere_pdf();
                sum += value.x as f64;
            }
            let integral = sum / n as f64;
            assert!(integral <= 1.02, "alpha {alpha}: integral {integral}");
        }
    }

    #[test]
    fn test_mixture_combines_lobes() {
        let material = Material::default()
            .with_diffuse(Color::splat(0.5))
            .with_specular(Color::ONE)
            .with_roughness(0.3);
        let bsdf = SurfaceBsdf::new(&material, Vec3::Z, Vec3::X);

        let wo = Vec3::new(0.1, 0.2, 0.97).normalize();
        let wi = Vec3::new(-0.2, 0.1, 0.95).normalize();

        let f = frame();
        let lambert = LambertLobe {
            albedo: Color::splat(0.5),
        };
        let ggx = GgxLobe {
            tint: Color::ONE,
            alpha: 0.3,
            ior: 1.5,
        };

        let combined = bsdf.eval(wo, wi);
        let expected = lambert.eval(&f, wo, wi) + ggx.eval(&f, wo, wi);
        assert!((combined - expected).length() < 1e-6);

        let pdf = bsdf.pdf(wo, wi);
        let expected_pdf = 0.5 * (lambert.pdf(&f, wo, wi) + ggx.pdf(&f, wo, wi));
        assert!((pdf - expected_pdf).abs() < 1e-6);
    }

    #[test]
    fn test_mixture_sample_reports_mixture_pdf() {
        let material = Material::default()
            .with_diffuse(Color::splat(0.8))
            .with_specular(Color::splat(0.4))
            .with_roughness(0.5);
        let bsdf = SurfaceBsdf::new(&material, Vec3::Z, Vec3::X);
        let wo = Vec3::new(0.0, 0.3, 0.95).normalize();

        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..500 {
            let sample = bsdf.sample(wo, rng.gen(), rng.gen(), rng.gen());
            let pdf = bsdf.pdf(wo, sample.direction);
            assert!((sample.pdf - pdf).abs() < 1e-5);
            let eval = bsdf.eval(wo, sample.direction);
            assert!((sample.reflectance - eval).length() < 1e-5);
        }
    }
}
