//! The transport core: a unidirectional path tracer with multiple
//! importance sampling.
//!
//! Each bounce blends two estimators of the direct-light integral under the
//! power heuristic: the implicit one (the BSDF-sampled path happens to find
//! the emitter) and the explicit one (a position is sampled on the light and
//! tested for visibility). Paths terminate on a miss, on a zero sampling
//! pdf, or by Russian roulette; there is no hard length cap.

use lumen_math::{Ray, Vec3};
use rand::Rng;

use crate::bsdf::SurfaceBsdf;
use crate::color::Color;
use crate::sampling::power_heuristic;
use crate::scene::Scene;

/// Bounce count after which Russian roulette starts.
pub const ROULETTE_START: u32 = 3;

/// Per-bounce survival probability once roulette is active. Survivors are
/// scaled by the reciprocal so the estimator stays unbiased.
pub const ROULETTE_SURVIVAL: f32 = 0.8;

/// Estimate the radiance arriving along a primary ray.
///
/// Total over its inputs: numeric degeneracies end the path or contribute
/// zero, they never panic.
pub fn path_trace(scene: &Scene, primary: Ray, rng: &mut impl Rng) -> Color {
    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut ray = primary;
    let mut path_length: u32 = 0;
    let mut last_forward_pdf = 0.0f32;

    loop {
        let hit = scene.intersect(&ray);

        // Implicit light credit: the BSDF-sampled ray found the emitter.
        // Exactly one emitter kind is implicit per scene, so this cannot
        // double count against the environment.
        match &hit {
            Some(hit) if scene.credits_emissive_hits() => {
                let material = scene.material_of(hit.triangle);
                if material.is_light {
                    let weight = if path_length == 0 {
                        1.0
                    } else {
                        implicit_weight(scene, &ray, hit.point, hit.normal, last_forward_pdf)
                    };
                    radiance += throughput * material.emissive * weight;
                }
            }
            Some(_) => {}
            None => {
                if let Some(emitter) = scene.miss_radiance(&ray) {
                    let weight = if path_length == 0 {
                        1.0
                    } else {
                        implicit_weight(scene, &ray, emitter.point, emitter.normal, last_forward_pdf)
                    };
                    radiance += throughput * emitter.radiance * weight;
                }
            }
        }
        let Some(hit) = hit else {
            break;
        };

        let material = scene.material_of(hit.triangle);
        let bsdf = SurfaceBsdf::new(material, hit.normal, hit.tangent);
        let wo = -ray.direction;
        let surface_point = hit.point + hit.normal * scene.shadow_bias;

        // Explicit direct lighting: sample a position on the light and test
        // visibility from the biased surface point.
        if let Some(light) = scene.sample_light([rng.gen(), rng.gen(), rng.gen(), rng.gen()]) {
            let to_light = light.point - surface_point;
            let distance_squared = to_light.length_squared();
            if light.pdf > 0.0 && distance_squared > 0.0 {
                let wi = to_light / distance_squared.sqrt();
                let cos_surface = hit.normal.dot(wi);
                let cos_light = (-wi).dot(light.normal);
                if cos_surface > 0.0 && cos_light > 0.0 {
                    let shadow_ray = Ray::new(surface_point, wi);
                    let visible = match (scene.intersect(&shadow_ray), light.triangle) {
                        (None, _) => true,
                        (Some(occluder), Some(triangle)) => occluder.triangle == triangle,
                        (Some(_), None) => false,
                    };
                    if visible {
                        let geometry = cos_light / distance_squared;
                        let reflectance = bsdf.eval(wo, wi);
                        let forward_pdf = bsdf.pdf(wo, wi);
                        let weight = power_heuristic(light.pdf, forward_pdf * geometry);
                        radiance += throughput
                            * reflectance
                            * light.radiance
                            * (cos_surface * geometry / light.pdf * weight);
                    }
                }
            }
        }

        // Russian roulette
        path_length += 1;
        if path_length > ROULETTE_START {
            if rng.gen::<f32>() >= ROULETTE_SURVIVAL {
                break;
            }
            throughput /= ROULETTE_SURVIVAL;
        }

        // Extend the path with a BSDF sample
        let sample = bsdf.sample(wo, rng.gen(), rng.gen(), rng.gen());
        if sample.pdf <= 0.0 {
            break;
        }
        throughput *= sample.reflectance * (hit.normal.dot(sample.direction) / sample.pdf);
        if throughput == Color::ZERO {
            break;
        }

        ray = Ray::new(surface_point, sample.direction);
        last_forward_pdf = sample.pdf;
    }

    radiance
}

/// MIS weight for an implicit emitter hit: the BSDF pdf that generated the
/// ray, converted to the area domain through the geometry term, against the
/// light sampler's pdf for the same direction.
fn implicit_weight(
    scene: &Scene,
    ray: &Ray,
    light_point: Vec3,
    light_normal: Vec3,
    forward_pdf: f32,
) -> f32 {
    let cos_light = (-ray.direction).dot(light_normal).max(0.0);
    let distance_squared = (light_point - ray.origin).length_squared();
    if distance_squared <= 0.0 {
        return 0.0;
    }
    let geometry = cos_light / distance_squared;
    power_heuristic(forward_pdf * geometry, scene.light_pdf(ray.direction))
}
