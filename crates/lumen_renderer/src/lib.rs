//! Lumen renderer - CPU path tracing.
//!
//! An offline, unbiased Monte Carlo path tracer for triangle scenes lit by
//! emissive geometry or an environment skydome:
//! - Unidirectional path tracing with Russian roulette termination
//! - Multiple importance sampling of BSDF and light strategies under the
//!   power heuristic
//! - Lambert + GGX/Smith surface model
//! - Importance-sampled equirectangular environment maps
//! - Fork/join parallelism over independently seeded workers

mod bsdf;
mod camera;
mod color;
mod environment;
mod geometry;
mod integrator;
mod light;
mod render;
mod sampling;
mod scene;

pub use bsdf::{fresnel_dielectric, BsdfLobe, BsdfSample, GgxLobe, LambertLobe, SurfaceBsdf};
pub use camera::{Camera, DEFAULT_IMAGE_PLANE_SCALE};
pub use color::{luminance, Color};
pub use environment::{Environment, SKYDOME_RADIUS};
pub use geometry::{intersect_triangle, triangle_area, Barycentrics, Intersection};
pub use integrator::{path_trace, ROULETTE_START, ROULETTE_SURVIVAL};
pub use light::{EmitterHit, Light, LightRun, LightSample};
pub use render::{default_worker_count, render, render_worker, RenderSettings};
pub use sampling::{
    cosine_hemisphere_pdf, cosine_hemisphere_sample, power_heuristic, uniform_hemisphere_pdf,
    uniform_hemisphere_sample, uniform_triangle_sample,
};
pub use scene::{Scene, SceneBuilder, SceneError, DEFAULT_SHADOW_BIAS};

/// Re-export the math and core types used at the API surface
pub use lumen_core::{Image, Material, TriangleMesh};
pub use lumen_math::{Onb, Ray, Vec3};
