//! Parallel render driver: worker fan-out and image reduction.

use std::time::Instant;

use lumen_core::Image;
use lumen_math::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::integrator::path_trace;
use crate::scene::Scene;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel, per worker
    pub samples_per_pixel: usize,
    /// Root seed; worker k derives its generator from `seed + k`
    pub seed: u64,
    /// Worker count override; `None` derives it from the hardware
    pub workers: Option<usize>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            samples_per_pixel: 16,
            seed: 0,
            workers: None,
        }
    }
}

impl RenderSettings {
    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_samples_per_pixel(mut self, samples: usize) -> Self {
        self.samples_per_pixel = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }
}

/// Worker count derived from the hardware: one core is left for the OS and
/// the fan-out is capped at 16.
pub fn default_worker_count() -> usize {
    let parallelism = std::thread::available_parallelism().map_or(1, |n| n.get());
    (parallelism.min(16)).saturating_sub(1).max(1)
}

/// Render one worker's full-image estimate with its own generator.
///
/// Deterministic given the seed: the result depends on nothing but
/// `(scene, camera, settings, seed)`.
pub fn render_worker(scene: &Scene, camera: &Camera, settings: &RenderSettings, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut image = Image::new(settings.width, settings.height);
    let sample_weight = 1.0 / settings.samples_per_pixel as f32;

    for y in 0..settings.height {
        for x in 0..settings.width {
            let mut accumulated = Vec3::ZERO;
            for _ in 0..settings.samples_per_pixel {
                let ray = camera.sample_ray(x, y, settings.width, settings.height, &mut rng);
                accumulated += path_trace(scene, ray, &mut rng) * sample_weight;
            }
            image.set(x, y, accumulated);
        }
    }

    image
}

/// Render the scene: fan out independent workers, then average their images.
///
/// The reduction folds worker images in index order, so the result is
/// bit-identical to running the same seeds sequentially.
pub fn render(scene: &Scene, camera: &Camera, settings: &RenderSettings) -> Image {
    let workers = settings.workers.unwrap_or_else(default_worker_count);
    let start = Instant::now();
    log::info!(
        "Rendering {}x{} at {} spp with {} workers",
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        workers
    );

    let estimates: Vec<Image> = (0..workers)
        .into_par_iter()
        .map(|index| render_worker(scene, camera, settings, settings.seed + index as u64))
        .collect();

    let image = reduce(&estimates, settings.width, settings.height);

    log::info!("Render finished in {:.2}s", start.elapsed().as_secs_f32());
    image
}

/// Element-wise sum of the worker estimates, scaled by 1 / K.
fn reduce(estimates: &[Image], width: usize, height: usize) -> Image {
    let mut combined = Image::new(width, height);
    for estimate in estimates {
        for (accumulator, pixel) in combined.pixels.iter_mut().zip(&estimate.pixels) {
            *accumulator += *pixel;
        }
    }
    let scale = 1.0 / estimates.len().max(1) as f32;
    for pixel in &mut combined.pixels {
        *pixel *= scale;
    }
    combined
}
