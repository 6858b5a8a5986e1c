//! The immutable scene snapshot shared by all render workers.

use lumen_core::{Material, TriangleMesh};
use lumen_math::{Ray, Vec3};
use thiserror::Error;

use crate::environment::Environment;
use crate::geometry::{intersect_triangle, triangle_area, Intersection};
use crate::light::{EmitterHit, Light, LightRun, LightSample};
use crate::sampling::uniform_triangle_sample;

/// Default offset applied along the surface normal when spawning secondary
/// rays, to avoid self-intersection acne. Scene-scale dependent, hence a
/// scene parameter rather than a buried constant.
pub const DEFAULT_SHADOW_BIAS: f32 = 1e-3;

/// Errors detected while flattening meshes into a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("mesh {mesh:?} references vertex {index} but has {count} vertices")]
    InvalidIndex {
        mesh: String,
        index: u32,
        count: usize,
    },

    #[error("too many materials ({0}); triangle material indices are 8-bit")]
    TooManyMaterials(usize),
}

/// Flattened triangle soup plus the material table and light bookkeeping.
///
/// Immutable after construction; workers share it by borrow. All buffers are
/// allocated once, pre-sized from a counting prepass.
pub struct Scene {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    materials: Vec<Material>,
    /// One entry per triangle, indexing into `materials`
    material_indices: Vec<u8>,
    light: Option<Light>,
    pub shadow_bias: f32,
}

impl Scene {
    /// Start building a scene.
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn material_of(&self, triangle: u32) -> &Material {
        &self.materials[self.material_indices[triangle as usize] as usize]
    }

    pub fn light(&self) -> Option<&Light> {
        self.light.as_ref()
    }

    /// Closest hit with `t > 0` over every triangle, by linear scan.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let mut closest: Option<Intersection> = None;
        for triangle in 0..self.triangle_count() as u32 {
            if let Some(hit) = intersect_triangle(ray, triangle, &self.indices, &self.vertices) {
                if hit.t > 0.0 && closest.map_or(true, |c| hit.t < c.t) {
                    closest = Some(hit);
                }
            }
        }
        closest
    }

    /// Emitted radiance behind a ray that missed all geometry.
    pub fn miss_radiance(&self, ray: &Ray) -> Option<EmitterHit> {
        self.light.as_ref()?.miss_radiance(ray.direction)
    }

    /// Area-domain pdf the light sampler assigns to a direction.
    pub fn light_pdf(&self, direction: Vec3) -> f32 {
        self.light.as_ref().map_or(0.0, |light| light.pdf(direction))
    }

    /// True when rays hitting an emissive triangle receive implicit credit.
    pub fn credits_emissive_hits(&self) -> bool {
        self.light
            .as_ref()
            .map_or(false, Light::credits_emissive_hits)
    }

    /// Draw a position sample from the scene's light.
    ///
    /// `u[0]`/`u[1]` drive the point on the chosen emitter (barycentric or
    /// inverse-CDF), `u[2]`/`u[3]` pick the run and the triangle within it.
    pub fn sample_light(&self, u: [f32; 4]) -> Option<LightSample> {
        match self.light.as_ref()? {
            Light::Environment(environment) => environment.sample(u[0], u[1]),
            Light::Area { runs, total_area } => {
                if runs.is_empty() || *total_area <= 0.0 {
                    return None;
                }
                let run = &runs[((u[2] * runs.len() as f32) as usize).min(runs.len() - 1)];
                let offset =
                    ((u[3] * run.triangle_count as f32) as u32).min(run.triangle_count - 1);
                let triangle = run.first_triangle + offset;

                let base = 3 * triangle as usize;
                let a = self.vertices[self.indices[base] as usize];
                let b = self.vertices[self.indices[base + 1] as usize];
                let c = self.vertices[self.indices[base + 2] as usize];

                let winding_normal = (b - a).cross(c - a);
                if winding_normal.length_squared() <= 0.0 {
                    return None;
                }

                let (alpha, beta, gamma) = uniform_triangle_sample(u[0], u[1]);
                Some(LightSample {
                    triangle: Some(triangle),
                    radiance: self.material_of(triangle).emissive,
                    point: alpha * a + beta * b + gamma * c,
                    // Same facing convention as the intersection records
                    normal: -winding_normal.normalize(),
                    pdf: 1.0 / total_area,
                })
            }
        }
    }
}

/// Two-pass scene construction: meshes are collected first, then flattened
/// into pre-sized buffers.
#[derive(Default)]
pub struct SceneBuilder {
    meshes: Vec<TriangleMesh>,
    environment: Option<Environment>,
    shadow_bias: Option<f32>,
}

impl SceneBuilder {
    pub fn add_mesh(mut self, mesh: TriangleMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn add_meshes(mut self, meshes: impl IntoIterator<Item = TriangleMesh>) -> Self {
        self.meshes.extend(meshes);
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_shadow_bias(mut self, bias: f32) -> Self {
        self.shadow_bias = Some(bias);
        self
    }

    /// Validate and flatten. An empty scene is legal (it renders black, or
    /// pure environment if one is present).
    pub fn build(self) -> Result<Scene, SceneError> {
        if self.meshes.len() > u8::MAX as usize + 1 {
            return Err(SceneError::TooManyMaterials(self.meshes.len()));
        }

        // Counting prepass so every buffer is allocated exactly once
        let total_vertices: usize = self.meshes.iter().map(TriangleMesh::vertex_count).sum();
        let total_triangles: usize = self.meshes.iter().map(TriangleMesh::triangle_count).sum();

        let mut vertices = Vec::with_capacity(total_vertices);
        let mut indices = Vec::with_capacity(3 * total_triangles);
        let mut materials = Vec::with_capacity(self.meshes.len());
        let mut material_indices = Vec::with_capacity(total_triangles);
        let mut runs = Vec::new();
        let mut total_area = 0.0f32;

        for mesh in &self.meshes {
            for &index in &mesh.indices {
                if index as usize >= mesh.positions.len() {
                    return Err(SceneError::InvalidIndex {
                        mesh: mesh.name.clone(),
                        index,
                        count: mesh.positions.len(),
                    });
                }
            }

            let base_vertex = vertices.len() as u32;
            let first_triangle = (indices.len() / 3) as u32;
            let material_index = materials.len() as u8;

            vertices.extend_from_slice(&mesh.positions);
            indices.extend(mesh.indices.iter().map(|&i| base_vertex + i));
            materials.push(mesh.material.clone());
            material_indices.extend(std::iter::repeat(material_index).take(mesh.triangle_count()));

            if mesh.material.is_light {
                let triangle_count = mesh.triangle_count() as u32;
                for triangle in first_triangle..first_triangle + triangle_count {
                    total_area += triangle_area(triangle, &indices, &vertices);
                }
                runs.push(LightRun {
                    first_triangle,
                    triangle_count,
                });
            }
        }

        let light = match self.environment {
            Some(environment) => {
                if !runs.is_empty() {
                    log::warn!(
                        "scene has both an environment and {} emissive meshes; \
                         only the environment is sampled",
                        runs.len()
                    );
                }
                Some(Light::Environment(environment))
            }
            None if !runs.is_empty() => Some(Light::Area { runs, total_area }),
            None => None,
        };

        log::info!(
            "Scene: {} triangles, {} vertices, {} materials, light area {total_area}",
            indices.len() / 3,
            vertices.len(),
            materials.len()
        );

        Ok(Scene {
            vertices,
            indices,
            materials,
            material_indices,
            light,
            shadow_bias: self.shadow_bias.unwrap_or(DEFAULT_SHADOW_BIAS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit quad at z = -2 wound clockwise as seen from the camera at the
    /// origin, so its reported normal faces +z.
    fn front_quad(half_extent: f32, material: Material) -> TriangleMesh {
        let h = half_extent;
        TriangleMesh::new(
            "quad",
            vec![
                Vec3::new(-h, -h, -2.0),
                Vec3::new(-h, h, -2.0),
                Vec3::new(h, h, -2.0),
                Vec3::new(h, -h, -2.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
            material,
        )
    }

    #[test]
    fn test_empty_scene_builds() {
        let scene = Scene::builder().build().unwrap();
        assert_eq!(scene.triangle_count(), 0);
        assert!(scene.light().is_none());
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        assert!(scene.intersect(&ray).is_none());
        assert!(scene.miss_radiance(&ray).is_none());
    }

    #[test]
    fn test_invalid_index_rejected() {
        let mesh = TriangleMesh::new(
            "broken",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 7],
            Material::default(),
        );
        assert!(matches!(
            Scene::builder().add_mesh(mesh).build(),
            Err(SceneError::InvalidIndex { index: 7, .. })
        ));
    }

    #[test]
    fn test_closest_hit_picks_nearest() {
        let near = front_quad(1.0, Material::default());
        let mut far = front_quad(1.0, Material::default());
        for position in &mut far.positions {
            position.z = -5.0;
        }
        let scene = Scene::builder().add_mesh(far).add_mesh(near).build().unwrap();

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = scene.intersect(&ray).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_light_runs_and_area() {
        let lamp = front_quad(1.0, Material::emitter(Vec3::ONE));
        let floor = front_quad(3.0, Material::default());
        let scene = Scene::builder().add_mesh(floor).add_mesh(lamp).build().unwrap();

        // 2x2 quad = two triangles of area 2 each
        let light = scene.light().unwrap();
        match light {
            Light::Area { runs, total_area } => {
                assert_eq!(runs.len(), 1);
                assert_eq!(runs[0].triangle_count, 2);
                assert_eq!(runs[0].first_triangle, 2);
                assert!((total_area - 4.0).abs() < 1e-4);
            }
            _ => panic!("expected an area light"),
        }
        assert!(scene.credits_emissive_hits());
        assert!((scene.light_pdf(Vec3::Z) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_area_light_sampling() {
        let lamp = front_quad(1.0, Material::emitter(Vec3::new(2.0, 2.0, 2.0)));
        let scene = Scene::builder().add_mesh(lamp).build().unwrap();

        let sample = scene.sample_light([0.3, 0.4, 0.1, 0.9]).unwrap();
        assert!(sample.triangle.is_some());
        assert!((sample.radiance - Vec3::splat(2.0)).length() < 1e-6);
        assert!((sample.pdf - 0.25).abs() < 1e-6);
        // Sampled point lies on the quad plane
        assert!((sample.point.z + 2.0).abs() < 1e-5);
        assert!(sample.point.x.abs() <= 1.0 + 1e-5);
        // Normal faces the camera side, like intersection normals
        assert!((sample.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_material_lookup_per_triangle() {
        let red = front_quad(1.0, Material::diffuse(Vec3::X));
        let mut green = front_quad(1.0, Material::diffuse(Vec3::Y));
        for position in &mut green.positions {
            position.z = -4.0;
        }
        let scene = Scene::builder().add_mesh(red).add_mesh(green).build().unwrap();

        assert_eq!(scene.material_of(0).diffuse, Vec3::X);
        assert_eq!(scene.material_of(3).diffuse, Vec3::Y);
    }
}
