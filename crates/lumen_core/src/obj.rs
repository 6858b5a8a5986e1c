//! Wavefront OBJ/MTL import.
//!
//! Line-by-line parser for the subset the renderer needs:
//!
//! - `v x y z`
//! - `f a b c ...` (fan-triangulated; `a/t/n` forms accepted, only the
//!   position index is used; negative indices are relative)
//! - `usemtl name` / `mtllib file.mtl`
//! - MTL: `newmtl`, `Kd`, `Ks`, `Ke`, `Ni`, `Ns`
//!
//! Anything else is skipped. Faces are grouped by material into one
//! `TriangleMesh` per material group, each with a compacted vertex array.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use lumen_math::Vec3;
use thiserror::Error;

use crate::material::Material;
use crate::mesh::TriangleMesh;

/// Errors that can occur during OBJ/MTL import.
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("face index {index} is out of range ({count} vertices defined)")]
    IndexOutOfRange { index: i64, count: usize },

    #[error("unknown material: {0}")]
    UnknownMaterial(String),
}

pub type ObjResult<T> = Result<T, ObjError>;

/// Load an OBJ file, returning one mesh per material group.
pub fn load_obj(path: impl AsRef<Path>) -> ObjResult<Vec<TriangleMesh>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let meshes = parse_obj(&content, base_dir)?;
    log::info!(
        "Loaded {} meshes ({} triangles) from {}",
        meshes.len(),
        meshes.iter().map(TriangleMesh::triangle_count).sum::<usize>(),
        path.display()
    );
    Ok(meshes)
}

/// Parse OBJ content. `base_dir` resolves relative `mtllib` references.
pub fn parse_obj(content: &str, base_dir: &Path) -> ObjResult<Vec<TriangleMesh>> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut materials: HashMap<String, Material> = HashMap::new();
    let mut groups: Vec<FaceGroup> = Vec::new();
    let mut current: Option<usize> = None;

    for (number, raw) in content.lines().enumerate() {
        let line_number = number + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap();

        match keyword {
            "v" => {
                vertices.push(parse_vec3(&mut tokens, line_number)?);
            }
            "f" => {
                let group_index = *current.get_or_insert_with(|| {
                    groups.push(FaceGroup::untextured());
                    groups.len() - 1
                });
                let corners = tokens
                    .map(|token| resolve_index(token, vertices.len(), line_number))
                    .collect::<ObjResult<Vec<u32>>>()?;
                if corners.len() < 3 {
                    return Err(ObjError::Parse {
                        line: line_number,
                        message: format!("face with {} corners", corners.len()),
                    });
                }
                // Fan triangulation
                for i in 1..corners.len() - 1 {
                    groups[group_index]
                        .triangles
                        .extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                }
            }
            "usemtl" => {
                let name = tokens.next().ok_or_else(|| ObjError::Parse {
                    line: line_number,
                    message: "usemtl without a name".to_string(),
                })?;
                let material = materials
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ObjError::UnknownMaterial(name.to_string()))?;
                // Reuse the group if this material was already active before
                let existing = groups.iter().position(|g| g.name == name);
                current = Some(existing.unwrap_or_else(|| {
                    groups.push(FaceGroup::new(name, material));
                    groups.len() - 1
                }));
            }
            "mtllib" => {
                let file = tokens.next().ok_or_else(|| ObjError::Parse {
                    line: line_number,
                    message: "mtllib without a file".to_string(),
                })?;
                let mtl_content = fs::read_to_string(base_dir.join(file))?;
                parse_mtl(&mtl_content, &mut materials)?;
            }
            _ => {
                log::debug!("skipping OBJ statement: {keyword}");
            }
        }
    }

    Ok(groups
        .into_iter()
        .filter(|group| !group.triangles.is_empty())
        .map(|group| group.into_mesh(&vertices))
        .collect())
}

/// Parse MTL content into the material table.
pub fn parse_mtl(content: &str, materials: &mut HashMap<String, Material>) -> ObjResult<()> {
    let mut current: Option<String> = None;

    for (number, raw) in content.lines().enumerate() {
        let line_number = number + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap();

        if keyword == "newmtl" {
            let name = tokens.next().ok_or_else(|| ObjError::Parse {
                line: line_number,
                message: "newmtl without a name".to_string(),
            })?;
            materials.insert(name.to_string(), Material::default());
            current = Some(name.to_string());
            continue;
        }

        let Some(name) = &current else {
            // Statements before the first newmtl are ignored
            continue;
        };
        let material = materials.get_mut(name).expect("current material exists");

        match keyword {
            "Kd" => material.diffuse = parse_vec3(&mut tokens, line_number)?,
            "Ks" => material.specular = parse_vec3(&mut tokens, line_number)?,
            "Ke" => {
                let radiance = parse_vec3(&mut tokens, line_number)?;
                material.emissive = radiance;
                material.is_light = radiance != Vec3::ZERO;
            }
            "Ni" => material.ior = parse_f32(&mut tokens, line_number)?.max(1.0),
            "Ns" => {
                let shininess = parse_f32(&mut tokens, line_number)?;
                material.roughness = Material::roughness_from_shininess(shininess);
            }
            _ => {
                log::debug!("skipping MTL statement: {keyword}");
            }
        }
    }

    Ok(())
}

struct FaceGroup {
    name: String,
    material: Material,
    triangles: Vec<u32>,
}

impl FaceGroup {
    fn new(name: &str, material: Material) -> Self {
        Self {
            name: name.to_string(),
            material,
            triangles: Vec::new(),
        }
    }

    fn untextured() -> Self {
        Self {
            name: "default".to_string(),
            material: Material::default(),
            triangles: Vec::new(),
        }
    }

    /// Compact the global vertex list down to the vertices this group uses.
    fn into_mesh(self, vertices: &[Vec3]) -> TriangleMesh {
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut positions = Vec::new();
        let mut indices = Vec::with_capacity(self.triangles.len());

        for &global in &self.triangles {
            let local = *remap.entry(global).or_insert_with(|| {
                positions.push(vertices[global as usize]);
                (positions.len() - 1) as u32
            });
            indices.push(local);
        }

        TriangleMesh::new(self.name, positions, indices, self.material)
    }
}

fn parse_f32<'a>(tokens: &mut impl Iterator<Item = &'a str>, line: usize) -> ObjResult<f32> {
    tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| ObjError::Parse {
            line,
            message: "expected a number".to_string(),
        })
}

fn parse_vec3<'a>(tokens: &mut impl Iterator<Item = &'a str>, line: usize) -> ObjResult<Vec3> {
    let x = parse_f32(tokens, line)?;
    let y = parse_f32(tokens, line)?;
    let z = parse_f32(tokens, line)?;
    Ok(Vec3::new(x, y, z))
}

/// Turn an OBJ face token (`i`, `i/t`, `i/t/n`, `i//n`, possibly negative)
/// into a zero-based vertex index.
fn resolve_index(token: &str, vertex_count: usize, line: usize) -> ObjResult<u32> {
    let position = token.split('/').next().unwrap_or(token);
    let index: i64 = position.parse().map_err(|_| ObjError::Parse {
        line,
        message: format!("bad face index {token:?}"),
    })?;

    let resolved = if index > 0 {
        index - 1
    } else if index < 0 {
        vertex_count as i64 + index
    } else {
        -1
    };

    if resolved < 0 || resolved >= vertex_count as i64 {
        return Err(ObjError::IndexOutOfRange {
            index,
            count: vertex_count,
        });
    }
    Ok(resolved as u32)
}
