//! Lumen core - scene inputs and external file formats.
//!
//! This crate provides:
//!
//! - **Scene inputs**: `Material`, `TriangleMesh`
//! - **OBJ support**: Wavefront OBJ/MTL import
//! - **HDR images**: linear `Image` container and the RGBE (Radiance `.hdr`)
//!   codec used for environment maps and render output

pub mod hdr;
pub mod image;
pub mod material;
pub mod mesh;
pub mod obj;

// Re-export commonly used types
pub use hdr::{read_hdr, write_hdr, HdrError};
pub use image::Image;
pub use material::Material;
pub use mesh::TriangleMesh;
pub use obj::{load_obj, ObjError};
