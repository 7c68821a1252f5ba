//! OBJ file loader for collision meshes

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::physics::collision::mesh::CollisionMesh;
use crate::physics::collision::primitives::Triangle;

/// Errors produced while loading an OBJ file
#[derive(Error, Debug)]
pub enum ObjError {
    /// Underlying file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A numeric field failed to parse
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Structurally invalid content (bad indices, no geometry)
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Loader for Wavefront OBJ geometry
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file as a collision mesh
    ///
    /// Reads `v` positions and `f` faces (any `v/vt/vn` form, position
    /// index only); polygons are fan-triangulated. Texture coordinates,
    /// normals, and all other statements are ignored — face normals are
    /// recomputed from the winding.
    pub fn load_collision_mesh<P: AsRef<Path>>(path: P) -> Result<CollisionMesh, ObjError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut positions: Vec<Vec3> = Vec::new();
        let mut triangles: Vec<Triangle> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "v" => {
                    if parts.len() < 4 {
                        return Err(ObjError::ParseError(format!(
                            "vertex line with {} fields",
                            parts.len() - 1
                        )));
                    }
                    let x: f32 = parts[1]
                        .parse()
                        .map_err(|_| ObjError::ParseError("Invalid vertex x".to_string()))?;
                    let y: f32 = parts[2]
                        .parse()
                        .map_err(|_| ObjError::ParseError("Invalid vertex y".to_string()))?;
                    let z: f32 = parts[3]
                        .parse()
                        .map_err(|_| ObjError::ParseError("Invalid vertex z".to_string()))?;
                    positions.push(Vec3::new(x, y, z));
                }
                "f" => {
                    if parts.len() < 4 {
                        return Err(ObjError::InvalidFormat(
                            "face with fewer than 3 vertices".to_string(),
                        ));
                    }

                    let mut face = Vec::with_capacity(parts.len() - 1);
                    for vertex in &parts[1..] {
                        // "v", "v/vt", "v//vn", "v/vt/vn" all start with the
                        // position index
                        let index_text = vertex.split('/').next().unwrap_or("");
                        let index: i64 = index_text.parse().map_err(|_| {
                            ObjError::ParseError(format!("Invalid face index {vertex:?}"))
                        })?;

                        // OBJ indices are 1-based; negative (relative)
                        // indices are not supported by this loader
                        if index < 1 || index as usize > positions.len() {
                            return Err(ObjError::InvalidFormat(format!(
                                "face index {index} out of range (have {} vertices)",
                                positions.len()
                            )));
                        }
                        face.push(positions[index as usize - 1]);
                    }

                    // Fan triangulation for quads and larger polygons
                    for i in 1..face.len() - 1 {
                        triangles.push(Triangle::new(face[0], face[i], face[i + 1]));
                    }
                }
                // vt, vn, usemtl, o, g, s, mtllib...
                _ => {}
            }
        }

        if triangles.is_empty() {
            return Err(ObjError::InvalidFormat(
                "No faces found in OBJ file".to_string(),
            ));
        }

        info!(
            "Loaded OBJ mesh: {} vertices, {} triangles",
            positions.len(),
            triangles.len()
        );
        Ok(CollisionMesh::from_triangles(triangles))
    }
}
