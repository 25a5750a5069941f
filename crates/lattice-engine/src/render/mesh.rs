use crate::error::{RenderError, Result};

/// Structure-of-arrays mesh: one stream per vertex attribute plus 16-bit indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Unit cube (-1..1), 4 vertices per face so each face gets flat normals and full UVs.
    pub fn cube() -> Self {
        const FACES: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([1.0, 0.0, 0.0], [[1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [1.0, -1.0, -1.0]]),
            ([-1.0, 0.0, 0.0], [[-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0]]),
            ([0.0, 1.0, 0.0], [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]]),
            ([0.0, -1.0, 0.0], [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
            ([0.0, 0.0, 1.0], [[1.0, 1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, -1.0, 1.0], [1.0, -1.0, 1.0]]),
            ([0.0, 0.0, -1.0], [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0]]),
        ];
        const FACE_UVS: [[f32; 2]; 4] = [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

        let mut mesh = Self {
            positions: Vec::with_capacity(24),
            normals: Vec::with_capacity(24),
            texcoords: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (face, (normal, corners)) in FACES.iter().enumerate() {
            let base = (face * 4) as u16;
            mesh.positions.extend_from_slice(corners);
            mesh.normals.extend_from_slice(&[*normal; 4]);
            mesh.texcoords.extend_from_slice(&FACE_UVS);
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Checks the streams agree in length and every index addresses a vertex.
    pub fn validate(&self) -> Result<()> {
        const STAGE: &str = "mesh data";

        let n = self.positions.len();
        if n == 0 || self.indices.is_empty() {
            return Err(RenderError::resource(STAGE, "mesh has no vertices or indices"));
        }
        if self.normals.len() != n || self.texcoords.len() != n {
            return Err(RenderError::resource(
                STAGE,
                format!(
                    "stream length mismatch: {} positions, {} normals, {} texcoords",
                    n,
                    self.normals.len(),
                    self.texcoords.len()
                ),
            ));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::resource(
                STAGE,
                format!("index count {} is not a triangle list", self.indices.len()),
            ));
        }
        if let Some(bad) = self.indices.iter().find(|&&i| usize::from(i) >= n) {
            return Err(RenderError::resource(
                STAGE,
                format!("index {bad} out of range for {n} vertices"),
            ));
        }
        Ok(())
    }
}
