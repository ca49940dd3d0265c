use std::collections::TryReserveError;

use serde::Serialize;

use super::coefficients::CoefficientCache;
use super::metrics::SurfaceMetrics;

/// One mesh vertex: a sampled surface position and the normal of the triangle
/// it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeshVertex {
    pub position: [f64; 3],
    pub normal: [f64; 3],
}

/// Triangle list produced by tessellating a surface.
///
/// Vertices are never shared between triangles: every index triple refers to
/// three consecutive vertices, so each triangle carries its own flat normal.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SurfaceMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    #[must_use]
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Create an empty mesh with room for `triangles` flat-shaded triangles.
    ///
    /// Fails instead of aborting when the buffers cannot be allocated.
    pub fn try_with_triangle_capacity(triangles: usize) -> Result<Self, TryReserveError> {
        let slots = triangles.checked_mul(3).unwrap_or(usize::MAX);
        let mut mesh = Self::default();
        mesh.vertices.try_reserve_exact(slots)?;
        mesh.indices.try_reserve_exact(slots)?;
        Ok(mesh)
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends a triangle with three fresh vertices sharing `normal`.
    pub fn push_triangle(&mut self, corners: [[f64; 3]; 3], normal: [f64; 3]) {
        let offset = self.vertices.len() as u32;
        self.indices.extend_from_slice(&[offset, offset + 1, offset + 2]);
        self.vertices.extend(corners.into_iter().map(|position| MeshVertex { position, normal }));
    }

    /// Iterates over vertex positions.
    pub fn positions(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    /// Iterates over index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.vertices
            .iter()
            .any(|v| v.position.iter().any(|c| !c.is_finite()))
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    /// Returns true if indices represent a triangle list.
    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        Ok(())
    }
}

/// Explicit state for a tessellation pass: the coefficient tables to read from
/// and the timing accumulator to write to.
#[derive(Debug, Default)]
pub struct SurfaceContext {
    pub cache: CoefficientCache,
    pub metrics: SurfaceMetrics,
}

impl SurfaceContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
