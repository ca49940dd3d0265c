//! Tensor-product Bezier surfaces and their flat-shaded tessellation.
//!
//! A [`BezierSurface`] owns a `(degree_u + 1) x (degree_v + 1)` grid of control
//! points and blends them with Bernstein polynomials. Calling
//! [`BezierSurface::polygonize`] samples the parameter square on a
//! `resolution_u x resolution_v` grid and returns a triangle list with one
//! normal per triangle. The mesh is cached until the next mutation.
//!
//! # Example
//!
//! ```ignore
//! use bezier_surface::geom::{BezierSurface, Point3};
//!
//! let mut surface = BezierSurface::new(1, 1, 2, 2)?;
//! surface.set_control_point(1, 1, Point3::new(1.0, 0.0, 1.0))?;
//! let mesh = surface.polygonize()?;
//! assert_eq!(mesh.triangle_count(), 2);
//! ```

use std::collections::TryReserveError;
use std::mem::size_of;

use serde::{Deserialize, Serialize};

use super::coefficients::{BernsteinBasis, CoefficientCache, CoefficientError, MAX_DEGREE};
use super::core::{Point3, Vec3};
use super::diagnostics::TessellationDiagnostics;
use super::mesh::{MeshVertex, SurfaceContext, SurfaceMesh};
use super::metrics::{SurfaceMetrics, TimingBucket};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("control point ({u}, {v}) is outside the degree ({degree_u}, {degree_v}) grid")]
    ControlPointOutOfRange {
        u: u32,
        v: u32,
        degree_u: u32,
        degree_v: u32,
    },
    #[error("degree {degree} exceeds the maximum supported degree {max}")]
    DegreeTooLarge { degree: u32, max: u32 },
    #[error("surface requires {expected} control points, got {actual}")]
    ControlPointCount { expected: usize, actual: usize },
    #[error("tessellation needs {vertices} vertices, more than can be indexed or allocated")]
    MeshTooLarge { vertices: u64 },
    #[error(transparent)]
    Coefficients(#[from] CoefficientError),
}

/// How sample indices map to surface parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSpacing {
    /// `t_i = i / resolution`. The far corner of the last quad sits at
    /// `(resolution - 1) / resolution`, so the edges `u = 1` and `v = 1` are
    /// never reached.
    #[default]
    Fractional,
    /// `t_i = i / (resolution - 1)`. The samples span the whole parameter
    /// square, including `u = 1` and `v = 1`.
    Closed,
}

impl SampleSpacing {
    fn parameter(self, sample: u32, resolution: u32) -> f64 {
        let divisor = match self {
            Self::Fractional => resolution,
            Self::Closed => resolution.saturating_sub(1).max(1),
        };
        f64::from(sample) / f64::from(divisor)
    }
}

/// The Bernstein bases for both parameter directions of one surface.
#[derive(Debug, Clone, PartialEq)]
struct SurfaceBases {
    u: BernsteinBasis,
    v: BernsteinBasis,
}

impl SurfaceBases {
    fn resolve(
        cache: &mut CoefficientCache,
        degree_u: u32,
        degree_v: u32,
    ) -> Result<Self, CoefficientError> {
        Ok(Self {
            u: BernsteinBasis::new(cache, degree_u)?,
            v: BernsteinBasis::new(cache, degree_v)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tessellation {
    mesh: SurfaceMesh,
    diagnostics: TessellationDiagnostics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BezierSurface {
    degree_u: u32,
    degree_v: u32,
    resolution_u: u32,
    resolution_v: u32,
    spacing: SampleSpacing,
    /// Row-major by `u`: point `(u, v)` lives at `u * (degree_v + 1) + v`.
    control_points: Vec<Point3>,
    /// `None` while dirty. Replaced as a whole, never patched in place.
    cached: Option<Tessellation>,
}

fn check_degree(degree: u32) -> Result<(), SurfaceError> {
    if degree > MAX_DEGREE {
        return Err(SurfaceError::DegreeTooLarge {
            degree,
            max: MAX_DEGREE,
        });
    }
    Ok(())
}

fn grid_len(degree_u: u32, degree_v: u32) -> usize {
    (degree_u as usize + 1) * (degree_v as usize + 1)
}

fn face_normal(a: Point3, b: Point3, c: Point3) -> Option<Vec3> {
    (b - a).cross(c - a).normalized()
}

impl BezierSurface {
    /// Creates a surface whose control points all sit at the origin.
    pub fn new(
        degree_u: u32,
        degree_v: u32,
        resolution_u: u32,
        resolution_v: u32,
    ) -> Result<Self, SurfaceError> {
        check_degree(degree_u)?;
        check_degree(degree_v)?;
        Ok(Self {
            degree_u,
            degree_v,
            resolution_u,
            resolution_v,
            spacing: SampleSpacing::default(),
            control_points: vec![Point3::ORIGIN; grid_len(degree_u, degree_v)],
            cached: None,
        })
    }

    /// Creates a surface from control points given in row-major `(u, v)` order.
    pub fn with_control_points(
        degree_u: u32,
        degree_v: u32,
        resolution_u: u32,
        resolution_v: u32,
        control_points: Vec<Point3>,
    ) -> Result<Self, SurfaceError> {
        let mut surface = Self::new(degree_u, degree_v, resolution_u, resolution_v)?;
        surface.set_control_points(control_points)?;
        Ok(surface)
    }

    #[must_use]
    pub fn degrees(&self) -> (u32, u32) {
        (self.degree_u, self.degree_v)
    }

    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        (self.resolution_u, self.resolution_v)
    }

    #[must_use]
    pub fn spacing(&self) -> SampleSpacing {
        self.spacing
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    /// Returns `true` when the next [`polygonize`](Self::polygonize) will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cached.is_none()
    }

    /// Diagnostics of the pass that built the cached mesh, if it is current.
    #[must_use]
    pub fn last_diagnostics(&self) -> Option<&TessellationDiagnostics> {
        self.cached.as_ref().map(|t| &t.diagnostics)
    }

    fn mark_dirty(&mut self) {
        self.cached = None;
    }

    fn index(&self, u: u32, v: u32) -> Result<usize, SurfaceError> {
        if u > self.degree_u || v > self.degree_v {
            return Err(SurfaceError::ControlPointOutOfRange {
                u,
                v,
                degree_u: self.degree_u,
                degree_v: self.degree_v,
            });
        }
        Ok(u as usize * (self.degree_v as usize + 1) + v as usize)
    }

    pub fn set_control_point(&mut self, u: u32, v: u32, point: Point3) -> Result<(), SurfaceError> {
        let index = self.index(u, v)?;
        self.control_points[index] = point;
        self.mark_dirty();
        Ok(())
    }

    pub fn control_point(&self, u: u32, v: u32) -> Result<Point3, SurfaceError> {
        let index = self.index(u, v)?;
        Ok(self.control_points[index])
    }

    /// Replaces the whole grid. The count must match the current degrees;
    /// on mismatch the surface is left untouched.
    pub fn set_control_points(
        &mut self,
        points: impl IntoIterator<Item = Point3>,
    ) -> Result<(), SurfaceError> {
        let points: Vec<Point3> = points.into_iter().collect();
        let expected = grid_len(self.degree_u, self.degree_v);
        if points.len() != expected {
            return Err(SurfaceError::ControlPointCount {
                expected,
                actual: points.len(),
            });
        }
        self.control_points = points;
        self.mark_dirty();
        Ok(())
    }

    /// Changes the grid dimensions.
    ///
    /// A real change reallocates the grid with every point back at the origin.
    /// Setting the current degrees again keeps the points. Either way the mesh
    /// is invalidated.
    pub fn set_degrees(&mut self, degree_u: u32, degree_v: u32) -> Result<(), SurfaceError> {
        check_degree(degree_u)?;
        check_degree(degree_v)?;
        if (degree_u, degree_v) != (self.degree_u, self.degree_v) {
            self.degree_u = degree_u;
            self.degree_v = degree_v;
            self.control_points = vec![Point3::ORIGIN; grid_len(degree_u, degree_v)];
        }
        self.mark_dirty();
        Ok(())
    }

    pub fn set_resolution(&mut self, resolution_u: u32, resolution_v: u32) {
        self.resolution_u = resolution_u;
        self.resolution_v = resolution_v;
        self.mark_dirty();
    }

    pub fn set_spacing(&mut self, spacing: SampleSpacing) {
        self.spacing = spacing;
        self.mark_dirty();
    }

    /// Evaluates the surface at `(u, v)` using the process-wide coefficient cache.
    pub fn point_at(&self, u: f64, v: f64) -> Result<Point3, SurfaceError> {
        let mut cache = CoefficientCache::lock_shared();
        self.point_at_with_cache(&mut cache, u, v)
    }

    pub fn point_at_with_cache(
        &self,
        cache: &mut CoefficientCache,
        u: f64,
        v: f64,
    ) -> Result<Point3, SurfaceError> {
        let bases = SurfaceBases::resolve(cache, self.degree_u, self.degree_v)?;
        Ok(self.blend(&bases.u.weights(u), &bases.v.weights(v)))
    }

    /// Returns the tessellated mesh, recomputing it first if the surface changed.
    ///
    /// Binomial rows come from the process-wide cache; its lock is held only
    /// while they are fetched.
    pub fn polygonize(&mut self) -> Result<&SurfaceMesh, SurfaceError> {
        let mut metrics = SurfaceMetrics::default();
        self.polygonize_inner(&mut metrics, |degree_u, degree_v| {
            let mut cache = CoefficientCache::lock_shared();
            SurfaceBases::resolve(&mut cache, degree_u, degree_v)
        })
    }

    /// Same as [`polygonize`](Self::polygonize) with an explicit cache and metrics.
    pub fn polygonize_with_context(
        &mut self,
        ctx: &mut SurfaceContext,
    ) -> Result<&SurfaceMesh, SurfaceError> {
        let SurfaceContext { cache, metrics } = ctx;
        self.polygonize_inner(metrics, |degree_u, degree_v| {
            SurfaceBases::resolve(cache, degree_u, degree_v)
        })
    }

    fn polygonize_inner(
        &mut self,
        metrics: &mut SurfaceMetrics,
        resolve: impl FnOnce(u32, u32) -> Result<SurfaceBases, CoefficientError>,
    ) -> Result<&SurfaceMesh, SurfaceError> {
        let tessellation = match self.cached.take() {
            Some(current) => current,
            None => {
                metrics.begin();
                let bases = metrics.time(TimingBucket::Coefficients, || {
                    resolve(self.degree_u, self.degree_v)
                })?;
                self.tessellate(&bases, metrics)?
            }
        };
        Ok(&self.cached.insert(tessellation).mesh)
    }

    /// Direct bivariate Bernstein blend over the full control grid.
    fn blend(&self, weights_u: &[f64], weights_v: &[f64]) -> Point3 {
        let stride = self.degree_v as usize + 1;
        let mut out = Point3::ORIGIN;
        for (row, &bu) in self.control_points.chunks_exact(stride).zip(weights_u) {
            for (&point, &bv) in row.iter().zip(weights_v) {
                out = out.add_weighted(point, bu * bv);
            }
        }
        out
    }

    fn sample_weights(&self, basis: &BernsteinBasis, samples: u32, resolution: u32) -> Vec<Vec<f64>> {
        (0..samples)
            .map(|i| basis.weights(self.spacing.parameter(i, resolution)))
            .collect()
    }

    /// Evaluates every sample point once, row-major by `u`.
    fn sample_grid(
        &self,
        weights_u: &[Vec<f64>],
        weights_v: &[Vec<f64>],
    ) -> Result<Vec<Vec<Point3>>, TryReserveError> {
        let row = |wu: &Vec<f64>| -> Result<Vec<Point3>, TryReserveError> {
            let mut row = Vec::new();
            row.try_reserve_exact(weights_v.len())?;
            row.extend(weights_v.iter().map(|wv| self.blend(wu, wv)));
            Ok(row)
        };

        #[cfg(feature = "parallel")]
        {
            weights_u.par_iter().map(row).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            let mut grid = Vec::new();
            grid.try_reserve_exact(weights_u.len())?;
            for wu in weights_u {
                grid.push(row(wu)?);
            }
            Ok(grid)
        }
    }

    fn tessellate(
        &self,
        bases: &SurfaceBases,
        metrics: &mut SurfaceMetrics,
    ) -> Result<Tessellation, SurfaceError> {
        log::debug!(
            "tessellating bezier surface: degrees ({}, {}), resolution ({}, {}), spacing {:?}",
            self.degree_u,
            self.degree_v,
            self.resolution_u,
            self.resolution_v,
            self.spacing
        );

        // The last sample row and column only appear as far quad corners.
        let quads_u = self.resolution_u.saturating_sub(1);
        let quads_v = self.resolution_v.saturating_sub(1);
        let quads = u64::from(quads_u) * u64::from(quads_v);
        let vertices = quads.saturating_mul(6);
        if vertices > max_mesh_vertices() {
            return Err(SurfaceError::MeshTooLarge { vertices });
        }
        let too_large = |err: TryReserveError| {
            log::warn!("could not allocate a mesh of {vertices} vertices: {err}");
            SurfaceError::MeshTooLarge { vertices }
        };
        let quad_count = quads as usize;
        let triangle_count = quad_count * 2;

        let mut diagnostics = TessellationDiagnostics {
            quad_count,
            parallel: cfg!(feature = "parallel"),
            ..Default::default()
        };
        // Reserve the mesh before sampling so an oversized request fails fast.
        let mut mesh = SurfaceMesh::try_with_triangle_capacity(triangle_count).map_err(too_large)?;

        if quad_count > 0 {
            let grid = metrics
                .time(TimingBucket::Evaluation, || {
                    let weights_u = self.sample_weights(&bases.u, quads_u + 1, self.resolution_u);
                    let weights_v = self.sample_weights(&bases.v, quads_v + 1, self.resolution_v);
                    self.sample_grid(&weights_u, &weights_v)
                })
                .map_err(too_large)?;

            metrics.time(TimingBucket::Triangulation, || {
                for i in 0..quads_u as usize {
                    for j in 0..quads_v as usize {
                        let a = grid[i][j];
                        let b = grid[i + 1][j];
                        let c = grid[i + 1][j + 1];
                        let d = grid[i][j + 1];

                        for [p0, p1, p2] in [[a, b, c], [a, c, d]] {
                            let normal = face_normal(p0, p1, p2).unwrap_or_else(|| {
                                diagnostics.degenerate_triangle_count += 1;
                                Vec3::ZERO
                            });
                            mesh.push_triangle(
                                [p0.to_array(), p1.to_array(), p2.to_array()],
                                normal.to_array(),
                            );
                        }
                    }
                }
            });
        }

        diagnostics.vertex_count = mesh.vertex_count();
        diagnostics.triangle_count = mesh.triangle_count();
        if diagnostics.degenerate_triangle_count > 0 {
            log::warn!(
                "{} of {} triangles have no face normal",
                diagnostics.degenerate_triangle_count,
                diagnostics.triangle_count
            );
            diagnostics.add_warning(format!(
                "{} degenerate triangles received a zero normal",
                diagnostics.degenerate_triangle_count
            ));
        }
        diagnostics.timing = metrics.end();
        log::debug!("bezier surface tessellated: {}", diagnostics.summary());

        Ok(Tessellation { mesh, diagnostics })
    }
}

/// Largest vertex count a single mesh may hold: indices are `u32` and the
/// vertex buffer must stay within `isize::MAX` bytes.
fn max_mesh_vertices() -> u64 {
    let addressable = (isize::MAX as u64) / (size_of::<MeshVertex>() as u64);
    addressable.min(u64::from(u32::MAX))
}
