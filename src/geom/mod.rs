mod coefficients;
mod core;
mod diagnostics;
mod mesh;
mod metrics;
mod surface;

pub use coefficients::{
    BernsteinBasis, CoefficientCache, CoefficientCacheStats, CoefficientError, MAX_DEGREE,
    bernstein, binomial, factorial,
};
pub use core::{Point3, Tolerance, Vec3};
pub use diagnostics::TessellationDiagnostics;
pub use mesh::{MeshVertex, SurfaceContext, SurfaceMesh};
pub use metrics::{SurfaceMetrics, SurfaceTimingReport, TimingBucket};
pub use surface::{BezierSurface, SampleSpacing, SurfaceError};

#[cfg(test)]
mod tests;
