//! Random height-field patches for interactive viewing.
//!
//! [`build_patch`] lays the control grid out on a regular `size_u x size_v`
//! rectangle in the XZ plane and lifts every point by a seeded random height.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geom::{BezierSurface, MAX_DEGREE, Point3, SampleSpacing, SurfaceError};

/// Largest resolution the host UI exposes per axis.
pub const MAX_RESOLUTION: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchParams {
    pub degree_u: u32,
    pub degree_v: u32,
    pub resolution_u: u32,
    pub resolution_v: u32,
    pub size_u: f64,
    pub size_v: f64,
    pub height_scale: f64,
    pub seed: u64,
    pub spacing: SampleSpacing,
}

impl Default for PatchParams {
    fn default() -> Self {
        Self {
            degree_u: 3,
            degree_v: 3,
            resolution_u: 50,
            resolution_v: 50,
            size_u: 1.0,
            size_v: 1.0,
            height_scale: 0.5,
            seed: 0,
            spacing: SampleSpacing::default(),
        }
    }
}

impl PatchParams {
    /// Clamps degrees to `1..=MAX_DEGREE` and resolutions to `1..=MAX_RESOLUTION`.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.degree_u = clamp_degree(self.degree_u);
        self.degree_v = clamp_degree(self.degree_v);
        self.resolution_u = clamp_resolution(self.resolution_u);
        self.resolution_v = clamp_resolution(self.resolution_v);
        self
    }
}

#[must_use]
pub fn clamp_degree(degree: u32) -> u32 {
    degree.clamp(1, MAX_DEGREE)
}

#[must_use]
pub fn clamp_resolution(resolution: u32) -> u32 {
    resolution.clamp(1, MAX_RESOLUTION)
}

/// Builds a surface whose control point `(u, v)` sits at
/// `(u * size_u, h * height_scale, v * size_v)` with `h` drawn from `[0, 1)`.
///
/// Points are drawn row-major by `u`, so the same seed always yields the same
/// patch for a given pair of degrees.
pub fn build_patch(params: &PatchParams) -> Result<BezierSurface, SurfaceError> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let rows = params.degree_u as usize + 1;
    let mut points = Vec::with_capacity(rows * (params.degree_v as usize + 1));
    for u in 0..=params.degree_u {
        for v in 0..=params.degree_v {
            let h: f64 = rng.random();
            points.push(Point3::new(
                f64::from(u) * params.size_u,
                h * params.height_scale,
                f64::from(v) * params.size_v,
            ));
        }
    }

    let mut surface = BezierSurface::with_control_points(
        params.degree_u,
        params.degree_v,
        params.resolution_u,
        params.resolution_v,
        points,
    )?;
    surface.set_spacing(params.spacing);
    log::debug!(
        "built random patch: degrees ({}, {}), seed {}",
        params.degree_u,
        params.degree_v,
        params.seed
    );
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_viewer() {
        let params = PatchParams::default();
        assert_eq!((params.degree_u, params.degree_v), (3, 3));
        assert_eq!((params.resolution_u, params.resolution_v), (50, 50));
        assert_eq!(params.height_scale, 0.5);
    }

    #[test]
    fn patch_fills_the_whole_grid() {
        let params = PatchParams {
            degree_u: 4,
            degree_v: 2,
            size_u: 2.0,
            size_v: 3.0,
            ..PatchParams::default()
        };
        let surface = build_patch(&params).unwrap();
        assert_eq!(surface.control_points().len(), 15);

        let far = surface.control_point(4, 2).unwrap();
        assert_eq!((far.x, far.z), (8.0, 6.0));
        for p in surface.control_points() {
            assert!((0.0..0.5).contains(&p.y), "height {} out of range", p.y);
        }
    }

    #[test]
    fn same_seed_same_patch() {
        let params = PatchParams {
            seed: 42,
            ..PatchParams::default()
        };
        let a = build_patch(&params).unwrap();
        let b = build_patch(&params).unwrap();
        assert_eq!(a.control_points(), b.control_points());

        let other = build_patch(&PatchParams { seed: 43, ..params }).unwrap();
        assert_ne!(a.control_points(), other.control_points());
    }

    #[test]
    fn clamped_limits_degrees_and_resolutions() {
        let params = PatchParams {
            degree_u: 0,
            degree_v: 100,
            resolution_u: 0,
            resolution_v: 20_000,
            ..PatchParams::default()
        }
        .clamped();
        assert_eq!((params.degree_u, params.degree_v), (1, MAX_DEGREE));
        assert_eq!((params.resolution_u, params.resolution_v), (1, MAX_RESOLUTION));
    }

    #[test]
    fn oversized_degree_is_an_error() {
        let params = PatchParams {
            degree_u: MAX_DEGREE + 1,
            ..PatchParams::default()
        };
        assert!(matches!(
            build_patch(&params),
            Err(SurfaceError::DegreeTooLarge { .. })
        ));
    }
}
