use crate::geom::{BezierSurface, Point3, SampleSpacing, SurfaceContext};

fn ramp(resolution: u32) -> BezierSurface {
    let mut surface = BezierSurface::new(2, 2, resolution, resolution).unwrap();
    for u in 0..=2_u32 {
        for v in 0..=2_u32 {
            surface
                .set_control_point(u, v, Point3::new(f64::from(u), f64::from(u + v) * 0.1, f64::from(v)))
                .unwrap();
        }
    }
    surface
}

#[test]
fn polygonize_twice_returns_cached_mesh() {
    let mut surface = ramp(6);
    let first = surface.polygonize().unwrap().clone();
    let first_ptr = surface.polygonize().unwrap().vertices.as_ptr();
    assert!(!surface.is_dirty());

    let second = surface.polygonize().unwrap();
    assert_eq!(&first, second);
    assert_eq!(second.vertices.as_ptr(), first_ptr, "cached buffer was rebuilt");
}

#[test]
fn recomputation_is_deterministic() {
    let mut a = ramp(7);
    let mut b = ramp(7);
    let mesh_a = a.polygonize().unwrap().clone();
    let mesh_b = b.polygonize().unwrap();
    assert_eq!(&mesh_a, mesh_b);
}

#[test]
fn control_point_write_invalidates_mesh() {
    let mut surface = ramp(5);
    let before = surface.polygonize().unwrap().clone();

    surface.set_control_point(1, 1, Point3::new(1.0, 3.0, 1.0)).unwrap();
    assert!(surface.is_dirty());
    assert!(surface.last_diagnostics().is_none());

    let after = surface.polygonize().unwrap();
    assert_eq!(after.vertex_count(), before.vertex_count());
    // The first vertex is the (0, 0) corner, which only depends on cp(0, 0).
    assert_eq!(after.vertices[0].position, before.vertices[0].position);
    let raised = after
        .vertices
        .iter()
        .zip(&before.vertices)
        .filter(|(a, b)| a.position[1] > b.position[1])
        .count();
    assert!(raised > 0, "no sampled position moved up");
}

#[test]
fn resolution_change_invalidates_mesh() {
    let mut surface = ramp(5);
    assert_eq!(surface.polygonize().unwrap().triangle_count(), 32);

    surface.set_resolution(3, 4);
    assert!(surface.is_dirty());
    assert_eq!(surface.polygonize().unwrap().triangle_count(), 12);
    assert_eq!(surface.resolution(), (3, 4));
}

#[test]
fn degree_change_invalidates_mesh() {
    let mut surface = ramp(4);
    let before = surface.polygonize().unwrap().clone();

    surface.set_degrees(1, 1).unwrap();
    assert!(surface.is_dirty());
    let after = surface.polygonize().unwrap();
    assert_eq!(after.triangle_count(), before.triangle_count());
    assert_ne!(after, &before);
    assert!(after.positions().all(|p| p == [0.0, 0.0, 0.0]));
}

#[test]
fn spacing_change_invalidates_mesh() {
    let mut surface = ramp(4);
    let before = surface.polygonize().unwrap().clone();
    surface.set_spacing(SampleSpacing::Closed);
    assert!(surface.is_dirty());
    assert_ne!(surface.polygonize().unwrap(), &before);
}

#[test]
fn context_and_shared_cache_agree() {
    let mut ctx = SurfaceContext::new();
    let mut a = ramp(6);
    let mut b = ramp(6);
    let with_ctx = a.polygonize_with_context(&mut ctx).unwrap().clone();
    let shared = b.polygonize().unwrap();
    assert_eq!(&with_ctx, shared);

    // A second pass against the same context reuses every binomial.
    a.set_resolution(5, 5);
    let misses = ctx.cache.stats().binomial_misses;
    a.polygonize_with_context(&mut ctx).unwrap();
    assert_eq!(ctx.cache.stats().binomial_misses, misses);
    assert!(ctx.cache.stats().binomial_hits > 0);
}

#[test]
fn diagnostics_follow_the_cached_mesh() {
    let mut surface = ramp(4);
    surface.polygonize().unwrap();
    let diag = surface.last_diagnostics().unwrap();
    assert_eq!(diag.quad_count, 9);
    assert_eq!(diag.triangle_count, 18);
    assert_eq!(diag.vertex_count, 54);
    assert!(diag.is_clean());
}
