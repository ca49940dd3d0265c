//! Opt-in timing hooks for surface tessellation.
//!
//! Timing is only collected when the `surface_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! use bezier_surface::geom::{SurfaceMetrics, TimingBucket};
//!
//! let mut metrics = SurfaceMetrics::default();
//! metrics.begin();
//! let basis = metrics.time(TimingBucket::Coefficients, || resolve_basis());
//! if let Some(report) = metrics.end() {
//!     println!("coefficients: {} ns", report.coefficients_ns);
//! }
//! ```

/// Phases of a tessellation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Resolving binomial rows from the coefficient cache.
    Coefficients,
    /// Bernstein blending of the sample grid.
    Evaluation,
    /// Assembling the vertex and index buffers.
    Triangulation,
}

/// Cumulative nanosecond timings per [`TimingBucket`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfaceTimingReport {
    pub coefficients_ns: u64,
    pub evaluation_ns: u64,
    pub triangulation_ns: u64,
}

impl SurfaceTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.coefficients_ns
            .saturating_add(self.evaluation_ns)
            .saturating_add(self.triangulation_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing tessellation phases.
///
/// When the `surface_metrics` feature is disabled (or on WASM), all methods
/// are no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct SurfaceMetrics {
    #[cfg(all(feature = "surface_metrics", not(target_arch = "wasm32")))]
    report: SurfaceTimingReport,
}

impl SurfaceMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "surface_metrics", not(target_arch = "wasm32")))]
        {
            self.report = SurfaceTimingReport::default();
        }
    }

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<SurfaceTimingReport> {
        #[cfg(all(feature = "surface_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "surface_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "surface_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            let slot = match bucket {
                TimingBucket::Coefficients => &mut self.report.coefficients_ns,
                TimingBucket::Evaluation => &mut self.report.evaluation_ns,
                TimingBucket::Triangulation => &mut self.report.triangulation_ns,
            };
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "surface_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = SurfaceTimingReport {
            coefficients_ns: 1000,
            evaluation_ns: 2000,
            triangulation_ns: 3000,
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = SurfaceMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::Evaluation, || 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_end_matches_feature_gate() {
        let mut metrics = SurfaceMetrics::default();
        metrics.begin();
        let _ = metrics.time(TimingBucket::Coefficients, || ());
        let report = metrics.end();
        if cfg!(all(feature = "surface_metrics", not(target_arch = "wasm32"))) {
            assert!(report.is_some());
        } else {
            assert!(report.is_none());
        }
    }
}
