//! Diagnostics reported by a tessellation pass.
//!
//! A [`TessellationDiagnostics`] is produced every time a surface recomputes
//! its mesh. A cached mesh keeps the diagnostics of the pass that built it.
//!
//! # Example
//!
//! ```ignore
//! surface.polygonize()?;
//! if let Some(diag) = surface.last_diagnostics() {
//!     println!("{}", diag.summary());
//! }
//! ```

use std::fmt;

use super::metrics::SurfaceTimingReport;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TessellationDiagnostics {
    /// Total number of vertices in the mesh (three per triangle).
    pub vertex_count: usize,

    /// Total number of triangles in the mesh.
    pub triangle_count: usize,

    /// Number of parameter-space quads sampled.
    pub quad_count: usize,

    /// Triangles whose edges are parallel or collapsed, so no face normal exists.
    ///
    /// They stay in the mesh with a zero normal.
    pub degenerate_triangle_count: usize,

    /// Whether quad rows were evaluated on the rayon pool.
    pub parallel: bool,

    /// Only populated with the `surface_metrics` feature on non-WASM targets.
    pub timing: Option<SurfaceTimingReport>,

    pub warnings: Vec<String>,
}

impl TessellationDiagnostics {
    /// Returns `true` when the pass produced no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangle_count == 0
    }

    /// Returns `true` if every triangle has a face normal and nothing was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_triangle_count == 0 && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.parallel {
            parts.push("parallel".to_string());
        }
        if let Some(ref timing) = self.timing {
            parts.push(format!("{:.3}ms", timing.total_ms()));
        }

        parts.join(" ")
    }
}

impl fmt::Display for TessellationDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tessellation Diagnostics:")?;
        writeln!(f, "  Quads: {}", self.quad_count)?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if self.degenerate_triangle_count > 0 {
            writeln!(f, "  Degenerate triangles: {}", self.degenerate_triangle_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_empty() {
            "EMPTY"
        } else if self.is_clean() {
            "CLEAN"
        } else {
            "ISSUES DETECTED"
        };
        writeln!(f, "  Status: {status}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean_and_empty() {
        let diag = TessellationDiagnostics::default();
        assert!(diag.is_clean());
        assert!(diag.is_empty());
    }

    #[test]
    fn test_degenerates_are_not_clean() {
        let diag = TessellationDiagnostics {
            triangle_count: 2,
            degenerate_triangle_count: 1,
            ..Default::default()
        };
        assert!(!diag.is_clean());
        assert!(!diag.is_empty());
    }

    #[test]
    fn test_summary() {
        let diag = TessellationDiagnostics {
            vertex_count: 12,
            triangle_count: 4,
            degenerate_triangle_count: 2,
            ..Default::default()
        };

        let summary = diag.summary();
        assert!(summary.contains("V:12"));
        assert!(summary.contains("T:4"));
        assert!(summary.contains("degenerate:2"));
    }

    #[test]
    fn test_display() {
        let mut diag = TessellationDiagnostics {
            quad_count: 1,
            vertex_count: 6,
            triangle_count: 2,
            degenerate_triangle_count: 2,
            ..Default::default()
        };
        diag.add_warning("test warning");

        let output = format!("{diag}");
        assert!(output.contains("Quads: 1"));
        assert!(output.contains("Triangles: 2"));
        assert!(output.contains("test warning"));
        assert!(output.contains("ISSUES DETECTED"));
    }
}
