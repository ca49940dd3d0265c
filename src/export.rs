//! OBJ and golden snapshot output for tessellated surfaces.
//!
//! Snapshots are plain text with every coordinate quantized to
//! [`SNAPSHOT_QUANTIZE`] so they stay stable across platforms.

use std::fmt::Write as _;
use std::io::Write;

use crate::geom::{SurfaceMesh, TessellationDiagnostics};

pub const SNAPSHOT_QUANTIZE: f64 = 1e-6;
pub const SNAPSHOT_DECIMALS: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("mesh validation failed: {0}")]
    InvalidMesh(String),
    #[error("write obj: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes `mesh` as a Wavefront OBJ object with one `vn` per vertex.
pub fn write_obj<W: Write>(w: &mut W, mesh: &SurfaceMesh, name: &str) -> Result<(), ExportError> {
    mesh.validate().map_err(ExportError::InvalidMesh)?;

    writeln!(w, "# bezier-surface")?;
    writeln!(w, "o {name}")?;
    for v in &mesh.vertices {
        let p = v.position;
        writeln!(w, "v {} {} {}", p[0], p[1], p[2])?;
    }
    for v in &mesh.vertices {
        let n = v.normal;
        writeln!(w, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    for [a, b, c] in mesh.triangles() {
        let (a, b, c) = (a + 1, b + 1, c + 1);
        writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }
    w.flush()?;
    Ok(())
}

/// Renders a deterministic text snapshot of a tessellation pass.
pub fn mesh_snapshot(
    op: &str,
    mesh: &SurfaceMesh,
    diagnostics: &TessellationDiagnostics,
) -> Result<String, ExportError> {
    mesh.validate().map_err(ExportError::InvalidMesh)?;

    let mut out = String::new();
    let _ = writeln!(out, "# bezier-surface golden v1");
    let _ = writeln!(out, "op {op}");
    let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
    write_diagnostics(&mut out, diagnostics);
    write_mesh(&mut out, mesh);
    Ok(normalize_snapshot_text(&out))
}

/// Forces `\n` line endings and a trailing newline.
#[must_use]
pub fn normalize_snapshot_text(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    if normalized.ends_with('\n') {
        normalized
    } else {
        format!("{normalized}\n")
    }
}

/// Rounds to the snapshot grid; negative zero prints as `0.000000`.
#[must_use]
pub fn quantize_f64(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
    if q == 0.0 { 0.0 } else { q }
}

fn write_f64(out: &mut String, value: f64) {
    let value = quantize_f64(value);
    let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
}

fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
    let _ = write!(out, "{prefix} ");
    write_f64(out, v[0]);
    out.push(' ');
    write_f64(out, v[1]);
    out.push(' ');
    write_f64(out, v[2]);
    out.push('\n');
}

fn write_diagnostics(out: &mut String, diag: &TessellationDiagnostics) {
    let _ = writeln!(out, "diag.quad_count {}", diag.quad_count);
    let _ = writeln!(out, "diag.vertex_count {}", diag.vertex_count);
    let _ = writeln!(out, "diag.triangle_count {}", diag.triangle_count);
    let _ = writeln!(
        out,
        "diag.degenerate_triangle_count {}",
        diag.degenerate_triangle_count
    );
    let _ = writeln!(out, "diag.warning_count {}", diag.warnings.len());
    for (idx, warning) in diag.warnings.iter().enumerate() {
        let _ = writeln!(out, "diag.warning.{idx} {warning}");
    }
}

fn write_mesh(out: &mut String, mesh: &SurfaceMesh) {
    let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
    let _ = writeln!(out, "mesh.triangle_count {}", mesh.triangle_count());

    let _ = writeln!(out, "mesh.positions {}", mesh.vertex_count());
    for p in mesh.positions() {
        write_vec3_line(out, "p", p);
    }

    let _ = writeln!(out, "mesh.normals {}", mesh.vertex_count());
    for v in &mesh.vertices {
        write_vec3_line(out, "n", v.normal);
    }

    let _ = writeln!(out, "mesh.indices {}", mesh.indices.len());
    for [a, b, c] in mesh.triangles() {
        let _ = writeln!(out, "i {a} {b} {c}");
    }
}
