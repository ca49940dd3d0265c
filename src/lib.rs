#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod export;
pub mod geom;

use std::fmt;

use engine::{PatchParams, build_patch, clamp_degree, clamp_resolution};
use geom::{BezierSurface, SurfaceContext, SurfaceError, SurfaceMesh};
use serde::Serialize;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Counters shown next to the viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub vertices: usize,
    pub triangles: usize,
    pub degenerate_triangles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_ms: Option<f64>,
    pub degrees: [u32; 2],
    pub resolutions: [u32; 2],
    pub stale: bool,
}

/// Interactive driver for a single random Bezier patch.
///
/// Parameter setters only record the new value unless real-time computing is
/// on; [`compute`](Self::compute) applies everything that changed since the
/// last pass. Until then the previous mesh stays available.
#[wasm_bindgen]
pub struct SurfaceEngine {
    params: PatchParams,
    surface: BezierSurface,
    ctx: SurfaceContext,
    real_time: bool,
    patch_stale: bool,
    resolution_stale: bool,
}

#[wasm_bindgen]
impl SurfaceEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<SurfaceEngine, JsValue> {
        Self::with_params(PatchParams::default()).map_err(to_js_error)
    }

    /// Degrees are clamped to `1..=MAX_DEGREE`.
    #[wasm_bindgen]
    pub fn set_degrees(&mut self, degree_u: u32, degree_v: u32) -> Result<(), JsValue> {
        self.params.degree_u = clamp_degree(degree_u);
        self.params.degree_v = clamp_degree(degree_v);
        self.patch_stale = true;
        self.after_change()
    }

    /// Resolutions are clamped to `1..=MAX_RESOLUTION`.
    #[wasm_bindgen]
    pub fn set_resolution(&mut self, resolution_u: u32, resolution_v: u32) -> Result<(), JsValue> {
        self.params.resolution_u = clamp_resolution(resolution_u);
        self.params.resolution_v = clamp_resolution(resolution_v);
        self.resolution_stale = true;
        self.after_change()
    }

    #[wasm_bindgen]
    pub fn set_patch_size(&mut self, size_u: f64, size_v: f64) -> Result<(), JsValue> {
        if !size_u.is_finite() || !size_v.is_finite() {
            return Err(js_error("patch size must be finite"));
        }
        self.params.size_u = size_u;
        self.params.size_v = size_v;
        self.patch_stale = true;
        self.after_change()
    }

    #[wasm_bindgen]
    pub fn set_height_scale(&mut self, height_scale: f64) -> Result<(), JsValue> {
        if !height_scale.is_finite() {
            return Err(js_error("height scale must be finite"));
        }
        self.params.height_scale = height_scale;
        self.patch_stale = true;
        self.after_change()
    }

    /// Seeds the control point heights. Takes a `BigInt` on the JS side.
    #[wasm_bindgen]
    pub fn set_seed(&mut self, seed: u64) -> Result<(), JsValue> {
        self.params.seed = seed;
        self.patch_stale = true;
        self.after_change()
    }

    /// Turning real-time on applies pending changes right away.
    #[wasm_bindgen]
    pub fn set_real_time(&mut self, enabled: bool) -> Result<(), JsValue> {
        self.real_time = enabled;
        self.after_change()
    }

    #[wasm_bindgen]
    pub fn is_real_time(&self) -> bool {
        self.real_time
    }

    /// Applies pending parameter changes and tessellates the patch.
    #[wasm_bindgen]
    pub fn compute(&mut self) -> Result<(), JsValue> {
        self.recompute().map(|_| ()).map_err(to_js_error)
    }

    /// Returns the last computed mesh as `{ vertices: [{ position, normal }], indices }`.
    #[wasm_bindgen]
    pub fn get_mesh(&mut self) -> Result<JsValue, JsValue> {
        let mesh = self.mesh().ok_or_else(|| js_error("surface has not been computed yet"))?;
        serde_wasm_bindgen::to_value(mesh).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.stats()).map_err(to_js_error)
    }
}

impl SurfaceEngine {
    /// Builds an engine from explicit parameters; degrees and resolutions are clamped.
    pub fn with_params(params: PatchParams) -> Result<Self, SurfaceError> {
        let params = params.clamped();
        let surface = build_patch(&params)?;
        Ok(Self {
            params,
            surface,
            ctx: SurfaceContext::new(),
            real_time: false,
            patch_stale: false,
            resolution_stale: false,
        })
    }

    #[must_use]
    pub fn params(&self) -> &PatchParams {
        &self.params
    }

    #[must_use]
    pub fn surface(&self) -> &BezierSurface {
        &self.surface
    }

    /// `true` when parameters changed after the last [`recompute`](Self::recompute).
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.patch_stale || self.resolution_stale
    }

    /// The mesh of the last pass, or `None` before the first one.
    pub fn mesh(&mut self) -> Option<&SurfaceMesh> {
        if self.surface.is_dirty() {
            return None;
        }
        self.surface.polygonize().ok()
    }

    pub fn recompute(&mut self) -> Result<&SurfaceMesh, SurfaceError> {
        if self.patch_stale {
            self.surface = build_patch(&self.params)?;
        } else if self.resolution_stale {
            self.surface
                .set_resolution(self.params.resolution_u, self.params.resolution_v);
        }
        self.patch_stale = false;
        self.resolution_stale = false;

        log::info!(
            "compute bezier: degrees ({}, {}), resolutions ({}, {})",
            self.params.degree_u,
            self.params.degree_v,
            self.params.resolution_u,
            self.params.resolution_v
        );
        debug_log!("compute bezier with seed {}", self.params.seed);

        self.surface.polygonize_with_context(&mut self.ctx)
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let diagnostics = self.surface.last_diagnostics();
        EngineStats {
            vertices: diagnostics.map_or(0, |d| d.vertex_count),
            triangles: diagnostics.map_or(0, |d| d.triangle_count),
            degenerate_triangles: diagnostics.map_or(0, |d| d.degenerate_triangle_count),
            compute_ms: diagnostics
                .and_then(|d| d.timing.as_ref())
                .map(geom::SurfaceTimingReport::total_ms),
            degrees: [self.params.degree_u, self.params.degree_v],
            resolutions: [self.params.resolution_u, self.params.resolution_v],
            stale: self.is_stale(),
        }
    }

    fn after_change(&mut self) -> Result<(), JsValue> {
        if self.real_time && (self.is_stale() || self.surface.is_dirty()) {
            self.recompute().map_err(to_js_error)?;
        }
        Ok(())
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
