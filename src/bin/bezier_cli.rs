#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("bezier_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use bezier_surface::engine::{PatchParams, build_patch, clamp_degree, clamp_resolution};
    use bezier_surface::export::{mesh_snapshot, normalize_snapshot_text, write_obj};
    use bezier_surface::geom::{
        BezierSurface, Point3, SampleSpacing, SurfaceMesh, TessellationDiagnostics,
    };
    use std::fs::{self, File};
    use std::io::BufWriter;
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"bezier_cli (bezier-surface)

USAGE:
  bezier_cli list
  bezier_cli run <scenario|all> [options]

SCENARIOS:
  flat_square
  saddle
  random_patch

OPTIONS (run):
  --out-dir <dir>      Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>         Write OBJ (single scenario only)
  --snap <path>        Write golden-style snapshot (single scenario only)
  --no-obj             Skip OBJ when using --out-dir
  --no-snap            Skip snapshot when using --out-dir
  --overwrite          Overwrite existing output files
  --degrees <u,v>      Control grid degrees (random_patch only)
  --resolution <u,v>   Samples per parameter direction
  --seed <n>           Height seed (random_patch only)
  -h, --help           Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    /// Overrides taken from the command line.
    #[derive(Debug, Default, Clone, Copy)]
    struct Overrides {
        degrees: Option<(u32, u32)>,
        resolution: Option<(u32, u32)>,
        seed: Option<u64>,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;
        let mut overrides = Overrides::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "--degrees" => overrides.degrees = Some(parse_pair("--degrees", &args.value("--degrees")?)?),
                "--resolution" => {
                    overrides.resolution = Some(parse_pair("--resolution", &args.value("--resolution")?)?);
                }
                "--seed" => {
                    let raw = args.value("--seed")?;
                    overrides.seed = Some(raw.parse().map_err(|e| format!("invalid --seed `{raw}`: {e}"))?);
                }
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, overrides, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, overrides, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, overrides)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        overrides: Overrides,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario, overrides)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} triangles={} | {}",
            output.name,
            output.mesh.vertex_count(),
            output.mesh.triangle_count(),
            output.diagnostics.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        msg.push_str(&format!("unknown scenario `{name}`\n\navailable scenarios:\n"));
        for scenario in Scenario::ALL {
            msg.push_str(&format!("  {}\n", scenario.name()));
        }
        msg
    }

    fn parse_pair(flag: &str, raw: &str) -> Result<(u32, u32), String> {
        let (u, v) = raw
            .split_once(',')
            .ok_or_else(|| format!("{flag} expects `u,v`, got `{raw}`"))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid {flag} value `{s}`: {e}"))
        };
        Ok((parse(u)?, parse(v)?))
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &SurfaceMesh, name: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        write_obj(&mut w, mesh, name).map_err(|e| e.to_string())
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        FlatSquare,
        Saddle,
        RandomPatch,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[Scenario::FlatSquare, Scenario::Saddle, Scenario::RandomPatch];

        fn name(self) -> &'static str {
            match self {
                Scenario::FlatSquare => "flat_square",
                Scenario::Saddle => "saddle",
                Scenario::RandomPatch => "random_patch",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            match name {
                "flat_square" => Some(Scenario::FlatSquare),
                "saddle" => Some(Scenario::Saddle),
                "random_patch" => Some(Scenario::RandomPatch),
                _ => None,
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: SurfaceMesh,
        diagnostics: TessellationDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario, overrides: Overrides) -> Result<ScenarioOutput, String> {
        let mut surface = match scenario {
            Scenario::FlatSquare => scenario_flat_square()?,
            Scenario::Saddle => scenario_saddle()?,
            Scenario::RandomPatch => scenario_random_patch(overrides)?,
        };
        if let Some((u, v)) = overrides.resolution {
            surface.set_resolution(clamp_resolution(u), clamp_resolution(v));
        }

        let mesh = surface.polygonize().map_err(|e| e.to_string())?.clone();
        let diagnostics = surface
            .last_diagnostics()
            .cloned()
            .ok_or("tessellation produced no diagnostics")?;
        let snapshot = mesh_snapshot(scenario.name(), &mesh, &diagnostics).map_err(|e| e.to_string())?;

        Ok(ScenarioOutput {
            name: scenario.name(),
            mesh,
            diagnostics,
            snapshot,
        })
    }

    fn scenario_flat_square() -> Result<BezierSurface, String> {
        let mut surface = BezierSurface::with_control_points(
            1,
            1,
            2,
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 1.0),
            ],
        )
        .map_err(|e| e.to_string())?;
        surface.set_spacing(SampleSpacing::Closed);
        Ok(surface)
    }

    fn scenario_saddle() -> Result<BezierSurface, String> {
        let mut points = Vec::with_capacity(9);
        for u in 0..=2_i32 {
            for v in 0..=2_i32 {
                let height = f64::from((u - 1) * (v - 1)) * 0.5;
                points.push(Point3::new(f64::from(u), height, f64::from(v)));
            }
        }
        let mut surface = BezierSurface::with_control_points(2, 2, 9, 9, points).map_err(|e| e.to_string())?;
        surface.set_spacing(SampleSpacing::Closed);
        Ok(surface)
    }

    fn scenario_random_patch(overrides: Overrides) -> Result<BezierSurface, String> {
        let mut params = PatchParams {
            resolution_u: 12,
            resolution_v: 12,
            ..PatchParams::default()
        };
        if let Some((u, v)) = overrides.degrees {
            params.degree_u = clamp_degree(u);
            params.degree_v = clamp_degree(v);
        }
        if let Some(seed) = overrides.seed {
            params.seed = seed;
        }
        build_patch(&params).map_err(|e| e.to_string())
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
