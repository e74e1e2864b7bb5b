//! navsight - inspect the safe-distance map and run a synthetic scene

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ndarray::Array2;
use tracing_subscriber::EnvFilter;

use navsight_rs::fusion::Subject;
use navsight_rs::{
    Frame, FrameAnalyzer, FrameProcessor, FrameReport, LatestFrameSlot, NavConfig,
    NavigationPipeline, RelativeDepthMap,
};

#[derive(Parser, Debug)]
#[command(name = "navsight", author, version, about)]
struct Cli {
    /// TOML configuration; defaults are used when omitted.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the safe-distance map to a PNG
    #[cfg(feature = "visualize")]
    SafeMap {
        /// Map side in pixels (defaults to the configured depth resolution)
        #[arg(long)]
        resolution: Option<usize>,
        #[arg(long, default_value = "safe_map.png")]
        out: PathBuf,
    },
    /// Feed synthetic frames with an approaching obstacle through the pipeline
    Demo {
        #[arg(long, default_value_t = 6)]
        frames: u8,
        /// Delay between frames offered by the camera thread
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
    },
}

fn load_config(path: Option<&Path>) -> Result<NavConfig> {
    match path {
        Some(path) => NavConfig::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(NavConfig::default()),
    }
}

/// Synthetic scene step `i`: an obstacle sweeping left to right while
/// closing in.
struct Scene {
    resolution: usize,
}

impl Scene {
    const STEPS: f32 = 6.0;

    /// Obstacle center and distance in normalized coordinates.
    fn obstacle(step: u8) -> (f32, f32) {
        let t = (step as f32 / Self::STEPS).min(1.0);
        (0.15 + 0.7 * t, 3.5 - 2.5 * t)
    }

    /// Floor receding toward the horizon, with the obstacle patch pasted
    /// in. Relative depth is inverse distance, so the default calibration
    /// points (7 m on row 0, 1.75 m on row 255) recover meters exactly.
    fn relative_depth(&self, step: u8) -> RelativeDepthMap {
        let n = self.resolution;
        let (cx, meters) = Self::obstacle(step);
        let x0 = ((cx - 0.1) * n as f32) as usize;
        let x1 = ((cx + 0.1) * n as f32) as usize;
        let y0 = (0.7 * n as f32) as usize;
        RelativeDepthMap::from_array(Array2::from_shape_fn((n, n), |(y, x)| {
            let floor = (7.0 - 5.25 * y as f32 / 255.0).max(1.0);
            let d = if (x0..x1).contains(&x) && y >= y0 {
                meters.min(floor)
            } else {
                floor
            };
            1.0 / d
        }))
    }
}

fn step_of(frame: &Frame) -> u8 {
    frame.pixel(0, 0).map_or(0, |p| p[0])
}

struct SceneDepth(Scene);

impl FrameProcessor for SceneDepth {
    type Output = RelativeDepthMap;
    type Error = Infallible;

    fn process(&mut self, frame: &Frame) -> Result<RelativeDepthMap, Infallible> {
        Ok(self.0.relative_depth(step_of(frame)))
    }
}

struct SceneDetector {
    input_size: f32,
    rows: usize,
    cells: usize,
}

impl FrameProcessor for SceneDetector {
    type Output = Array2<f32>;
    type Error = Infallible;

    fn process(&mut self, frame: &Frame) -> Result<Array2<f32>, Infallible> {
        let (cx, _) = Scene::obstacle(step_of(frame));
        let mut tensor = Array2::from_elem((self.rows, self.cells), 0.001);
        let s = self.input_size;
        tensor[[0, 0]] = cx * s;
        tensor[[1, 0]] = 0.85 * s;
        tensor[[2, 0]] = 0.2 * s;
        tensor[[3, 0]] = 0.3 * s;
        tensor[[4, 0]] = 0.9;
        Ok(tensor)
    }
}

fn describe(report: &FrameReport) -> String {
    match (&report.hazard, &report.announcement) {
        (Some(hazard), Some(a)) => format!(
            "hazard {} {} m (nearest {:.2} m, box {})",
            a.sector_code(),
            a.distance_band,
            hazard.distance_m,
            hazard.box_index
        ),
        (None, Some(a)) => match &a.subject {
            Subject::Target(text) => format!("target '{text}' {} {} m", a.sector_code(), a.distance_band),
            Subject::Obstacle => format!("obstacle {} {} m", a.sector_code(), a.distance_band),
        },
        _ if !report.calibrated => "depth unusable".to_string(),
        _ => format!("clear ({} boxes)", report.boxes.len()),
    }
}

fn run_demo(config: &NavConfig, frames: u8, interval_ms: u64) -> Result<()> {
    let analyzer = FrameAnalyzer::new(config).context("building analyzer")?;
    let detector = SceneDetector {
        input_size: config.detector.input_size as f32,
        rows: config.detector.tensor_shape().0,
        cells: config.detector.tensor_shape().1,
    };
    let depth = SceneDepth(Scene {
        resolution: config.depth_resolution,
    });
    let mut pipeline = NavigationPipeline::new(depth, detector, analyzer);

    let slot = Arc::new(LatestFrameSlot::new());
    let camera = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            for step in 0..frames {
                slot.offer(Frame::filled(64, 64, [step, 0, 0]));
                if interval_ms > 0 {
                    thread::sleep(Duration::from_millis(interval_ms));
                }
            }
            slot.close();
        })
    };

    let reported = pipeline.run(&slot, |report| println!("{}", describe(&report)));
    if camera.join().is_err() {
        bail!("camera thread panicked");
    }
    pipeline.release();
    println!("{reported} frames analyzed, {} dropped", slot.dropped());
    Ok(())
}

#[cfg(feature = "visualize")]
fn render_safe_map(config: &NavConfig, resolution: Option<usize>, out: &Path) -> Result<()> {
    use navsight_rs::depth::colormap;
    use tracing::info;

    let resolution = resolution.unwrap_or(config.depth_resolution);
    let map = navsight_rs::SafeDistanceMap::build(resolution, &config.safe_map)?;
    colormap::render_safe_map(&map)
        .save(out)
        .with_context(|| format!("writing {}", out.display()))?;
    info!(resolution, out = %out.display(), "safe map written");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        #[cfg(feature = "visualize")]
        Commands::SafeMap { resolution, out } => render_safe_map(&config, resolution, &out),
        Commands::Demo {
            frames,
            interval_ms,
        } => run_demo(&config, frames, interval_ms),
    }
}
