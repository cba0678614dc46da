use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use backend::{Backend, FieldSummary, HeadlessBackend, RecordingBackend};
use config::Overrides;
use error::AppError;
use input::{Drag, FrameClock, InputEvent, ScriptedInput};
use plume_fluids::Scene;
use plume_io::FluidDataDecoder;
use run::RunOptions;

mod backend;
mod config;
mod error;
mod input;
mod run;

#[derive(Parser)]
#[command(version, about = "Real-time 3D smoke simulation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the simulation without a window.
    Simulate {
        /// JSON file with grid and smoke parameters.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Cubic grid extent, overriding the config.
        #[arg(short, long)]
        size: Option<usize>,
        #[arg(short = 'n', long, default_value_t = 600)]
        frames: u64,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Directory to record every frame into.
        #[arg(short, long)]
        record: Option<PathBuf>,
        #[arg(long)]
        jacobi_iterations: Option<usize>,
        /// Frames at which to pause or resume.
        #[arg(long, value_delimiter = ',')]
        toggle_at: Vec<u64>,
        /// Camera drags as FRAME:DX,DY, repeatable.
        #[arg(long)]
        orbit: Vec<Drag>,
        /// Frame at which to stop early.
        #[arg(long)]
        stop_at: Option<u64>,
        /// Use wall-clock frame times instead of a fixed 1/fps.
        #[arg(long)]
        realtime: bool,
    },
    /// Summarize a recording.
    Inspect { path: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Simulate {
            config,
            size,
            frames,
            fps,
            record,
            jacobi_iterations,
            toggle_at,
            orbit,
            stop_at,
            realtime,
        } => {
            let overrides = Overrides { size, jacobi_iterations };

            let mut input = ScriptedInput::toggles(&toggle_at);
            for drag in orbit {
                input.drag(drag);
            }
            if let Some(frame) = stop_at {
                input.push(frame, InputEvent::Stop);
            }

            let options = RunOptions {
                frames,
                clock: if realtime { FrameClock::realtime() } else { FrameClock::fixed(fps) },
                input,
                progress: true,
            };

            simulate(config, overrides, record, fps, options)
        },
        Command::Inspect { path } => inspect(path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        },
    }
}

fn simulate(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    record: Option<PathBuf>,
    fps: u32,
    options: RunOptions,
) -> Result<(), AppError> {
    let config = config::load(config_path.as_deref(), overrides)?;
    let mut scene = Scene::from_config(&config)?;

    let mut backend: Box<dyn Backend> = match record {
        Some(path) => Box::new(RecordingBackend::new(path, fps)),
        None => Box::new(HeadlessBackend::default()),
    };

    let report = run::run(&mut scene, backend.as_mut(), options)?;
    log::info!(
        "Ran {} frames and {} steps, {} at exit",
        report.frames,
        report.steps,
        if report.enabled { "running" } else { "paused" },
    );

    Ok(())
}

fn inspect(path: PathBuf) -> Result<(), AppError> {
    let mut decoder = FluidDataDecoder::new(path);
    let metadata = decoder.decode_metadata()?;
    let grid = metadata.grid()?;

    let solid = decoder.decode_obstacles()?.iter().filter(|texel| texel.x > 0.0).count();
    log::info!(
        "{}x{}x{} grid, {} solid cells, {} frames at {} fps",
        grid.width,
        grid.height,
        grid.depth,
        solid,
        metadata.num_frames,
        metadata.fps,
    );

    let mut peak = FieldSummary::default();
    while let Some(frame) = decoder.decode_frame()? {
        let total: f32 = frame.density.iter().sum();
        peak.total_density = peak.total_density.max(total);
        peak.max_density = frame.density.iter().copied().fold(peak.max_density, f32::max);
        peak.max_temperature = frame.temperature.iter().copied().fold(peak.max_temperature, f32::max);
        peak.max_speed = frame.velocity.iter().map(|v| v.length()).fold(peak.max_speed, f32::max);
    }

    log::info!(
        "Peak total density {:.3}, density {:.3}, temperature {:.3}, speed {:.3}",
        peak.total_density,
        peak.max_density,
        peak.max_temperature,
        peak.max_speed,
    );

    Ok(())
}
