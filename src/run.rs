use indicatif::{ProgressBar, ProgressStyle};

use plume_fluids::{Scene, SimulationState};

use crate::{
    backend::{Backend, FrameContext},
    error::AppError,
    input::{FrameClock, FrameStats, InputEvent, OrbitCamera, ScriptedInput},
};

pub struct RunOptions {
    pub frames: u64,
    pub clock: FrameClock,
    pub input: ScriptedInput,
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub frames: u64,
    pub steps: u64,
    /// Whether the simulation was running when the loop ended.
    pub enabled: bool,
}

/// Drives the frame loop: input, simulation, then the backend.
pub fn run(
    scene: &mut Scene<SimulationState>,
    backend: &mut dyn Backend,
    options: RunOptions,
) -> Result<RunReport, AppError> {
    let RunOptions { frames, mut clock, mut input, progress } = options;

    let bar_template = "Running Simulation {spinner:.green} [{elapsed}] [{bar:50.white/white}] {pos}/{len} ({eta})";
    let style = ProgressStyle::with_template(bar_template)?
        .progress_chars("=> ")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let bar = if progress {
        ProgressBar::new(frames).with_style(style)
    } else {
        ProgressBar::hidden()
    };

    let mut camera = OrbitCamera::default();
    let mut stats = FrameStats::default();

    backend.init(scene.views())?;
    clock.tick();

    let mut frame = 0;
    'frames: while frame < frames {
        for event in input.poll(frame) {
            match event {
                InputEvent::TogglePause => scene.toggle(),
                InputEvent::Stop => break 'frames,
                event => {
                    if camera.handle(event) {
                        log::debug!("Orbit to ({:.3}, {:.3})", camera.theta_x, camera.theta_y);
                    }
                },
            }
        }

        let elapsed = clock.tick();
        let steps = scene.update(elapsed);
        stats.record(elapsed);

        let ctx = FrameContext {
            frame,
            views: scene.views(),
            steps,
            modelview: camera.modelview(),
            fps: stats.smoothed_fps(),
        };

        backend.render(&ctx)?;
        backend.finalize_frame()?;

        frame += 1;
        bar.inc(1);
    }

    bar.finish_and_clear();
    backend.finish()?;

    log::info!("Pressure residual {:.3e}", scene.pressure_residual());

    Ok(RunReport {
        frames: frame,
        steps: scene.step_count(),
        enabled: scene.is_enabled(),
    })
}
