use std::path::PathBuf;

use glam::{Mat4, Vec3};

use plume_fluids::{FieldViews, GridDescriptor};
use plume_io::FluidDataEncoder;

use crate::error::AppError;

/// Everything a backend sees for one frame. Fields are the fronts after the frame's steps.
pub struct FrameContext<'a> {
    pub frame: u64,
    pub views: FieldViews<'a>,
    /// Steps taken this frame, zero while paused.
    pub steps: u32,
    pub modelview: Mat4,
    pub fps: f32,
}

/// A consumer of the simulation's fields.
///
/// Renderers drawing the volume on a GPU implement the same hooks.
pub trait Backend {
    fn init(&mut self, views: FieldViews<'_>) -> Result<(), AppError>;

    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<(), AppError>;

    fn finalize_frame(&mut self) -> Result<(), AppError>;

    fn finish(&mut self) -> Result<(), AppError>;
}

/// Aggregate statistics of one frame's fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldSummary {
    pub total_density: f32,
    pub max_density: f32,
    pub max_temperature: f32,
    pub max_speed: f32,
}

impl FieldSummary {
    pub fn of(views: &FieldViews<'_>) -> Self {
        Self {
            total_density: views.density.iter().sum(),
            max_density: views.density.iter().copied().fold(0.0, f32::max),
            max_temperature: views.temperature.iter().copied().fold(f32::MIN, f32::max),
            max_speed: views.velocity.iter().map(|v| v.length()).fold(0.0, f32::max),
        }
    }
}

/// Logs field statistics instead of drawing anything.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    last: Option<FieldSummary>,
    frames: u64,
}

impl Backend for HeadlessBackend {
    fn init(&mut self, views: FieldViews<'_>) -> Result<(), AppError> {
        let GridDescriptor { width, height, depth } = views.grid;
        log::debug!("Headless backend over {width}x{height}x{depth} cells");
        Ok(())
    }

    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<(), AppError> {
        let summary = FieldSummary::of(&ctx.views);
        log::debug!(
            "frame {}: {} steps, density {:.3} (max {:.3}), max temperature {:.3}, max speed {:.3}",
            ctx.frame,
            ctx.steps,
            summary.total_density,
            summary.max_density,
            summary.max_temperature,
            summary.max_speed,
        );

        let eye = ctx.modelview.inverse().transform_point3(Vec3::ZERO);
        log::debug!("frame {}: eye at {eye:.3}, {:.1} fps", ctx.frame, ctx.fps);

        self.last = Some(summary);
        Ok(())
    }

    fn finalize_frame(&mut self) -> Result<(), AppError> {
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AppError> {
        if let Some(summary) = self.last {
            log::info!(
                "Finished {} frames, total density {:.3}, max speed {:.3}",
                self.frames,
                summary.total_density,
                summary.max_speed,
            );
        }
        Ok(())
    }
}

/// Writes every frame's fields to a recording directory.
pub struct RecordingBackend {
    path: PathBuf,
    fps: u32,
    encoder: Option<FluidDataEncoder>,
}

impl RecordingBackend {
    pub fn new(path: PathBuf, fps: u32) -> Self {
        Self {
            path,
            fps,
            encoder: None,
        }
    }
}

impl Backend for RecordingBackend {
    fn init(&mut self, views: FieldViews<'_>) -> Result<(), AppError> {
        let mut encoder = FluidDataEncoder::new(self.path.clone(), views.grid, self.fps)?;
        encoder.encode_obstacles(views.obstacles)?;

        self.encoder = Some(encoder);
        Ok(())
    }

    fn render(&mut self, ctx: &FrameContext<'_>) -> Result<(), AppError> {
        if let Some(encoder) = &mut self.encoder {
            encoder.encode_frame(&ctx.views)?;
        }
        Ok(())
    }

    fn finalize_frame(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AppError> {
        if let Some(encoder) = self.encoder.take() {
            encoder.finish()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use plume_fluids::{ObstacleField, SimulationState};

    use super::*;

    #[test]
    fn summary_reports_extremes() {
        let grid = GridDescriptor::cubic(4).unwrap();
        let obstacles = ObstacleField::from_fn(grid, |_| false).unwrap();
        let mut state = SimulationState::new(grid, obstacles, 1.0).unwrap();

        state.density_mut().set((1, 1, 1), 0.5);
        state.density_mut().set((2, 1, 1), 0.25);
        state.temperature_mut().set((3, 3, 3), 4.0);
        state.velocity_mut().set((0, 0, 0), Vec3::new(3.0, 4.0, 0.0));

        let summary = FieldSummary::of(&state.views());

        assert_eq!(summary.total_density, 0.75);
        assert_eq!(summary.max_density, 0.5);
        assert_eq!(summary.max_temperature, 4.0);
        assert_eq!(summary.max_speed, 5.0);
    }
}
