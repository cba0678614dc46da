use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    obstacle::{sphere::Sphere, ObstacleSet},
};

/// Smallest extent along any axis: one fluid cell enclosed by the boundary shell.
pub const MIN_GRID_EXTENT: usize = 3;

/// Dimensions of the simulation grid, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl GridDescriptor {
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self, ConfigError> {
        let grid = Self { width, height, depth };
        grid.validate()?;
        Ok(grid)
    }

    pub fn cubic(n: usize) -> Result<Self, ConfigError> {
        Self::new(n, n, n)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_GRID_EXTENT || self.height < MIN_GRID_EXTENT || self.depth < MIN_GRID_EXTENT {
            return Err(ConfigError::Dimensions {
                width: self.width,
                height: self.height,
                depth: self.depth,
                min: MIN_GRID_EXTENT,
            });
        }

        Ok(())
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Grid extent as a vector, used to turn grid-relative positions into cell coordinates.
    #[inline]
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.width as f32, self.height as f32, self.depth as f32)
    }
}

impl Default for GridDescriptor {
    fn default() -> Self {
        Self {
            width: 96,
            height: 96,
            depth: 96,
        }
    }
}

/// A localized heat and smoke source, reapplied every step.
///
/// `position` is relative to the grid extent (`0.5` is the middle of an axis) and `radius` is a
/// fraction of the grid width, so a config stays meaningful when the grid size changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Impulse {
    pub position: Vec3,
    pub radius: f32,
    /// Target temperature inside the impulse sphere.
    pub temperature: f32,
    /// Target smoke density inside the impulse sphere.
    pub density: f32,
}

impl Impulse {
    /// Impulse center, in cell coordinates.
    pub fn center(&self, grid: &GridDescriptor) -> Vec3 {
        self.position * grid.extent()
    }

    /// Impulse radius, in cells.
    pub fn radius_cells(&self, grid: &GridDescriptor) -> f32 {
        self.radius * grid.width as f32
    }
}

impl Default for Impulse {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.5, 0.0625, 0.5),
            radius: 0.125,
            temperature: 10.0,
            density: 1.25,
        }
    }
}

/// Physical constants of the smoke model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeParams {
    /// Fraction of velocity retained per step.
    pub velocity_dissipation: f32,
    /// Fraction of the temperature excess over ambient retained per step.
    pub temperature_dissipation: f32,
    /// Fraction of smoke density retained per step.
    pub density_dissipation: f32,
    /// Upward acceleration per degree above ambient.
    pub buoyancy: f32,
    /// Downward acceleration per unit of smoke density.
    pub weight: f32,
    pub ambient_temperature: f32,
    /// Direction buoyancy pushes in. Normalized before use.
    pub up: Vec3,
    pub impulse: Impulse,
    /// Jacobi iterations per pressure solve. There is no convergence check.
    pub jacobi_iterations: usize,
    /// Cell size used by the divergence, pressure and gradient stencils.
    pub cell_spacing: f32,
}

impl Default for SmokeParams {
    fn default() -> Self {
        Self {
            velocity_dissipation: 0.99,
            temperature_dissipation: 0.99,
            density_dissipation: 0.9995,
            buoyancy: 1.0,
            weight: 0.05,
            ambient_temperature: 0.0,
            up: Vec3::Y,
            impulse: Impulse::default(),
            jacobi_iterations: 40,
            cell_spacing: 1.25,
        }
    }
}

impl SmokeParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("velocity", self.velocity_dissipation),
            ("temperature", self.temperature_dissipation),
            ("density", self.density_dissipation),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Dissipation { name, value });
            }
        }

        for (name, value) in [
            ("buoyancy", self.buoyancy),
            ("weight", self.weight),
            ("ambient temperature", self.ambient_temperature),
            ("impulse temperature", self.impulse.temperature),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }

        for (name, value) in [
            ("radius", self.impulse.radius),
            ("density", self.impulse.density),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Impulse { name, value });
            }
        }

        if !self.impulse.position.is_finite() {
            return Err(ConfigError::Impulse { name: "position", value: f32::NAN });
        }

        if !self.up.is_finite() || self.up.length_squared() == 0.0 {
            return Err(ConfigError::UpVector);
        }

        if self.jacobi_iterations == 0 {
            return Err(ConfigError::JacobiIterations);
        }

        if !(self.cell_spacing.is_finite() && self.cell_spacing > 0.0) {
            return Err(ConfigError::CellSpacing(self.cell_spacing));
        }

        Ok(())
    }
}

/// How elapsed frame time is turned into simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Stepping {
    /// One step per frame, advancing by `elapsed * scale`. Results depend on the frame rate.
    Scaled { scale: f32 },
    /// Fixed `tick` sub-steps from an accumulator, at most `max_substeps` per frame.
    Fixed { tick: f32, max_substeps: u32 },
}

impl Stepping {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Stepping::Scaled { scale } if !(scale.is_finite() && scale > 0.0) => {
                Err(ConfigError::Stepping("scale must be positive"))
            },
            Stepping::Fixed { tick, .. } if !(tick.is_finite() && tick > 0.0) => {
                Err(ConfigError::Stepping("tick must be positive"))
            },
            Stepping::Fixed { max_substeps: 0, .. } => {
                Err(ConfigError::Stepping("at least one sub-step per frame is required"))
            },
            _ => Ok(()),
        }
    }
}

impl Default for Stepping {
    fn default() -> Self {
        Stepping::Scaled { scale: 1.0 }
    }
}

/// A solid sphere carved out of the domain, in the same grid-relative units as [`Impulse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereObstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Everything needed to build a smoke scene. Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    pub grid: GridDescriptor,
    pub params: SmokeParams,
    pub stepping: Stepping,
    pub sphere: Option<SphereObstacle>,
}

impl SmokeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.params.validate()?;
        self.stepping.validate()?;

        if let Some(sphere) = self.sphere {
            if !sphere.center.is_finite() || !(sphere.radius.is_finite() && sphere.radius >= 0.0) {
                return Err(ConfigError::Sphere);
            }
        }

        Ok(())
    }

    /// Interior obstacle shapes, in cell coordinates.
    pub fn obstacle_set(&self) -> ObstacleSet {
        let mut set = ObstacleSet::default();

        if let Some(sphere) = self.sphere {
            set.push(Sphere::new(
                sphere.center * self.grid.extent(),
                sphere.radius * self.grid.width as f32,
            ));
        }

        set
    }
}
