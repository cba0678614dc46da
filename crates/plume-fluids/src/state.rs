use glam::Vec3;

use crate::{
    config::{GridDescriptor, SmokeConfig, SmokeParams},
    error::FluidError,
    field::Field,
    obstacle::ObstacleField,
    pipeline,
    slab::Slab,
    stages,
    Fluid,
};

/// Every field describing the smoke at one instant.
///
/// Allocated once. Slabs are swapped by the pipeline but never reallocated.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) grid: GridDescriptor,
    pub(crate) velocity: Slab<Vec3>,
    pub(crate) temperature: Slab<f32>,
    pub(crate) density: Slab<f32>,
    pub(crate) pressure: Slab<f32>,
    /// Divergence of the velocity before the last projection.
    pub(crate) divergence: Field<f32>,
    pub(crate) obstacles: ObstacleField,
}

/// Read-only views of the current front fields, handed to renderers and recorders.
#[derive(Debug, Clone, Copy)]
pub struct FieldViews<'a> {
    pub grid: GridDescriptor,
    pub velocity: &'a Field<Vec3>,
    pub temperature: &'a Field<f32>,
    pub density: &'a Field<f32>,
    pub obstacles: &'a ObstacleField,
}

impl SimulationState {
    /// Allocates every field for `grid`, with the temperature at `ambient` and everything else at
    /// zero.
    pub fn new(grid: GridDescriptor, obstacles: ObstacleField, ambient: f32) -> Result<Self, FluidError> {
        grid.validate()?;

        if obstacles.shape() != grid.shape() {
            return Err(FluidError::ShapeMismatch {
                expected: grid.shape(),
                found: obstacles.shape(),
            });
        }

        let mut temperature = Slab::new(grid)?;
        temperature.front_mut().clear(ambient);

        let state = Self {
            grid,
            velocity: Slab::new(grid)?,
            temperature,
            density: Slab::new(grid)?,
            pressure: Slab::new(grid)?,
            divergence: Field::new(grid)?,
            obstacles,
        };

        log::info!(
            "Allocated {}x{}x{} grid with {} fluid cells",
            grid.width,
            grid.height,
            grid.depth,
            state.obstacles.fluid_count(),
        );

        Ok(state)
    }

    pub fn from_config(config: &SmokeConfig) -> Result<Self, FluidError> {
        config.validate()?;

        let obstacles = ObstacleField::new(config.grid, &config.obstacle_set())?;
        Self::new(config.grid, obstacles, config.params.ambient_temperature)
    }

    #[inline]
    pub fn grid(&self) -> GridDescriptor {
        self.grid
    }

    #[inline]
    pub fn velocity(&self) -> &Field<Vec3> {
        self.velocity.front()
    }

    #[inline]
    pub fn temperature(&self) -> &Field<f32> {
        self.temperature.front()
    }

    #[inline]
    pub fn density(&self) -> &Field<f32> {
        self.density.front()
    }

    #[inline]
    pub fn pressure(&self) -> &Field<f32> {
        self.pressure.front()
    }

    #[inline]
    pub fn divergence(&self) -> &Field<f32> {
        &self.divergence
    }

    #[inline]
    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    /// Front velocity, for seeding an initial flow.
    pub fn velocity_mut(&mut self) -> &mut Field<Vec3> {
        self.velocity.front_mut()
    }

    pub fn temperature_mut(&mut self) -> &mut Field<f32> {
        self.temperature.front_mut()
    }

    pub fn density_mut(&mut self) -> &mut Field<f32> {
        self.density.front_mut()
    }

    pub fn views(&self) -> FieldViews<'_> {
        FieldViews {
            grid: self.grid,
            velocity: self.velocity.front(),
            temperature: self.temperature.front(),
            density: self.density.front(),
            obstacles: &self.obstacles,
        }
    }

    /// Max-norm of `Lap_h(p) - div` for the current pressure, over fluid cells.
    pub fn pressure_residual(&self, cell_spacing: f32) -> f32 {
        stages::pressure_residual(self.pressure.front(), &self.divergence, &self.obstacles, cell_spacing)
    }
}

impl Fluid for SimulationState {
    type Params = SmokeParams;

    fn step(&mut self, dt: f32, params: &SmokeParams) {
        pipeline::advance(self, dt, params);
    }
}
