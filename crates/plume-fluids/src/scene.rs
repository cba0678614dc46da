use crate::{
    config::{SmokeConfig, Stepping},
    error::FluidError,
    state::{FieldViews, SimulationState},
    Fluid,
};

pub struct Scene<F: Fluid> {
    /// The fluid for this scene.
    pub fluid: F,
    /// The parameters for this scene's fluid.
    params: F::Params,
    /// How frame time becomes steps.
    stepping: Stepping,
    /// Paused scenes skip every step but keep their fields.
    enabled: bool,
    /// Unsimulated time carried between frames in fixed stepping.
    accumulator: f32,
    /// Steps taken so far.
    steps: u64,
}

impl<F: Fluid> Scene<F> {
    #[inline(always)]
    pub fn new(fluid: F, params: F::Params, stepping: Stepping) -> Self {
        Self {
            fluid,
            params,
            stepping,
            enabled: true,
            accumulator: 0.0,
            steps: 0,
        }
    }

    #[inline(always)]
    pub fn params(&self) -> &F::Params {
        &self.params
    }

    #[inline(always)]
    pub fn stepping(&self) -> Stepping {
        self.stepping
    }

    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline(always)]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.toggle();
        }
    }

    /// Pauses or resumes the simulation without touching its fields.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        log::info!(
            "Simulation {} after {} steps",
            if self.enabled { "resumed" } else { "paused" },
            self.steps,
        );
    }

    /// Advances the fluid by exactly `dt`, regardless of the pause state.
    pub fn step(&mut self, dt: f32) {
        self.fluid.step(dt, &self.params);
        self.steps += 1;
    }

    /// Consumes `elapsed` seconds of wall time, returning the number of steps taken.
    pub fn update(&mut self, elapsed: f32) -> u32 {
        if !self.enabled {
            return 0;
        }

        // Negative, NaN and infinite frame times advance nothing.
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };

        match self.stepping {
            Stepping::Scaled { scale } => {
                let dt = elapsed * scale;
                self.step(if dt.is_finite() { dt } else { 0.0 });
                1
            },
            Stepping::Fixed { tick, max_substeps } => {
                self.accumulator += elapsed;

                let mut taken = 0;
                while self.accumulator >= tick && taken < max_substeps {
                    self.step(tick);
                    self.accumulator -= tick;
                    taken += 1;
                }

                if taken == max_substeps {
                    // Drop the backlog a slow frame could not catch up on.
                    self.accumulator %= tick;
                }
                if !self.accumulator.is_finite() {
                    self.accumulator = 0.0;
                }

                taken
            },
        }
    }
}

impl Scene<SimulationState> {
    pub fn from_config(config: &SmokeConfig) -> Result<Self, FluidError> {
        let state = SimulationState::from_config(config)?;
        Ok(Self::new(state, config.params, config.stepping))
    }

    pub fn views(&self) -> FieldViews<'_> {
        self.fluid.views()
    }

    pub fn pressure_residual(&self) -> f32 {
        self.fluid.pressure_residual(self.params.cell_spacing)
    }
}
