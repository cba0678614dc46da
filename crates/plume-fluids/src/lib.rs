//! Eulerian smoke on a regular 3D grid: semi-Lagrangian advection, buoyancy, impulse injection
//! and a Jacobi pressure projection over double-buffered fields.

pub mod config;
pub mod error;
pub mod field;
pub mod obstacle;
pub mod pipeline;
pub mod scene;
pub mod slab;
pub mod stages;
pub mod state;

pub use config::{GridDescriptor, Impulse, SmokeConfig, SmokeParams, SphereObstacle, Stepping};
pub use error::{ConfigError, FluidError};
pub use field::{Field, Texel};
pub use obstacle::{CellKind, ObstacleField};
pub use scene::Scene;
pub use slab::Slab;
pub use state::{FieldViews, SimulationState};

pub trait Fluid {
    type Params;

    fn step(&mut self, dt: f32, params: &Self::Params);
}
