use thiserror::Error;

/// A smoke configuration that cannot be simulated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid must be at least {min} cells along every axis, got {width}x{height}x{depth}")]
    Dimensions {
        width: usize,
        height: usize,
        depth: usize,
        min: usize,
    },
    #[error("{name} dissipation must be in (0, 1], got {value}")]
    Dissipation { name: &'static str, value: f32 },
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    #[error("impulse {name} must be finite and non-negative, got {value}")]
    Impulse { name: &'static str, value: f32 },
    #[error("up vector must be finite and non-zero")]
    UpVector,
    #[error("at least one Jacobi iteration is required")]
    JacobiIterations,
    #[error("cell spacing must be finite and positive, got {0}")]
    CellSpacing(f32),
    #[error("invalid time stepping: {0}")]
    Stepping(&'static str),
    #[error("obstacle sphere must have a finite center and a non-negative radius")]
    Sphere,
}

#[derive(Debug, Error)]
pub enum FluidError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("field shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("could not allocate storage for {cells} cells")]
    Allocation { cells: usize },
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
