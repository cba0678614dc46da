use std::path::Path;

use plume_fluids::{GridDescriptor, SmokeConfig};

use crate::error::AppError;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    /// Cubic grid extent.
    pub size: Option<usize>,
    pub jacobi_iterations: Option<usize>,
}

/// Loads a config file if one is given, applies `overrides` and validates the result.
pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<SmokeConfig, AppError> {
    let mut config = match path {
        Some(path) => parse(path)?,
        None => SmokeConfig::default(),
    };

    if let Some(size) = overrides.size {
        config.grid = GridDescriptor::cubic(size)?;
    }

    if let Some(iterations) = overrides.jacobi_iterations {
        config.params.jacobi_iterations = iterations;
    }

    config.validate()?;
    Ok(config)
}

fn parse(path: &Path) -> Result<SmokeConfig, AppError> {
    let text = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config = serde_json::from_str(&text).map_err(|source| AppError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}
