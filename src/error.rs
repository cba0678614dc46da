use std::path::PathBuf;

use thiserror::Error;

use plume_fluids::{ConfigError, FluidError};
use plume_io::{encode::EncodingError, DecodingError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fluid(#[from] FluidError),
    #[error("recording failed: {0}")]
    Encoding(#[from] EncodingError),
    #[error("could not read recording: {0}")]
    Decoding(#[from] DecodingError),
    #[error(transparent)]
    Progress(#[from] indicatif::style::TemplateError),
}
