use std::{io::Write, path::{Path, PathBuf}};

use encode::{EncodingError, FluidFrameEncoder};
use plume_fluids::{FieldViews, SimulationState};

pub mod as_bytes;
pub mod decode;
pub mod encode;

pub use decode::{DecodingError, FluidDataDecoder, FluidFrameData, FluidMetadata};
pub use encode::FluidDataEncoder;

pub(crate) const METADATA_FILE: &str = "_meta";
pub(crate) const OBSTACLES_FILE: &str = "_obstacles";

/// Path of the data file for `frame` inside a recording directory.
pub fn frame_path(dir: &Path, frame: u64) -> PathBuf {
    dir.join(format!("{frame:06}.dat"))
}

pub trait EncodeFluid {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError>;
}

impl EncodeFluid for FieldViews<'_> {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError> {
        encoder.encode_section(self.density.iter().copied())?;
        encoder.encode_section(self.temperature.iter().copied())?;
        encoder.encode_section(self.velocity.iter().copied())?;

        Ok(())
    }
}

impl EncodeFluid for SimulationState {
    fn encode_state<W: Write>(&self, encoder: &mut FluidFrameEncoder<W>) -> Result<(), EncodingError> {
        self.views().encode_state(encoder)
    }
}
