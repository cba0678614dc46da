use std::{fs::File, io::{BufWriter, Write}, path::PathBuf};

use thiserror::Error;

use plume_fluids::{GridDescriptor, ObstacleField};

use crate::{frame_path, EncodeFluid, METADATA_FILE, OBSTACLES_FILE};

use super::as_bytes::AsBytes;

/// Writes a recording directory frame by frame.
///
/// The metadata is written last, by [`FluidDataEncoder::finish`], so it always holds the number
/// of frames that actually made it to disk.
pub struct FluidDataEncoder {
    /// The path to the directory into which the fluid data will be placed.
    path: PathBuf,
    grid: GridDescriptor,
    fps: u32,
    current_frame: u64,
}

impl FluidDataEncoder {
    pub fn new(path: PathBuf, grid: GridDescriptor, fps: u32) -> Result<FluidDataEncoder, EncodingError> {
        std::fs::create_dir_all(&path)?;
        log::info!("Recording {}x{}x{} frames to {}", grid.width, grid.height, grid.depth, path.display());

        Ok(Self {
            path,
            grid,
            fps,
            current_frame: 0,
        })
    }

    #[inline]
    pub fn frames_written(&self) -> u64 {
        self.current_frame
    }

    pub fn encode_metadata(&self) -> Result<(), EncodingError> {
        let path = self.path.join(METADATA_FILE);
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&3u8.to_bytes())?;
        writer.write_all(&self.fps.to_bytes())?;
        writer.write_all(&self.current_frame.to_bytes())?;

        for extent in [self.grid.width, self.grid.height, self.grid.depth] {
            writer.write_all(&(extent as u32).to_bytes())?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn encode_obstacles(&mut self, obstacles: &ObstacleField) -> Result<(), EncodingError> {
        let path = self.path.join(OBSTACLES_FILE);
        let mut encoder = FluidFrameEncoder::new(File::create(path)?);

        encoder.encode_section(obstacles.packed())?;
        encoder.finish()
    }

    pub fn encode_frame<F: EncodeFluid>(&mut self, fluid: &F) -> Result<(), EncodingError> {
        let path = frame_path(&self.path, self.current_frame);
        let mut encoder = FluidFrameEncoder::new(File::create(path)?);

        fluid.encode_state(&mut encoder)?;
        encoder.finish()?;

        log::debug!("Encoded frame {}", self.current_frame);
        self.current_frame += 1;

        Ok(())
    }

    /// Writes the metadata and returns the number of frames recorded.
    pub fn finish(self) -> Result<u64, EncodingError> {
        self.encode_metadata()?;
        log::info!("Recorded {} frames to {}", self.current_frame, self.path.display());

        Ok(self.current_frame)
    }
}

pub struct FluidFrameEncoder<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> FluidFrameEncoder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
        }
    }

    /// Writes `len: u64` followed by every value.
    pub fn encode_section<const N: usize, T, I>(&mut self, values: I) -> Result<(), EncodingError>
    where
        I: ExactSizeIterator<Item = T>,
        T: AsBytes<N>,
    {
        self.writer.write_all(&(values.len() as u64).to_bytes())?;

        for v in values {
            self.writer.write_all(&v.to_bytes())?;
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<(), EncodingError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(self) -> Result<W, EncodingError> {
        self.writer.into_inner().map_err(|e| EncodingError::Io(e.into_error()))
    }
}

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
