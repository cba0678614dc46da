use std::{fs::File, io::{BufReader, Read}, path::PathBuf};

use glam::{Vec3, Vec4};
use smallvec::SmallVec;
use thiserror::Error;

use plume_fluids::{ConfigError, GridDescriptor};

use crate::{as_bytes::AsBytes, frame_path, METADATA_FILE, OBSTACLES_FILE};

pub struct FluidDataDecoder {
    /// The path to the directory in which the fluid data resides.
    path: PathBuf,
    metadata: Option<FluidMetadata>,
    current_frame: u64,
}

impl FluidDataDecoder {
    pub fn new(path: PathBuf) -> FluidDataDecoder {
        Self {
            path,
            metadata: None,
            current_frame: 0,
        }
    }

    fn read_value<const N: usize, T: AsBytes<N>, R: Read>(reader: &mut R) -> Result<T, DecodingError> {
        let mut bytes = [0; N];
        reader.read_exact(&mut bytes)?;

        Ok(T::from_bytes(bytes))
    }

    /// Reads one section, which must hold exactly `expected` values.
    fn read_section<const N: usize, T: AsBytes<N>, R: Read>(
        reader: &mut R,
        expected: usize,
    ) -> Result<Vec<T>, DecodingError> {
        let len = Self::read_value::<8, u64, _>(reader)?;
        if len != expected as u64 {
            return Err(DecodingError::SectionLength { expected: expected as u64, found: len });
        }

        let mut bytes = vec![0; N * expected];
        reader.read_exact(&mut bytes)?;

        Ok(bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut b = [0; N];
                b.copy_from_slice(chunk);
                T::from_bytes(b)
            })
            .collect())
    }

    fn cell_count(&self) -> Result<usize, DecodingError> {
        let metadata = self.metadata.as_ref().ok_or(DecodingError::MissingMetadata)?;
        Ok(metadata.grid()?.cell_count())
    }

    pub fn decode_metadata(&mut self) -> Result<FluidMetadata, DecodingError> {
        let path = self.path.join(METADATA_FILE);
        let mut reader = BufReader::new(File::open(path)?);

        let dim = Self::read_value::<1, u8, _>(&mut reader)?;
        if dim != 3 {
            return Err(DecodingError::UnsupportedDimension(dim));
        }

        let fps = Self::read_value::<4, u32, _>(&mut reader)?;
        let num_frames = Self::read_value::<8, u64, _>(&mut reader)?;
        let mut size: SmallVec<[u32; 4]> = SmallVec::new();

        for _ in 0..dim {
            size.push(Self::read_value::<4, u32, _>(&mut reader)?);
        }

        let metadata = FluidMetadata {
            dim,
            fps,
            num_frames,
            size,
        };

        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    /// Packed `(solid, nx, ny, nz)` texels, one per cell.
    pub fn decode_obstacles(&self) -> Result<Vec<Vec4>, DecodingError> {
        let cells = self.cell_count()?;
        let mut reader = BufReader::new(File::open(self.path.join(OBSTACLES_FILE))?);

        Self::read_section::<16, Vec4, _>(&mut reader, cells)
    }

    /// Decodes the next frame, `None` once every recorded frame has been read.
    pub fn decode_frame(&mut self) -> Result<Option<FluidFrameData>, DecodingError> {
        let cells = self.cell_count()?;
        let num_frames = self.metadata.as_ref().map_or(0, |m| m.num_frames);

        if self.current_frame >= num_frames {
            return Ok(None);
        }

        let path = frame_path(&self.path, self.current_frame);
        let mut reader = BufReader::new(File::open(path)?);

        let density = Self::read_section::<4, f32, _>(&mut reader, cells)?;
        let temperature = Self::read_section::<4, f32, _>(&mut reader, cells)?;
        let velocity = Self::read_section::<12, Vec3, _>(&mut reader, cells)?;

        self.current_frame += 1;

        Ok(Some(FluidFrameData {
            density,
            temperature,
            velocity,
        }))
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluidMetadata {
    pub dim: u8,
    pub fps: u32,
    pub num_frames: u64,
    pub size: SmallVec<[u32; 4]>,
}

impl FluidMetadata {
    pub fn grid(&self) -> Result<GridDescriptor, DecodingError> {
        match self.size[..] {
            [w, h, d] => Ok(GridDescriptor::new(w as usize, h as usize, d as usize)?),
            _ => Err(DecodingError::UnsupportedDimension(self.dim)),
        }
    }
}

/// One decoded frame, every field in `(x, y, z)` row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidFrameData {
    pub density: Vec<f32>,
    pub temperature: Vec<f32>,
    pub velocity: Vec<Vec3>,
}

#[derive(Debug, Error)]
pub enum DecodingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("only 3D recordings are supported, found {0}D")]
    UnsupportedDimension(u8),
    #[error("section holds {found} values, expected {expected}")]
    SectionLength { expected: u64, found: u64 },
    #[error("metadata must be decoded before frames")]
    MissingMetadata,
    #[error("recorded grid is invalid: {0}")]
    Grid(#[from] ConfigError),
}
