use std::{
    fmt::Debug,
    ops::{Add, Mul, Sub},
};

use glam::{IVec3, UVec3, Vec3};
use ndarray::{iter::IndexedIterMut, Array3, ArrayView3, Ix3};

use crate::{config::GridDescriptor, error::FluidError};

/// A value stored in every cell of a [`Field`].
pub trait Texel:
    Copy + Default + Debug + PartialEq + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    /// Number of `f32` components per cell.
    const COMPONENTS: usize;
}

impl Texel for f32 {
    const COMPONENTS: usize = 1;
}

impl Texel for Vec3 {
    const COMPONENTS: usize = 3;
}

/// A scalar or vector quantity stored at every cell of the grid.
///
/// Cell centers sit at integer coordinates, so `sample(Vec3::new(2.0, 0.0, 1.0))` returns exactly
/// the value of cell `(2, 0, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field<T> {
    cells: Array3<T>,
}

impl<T: Texel> Field<T> {
    /// Allocates a zero-initialized field covering `grid`.
    pub fn new(grid: GridDescriptor) -> Result<Self, FluidError> {
        Ok(Self {
            cells: allocate(grid, T::default())?,
        })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.cells.dim()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sets every cell to `value`.
    pub fn clear(&mut self, value: T) {
        self.cells.fill(value);
    }

    #[inline]
    pub fn get(&self, cell: (usize, usize, usize)) -> T {
        self.cells[cell]
    }

    #[inline]
    pub fn set(&mut self, cell: (usize, usize, usize), value: T) {
        self.cells[cell] = value;
    }

    /// Reads a cell by signed coordinate, `None` outside the grid.
    #[inline]
    pub fn try_get(&self, cell: IVec3) -> Option<T> {
        cell_index(cell, self.shape()).map(|idx| self.cells[idx])
    }

    /// Trilinear sample at a continuous cell coordinate, clamped to the edge cells.
    pub fn sample(&self, p: Vec3) -> T {
        let (nx, ny, nz) = self.cells.dim();
        let last = UVec3::new(nx as u32 - 1, ny as u32 - 1, nz as u32 - 1);

        let p = p.clamp(Vec3::ZERO, last.as_vec3());
        let p0 = p.floor().as_uvec3().min(last);
        let p1 = (p0 + 1).min(last);
        let t = p - p0.as_vec3();

        let (x0, y0, z0) = (p0.x as usize, p0.y as usize, p0.z as usize);
        let (x1, y1, z1) = (p1.x as usize, p1.y as usize, p1.z as usize);
        let c = &self.cells;

        trilerp(
            c[(x0, y0, z0)],
            c[(x0, y0, z1)],
            c[(x0, y1, z0)],
            c[(x0, y1, z1)],
            c[(x1, y0, z0)],
            c[(x1, y0, z1)],
            c[(x1, y1, z0)],
            c[(x1, y1, z1)],
            t,
        )
    }

    pub fn view(&self) -> ArrayView3<'_, T> {
        self.cells.view()
    }

    /// Cells in `(x, y, z)` row-major order, `z` fastest.
    pub fn iter(&self) -> ndarray::iter::Iter<'_, T, Ix3> {
        self.cells.iter()
    }

    pub fn indexed_iter_mut(&mut self) -> IndexedIterMut<'_, T, Ix3> {
        self.cells.indexed_iter_mut()
    }
}

/// Allocates grid-shaped storage, reporting exhaustion instead of aborting.
pub(crate) fn allocate<T: Clone>(grid: GridDescriptor, value: T) -> Result<Array3<T>, FluidError> {
    let cells = grid.cell_count();

    let mut data = Vec::new();
    data.try_reserve_exact(cells).map_err(|_| FluidError::Allocation { cells })?;
    data.resize(cells, value);

    Ok(Array3::from_shape_vec(grid.shape(), data)?)
}

/// Converts a signed coordinate into an array index, `None` outside `shape`.
#[inline]
pub(crate) fn cell_index(cell: IVec3, (nx, ny, nz): (usize, usize, usize)) -> Option<(usize, usize, usize)> {
    if cell.cmplt(IVec3::ZERO).any() {
        return None;
    }

    let (x, y, z) = (cell.x as usize, cell.y as usize, cell.z as usize);
    (x < nx && y < ny && z < nz).then_some((x, y, z))
}

#[inline]
pub(crate) fn to_ivec3((i, j, k): (usize, usize, usize)) -> IVec3 {
    IVec3::new(i as i32, j as i32, k as i32)
}

#[inline]
fn lerp<T: Texel>(v0: T, v1: T, t: f32) -> T {
    v0 + (v1 - v0) * t
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn trilerp<T: Texel>(v000: T, v001: T, v010: T, v011: T, v100: T, v101: T, v110: T, v111: T, p: Vec3) -> T {
    let v00 = lerp(v000, v100, p.x);
    let v01 = lerp(v001, v101, p.x);
    let v10 = lerp(v010, v110, p.x);
    let v11 = lerp(v011, v111, p.x);

    let v0 = lerp(v00, v10, p.y);
    let v1 = lerp(v01, v11, p.y);

    lerp(v0, v1, p.z)
}
