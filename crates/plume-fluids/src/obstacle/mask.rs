use glam::{IVec3, Vec3, Vec4};
use ndarray::Array3;

use super::Obstacle;
use crate::{
    config::GridDescriptor,
    error::FluidError,
    field::{allocate, cell_index, to_ivec3},
    stages::NEIGHBORS,
};

/// What occupies a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CellKind {
    #[default]
    Fluid,
    /// Solid with no fluid neighbor.
    Solid,
    /// Solid touching fluid, with the unit normal pointing from the solid into the fluid.
    Boundary(Vec3),
}

impl CellKind {
    #[inline]
    pub fn is_solid(self) -> bool {
        !matches!(self, CellKind::Fluid)
    }
}

/// Static per-cell obstacle mask, built once before the first step.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstacleField {
    cells: Array3<CellKind>,
}

impl ObstacleField {
    /// The one-cell shell around the domain, unioned with every cell center inside `obstacle`.
    pub fn new(grid: GridDescriptor, obstacle: &impl Obstacle) -> Result<Self, FluidError> {
        let (nx, ny, nz) = grid.shape();

        Self::from_fn(grid, |cell| {
            let shell = cell.x == 0
                || cell.y == 0
                || cell.z == 0
                || cell.x as usize == nx - 1
                || cell.y as usize == ny - 1
                || cell.z as usize == nz - 1;

            shell || obstacle.sdf(cell.as_vec3()).distance < 0.0
        })
    }

    /// Builds a mask from a solidity predicate, then derives the boundary normals.
    pub fn from_fn(grid: GridDescriptor, solid: impl Fn(IVec3) -> bool) -> Result<Self, FluidError> {
        let mut cells = allocate(grid, CellKind::Fluid)?;

        for (idx, kind) in cells.indexed_iter_mut() {
            if solid(to_ivec3(idx)) {
                *kind = CellKind::Solid;
            }
        }

        let mut field = ObstacleField { cells };
        field.classify_boundaries();
        Ok(field)
    }

    fn classify_boundaries(&mut self) {
        let shape = self.cells.dim();
        let mut normals = Vec::new();

        for (idx, kind) in self.cells.indexed_iter() {
            if !kind.is_solid() {
                continue;
            }

            let cell = to_ivec3(idx);
            let mut sum = IVec3::ZERO;
            let mut first = None;

            for dir in NEIGHBORS {
                let fluid = cell_index(cell + dir, shape)
                    .is_some_and(|n| !self.cells[n].is_solid());

                if fluid {
                    sum += dir;
                    first.get_or_insert(dir);
                }
            }

            if let Some(first) = first {
                let n = sum.as_vec3().normalize_or_zero();
                let n = if n == Vec3::ZERO { first.as_vec3() } else { n };
                normals.push((idx, n));
            }
        }

        for (idx, n) in normals {
            self.cells[idx] = CellKind::Boundary(n);
        }
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

    #[inline]
    pub fn get(&self, cell: (usize, usize, usize)) -> CellKind {
        self.cells[cell]
    }

    /// Cells outside the grid count as solid.
    #[inline]
    pub fn kind(&self, cell: IVec3) -> CellKind {
        cell_index(cell, self.shape()).map_or(CellKind::Solid, |idx| self.cells[idx])
    }

    #[inline]
    pub fn is_solid(&self, cell: IVec3) -> bool {
        self.kind(cell).is_solid()
    }

    /// Normal of the wall at `wall` as seen from the neighboring fluid cell `from`.
    ///
    /// Boundary cells report their own normal, anything else the face normal toward `from`.
    #[inline]
    pub fn wall_normal(&self, wall: IVec3, from: IVec3) -> Vec3 {
        match self.kind(wall) {
            CellKind::Boundary(n) => n,
            _ => (from - wall).as_vec3().normalize_or_zero(),
        }
    }

    /// Boundary cells with their normals.
    pub fn boundaries(&self) -> impl Iterator<Item = ((usize, usize, usize), Vec3)> + '_ {
        self.cells.indexed_iter().filter_map(|(idx, kind)| match kind {
            CellKind::Boundary(n) => Some((idx, *n)),
            _ => None,
        })
    }

    pub fn fluid_count(&self) -> usize {
        self.cells.iter().filter(|kind| !kind.is_solid()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellKind> + '_ {
        self.cells.iter()
    }

    pub fn indexed_iter(&self) -> impl Iterator<Item = ((usize, usize, usize), &CellKind)> + '_ {
        self.cells.indexed_iter()
    }

    /// Four-channel texels `(solid, nx, ny, nz)` in `(x, y, z)` row-major order.
    pub fn packed(&self) -> impl ExactSizeIterator<Item = Vec4> + '_ {
        self.cells.iter().map(|kind| match *kind {
            CellKind::Fluid => Vec4::ZERO,
            CellKind::Solid => Vec4::X,
            CellKind::Boundary(n) => Vec4::new(1.0, n.x, n.y, n.z),
        })
    }
}
