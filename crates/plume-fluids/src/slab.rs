use crate::{
    config::GridDescriptor,
    error::FluidError,
    field::{Field, Texel},
};

/// A double-buffered field.
///
/// Stages read the front and write the back, then call [`Slab::swap`]. Swapping only flips the
/// designation, no cell data moves.
#[derive(Debug, Clone)]
pub struct Slab<T> {
    buffers: [Field<T>; 2],
    /// Index of the front buffer.
    front: usize,
}

impl<T: Texel> Slab<T> {
    pub fn new(grid: GridDescriptor) -> Result<Self, FluidError> {
        Ok(Self {
            buffers: [Field::new(grid)?, Field::new(grid)?],
            front: 0,
        })
    }

    /// Pairs two existing fields, `front` first. Both must have the same shape.
    pub fn from_fields(front: Field<T>, back: Field<T>) -> Result<Self, FluidError> {
        if front.shape() != back.shape() {
            return Err(FluidError::ShapeMismatch {
                expected: front.shape(),
                found: back.shape(),
            });
        }

        Ok(Self {
            buffers: [front, back],
            front: 0,
        })
    }

    #[inline]
    pub fn front(&self) -> &Field<T> {
        &self.buffers[self.front]
    }

    /// Mutable access to the front.
    ///
    /// Only impulse injection and initial seeding write the front directly. Every other pass goes
    /// through [`Slab::split_mut`].
    #[inline]
    pub fn front_mut(&mut self) -> &mut Field<T> {
        &mut self.buffers[self.front]
    }

    #[inline]
    pub fn back(&self) -> &Field<T> {
        &self.buffers[self.front ^ 1]
    }

    /// Borrows the front for reading and the back for writing.
    #[inline]
    pub fn split_mut(&mut self) -> (&Field<T>, &mut Field<T>) {
        let [a, b] = &mut self.buffers;
        if self.front == 0 { (&*a, b) } else { (&*b, a) }
    }

    #[inline]
    pub fn swap(&mut self) {
        self.front ^= 1;
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.buffers[0].shape()
    }
}
