use glam::Vec3;

pub mod mask;
pub mod sphere;

pub use mask::{CellKind, ObstacleField};

/// A static solid region, described by its signed distance in cell coordinates.
pub trait Obstacle {
    fn sdf(&self, p: Vec3) -> Sdf;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sdf {
    /// Negative inside the obstacle.
    pub distance: f32,
    pub gradient: Vec3,
}

impl Sdf {
    pub fn new(distance: f32, gradient: Vec3) -> Sdf {
        Sdf { distance, gradient }
    }
}

/// The union of several obstacles.
#[derive(Default)]
pub struct ObstacleSet {
    obstacles: Vec<Box<dyn Obstacle>>,
}

impl ObstacleSet {
    pub fn new(obstacles: Vec<Box<dyn Obstacle>>) -> Self {
        ObstacleSet { obstacles }
    }

    pub fn push<T: Obstacle + 'static>(&mut self, obstacle: T) {
        self.obstacles.push(Box::new(obstacle));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl Obstacle for ObstacleSet {
    fn sdf(&self, p: Vec3) -> Sdf {
        let mut dist = f32::MAX;
        let mut gradient = Vec3::ZERO;

        for obstacle in &self.obstacles {
            let sd = obstacle.sdf(p);
            if dist > sd.distance {
                dist = sd.distance;
                gradient = sd.gradient;
            }
        }

        Sdf::new(dist, gradient)
    }
}
