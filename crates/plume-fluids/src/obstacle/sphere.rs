use glam::Vec3;

use super::{Obstacle, Sdf};

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub position: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Sphere { position, radius }
    }
}

impl Obstacle for Sphere {
    fn sdf(&self, p: Vec3) -> Sdf {
        let offset = p - self.position;
        let d = offset.length();

        Sdf {
            distance: d - self.radius,
            gradient: offset.normalize_or_zero(),
        }
    }
}
