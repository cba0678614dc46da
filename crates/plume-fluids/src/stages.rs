//! The individual passes of a simulation step.
//!
//! Every pass except [`apply_impulse`] reads whole source fields and writes a separate destination
//! field, so a cell never observes a value written earlier in the same pass.

use glam::{IVec3, Vec3};

use crate::{
    config::SmokeParams,
    field::{to_ivec3, Field, Texel},
    obstacle::ObstacleField,
};

/// Offsets of the six face neighbors, ordered east, west, north, south, up, down.
pub const NEIGHBORS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

/// Reflects `v` about the plane with unit normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Semi-Lagrangian advection of `source` through `velocity`.
///
/// Each fluid cell traces back along its velocity, samples `source` there and decays the result
/// toward `rest` by `dissipation`. Solid cells are set to `rest`.
pub fn advect<T: Texel>(
    velocity: &Field<Vec3>,
    source: &Field<T>,
    dest: &mut Field<T>,
    obstacles: &ObstacleField,
    dt: f32,
    dissipation: f32,
    rest: T,
) {
    for (idx, out) in dest.indexed_iter_mut() {
        if obstacles.get(idx).is_solid() {
            *out = rest;
            continue;
        }

        let origin = to_ivec3(idx).as_vec3() - dt * velocity.get(idx);
        *out = rest + (source.sample(origin) - rest) * dissipation;
    }
}

/// Adds thermal lift and smoke weight along the up direction.
pub fn apply_buoyancy(
    velocity: &Field<Vec3>,
    temperature: &Field<f32>,
    density: &Field<f32>,
    dest: &mut Field<Vec3>,
    obstacles: &ObstacleField,
    dt: f32,
    params: &SmokeParams,
) {
    let up = params.up.normalize_or_zero();

    for (idx, out) in dest.indexed_iter_mut() {
        if obstacles.get(idx).is_solid() {
            *out = Vec3::ZERO;
            continue;
        }

        let lift = params.buoyancy * (temperature.get(idx) - params.ambient_temperature);
        let weight = params.weight * density.get(idx);

        *out = velocity.get(idx) + dt * (lift - weight) * up;
    }
}

/// Blends `field` toward `target` inside a sphere, in place.
///
/// The weight is `min((radius - d) / 2, 1)`, so the edge of the sphere fades over two cells.
pub fn apply_impulse(field: &mut Field<f32>, obstacles: &ObstacleField, center: Vec3, radius: f32, target: f32) {
    for (idx, out) in field.indexed_iter_mut() {
        if obstacles.get(idx).is_solid() {
            continue;
        }

        let d = to_ivec3(idx).as_vec3().distance(center);
        if d < radius {
            let a = ((radius - d) * 0.5).min(1.0);
            *out = a * target + (1.0 - a) * *out;
        }
    }
}

/// Velocity of the neighbor at `cell + dir`, or the reflected own velocity when that neighbor is a
/// wall.
#[inline]
fn neighbor_velocity(velocity: &Field<Vec3>, obstacles: &ObstacleField, cell: IVec3, dir: IVec3, own: Vec3) -> Vec3 {
    let n = cell + dir;

    match velocity.try_get(n) {
        Some(v) if !obstacles.is_solid(n) => v,
        _ => reflect(own, obstacles.wall_normal(n, cell)),
    }
}

/// Pressure of the neighbor at `cell + dir`, or `own` when that neighbor is a wall.
#[inline]
fn neighbor_pressure(pressure: &Field<f32>, obstacles: &ObstacleField, cell: IVec3, dir: IVec3, own: f32) -> f32 {
    let n = cell + dir;

    match pressure.try_get(n) {
        Some(p) if !obstacles.is_solid(n) => p,
        _ => own,
    }
}

/// Central-difference divergence of `velocity` with spacing `h`.
pub fn compute_divergence(velocity: &Field<Vec3>, obstacles: &ObstacleField, dest: &mut Field<f32>, h: f32) {
    let scale = 0.5 / h;

    for (idx, out) in dest.indexed_iter_mut() {
        if obstacles.get(idx).is_solid() {
            *out = 0.0;
            continue;
        }

        let cell = to_ivec3(idx);
        let own = velocity.get(idx);
        let [e, w, n, s, u, d] = NEIGHBORS.map(|dir| neighbor_velocity(velocity, obstacles, cell, dir, own));

        *out = scale * (e.x - w.x + n.y - s.y + u.z - d.z);
    }
}

/// One Jacobi relaxation of the pressure Poisson equation.
pub fn jacobi(
    pressure: &Field<f32>,
    divergence: &Field<f32>,
    obstacles: &ObstacleField,
    dest: &mut Field<f32>,
    h: f32,
) {
    let h2 = h * h;

    for (idx, out) in dest.indexed_iter_mut() {
        if obstacles.get(idx).is_solid() {
            *out = 0.0;
            continue;
        }

        let cell = to_ivec3(idx);
        let own = pressure.get(idx);
        let sum: f32 = NEIGHBORS
            .iter()
            .map(|&dir| neighbor_pressure(pressure, obstacles, cell, dir, own))
            .sum();

        *out = (sum - h2 * divergence.get(idx)) / 6.0;
    }
}

/// Removes the pressure gradient from `velocity`. Solid cells come out at rest.
pub fn subtract_gradient(
    velocity: &Field<Vec3>,
    pressure: &Field<f32>,
    obstacles: &ObstacleField,
    dest: &mut Field<Vec3>,
    h: f32,
) {
    let scale = 0.5 / h;

    for (idx, out) in dest.indexed_iter_mut() {
        if obstacles.get(idx).is_solid() {
            *out = Vec3::ZERO;
            continue;
        }

        let cell = to_ivec3(idx);
        let own = pressure.get(idx);
        let [e, w, n, s, u, d] = NEIGHBORS.map(|dir| neighbor_pressure(pressure, obstacles, cell, dir, own));

        *out = velocity.get(idx) - scale * Vec3::new(e - w, n - s, u - d);
    }
}

/// Max-norm of `Lap_h(p) - div` over fluid cells.
pub fn pressure_residual(pressure: &Field<f32>, divergence: &Field<f32>, obstacles: &ObstacleField, h: f32) -> f32 {
    let h2 = h * h;
    let mut residual = 0.0f32;

    for (idx, kind) in obstacles.indexed_iter() {
        if kind.is_solid() {
            continue;
        }

        let cell = to_ivec3(idx);
        let own = pressure.get(idx);
        let sum: f32 = NEIGHBORS
            .iter()
            .map(|&dir| neighbor_pressure(pressure, obstacles, cell, dir, own))
            .sum();

        let r = (sum - 6.0 * own) / h2 - divergence.get(idx);
        residual = residual.max(r.abs());
    }

    residual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GridDescriptor, obstacle::ObstacleSet};

    fn grid(n: usize) -> GridDescriptor {
        GridDescriptor::cubic(n).unwrap()
    }

    fn boxed(n: usize) -> ObstacleField {
        ObstacleField::new(grid(n), &ObstacleSet::default()).unwrap()
    }

    fn open(n: usize) -> ObstacleField {
        ObstacleField::from_fn(grid(n), |_| false).unwrap()
    }

    /// Fluid-cell statistics `(max |x|, rms)`.
    fn stats(field: &Field<f32>, obstacles: &ObstacleField) -> (f32, f32) {
        let values: Vec<f32> = field
            .iter()
            .zip(obstacles.iter())
            .filter(|(_, kind)| !kind.is_solid())
            .map(|(v, _)| v.abs())
            .collect();

        let max = values.iter().copied().fold(0.0, f32::max);
        let rms = (values.iter().map(|v| v * v).sum::<f32>() / values.len() as f32).sqrt();
        (max, rms)
    }

    /// A rising gaussian blob, zero in solid cells.
    fn plume_velocity(n: usize, obstacles: &ObstacleField) -> Field<Vec3> {
        let mut velocity = Field::<Vec3>::new(grid(n)).unwrap();
        let c = (n as f32 - 1.0) / 2.0;

        for ((i, j, k), v) in velocity.indexed_iter_mut() {
            if obstacles.get((i, j, k)).is_solid() {
                continue;
            }

            let (x, y, z) = (i as f32 - c, j as f32 - c - 1.0, k as f32 - c);
            let g = (-(x * x + y * y + z * z) / 6.0).exp();
            *v = Vec3::new(0.3 * g * x / 2.0, 2.0 * g, 0.1 * g);
        }

        velocity
    }

    fn solve(divergence: &Field<f32>, obstacles: &ObstacleField, iterations: usize, h: f32) -> Field<f32> {
        let mut front = Field::<f32>::new(grid(obstacles.shape().0)).unwrap();
        let mut back = front.clone();

        for _ in 0..iterations {
            jacobi(&front, divergence, obstacles, &mut back, h);
            std::mem::swap(&mut front, &mut back);
        }

        front
    }

    #[test]
    fn advect_with_zero_velocity_only_dissipates() {
        let obstacles = open(4);
        let velocity = Field::<Vec3>::new(grid(4)).unwrap();
        let mut source = Field::<f32>::new(grid(4)).unwrap();
        for ((i, j, k), v) in source.indexed_iter_mut() {
            *v = (i + 2 * j + 3 * k) as f32;
        }

        let mut dest = Field::<f32>::new(grid(4)).unwrap();
        advect(&velocity, &source, &mut dest, &obstacles, 0.5, 0.5, 0.0);

        assert_eq!(dest.get((1, 2, 3)), 0.5 * 14.0);
        assert_eq!(dest.get((3, 0, 0)), 1.5);
    }

    #[test]
    fn advect_traces_backward() {
        let obstacles = open(6);
        let mut velocity = Field::<Vec3>::new(grid(6)).unwrap();
        velocity.clear(Vec3::new(2.0, 0.0, 0.0));

        let mut source = Field::<f32>::new(grid(6)).unwrap();
        source.set((2, 3, 3), 1.0);

        let mut dest = Field::<f32>::new(grid(6)).unwrap();
        advect(&velocity, &source, &mut dest, &obstacles, 0.5, 1.0, 0.0);

        assert_eq!(dest.get((3, 3, 3)), 1.0);
        assert_eq!(dest.get((2, 3, 3)), 0.0);
    }

    #[test]
    fn advect_dissipates_toward_rest() {
        let obstacles = boxed(5);
        let velocity = Field::<Vec3>::new(grid(5)).unwrap();
        let mut source = Field::<f32>::new(grid(5)).unwrap();
        source.clear(12.0);

        let mut dest = Field::<f32>::new(grid(5)).unwrap();
        advect(&velocity, &source, &mut dest, &obstacles, 1.0, 0.5, 2.0);

        assert_eq!(dest.get((2, 2, 2)), 7.0);
        assert_eq!(dest.get((0, 2, 2)), 2.0);
    }

    #[test]
    fn buoyancy_lifts_hot_and_sinks_dense() {
        let obstacles = boxed(5);
        let velocity = Field::<Vec3>::new(grid(5)).unwrap();
        let mut temperature = Field::<f32>::new(grid(5)).unwrap();
        let mut density = Field::<f32>::new(grid(5)).unwrap();
        temperature.set((2, 2, 2), 3.0);
        density.set((1, 1, 1), 2.0);

        let params = SmokeParams {
            up: Vec3::new(0.0, 2.0, 0.0),
            ..Default::default()
        };

        let mut dest = Field::<Vec3>::new(grid(5)).unwrap();
        apply_buoyancy(&velocity, &temperature, &density, &mut dest, &obstacles, 0.5, &params);

        assert_eq!(dest.get((2, 2, 2)), Vec3::new(0.0, 1.5, 0.0));
        assert!((dest.get((1, 1, 1)).y + 0.05).abs() < 1e-6);
        assert_eq!(dest.get((0, 0, 0)), Vec3::ZERO);
    }

    #[test]
    fn impulse_blends_inside_radius() {
        let obstacles = open(9);
        let mut field = Field::<f32>::new(grid(9)).unwrap();

        apply_impulse(&mut field, &obstacles, Vec3::splat(4.0), 3.0, 10.0);

        assert_eq!(field.get((4, 4, 4)), 10.0);
        assert_eq!(field.get((4, 4, 6)), 5.0);
        assert_eq!(field.get((4, 4, 7)), 0.0);
        assert_eq!(field.get((0, 0, 0)), 0.0);
    }

    #[test]
    fn impulse_skips_solid_cells() {
        let obstacles = boxed(5);
        let mut field = Field::<f32>::new(grid(5)).unwrap();

        apply_impulse(&mut field, &obstacles, Vec3::new(2.0, 0.0, 2.0), 2.0, 1.0);

        assert_eq!(field.get((2, 0, 2)), 0.0);
        assert_eq!(field.get((2, 1, 2)), 0.5);
    }

    #[test]
    fn reflect_flips_normal_component() {
        let v = Vec3::new(1.0, 2.0, 3.0);

        assert_eq!(reflect(v, Vec3::NEG_X), Vec3::new(-1.0, 2.0, 3.0));
        assert_eq!(reflect(v, Vec3::Z), Vec3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn divergence_of_linear_field() {
        let obstacles = open(6);
        let mut velocity = Field::<Vec3>::new(grid(6)).unwrap();
        for ((i, j, _), v) in velocity.indexed_iter_mut() {
            *v = Vec3::new(i as f32, 2.0 * j as f32, 0.0);
        }

        let mut divergence = Field::<f32>::new(grid(6)).unwrap();
        compute_divergence(&velocity, &obstacles, &mut divergence, 0.5);

        assert_eq!(divergence.get((2, 3, 1)), 6.0);
    }

    #[test]
    fn walls_reflect_normal_velocity() {
        let obstacles = boxed(6);
        let mut velocity = Field::<Vec3>::new(grid(6)).unwrap();
        velocity.clear(Vec3::Y);

        let mut divergence = Field::<f32>::new(grid(6)).unwrap();
        compute_divergence(&velocity, &obstacles, &mut divergence, 1.0);

        assert_eq!(divergence.get((2, 2, 3)), 0.0);
        assert_eq!(divergence.get((1, 3, 4)), 0.0);
        assert_eq!(divergence.get((2, 1, 2)), 1.0);
        assert_eq!(divergence.get((2, 4, 2)), -1.0);
        assert_eq!(divergence.get((0, 2, 2)), 0.0);
    }

    #[test]
    fn projection_reduces_divergence() {
        let h = 1.25;
        let obstacles = boxed(12);
        let velocity = plume_velocity(12, &obstacles);

        let mut divergence = Field::<f32>::new(grid(12)).unwrap();
        compute_divergence(&velocity, &obstacles, &mut divergence, h);
        let (max_before, rms_before) = stats(&divergence, &obstacles);
        assert!(max_before > 0.1);

        let pressure = solve(&divergence, &obstacles, 40, h);
        let mut projected = Field::<Vec3>::new(grid(12)).unwrap();
        subtract_gradient(&velocity, &pressure, &obstacles, &mut projected, h);

        let mut after = Field::<f32>::new(grid(12)).unwrap();
        compute_divergence(&projected, &obstacles, &mut after, h);
        let (max_after, rms_after) = stats(&after, &obstacles);

        assert!(max_after < 0.35 * max_before, "max {max_before} -> {max_after}");
        assert!(rms_after < 0.5 * rms_before, "rms {rms_before} -> {rms_after}");
    }

    #[test]
    fn more_iterations_shrink_residual() {
        let h = 1.25;
        let obstacles = boxed(12);
        let velocity = plume_velocity(12, &obstacles);

        let mut divergence = Field::<f32>::new(grid(12)).unwrap();
        compute_divergence(&velocity, &obstacles, &mut divergence, h);

        let coarse = pressure_residual(&solve(&divergence, &obstacles, 20, h), &divergence, &obstacles, h);
        let fine = pressure_residual(&solve(&divergence, &obstacles, 200, h), &divergence, &obstacles, h);

        assert!(fine < coarse, "{fine} >= {coarse}");
        assert!(fine < 1e-2);
    }

    #[test]
    fn gradient_zeroes_solid_cells() {
        let obstacles = boxed(4);
        let mut velocity = Field::<Vec3>::new(grid(4)).unwrap();
        velocity.clear(Vec3::ONE);
        let pressure = Field::<f32>::new(grid(4)).unwrap();

        let mut dest = Field::<Vec3>::new(grid(4)).unwrap();
        subtract_gradient(&velocity, &pressure, &obstacles, &mut dest, 1.0);

        assert_eq!(dest.get((0, 1, 1)), Vec3::ZERO);
        assert_eq!(dest.get((1, 2, 1)), Vec3::ONE);
    }
}
