use glam::Vec3;

use crate::{config::SmokeParams, stages, state::SimulationState};

/// Advances `state` by one step of `dt` seconds.
///
/// Stages run in a fixed order. Each reads the front fields and writes a back, then swaps, with
/// two exceptions: the impulses blend into the fronts in place and the divergence has a single
/// buffer.
pub fn advance(state: &mut SimulationState, dt: f32, params: &SmokeParams) {
    let h = params.cell_spacing;
    let ambient = params.ambient_temperature;

    let SimulationState {
        grid,
        velocity,
        temperature,
        density,
        pressure,
        divergence,
        obstacles,
    } = state;

    let (front, back) = velocity.split_mut();
    stages::advect(front, front, back, obstacles, dt, params.velocity_dissipation, Vec3::ZERO);
    velocity.swap();

    let (front, back) = temperature.split_mut();
    stages::advect(velocity.front(), front, back, obstacles, dt, params.temperature_dissipation, ambient);
    temperature.swap();

    let (front, back) = density.split_mut();
    stages::advect(velocity.front(), front, back, obstacles, dt, params.density_dissipation, 0.0);
    density.swap();

    let (front, back) = velocity.split_mut();
    stages::apply_buoyancy(front, temperature.front(), density.front(), back, obstacles, dt, params);
    velocity.swap();

    let impulse = &params.impulse;
    let center = impulse.center(grid);
    let radius = impulse.radius_cells(grid);
    stages::apply_impulse(temperature.front_mut(), obstacles, center, radius, impulse.temperature);
    stages::apply_impulse(density.front_mut(), obstacles, center, radius, impulse.density);

    stages::compute_divergence(velocity.front(), obstacles, divergence, h);

    pressure.front_mut().clear(0.0);
    for _ in 0..params.jacobi_iterations {
        let (front, back) = pressure.split_mut();
        stages::jacobi(front, divergence, obstacles, back, h);
        pressure.swap();
    }

    let (front, back) = velocity.split_mut();
    stages::subtract_gradient(front, pressure.front(), obstacles, back, h);
    velocity.swap();

    log::trace!("Advanced {dt:.4}s with {} pressure iterations", params.jacobi_iterations);
}
