//! Whole-step behavior of the smoke pipeline.

use glam::{IVec3, Vec3};
use plume_fluids::{
    stages, Field, GridDescriptor, Impulse, ObstacleField, Scene, SimulationState, SmokeConfig,
    SmokeParams, Stepping,
};

fn config(n: usize) -> SmokeConfig {
    SmokeConfig {
        grid: GridDescriptor::cubic(n).unwrap(),
        ..Default::default()
    }
}

fn rms_fluid(field: &Field<f32>, obstacles: &ObstacleField) -> f32 {
    let values: Vec<f32> = field
        .iter()
        .zip(obstacles.iter())
        .filter(|(_, kind)| !kind.is_solid())
        .map(|(v, _)| *v)
        .collect();

    (values.iter().map(|v| v * v).sum::<f32>() / values.len() as f32).sqrt()
}

/// A hot impulse in the middle of a still box heats only its own sphere on the first step.
#[test]
fn test_impulse_heats_center_only() {
    let ambient = 5.0;
    let mut config = config(16);
    config.params.ambient_temperature = ambient;
    config.params.impulse = Impulse {
        position: Vec3::splat(0.5),
        temperature: ambient + 10.0,
        ..Default::default()
    };

    let mut scene = Scene::from_config(&config).unwrap();
    assert_eq!(scene.update(0.016), 1);

    let temperature = scene.fluid.temperature();
    assert!(temperature.get((8, 8, 8)) > ambient);

    let center = Vec3::splat(8.0);
    for ((i, j, k), &t) in temperature.view().indexed_iter() {
        let d = Vec3::new(i as f32, j as f32, k as f32).distance(center);
        if d >= 2.0 {
            assert_eq!(t, ambient, "cell {:?} at distance {d}", (i, j, k));
        }
    }
}

/// With every cell solid there is nowhere for the fluid to move.
#[test]
fn test_fully_solid_domain_stays_at_rest() {
    let grid = GridDescriptor::cubic(8).unwrap();
    let obstacles = ObstacleField::from_fn(grid, |_| true).unwrap();
    let mut state = SimulationState::new(grid, obstacles, 0.0).unwrap();
    state.velocity_mut().clear(Vec3::new(1.0, -2.0, 0.5));
    state.temperature_mut().clear(4.0);

    let mut scene = Scene::new(state, SmokeParams::default(), Stepping::default());
    scene.step(0.1);

    assert!(scene.fluid.velocity().iter().all(|&v| v == Vec3::ZERO));
    assert!(scene.fluid.temperature().iter().all(|&t| t == 0.0));
}

/// Pausing keeps every field bit-identical.
#[test]
fn test_paused_frames_leave_fields_untouched() {
    let mut scene = Scene::from_config(&config(12)).unwrap();
    for _ in 0..3 {
        scene.update(0.1);
    }

    let velocity = scene.fluid.velocity().clone();
    let temperature = scene.fluid.temperature().clone();
    let density = scene.fluid.density().clone();

    scene.toggle();
    for _ in 0..5 {
        assert_eq!(scene.update(0.1), 0);
    }

    assert_eq!(scene.step_count(), 3);
    assert_eq!(scene.fluid.velocity(), &velocity);
    assert_eq!(scene.fluid.temperature(), &temperature);
    assert_eq!(scene.fluid.density(), &density);
}

/// Identical elapsed sequences give identical fields.
#[test]
fn test_stepping_is_deterministic() {
    let mut config = config(12);
    config.stepping = Stepping::Fixed { tick: 0.05, max_substeps: 3 };

    let elapsed = [0.016, 0.12, 0.033, 0.5, 0.0, 0.07];
    let mut a = Scene::from_config(&config).unwrap();
    let mut b = Scene::from_config(&config).unwrap();

    for dt in elapsed {
        assert_eq!(a.update(dt), b.update(dt));
    }

    assert!(a.step_count() > 0);
    assert_eq!(a.fluid.velocity(), b.fluid.velocity());
    assert_eq!(a.fluid.temperature(), b.fluid.temperature());
    assert_eq!(a.fluid.density(), b.fluid.density());
    assert_eq!(a.fluid.pressure(), b.fluid.pressure());
}

/// Advection and impulses never leave the range spanned by ambient and the impulse targets.
#[test]
fn test_scalars_stay_in_bounds() {
    let config = config(16);
    let impulse = config.params.impulse;
    let mut scene = Scene::from_config(&config).unwrap();

    for _ in 0..12 {
        scene.step(0.25);

        let eps = 1e-4;
        for &d in scene.fluid.density().iter() {
            assert!((-eps..=impulse.density + eps).contains(&d), "density {d}");
        }
        for &t in scene.fluid.temperature().iter() {
            assert!((-eps..=impulse.temperature + eps).contains(&t), "temperature {t}");
        }
    }

    assert!(scene.fluid.density().get((8, 1, 8)) > 0.0);
}

/// Wall cells carry no velocity and the fluid beside them barely moves along the wall normal.
#[test]
fn test_walls_have_no_normal_velocity() {
    let mut scene = Scene::from_config(&config(16)).unwrap();
    for _ in 0..6 {
        scene.step(0.25);
    }

    let velocity = scene.fluid.velocity();
    let max_speed = velocity.iter().map(|v| v.length()).fold(0.0, f32::max);
    assert!(max_speed > 1.0);

    let mut walls = 0;
    let mut into_wall = 0.0f32;
    let mut normal_sum = 0.0;
    for ((i, j, k), n) in scene.fluid.obstacles().boundaries() {
        assert_eq!(velocity.get((i, j, k)), Vec3::ZERO);

        let beside = IVec3::new(i as i32, j as i32, k as i32) + n.round().as_ivec3();
        let vn = velocity.try_get(beside).unwrap().dot(n);
        into_wall = into_wall.max(-vn);
        normal_sum += vn.abs();
        walls += 1;
    }

    assert!(walls > 0);
    assert!(into_wall < 0.2 * max_speed, "{into_wall} into a wall, max speed {max_speed}");
    assert!(normal_sum / (walls as f32) < 0.05 * max_speed);
}

/// Projection removes most of the divergence the forces introduced.
#[test]
fn test_projection_reduces_divergence() {
    let mut scene = Scene::from_config(&config(16)).unwrap();
    let h = scene.params().cell_spacing;

    for step in 0..9 {
        scene.step(0.25);
        if step == 0 {
            continue;
        }

        let state = &scene.fluid;
        let before = rms_fluid(state.divergence(), state.obstacles());

        let mut after = Field::new(state.grid()).unwrap();
        stages::compute_divergence(state.velocity(), state.obstacles(), &mut after, h);
        let after = rms_fluid(&after, state.obstacles());

        assert!(before > 0.0);
        assert!(after < 0.7 * before, "step {step}: rms {before} -> {after}");
    }
}

/// More Jacobi iterations leave a smaller pressure residual for the same step.
#[test]
fn test_more_iterations_lower_residual() {
    let residual = |iterations: usize| {
        let mut config = config(12);
        config.params.jacobi_iterations = iterations;

        let mut scene = Scene::from_config(&config).unwrap();
        scene.step(0.25);
        scene.step(0.25);
        scene.pressure_residual()
    };

    let coarse = residual(10);
    let fine = residual(200);

    assert!(coarse > 0.0);
    assert!(fine < coarse, "{fine} >= {coarse}");
}

/// Smoke rising into an interior sphere flows around it without entering.
#[test]
fn test_sphere_stays_empty() {
    let mut config = config(16);
    config.sphere = Some(plume_fluids::SphereObstacle {
        center: Vec3::new(0.5, 0.5, 0.5),
        radius: 0.15,
    });

    let mut scene = Scene::from_config(&config).unwrap();
    for _ in 0..10 {
        scene.step(0.25);
    }

    let state = &scene.fluid;
    for ((i, j, k), kind) in state.obstacles().indexed_iter() {
        if kind.is_solid() {
            assert_eq!(state.velocity().get((i, j, k)), Vec3::ZERO);
            assert_eq!(state.density().get((i, j, k)), 0.0);
        }
    }

    assert!(state.obstacles().get((8, 8, 8)).is_solid());
}
