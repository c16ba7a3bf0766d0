use std::time::Duration;

use bevy::{
    diagnostic::{DiagnosticPath, DiagnosticsStore},
    prelude::*,
    time::{TimePlugin, TimeUpdateStrategy},
};
use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use treadgrid::{
    DirectionalInput, FireInput, Tank, TreadGridPlugin, Wall, WallFootprint, WallIndex, WallKind,
};

criterion_group!(
    benches,
    apply_input,
    update_wall_index,
    advance_tanks,
    advance_projectiles,
    fire_cannons
);
criterion_main!(benches);

const ARENA_SIZE: i32 = 100;

pub fn apply_input(c: &mut Criterion) {
    bench_diagnostic(c, &treadgrid::diagnostic::APPLY_INPUT);
}

pub fn update_wall_index(c: &mut Criterion) {
    bench_diagnostic(c, &treadgrid::diagnostic::UPDATE_WALL_INDEX);
}

pub fn advance_tanks(c: &mut Criterion) {
    bench_diagnostic(c, &treadgrid::diagnostic::ADVANCE_TANKS);
}

pub fn advance_projectiles(c: &mut Criterion) {
    bench_diagnostic(c, &treadgrid::diagnostic::ADVANCE_PROJECTILES);
}

pub fn fire_cannons(c: &mut Criterion) {
    bench_diagnostic(c, &treadgrid::diagnostic::FIRE_CANNONS);
}

fn bench_diagnostic(c: &mut Criterion, path: &DiagnosticPath) {
    c.bench_function(path.as_str(), |b| {
        b.iter_custom(|iters| {
            let mut app = make_app();

            let mut elapsed = Duration::ZERO;
            for _ in 0..iters {
                app.update();
                elapsed += get_diagnostic(&mut app, path);
            }

            elapsed
        });
    });
}

fn make_app() -> App {
    let mut app = App::new();
    app.add_plugins((
        TransformPlugin,
        TimePlugin,
        TreadGridPlugin::<Res<'static, WallIndex>>::default(),
    ));
    app.finish();
    app.cleanup();

    let timestep = Duration::from_micros(15625);
    app.insert_resource(Time::<Fixed>::from_duration(timestep));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(timestep));

    app.add_systems(Startup, startup);
    app.add_systems(FixedUpdate, steer);

    // Startup
    app.update();

    // Warmup
    app.update();

    app
}

fn startup(mut commands: Commands) {
    let mut rng = SmallRng::seed_from_u64(0);

    let walls: Vec<_> = (0..2000)
        .map(|_| {
            let kind = if rng.random_bool(0.25) {
                WallKind::Metal
            } else {
                WallKind::Brick
            };
            Wall::from(WallFootprint::from_cell(
                IVec2::new(
                    rng.random_range(-ARENA_SIZE..ARENA_SIZE),
                    rng.random_range(-ARENA_SIZE..ARENA_SIZE),
                ),
                1.0,
            ))
            .with_kind(kind)
        })
        .collect();
    commands.spawn_batch(walls);

    let tanks: Vec<_> = (0..1000)
        .map(|_| {
            (
                Tank::default(),
                Transform::from_xyz(
                    rng.random_range(-ARENA_SIZE..ARENA_SIZE) as f32 + 0.5,
                    rng.random_range(-ARENA_SIZE..ARENA_SIZE) as f32 + 0.5,
                    0.,
                ),
                random_input(&mut rng),
                FireInput(rng.random_bool(0.5)),
            )
        })
        .collect();
    commands.spawn_batch(tanks);
}

fn steer(
    mut tanks: Query<(&mut DirectionalInput, &mut FireInput)>,
    mut rng: Local<Option<SmallRng>>,
) {
    let rng = rng.get_or_insert_with(|| SmallRng::seed_from_u64(1));
    for (mut input, mut fire) in &mut tanks {
        if rng.random_bool(0.01) {
            *input = random_input(rng);
        }
        if rng.random_bool(0.05) {
            fire.0 = !fire.0;
        }
    }
}

fn random_input(rng: &mut SmallRng) -> DirectionalInput {
    DirectionalInput(Vec2::new(
        rng.random_range(-1..=1) as f32,
        rng.random_range(-1..=1) as f32,
    ))
}

fn get_diagnostic(app: &mut App, path: &DiagnosticPath) -> Duration {
    let mut store = app.world_mut().resource_mut::<DiagnosticsStore>();
    let diagnostic = store.get_mut(path).unwrap();
    let value = diagnostic.measurement().unwrap().value;
    diagnostic.clear_history();
    Duration::from_secs_f64(value / 1000.)
}
