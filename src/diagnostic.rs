//! Diagnostic paths reporting the time spent in each [`treadgrid`](crate) system, in milliseconds.

use std::time::Instant;

use bevy::{
    diagnostic::{Diagnostic, DiagnosticPath, Diagnostics, RegisterDiagnostic},
    prelude::*,
};

/// Time spent applying [`DirectionalInput`](crate::DirectionalInput) to tanks.
pub const APPLY_INPUT: DiagnosticPath = DiagnosticPath::const_new("treadgrid/apply_input");
/// Time spent applying wall changes to the [`WallIndex`](crate::WallIndex).
pub const UPDATE_WALL_INDEX: DiagnosticPath =
    DiagnosticPath::const_new("treadgrid/update_wall_index");
/// Time spent stepping tanks and resolving wall collisions.
pub const ADVANCE_TANKS: DiagnosticPath = DiagnosticPath::const_new("treadgrid/advance_tanks");
/// Time spent moving projectiles and resolving their wall hits.
pub const ADVANCE_PROJECTILES: DiagnosticPath =
    DiagnosticPath::const_new("treadgrid/advance_projectiles");
/// Time spent reloading cannons and spawning projectiles.
pub const FIRE_CANNONS: DiagnosticPath = DiagnosticPath::const_new("treadgrid/fire_cannons");

pub(crate) fn register(app: &mut App) {
    for path in [
        APPLY_INPUT,
        UPDATE_WALL_INDEX,
        ADVANCE_TANKS,
        ADVANCE_PROJECTILES,
        FIRE_CANNONS,
    ] {
        app.register_diagnostic(
            Diagnostic::new(path)
                .with_suffix("ms")
                .with_max_history_length(32)
                .with_smoothing_factor(0.06),
        );
    }
}

pub(crate) fn measure<S, M>(
    path: DiagnosticPath,
    mut system: S,
) -> impl System<In = (), Out = S::Out>
where
    S: SystemParamFunction<M, In = ()>,
    S::Out: 'static,
    S::Param: 'static,
{
    IntoSystem::into_system(move |mut params: ParamSet<(S::Param, Diagnostics)>| {
        let start = Instant::now();
        let result = system.run((), params.p0());
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        params.p1().add_measurement(&path, || elapsed_ms);

        result
    })
    .with_name(DebugName::type_name::<S>())
}
