//! Pixel-grid movement and wall collision for top-down tank games built on Bevy.
//!
//! Tanks step exactly one pixel per fixed tick along a single cardinal axis. Before each step, a thin
//! probe ahead of the tank is tested against the walls reported by a [`WallQuery`]. If the step would
//! bring the tank closer to a wall than the configured safety margin, the tank is instead aligned flush
//! against the wall and stops.
//!
//! Tanks also carry a [`Cannon`], which fires [`Projectile`]s along the facing direction while
//! [`FireInput`] is held. Projectiles fly until they hit a wall reported by the same [`WallQuery`], and
//! each hit is reported as a [`ProjectileHit`] message.

#[cfg(feature = "diagnostic")]
pub mod diagnostic;

mod direction;
mod grid;
mod mover;
mod projectile;
mod tank;
mod wall;

use std::marker::PhantomData;

use bevy::{
    ecs::{
        intern::Interned,
        schedule::ScheduleLabel,
        system::{SystemParam, SystemParamItem},
    },
    prelude::*,
};

use crate::wall::WallChanged;

pub use self::{
    direction::Direction,
    grid::GridConfig,
    mover::{CollisionProbe, GridMover, MotionState},
    projectile::{Cannon, FireInput, Projectile, ProjectileHit, ProjectileStep, Shell, TankFired},
    tank::{DirectionalInput, MotionChanged, Tank},
    wall::{Wall, WallFootprint, WallIndex, WallKind, WallQuery, Walls},
};

/// Plugin for adding [`treadgrid`](crate) functionality to an app.
///
/// Walls are looked up through the system param `T`, whose item must implement [`WallQuery`]. By default
/// this is the [`WallIndex`] maintained from [`Wall`] entities.
#[derive(Debug)]
pub struct TreadGridPlugin<T = Res<'static, WallIndex>> {
    schedule: Interned<dyn ScheduleLabel>,
    config: GridConfig,
    marker: PhantomData<fn() -> T>,
}

/// The [`SystemSet`] containing [`treadgrid`](crate) systems.
#[derive(Debug, Hash, PartialEq, Eq, Clone, SystemSet)]
pub struct TreadGridSystems;

macro_rules! measure {
    ($path:expr, $system:path) => {{
        #[cfg(feature = "diagnostic")]
        {
            crate::diagnostic::measure($path, $system)
        }

        #[cfg(not(feature = "diagnostic"))]
        {
            $system
        }
    }};
}

impl<T> TreadGridPlugin<T> {
    /// Creates a new [`TreadGridPlugin`] plugin using the given schedule.
    ///
    /// The schedule should run once per fixed simulation step, after the game has written each tank's
    /// [`DirectionalInput`] and [`FireInput`]. Reload timers and projectiles advance by the [`Time`]
    /// delta of the schedule.
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
            config: GridConfig::default(),
            marker: PhantomData,
        }
    }

    /// Sets the grid geometry used by all tanks.
    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }
}

impl<T> Plugin for TreadGridPlugin<T>
where
    T: SystemParam + 'static,
    for<'w, 's> SystemParamItem<'w, 's, T>: WallQuery,
{
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config)
            .init_resource::<Time>()
            .init_resource::<WallIndex>()
            .add_message::<WallChanged>()
            .add_message::<MotionChanged>()
            .add_message::<TankFired>()
            .add_message::<ProjectileHit>();

        app.add_systems(
            self.schedule,
            (
                measure!(diagnostic::APPLY_INPUT, tank::apply_input),
                measure!(diagnostic::UPDATE_WALL_INDEX, wall::update_index),
                measure!(diagnostic::ADVANCE_TANKS, tank::advance::<T>),
                measure!(
                    diagnostic::ADVANCE_PROJECTILES,
                    projectile::advance_projectiles::<T>
                ),
                measure!(diagnostic::FIRE_CANNONS, projectile::fire),
            )
                .chain_ignore_deferred()
                .in_set(TreadGridSystems),
        );

        #[cfg(feature = "diagnostic")]
        diagnostic::register(app);
    }
}

impl<T> Default for TreadGridPlugin<T> {
    fn default() -> Self {
        TreadGridPlugin::new(FixedPostUpdate)
    }
}
