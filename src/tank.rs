use bevy::{
    ecs::system::{StaticSystemParam, SystemParam, SystemParamItem},
    log::{debug, trace},
    prelude::*,
};

use crate::{
    GridConfig,
    mover::{GridMover, MotionState},
    projectile::{Cannon, FireInput},
    wall::{WallFootprint, WallQuery},
};

/// Marker component for tanks driven across the pixel grid.
///
/// The [`Transform`] translation is the source of truth for the tank's position. It is copied into the
/// [`GridMover`] at the start of each fixed tick, so a game may place or teleport tanks freely.
#[derive(Component, Clone, Copy, Debug)]
#[require(Transform, DirectionalInput, GridMover, FireInput, Cannon)]
pub struct Tank {
    half_extent: Vec2,
}

/// The movement input of a [`Tank`], with each axis in the range `-1.0..=1.0`.
///
/// Written by the game's input handling before the fixed update.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionalInput(pub Vec2);

/// Written whenever the [`MotionState`] of a [`Tank`] changes.
#[derive(Clone, Copy, Debug, PartialEq, Message)]
pub struct MotionChanged {
    pub tank: Entity,
    pub old: MotionState,
    pub new: MotionState,
    /// The committed position of the tank after the change.
    pub position: Vec2,
    /// The wall which blocked the tank, if the new state is [`MotionState::Blocked`].
    pub obstruction: Option<WallFootprint>,
}

impl Tank {
    /// Creates a new [`Tank`] with the given hitbox half-size, in world units.
    pub fn new(half_extent: Vec2) -> Self {
        Tank { half_extent }
    }

    pub fn half_extent(&self) -> Vec2 {
        self.half_extent
    }
}

impl Default for Tank {
    /// A 14 pixel square hitbox on a 16 pixel per unit grid.
    fn default() -> Self {
        Tank::new(Vec2::splat(7.0 / 16.0))
    }
}

pub(crate) fn apply_input(
    mut tanks: Query<(Entity, &DirectionalInput, &mut GridMover, &mut Transform), With<Tank>>,
    mut writer: MessageWriter<MotionChanged>,
) {
    for (id, input, mut mover, mut transform) in &mut tanks {
        let old = mover.state();
        mover.position = transform.translation.xy();
        mover.set_directional_input(input.0);

        if let Some(direction) = mover.direction() {
            let rotation = direction.rotation();
            if transform.rotation != rotation {
                transform.rotation = rotation;
            }
        }

        if mover.state() != old {
            trace!(
                "tank {id} input {} -> {:?} {:?}",
                input.0,
                mover.direction(),
                mover.state()
            );

            writer.write(MotionChanged {
                tank: id,
                old,
                new: mover.state(),
                position: transform.translation.xy(),
                obstruction: None,
            });
        }
    }
}

pub(crate) fn advance<T>(
    config: Res<GridConfig>,
    walls: StaticSystemParam<T>,
    mut tanks: Query<(Entity, &Tank, &mut GridMover, &mut Transform)>,
    mut writer: MessageWriter<MotionChanged>,
) where
    T: SystemParam + 'static,
    for<'w, 's> SystemParamItem<'w, 's, T>: WallQuery,
{
    for (id, tank, mut mover, mut transform) in &mut tanks {
        if mover.direction().is_none() {
            continue;
        }

        let old = mover.state();
        let position = mover.advance_one_tick(&config, tank.half_extent(), &*walls);

        transform.translation.x = position.x;
        transform.translation.y = position.y;

        if mover.state() != old {
            if let Some(wall) = mover.obstruction() {
                debug!(
                    "tank {id} blocked at {position} moving {:?} by wall at {}",
                    mover.direction(),
                    wall.center
                );
            }

            writer.write(MotionChanged {
                tank: id,
                old,
                new: mover.state(),
                position,
                obstruction: mover.obstruction(),
            });
        }
    }
}
