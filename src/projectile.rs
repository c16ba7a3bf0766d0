use std::time::Duration;

use bevy::{
    ecs::system::{StaticSystemParam, SystemParam, SystemParamItem},
    log::{debug, trace},
    math::FloatOrd,
    prelude::*,
};

use crate::{
    Direction, Tank,
    mover::GridMover,
    wall::{WallFootprint, WallQuery},
};

/// Whether the fire action of a [`Tank`] is held.
///
/// Written by the game's input handling before the fixed update. While held, the tank's [`Cannon`]
/// fires whenever it has reloaded.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FireInput(pub bool);

/// The properties of the projectiles fired by a [`Cannon`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shell {
    /// Speed in world units per second.
    pub speed: f32,
    pub lifetime: Duration,
    /// Damage reported with each [`ProjectileHit`]. Applying it is up to the game.
    pub damage: u32,
    pub half_extent: Vec2,
}

/// The weapon of a [`Tank`], firing along the tank's facing direction at a limited rate.
#[derive(Component, Clone, Debug)]
pub struct Cannon {
    reload: Timer,
    shell: Shell,
}

/// A shell in flight. Moves in a straight line until it hits a wall or its lifetime runs out.
#[derive(Component, Clone, Debug)]
#[require(Transform)]
pub struct Projectile {
    shooter: Entity,
    direction: Direction,
    speed: f32,
    damage: u32,
    half_extent: Vec2,
    lifetime: Timer,
}

/// The outcome of advancing a [`Projectile`] by one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProjectileStep {
    /// The projectile is still in flight at the given position.
    Flying(Vec2),
    /// The projectile struck `wall` with its leading edge, and should be removed.
    Hit { wall: WallFootprint, position: Vec2 },
    /// The lifetime of the projectile ran out at the given position, and it should be removed.
    Expired(Vec2),
}

/// Written when a [`Tank`] fires its [`Cannon`].
#[derive(Clone, Copy, Debug, PartialEq, Message)]
pub struct TankFired {
    pub tank: Entity,
    pub projectile: Entity,
    /// The spawn position of the projectile.
    pub position: Vec2,
    pub direction: Direction,
}

/// Written when a [`Projectile`] hits a wall. The projectile is despawned.
#[derive(Clone, Copy, Debug, PartialEq, Message)]
pub struct ProjectileHit {
    pub projectile: Entity,
    pub shooter: Entity,
    pub wall: WallFootprint,
    pub position: Vec2,
    pub damage: u32,
}

impl Default for Shell {
    fn default() -> Self {
        Shell {
            speed: 10.0,
            lifetime: Duration::from_secs(3),
            damage: 1,
            half_extent: Vec2::splat(1.0 / 16.0),
        }
    }
}

impl Cannon {
    /// Creates a new loaded [`Cannon`] which can fire at most once every `fire_rate`.
    pub fn new(fire_rate: Duration) -> Self {
        let mut reload = Timer::new(fire_rate, TimerMode::Once);
        reload.finish();
        Cannon {
            reload,
            shell: Shell::default(),
        }
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    pub fn fire_rate(&self) -> Duration {
        self.reload.duration()
    }

    pub fn shell(&self) -> Shell {
        self.shell
    }

    pub fn is_ready(&self) -> bool {
        self.reload.is_finished()
    }

    /// Advances the reload timer.
    pub fn tick(&mut self, delta: Duration) {
        self.reload.tick(delta);
    }

    /// Starts reloading and returns `true` if the cannon is ready, otherwise returns `false`.
    pub fn try_fire(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }

        self.reload.reset();
        true
    }

    /// Returns the spawn position of a shell fired by a tank centred at `position`, just beyond its
    /// leading edge.
    pub fn muzzle(&self, position: Vec2, half_extent: Vec2, direction: Direction) -> Vec2 {
        let offset = direction.axis(half_extent) + direction.axis(self.shell.half_extent);
        position + direction.as_vec2() * offset
    }
}

impl Default for Cannon {
    fn default() -> Self {
        Cannon::new(Duration::from_millis(500))
    }
}

impl Projectile {
    pub fn new(shooter: Entity, direction: Direction, shell: &Shell) -> Self {
        Projectile {
            shooter,
            direction,
            speed: shell.speed,
            damage: shell.damage,
            half_extent: shell.half_extent,
            lifetime: Timer::new(shell.lifetime, TimerMode::Once),
        }
    }

    pub fn shooter(&self) -> Entity {
        self.shooter
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn velocity(&self) -> Vec2 {
        self.direction.as_vec2() * self.speed
    }

    pub fn damage(&self) -> u32 {
        self.damage
    }

    pub fn half_extent(&self) -> Vec2 {
        self.half_extent
    }

    /// Returns the remaining lifetime of the projectile.
    pub fn remaining(&self) -> Duration {
        self.lifetime.remaining()
    }

    /// Advances a projectile centred at `position` by `delta`.
    ///
    /// The area swept by the projectile is tested against `walls`, and the first wall along the path
    /// stops it. A projectile which already overlaps a wall hits it without moving.
    pub fn advance<W>(&mut self, position: Vec2, delta: Duration, walls: &W) -> ProjectileStep
    where
        W: WallQuery + ?Sized,
    {
        let distance = self.speed * delta.as_secs_f32();
        let step = self.direction.as_vec2();

        if let Some((wall, t)) = self.first_hit(position, distance, walls) {
            return ProjectileStep::Hit {
                wall,
                position: position + step * t,
            };
        }

        let position = position + step * distance;
        self.lifetime.tick(delta);
        if self.lifetime.is_finished() {
            ProjectileStep::Expired(position)
        } else {
            ProjectileStep::Flying(position)
        }
    }

    /// Returns the area covered by the projectile while travelling `distance` from `position`.
    pub fn sweep(&self, position: Vec2, distance: f32) -> Rect {
        let start = Rect::from_center_half_size(position, self.half_extent);
        let end = Rect::from_center_half_size(
            position + self.direction.as_vec2() * distance,
            self.half_extent,
        );
        start.union(end)
    }

    // The nearest wall along the path, and the distance travelled before reaching it.
    fn first_hit<W>(&self, position: Vec2, distance: f32, walls: &W) -> Option<(WallFootprint, f32)>
    where
        W: WallQuery + ?Sized,
    {
        let sign = self.direction.sign();
        let leading = self.direction.axis(position) + sign * self.direction.axis(self.half_extent);

        walls
            .walls_overlapping(self.sweep(position, distance))
            .into_iter()
            .map(|wall| {
                let near =
                    self.direction.axis(wall.center) - sign * self.direction.axis(wall.half_extent);
                (wall, (sign * (near - leading)).max(0.0))
            })
            .min_by_key(|&(_, t)| FloatOrd(t))
    }
}

pub(crate) fn fire(
    time: Res<Time>,
    mut commands: Commands,
    mut tanks: Query<(
        Entity,
        &Tank,
        &GridMover,
        &Transform,
        &FireInput,
        &mut Cannon,
    )>,
    mut writer: MessageWriter<TankFired>,
) {
    for (id, tank, mover, transform, input, mut cannon) in &mut tanks {
        cannon.tick(time.delta());
        if !input.0 || !cannon.try_fire() {
            continue;
        }

        let direction = mover.facing();
        let position = cannon.muzzle(transform.translation.xy(), tank.half_extent(), direction);
        let projectile = commands
            .spawn((
                Projectile::new(id, direction, &cannon.shell()),
                Transform::from_translation(position.extend(transform.translation.z))
                    .with_rotation(direction.rotation()),
            ))
            .id();

        trace!("tank {id} fired {projectile} {direction:?} from {position}");

        writer.write(TankFired {
            tank: id,
            projectile,
            position,
            direction,
        });
    }
}

pub(crate) fn advance_projectiles<T>(
    time: Res<Time>,
    walls: StaticSystemParam<T>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    mut writer: MessageWriter<ProjectileHit>,
) where
    T: SystemParam + 'static,
    for<'w, 's> SystemParamItem<'w, 's, T>: WallQuery,
{
    for (id, mut projectile, mut transform) in &mut projectiles {
        let position = transform.translation.xy();
        let position = match projectile.advance(position, time.delta(), &*walls) {
            ProjectileStep::Flying(position) => position,
            ProjectileStep::Hit { wall, position } => {
                debug!(
                    "projectile {id} hit {:?} wall at {} from {position}",
                    wall.kind, wall.center
                );

                writer.write(ProjectileHit {
                    projectile: id,
                    shooter: projectile.shooter(),
                    wall,
                    position,
                    damage: projectile.damage(),
                });
                commands.entity(id).despawn();
                position
            }
            ProjectileStep::Expired(position) => {
                trace!("projectile {id} expired at {position}");
                commands.entity(id).despawn();
                position
            }
        };

        transform.translation.x = position.x;
        transform.translation.y = position.y;
    }
}
