use bevy::{math::FloatOrd, prelude::*};

use crate::{
    Direction, GridConfig,
    wall::{WallFootprint, WallQuery},
};

/// Whether a [`GridMover`] is stepping across the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionState {
    /// No directional input is held.
    #[default]
    Idle,
    /// The mover steps one pixel per fixed tick.
    Moving,
    /// The last step would have come too close to a wall. The mover is held flush against it.
    Blocked,
}

/// The pixel-grid movement state of a single tank.
///
/// Input is applied with [`set_directional_input`](GridMover::set_directional_input), and the position is
/// advanced by at most one pixel per fixed tick with [`advance_one_tick`](GridMover::advance_one_tick).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct GridMover {
    pub(crate) position: Vec2,
    direction: Option<Direction>,
    facing: Direction,
    state: MotionState,
    obstruction: Option<WallFootprint>,
}

/// The thin rectangle swept ahead of a tank's leading edge to test for walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionProbe {
    rect: Rect,
    origin: Vec2,
    direction: Direction,
    half_extent: f32,
    margin: f32,
}

impl GridMover {
    /// Creates a new idle [`GridMover`] at the given position, facing up.
    pub fn new(position: Vec2) -> Self {
        GridMover {
            position,
            ..default()
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns the direction of travel, or [`None`] if idle.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Returns the direction of the most recent non-zero input.
    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }

    /// Returns the wall which caused the current [`MotionState::Blocked`] state.
    pub fn obstruction(&self) -> Option<WallFootprint> {
        self.obstruction
    }

    /// Applies a two-axis input vector, sampled once per control tick.
    ///
    /// Horizontal input takes precedence over vertical input. Holding the direction which is currently
    /// blocked keeps the mover blocked, any other direction starts it moving again.
    pub fn set_directional_input(&mut self, input: Vec2) {
        let Some(direction) = Direction::from_input(input) else {
            self.direction = None;
            self.state = MotionState::Idle;
            self.obstruction = None;
            return;
        };

        self.facing = direction;
        if self.state == MotionState::Blocked && self.direction == Some(direction) {
            return;
        }

        self.direction = Some(direction);
        self.state = MotionState::Moving;
        self.obstruction = None;
    }

    /// Advances the mover by one fixed simulation step, returning the committed position.
    ///
    /// The candidate position one pixel ahead is committed unless a wall reported by `walls` is closer
    /// than the safety margin, in which case the mover is aligned flush against that wall and becomes
    /// [`MotionState::Blocked`]. A blocked mover probes again each tick, and resumes moving once the
    /// wall is gone.
    pub fn advance_one_tick<W>(&mut self, config: &GridConfig, half_extent: Vec2, walls: &W) -> Vec2
    where
        W: WallQuery + ?Sized,
    {
        let current = config.snap(self.position);
        let Some(direction) = self.direction else {
            self.position = current;
            return self.position;
        };

        let candidate = config.snap(current + direction.as_vec2() * config.pixel_size());
        let probe = CollisionProbe::new(config, candidate, half_extent, direction);

        match probe.nearest_violation(walls) {
            None => {
                self.position = candidate;
                self.state = MotionState::Moving;
                self.obstruction = None;
            }
            Some(wall) => {
                self.position = probe.flush_position(config, current, &wall);
                self.state = MotionState::Blocked;
                self.obstruction = Some(wall);
            }
        }

        self.position
    }
}

impl CollisionProbe {
    /// Builds the probe for a tank centred at `position` moving in `direction`.
    ///
    /// The probe extends from the tank's leading edge by one pixel plus the safety margin, and spans the
    /// tank's full extent on the perpendicular axis.
    pub fn new(config: &GridConfig, position: Vec2, half_extent: Vec2, direction: Direction) -> Self {
        let margin = config.safety_margin();
        let sign = direction.sign();
        let leading = direction.axis(position) + sign * direction.axis(half_extent);
        let far = leading + sign * (config.pixel_size() + margin);

        let rect = if direction.is_horizontal() {
            Rect::new(
                leading,
                position.y - half_extent.y,
                far,
                position.y + half_extent.y,
            )
        } else {
            Rect::new(
                position.x - half_extent.x,
                leading,
                position.x + half_extent.x,
                far,
            )
        };

        CollisionProbe {
            rect,
            origin: position,
            direction,
            half_extent: direction.axis(half_extent),
            margin,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Returns the signed clearance between the probing tank and `wall` along the axis of travel.
    ///
    /// Negative values mean the tank is closer to the wall than the safety margin allows.
    pub fn edge_distance(&self, wall: &WallFootprint) -> f32 {
        let distance = (self.direction.axis(self.origin) - self.direction.axis(wall.center)).abs();
        distance - (self.half_extent + self.direction.axis(wall.half_extent) + self.margin)
    }

    // The nearest wall under the probe, if it violates the safety margin.
    fn nearest_violation<W>(&self, walls: &W) -> Option<WallFootprint>
    where
        W: WallQuery + ?Sized,
    {
        walls
            .walls_overlapping(self.rect)
            .into_iter()
            .map(|wall| (wall, self.edge_distance(&wall)))
            .min_by_key(|&(_, distance)| FloatOrd(distance))
            .filter(|&(_, distance)| distance < 0.0)
            .map(|(wall, _)| wall)
    }

    // Places the tank exactly one safety margin short of the near edge of `wall`.
    fn flush_position(&self, config: &GridConfig, current: Vec2, wall: &WallFootprint) -> Vec2 {
        let sign = self.direction.sign();
        let wall_edge = self.direction.axis(wall.center) - sign * self.direction.axis(wall.half_extent);
        let aligned = wall_edge - sign * (self.half_extent + self.margin);
        config.snap(self.direction.with_axis(current, aligned))
    }
}
