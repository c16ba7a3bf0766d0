use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

/// One of the four cardinal directions a tank can face and move in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Resolves a two-axis input vector to a single direction of travel.
    ///
    /// Horizontal input takes precedence, so a diagonal input never produces diagonal motion.
    /// Returns [`None`] if both axes are zero.
    pub fn from_input(input: Vec2) -> Option<Self> {
        if input.x != 0.0 {
            Some(if input.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            })
        } else if input.y != 0.0 {
            Some(if input.y > 0.0 {
                Direction::Up
            } else {
                Direction::Down
            })
        } else {
            None
        }
    }

    /// Returns the unit vector pointing in this direction.
    pub fn as_vec2(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::Y,
            Direction::Right => Vec2::X,
            Direction::Down => Vec2::NEG_Y,
            Direction::Left => Vec2::NEG_X,
        }
    }

    /// Returns the clockwise quarter-turn index of this direction, starting from [`Direction::Up`].
    pub fn index(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// Returns the rotation of an entity facing this direction, where the identity faces up.
    pub fn rotation(self) -> Quat {
        Quat::from_rotation_z(-f32::from(self.index()) * FRAC_PI_2)
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }

    pub(crate) fn sign(self) -> f32 {
        match self {
            Direction::Up | Direction::Right => 1.0,
            Direction::Down | Direction::Left => -1.0,
        }
    }

    // The component of `v` along the axis of travel.
    pub(crate) fn axis(self, v: Vec2) -> f32 {
        if self.is_horizontal() { v.x } else { v.y }
    }

    pub(crate) fn with_axis(self, v: Vec2, value: f32) -> Vec2 {
        if self.is_horizontal() {
            Vec2::new(value, v.y)
        } else {
            Vec2::new(v.x, value)
        }
    }
}
