use std::time::Duration;

use bevy::prelude::*;

const ALIGNMENT_EPSILON: f32 = 1e-3;

/// Geometry constants shared by every tank moving on the pixel grid.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    pixels_per_unit: f32,
    safety_margin: f32,
}

impl GridConfig {
    /// Creates a new [`GridConfig`] with the given number of pixels per world unit.
    ///
    /// The safety margin defaults to a single pixel.
    pub fn new(pixels_per_unit: f32) -> Self {
        GridConfig {
            pixels_per_unit,
            safety_margin: 1.0,
        }
    }

    /// Sets the clearance, in pixels, kept between a blocked tank and the wall in front of it.
    pub fn with_safety_margin(mut self, pixels: f32) -> Self {
        self.safety_margin = pixels;
        self
    }

    pub fn pixels_per_unit(&self) -> f32 {
        self.pixels_per_unit
    }

    /// Returns the size of a single pixel in world units.
    pub fn pixel_size(&self) -> f32 {
        self.pixels_per_unit.recip()
    }

    /// Returns the safety margin in world units.
    pub fn safety_margin(&self) -> f32 {
        self.safety_margin * self.pixel_size()
    }

    /// Returns the speed of a moving tank in world units per second, given the fixed timestep.
    ///
    /// Tanks move exactly one pixel per fixed tick.
    pub fn speed(&self, timestep: Duration) -> f32 {
        self.pixel_size() / timestep.as_secs_f32()
    }

    /// Rounds each axis of `position` to the nearest pixel.
    pub fn snap(&self, position: Vec2) -> Vec2 {
        (position * self.pixels_per_unit).round() / self.pixels_per_unit
    }

    /// Returns `true` if both axes of `position` lie on a pixel boundary.
    pub fn is_aligned(&self, position: Vec2) -> bool {
        let scaled = position * self.pixels_per_unit;
        (scaled - scaled.round()).abs().max_element() <= ALIGNMENT_EPSILON
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig::new(16.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn default_config() {
        let config = GridConfig::default();
        assert_relative_eq!(config.pixel_size(), 0.0625);
        assert_relative_eq!(config.safety_margin(), 0.0625);
    }

    #[test]
    fn safety_margin_in_world_units() {
        let config = GridConfig::new(8.0).with_safety_margin(2.0);
        assert_relative_eq!(config.safety_margin(), 0.25);
    }

    #[test]
    fn speed_is_one_pixel_per_tick() {
        let config = GridConfig::default();
        assert_relative_eq!(config.speed(Duration::from_micros(15625)), 4.0);
        assert_relative_eq!(GridConfig::new(8.0).speed(Duration::from_millis(250)), 0.5);
    }

    #[test]
    fn snap_rounds_to_nearest_pixel() {
        let config = GridConfig::default();
        assert_relative_eq!(config.snap(Vec2::new(1.03, -0.5)), Vec2::new(1.0, -0.5));
        assert_relative_eq!(config.snap(Vec2::new(0.04, 2.1)), Vec2::new(0.0625, 2.125));
    }

    #[test]
    fn snap_negative() {
        let config = GridConfig::default();
        assert_relative_eq!(config.snap(Vec2::new(-0.09, -3.95)), Vec2::new(-0.0625, -3.9375));
    }

    #[test]
    fn alignment() {
        let config = GridConfig::default();
        assert!(config.is_aligned(Vec2::new(4.0625, -0.5)));
        assert!(!config.is_aligned(Vec2::new(4.03, 0.0)));
        assert!(config.is_aligned(config.snap(Vec2::new(4.03, 7.77))));
    }
}
