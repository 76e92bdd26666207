//! The brush entity: position, direction, and the retained trail
//!
//! A brush advances by its direction vector each frame and remembers where it
//! has been so a renderer can draw the trail. All history lives client-side;
//! the relay never stores positions.

use shared::{FIELD_HEIGHT, FIELD_WIDTH, HALT_THRESHOLD, MAX_BRUSH_SPEED, TRAIL_CAP};
use std::collections::VecDeque;

/// A vector in 2D space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns the vector scaled down to `max` magnitude if it exceeds it.
    pub fn limit(&self, max: f32) -> Vec2 {
        let mag = self.magnitude();
        if mag > max {
            Vec2 {
                x: self.x / mag * max,
                y: self.y / mag * max,
            }
        } else {
            *self
        }
    }

    /// The angle of the vector in radians, for icon rotation.
    pub fn heading(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// One avatar: where it is, where it is going, and where it has been.
#[derive(Debug, Clone)]
pub struct Brush {
    pub pos: Vec2,
    pub direction: Vec2,
    pub color: String,
    trail: VecDeque<Vec2>,
}

impl Brush {
    pub fn new(x: f32, y: f32, color: impl Into<String>) -> Self {
        Brush {
            pos: Vec2::new(x, y),
            direction: Vec2::default(),
            color: color.into(),
            trail: VecDeque::new(),
        }
    }

    /// Replaces the direction, limited to the maximum brush speed.
    /// Non-finite components degrade to 0.0 since update payloads are not
    /// validated anywhere upstream.
    pub fn set_direction(&mut self, x: f32, y: f32) {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        self.direction = Vec2::new(x, y).limit(MAX_BRUSH_SPEED);
    }

    /// Stops the brush in place. The trail stays.
    pub fn halt(&mut self) {
        self.direction = Vec2::default();
    }

    /// Advances one frame: remembers the current position, moves by the
    /// direction vector, and clamps to the field. A brush moving slower than
    /// the halt threshold stays put.
    pub fn step(&mut self) {
        if self.direction.magnitude() < HALT_THRESHOLD {
            return;
        }

        self.trail.push_back(self.pos);
        if self.trail.len() > TRAIL_CAP {
            self.trail.pop_front();
        }

        self.pos.x = (self.pos.x + self.direction.x).clamp(0.0, FIELD_WIDTH);
        self.pos.y = (self.pos.y + self.direction.y).clamp(0.0, FIELD_HEIGHT);
    }

    /// The retained position history, oldest first.
    pub fn trail(&self) -> &VecDeque<Vec2> {
        &self.trail
    }

    /// The direction the brush icon should face.
    pub fn heading(&self) -> f32 {
        self.direction.heading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_limit_caps_magnitude() {
        let capped = Vec2::new(30.0, 40.0).limit(MAX_BRUSH_SPEED);
        assert_approx_eq!(capped.magnitude(), MAX_BRUSH_SPEED, 0.001);
        // Direction is preserved.
        assert_approx_eq!(capped.y / capped.x, 40.0 / 30.0, 0.001);
    }

    #[test]
    fn test_limit_leaves_short_vectors_alone() {
        let v = Vec2::new(3.0, 4.0).limit(MAX_BRUSH_SPEED);
        assert_eq!(v, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_heading() {
        assert_approx_eq!(Vec2::new(1.0, 0.0).heading(), 0.0, 0.001);
        assert_approx_eq!(
            Vec2::new(0.0, 1.0).heading(),
            std::f32::consts::FRAC_PI_2,
            0.001
        );

        let mut brush = Brush::new(0.0, 0.0, "#FF0000");
        brush.set_direction(0.0, 7.0);
        assert_approx_eq!(brush.heading(), std::f32::consts::FRAC_PI_2, 0.001);
    }

    #[test]
    fn test_step_advances_and_records_trail() {
        let mut brush = Brush::new(100.0, 200.0, "#FF0000");
        brush.set_direction(5.0, 0.0);
        brush.step();

        assert_approx_eq!(brush.pos.x, 105.0, 0.001);
        assert_approx_eq!(brush.pos.y, 200.0, 0.001);
        assert_eq!(brush.trail().len(), 1);
        assert_eq!(brush.trail()[0], Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_slow_brush_stays_put() {
        let mut brush = Brush::new(100.0, 100.0, "#FF0000");
        brush.set_direction(1.0, 1.0); // magnitude below HALT_THRESHOLD
        brush.step();

        assert_eq!(brush.pos, Vec2::new(100.0, 100.0));
        assert!(brush.trail().is_empty());
    }

    #[test]
    fn test_halt_stops_but_keeps_trail() {
        let mut brush = Brush::new(0.0, 0.0, "#FF0000");
        brush.set_direction(10.0, 0.0);
        brush.step();
        brush.step();
        assert_eq!(brush.trail().len(), 2);

        brush.halt();
        let pos = brush.pos;
        brush.step();

        assert_eq!(brush.pos, pos);
        assert_eq!(brush.trail().len(), 2);
    }

    #[test]
    fn test_trail_is_capped() {
        let mut brush = Brush::new(0.0, 0.0, "#FF0000");
        for i in 0..(TRAIL_CAP + 50) {
            // Flip direction at the field edge to keep moving.
            if i % 2 == 0 {
                brush.set_direction(10.0, 0.0);
            } else {
                brush.set_direction(-10.0, 0.0);
            }
            brush.step();
        }
        assert_eq!(brush.trail().len(), TRAIL_CAP);
    }

    #[test]
    fn test_position_clamps_to_field() {
        let mut brush = Brush::new(FIELD_WIDTH - 1.0, FIELD_HEIGHT - 1.0, "#FF0000");
        brush.set_direction(10.0, 10.0);
        for _ in 0..5 {
            brush.step();
        }
        assert_eq!(brush.pos, Vec2::new(FIELD_WIDTH, FIELD_HEIGHT));

        let mut brush = Brush::new(1.0, 1.0, "#FF0000");
        brush.set_direction(-10.0, -10.0);
        for _ in 0..5 {
            brush.step();
        }
        assert_eq!(brush.pos, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_direction_tolerates_non_finite_input() {
        let mut brush = Brush::new(50.0, 50.0, "#FF0000");
        brush.set_direction(f32::NAN, f32::INFINITY);
        brush.step();

        assert_eq!(brush.pos, Vec2::new(50.0, 50.0));
        assert_eq!(brush.direction, Vec2::default());
    }

    #[test]
    fn test_speed_is_limited() {
        let mut brush = Brush::new(0.0, 0.0, "#FF0000");
        brush.set_direction(1000.0, 0.0);
        assert_approx_eq!(brush.direction.magnitude(), MAX_BRUSH_SPEED, 0.001);
    }
}
