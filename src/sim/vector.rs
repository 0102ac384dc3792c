use std::ops;

use serde::Serialize;

/// 2D vector in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians`.
    pub fn for_angle(radians: f64) -> Self {
        Self::new(radians.cos(), radians.sin())
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Shorten to at most `max` length, keeping direction.
    pub fn clamp(self, max: f64) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            self.scale(max / len)
        } else {
            self
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl ops::Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl ops::AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_short_vectors() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.clamp(10.0), v);
        assert_eq!(Vec2::ZERO.clamp(1.0), Vec2::ZERO);
    }

    #[test]
    fn clamp_shortens_long_vectors() {
        let v = Vec2::new(300.0, 400.0).clamp(300.0);
        assert!((v.length() - 300.0).abs() < 1e-9);
        assert!((v.x - 180.0).abs() < 1e-9);
        assert!((v.y - 240.0).abs() < 1e-9);
    }

    #[test]
    fn for_angle_is_unit() {
        let v = Vec2::for_angle(std::f64::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn add_assign_accumulates() {
        let mut v = Vec2::new(1.0, 2.0);
        v += Vec2::new(-3.0, 0.5);
        assert_eq!(v, Vec2::new(-2.0, 2.5));
    }
}
