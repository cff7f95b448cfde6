//! Plain data types shared by the match-visualization crates.
//!
//! Everything here is produced upstream (detector, descriptor extractor,
//! matcher) and consumed read-only by the renderer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 2D point in image pixel space, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const ZERO: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise translation
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::ops::Add for Point2 {
    type Output = Point2;

    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Detected salient image location: subpixel position plus scale.
///
/// `sigma` is already in image pixel units and doubles as the marker radius
/// when rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub position: Point2,
    pub sigma: f32,
    /// Detector-assigned orientation, if any (radians)
    pub orientation: Option<f32>,
}

impl Keypoint {
    pub fn new(position: Point2, sigma: f32) -> Self {
        Self {
            position,
            sigma,
            orientation: None,
        }
    }
}

/// Keypoint plus its dominant orientation angle `theta` (radians), as used
/// for matching
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Descriptor {
    pub keypoint: Keypoint,
    pub theta: f32,
}

/// One accepted match between descriptors from two images
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correspondence {
    pub source: Descriptor,
    pub target: Descriptor,
}

/// Straight-alpha RGBA color, channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB components
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same color with the alpha component replaced
    pub const fn with_alpha(self, a: f32) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_offset() {
        let p = Point2::new(3.0, 4.0).offset(1.0, -2.0);
        assert_eq!(p, Point2::new(4.0, 2.0));
        assert_eq!(Point2::ZERO + p, p);
    }

    #[test]
    fn test_color_with_alpha() {
        let c = Color::RED.with_alpha(0.5);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.a, 0.5);
        // alpha replacement must not touch the color channels
        assert_eq!(c.with_alpha(1.0), Color::RED);
    }

    #[test]
    fn test_keypoint_constructor_has_no_orientation() {
        let kp = Keypoint::new(Point2::new(10.0, 20.0), 2.5);
        assert_eq!(kp.sigma, 2.5);
        assert!(kp.orientation.is_none());
    }
}
