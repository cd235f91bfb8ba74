//! Domain-to-canvas coordinate transforms
//!
//! Court coordinates are feet with the origin at center court, x running
//! baseline to baseline and y sideline to sideline (positive y is "up").
//! Canvas coordinates are pixels with y pointing down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canvas padding around the court (pixels)
pub const COURT_PADDING: f32 = 40.0;
/// Full court length and width (feet)
pub const COURT_LENGTH: f32 = 94.0;
pub const COURT_WIDTH: f32 = 50.0;
/// Center court to basket (feet)
pub const BASKET_X: f32 = 41.75;
/// Half court shifts its visible center this far toward the basket (feet)
const HALF_COURT_SHIFT: f32 = 23.5;

/// Linear domain-to-canvas mapping: `canvas = origin + domain * scale` (y optionally flipped)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub scale: f32,
    pub origin: Vec2,
    pub flip_y: bool,
}

impl Transform2D {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        origin: Vec2::ZERO,
        flip_y: false,
    };

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        let y = if self.flip_y { -p.y } else { p.y };
        self.origin + Vec2::new(p.x, y) * self.scale
    }

    /// Inverse mapping; a zero scale maps everything to the origin
    pub fn invert(&self, canvas: Vec2) -> Vec2 {
        if self.scale == 0.0 {
            return Vec2::ZERO;
        }
        let d = (canvas - self.origin) / self.scale;
        if self.flip_y { Vec2::new(d.x, -d.y) } else { d }
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtVariant {
    #[default]
    Full,
    Half,
}

/// Court descriptor attached to compiled sport scenes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtTransform {
    #[serde(default = "default_sport")]
    pub sport: String,
    #[serde(default)]
    pub variant: CourtVariant,
}

fn default_sport() -> String {
    "basketball".to_string()
}

impl CourtTransform {
    pub fn new(variant: CourtVariant) -> Self {
        Self {
            sport: default_sport(),
            variant,
        }
    }

    /// Pixels per foot so the visible court fits the padded canvas
    pub fn scale(&self, canvas_w: f32, canvas_h: f32) -> f32 {
        let court_len = match self.variant {
            CourtVariant::Full => COURT_LENGTH,
            CourtVariant::Half => COURT_LENGTH / 2.0,
        };
        ((canvas_w - COURT_PADDING) / court_len).min((canvas_h - COURT_PADDING) / COURT_WIDTH)
    }

    /// The equivalent linear transform for a canvas size
    pub fn to_transform(&self, canvas_w: f32, canvas_h: f32) -> Transform2D {
        let scale = self.scale(canvas_w, canvas_h);
        let origin_x = match self.variant {
            CourtVariant::Full => canvas_w / 2.0,
            CourtVariant::Half => canvas_w / 2.0 - HALF_COURT_SHIFT * scale,
        };
        Transform2D {
            scale,
            origin: Vec2::new(origin_x, canvas_h / 2.0),
            flip_y: true,
        }
    }

    /// Convert court feet to canvas pixels
    pub fn world_to_canvas(&self, world: Vec2, canvas_w: f32, canvas_h: f32) -> Vec2 {
        self.to_transform(canvas_w, canvas_h).apply(world)
    }
}

/// Which basket a shot was taken at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtSide {
    #[default]
    Right,
    Left,
}

/// Convert NBA Stats shot location (tenths of feet from the basket) to court feet
pub fn transform_nba_stats_shot(loc_x: f32, loc_y: f32, side: CourtSide) -> Vec2 {
    let world = Vec2::new(BASKET_X - loc_y / 10.0, loc_x / 10.0);
    match side {
        CourtSide::Right => world,
        CourtSide::Left => -world,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_court_center_maps_to_canvas_center() {
        let court = CourtTransform::new(CourtVariant::Full);
        let p = court.world_to_canvas(Vec2::ZERO, 980.0, 540.0);
        assert_eq!(p, Vec2::new(490.0, 270.0));
    }

    #[test]
    fn test_full_court_scale_and_flip() {
        let court = CourtTransform::new(CourtVariant::Full);
        // (980-40)/94 = 10, (540-40)/50 = 10
        assert!((court.scale(980.0, 540.0) - 10.0).abs() < 1e-5);
        let p = court.world_to_canvas(Vec2::new(10.0, 5.0), 980.0, 540.0);
        assert!((p.x - 590.0).abs() < 1e-3);
        assert!((p.y - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_half_court_origin_shift() {
        let court = CourtTransform::new(CourtVariant::Half);
        // (510-40)/47 = 10, (540-40)/50 = 10
        let p = court.world_to_canvas(Vec2::new(23.5, 0.0), 510.0, 540.0);
        assert!((p.x - 255.0).abs() < 1e-3);
        assert!((p.y - 270.0).abs() < 1e-3);
    }

    #[test]
    fn test_transform_round_trip() {
        let t = CourtTransform::new(CourtVariant::Full).to_transform(800.0, 600.0);
        let world = Vec2::new(-12.5, 7.25);
        let back = t.invert(t.apply(world));
        assert!((back - world).length() < 1e-4);
        assert_eq!(Transform2D::IDENTITY.apply(world), world);
    }

    #[test]
    fn test_nba_stats_shot() {
        let right = transform_nba_stats_shot(-50.0, 100.0, CourtSide::Right);
        assert!((right.x - 31.75).abs() < 1e-5);
        assert!((right.y + 5.0).abs() < 1e-5);
        let left = transform_nba_stats_shot(-50.0, 100.0, CourtSide::Left);
        assert_eq!(left, -right);
    }
}
