//! Axis-aligned bounding boxes for scene extents.

use glam::DVec3;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl BoundingBox {
    /// Box spanning `min` to `max`.
    #[must_use]
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self::new(first, first), |b, &p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    /// Finite coordinates and `min <= max` on every axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.cmple(self.max).all()
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    #[must_use]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the main diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }

    /// Enclosed volume (0 for flat or invalid boxes).
    #[must_use]
    pub fn volume(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Invalid, or zero volume.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.volume() <= 0.0
    }

    /// Box scaled about its center by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let c = self.center();
        let half = self.size() * 0.5 * factor.abs();
        Self::new(c - half, c + half)
    }

    /// The eight corners.
    #[must_use]
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }

    /// Grow to include `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_spans_all() {
        let b = BoundingBox::from_points(&[
            DVec3::new(1.0, -2.0, 3.0),
            DVec3::new(-1.0, 4.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.min, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, DVec3::new(1.0, 4.0, 3.0));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn flat_box_is_degenerate() {
        let flat = BoundingBox::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
        assert!(flat.is_valid());
        assert!(flat.is_degenerate());
    }

    #[test]
    fn inverted_box_is_invalid() {
        let b = BoundingBox::new(DVec3::ONE, DVec3::ZERO);
        assert!(!b.is_valid());
        assert_eq!(b.volume(), 0.0);
    }

    #[test]
    fn scaled_keeps_center() {
        let b = BoundingBox::new(DVec3::ZERO, DVec3::splat(2.0)).scaled(2.0);
        assert_eq!(b.center(), DVec3::ONE);
        assert_eq!(b.size(), DVec3::splat(4.0));
    }
}
