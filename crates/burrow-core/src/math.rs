//! Math utilities
//!
//! Re-exports from glam plus the bounding volume used for tunnel extents.

pub use glam::{Vec2, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create an empty AABB
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Bounds of a packed `xyz xyz ...` position stream.
    ///
    /// A trailing partial triple is ignored.
    pub fn from_packed_positions(positions: &[f32]) -> Self {
        let mut result = Self::EMPTY;
        for p in positions.chunks_exact(3) {
            result.expand_to_include(Vec3::new(p[0], p[1], p[2]));
        }
        result
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if the AABB is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Check if a point is inside the AABB
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Expand the AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Point on the unit circle for an angle in degrees, as `(sin, cos)`.
///
/// Trigonometry runs in f64; only the result is narrowed.
#[inline]
pub fn ring_offset(degrees: f64) -> (f32, f32) {
    let radians = degrees.to_radians();
    (radians.sin() as f32, radians.cos() as f32)
}
