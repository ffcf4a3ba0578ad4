use glam::Vec3;

/// A conservative spherical envelope around a node's visible content.
///
/// The empty sphere is encoded with a negative-infinity radius, so that
/// `union` with it is an identity and every containment/intersection test
/// against it is false.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// The empty (degenerate) sphere: contains nothing, unions to identity.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: f32::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// A zero-radius sphere around a single point.
    #[must_use]
    pub fn from_point(point: Vec3) -> Self {
        Self {
            center: point,
            radius: 0.0,
        }
    }

    /// Fits a sphere around a point set.
    ///
    /// Two passes, like the geometry preprocessors do it: center on the
    /// midpoint of the axis-aligned extent, then take the largest distance
    /// from that center as the radius. Not the minimal enclosing sphere, but
    /// conservative and cheap.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::empty();
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &p in points {
            min = min.min(p);
            max = max.max(p);
        }
        let center = (min + max) * 0.5;

        let mut max_dist_sq = 0.0_f32;
        for &p in points {
            let dist_sq = p.distance_squared(center);
            if dist_sq > max_dist_sq {
                max_dist_sq = dist_sq;
            }
        }

        Self {
            center,
            radius: max_dist_sq.sqrt(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    /// The smallest sphere enclosing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &BoundingSphere) -> BoundingSphere {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let offset = other.center - self.center;
        let dist = offset.length();

        // One sphere already swallows the other.
        if self.radius >= dist + other.radius {
            return *self;
        }
        if other.radius >= dist + self.radius {
            return *other;
        }

        let radius = (dist + self.radius + other.radius) * 0.5;
        let center = if dist > f32::EPSILON {
            self.center + offset * ((radius - self.radius) / dist)
        } else {
            self.center
        };

        BoundingSphere { center, radius }
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        !self.is_empty() && point.distance_squared(self.center) <= self.radius * self.radius
    }

    /// True if `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &BoundingSphere) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.center.distance(other.center) + other.radius <= self.radius
    }

    /// True if the two spheres overlap (touching counts).
    #[must_use]
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.center.distance(other.center) <= self.radius + other.radius
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::empty()
    }
}
