use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A world-space position or delta. North is `+y`, east is `+x`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance between two points.
    pub fn distance(&self, other: Vec3) -> f32 {
        (*self - other).length()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    pub fn normalized(&self) -> Option<Vec3> {
        let len = self.length();
        if len <= f32::EPSILON {
            return None;
        }
        Some(Vec3::new(self.x / len, self.y / len, self.z / len))
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// One of the eight compass buckets, plus `Unknown` for deltas too small
/// to have a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompassDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Unknown,
}

impl CompassDirection {
    /// Clockwise from north; index `i` covers bearings centred on `i * 45°`.
    const CLOCKWISE: [CompassDirection; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Classify a movement delta.
    ///
    /// The x/y components are normalized first. Diagonals win when both
    /// components exceed `diagonal_threshold`; otherwise the larger
    /// component picks the cardinal. A delta whose raw x and y magnitudes
    /// are both below `negligible` is `Unknown`.
    pub fn from_delta(delta: Vec3, diagonal_threshold: f32, negligible: f32) -> Self {
        if delta.x.abs() < negligible && delta.y.abs() < negligible {
            return Self::Unknown;
        }
        let len = (delta.x * delta.x + delta.y * delta.y).sqrt();
        if len <= f32::EPSILON {
            return Self::Unknown;
        }
        let (nx, ny) = (delta.x / len, delta.y / len);

        if nx.abs() > diagonal_threshold && ny.abs() > diagonal_threshold {
            return match (nx > 0.0, ny > 0.0) {
                (true, true) => Self::NorthEast,
                (true, false) => Self::SouthEast,
                (false, true) => Self::NorthWest,
                (false, false) => Self::SouthWest,
            };
        }

        if ny.abs() >= nx.abs() {
            if ny > 0.0 {
                Self::North
            } else {
                Self::South
            }
        } else if nx > 0.0 {
            Self::East
        } else {
            Self::West
        }
    }

    /// 8-way bearing from `from` towards `to`, using 22.5° bucket edges.
    pub fn bearing(from: Vec3, to: Vec3) -> Self {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx == 0.0 && dy == 0.0 {
            return Self::Unknown;
        }
        // atan2(x, y) measures clockwise from north.
        let degrees = dx.atan2(dy).to_degrees().rem_euclid(360.0);
        let bucket = ((degrees + 22.5) / 45.0).floor() as usize % 8;
        Self::CLOCKWISE[bucket]
    }

    /// Canonical unit vector for this bucket; zero for `Unknown`.
    pub fn unit_vector(&self) -> Vec3 {
        const D: f32 = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            Self::North => Vec3::new(0.0, 1.0, 0.0),
            Self::NorthEast => Vec3::new(D, D, 0.0),
            Self::East => Vec3::new(1.0, 0.0, 0.0),
            Self::SouthEast => Vec3::new(D, -D, 0.0),
            Self::South => Vec3::new(0.0, -1.0, 0.0),
            Self::SouthWest => Vec3::new(-D, -D, 0.0),
            Self::West => Vec3::new(-1.0, 0.0, 0.0),
            Self::NorthWest => Vec3::new(-D, D, 0.0),
            Self::Unknown => Vec3::ZERO,
        }
    }

    /// Message-catalog key for the spoken name of this direction.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::North => "direction.north",
            Self::NorthEast => "direction.north_east",
            Self::East => "direction.east",
            Self::SouthEast => "direction.south_east",
            Self::South => "direction.south",
            Self::SouthWest => "direction.south_west",
            Self::West => "direction.west",
            Self::NorthWest => "direction.north_west",
            Self::Unknown => "direction.unknown",
        }
    }

    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::SouthEast | Self::SouthWest | Self::NorthWest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(x: f32, y: f32) -> CompassDirection {
        CompassDirection::from_delta(Vec3::new(x, y, 0.0), 0.4, 1e-3)
    }

    #[test]
    fn diagonal_before_cardinal() {
        assert_eq!(classify(0.71, 0.71), CompassDirection::NorthEast);
        assert_eq!(classify(-0.71, -0.71), CompassDirection::SouthWest);
        assert!(classify(0.71, -0.71).is_diagonal());
    }

    #[test]
    fn pure_cardinals() {
        assert_eq!(classify(0.0, 1.0), CompassDirection::North);
        assert_eq!(classify(0.0, -16.0), CompassDirection::South);
        assert_eq!(classify(16.0, 0.0), CompassDirection::East);
        assert_eq!(classify(-3.0, 0.5), CompassDirection::West);
    }

    #[test]
    fn shallow_angle_stays_cardinal() {
        // normalized x is ~0.24, under the diagonal threshold
        assert_eq!(classify(0.25, 1.0), CompassDirection::North);
    }

    #[test]
    fn negligible_delta_is_unknown() {
        assert_eq!(classify(0.0, 0.0), CompassDirection::Unknown);
        assert_eq!(classify(0.0001, -0.0002), CompassDirection::Unknown);
    }

    #[test]
    fn vertical_only_delta_is_unknown() {
        let d = CompassDirection::from_delta(Vec3::new(0.0, 0.0, 5.0), 0.4, 1e-3);
        assert_eq!(d, CompassDirection::Unknown);
    }

    #[test]
    fn bearing_buckets() {
        let o = Vec3::ZERO;
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(0.0, 10.0, 0.0)),
            CompassDirection::North
        );
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(10.0, 10.0, 0.0)),
            CompassDirection::NorthEast
        );
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(-10.0, 0.0, 0.0)),
            CompassDirection::West
        );
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(-1.0, -10.0, 0.0)),
            CompassDirection::South
        );
        assert_eq!(CompassDirection::bearing(o, o), CompassDirection::Unknown);
    }

    #[test]
    fn bearing_edges_at_22_5_degrees() {
        let o = Vec3::ZERO;
        // 20° east of north is still north, 25° is north-east
        let a = 20f32.to_radians();
        let b = 25f32.to_radians();
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(a.sin(), a.cos(), 0.0)),
            CompassDirection::North
        );
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(b.sin(), b.cos(), 0.0)),
            CompassDirection::NorthEast
        );
        // 350° wraps back to north
        let c = 350f32.to_radians();
        assert_eq!(
            CompassDirection::bearing(o, Vec3::new(c.sin(), c.cos(), 0.0)),
            CompassDirection::North
        );
    }

    #[test]
    fn distance_and_normalize() {
        let a = Vec3::new(0.0, 3.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-5);
        assert!(Vec3::ZERO.normalized().is_none());
        let n = Vec3::new(0.0, 16.0, 0.0).normalized().unwrap();
        assert!((n.y - 1.0).abs() < 1e-6);
    }
}
