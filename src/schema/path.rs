use serde::{Deserialize, Serialize};

use super::geometry::{CompassDirection, Vec3};

/// A run of consecutive waypoint steps sharing one heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub direction: CompassDirection,
    pub step_count: usize,
}

/// The outcome of planning or analysing a route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathInfo {
    pub success: bool,
    pub segments: Vec<PathSegment>,
    pub raw_waypoints: Vec<Vec3>,
    pub error: Option<String>,
}

impl PathInfo {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            segments: Vec::new(),
            raw_waypoints: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Total number of waypoint steps across all segments.
    pub fn total_steps(&self) -> usize {
        self.segments.iter().map(|s| s.step_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_path_has_error_and_no_segments() {
        let info = PathInfo::failed("blocked");
        assert!(!info.success);
        assert!(info.segments.is_empty());
        assert_eq!(info.error.as_deref(), Some("blocked"));
    }

    #[test]
    fn total_steps_sums_segments() {
        let info = PathInfo {
            success: true,
            segments: vec![
                PathSegment {
                    direction: CompassDirection::North,
                    step_count: 2,
                },
                PathSegment {
                    direction: CompassDirection::East,
                    step_count: 1,
                },
            ],
            raw_waypoints: Vec::new(),
            error: None,
        };
        assert_eq!(info.total_steps(), 3);
    }
}
