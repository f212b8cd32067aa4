/// Path direction narration: compass runs from a waypoint polyline.
use super::config::PathConfig;
use super::messages::{keys, Translator};
use crate::schema::geometry::{CompassDirection, Vec3};
use crate::schema::path::{PathInfo, PathSegment};
use crate::schema::scene::AccessError;

/// Host route search. `Ok(None)` means no route exists.
pub trait Pathfinder {
    fn find_path(&self, from: Vec3, to: Vec3) -> Result<Option<Vec<Vec3>>, AccessError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathNarrator {
    config: PathConfig,
}

// A run being accumulated: its bucket, that bucket's canonical vector,
// and how many steps it has absorbed.
struct Run {
    direction: CompassDirection,
    heading: Vec3,
    steps: usize,
}

impl PathNarrator {
    pub fn new(config: PathConfig) -> Self {
        Self { config }
    }

    /// Split consecutive waypoint steps into runs of the same compass
    /// bucket.
    ///
    /// Each step is classified first; it joins the current run when its
    /// bucket vector lies within `merge_threshold` of the run's. Runs are
    /// never reordered, and non-adjacent runs in the same direction stay
    /// separate.
    pub fn segments(&self, waypoints: &[Vec3]) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        let mut run: Option<Run> = None;

        for pair in waypoints.windows(2) {
            let delta = pair[1] - pair[0];
            let direction = CompassDirection::from_delta(
                delta,
                self.config.diagonal_threshold,
                self.config.negligible,
            );
            let heading = direction.unit_vector();

            let extends = run
                .as_ref()
                .is_some_and(|r| r.heading.distance(heading) < self.config.merge_threshold);
            if extends {
                if let Some(current) = run.as_mut() {
                    current.steps += 1;
                }
                continue;
            }

            if let Some(done) = run.take() {
                segments.push(PathSegment {
                    direction: done.direction,
                    step_count: done.steps,
                });
            }
            run = Some(Run {
                direction,
                heading,
                steps: 1,
            });
        }

        if let Some(done) = run {
            segments.push(PathSegment {
                direction: done.direction,
                step_count: done.steps,
            });
        }
        segments
    }

    /// Analyse an already-known route.
    pub fn analyze(&self, waypoints: &[Vec3]) -> PathInfo {
        PathInfo {
            success: true,
            segments: self.segments(waypoints),
            raw_waypoints: waypoints.to_vec(),
            error: None,
        }
    }

    /// Ask the host for a route and analyse it.
    pub fn plan_route(&self, pathfinder: &dyn Pathfinder, from: Vec3, to: Vec3) -> PathInfo {
        match pathfinder.find_path(from, to) {
            Ok(Some(waypoints)) => self.analyze(&waypoints),
            Ok(None) => PathInfo::failed("no route"),
            Err(e) => {
                tracing::warn!(error = %e, "pathfinder failed");
                PathInfo::failed(e.to_string())
            }
        }
    }

    /// `"<Direction> <count>, ..."`, or the fixed "no movement" text for
    /// fewer than two waypoints.
    pub fn describe(&self, translator: &dyn Translator, waypoints: &[Vec3]) -> String {
        if waypoints.len() < 2 {
            return translator.translate(keys::PATH_NO_MOVEMENT, &[]);
        }
        self.render_segments(translator, &self.segments(waypoints))
    }

    /// Speak a [`PathInfo`], including planning failures.
    pub fn render(&self, translator: &dyn Translator, info: &PathInfo) -> String {
        if !info.success {
            return translator.translate(keys::PATH_NO_PATH, &[]);
        }
        if info.segments.is_empty() {
            return translator.translate(keys::PATH_NO_MOVEMENT, &[]);
        }
        self.render_segments(translator, &info.segments)
    }

    fn render_segments(&self, translator: &dyn Translator, segments: &[PathSegment]) -> String {
        let separator = translator.translate(keys::PATH_SEPARATOR, &[]);
        segments
            .iter()
            .map(|s| {
                let direction = translator.translate(s.direction.message_key(), &[]);
                translator.translate(keys::PATH_SEGMENT, &[&direction, &s.step_count.to_string()])
            })
            .collect::<Vec<_>>()
            .join(&separator)
    }
}
