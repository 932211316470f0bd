//! Avoidance collaborator seam.
//!
//! The avoidance algorithm itself lives outside this node; the arbiter only
//! needs two operations from it: a candidate maneuver for a telemetry sample,
//! and notification when the operator's goal changes. The candidate source is
//! chosen once at construction rather than branched on per call.

use crate::types::{Command, Telemetry};

/// External avoidance planner boundary.
///
/// `avoid` may return the no-maneuver sentinel ([`Command::is_no_maneuver`]),
/// in which case the candidate is discarded and the pending slot is left
/// untouched. Note that this can leave a previously produced, now stale
/// candidate pending; it is emitted on the next avoiding tick unless
/// overwritten first.
pub trait AvoidancePlanner: Send {
    /// Produce a candidate maneuver from a telemetry sample.
    fn avoid(&mut self, telemetry: &Telemetry) -> Command;

    /// Keep the planner's notion of the operator goal current.
    fn set_goal_waypoint(&mut self, goal: &Command);
}

/// Where telemetry-driven candidates come from.
pub enum CandidateSource {
    /// A real planner produces candidates.
    Live(Box<dyn AvoidancePlanner>),
    /// Diagnostic mode: the goal waypoint itself stands in for the planner's
    /// output, exercising the avoidance path without a planner.
    BypassToGoal,
}

/// Default planner: never recommends a maneuver. This is the integration
/// point for a real avoidance algorithm.
pub struct PassivePlanner {
    self_id: u32,
}

impl PassivePlanner {
    pub fn new(self_id: u32) -> Self {
        Self { self_id }
    }
}

impl AvoidancePlanner for PassivePlanner {
    fn avoid(&mut self, _telemetry: &Telemetry) -> Command {
        Command::no_maneuver(self.self_id)
    }

    fn set_goal_waypoint(&mut self, _goal: &Command) {}
}
