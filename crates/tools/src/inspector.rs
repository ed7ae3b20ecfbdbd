use shadowlock_kernel::{Condition, ConditionStatus, Puzzle, evaluate};
use std::fmt;

/// Puzzle inspector for developer tooling.
///
/// Evaluates the current state against the targets without touching the
/// win latch, so it can run at any rate.
pub struct PuzzleInspector;

impl PuzzleInspector {
    pub fn summary(puzzle: &Puzzle) -> PuzzleSummary {
        let state = puzzle.state();
        let report = evaluate(state, puzzle.checker().targets());
        PuzzleSummary {
            light_x: state.light_x,
            rotation_x: state.shape_rotation.x,
            rotation_z: state.shape_rotation.z,
            light_on: state.light_on,
            shape_attached: state.shape_attached,
            solved: puzzle.is_solved(),
            aligned: report.met_count(),
            pending_events: puzzle.events().len(),
        }
    }

    /// Per-condition detail: current value, target and status.
    pub fn conditions(puzzle: &Puzzle) -> Vec<ConditionInfo> {
        let state = puzzle.state();
        let targets = puzzle.checker().targets();
        let report = evaluate(state, targets);
        Condition::ALL
            .into_iter()
            .map(|condition| {
                let (actual, target) = match condition {
                    Condition::LightPosition => (state.light_xz.x, targets.light_x),
                    Condition::RotationX => (state.shape_rotation.x, targets.rotation_x),
                    Condition::RotationZ => (state.shape_rotation.z, targets.rotation_z),
                };
                ConditionInfo {
                    condition,
                    actual,
                    target,
                    status: report.status(condition),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleSummary {
    pub light_x: f64,
    pub rotation_x: f64,
    pub rotation_z: f64,
    pub light_on: bool,
    pub shape_attached: bool,
    pub solved: bool,
    /// How many of the three conditions currently hold.
    pub aligned: usize,
    pub pending_events: usize,
}

impl fmt::Display for PuzzleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Puzzle: light={:.2} rot_x={:.2} rot_z={:.2} lamp={} shape={} aligned={}/3 solved={}",
            self.light_x,
            self.rotation_x,
            self.rotation_z,
            if self.light_on { "on" } else { "off" },
            if self.shape_attached { "attached" } else { "loading" },
            self.aligned,
            self.solved
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionInfo {
    pub condition: Condition,
    pub actual: f64,
    pub target: f64,
    pub status: ConditionStatus,
}

impl fmt::Display for ConditionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            ConditionStatus::Met => "aligned".to_string(),
            ConditionStatus::Unmet { delta } => format!("off by {delta:.3}"),
            ConditionStatus::Pending => "waiting for shape".to_string(),
        };
        write!(
            f,
            "{:<15} {:>6.3} (target {:.3}) {}",
            self.condition.label(),
            self.actual,
            self.target,
            status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowlock_kernel::PuzzleConfig;

    #[test]
    fn summary_fresh_puzzle() {
        let puzzle = Puzzle::new(PuzzleConfig::default());
        let summary = PuzzleInspector::summary(&puzzle);
        assert_eq!(summary.light_x, 10.0);
        assert!(summary.light_on);
        assert!(!summary.shape_attached);
        assert!(!summary.solved);
        assert_eq!(summary.aligned, 0);
    }

    #[test]
    fn summary_does_not_latch() {
        let mut puzzle = Puzzle::new(PuzzleConfig::default());
        puzzle.attach_shape();
        puzzle.set_light_position(5.43);
        puzzle.set_shape_rotation_x(1.71);
        puzzle.set_shape_rotation_z(2.41);

        let summary = PuzzleInspector::summary(&puzzle);
        assert_eq!(summary.aligned, 3);
        assert!(!summary.solved);
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn conditions_report_pending_rotation() {
        let mut puzzle = Puzzle::new(PuzzleConfig::default());
        puzzle.set_light_position(5.40);
        let info = PuzzleInspector::conditions(&puzzle);
        assert_eq!(info.len(), 3);
        assert_eq!(info[0].status, ConditionStatus::Met);
        assert_eq!(info[1].status, ConditionStatus::Pending);
        assert_eq!(info[2].target, 2.41);
    }

    #[test]
    fn summary_display() {
        let puzzle = Puzzle::new(PuzzleConfig::default());
        let s = PuzzleInspector::summary(&puzzle).to_string();
        assert!(s.contains("light=10.00"));
        assert!(s.contains("aligned=0/3"));
        assert!(s.contains("shape=loading"));
    }

    #[test]
    fn condition_display_shows_delta() {
        let puzzle = Puzzle::new(PuzzleConfig::default());
        let info = &PuzzleInspector::conditions(&puzzle)[0];
        let s = info.to_string();
        assert!(s.contains("light position"));
        assert!(s.contains("off by 4.570"));
    }

    #[test]
    fn dark_light_reported_at_its_anchor() {
        let mut puzzle = Puzzle::new(PuzzleConfig::default());
        puzzle.set_light_position(5.43);
        puzzle.toggle_light();
        let info = &PuzzleInspector::conditions(&puzzle)[0];
        assert_eq!(info.actual, 0.0);
        assert_eq!(info.status, ConditionStatus::Unmet { delta: 5.43 });
        assert_eq!(PuzzleInspector::summary(&puzzle).light_x, 5.43);
    }
}
