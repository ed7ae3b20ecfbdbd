//! Win-condition checker.

use crate::config::TargetConfig;
use crate::state::PuzzleState;

/// Slack added to the tolerance so that readings exactly on the boundary
/// (e.g. 5.48 against 5.43 ± 0.05) pass despite decimal representation error.
const BOUNDARY_SLACK: f64 = 1e-9;

/// One of the three tracked scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    LightPosition,
    RotationX,
    RotationZ,
}

impl Condition {
    pub const ALL: [Condition; 3] = [
        Condition::LightPosition,
        Condition::RotationX,
        Condition::RotationZ,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Condition::LightPosition => "light position",
            Condition::RotationX => "rotation X",
            Condition::RotationZ => "rotation Z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionStatus {
    Met,
    Unmet { delta: f64 },
    /// The object the condition reads is not in the scene yet.
    Pending,
}

impl ConditionStatus {
    pub fn is_met(self) -> bool {
        matches!(self, ConditionStatus::Met)
    }

    fn compare(actual: f64, target: f64, tolerance: f64) -> Self {
        let delta = (actual - target).abs();
        if within_tolerance(actual, target, tolerance) {
            ConditionStatus::Met
        } else {
            ConditionStatus::Unmet { delta }
        }
    }
}

/// Per-condition result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckReport {
    pub light: ConditionStatus,
    pub rotation_x: ConditionStatus,
    pub rotation_z: ConditionStatus,
}

impl CheckReport {
    pub fn status(&self, condition: Condition) -> ConditionStatus {
        match condition {
            Condition::LightPosition => self.light,
            Condition::RotationX => self.rotation_x,
            Condition::RotationZ => self.rotation_z,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Condition, ConditionStatus)> + '_ {
        Condition::ALL.into_iter().map(|c| (c, self.status(c)))
    }

    pub fn is_solved(&self) -> bool {
        self.iter().all(|(_, s)| s.is_met())
    }

    pub fn met_count(&self) -> usize {
        self.iter().filter(|(_, s)| s.is_met()).count()
    }
}

/// `abs(actual - target) <= tolerance`, inclusive at the boundary.
pub fn within_tolerance(actual: f64, target: f64, tolerance: f64) -> bool {
    (actual - target).abs() <= tolerance + BOUNDARY_SLACK
}

/// Evaluate every condition against the targets. Pure; never fails.
pub fn evaluate(state: &PuzzleState, targets: &TargetConfig) -> CheckReport {
    let light = ConditionStatus::compare(state.light_xz.x, targets.light_x, targets.tolerance);
    let (rotation_x, rotation_z) = if state.shape_attached {
        (
            ConditionStatus::compare(state.shape_rotation.x, targets.rotation_x, targets.tolerance),
            ConditionStatus::compare(state.shape_rotation.z, targets.rotation_z, targets.tolerance),
        )
    } else {
        (ConditionStatus::Pending, ConditionStatus::Pending)
    };
    CheckReport {
        light,
        rotation_x,
        rotation_z,
    }
}

/// Result of a per-frame check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOutcome {
    pub report: CheckReport,
    /// True on the single check that first observed a solved state.
    pub just_solved: bool,
}

/// Runs `evaluate` every frame and latches success.
#[derive(Debug, Clone)]
pub struct WinChecker {
    targets: TargetConfig,
    solved: bool,
    last: Option<CheckReport>,
}

impl WinChecker {
    pub fn new(targets: TargetConfig) -> Self {
        Self {
            targets,
            solved: false,
            last: None,
        }
    }

    pub fn targets(&self) -> &TargetConfig {
        &self.targets
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Most recent report, if any check has run.
    pub fn last_report(&self) -> Option<&CheckReport> {
        self.last.as_ref()
    }

    pub fn check(&mut self, state: &PuzzleState) -> CheckOutcome {
        let report = evaluate(state, &self.targets);
        self.log_transitions(&report);
        self.last = Some(report);

        let just_solved = !self.solved && report.is_solved();
        if just_solved {
            self.solved = true;
        }
        CheckOutcome {
            report,
            just_solved,
        }
    }

    fn log_transitions(&self, report: &CheckReport) {
        for (condition, status) in report.iter() {
            let was_met = self
                .last
                .map(|r| r.status(condition).is_met())
                .unwrap_or(false);
            match (was_met, status.is_met()) {
                (false, true) => tracing::debug!("{} aligned", condition.label()),
                (true, false) => tracing::debug!("{} no longer aligned", condition.label()),
                _ => {}
            }
        }
    }
}
