use glam::Vec2;
use std::collections::VecDeque;

/// A high-level action that any front end can produce.
///
/// Puzzle actions are consumed by the kernel; camera actions by the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move the lamp (light and pedestal) along the room diagonal.
    SetLightPosition(f64),
    /// Set the shape rotation about X, in radians.
    SetShapeRotationX(f64),
    /// Set the shape rotation about Z, in radians.
    SetShapeRotationZ(f64),
    /// Switch between the lit and dark lighting presets.
    ToggleLight,
    /// Orbit the camera by a pointer delta in pixels.
    Orbit(Vec2),
    /// Zoom the camera; positive values move closer.
    Zoom(f32),
    /// No-op (used for input mapping that hasn't been bound yet).
    Noop,
}

impl Action {
    /// True for actions that change puzzle state rather than the view.
    pub fn is_puzzle_action(&self) -> bool {
        matches!(
            self,
            Action::SetLightPosition(_)
                | Action::SetShapeRotationX(_)
                | Action::SetShapeRotationZ(_)
                | Action::ToggleLight
        )
    }
}

/// FIFO of actions collected during one frame.
///
/// Front ends push while handling window and UI events; the frame loop drains
/// the queue once, before the win check runs.
#[derive(Debug, Default)]
pub struct ActionQueue {
    pending: VecDeque<Action>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        if action == Action::Noop {
            return;
        }
        tracing::trace!(?action, "queued action");
        self.pending.push_back(action);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued action in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.pending.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puzzle_actions_are_classified() {
        assert!(Action::SetLightPosition(5.0).is_puzzle_action());
        assert!(Action::ToggleLight.is_puzzle_action());
        assert!(!Action::Orbit(Vec2::new(1.0, 0.0)).is_puzzle_action());
        assert!(!Action::Zoom(1.0).is_puzzle_action());
        assert!(!Action::Noop.is_puzzle_action());
    }

    #[test]
    fn queue_preserves_order() {
        let mut queue = ActionQueue::new();
        queue.push(Action::SetShapeRotationX(1.0));
        queue.push(Action::ToggleLight);
        queue.push(Action::SetShapeRotationZ(2.0));

        let drained: Vec<Action> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                Action::SetShapeRotationX(1.0),
                Action::ToggleLight,
                Action::SetShapeRotationZ(2.0),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn noop_is_dropped() {
        let mut queue = ActionQueue::new();
        queue.push(Action::Noop);
        assert_eq!(queue.len(), 0);
    }
}
