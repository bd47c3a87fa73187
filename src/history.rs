//! Snapshot-based undo/redo history with drag-aware debouncing.
//!
//! Every history entry is a deep copy of the whole funnel document at a point
//! in time. The manager is a small state machine: `Idle` snapshots user edits
//! immediately; `Dragging` (entered when a position change arrives) swallows
//! snapshots until the gesture settles, then takes exactly one. Settling is
//! clock-injected — the caller supplies `now` from its event loop — so there
//! is never more than one pending settle deadline and the behavior is fully
//! deterministic under test.

use crate::constants::{DRAG_SETTLE_SECS, MAX_HISTORY_ENTRIES};
use crate::types::Funnel;

/// Why a state write happened. Passed explicitly with every commit so the
/// snapshot-skip logic is parameter-driven rather than flag-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
    /// A direct user action; snapshots.
    UserEdit,
    /// Replaying a history entry (undo/redo); never snapshots.
    Replay,
    /// A derived recomputation (validation warnings); never snapshots.
    DerivedValidation,
}

/// Drag debounce state.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// A position change arrived; the gesture settles once the clock passes
    /// `settle_at` with no further position changes.
    Dragging { settle_at: f64 },
}

/// Undo/redo history over owned funnel snapshots.
///
/// Holds at most [`MAX_HISTORY_ENTRIES`] entries; the oldest is evicted
/// first. `current` always points at the entry matching the live document.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Funnel>,
    current: usize,
    drag: DragState,
}

impl History {
    /// Creates a history seeded with the initial document state.
    pub fn new(initial: Funnel) -> Self {
        Self {
            entries: vec![initial],
            current: 0,
            drag: DragState::Idle,
        }
    }

    /// Records a state write.
    ///
    /// Only `UserEdit` writes while `Idle` produce a snapshot; replays and
    /// derived rewrites pass through untouched, and position changes during a
    /// drag are covered by the single settle snapshot instead.
    pub fn record(&mut self, state: &Funnel, intent: WriteIntent) {
        if intent == WriteIntent::UserEdit && self.drag == DragState::Idle {
            self.push(state.clone());
        }
    }

    /// Notes a position-only change at time `now`, entering (or re-arming)
    /// the drag debounce window.
    pub fn note_position_change(&mut self, now: f64) {
        self.drag = DragState::Dragging {
            settle_at: now + DRAG_SETTLE_SECS,
        };
    }

    /// Advances the debounce clock. If a drag was pending and the settle
    /// window has elapsed, transitions back to `Idle` and takes the single
    /// post-drag snapshot. Returns whether a snapshot was taken.
    pub fn tick(&mut self, state: &Funnel, now: f64) -> bool {
        if let DragState::Dragging { settle_at } = self.drag {
            if now >= settle_at {
                self.drag = DragState::Idle;
                self.push(state.clone());
                return true;
            }
        }
        false
    }

    /// Whether a drag gesture is currently waiting to settle.
    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Steps back one entry, returning the state to restore. No-op at the
    /// oldest entry.
    pub fn undo(&mut self) -> Option<&Funnel> {
        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        Some(&self.entries[self.current])
    }

    /// Steps forward one entry, returning the state to restore. No-op at the
    /// newest entry.
    pub fn redo(&mut self) -> Option<&Funnel> {
        if self.current + 1 >= self.entries.len() {
            return None;
        }
        self.current += 1;
        Some(&self.entries[self.current])
    }

    /// Returns true if there is an older entry to restore.
    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    /// Returns true if there is a newer entry to restore.
    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Replaces the whole history with a single entry. Used on import, clear,
    /// and template load.
    pub fn reset(&mut self, state: Funnel) {
        self.entries = vec![state];
        self.current = 0;
        self.drag = DragState::Idle;
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when only the initial entry remains.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    fn push(&mut self, state: Funnel) {
        // A new snapshot invalidates any previously undone future
        self.entries.truncate(self.current + 1);
        self.entries.push(state);
        self.current += 1;

        if self.entries.len() > MAX_HISTORY_ENTRIES {
            self.entries.remove(0);
            self.current = MAX_HISTORY_ENTRIES - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FunnelNode, NodeKind};

    fn state_with_nodes(n: usize) -> Funnel {
        let mut funnel = Funnel::new();
        for i in 0..n {
            funnel.add_node(FunnelNode::new(
                NodeKind::Upsell,
                (i as f32, 0.0),
                format!("Upsell {}", i + 1),
            ));
        }
        funnel
    }

    #[test]
    fn test_user_edit_snapshots() {
        let mut history = History::new(state_with_nodes(0));
        history.record(&state_with_nodes(1), WriteIntent::UserEdit);

        assert_eq!(history.len(), 2);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_replay_and_derived_writes_are_exempt() {
        let mut history = History::new(state_with_nodes(0));
        history.record(&state_with_nodes(1), WriteIntent::Replay);
        history.record(&state_with_nodes(2), WriteIntent::DerivedValidation);

        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new(state_with_nodes(0));
        for i in 1..=5 {
            history.record(&state_with_nodes(i), WriteIntent::UserEdit);
        }

        for expected in (0..5).rev() {
            let restored = history.undo().expect("undo within bounds").clone();
            assert_eq!(restored.nodes.len(), expected);
        }
        assert!(history.undo().is_none(), "undo at the oldest entry is a no-op");

        for expected in 1..=5 {
            let restored = history.redo().expect("redo within bounds").clone();
            assert_eq!(restored.nodes.len(), expected);
        }
        assert!(history.redo().is_none(), "redo at the newest entry is a no-op");
    }

    #[test]
    fn test_snapshot_truncates_future() {
        let mut history = History::new(state_with_nodes(0));
        history.record(&state_with_nodes(1), WriteIntent::UserEdit);
        history.record(&state_with_nodes(2), WriteIntent::UserEdit);

        history.undo();
        assert!(history.can_redo());

        history.record(&state_with_nodes(9), WriteIntent::UserEdit);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_capacity_bound() {
        let mut history = History::new(state_with_nodes(0));
        for i in 1..=80 {
            history.record(&state_with_nodes(i), WriteIntent::UserEdit);
        }

        assert_eq!(history.len(), MAX_HISTORY_ENTRIES);
        assert!(!history.can_redo(), "current points at the latest entry");
        // Latest entry is intact; oldest entries were evicted
        assert_eq!(history.undo().unwrap().nodes.len(), 79);
    }

    #[test]
    fn test_drag_coalescing() {
        let mut history = History::new(state_with_nodes(1));

        // 20 rapid position changes, 10ms apart
        for i in 0..20 {
            history.note_position_change(i as f64 * 0.01);
            history.record(&state_with_nodes(1), WriteIntent::UserEdit);
        }
        assert_eq!(history.len(), 1, "no snapshots while dragging");

        // Not settled yet at 100ms after the last change
        assert!(!history.tick(&state_with_nodes(1), 0.29));
        // Settled well past the 300ms window: exactly one snapshot
        assert!(history.tick(&state_with_nodes(1), 0.6));
        assert_eq!(history.len(), 2);
        assert!(!history.is_dragging());

        // Further ticks take nothing
        assert!(!history.tick(&state_with_nodes(1), 10.0));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_rearming_replaces_settle_deadline() {
        let mut history = History::new(state_with_nodes(1));
        history.note_position_change(0.0);
        history.note_position_change(0.2);

        // 0.3 has passed since the first change but not the second
        assert!(!history.tick(&state_with_nodes(1), 0.35));
        assert!(history.tick(&state_with_nodes(1), 0.55));
    }

    #[test]
    fn test_reset() {
        let mut history = History::new(state_with_nodes(0));
        history.record(&state_with_nodes(1), WriteIntent::UserEdit);
        history.note_position_change(0.0);

        history.reset(state_with_nodes(3));

        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.is_dragging());
    }
}
