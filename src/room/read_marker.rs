use matrix_sdk::ruma::{EventId, OwnedEventId};

use crate::models::changes::StructuralEdit;

/// The single structural edit needed to bring the read-marker row up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerTransition {
    None,
    Insert(usize),
    Remove(usize),
    Move { from: usize, to: usize },
}

impl MarkerTransition {
    pub fn as_edit(self) -> Option<StructuralEdit> {
        match self {
            Self::None => None,
            Self::Insert(at) => Some(StructuralEdit::Insert { at, count: 1 }),
            Self::Remove(at) => Some(StructuralEdit::Remove { at, count: 1 }),
            Self::Move { from, to } => Some(StructuralEdit::Move { from, count: 1, to }),
        }
    }
}

/// Owns the synthetic read-marker row.
///
/// The marker sits right above the last read event, so that every row above
/// it (apart from pending rows) is unread. It is only shown while there is at
/// least one unread confirmed event.
#[derive(Debug, Clone, Default)]
pub struct ReadMarkerTracker {
    target: Option<OwnedEventId>,
    row: Option<usize>,
}

impl ReadMarkerTracker {
    pub fn new(target: Option<OwnedEventId>) -> Self {
        Self { target, row: None }
    }

    pub fn target(&self) -> Option<&EventId> {
        self.target.as_deref()
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }

    pub fn retarget(&mut self, target: Option<OwnedEventId>) {
        self.target = target;
    }

    /// Computes the transition for the target currently being at `target_offset`
    /// in the confirmed timeline (`None` when it is not loaded) with `pending` rows
    /// above the timeline.
    pub fn plan(&self, target_offset: Option<usize>, pending: usize) -> MarkerTransition {
        let desired = target_offset
            .filter(|&offset| offset > 0)
            .map(|offset| pending + offset);
        match (self.row, desired) {
            (None, None) => MarkerTransition::None,
            (None, Some(to)) => MarkerTransition::Insert(to),
            (Some(from), None) => MarkerTransition::Remove(from),
            (Some(from), Some(to)) if from == to => MarkerTransition::None,
            (Some(from), Some(to)) => MarkerTransition::Move { from, to },
        }
    }

    pub fn commit(&mut self, transition: MarkerTransition) {
        match transition {
            MarkerTransition::None => {}
            MarkerTransition::Insert(row) => {
                debug_assert!(self.row.is_none(), "read marker inserted twice");
                self.row = Some(row);
            }
            MarkerTransition::Remove(row) => {
                debug_assert_eq!(self.row, Some(row), "removed a read marker that wasn't there");
                self.row = None;
            }
            MarkerTransition::Move { to, .. } => self.row = Some(to),
        }
    }

    /// Keeps the marker attached to its event while other rows are inserted, removed or moved.
    pub fn shift_for(&mut self, edit: &StructuralEdit) {
        let Some(row) = self.row.as_mut() else {
            return;
        };
        match *edit {
            StructuralEdit::Insert { at, count } => {
                if at <= *row {
                    *row += count;
                }
            }
            StructuralEdit::Remove { at, count } => {
                debug_assert!(
                    !(at..at + count).contains(row),
                    "read marker row {row} removed by {edit:?}"
                );
                if at + count <= *row {
                    *row -= count;
                }
            }
            StructuralEdit::Move { from, count, to } => {
                if (from..from + count).contains(row) {
                    *row = to + (*row - from);
                } else if from < *row && *row < to + count {
                    *row -= count;
                } else if to <= *row && *row < from {
                    *row += count;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed_at(row: usize) -> ReadMarkerTracker {
        let mut tracker = ReadMarkerTracker::default();
        tracker.commit(MarkerTransition::Insert(row));
        tracker
    }

    #[test]
    fn inserts_above_the_last_read_event() {
        let tracker = ReadMarkerTracker::default();
        assert_eq!(tracker.plan(Some(2), 0), MarkerTransition::Insert(2));
        assert_eq!(tracker.plan(Some(2), 3), MarkerTransition::Insert(5));
    }

    #[test]
    fn no_marker_when_everything_is_read_or_unknown() {
        let tracker = ReadMarkerTracker::default();
        assert_eq!(tracker.plan(Some(0), 1), MarkerTransition::None);
        assert_eq!(tracker.plan(None, 1), MarkerTransition::None);
    }

    #[test]
    fn removes_or_moves_an_existing_marker() {
        let tracker = placed_at(4);
        assert_eq!(tracker.plan(Some(0), 0), MarkerTransition::Remove(4));
        assert_eq!(tracker.plan(None, 0), MarkerTransition::Remove(4));
        assert_eq!(tracker.plan(Some(4), 0), MarkerTransition::None);
        assert_eq!(
            tracker.plan(Some(1), 0),
            MarkerTransition::Move { from: 4, to: 1 }
        );
    }

    #[test]
    fn follows_inserts_and_removes_above_it() {
        let mut tracker = placed_at(3);
        tracker.shift_for(&StructuralEdit::Insert { at: 0, count: 2 });
        assert_eq!(tracker.row(), Some(5));
        tracker.shift_for(&StructuralEdit::Insert { at: 9, count: 5 });
        assert_eq!(tracker.row(), Some(5));
        tracker.shift_for(&StructuralEdit::Remove { at: 1, count: 1 });
        assert_eq!(tracker.row(), Some(4));
    }

    #[test]
    fn follows_moves_across_it() {
        let mut tracker = placed_at(3);
        tracker.shift_for(&StructuralEdit::Move { from: 1, count: 1, to: 5 });
        assert_eq!(tracker.row(), Some(2));
        tracker.shift_for(&StructuralEdit::Move { from: 6, count: 1, to: 0 });
        assert_eq!(tracker.row(), Some(3));
        tracker.shift_for(&StructuralEdit::Move { from: 0, count: 1, to: 1 });
        assert_eq!(tracker.row(), Some(3));
    }
}
