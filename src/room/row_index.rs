/// What a row of the projected list stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowRef {
    /// Offset into the pending queue, newest first.
    Pending(usize),
    /// Offset into the confirmed timeline, newest first.
    Confirmed(usize),
    /// The synthetic row separating read from unread events.
    ReadMarker,
    /// Returned for rows past the end of the list in release builds.
    Vacant,
}

/// Shape of the projected list: pending rows first, then confirmed rows, with
/// the read-marker row somewhere among the confirmed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowLayout {
    pub pending: usize,
    pub confirmed: usize,
    pub read_marker: Option<usize>,
}

impl RowLayout {
    pub fn row_count(&self) -> usize {
        self.pending + self.confirmed + usize::from(self.read_marker.is_some())
    }

    /// Index of the first confirmed row, also the number of pending rows.
    pub fn timeline_base(&self) -> usize {
        self.pending
    }

    pub fn resolve(&self, row: usize) -> RowRef {
        debug_assert!(
            row < self.row_count(),
            "row {row} is out of range for {self:?}"
        );
        if row >= self.row_count() {
            return RowRef::Vacant;
        }
        if row < self.pending {
            return RowRef::Pending(row);
        }
        match self.read_marker {
            Some(marker) if marker == row => RowRef::ReadMarker,
            Some(marker) if marker < row => RowRef::Confirmed(row - self.pending - 1),
            _ => RowRef::Confirmed(row - self.pending),
        }
    }

    pub fn pending_row(&self, offset: usize) -> usize {
        debug_assert!(offset < self.pending, "pending offset {offset} out of range");
        offset
    }

    /// Row of the pending event at `queue_position`, counted from the oldest pending event.
    pub fn queued_row(&self, queue_position: usize) -> Option<usize> {
        (queue_position < self.pending).then(|| self.pending - 1 - queue_position)
    }

    pub fn confirmed_row(&self, offset: usize) -> usize {
        debug_assert!(
            offset < self.confirmed,
            "confirmed offset {offset} out of range"
        );
        let row = self.pending + offset;
        match self.read_marker {
            Some(marker) if marker <= row => row + 1,
            _ => row,
        }
    }
}
