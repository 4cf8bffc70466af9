use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// The row attributes a [`ContentRefresh`] invalidates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RowRoles: u32 {
        const DISPLAY = 1 << 0;
        const AUTHOR = 1 << 1;
        const SHOW_AUTHOR = 1 << 2;
        const SHOW_SECTION = 1 << 3;
        const TIME = 1 << 4;
        const IS_PENDING = 1 << 5;
        const STATUS = 1 << 6;
        const REACTIONS = 1 << 7;
        const REDACTED = 1 << 8;
        const EDITED = 1 << 9;
        const REPLY = 1 << 10;
        const PROGRESS = 1 << 11;
        const READ_RECEIPTS = 1 << 12;
    }
}

/// A change of row identity or row count.
///
/// Indices of `Insert` and `Remove` refer to the list before the edit. For `Move`,
/// `from` refers to the list before the edit and `to` is the index the first moved
/// row ends up at once the edit is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum StructuralEdit {
    Insert { at: usize, count: usize },
    Remove { at: usize, count: usize },
    Move { from: usize, count: usize, to: usize },
}

/// Attributes of rows `first_row..=last_row` changed; row count and identity did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRefresh {
    pub first_row: usize,
    pub last_row: usize,
    pub roles: RowRoles,
}

impl ContentRefresh {
    pub fn row(row: usize, roles: RowRoles) -> Self {
        Self {
            first_row: row,
            last_row: row,
            roles,
        }
    }

    pub fn contains(&self, row: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
    }
}

/// Model-wide flags the view uses for its loading indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    /// A back pagination is running.
    pub loading: bool,
    /// The beginning of the room was reached, there is nothing older to load.
    pub history_exhausted: bool,
    /// The last back pagination failed with the given error.
    pub backfill_error: Option<String>,
}

/// Everything the projection reports to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    /// Everything was replaced; the view must re-read all rows.
    Reset { row_count: usize },
    Structural(StructuralEdit),
    Refresh(ContentRefresh),
    Status(ModelStatus),
}

impl ModelChange {
    pub fn as_structural(&self) -> Option<&StructuralEdit> {
        match self {
            Self::Structural(edit) => Some(edit),
            _ => None,
        }
    }

    pub fn as_refresh(&self) -> Option<&ContentRefresh> {
        match self {
            Self::Refresh(refresh) => Some(refresh),
            _ => None,
        }
    }
}
