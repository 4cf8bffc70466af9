use matrix_sdk::ruma::{OwnedUserId, UserId};
use serde::Serialize;

/// How many readers are listed on a row before the rest is only counted.
pub const MAX_SHOWN_READERS: usize = 5;

/// Other users whose read receipt sits on a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceiptSummary {
    pub readers: Vec<OwnedUserId>,
    /// Readers not listed in `readers`.
    pub excess: usize,
}

impl ReadReceiptSummary {
    /// Keeps the first readers, skipping the local user.
    pub fn from_readers(readers: Vec<OwnedUserId>, local_user: &UserId) -> Self {
        let mut others: Vec<OwnedUserId> = readers
            .into_iter()
            .filter(|reader| &**reader != local_user)
            .collect();
        let excess = others.len().saturating_sub(MAX_SHOWN_READERS);
        others.truncate(MAX_SHOWN_READERS);
        Self {
            readers: others,
            excess,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// "+N" label for the readers that are not listed.
    pub fn excess_label(&self) -> Option<String> {
        (self.excess > 0).then(|| format!("+{}", self.excess))
    }
}
