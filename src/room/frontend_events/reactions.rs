use matrix_sdk::ruma::{OwnedUserId, UserId};
use serde::Serialize;

use crate::models::events::ReactionsByKey;

/// All senders that reacted to an event with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionGroup {
    pub key: String,
    /// The label of the reaction bubble, with the count once several users reacted.
    pub text: String,
    pub senders: Vec<OwnedUserId>,
    pub has_local_user: bool,
}

impl ReactionGroup {
    pub fn count(&self) -> usize {
        self.senders.len()
    }
}

/// The reactions of a row, grouped by key in the order keys were first used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReactionSummary(pub Vec<ReactionGroup>);

impl ReactionSummary {
    pub fn from_reactions(reactions: &ReactionsByKey, local_user: &UserId) -> Self {
        let groups = reactions
            .iter()
            .filter(|(_, senders)| !senders.is_empty())
            .map(|(key, senders)| ReactionGroup {
                key: key.clone(),
                text: if senders.len() > 1 {
                    format!("{key}  {}", senders.len())
                } else {
                    key.clone()
                },
                has_local_user: senders.iter().any(|sender| &**sender == local_user),
                senders: senders.iter().cloned().collect(),
            })
            .collect();
        Self(groups)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&ReactionGroup> {
        self.0.iter().find(|group| group.key == key)
    }
}
