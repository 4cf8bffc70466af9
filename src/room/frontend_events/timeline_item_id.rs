use matrix_sdk::ruma::{OwnedEventId, OwnedTransactionId};
use serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeStruct};
use serde_json::Value;

/// Identifies the event behind a row: its event id once confirmed, its
/// transaction id while it is a local echo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowItemId {
    EventId(OwnedEventId),
    TransactionId(OwnedTransactionId),
}

impl RowItemId {
    pub fn is_local(&self) -> bool {
        matches!(self, Self::TransactionId(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::EventId(id) => id.as_str(),
            Self::TransactionId(id) => id.as_str(),
        }
    }
}

impl Serialize for RowItemId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("RowItemId", 2)?;
        state.serialize_field("timelineItemId", self.as_str())?;
        state.serialize_field("isLocal", &self.is_local())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for RowItemId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let id = value
            .get("timelineItemId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| serde::de::Error::missing_field("timelineItemId"))?;

        let is_local = value
            .get("isLocal")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| serde::de::Error::missing_field("isLocal"))?;

        if is_local {
            Ok(Self::TransactionId(OwnedTransactionId::from(id)))
        } else {
            let owned_id = OwnedEventId::try_from(id).map_err(serde::de::Error::custom)?;
            Ok(Self::EventId(owned_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_local_and_remote_ids() {
        let remote: RowItemId = serde_json::from_str(
            r#"{ "timelineItemId": "$153456789:example.org", "isLocal": false }"#,
        )
        .expect("remote id should parse");
        assert_eq!(remote.as_str(), "$153456789:example.org");
        assert!(!remote.is_local());

        let local: RowItemId =
            serde_json::from_str(r#"{ "timelineItemId": "txn-1", "isLocal": true }"#)
                .expect("local id should parse");
        assert!(matches!(local, RowItemId::TransactionId(_)));
    }

    #[test]
    fn rejects_malformed_event_ids() {
        let err = serde_json::from_str::<RowItemId>(
            r#"{ "timelineItemId": "not-an-event-id", "isLocal": false }"#,
        );
        assert!(err.is_err());

        let err = serde_json::from_str::<RowItemId>(r#"{ "timelineItemId": "$a:b" }"#);
        assert!(err.is_err());
    }

    #[test]
    fn serializes_with_locality_flag() {
        let id = RowItemId::TransactionId(OwnedTransactionId::from("txn-2"));
        let json = serde_json::to_value(&id).expect("serializable");
        assert_eq!(json["timelineItemId"], "txn-2");
        assert_eq!(json["isLocal"], true);
    }
}
