//! Serialization layer - Convert batches to/from JSON
//!
//! This module provides conversion between the batch types and the JSON
//! message format used for network transmission.

use crate::error::{Result, SyncError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize any protocol message to bytes
pub fn encode_message<M: Serialize>(msg: &M) -> Result<Vec<u8>> {
    serde_json::to_vec(msg)
        .map_err(|e| SyncError::Protocol(format!("Failed to encode message: {}", e)))
}

/// Deserialize a protocol message from bytes
pub fn decode_message<M: DeserializeOwned>(bytes: &[u8]) -> Result<M> {
    serde_json::from_slice(bytes)
        .map_err(|e| SyncError::Protocol(format!("Failed to decode message: {}", e)))
}

#[cfg(all(test, feature = "text"))]
mod tests {
    use super::*;
    use crate::identity::ClientId;
    use crate::protocol::{InboundBatch, OutboundBatch};
    use crate::text::ReplaceStep;

    #[test]
    fn test_outbound_field_names() {
        let batch = OutboundBatch {
            version: 4,
            steps: vec![ReplaceStep::insert_text(1, "a")],
            client_id: ClientId::new(17),
        };
        let json: serde_json::Value =
            serde_json::from_slice(&encode_message(&batch).unwrap()).unwrap();

        assert_eq!(json["version"], 4);
        assert_eq!(json["clientID"], 17);
        assert_eq!(json["steps"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_inbound_from_json() {
        let bytes = br#"{
            "version": 2,
            "steps": [{"from": 1, "to": 3, "slice": []}],
            "clientIDs": [5]
        }"#;
        let batch: InboundBatch<ReplaceStep> = decode_message(bytes).unwrap();

        assert_eq!(batch.version, 2);
        assert_eq!(batch.steps, vec![ReplaceStep::delete(1, 3)]);
        assert_eq!(batch.client_ids, vec![ClientId::new(5)]);
        assert_eq!(batch.end_version(), 3);
    }

    #[test]
    fn test_decode_garbage() {
        let result: Result<InboundBatch<ReplaceStep>> = decode_message(b"not json");
        match result {
            Err(err @ SyncError::Protocol(_)) => {
                assert!(err.to_string().starts_with("Protocol error: Failed to decode message"));
            }
            other => panic!("expected a protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_wrong_shape() {
        // Valid JSON, but the client ids are missing
        let bytes = br#"{"version": 0, "steps": []}"#;
        let result: Result<InboundBatch<ReplaceStep>> = decode_message(bytes);
        assert!(matches!(result, Err(SyncError::Protocol(_))));
    }
}
