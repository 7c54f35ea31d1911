//! Wire format between a replica and the central authority
//!
//! The transport is up to the host; these types only fix the shape of the
//! messages:
//!
//! - **Outbound** `{version, steps, clientID}`: the replica's unconfirmed
//!   steps, valid against the document at `version`.
//! - **Inbound** `{version, steps, clientIDs}`: the next contiguous range of
//!   confirmed steps starting at `version`, with the replica each came from.

pub mod serialize;

pub use serialize::{decode_message, encode_message};

use crate::identity::ClientId;
use serde::{Deserialize, Serialize};

/// Unconfirmed steps offered to the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundBatch<S> {
    pub version: u64,
    pub steps: Vec<S>,
    #[serde(rename = "clientID")]
    pub client_id: ClientId,
}

/// Confirmed steps pushed to a replica
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundBatch<S> {
    /// Version the first step applies at
    pub version: u64,
    pub steps: Vec<S>,
    #[serde(rename = "clientIDs")]
    pub client_ids: Vec<ClientId>,
}

impl<S> InboundBatch<S> {
    /// Version after the batch is applied
    pub fn end_version(&self) -> u64 {
        self.version + self.steps.len() as u64
    }
}
