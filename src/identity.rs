//! Replica and transaction identity
//!
//! A [`ClientId`] tags every step a replica sends so the replica can recognize
//! its own steps when they come back confirmed. It is drawn once per session
//! from a uniform distribution over the 32-bit range. Two replicas drawing the
//! same id would each mistake the other's steps for their own; that collision
//! risk is accepted, not detected.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-session replica identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u32);

impl ClientId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Draw an id from the given random source
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen())
    }

    /// Draw an id from the thread-local generator
    pub fn random() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for ClientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies the transaction a local step originated from
///
/// Kept alongside unconfirmed steps so hosts can look up metadata such as
/// timestamps for steps that have since been rebased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
