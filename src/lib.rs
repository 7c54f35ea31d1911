//! SyncKit Collab - Central-authority collaborative editing core
//!
//! This crate is the replica side of a collaborative editing protocol in
//! which a central authority puts every confirmed step in one total order.
//! It implements:
//! - Tracking of local steps not yet confirmed by the authority
//! - Rebasing of those steps over newly confirmed steps
//! - The send/receive pair driving the replica's collaboration state
//! - Position mapping with mirror links, so rebased content keeps its place
//! - An undo history that keeps remote steps out of local undo
//!
//! The document model is pluggable through the [`Step`] trait; the `text`
//! feature (on by default) provides a paragraph/character model.
//!
//! # Examples
//!
//! ```rust
//! use synckit_collab::{ClientId, Collab, CollabConfig, EditorState, ReceiveOptions};
//! use synckit_collab::text::TextDoc;
//!
//! let collab_a = Collab::new(CollabConfig::with_client_id(ClientId::new(1)));
//! let collab_b = Collab::new(CollabConfig::with_client_id(ClientId::new(2)));
//! let mut a = EditorState::new(TextDoc::new(), collab_a);
//! let mut b = EditorState::new(TextDoc::new(), collab_b);
//!
//! // Both replicas type concurrently
//! let mut tr = a.tr();
//! tr.insert_text(1, "hi").unwrap();
//! a.apply(tr).unwrap();
//! let mut tr = b.tr();
//! tr.insert_text(1, "ok").unwrap();
//! b.apply(tr).unwrap();
//!
//! // The authority confirms A's step first
//! let confirmed = a.sendable_steps().unwrap().steps;
//! let ids = vec![a.client_id(); confirmed.len()];
//! for state in [&mut a, &mut b] {
//!     let tr = state.receive_transaction(&confirmed, &ids, ReceiveOptions::default()).unwrap();
//!     state.apply(tr).unwrap();
//! }
//!
//! // B's step is rebased on top and gets confirmed next
//! let confirmed = b.sendable_steps().unwrap().steps;
//! let ids = vec![b.client_id(); confirmed.len()];
//! for state in [&mut a, &mut b] {
//!     let tr = state.receive_transaction(&confirmed, &ids, ReceiveOptions::default()).unwrap();
//!     state.apply(tr).unwrap();
//! }
//!
//! assert_eq!(a.doc(), b.doc());
//! assert_eq!(a.doc().to_string(), "hiok");
//! ```

pub mod collab;
pub mod editor;
pub mod error;
pub mod history;
pub mod identity;
pub mod mapping;
pub mod protocol;
pub mod step;
pub mod transform;

#[cfg(feature = "text")]
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use collab::{Collab, CollabConfig, CollabState, Rebaseable, SendableSteps};
pub use editor::{EditorState, ReceiveOptions, Selection, Transaction};
pub use error::{Result, StepError, SyncError};
pub use identity::{ClientId, TransactionId};
pub use mapping::{Mappable, Mapping};
pub use protocol::{InboundBatch, OutboundBatch};
pub use step::Step;
pub use transform::Transform;
