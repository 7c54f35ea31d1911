//! WASM bindings for SyncKit Collab
//!
//! This module provides JavaScript-friendly bindings for a collaborative
//! text replica.

#[cfg(feature = "wasm")]
pub mod bindings;

#[cfg(feature = "wasm")]
pub mod utils;

// Re-export main types
#[cfg(feature = "wasm")]
pub use bindings::WasmReplica;
