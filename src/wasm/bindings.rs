//! JavaScript bindings for a collaborative text replica

use crate::collab::{Collab, CollabConfig};
use crate::editor::{EditorState, ReceiveOptions, Transaction};
use crate::protocol::{InboundBatch, OutboundBatch};
use crate::text::{ReplaceStep, TextDoc};
use wasm_bindgen::prelude::*;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// JavaScript-friendly wrapper for a text replica
#[wasm_bindgen]
pub struct WasmReplica {
    inner: EditorState<ReplaceStep>,
}

#[wasm_bindgen]
impl WasmReplica {
    /// Create a replica (pass JSON config `{version, clientID}` and paragraphs JSON array)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: String, paragraphs_json: String) -> Result<WasmReplica, JsValue> {
        let config: CollabConfig = serde_json::from_str(&config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let paragraphs: Vec<String> = serde_json::from_str(&paragraphs_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid paragraphs: {}", e)))?;
        let doc = TextDoc::from_paragraphs(&paragraphs);
        Ok(Self {
            inner: EditorState::new(doc, Collab::new(config)).with_history(),
        })
    }

    #[wasm_bindgen(js_name = clientId)]
    pub fn client_id(&self) -> u32 {
        self.inner.client_id().value()
    }

    #[wasm_bindgen(js_name = getVersion)]
    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    /// Paragraphs joined with newlines
    #[wasm_bindgen(js_name = toString)]
    pub fn text(&self) -> String {
        self.inner.doc().to_string()
    }

    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&mut self, pos: usize, text: String) -> Result<(), JsValue> {
        let mut tr = self.inner.tr();
        tr.insert_text(pos, &text).map_err(js_error)?;
        self.inner.apply(tr).map_err(js_error)
    }

    #[wasm_bindgen(js_name = delete)]
    pub fn delete(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        let mut tr = self.inner.tr();
        tr.delete(from, to).map_err(js_error)?;
        self.inner.apply(tr).map_err(js_error)
    }

    /// Outbound batch as JSON, or undefined when nothing is pending
    #[wasm_bindgen(js_name = sendableSteps)]
    pub fn sendable_steps(&self) -> Result<Option<String>, JsValue> {
        self.inner
            .sendable_steps()
            .map(|sendable| {
                let batch: OutboundBatch<ReplaceStep> = sendable.to_batch();
                serde_json::to_string(&batch).map_err(js_error)
            })
            .transpose()
    }

    /// Apply an inbound batch (JSON `{version, steps, clientIDs}`)
    #[wasm_bindgen(js_name = receive)]
    pub fn receive(
        &mut self,
        batch_json: String,
        map_selection_backward: bool,
    ) -> Result<(), JsValue> {
        let batch: InboundBatch<ReplaceStep> = serde_json::from_str(&batch_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid batch: {}", e)))?;
        let options = ReceiveOptions {
            map_selection_backward,
        };
        let tr = self.inner.receive_batch(&batch, options).map_err(js_error)?;
        self.inner.apply(tr).map_err(js_error)
    }

    /// Undo the latest local edit; returns false when there is none
    #[wasm_bindgen(js_name = undo)]
    pub fn undo(&mut self) -> Result<bool, JsValue> {
        let tr = self.inner.undo();
        self.apply_optional(tr)
    }

    /// Redo the latest undone edit; returns false when there is none
    #[wasm_bindgen(js_name = redo)]
    pub fn redo(&mut self) -> Result<bool, JsValue> {
        let tr = self.inner.redo();
        self.apply_optional(tr)
    }
}

impl WasmReplica {
    fn apply_optional(&mut self, tr: Option<Transaction<ReplaceStep>>) -> Result<bool, JsValue> {
        match tr {
            Some(tr) => self.inner.apply(tr).map(|()| true).map_err(js_error),
            None => Ok(false),
        }
    }
}
