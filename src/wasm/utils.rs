//! WASM utility functions

use crate::identity::ClientId;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in browser
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Random client id, for hosts that pick one before the authority handshake
#[wasm_bindgen(js_name = generateClientId)]
pub fn generate_client_id() -> u32 {
    ClientId::random().value()
}
