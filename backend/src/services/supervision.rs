//! Panic containment at actor message boundaries

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Human readable text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one message handler, returning the panic text if it unwound.
///
/// Callers throw away whatever state the handler may have left half-updated.
pub fn supervise<F: FnOnce()>(handler: F) -> Result<(), String> {
    panic::catch_unwind(AssertUnwindSafe(handler)).map_err(|payload| panic_message(&*payload))
}
