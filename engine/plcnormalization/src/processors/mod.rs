//! Per-device-kind message processors.
//!
//! Every stateful processor follows the same structure: read the raw
//! fields, fold them into its [`LineStates`](crate::statestore::LineStates)
//! under that kind's mutex, copy the slot snapshots out, and build the
//! alarm/production payloads outside the lock.

use serde_json::Value;

use crate::models::Publication;
use crate::shift::Shift;

mod calidad;
mod default;
mod esmalte;
mod horno;
mod press;
mod secador;

pub use calidad::CalidadProcessor;
pub use default::DefaultProcessor;
pub use esmalte::EsmalteProcessor;
pub use horno::{EntradaHornoProcessor, SalidaHornoProcessor};
pub use press::PressProcessor;
pub use secador::{EntradaSecadorProcessor, SalidaSecadorProcessor};

/// Processor contract. `shift_now` is classified once per message by the
/// handler and injected so tests can drive shift boundaries directly.
pub trait MessageProcessor: Send + Sync {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication>;

    /// Drop all accumulated line state. Administrative/test path.
    fn reset(&self) {}
}
