//! Inbound message orchestration.
//!
//! Parse the raw payload, resolve the processor from `deviceType`, collect
//! the publications. Errors never propagate past the transport boundary:
//! the caller logs [`HandleError`] and drops the message.

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::models::Publication;
use crate::shift::{self, Shift, ShiftTracker};

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("invalid JSON payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

pub struct MessageHandler {
    dispatcher: Dispatcher,
    isa95_prefix: String,
    shift_tracker: ShiftTracker,
}

impl MessageHandler {
    pub fn new(dispatcher: Dispatcher, isa95_prefix: impl Into<String>) -> Self {
        Self {
            dispatcher,
            isa95_prefix: isa95_prefix.into(),
            shift_tracker: ShiftTracker::new(),
        }
    }

    /// Process one raw payload from the data topic.
    pub fn handle(&self, payload: &str) -> Result<Vec<Publication>, HandleError> {
        let shift_now = shift::current_shift();
        self.handle_at(payload, shift_now)
    }

    /// [`handle`](Self::handle) with an explicit shift, so tests can drive
    /// shift boundaries without touching the wall clock.
    pub fn handle_at(&self, payload: &str, shift_now: Shift) -> Result<Vec<Publication>, HandleError> {
        let msg: Value = serde_json::from_str(payload)?;
        let device_type = msg.get("deviceType").and_then(Value::as_i64).unwrap_or(0);

        if self.shift_tracker.observe(shift_now) {
            info!(turno = shift_now.number(), "shift rolled over");
        }

        Ok(self.dispatcher.process(device_type, &msg, &self.isa95_prefix, shift_now))
    }

    pub fn reset_all(&self) {
        self.dispatcher.reset_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "celima/punta_hermosa/planta/linea";

    fn handler() -> MessageHandler {
        MessageHandler::new(Dispatcher::new(), PREFIX)
    }

    #[test]
    fn test_malformed_payload_is_an_error_not_a_panic() {
        let h = handler();
        assert!(h.handle_at("{not json", Shift::S1).is_err());
        assert!(h.handle_at("", Shift::S1).is_err());
    }

    #[test]
    fn test_missing_device_type_goes_to_default() {
        let h = handler();
        let pubs = h.handle_at(r#"{"cantidad": 3}"#, Shift::S1).unwrap();
        assert_eq!(pubs[0].topic, format!("{PREFIX}/production/line/quantity"));
    }

    #[test]
    fn test_press_messages_flow_end_to_end() {
        let h = handler();
        h.handle_at(
            r#"{"deviceType":1,"lineID":1,"cantidadProductos":10,"tiempoProduccion_ds":100}"#,
            Shift::S1,
        )
        .unwrap();
        let pubs = h
            .handle_at(
                r#"{"deviceType":1,"lineID":1,"cantidadProductos":13,"tiempoProduccion_ds":200}"#,
                Shift::S1,
            )
            .unwrap();
        assert_eq!(pubs.len(), 2);
        let prod: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(prod["cantidadPisadas_turno"], 3);
        assert_eq!(prod["tiempoProduccion_turno_s"], 10);
        assert_eq!(prod["cantidadProductos_turno"], 9);
    }

    #[test]
    fn test_shift_boundary_resets_through_the_handler() {
        let h = handler();
        h.handle_at(r#"{"deviceType":1,"lineID":1,"cantidadProductos":0}"#, Shift::S1)
            .unwrap();
        h.handle_at(r#"{"deviceType":1,"lineID":1,"cantidadProductos":50}"#, Shift::S1)
            .unwrap();

        let pubs = h
            .handle_at(r#"{"deviceType":1,"lineID":1,"cantidadProductos":55}"#, Shift::S2)
            .unwrap();
        let prod: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(prod["cantidadPisadas_turno"], 0);
        assert_eq!(prod["turno"], 2);
    }

    #[test]
    fn test_reset_all_is_exposed_for_administration() {
        let h = handler();
        h.handle_at(r#"{"deviceType":8,"lineID":1,"boxesQ1":4}"#, Shift::S1).unwrap();
        h.reset_all();
        let pubs = h.handle_at(r#"{"deviceType":8,"lineID":1,"boxesQ1":4}"#, Shift::S1).unwrap();
        let out: Value = serde_json::from_str(&pubs[0].payload).unwrap();
        assert_eq!(out["extra_c1"], 4);
    }
}
