//! Pass-through processor for unknown device types.
//!
//! Keeps no state: it forwards a light summary with the observed document
//! attached so downstream can still see what an unprovisioned PLC sent.

use serde_json::{json, Value};

use crate::models::{int_or_zero, make_pub, opt_str, Publication};
use crate::processors::MessageProcessor;
use crate::shift::Shift;

pub struct DefaultProcessor;

impl MessageProcessor for DefaultProcessor {
    fn process(&self, msg: &Value, prefix: &str, _shift_now: Shift) -> Vec<Publication> {
        let ts = chrono::Utc::now().timestamp();

        let mut quantity_body = json!({
            "source": "celima/data",
            "quantity": int_or_zero(msg, "cantidad"),
            "observed": msg,
            "ts": ts,
        });
        if let Some(dev_eui) = opt_str(msg, "devEUI") {
            quantity_body["devEUI"] = json!(dev_eui);
        }
        if let Some(name) = opt_str(msg, "deviceName") {
            quantity_body["deviceName"] = json!(name);
        }
        if let Some(device_type) = msg.get("deviceType") {
            quantity_body["deviceType"] = device_type.clone();
        }

        let alarms_body = json!({
            "alarms": int_or_zero(msg, "alarms"),
            "ts": ts,
        });

        vec![
            make_pub(format!("{prefix}/production/line/quantity"), &quantity_body),
            make_pub(format!("{prefix}/quality/alarms"), &alarms_body),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forwards_summary() {
        let msg = json!({"deviceType": 42, "deviceName": "lora-bridge", "cantidad": 9, "alarms": 1});
        let pubs = DefaultProcessor.process(&msg, "celima/site", Shift::S1);
        assert_eq!(pubs.len(), 2);
        assert_eq!(pubs[0].topic, "celima/site/production/line/quantity");
        assert_eq!(pubs[1].topic, "celima/site/quality/alarms");

        let quantity: Value = serde_json::from_str(&pubs[0].payload).unwrap();
        assert_eq!(quantity["quantity"], 9);
        assert_eq!(quantity["deviceType"], 42);
        assert_eq!(quantity["deviceName"], "lora-bridge");
        assert_eq!(quantity["observed"]["cantidad"], 9);

        let alarms: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(alarms["alarms"], 1);
    }

    #[test]
    fn test_default_keeps_no_state() {
        let msg = json!({"cantidad": 5});
        let first = DefaultProcessor.process(&msg, "p", Shift::S1);
        let second = DefaultProcessor.process(&msg, "p", Shift::S1);
        let a: Value = serde_json::from_str(&first[0].payload).unwrap();
        let b: Value = serde_json::from_str(&second[0].payload).unwrap();
        assert_eq!(a["quantity"], b["quantity"]);
    }
}
