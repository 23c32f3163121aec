//! Wire-side types shared by the processors and the transport.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// One outbound record. The transport publishes these QoS 1, non-retained,
/// in the order a processor returned them.
#[derive(Debug, Clone, Serialize)]
pub struct Publication {
    pub topic: String,
    /// Serialized JSON payload.
    pub payload: String,
}

pub fn make_pub(topic: String, body: &Value) -> Publication {
    Publication {
        topic,
        payload: body.to_string(),
    }
}

/// `timestamp_device`: ISO-8601 UTC with millisecond precision, assigned
/// fresh on each emission.
pub fn timestamp_device() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Integer field with the PLC convention that a missing counter reads 0.
pub fn int_or_zero(msg: &Value, field: &str) -> i64 {
    msg.get(field).and_then(Value::as_i64).unwrap_or(0)
}

pub fn opt_int(msg: &Value, field: &str) -> Option<i64> {
    msg.get(field).and_then(Value::as_i64)
}

pub fn opt_str<'a>(msg: &'a Value, field: &str) -> Option<&'a str> {
    msg.get(field).and_then(Value::as_str)
}
