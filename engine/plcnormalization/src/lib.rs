//! Telemetry normalization core for the Celima tile plant.
//!
//! Converts raw PLC counter snapshots (truncated 15/16-bit registers with a
//! shared flag bit) into monotonic per-shift accumulators and republishes
//! them as ISA-95 production/alarm records. Transport-agnostic: the MQTT
//! client lives in the gateway crate and only sees [`Publication`] values.

pub mod counters;
pub mod devices;
pub mod dispatcher;
pub mod handler;
pub mod models;
pub mod processors;
pub mod shift;
pub mod statestore;

pub use dispatcher::Dispatcher;
pub use handler::{HandleError, MessageHandler};
pub use models::Publication;
pub use shift::Shift;
