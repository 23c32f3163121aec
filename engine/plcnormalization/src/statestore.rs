//! Per-device, per-line accumulator state.
//!
//! Each device kind owns one [`LineStates`] map guarded by its own mutex,
//! so processors of different kinds run in parallel. Inside the lock only
//! masked-value copies, delta math and additions happen; JSON building and
//! I/O stay outside.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::counters::{self, CounterWidth};
use crate::shift::Shift;

/// Static description of one named PLC counter field.
pub struct SlotSpec {
    /// JSON field carrying the raw register snapshot.
    pub field: &'static str,
    /// Modulus for the wrap-around delta.
    pub width: CounterWidth,
    /// Strip the MSB flag before any arithmetic.
    pub masked: bool,
    /// Deltas above this are channel noise and contribute 0.
    pub max_plausible: Option<u16>,
    /// Multiplier applied to each accepted delta (0.1 for ds -> s).
    pub scale: f64,
}

impl SlotSpec {
    pub const fn w15(field: &'static str) -> SlotSpec {
        SlotSpec {
            field,
            width: CounterWidth::W15,
            masked: true,
            max_plausible: None,
            scale: 1.0,
        }
    }

    pub const fn w16(field: &'static str) -> SlotSpec {
        SlotSpec {
            field,
            width: CounterWidth::W16,
            masked: false,
            max_plausible: None,
            scale: 1.0,
        }
    }

    pub const fn scaled(mut self, scale: f64) -> SlotSpec {
        self.scale = scale;
        self
    }

    pub const fn bounded(mut self, max_plausible: u16) -> SlotSpec {
        self.max_plausible = Some(max_plausible);
        self
    }

    pub const fn masked(mut self) -> SlotSpec {
        self.masked = true;
        self
    }

    fn masked_value(&self, raw: i64) -> u16 {
        if self.masked {
            counters::mask15(raw)
        } else {
            raw as u16
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    last_raw: u16,
    accumulated: f64,
    flag_bit: bool,
}

/// Accumulator state for one (device kind, line) pair. Created lazily on
/// the first message, reset in place at shift boundaries, never destroyed.
#[derive(Default)]
pub struct DeviceState {
    shift_snapshot: Option<Shift>,
    slots: Vec<SlotState>,
}

/// Copy of one slot taken under the lock, used to build output payloads.
#[derive(Debug, Clone, Copy)]
pub struct SlotSnapshot {
    /// Raw wire value, unmasked.
    pub raw: i64,
    /// Masked current value (`_instantaneo`).
    pub instantaneous: u16,
    /// Pre-mask high bit of this message (`bit15_corruption_*`).
    pub flag_bit: bool,
    /// Shift accumulator after applying this message (`_turno`).
    pub accumulated: f64,
}

impl SlotSnapshot {
    /// Accumulated value truncated for integer-count slots.
    pub fn total(&self) -> u64 {
        self.accumulated as u64
    }
}

impl DeviceState {
    /// Fold one message into the state: seed on the first message or on a
    /// shift change (no delta accumulates from the seeding message),
    /// otherwise advance every slot by its safe modular delta.
    pub fn apply(&mut self, specs: &[SlotSpec], shift_now: Shift, raws: &[i64]) -> Vec<SlotSnapshot> {
        debug_assert_eq!(specs.len(), raws.len());

        if self.shift_snapshot != Some(shift_now) || self.slots.len() != specs.len() {
            self.slots = specs
                .iter()
                .zip(raws)
                .map(|(spec, &raw)| SlotState {
                    last_raw: spec.masked_value(raw),
                    accumulated: 0.0,
                    flag_bit: spec.masked && counters::high_bit_set(raw),
                })
                .collect();
            self.shift_snapshot = Some(shift_now);
        } else {
            for ((spec, slot), &raw) in specs.iter().zip(&mut self.slots).zip(raws) {
                let curr = spec.masked_value(raw);
                let d = counters::safe_delta(slot.last_raw, curr, spec.width, spec.max_plausible);
                slot.accumulated += d as f64 * spec.scale;
                slot.last_raw = curr;
                slot.flag_bit = spec.masked && counters::high_bit_set(raw);
            }
        }

        specs
            .iter()
            .zip(&self.slots)
            .zip(raws)
            .map(|((spec, slot), &raw)| SlotSnapshot {
                raw,
                instantaneous: spec.masked_value(raw),
                flag_bit: slot.flag_bit,
                accumulated: slot.accumulated,
            })
            .collect()
    }
}

/// `line_id -> DeviceState` for one device kind, behind that kind's mutex.
pub struct LineStates {
    specs: &'static [SlotSpec],
    lines: Mutex<HashMap<i64, DeviceState>>,
}

impl LineStates {
    pub fn new(specs: &'static [SlotSpec]) -> Self {
        Self {
            specs,
            lines: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against the (lazily created) state of one line. `f` must not
    /// perform I/O or call into another processor.
    pub fn with_state<R>(&self, line: i64, f: impl FnOnce(&mut DeviceState) -> R) -> R {
        let mut lines = self.lines.lock().expect("line state mutex poisoned");
        f(lines.entry(line).or_default())
    }

    /// Apply one message's raw values under the lock and copy the slot
    /// snapshots out.
    pub fn observe(&self, line: i64, shift_now: Shift, raws: &[i64]) -> Vec<SlotSnapshot> {
        self.with_state(line, |st| st.apply(self.specs, shift_now, raws))
    }

    /// Drop all per-line state for this kind.
    pub fn reset(&self) {
        self.lines.lock().expect("line state mutex poisoned").clear();
    }
}
