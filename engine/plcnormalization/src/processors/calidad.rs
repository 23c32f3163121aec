//! Quality station processor (Calidad).
//!
//! Unlike the machine PLCs, the station reports pre-aggregated interval
//! counts (one message every ~3 minutes), so there is no wrap arithmetic:
//! incoming integers add directly to the per-shift accumulators. The
//! legacy firmware emitted one message per classified box instead; both
//! formats are accepted.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};
use tracing::debug;

use crate::devices::DeviceKind;
use crate::models::{int_or_zero, make_pub, opt_int, timestamp_device, Publication};
use crate::processors::MessageProcessor;
use crate::shift::Shift;

#[derive(Default)]
struct LineTotals {
    q1: u64,
    q2: u64,
    q6: u64,
    discarded: u64,
    shift: Option<Shift>,
}

/// Interval counts extracted from one message, whichever format it used.
#[derive(Debug, Default, PartialEq, Eq)]
struct BoxCounts {
    q1: u64,
    q2: u64,
    q6: u64,
    broken: u64,
}

fn extract_counts(msg: &Value) -> BoxCounts {
    // New format: accumulated 3-minute interval counts.
    if msg.get("boxesQ1").is_some() {
        return BoxCounts {
            q1: int_or_zero(msg, "boxesQ1").max(0) as u64,
            q2: int_or_zero(msg, "boxesQ2").max(0) as u64,
            q6: int_or_zero(msg, "boxesQ6").max(0) as u64,
            broken: int_or_zero(msg, "totalBroken").max(0) as u64,
        };
    }

    // Legacy format: one box per message, classified by quality code.
    let mut counts = BoxCounts::default();
    if let Some(code) = opt_int(msg, "cajaCalidad") {
        match code {
            1 => counts.q1 = 1,
            2 => counts.q2 = 1,
            6 => counts.q6 = 1,
            other => debug!(code = other, "calidad: unknown quality code, skipping"),
        }
        let broken = opt_int(msg, "quebrados").unwrap_or_else(|| int_or_zero(msg, "quebrado"));
        if broken > 0 {
            counts.broken = broken as u64;
        }
    }
    counts
}

pub struct CalidadProcessor {
    lines: Mutex<HashMap<i64, LineTotals>>,
}

impl CalidadProcessor {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for CalidadProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor for CalidadProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let counts = extract_counts(msg);

        let (q1, q2, q6, discarded) = {
            let mut lines = self.lines.lock().expect("calidad state mutex poisoned");
            let totals = lines.entry(line).or_default();

            if totals.shift != Some(shift_now) {
                *totals = LineTotals {
                    shift: Some(shift_now),
                    ..LineTotals::default()
                };
            }

            totals.q1 += counts.q1;
            totals.q2 += counts.q2;
            totals.q6 += counts.q6;
            totals.discarded += counts.broken;

            (totals.q1, totals.q2, totals.q6, totals.discarded)
        };

        let body = json!({
            "maquina_id": DeviceKind::Calidad.machine_id(),
            "turno": shift_now.number(),
            "lineID": line,
            "extra_c1": q1,
            "extra_c2": q2,
            "comercial": q6,
            "quebrados": discarded,
            "timestamp_device": timestamp_device(),
        });

        let slug = DeviceKind::Calidad.slug();
        vec![make_pub(format!("{prefix}{line}/{slug}/production"), &body)]
    }

    fn reset(&self) {
        self.lines.lock().expect("calidad state mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "celima/site/plant/linea";

    fn payload(pubs: &[Publication]) -> Value {
        assert_eq!(pubs.len(), 1, "calidad produces only a production record");
        serde_json::from_str(&pubs[0].payload).unwrap()
    }

    #[test]
    fn test_interval_counts_accumulate_from_first_message() {
        let proc = CalidadProcessor::new();
        let msg = json!({"deviceType": 8, "lineID": 3, "boxesQ1": 10, "boxesQ2": 5, "boxesQ6": 2, "totalBroken": 3});

        proc.process(&msg, PREFIX, Shift::S1);
        let out = payload(&proc.process(&msg, PREFIX, Shift::S1));
        assert_eq!(out["extra_c1"], 20);
        assert_eq!(out["extra_c2"], 10);
        assert_eq!(out["comercial"], 4);
        assert_eq!(out["quebrados"], 6);
        assert_eq!(out["maquina_id"], 8);
    }

    #[test]
    fn test_legacy_single_box_events() {
        let proc = CalidadProcessor::new();
        let msg = json!({"deviceType": 8, "lineID": 1, "cajaCalidad": 2, "quebrados": 1});

        proc.process(&msg, PREFIX, Shift::S2);
        proc.process(&msg, PREFIX, Shift::S2);
        let out = payload(&proc.process(&msg, PREFIX, Shift::S2));
        assert_eq!(out["extra_c1"], 0);
        assert_eq!(out["extra_c2"], 3);
        assert_eq!(out["comercial"], 0);
        assert_eq!(out["quebrados"], 3);
    }

    #[test]
    fn test_legacy_misspelled_broken_field() {
        let proc = CalidadProcessor::new();
        let out = payload(&proc.process(
            &json!({"lineID": 1, "cajaCalidad": 6, "quebrado": 2}),
            PREFIX,
            Shift::S1,
        ));
        assert_eq!(out["comercial"], 1);
        assert_eq!(out["quebrados"], 2);
    }

    #[test]
    fn test_unknown_quality_code_is_suppressed() {
        let proc = CalidadProcessor::new();
        let out = payload(&proc.process(
            &json!({"lineID": 1, "cajaCalidad": 4}),
            PREFIX,
            Shift::S1,
        ));
        assert_eq!(out["extra_c1"], 0);
        assert_eq!(out["extra_c2"], 0);
        assert_eq!(out["comercial"], 0);
    }

    #[test]
    fn test_shift_change_resets_totals() {
        let proc = CalidadProcessor::new();
        let msg = json!({"lineID": 2, "boxesQ1": 7});
        proc.process(&msg, PREFIX, Shift::S1);
        let out = payload(&proc.process(&msg, PREFIX, Shift::S2));
        // The shift-opening message still contributes its own counts.
        assert_eq!(out["extra_c1"], 7);
        assert_eq!(out["turno"], 2);
    }

    #[test]
    fn test_lines_do_not_share_totals() {
        let proc = CalidadProcessor::new();
        proc.process(&json!({"lineID": 1, "boxesQ1": 5}), PREFIX, Shift::S1);
        let out = payload(&proc.process(&json!({"lineID": 2, "boxesQ1": 1}), PREFIX, Shift::S1));
        assert_eq!(out["extra_c1"], 1);
    }
}
