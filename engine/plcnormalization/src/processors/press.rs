//! Hydraulic press processors (PH_1, PH_2).
//!
//! The press PLCs expose the stroke counter (pisadas), a decisecond
//! production timer, the stop counter and the stop timer. Each stroke
//! presses several pieces at once; the piece factor depends on the press
//! and, for PH_1, on the line's mold.

use serde_json::{json, Value};

use crate::devices::DeviceKind;
use crate::models::{int_or_zero, make_pub, timestamp_device, Publication};
use crate::processors::MessageProcessor;
use crate::shift::Shift;
use crate::statestore::{LineStates, SlotSpec};

static PRESS_SLOTS: &[SlotSpec] = &[
    SlotSpec::w15("cantidadProductos"),
    SlotSpec::w16("tiempoProduccion_ds").scaled(0.1),
    SlotSpec::w15("paradas"),
    SlotSpec::w15("tiempoParadas_s"),
];

/// Pieces pressed per stroke.
#[derive(Debug, Clone, Copy)]
pub enum PieceFactor {
    /// PH_1: depends on the mold installed per line.
    PerLine,
    /// PH_2: same mold on every line.
    Fixed(u64),
}

impl PieceFactor {
    fn pieces_per_stroke(self, line: i64) -> u64 {
        match self {
            PieceFactor::Fixed(n) => n,
            PieceFactor::PerLine => match line {
                1 => 3,
                2 => 3,
                3 => 2,
                4 => 4,
                5 => 2,
                _ => 3,
            },
        }
    }
}

pub struct PressProcessor {
    kind: DeviceKind,
    factor: PieceFactor,
    states: LineStates,
}

impl PressProcessor {
    pub fn ph1() -> Self {
        Self {
            kind: DeviceKind::PrensaHidraulica1,
            factor: PieceFactor::PerLine,
            states: LineStates::new(PRESS_SLOTS),
        }
    }

    pub fn ph2() -> Self {
        Self {
            kind: DeviceKind::PrensaHidraulica2,
            factor: PieceFactor::Fixed(6),
            states: LineStates::new(PRESS_SLOTS),
        }
    }
}

impl MessageProcessor for PressProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let alarms = int_or_zero(msg, "alarms");
        let raws: Vec<i64> = PRESS_SLOTS
            .iter()
            .map(|spec| int_or_zero(msg, spec.field))
            .collect();

        let snaps = self.states.observe(line, shift_now, &raws);
        let (pisadas, prod_time, paradas, stop_time) = (&snaps[0], &snaps[1], &snaps[2], &snaps[3]);

        let pisadas_min = if prod_time.accumulated > 1.0 {
            (pisadas.total() as f64 / (prod_time.accumulated / 60.0)) as u64
        } else {
            0
        };
        let factor = self.factor.pieces_per_stroke(line);

        let alarm_body = json!({
            "alarms": alarms,
            "timestamp_device": timestamp_device(),
        });

        let prod_body = json!({
            "maquina_id": self.kind.machine_id(),
            "turno": shift_now.number(),
            "lineID": line,

            "cantidadProductos_raw": pisadas.raw,
            "cantidadProductos_instantaneo": pisadas.instantaneous,
            "bit15_corruption_cantidadProductos": pisadas.flag_bit,

            "cantidadPisadas_turno": pisadas.total(),
            "cantidadPisadas_min": pisadas_min,
            "cantidadProductos_turno": pisadas.total() * factor,

            "tiempoProduccion_ds_instantaneo": prod_time.instantaneous,
            "tiempoProduccion_turno_s": prod_time.total(),

            "paradas_raw": paradas.raw,
            "paradas_instantaneo": paradas.instantaneous,
            "paradas_turno": paradas.total(),
            "bit15_corruption_paradas": paradas.flag_bit,

            "tiempoParadas_raw": stop_time.raw,
            "tiempoParadas_instantaneo": stop_time.instantaneous,
            "tiempoParadas_turno_s": stop_time.total(),
            "bit15_corruption_tiempoParadas": stop_time.flag_bit,

            "timestamp_device": timestamp_device(),
        });

        let slug = self.kind.slug();
        vec![
            make_pub(format!("{prefix}{line}/{slug}/alarms"), &alarm_body),
            make_pub(format!("{prefix}{line}/{slug}/production"), &prod_body),
        ]
    }

    fn reset(&self) {
        self.states.reset();
    }
}
