//! Dryer processors (EntradaSecador, SalidaSecador).

use serde_json::{json, Value};

use crate::devices::DeviceKind;
use crate::models::{int_or_zero, make_pub, timestamp_device, Publication};
use crate::processors::MessageProcessor;
use crate::shift::Shift;
use crate::statestore::{LineStates, SlotSpec};

// Dryer-entry channels are noisy: both registers keep the MSB flag and
// occasionally jump, so deltas are bounded (no more than 100 starts or
// 30 s of operation per sample interval).
static ENTRADA_SLOTS: &[SlotSpec] = &[
    SlotSpec::w16("arranques").masked().bounded(100),
    SlotSpec::w16("tiempoOperacion_s").masked().bounded(30),
];

static SALIDA_SLOTS: &[SlotSpec] = &[
    SlotSpec::w15("cantidadProductos"),
    SlotSpec::w16("tiempoProduccion_ds").scaled(0.1),
    SlotSpec::w15("paradas"),
    SlotSpec::w15("tiempoParadas_s"),
];

pub struct EntradaSecadorProcessor {
    states: LineStates,
}

impl EntradaSecadorProcessor {
    pub fn new() -> Self {
        Self {
            states: LineStates::new(ENTRADA_SLOTS),
        }
    }
}

impl Default for EntradaSecadorProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor for EntradaSecadorProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let alarms = int_or_zero(msg, "alarms");
        let raws: Vec<i64> = ENTRADA_SLOTS
            .iter()
            .map(|spec| int_or_zero(msg, spec.field))
            .collect();

        let snaps = self.states.observe(line, shift_now, &raws);
        let (arranques, operacion) = (&snaps[0], &snaps[1]);

        let alarm_body = json!({
            "alarms": alarms,
            "timestamp_device": timestamp_device(),
        });

        let prod_body = json!({
            "maquina_id": DeviceKind::EntradaSecador.machine_id(),
            "turno": shift_now.number(),
            "lineID": line,
            "arranques_instantaneo": arranques.instantaneous,
            "cantidad_arranques": arranques.total(),
            "tiempoOperacion_instantaneo": operacion.instantaneous,
            "tiempo_operacion": operacion.total(),
            "timestamp_device": timestamp_device(),
        });

        let slug = DeviceKind::EntradaSecador.slug();
        vec![
            make_pub(format!("{prefix}{line}/{slug}/alarms"), &alarm_body),
            make_pub(format!("{prefix}{line}/{slug}/production"), &prod_body),
        ]
    }

    fn reset(&self) {
        self.states.reset();
    }
}

pub struct SalidaSecadorProcessor {
    states: LineStates,
}

impl SalidaSecadorProcessor {
    pub fn new() -> Self {
        Self {
            states: LineStates::new(SALIDA_SLOTS),
        }
    }
}

impl Default for SalidaSecadorProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor for SalidaSecadorProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let alarms = int_or_zero(msg, "alarms");
        let raws: Vec<i64> = SALIDA_SLOTS
            .iter()
            .map(|spec| int_or_zero(msg, spec.field))
            .collect();

        let snaps = self.states.observe(line, shift_now, &raws);
        let (prod_q, prod_t, stop_q, stop_t) = (&snaps[0], &snaps[1], &snaps[2], &snaps[3]);

        let alarm_body = json!({
            "alarms": alarms,
            "timestamp_device": timestamp_device(),
        });

        let prod_body = json!({
            "maquina_id": DeviceKind::SalidaSecador.machine_id(),
            "turno": shift_now.number(),
            "lineID": line,

            "cantidadProductos_instantaneo": prod_q.instantaneous,
            "cantidad_produccion": prod_q.total(),
            "bit15_corruption_cantidadProductos": prod_q.flag_bit,

            "tiempoProduccion_ds_instantaneo": prod_t.instantaneous,
            "tiempo_produccion": prod_t.total(),

            "paradas_instantaneo": stop_q.instantaneous,
            "cantidad_paradas": stop_q.total(),
            "bit15_corruption_paradas": stop_q.flag_bit,

            "tiempoParadas_instantaneo": stop_t.instantaneous,
            "tiempo_paradas": stop_t.total(),
            "bit15_corruption_tiempoParadas": stop_t.flag_bit,

            "timestamp_device": timestamp_device(),
        });

        let slug = DeviceKind::SalidaSecador.slug();
        vec![
            make_pub(format!("{prefix}{line}/{slug}/alarms"), &alarm_body),
            make_pub(format!("{prefix}{line}/{slug}/production"), &prod_body),
        ]
    }

    fn reset(&self) {
        self.states.reset();
    }
}
