//! Kiln processors (EntradaHorno, SalidaHorno).

use serde_json::{json, Value};

use crate::devices::DeviceKind;
use crate::models::{int_or_zero, make_pub, timestamp_device, Publication};
use crate::processors::MessageProcessor;
use crate::shift::Shift;
use crate::statestore::{LineStates, SlotSpec};

// Every kiln-entry register keeps the MSB flag, including the timers, and
// the channel is noisy enough that all deltas carry plausibility bounds.
static ENTRADA_SLOTS: &[SlotSpec] = &[
    SlotSpec::w15("cantidad").bounded(200),
    SlotSpec::w15("paradas").bounded(50),
    SlotSpec::w15("fallaHorno").bounded(20),
    SlotSpec::w15("tiempoProduccion_ds").bounded(250).scaled(0.1),
    SlotSpec::w15("tiempoParadas_s").bounded(30),
    SlotSpec::w15("tiempoFalla_s").bounded(30),
];

// Kiln-exit flow counters. timer1Hz is the 1 Hz heartbeat that doubles as
// the operation-time source.
static SALIDA_SLOTS: &[SlotSpec] = &[
    SlotSpec::w15("bancalinos0"),
    SlotSpec::w15("bancalinos1"),
    SlotSpec::w15("bancalinosComb1"),
    SlotSpec::w15("bancalinosComb2"),
    SlotSpec::w15("bancalinosTotal"),
    SlotSpec::w15("cambioBarrera"),
    SlotSpec::w15("cambioBarreraTotal"),
    SlotSpec::w15("cambioSentido"),
    SlotSpec::w15("cambioSentidoTotal"),
    SlotSpec::w15("cantidad"),
    SlotSpec::w15("cantidad_total"),
    SlotSpec::w15("paradas_1"),
    SlotSpec::w15("paradas_2"),
    SlotSpec::w16("timer1Hz"),
];

pub struct EntradaHornoProcessor {
    states: LineStates,
}

impl EntradaHornoProcessor {
    pub fn new() -> Self {
        Self {
            states: LineStates::new(ENTRADA_SLOTS),
        }
    }
}

impl Default for EntradaHornoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor for EntradaHornoProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let alarms = int_or_zero(msg, "alarms");
        let raws: Vec<i64> = ENTRADA_SLOTS
            .iter()
            .map(|spec| int_or_zero(msg, spec.field))
            .collect();

        let snaps = self.states.observe(line, shift_now, &raws);
        let (prod_q, stop_q, falla_q) = (&snaps[0], &snaps[1], &snaps[2]);
        let (prod_t, stop_t, falla_t) = (&snaps[3], &snaps[4], &snaps[5]);

        let alarm_body = json!({
            "alarms": alarms,
            "timestamp_device": timestamp_device(),
        });

        let prod_body = json!({
            "maquina_id": DeviceKind::EntradaHorno.machine_id(),
            "turno": shift_now.number(),
            "lineID": line,

            "cantidad_instantaneo": prod_q.instantaneous,
            "cantidad_produccion": prod_q.total(),
            "bit15_corruption_cantidad": prod_q.flag_bit,

            "paradas_instantaneo": stop_q.instantaneous,
            "cantidad_paradas": stop_q.total(),
            "bit15_corruption_paradas": stop_q.flag_bit,

            "fallaHorno_instantaneo": falla_q.instantaneous,
            "cantidad_fallas": falla_q.total(),
            "bit15_corruption_fallaHorno": falla_q.flag_bit,

            "tiempoProduccion_ds_instantaneo": prod_t.instantaneous,
            "tiempo_produccion": prod_t.total(),
            "bit15_corruption_tiempoProduccion_ds": prod_t.flag_bit,

            "tiempoParadas_instantaneo": stop_t.instantaneous,
            "tiempo_paradas": stop_t.total(),
            "bit15_corruption_tiempoParadas": stop_t.flag_bit,

            "tiempoFalla_instantaneo": falla_t.instantaneous,
            "tiempo_fallas": falla_t.total(),
            "bit15_corruption_tiempoFalla": falla_t.flag_bit,

            "timestamp_device": timestamp_device(),
        });

        let slug = DeviceKind::EntradaHorno.slug();
        vec![
            make_pub(format!("{prefix}{line}/{slug}/alarms"), &alarm_body),
            make_pub(format!("{prefix}{line}/{slug}/production"), &prod_body),
        ]
    }

    fn reset(&self) {
        self.states.reset();
    }
}

pub struct SalidaHornoProcessor {
    states: LineStates,
}

impl SalidaHornoProcessor {
    pub fn new() -> Self {
        Self {
            states: LineStates::new(SALIDA_SLOTS),
        }
    }
}

impl Default for SalidaHornoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor for SalidaHornoProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let alarms = int_or_zero(msg, "alarms");
        let checksum = int_or_zero(msg, "checksum");
        let device_type = int_or_zero(msg, "deviceType");
        let raws: Vec<i64> = SALIDA_SLOTS
            .iter()
            .map(|spec| int_or_zero(msg, spec.field))
            .collect();

        let snaps = self.states.observe(line, shift_now, &raws);
        let timer = &snaps[13];

        let alarm_body = json!({
            "alarms": alarms,
            "timestamp_device": timestamp_device(),
        });

        let prod_body = json!({
            "maquina_id": DeviceKind::SalidaHorno.machine_id(),
            "turno": shift_now.number(),
            "deviceType": device_type,
            "lineID": line,
            "checksum": checksum,

            "bancalinos0_instantaneo": snaps[0].instantaneous,
            "bancalinos0_turno": snaps[0].total(),

            "bancalinos1_instantaneo": snaps[1].instantaneous,
            "bancalinos1_turno": snaps[1].total(),

            "bancalinosComb1_instantaneo": snaps[2].instantaneous,
            "bancalinosComb1_turno": snaps[2].total(),

            "bancalinosComb2_instantaneo": snaps[3].instantaneous,
            "bancalinosComb2_turno": snaps[3].total(),

            "bancalinosTotal_raw": snaps[4].raw,
            "bancalinosTotal_turno": snaps[4].total(),
            "bit15_corruption_bancalinosTotal": snaps[4].flag_bit,

            "cambioBarrera_instantaneo": snaps[5].instantaneous,
            "cambioBarrera_turno": snaps[5].total(),

            "cambioBarreraTotal_raw": snaps[6].raw,
            "cambioBarreraTotal_turno": snaps[6].total(),
            "bit15_corruption_cambioBarreraTotal": snaps[6].flag_bit,

            "cambioSentido_instantaneo": snaps[7].instantaneous,
            "cambioSentido_turno": snaps[7].total(),

            "cambioSentidoTotal_raw": snaps[8].raw,
            "cambioSentidoTotal_turno": snaps[8].total(),
            "bit15_corruption_cambioSentidoTotal": snaps[8].flag_bit,

            "cantidad_instantanea": snaps[9].instantaneous,
            "cantidad_raw": snaps[9].raw,
            "cantidad_produccion_turno": snaps[9].total(),
            "bit15_corruption_cantidad": snaps[9].flag_bit,

            "cantidad_total_raw": snaps[10].raw,
            "cantidad_total_turno": snaps[10].total(),
            "bit15_corruption_cantidad_total": snaps[10].flag_bit,

            "paradas_1_instantaneo": snaps[11].instantaneous,
            "paradas_1_turno": snaps[11].total(),

            "paradas_2_instantaneo": snaps[12].instantaneous,
            "paradas_2_turno": snaps[12].total(),

            "timer1Hz_instantaneo": timer.instantaneous,
            "tiempo_operacion_turno_s": timer.total(),

            "timestamp_device": timestamp_device(),
        });

        let slug = DeviceKind::SalidaHorno.slug();
        vec![
            make_pub(format!("{prefix}{line}/{slug}/alarms"), &alarm_body),
            make_pub(format!("{prefix}{line}/{slug}/production"), &prod_body),
        ]
    }

    fn reset(&self) {
        self.states.reset();
    }
}
