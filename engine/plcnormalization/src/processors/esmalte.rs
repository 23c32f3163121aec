//! Glaze line processor (Esmalte).
//!
//! Same register layout as the dryer exit: three W15 counters plus the
//! clean 16-bit decisecond production timer.

use serde_json::{json, Value};

use crate::devices::DeviceKind;
use crate::models::{int_or_zero, make_pub, timestamp_device, Publication};
use crate::processors::MessageProcessor;
use crate::shift::Shift;
use crate::statestore::{LineStates, SlotSpec};

static ESMALTE_SLOTS: &[SlotSpec] = &[
    SlotSpec::w15("cantidadProductos"),
    SlotSpec::w16("tiempoProduccion_ds").scaled(0.1),
    SlotSpec::w15("paradas"),
    SlotSpec::w15("tiempoParadas_s"),
];

pub struct EsmalteProcessor {
    states: LineStates,
}

impl EsmalteProcessor {
    pub fn new() -> Self {
        Self {
            states: LineStates::new(ESMALTE_SLOTS),
        }
    }
}

impl Default for EsmalteProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor for EsmalteProcessor {
    fn process(&self, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        let line = int_or_zero(msg, "lineID");
        let alarms = int_or_zero(msg, "alarms");
        let raws: Vec<i64> = ESMALTE_SLOTS
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
            "maquina_id": DeviceKind::Esmalte.machine_id(),
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

        let slug = DeviceKind::Esmalte.slug();
        vec![
            make_pub(format!("{prefix}{line}/{slug}/alarms"), &alarm_body),
            make_pub(format!("{prefix}{line}/{slug}/production"), &prod_body),
        ]
    }

    fn reset(&self) {
        self.states.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "celima/site/plant/linea";

    #[test]
    fn test_esmalte_counts_and_time() {
        let proc = EsmalteProcessor::new();
        proc.process(
            &json!({"lineID": 5, "cantidadProductos": 20, "tiempoProduccion_ds": 500}),
            PREFIX,
            Shift::S2,
        );
        let pubs = proc.process(
            &json!({"lineID": 5, "cantidadProductos": 32, "tiempoProduccion_ds": 620}),
            PREFIX,
            Shift::S2,
        );
        let prod: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(prod["maquina_id"], 5);
        assert_eq!(prod["cantidad_produccion"], 12);
        assert_eq!(prod["tiempo_produccion"], 12);
        assert_eq!(pubs[0].topic, "celima/site/plant/linea5/esmalte/alarms");
    }

    #[test]
    fn test_esmalte_production_timer_is_not_masked() {
        let proc = EsmalteProcessor::new();
        // 40000 is above 2^15; a masked read would mangle the delta.
        proc.process(&json!({"lineID": 1, "tiempoProduccion_ds": 40000}), PREFIX, Shift::S1);
        let pubs = proc.process(&json!({"lineID": 1, "tiempoProduccion_ds": 40100}), PREFIX, Shift::S1);
        let prod: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(prod["tiempoProduccion_ds_instantaneo"], 40100);
        assert_eq!(prod["tiempo_produccion"], 10);
    }
}
