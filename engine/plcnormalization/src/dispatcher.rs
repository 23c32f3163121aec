//! Device-type dispatch.
//!
//! One processor value per device kind, selected by the wire code; any
//! unknown code falls through to the stateless default. The dispatcher
//! owns every processor (and therefore every accumulator map) so tests can
//! run isolated instances in parallel instead of sharing process-wide
//! statics.

use serde_json::Value;

use crate::devices::DeviceKind;
use crate::models::Publication;
use crate::processors::{
    CalidadProcessor, DefaultProcessor, EntradaHornoProcessor, EntradaSecadorProcessor,
    EsmalteProcessor, MessageProcessor, PressProcessor, SalidaHornoProcessor,
    SalidaSecadorProcessor,
};
use crate::shift::Shift;

pub struct Dispatcher {
    ph1: PressProcessor,
    ph2: PressProcessor,
    entrada_secador: EntradaSecadorProcessor,
    salida_secador: SalidaSecadorProcessor,
    esmalte: EsmalteProcessor,
    entrada_horno: EntradaHornoProcessor,
    salida_horno: SalidaHornoProcessor,
    calidad: CalidadProcessor,
    default: DefaultProcessor,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            ph1: PressProcessor::ph1(),
            ph2: PressProcessor::ph2(),
            entrada_secador: EntradaSecadorProcessor::new(),
            salida_secador: SalidaSecadorProcessor::new(),
            esmalte: EsmalteProcessor::new(),
            entrada_horno: EntradaHornoProcessor::new(),
            salida_horno: SalidaHornoProcessor::new(),
            calidad: CalidadProcessor::new(),
            default: DefaultProcessor,
        }
    }

    /// Resolve the processor for a wire `deviceType` code.
    pub fn dispatch(&self, device_type: i64) -> &dyn MessageProcessor {
        match DeviceKind::from_code(device_type) {
            Some(DeviceKind::PrensaHidraulica1) => &self.ph1,
            Some(DeviceKind::PrensaHidraulica2) => &self.ph2,
            Some(DeviceKind::EntradaSecador) => &self.entrada_secador,
            Some(DeviceKind::SalidaSecador) => &self.salida_secador,
            Some(DeviceKind::Esmalte) => &self.esmalte,
            Some(DeviceKind::EntradaHorno) => &self.entrada_horno,
            Some(DeviceKind::SalidaHorno) => &self.salida_horno,
            Some(DeviceKind::Calidad) => &self.calidad,
            None => &self.default,
        }
    }

    pub fn process(&self, device_type: i64, msg: &Value, prefix: &str, shift_now: Shift) -> Vec<Publication> {
        self.dispatch(device_type).process(msg, prefix, shift_now)
    }

    /// Clear every accumulator across all kinds and lines.
    pub fn reset_all(&self) {
        self.ph1.reset();
        self.ph2.reset();
        self.entrada_secador.reset();
        self.salida_secador.reset();
        self.esmalte.reset();
        self.entrada_horno.reset();
        self.salida_horno.reset();
        self.calidad.reset();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: &str = "celima/site/plant/linea";

    #[test]
    fn test_unknown_device_type_routes_to_default() {
        let dispatcher = Dispatcher::new();
        let pubs = dispatcher.process(99, &json!({"cantidad": 1}), PREFIX, Shift::S1);
        assert_eq!(pubs[0].topic, format!("{PREFIX}/production/line/quantity"));
        let pubs = dispatcher.process(0, &json!({}), PREFIX, Shift::S1);
        assert_eq!(pubs.len(), 2);
    }

    #[test]
    fn test_each_kind_reaches_its_machine() {
        let dispatcher = Dispatcher::new();
        for (code, slug) in [
            (1, "prensa_hidraulica1"),
            (2, "prensa_hidraulica2"),
            (3, "entrada_secador"),
            (4, "salida_secador"),
            (5, "esmalte"),
            (6, "entrada_horno"),
            (7, "salida_horno"),
        ] {
            let pubs = dispatcher.process(code, &json!({"lineID": 1}), PREFIX, Shift::S1);
            assert_eq!(pubs[1].topic, format!("{PREFIX}1/{slug}/production"));
        }
        let pubs = dispatcher.process(8, &json!({"lineID": 1}), PREFIX, Shift::S1);
        assert_eq!(pubs[0].topic, format!("{PREFIX}1/calidad/production"));
    }

    #[test]
    fn test_kinds_do_not_share_state() {
        let dispatcher = Dispatcher::new();
        let msg = json!({"lineID": 1, "cantidadProductos": 10});
        dispatcher.process(1, &msg, PREFIX, Shift::S1);
        dispatcher.process(1, &json!({"lineID": 1, "cantidadProductos": 14}), PREFIX, Shift::S1);

        // PH_2 for the same line starts from its own seed.
        let pubs = dispatcher.process(2, &json!({"lineID": 1, "cantidadProductos": 50}), PREFIX, Shift::S1);
        let prod: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(prod["cantidadPisadas_turno"], 0);
    }

    #[test]
    fn test_reset_all_zeroes_accumulators() {
        let dispatcher = Dispatcher::new();
        dispatcher.process(1, &json!({"lineID": 1, "cantidadProductos": 10}), PREFIX, Shift::S1);
        dispatcher.process(1, &json!({"lineID": 1, "cantidadProductos": 20}), PREFIX, Shift::S1);
        dispatcher.reset_all();
        let pubs = dispatcher.process(1, &json!({"lineID": 1, "cantidadProductos": 30}), PREFIX, Shift::S1);
        let prod: Value = serde_json::from_str(&pubs[1].payload).unwrap();
        assert_eq!(prod["cantidadPisadas_turno"], 0);
    }
}
