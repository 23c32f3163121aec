//! Device kind enumeration for the plant fleet.
//!
//! One PLC per machine, eight machine kinds across the production lines.
//! Integer codes arrive on the wire as `deviceType`.

/// The eight machine kinds with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    PrensaHidraulica1 = 1,
    PrensaHidraulica2 = 2,
    EntradaSecador = 3,
    SalidaSecador = 4,
    Esmalte = 5,
    EntradaHorno = 6,
    SalidaHorno = 7,
    Calidad = 8,
}

impl DeviceKind {
    /// Resolve a wire `deviceType` code. Unknown codes route to the
    /// default processor, hence `None` here rather than an error.
    pub fn from_code(code: i64) -> Option<DeviceKind> {
        match code {
            1 => Some(DeviceKind::PrensaHidraulica1),
            2 => Some(DeviceKind::PrensaHidraulica2),
            3 => Some(DeviceKind::EntradaSecador),
            4 => Some(DeviceKind::SalidaSecador),
            5 => Some(DeviceKind::Esmalte),
            6 => Some(DeviceKind::EntradaHorno),
            7 => Some(DeviceKind::SalidaHorno),
            8 => Some(DeviceKind::Calidad),
            _ => None,
        }
    }

    /// `maquina_id` carried in every production payload.
    pub fn machine_id(self) -> u8 {
        self as u8
    }

    /// Topic segment for this machine.
    pub fn slug(self) -> &'static str {
        match self {
            DeviceKind::PrensaHidraulica1 => "prensa_hidraulica1",
            DeviceKind::PrensaHidraulica2 => "prensa_hidraulica2",
            DeviceKind::EntradaSecador => "entrada_secador",
            DeviceKind::SalidaSecador => "salida_secador",
            DeviceKind::Esmalte => "esmalte",
            DeviceKind::EntradaHorno => "entrada_horno",
            DeviceKind::SalidaHorno => "salida_horno",
            DeviceKind::Calidad => "calidad",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_round_trip() {
        for code in 1..=8 {
            let kind = DeviceKind::from_code(code).unwrap();
            assert_eq!(kind.machine_id() as i64, code);
        }
    }

    #[test]
    fn test_unknown_codes() {
        assert!(DeviceKind::from_code(0).is_none());
        assert!(DeviceKind::from_code(9).is_none());
        assert!(DeviceKind::from_code(-1).is_none());
    }
}
