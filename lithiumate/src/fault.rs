use std::fmt::Display;

/// Something wrong with the battery, or with reaching the BMS.
///
/// Each kind owns one bit of [`FaultKindOptions`]. The first 8 come from the
/// BMS fault register; the last two are raised locally when the fault
/// register can't be read.
///
/// It is not documented whether the BMS sets several bits at once, so the
/// present faults and warnings are kept as bitsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    DrivingOffWhilePluggedIn,
    InterlockTripped,
    CommFault,
    ChargeOverCurrent,
    DischargeOverCurrent,
    OverTemperature,
    UnderVoltage,
    OverVoltage,
    CantFindBmsOnCanBus,
    CanBusFailedInitialization,
}

impl FaultKind {
    /// All kinds in bit order.
    pub const ALL: [FaultKind; 10] = [
        FaultKind::DrivingOffWhilePluggedIn,
        FaultKind::InterlockTripped,
        FaultKind::CommFault,
        FaultKind::ChargeOverCurrent,
        FaultKind::DischargeOverCurrent,
        FaultKind::OverTemperature,
        FaultKind::UnderVoltage,
        FaultKind::OverVoltage,
        FaultKind::CantFindBmsOnCanBus,
        FaultKind::CanBusFailedInitialization,
    ];

    pub fn bit(self) -> u16 {
        self.definition().0
    }

    pub fn message(self) -> &'static str {
        self.definition().1
    }

    fn definition(self) -> (u16, &'static str) {
        match self {
            FaultKind::DrivingOffWhilePluggedIn => (1 << 0, "Driving and plugged in"),
            FaultKind::InterlockTripped => (1 << 1, "Interlock tripped"),
            FaultKind::CommFault => (1 << 2, "Communication fault"),
            FaultKind::ChargeOverCurrent => (1 << 3, "Charge over current"),
            FaultKind::DischargeOverCurrent => (1 << 4, "Discharge over current"),
            FaultKind::OverTemperature => (1 << 5, "Over Temperature"),
            FaultKind::UnderVoltage => (1 << 6, "Under voltage"),
            FaultKind::OverVoltage => (1 << 7, "Over voltage"),
            FaultKind::CantFindBmsOnCanBus => (1 << 8, "BMS not found on CAN Bus"),
            FaultKind::CanBusFailedInitialization => (1 << 9, "CAN Bus init failed"),
        }
    }
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// A set of [`FaultKind`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FaultKindOptions(u16);

impl FaultKindOptions {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, kind: FaultKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: FaultKind) {
        self.0 |= kind.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = FaultKind> {
        FaultKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl From<FaultKind> for FaultKindOptions {
    fn from(value: FaultKind) -> Self {
        Self(value.bit())
    }
}

impl From<u8> for FaultKindOptions {
    fn from(value: u8) -> Self {
        Self(value as u16)
    }
}

impl From<u16> for FaultKindOptions {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl FromIterator<FaultKind> for FaultKindOptions {
    fn from_iter<I: IntoIterator<Item = FaultKind>>(iter: I) -> Self {
        let mut options = Self::empty();
        for kind in iter {
            options.insert(kind);
        }
        options
    }
}

impl Display for FaultKindOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        let messages = self.iter().map(FaultKind::message).collect::<Vec<_>>();
        write!(f, "{}", messages.join(", "))
    }
}

/// The most recent fault the BMS latched. A single code, not a bitset.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq)]
pub enum StoredFaultKind {
    None = 0,
    DrivingOffWhilePluggedIn = 1,
    InterlockTripped = 2,
    CommFault = 3,
    ChargeOverCurrent = 4,
    DischargeOverCurrent = 5,
    OverTemperature = 6,
    UnderVoltage = 7,
    OverVoltage = 8,
    NoBatteryVoltage = 9,
    HighVoltageBMinusLeak = 10,
    HighVoltageBPlusLeak = 11,
    ContactorK1Shorted = 12,
    ContactorK2Shorted = 13,
    ContactorK3Shorted = 14,
    NoPrecharge = 15,
    OpenK2 = 16,
    ExcessivePrechargeTime = 17,
    EepromStackOverflow = 18,
    Unknown(u8),
}

impl StoredFaultKind {
    pub fn description(self) -> &'static str {
        match self {
            StoredFaultKind::None => "No fault",
            StoredFaultKind::DrivingOffWhilePluggedIn => "Driving off while plugged in",
            StoredFaultKind::InterlockTripped => "Interlock is tripped",
            StoredFaultKind::CommFault => "Communication fault with a bank or cell",
            StoredFaultKind::ChargeOverCurrent => "Charge overcurrent",
            StoredFaultKind::DischargeOverCurrent => "Discharge overcurrent",
            StoredFaultKind::OverTemperature => "Over-temperature fault",
            StoredFaultKind::UnderVoltage => "Under voltage",
            StoredFaultKind::OverVoltage => "Over voltage",
            StoredFaultKind::NoBatteryVoltage => "No battery voltage",
            StoredFaultKind::HighVoltageBMinusLeak => "High voltage B- leak to chassis",
            StoredFaultKind::HighVoltageBPlusLeak => "High voltage B+ leak to chassis",
            StoredFaultKind::ContactorK1Shorted => "Contactor K1 shorted",
            StoredFaultKind::ContactorK2Shorted => "Contactor K2 is shorted",
            StoredFaultKind::ContactorK3Shorted => "Contactor K3 shorted",
            StoredFaultKind::NoPrecharge => "No precharge",
            StoredFaultKind::OpenK2 => "Open K2",
            StoredFaultKind::ExcessivePrechargeTime => "Excessive precharge time",
            StoredFaultKind::EepromStackOverflow => "EEPROM stack overflow",
            StoredFaultKind::Unknown(_) => "Unknown fault",
        }
    }
}

impl From<u8> for StoredFaultKind {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::DrivingOffWhilePluggedIn,
            2 => Self::InterlockTripped,
            3 => Self::CommFault,
            4 => Self::ChargeOverCurrent,
            5 => Self::DischargeOverCurrent,
            6 => Self::OverTemperature,
            7 => Self::UnderVoltage,
            8 => Self::OverVoltage,
            9 => Self::NoBatteryVoltage,
            10 => Self::HighVoltageBMinusLeak,
            11 => Self::HighVoltageBPlusLeak,
            12 => Self::ContactorK1Shorted,
            13 => Self::ContactorK2Shorted,
            14 => Self::ContactorK3Shorted,
            15 => Self::NoPrecharge,
            16 => Self::OpenK2,
            17 => Self::ExcessivePrechargeTime,
            18 => Self::EepromStackOverflow,
            _ => Self::Unknown(value),
        }
    }
}

impl From<StoredFaultKind> for u8 {
    fn from(value: StoredFaultKind) -> Self {
        match value {
            StoredFaultKind::None => 0,
            StoredFaultKind::DrivingOffWhilePluggedIn => 1,
            StoredFaultKind::InterlockTripped => 2,
            StoredFaultKind::CommFault => 3,
            StoredFaultKind::ChargeOverCurrent => 4,
            StoredFaultKind::DischargeOverCurrent => 5,
            StoredFaultKind::OverTemperature => 6,
            StoredFaultKind::UnderVoltage => 7,
            StoredFaultKind::OverVoltage => 8,
            StoredFaultKind::NoBatteryVoltage => 9,
            StoredFaultKind::HighVoltageBMinusLeak => 10,
            StoredFaultKind::HighVoltageBPlusLeak => 11,
            StoredFaultKind::ContactorK1Shorted => 12,
            StoredFaultKind::ContactorK2Shorted => 13,
            StoredFaultKind::ContactorK3Shorted => 14,
            StoredFaultKind::NoPrecharge => 15,
            StoredFaultKind::OpenK2 => 16,
            StoredFaultKind::ExcessivePrechargeTime => 17,
            StoredFaultKind::EepromStackOverflow => 18,
            StoredFaultKind::Unknown(value) => value,
        }
    }
}

impl PartialEq for StoredFaultKind {
    fn eq(&self, other: &Self) -> bool {
        u8::from(*self) == u8::from(*other)
    }
}

impl Display for StoredFaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoredFaultKind::Unknown(code) => write!(f, "Unknown fault {code:#04x}"),
            _ => write!(f, "{}", self.description()),
        }
    }
}

/// Content of the fault register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Faults {
    pub present: FaultKindOptions,
    pub stored: StoredFaultKind,
    pub warnings: FaultKindOptions,
}

impl Faults {
    /// What to report when the fault register couldn't be read.
    pub fn unreadable(initialized: bool) -> Self {
        let kind = if initialized {
            FaultKind::CantFindBmsOnCanBus
        } else {
            FaultKind::CanBusFailedInitialization
        };
        Self {
            present: kind.into(),
            stored: StoredFaultKind::None,
            warnings: FaultKindOptions::empty(),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.present.is_empty() && self.warnings.is_empty() && self.stored == StoredFaultKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_follow_declaration_order() {
        for (i, kind) in FaultKind::ALL.iter().enumerate() {
            assert_eq!(kind.bit(), 1 << i, "{kind:?}");
            assert!(!kind.message().is_empty());
        }
    }

    #[test]
    fn messages_are_distinct() {
        for a in FaultKind::ALL {
            for b in FaultKind::ALL {
                if a != b {
                    assert_ne!(a.message(), b.message());
                }
            }
        }
    }

    #[test]
    fn register_byte_maps_to_bms_kinds() {
        let options = FaultKindOptions::from(0xFFu8);
        assert_eq!(options.iter().count(), 8);
        assert!(!options.contains(FaultKind::CantFindBmsOnCanBus));
        assert!(!options.contains(FaultKind::CanBusFailedInitialization));
    }

    #[test]
    fn options_display() {
        let options: FaultKindOptions = [FaultKind::OverVoltage, FaultKind::InterlockTripped].into_iter().collect();
        assert_eq!(options.bits(), 0x82);
        assert_eq!(options.to_string(), "Interlock tripped, Over voltage");
        assert_eq!(FaultKindOptions::empty().to_string(), "None");
    }

    #[test]
    fn stored_fault_codes() {
        for value in 0..=u8::MAX {
            let kind = StoredFaultKind::from(value);
            assert_eq!(u8::from(kind), value);
            assert_eq!(matches!(kind, StoredFaultKind::Unknown(_)), value > 18);
        }
        assert_eq!(StoredFaultKind::from(15).description(), "No precharge");
        assert_eq!(StoredFaultKind::from(0x30).to_string(), "Unknown fault 0x30");
    }

    #[test]
    fn unreadable_register() {
        let faults = Faults::unreadable(true);
        assert_eq!(faults.present, FaultKind::CantFindBmsOnCanBus.into());
        assert_eq!(faults.stored, StoredFaultKind::None);
        assert!(faults.warnings.is_empty());

        let faults = Faults::unreadable(false);
        assert_eq!(faults.present, FaultKind::CanBusFailedInitialization.into());
        assert!(!faults.is_clear());
    }
}
