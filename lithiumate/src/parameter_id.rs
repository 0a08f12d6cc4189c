/// High byte of the parameter id of each quantity the BMS reports.
/// The low byte is 0 for all of them.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq)]
pub enum ParameterId {
    IoStatus = 0x40,
    PackVoltage = 0x46,
    MinCellVoltage = 0x47,
    AvgCellVoltage = 0x48,
    MaxCellVoltage = 0x49,
    StateOfCharge = 0x50,
    Capacity = 0x51,
    DepthOfDischarge = 0x52,
    StateOfHealth = 0x56,
    Fault = 0x62,
    ChargeLimit = 0x66,
    DischargeLimit = 0x67,
    PackCurrent = 0x68,
    AverageSourceCurrent = 0x69,
    AverageLoadCurrent = 0x6A,
    SourceCurrent = 0x6B,
    LoadCurrent = 0x6C,
    Unknown(u8),
}

impl From<u8> for ParameterId {
    fn from(value: u8) -> Self {
        match value {
            0x40 => Self::IoStatus,
            0x46 => Self::PackVoltage,
            0x47 => Self::MinCellVoltage,
            0x48 => Self::AvgCellVoltage,
            0x49 => Self::MaxCellVoltage,
            0x50 => Self::StateOfCharge,
            0x51 => Self::Capacity,
            0x52 => Self::DepthOfDischarge,
            0x56 => Self::StateOfHealth,
            0x62 => Self::Fault,
            0x66 => Self::ChargeLimit,
            0x67 => Self::DischargeLimit,
            0x68 => Self::PackCurrent,
            0x69 => Self::AverageSourceCurrent,
            0x6A => Self::AverageLoadCurrent,
            0x6B => Self::SourceCurrent,
            0x6C => Self::LoadCurrent,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ParameterId> for u8 {
    fn from(value: ParameterId) -> Self {
        match value {
            ParameterId::IoStatus => 0x40,
            ParameterId::PackVoltage => 0x46,
            ParameterId::MinCellVoltage => 0x47,
            ParameterId::AvgCellVoltage => 0x48,
            ParameterId::MaxCellVoltage => 0x49,
            ParameterId::StateOfCharge => 0x50,
            ParameterId::Capacity => 0x51,
            ParameterId::DepthOfDischarge => 0x52,
            ParameterId::StateOfHealth => 0x56,
            ParameterId::Fault => 0x62,
            ParameterId::ChargeLimit => 0x66,
            ParameterId::DischargeLimit => 0x67,
            ParameterId::PackCurrent => 0x68,
            ParameterId::AverageSourceCurrent => 0x69,
            ParameterId::AverageLoadCurrent => 0x6A,
            ParameterId::SourceCurrent => 0x6B,
            ParameterId::LoadCurrent => 0x6C,
            ParameterId::Unknown(value) => value,
        }
    }
}

impl PartialEq for ParameterId {
    fn eq(&self, other: &Self) -> bool {
        u8::from(*self) == u8::from(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_are_lossless() {
        for value in 0..=u8::MAX {
            assert_eq!(u8::from(ParameterId::from(value)), value);
        }
    }

    #[test]
    fn unknown_compares_by_value() {
        assert_eq!(ParameterId::from(0x50), ParameterId::StateOfCharge);
        assert_eq!(ParameterId::Unknown(0x50), ParameterId::StateOfCharge);
        assert_ne!(ParameterId::from(0x53), ParameterId::StateOfCharge);
    }
}
