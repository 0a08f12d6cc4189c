use std::fmt::Display;

/// Why the BMS is limiting charge or discharge current.
#[repr(i8)]
#[derive(Debug, Clone, Copy, Eq)]
pub enum LimitCause {
    /// Not reported by the BMS: returned when the limit couldn't be read.
    NotAvailable = -1,
    None = 0,
    PackVoltageTooLow = 1,
    PackVoltageTooHigh = 2,
    CellVoltageTooLow = 3,
    CellVoltageTooHigh = 4,
    TemperatureTooHighToCharge = 5,
    TemperatureTooLowToCharge = 6,
    TemperatureTooHighToDischarge = 7,
    TemperatureTooLowToDischarge = 8,
    ChargingCurrentPeakTooLong = 9,
    DischargingCurrentPeakTooLong = 10,
    Unknown(i8),
}

impl LimitCause {
    pub fn description(self) -> &'static str {
        match self {
            LimitCause::NotAvailable => "Not available",
            LimitCause::None => "No limit",
            LimitCause::PackVoltageTooLow => "Pack voltage too low",
            LimitCause::PackVoltageTooHigh => "Pack voltage too high",
            LimitCause::CellVoltageTooLow => "Cell voltage too low",
            LimitCause::CellVoltageTooHigh => "Cell voltage too high",
            LimitCause::TemperatureTooHighToCharge => "Temperature too high to charge",
            LimitCause::TemperatureTooLowToCharge => "Temperature too low to charge",
            LimitCause::TemperatureTooHighToDischarge => "Temperature too high to discharge",
            LimitCause::TemperatureTooLowToDischarge => "Temperature too low to discharge",
            LimitCause::ChargingCurrentPeakTooLong => "Charging current peak lasted too long",
            LimitCause::DischargingCurrentPeakTooLong => "Discharging current peak lasted too long",
            LimitCause::Unknown(_) => "Unknown cause",
        }
    }
}

impl From<i8> for LimitCause {
    fn from(value: i8) -> Self {
        match value {
            -1 => Self::NotAvailable,
            0 => Self::None,
            1 => Self::PackVoltageTooLow,
            2 => Self::PackVoltageTooHigh,
            3 => Self::CellVoltageTooLow,
            4 => Self::CellVoltageTooHigh,
            5 => Self::TemperatureTooHighToCharge,
            6 => Self::TemperatureTooLowToCharge,
            7 => Self::TemperatureTooHighToDischarge,
            8 => Self::TemperatureTooLowToDischarge,
            9 => Self::ChargingCurrentPeakTooLong,
            10 => Self::DischargingCurrentPeakTooLong,
            _ => Self::Unknown(value),
        }
    }
}

impl From<LimitCause> for i8 {
    fn from(value: LimitCause) -> Self {
        match value {
            LimitCause::NotAvailable => -1,
            LimitCause::None => 0,
            LimitCause::PackVoltageTooLow => 1,
            LimitCause::PackVoltageTooHigh => 2,
            LimitCause::CellVoltageTooLow => 3,
            LimitCause::CellVoltageTooHigh => 4,
            LimitCause::TemperatureTooHighToCharge => 5,
            LimitCause::TemperatureTooLowToCharge => 6,
            LimitCause::TemperatureTooHighToDischarge => 7,
            LimitCause::TemperatureTooLowToDischarge => 8,
            LimitCause::ChargingCurrentPeakTooLong => 9,
            LimitCause::DischargingCurrentPeakTooLong => 10,
            LimitCause::Unknown(value) => value,
        }
    }
}

impl PartialEq for LimitCause {
    fn eq(&self, other: &Self) -> bool {
        i8::from(*self) == i8::from(*other)
    }
}

impl Display for LimitCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitCause::Unknown(code) => write!(f, "Unknown cause {code}"),
            _ => write!(f, "{}", self.description()),
        }
    }
}

/// A charge or discharge current limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// Allowed current as a percentage of the configured maximum.
    pub percent: u8,
    pub cause: LimitCause,
}

impl Limit {
    pub const UNAVAILABLE: Limit = Limit {
        percent: 0,
        cause: LimitCause::NotAvailable,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn causes_are_signed_ordinals() {
        for value in i8::MIN..=i8::MAX {
            assert_eq!(i8::from(LimitCause::from(value)), value);
        }
        assert_eq!(LimitCause::from(-1), LimitCause::NotAvailable);
        assert_eq!(LimitCause::from(10), LimitCause::DischargingCurrentPeakTooLong);
        assert_eq!(LimitCause::from(11).to_string(), "Unknown cause 11");
        assert_eq!(LimitCause::from(-5).to_string(), "Unknown cause -5");
    }
}
