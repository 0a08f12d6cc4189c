use std::fmt::Display;

/// One input or output line reported in the IO status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoFlag {
    PowerFromSource,
    PowerFromLoad,
    InterlockTripped,
    HardWireContactorRequest,
    CanContactorRequest,
    HighLimitSet,
    LowLimitSet,
    FanOn,
}

impl IoFlag {
    pub const ALL: [IoFlag; 8] = [
        IoFlag::PowerFromSource,
        IoFlag::PowerFromLoad,
        IoFlag::InterlockTripped,
        IoFlag::HardWireContactorRequest,
        IoFlag::CanContactorRequest,
        IoFlag::HighLimitSet,
        IoFlag::LowLimitSet,
        IoFlag::FanOn,
    ];

    pub fn bit(self) -> u8 {
        self.definition().0
    }

    pub fn description(self) -> &'static str {
        self.definition().1
    }

    fn definition(self) -> (u8, &'static str) {
        match self {
            IoFlag::PowerFromSource => (1 << 0, "Power from source"),
            IoFlag::PowerFromLoad => (1 << 1, "Power from load"),
            IoFlag::InterlockTripped => (1 << 2, "Interlock tripped"),
            IoFlag::HardWireContactorRequest => (1 << 3, "Hard-wire contactor request"),
            IoFlag::CanContactorRequest => (1 << 4, "CAN contactor request"),
            IoFlag::HighLimitSet => (1 << 5, "HLIM set"),
            IoFlag::LowLimitSet => (1 << 6, "LLIM set"),
            IoFlag::FanOn => (1 << 7, "Fan on"),
        }
    }
}

/// The IO status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct IoStatus(u8);

impl IoStatus {
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, flag: IoFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = IoFlag> {
        IoFlag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl From<u8> for IoStatus {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl FromIterator<IoFlag> for IoStatus {
    fn from_iter<I: IntoIterator<Item = IoFlag>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, flag| bits | flag.bit()))
    }
}

impl Display for IoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "None");
        }
        let descriptions = self.iter().map(IoFlag::description).collect::<Vec<_>>();
        write!(f, "{}", descriptions.join(", "))
    }
}
