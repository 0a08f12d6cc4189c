use std::time::Instant;

use crate::{error::TransportError, frame::Frame};

/// Bit rates of the bus, as MCP2515 baud rate prescaler codes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanSpeed {
    Kbps500 = 1,
    Kbps250 = 3,
    Kbps125 = 7,
}

impl CanSpeed {
    pub fn kbps(self) -> u32 {
        match self {
            CanSpeed::Kbps500 => 500,
            CanSpeed::Kbps250 => 250,
            CanSpeed::Kbps125 => 125,
        }
    }
}

impl From<CanSpeed> for u8 {
    fn from(value: CanSpeed) -> Self {
        value as u8
    }
}

/// The bus controller driver. Framing, CRC and arbitration happen below this.
pub trait CanTransport {
    fn initialize(&mut self, speed: CanSpeed) -> Result<(), TransportError>;

    /// Modify the bits selected by `mask` in the controller's control register.
    fn set_control_state(&mut self, mask: u8, value: u8);

    fn send(&mut self, frame: &Frame) -> Result<(), TransportError>;

    /// Whether a received frame is waiting to be read.
    fn poll_available(&mut self) -> bool;

    fn receive(&mut self) -> Result<Frame, TransportError>;
}

impl<T: CanTransport + ?Sized> CanTransport for &mut T {
    fn initialize(&mut self, speed: CanSpeed) -> Result<(), TransportError> {
        (**self).initialize(speed)
    }

    fn set_control_state(&mut self, mask: u8, value: u8) {
        (**self).set_control_state(mask, value)
    }

    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn poll_available(&mut self) -> bool {
        (**self).poll_available()
    }

    fn receive(&mut self) -> Result<Frame, TransportError> {
        (**self).receive()
    }
}

/// A millisecond counter that wraps around at `u32::MAX`.
pub trait Clock {
    fn now_millis(&self) -> u32;
}

/// [`Clock`] backed by [`Instant`], counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u32 {
        // Truncation is the wraparound.
        self.origin.elapsed().as_millis() as u32
    }
}
