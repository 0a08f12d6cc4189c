//! Conversion of reply data bytes into physical quantities.
//!
//! Every function takes an accepted reply and reads data bytes at fixed
//! offsets of the 8-byte frame. Byte 4 is the first data byte.

use crate::{
    fault::{FaultKindOptions, Faults, StoredFaultKind},
    frame::Frame,
    io_status::IoStatus,
    limit::{Limit, LimitCause},
};

/// Voltage of a cell reading of 0.
pub const CELL_VOLTAGE_FLOOR: f32 = 2.0;

pub fn single_byte(frame: &Frame) -> u8 {
    frame.data[4]
}

pub fn two_byte(frame: &Frame) -> u16 {
    u16::from_be_bytes([frame.data[4], frame.data[5]])
}

/// A two-byte value in 100 mA steps, in amps.
pub fn current_amps(raw: u16) -> f32 {
    raw as f32 * 100.0 / 1000.0
}

/// A two-byte value in 100 mV steps, in volts.
pub fn pack_volts(raw: u16) -> f32 {
    raw as f32 * 100.0 / 1000.0
}

/// A 0..=255 reading scaled to 0..=100, rounding half away from zero.
pub fn percent_of_255(raw: u8) -> u8 {
    (100.0 * raw as f32 / 255.0).round() as u8
}

/// A cell reading in 10 mV steps above [`CELL_VOLTAGE_FLOOR`], in volts.
pub fn cell_volts(raw: u8) -> f32 {
    CELL_VOLTAGE_FLOOR + raw as f32 * 10.0 / 1000.0
}

/// The cell number reported next to a min/max cell voltage.
pub fn cell_index(frame: &Frame) -> u8 {
    frame.data[5]
}

pub fn faults(frame: &Frame) -> Faults {
    Faults {
        present: FaultKindOptions::from(frame.data[4]),
        stored: StoredFaultKind::from(frame.data[5]),
        warnings: FaultKindOptions::from(frame.data[6]),
    }
}

pub fn limit_cause(frame: &Frame) -> LimitCause {
    LimitCause::from(frame.data[5] as i8)
}

pub fn limit(frame: &Frame) -> Limit {
    Limit {
        percent: percent_of_255(frame.data[4]),
        cause: limit_cause(frame),
    }
}

pub fn io_status(frame: &Frame) -> IoStatus {
    IoStatus::from(frame.data[4])
}
