use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};

use crate::{
    consts::*,
    fault::{FaultKindOptions, StoredFaultKind},
    frame::Frame,
    io_status::IoStatus,
    limit::LimitCause,
    parameter_id::ParameterId,
    request::{response_id_for, response_mode_for},
};

/**
 * The BMS side of the protocol.
 * Default implementation is to stay silent, as the BMS does for parameters it doesn't know.
 */
pub trait BmsDevice: Send + Sync + 'static {
    /// Data bytes 4..=7 of the reply to a default-mode read.
    #[allow(unused_variables)]
    fn read_parameter(&self, parameter: ParameterId, pid_lo: u8) -> Option<[u8; 4]> {
        None
    }
    /// Erase the stored fault. Returns whether the command is acknowledged.
    fn clear_stored_fault(&self) -> bool {
        false
    }
}

/// A device that never answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDevice;

impl BmsDevice for NoDevice {}

/// Produces the reply a BMS listening on `request_id` sends for `request`, if any.
pub fn respond<D>(device: &D, request_id: u16, request: &Frame) -> Option<Frame>
where
    D: BmsDevice + ?Sized,
{
    if request.id != request_id || request.declared_length() < REQUEST_DECLARED_LEN {
        return None;
    }

    let parameter = ParameterId::from(request.pid_hi());

    let (declared_length, payload) = match request.mode() {
        MODE_DEFAULT => (REPLY_DECLARED_LEN, device.read_parameter(parameter, request.pid_lo())?),
        MODE_CLEAR_STORED_FAULT if parameter == ParameterId::Fault => {
            if !device.clear_stored_fault() {
                return None;
            }
            (REQUEST_DECLARED_LEN, [0; 4])
        }
        mode => {
            debug!(mode, "ignoring request with unsupported mode");
            return None;
        }
    };

    let reply = Frame::new(
        response_id_for(request_id),
        [
            declared_length,
            response_mode_for(request.mode()),
            request.pid_hi(),
            request.pid_lo(),
            payload[0],
            payload[1],
            payload[2],
            payload[3],
        ],
    );

    trace!(request = ?request.data, reply = ?reply.data, "answering request");

    Some(reply)
}

/// Physical values reported by a [`SimulatedBms`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedState {
    pub state_of_charge: u8,
    pub depth_of_discharge: u8,
    pub state_of_health: u8,
    pub capacity_ah: u16,
    pub pack_volts: f32,
    pub min_cell_volts: f32,
    pub min_cell: u8,
    pub avg_cell_volts: f32,
    pub max_cell_volts: f32,
    pub max_cell: u8,
    pub pack_amps: f32,
    pub average_source_amps: f32,
    pub average_load_amps: f32,
    pub source_amps: f32,
    pub load_amps: f32,
    pub charge_limit: u8,
    pub charge_limit_cause: LimitCause,
    pub discharge_limit: u8,
    pub discharge_limit_cause: LimitCause,
    pub io_status: IoStatus,
    pub present_faults: FaultKindOptions,
    pub stored_fault: StoredFaultKind,
    pub warnings: FaultKindOptions,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            state_of_charge: 80,
            depth_of_discharge: 20,
            state_of_health: 97,
            capacity_ah: 100,
            pack_volts: 52.8,
            min_cell_volts: 3.28,
            min_cell: 7,
            avg_cell_volts: 3.3,
            max_cell_volts: 3.32,
            max_cell: 12,
            pack_amps: 12.5,
            average_source_amps: 0.0,
            average_load_amps: 11.8,
            source_amps: 0.0,
            load_amps: 12.5,
            charge_limit: 100,
            charge_limit_cause: LimitCause::None,
            discharge_limit: 100,
            discharge_limit_cause: LimitCause::None,
            io_status: IoStatus::from(0x02),
            present_faults: FaultKindOptions::empty(),
            stored_fault: StoredFaultKind::None,
            warnings: FaultKindOptions::empty(),
        }
    }
}

/// An in-memory BMS answering from a [`SimulatedState`].
#[derive(Debug, Default)]
pub struct SimulatedBms {
    state: Mutex<SimulatedState>,
}

impl SimulatedBms {
    pub fn new(state: SimulatedState) -> Self {
        Self { state: Mutex::new(state) }
    }

    pub fn state(&self) -> SimulatedState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut SimulatedState),
    {
        f(&mut self.state.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl BmsDevice for SimulatedBms {
    fn read_parameter(&self, parameter: ParameterId, pid_lo: u8) -> Option<[u8; 4]> {
        if pid_lo != 0 {
            return None;
        }

        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let data = match parameter {
            ParameterId::IoStatus => [state.io_status.bits(), 0, 0, 0],
            ParameterId::PackVoltage => two_byte(tenths(state.pack_volts)),
            ParameterId::MinCellVoltage => [cell_code(state.min_cell_volts), state.min_cell, 0, 0],
            ParameterId::AvgCellVoltage => [cell_code(state.avg_cell_volts), 0, 0, 0],
            ParameterId::MaxCellVoltage => [cell_code(state.max_cell_volts), state.max_cell, 0, 0],
            ParameterId::StateOfCharge => [state.state_of_charge, 0, 0, 0],
            ParameterId::Capacity => two_byte(state.capacity_ah),
            ParameterId::DepthOfDischarge => [of_255(state.depth_of_discharge), 0, 0, 0],
            ParameterId::StateOfHealth => [state.state_of_health, 0, 0, 0],
            ParameterId::Fault => [
                state.present_faults.bits() as u8,
                state.stored_fault.into(),
                state.warnings.bits() as u8,
                0,
            ],
            ParameterId::ChargeLimit => [of_255(state.charge_limit), i8::from(state.charge_limit_cause) as u8, 0, 0],
            ParameterId::DischargeLimit => [of_255(state.discharge_limit), i8::from(state.discharge_limit_cause) as u8, 0, 0],
            ParameterId::PackCurrent => two_byte(tenths(state.pack_amps)),
            ParameterId::AverageSourceCurrent => two_byte(tenths(state.average_source_amps)),
            ParameterId::AverageLoadCurrent => two_byte(tenths(state.average_load_amps)),
            ParameterId::SourceCurrent => two_byte(tenths(state.source_amps)),
            ParameterId::LoadCurrent => two_byte(tenths(state.load_amps)),
            ParameterId::Unknown(_) => return None,
        };

        Some(data)
    }

    fn clear_stored_fault(&self) -> bool {
        self.update(|state| state.stored_fault = StoredFaultKind::None);
        true
    }
}

fn two_byte(value: u16) -> [u8; 4] {
    let [msb, lsb] = value.to_be_bytes();
    [msb, lsb, 0, 0]
}

fn tenths(value: f32) -> u16 {
    (value * 10.0).round().clamp(0.0, u16::MAX as f32) as u16
}

fn cell_code(volts: f32) -> u8 {
    ((volts - crate::decode::CELL_VOLTAGE_FLOOR) * 100.0).round().clamp(0.0, u8::MAX as f32) as u8
}

fn of_255(percent: u8) -> u8 {
    (percent.min(100) as f32 * 255.0 / 100.0).round() as u8
}
