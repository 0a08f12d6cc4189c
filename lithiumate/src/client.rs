use tracing::{info, warn};

use crate::{
    consts::*,
    decode,
    error::BmsError,
    fault::Faults,
    frame::Frame,
    io_status::IoStatus,
    limit::Limit,
    parameter_id::ParameterId,
    request::{ReplyCriterion, RequestDescriptor},
    transaction,
    transport::{CanSpeed, CanTransport, Clock, SystemClock},
};

/// Where and how fast to talk to the BMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmsConfig {
    /// Identifier requests are sent to. Replies come from `request_id + 8`.
    pub request_id: u16,
    pub speed: CanSpeed,
}

impl Default for BmsConfig {
    fn default() -> Self {
        Self {
            request_id: REQUEST_ID,
            speed: CanSpeed::Kbps500,
        }
    }
}

/// A cell voltage together with the number of the cell it was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellVoltage {
    pub volts: f32,
    pub cell: u8,
}

/// Queries a Lithiumate BMS over a CAN transport.
///
/// Each getter runs one blocking transaction. When no reply arrives the getter
/// returns its fallback (0 unless documented otherwise). Use [`BmsClient::request`]
/// to see why a transaction failed.
pub struct BmsClient<T, C = SystemClock> {
    transport: T,
    clock: C,
    config: BmsConfig,
    initialized: bool,
}

impl<T> BmsClient<T, SystemClock>
where
    T: CanTransport,
{
    pub fn new(transport: T, config: BmsConfig) -> Self {
        Self::with_clock(transport, SystemClock::new(), config)
    }
}

impl<T, C> BmsClient<T, C>
where
    T: CanTransport,
    C: Clock,
{
    pub fn with_clock(transport: T, clock: C, config: BmsConfig) -> Self {
        Self {
            transport,
            clock,
            config,
            initialized: false,
        }
    }

    /// Bring up the bus at the configured speed.
    pub fn init(&mut self) -> bool {
        self.initialized = match self.transport.initialize(self.config.speed) {
            Ok(()) => {
                info!(speed = self.config.speed.kbps(), "CAN bus initialized");
                true
            }
            Err(err) => {
                warn!(speed = self.config.speed.kbps(), "CAN bus initialization failed: {err}");
                false
            }
        };
        self.initialized
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &BmsConfig {
        &self.config
    }

    /// Change the request identifier. The bus is not re-initialized.
    pub fn set_request_id(&mut self, request_id: u16) {
        self.config.request_id = request_id;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Send `request` and wait for its reply.
    pub fn request(&mut self, request: RequestDescriptor) -> Result<Frame, BmsError> {
        if !self.initialized {
            return Err(BmsError::NotInitialized);
        }
        let frame = request.to_frame(self.config.request_id);
        let criterion = ReplyCriterion::for_request(&request, self.config.request_id);
        transaction::execute(&mut self.transport, &self.clock, &frame, &criterion)
    }

    pub fn read(&mut self, parameter: ParameterId) -> Result<Frame, BmsError> {
        self.request(RequestDescriptor::read(parameter))
    }

    fn read_or<V>(&mut self, parameter: ParameterId, fallback: V, decode: impl FnOnce(&Frame) -> V) -> V {
        match self.read(parameter) {
            Ok(frame) => decode(&frame),
            Err(err) => {
                warn!(?parameter, "{err}");
                fallback
            }
        }
    }

    /// State of charge in percent.
    pub fn state_of_charge(&mut self) -> u8 {
        self.read_or(ParameterId::StateOfCharge, 0, decode::single_byte)
    }

    /// Depth of discharge in percent.
    pub fn depth_of_discharge(&mut self) -> u8 {
        self.read_or(ParameterId::DepthOfDischarge, 0, |frame| decode::percent_of_255(decode::single_byte(frame)))
    }

    /// State of health in percent.
    pub fn state_of_health(&mut self) -> u8 {
        self.read_or(ParameterId::StateOfHealth, 0, decode::single_byte)
    }

    /// Pack capacity in Ah.
    pub fn capacity(&mut self) -> u16 {
        self.read_or(ParameterId::Capacity, 0, decode::two_byte)
    }

    /// Pack voltage in volts.
    pub fn pack_voltage(&mut self) -> f32 {
        self.read_or(ParameterId::PackVoltage, 0.0, |frame| decode::pack_volts(decode::two_byte(frame)))
    }

    /// Lowest cell voltage and the cell it was measured on.
    pub fn min_cell_voltage(&mut self) -> CellVoltage {
        self.read_or(ParameterId::MinCellVoltage, CellVoltage::default(), cell_voltage)
    }

    /// Average cell voltage in volts.
    pub fn avg_cell_voltage(&mut self) -> f32 {
        self.read_or(ParameterId::AvgCellVoltage, 0.0, |frame| decode::cell_volts(decode::single_byte(frame)))
    }

    /// Highest cell voltage and the cell it was measured on.
    pub fn max_cell_voltage(&mut self) -> CellVoltage {
        self.read_or(ParameterId::MaxCellVoltage, CellVoltage::default(), cell_voltage)
    }

    /// Pack current in amps.
    pub fn pack_current(&mut self) -> f32 {
        self.current(ParameterId::PackCurrent)
    }

    pub fn average_source_current(&mut self) -> f32 {
        self.current(ParameterId::AverageSourceCurrent)
    }

    pub fn average_load_current(&mut self) -> f32 {
        self.current(ParameterId::AverageLoadCurrent)
    }

    pub fn source_current(&mut self) -> f32 {
        self.current(ParameterId::SourceCurrent)
    }

    pub fn load_current(&mut self) -> f32 {
        self.current(ParameterId::LoadCurrent)
    }

    fn current(&mut self, parameter: ParameterId) -> f32 {
        self.read_or(parameter, 0.0, |frame| decode::current_amps(decode::two_byte(frame)))
    }

    /// Charge current limit. The cause is [`LimitCause::NotAvailable`](crate::LimitCause::NotAvailable) if it couldn't be read.
    pub fn charge_limit(&mut self) -> Limit {
        self.read_or(ParameterId::ChargeLimit, Limit::UNAVAILABLE, decode::limit)
    }

    /// Discharge current limit. The cause is [`LimitCause::NotAvailable`](crate::LimitCause::NotAvailable) if it couldn't be read.
    pub fn discharge_limit(&mut self) -> Limit {
        self.read_or(ParameterId::DischargeLimit, Limit::UNAVAILABLE, decode::limit)
    }

    pub fn io_status(&mut self) -> IoStatus {
        self.read_or(ParameterId::IoStatus, IoStatus::default(), decode::io_status)
    }

    /// Present faults, the stored fault and present warnings.
    ///
    /// Not being able to read them is a fault too: the result then holds
    /// [`FaultKind::CanBusFailedInitialization`](crate::FaultKind::CanBusFailedInitialization)
    /// if the bus never came up and
    /// [`FaultKind::CantFindBmsOnCanBus`](crate::FaultKind::CantFindBmsOnCanBus) otherwise.
    pub fn faults(&mut self) -> Faults {
        let initialized = self.initialized;
        self.read_or(ParameterId::Fault, Faults::unreadable(initialized), decode::faults)
    }

    pub fn clear_stored_fault(&mut self) -> Result<(), BmsError> {
        self.request(RequestDescriptor::clear_stored_fault()).map(|_| ())
    }
}

fn cell_voltage(frame: &Frame) -> CellVoltage {
    CellVoltage {
        volts: decode::cell_volts(decode::single_byte(frame)),
        cell: decode::cell_index(frame),
    }
}
