mod bridge;
mod client;
mod connection;
pub mod consts;
pub mod decode;
mod device;
mod encoding;
mod error;
mod fault;
mod frame;
mod io_status;
mod limit;
mod loopback;
mod parameter_id;
mod request;
mod transaction;
mod transport;

pub use bridge::{BridgeServer, BridgeTransport};
pub use client::{BmsClient, BmsConfig, CellVoltage};
pub use device::{respond, BmsDevice, NoDevice, SimulatedBms, SimulatedState};
pub use encoding::{DecodeError, Decodable, Decoder, Encodable, Encoder};
pub use error::{BmsError, TransportError};
pub use fault::{FaultKind, FaultKindOptions, Faults, StoredFaultKind};
pub use frame::Frame;
pub use io_status::{IoFlag, IoStatus};
pub use limit::{Limit, LimitCause};
pub use loopback::{LoopbackTransport, SteppingClock};
pub use parameter_id::ParameterId;
pub use request::{build_request, default_criterion_for, matches, response_id_for, response_mode_for, ReplyCriterion, RequestDescriptor};
pub use transaction::execute;
pub use transport::{CanSpeed, CanTransport, Clock, SystemClock};
