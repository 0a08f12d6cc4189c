//! Protocol constants of the Lithiumate BMS request/response exchange.
//!
//! See the [Lithiumate standard output messages](http://lithiumate.elithion.com/php/menu_setup.php#Standard_output_messages)
//! and the PID table linked from there.

/// Identifier the BMS listens on for parameter requests.
pub const REQUEST_ID: u16 = 0x0745;
/// The reply identifier is always this much higher than the request identifier.
pub const RESPONSE_ID_OFFSET: u16 = 0x08;

/// Mode of an ordinary parameter read.
pub const MODE_DEFAULT: u8 = 0x10;
/// Mode of the command that erases the stored fault.
pub const MODE_CLEAR_STORED_FAULT: u8 = 0x04;
/// Replies carry the request mode plus this offset.
pub const RESPONSE_MODE_OFFSET: u8 = 0x40;
/// Mode carried by replies to [`MODE_DEFAULT`] requests.
pub const RESPONSE_MODE_DEFAULT: u8 = MODE_DEFAULT + RESPONSE_MODE_OFFSET;

pub const NUM_BYTES_OFFSET: usize = 0;
pub const MODE_OFFSET: usize = 1;
pub const PID_HI_OFFSET: usize = 2;
pub const PID_LO_OFFSET: usize = 3;
pub const DATA_OFFSET: usize = 4;

/// Every frame carries 8 data bytes, used or not.
pub const FRAME_DATA_LEN: usize = 8;
/// Bytes following byte 0 in a request (mode and parameter id).
pub const REQUEST_DECLARED_LEN: u8 = 3;
/// A reply must declare at least mode and parameter id.
pub const MIN_REPLY_DECLARED_LEN: u8 = 3;
/// Declared length of a parameter reply carrying 4 data bytes.
pub const REPLY_DECLARED_LEN: u8 = 7;

/// Time allowed between sending a request and receiving its reply.
pub const TRANSACTION_TIMEOUT_MS: u32 = 100;

/// MCP2515 control register.
pub const CANCTRL: u8 = 0x0F;
/// REQOP2..REQOP0 bits of [`CANCTRL`].
pub const CANCTRL_REQOP_MASK: u8 = 0xE0;
/// REQOP value of normal operation mode.
pub const CANCTRL_REQOP_NORMAL: u8 = 0x00;

/// Size of a frame on the TCP bridge: identifier, DLC and data.
pub const BRIDGE_FRAME_LEN: usize = 2 + 1 + FRAME_DATA_LEN;
