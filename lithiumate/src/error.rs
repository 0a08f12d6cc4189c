use thiserror::Error;

/// Failures reported by a [`CanTransport`](crate::CanTransport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// All transmit buffers of the controller are occupied.
    #[error("Transmit buffers full")]
    BufferFull,
    /// Another node won arbitration and the controller gave up.
    #[error("Arbitration lost")]
    ArbitrationLost,
    /// The controller did not answer on its host interface.
    #[error("CAN controller not responding")]
    NotResponding,
    /// The transport is gone for good.
    #[error("Connection closed")]
    Closed,
    /// A frame was signalled but could not be read back.
    #[error("Malformed frame: {0}")]
    Malformed(&'static str),
}

/// Outcome of a transaction that produced no reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BmsError {
    /// The transport refused the request frame. Not retried.
    #[error("Request not sent: {0}")]
    SendFailed(TransportError),
    /// No matching reply arrived within the budget.
    #[error("No reply from BMS within {0}ms")]
    Timeout(u32),
    /// The bus was never brought up successfully.
    #[error("CAN bus not initialized")]
    NotInitialized,
}
