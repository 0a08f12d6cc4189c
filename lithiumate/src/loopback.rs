//! In-process stand-ins for the bus and the clock.

use std::{cell::Cell, collections::VecDeque, sync::Arc};

use crate::{
    consts::REQUEST_ID,
    device::{respond, BmsDevice, NoDevice},
    error::TransportError,
    frame::Frame,
    transport::{CanSpeed, CanTransport, Clock},
};

/// A [`CanTransport`] wired straight to a [`BmsDevice`].
///
/// Replies are queued as soon as a request is sent. Failures of the real
/// controller can be injected.
pub struct LoopbackTransport<D> {
    device: Arc<D>,
    request_id: u16,
    rx: VecDeque<Frame>,
    sent: Vec<Frame>,
    control_writes: Vec<(u8, u8)>,
    speed: Option<CanSpeed>,
    init_error: Option<TransportError>,
    send_error: Option<TransportError>,
    failed_reads: usize,
    reply_delay: usize,
    polls_until_ready: usize,
}

impl LoopbackTransport<NoDevice> {
    /// A bus with nothing on it.
    pub fn silent() -> Self {
        Self::new(Arc::new(NoDevice))
    }
}

impl<D> LoopbackTransport<D>
where
    D: BmsDevice,
{
    pub fn new(device: Arc<D>) -> Self {
        Self {
            device,
            request_id: REQUEST_ID,
            rx: VecDeque::new(),
            sent: Vec::new(),
            control_writes: Vec::new(),
            speed: None,
            init_error: None,
            send_error: None,
            failed_reads: 0,
            reply_delay: 0,
            polls_until_ready: 0,
        }
    }

    /// The identifier the device listens on.
    pub fn with_request_id(mut self, request_id: u16) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    pub fn fail_initialization(&mut self, error: TransportError) {
        self.init_error = Some(error);
    }

    pub fn reject_sends(&mut self, error: TransportError) {
        self.send_error = Some(error);
    }

    /// Queue a frame from some other node.
    pub fn push_noise(&mut self, frame: Frame) {
        self.rx.push_back(frame);
    }

    /// The next `count` reads fail although a frame is pending.
    pub fn fail_reads(&mut self, count: usize) {
        self.failed_reads = count;
    }

    /// Report nothing available for `polls` polls after each send.
    pub fn delay_replies(&mut self, polls: usize) {
        self.reply_delay = polls;
    }

    pub fn sent(&self) -> &[Frame] {
        &self.sent
    }

    pub fn control_writes(&self) -> &[(u8, u8)] {
        &self.control_writes
    }

    pub fn speed(&self) -> Option<CanSpeed> {
        self.speed
    }

    /// Frames waiting to be received.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl<D> CanTransport for LoopbackTransport<D>
where
    D: BmsDevice,
{
    fn initialize(&mut self, speed: CanSpeed) -> Result<(), TransportError> {
        if let Some(err) = self.init_error.clone() {
            return Err(err);
        }
        self.speed = Some(speed);
        Ok(())
    }

    fn set_control_state(&mut self, mask: u8, value: u8) {
        self.control_writes.push((mask, value));
    }

    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        if let Some(err) = self.send_error.clone() {
            return Err(err);
        }
        self.sent.push(*frame);
        self.polls_until_ready = self.reply_delay;
        if let Some(reply) = respond(self.device.as_ref(), self.request_id, frame) {
            self.rx.push_back(reply);
        }
        Ok(())
    }

    fn poll_available(&mut self) -> bool {
        if self.polls_until_ready > 0 {
            self.polls_until_ready -= 1;
            return false;
        }
        !self.rx.is_empty()
    }

    fn receive(&mut self) -> Result<Frame, TransportError> {
        if self.failed_reads > 0 {
            self.failed_reads -= 1;
            return Err(TransportError::Malformed("read failed"));
        }
        self.rx.pop_front().ok_or(TransportError::Malformed("receive buffer empty"))
    }
}

/// A [`Clock`] that moves forward by `step` every time it is read.
#[derive(Debug)]
pub struct SteppingClock {
    next: Cell<u32>,
    step: u32,
    reads: Cell<usize>,
}

impl SteppingClock {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            next: Cell::new(start),
            step,
            reads: Cell::new(0),
        }
    }

    /// How often the clock was read.
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    /// The value returned by the most recent read.
    pub fn last(&self) -> u32 {
        self.next.get().wrapping_sub(self.step)
    }
}

impl Clock for SteppingClock {
    fn now_millis(&self) -> u32 {
        let now = self.next.get();
        self.next.set(now.wrapping_add(self.step));
        self.reads.set(self.reads.get() + 1);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{device::SimulatedBms, request::build_request};

    #[test]
    fn delayed_reply() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        transport.delay_replies(2);

        transport.send(&build_request(0x10, 0x50, 0x00)).unwrap();

        assert!(!transport.poll_available());
        assert!(!transport.poll_available());
        assert!(transport.poll_available());
        assert_eq!(transport.receive().unwrap().pid_hi(), 0x50);
        assert!(!transport.poll_available());
    }

    #[test]
    fn failed_reads_keep_frame() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        transport.fail_reads(1);
        transport.send(&build_request(0x10, 0x50, 0x00)).unwrap();

        assert!(transport.poll_available());
        assert!(transport.receive().is_err());
        assert!(transport.poll_available());
        assert!(transport.receive().is_ok());
    }

    #[test]
    fn custom_request_id() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default())).with_request_id(0x0700);

        transport.send(&build_request(0x10, 0x50, 0x00)).unwrap();
        assert_eq!(transport.pending(), 0);

        transport.send(&crate::RequestDescriptor::new(0x10, 0x50, 0x00).to_frame(0x0700)).unwrap();
        assert_eq!(transport.receive().unwrap().id, 0x0708);
    }

    #[test]
    fn stepping_clock_wraps() {
        let clock = SteppingClock::new(u32::MAX, 2);
        assert_eq!(clock.now_millis(), u32::MAX);
        assert_eq!(clock.now_millis(), 1);
        assert_eq!(clock.last(), 1);
        assert_eq!(clock.reads(), 2);
    }
}
