use tracing::{debug, trace, warn};

use crate::{
    consts::*,
    error::BmsError,
    frame::Frame,
    request::ReplyCriterion,
    transport::{CanTransport, Clock},
};

/// Sends `request` and busy-waits for the first frame satisfying `criterion`.
///
/// Only one transaction may be in flight on a transport: nothing ties a reply to
/// its request except the criterion, so the first matching frame wins. Frames
/// that don't match are other bus traffic and are dropped. The wait ends after
/// [`TRANSACTION_TIMEOUT_MS`], or at once if the clock wraps around.
pub fn execute<T, C>(transport: &mut T, clock: &C, request: &Frame, criterion: &ReplyCriterion) -> Result<Frame, BmsError>
where
    T: CanTransport + ?Sized,
    C: Clock + ?Sized,
{
    transport.set_control_state(CANCTRL_REQOP_MASK, CANCTRL_REQOP_NORMAL);

    if let Err(err) = transport.send(request) {
        warn!(id = request.id, mode = request.mode(), pid_hi = request.pid_hi(), "message not sent: {err}");
        return Err(BmsError::SendFailed(err));
    }

    trace!(id = request.id, data = ?request.data, "request sent");

    let start = clock.now_millis();

    loop {
        if transport.poll_available() {
            match transport.receive() {
                Ok(candidate) if criterion.matches(&candidate) => {
                    trace!(id = candidate.id, data = ?candidate.data, "reply received");
                    return Ok(candidate);
                }
                Ok(candidate) => {
                    debug!(
                        id = candidate.id,
                        expected_id = criterion.id,
                        bytes = candidate.declared_length(),
                        mode = candidate.mode(),
                        expected_mode = criterion.mode,
                        pid_hi = candidate.pid_hi(),
                        expected_pid_hi = criterion.pid_hi,
                        pid_lo = candidate.pid_lo(),
                        expected_pid_lo = criterion.pid_lo,
                        "discarding frame"
                    );
                }
                Err(err) => {
                    debug!("couldn't get the message even though one was available: {err}");
                }
            }
        }

        let now = clock.now_millis();
        if now < start {
            debug!(start, now, "clock wrapped around while waiting for reply");
            return Err(BmsError::Timeout(TRANSACTION_TIMEOUT_MS));
        }
        if now - start > TRANSACTION_TIMEOUT_MS {
            return Err(BmsError::Timeout(TRANSACTION_TIMEOUT_MS));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        device::SimulatedBms,
        error::TransportError,
        loopback::{LoopbackTransport, SteppingClock},
        parameter_id::ParameterId,
        request::{build_request, default_criterion_for},
    };

    fn soc_request() -> (Frame, ReplyCriterion) {
        (build_request(MODE_DEFAULT, 0x50, 0x00), default_criterion_for(0x50, 0x00))
    }

    #[test]
    fn returns_matching_reply() {
        let device = Arc::new(SimulatedBms::default());
        device.update(|state| state.state_of_charge = 77);
        let mut transport = LoopbackTransport::new(device);
        let clock = SteppingClock::new(0, 1);
        let (request, criterion) = soc_request();

        let reply = execute(&mut transport, &clock, &request, &criterion).unwrap();

        assert_eq!(reply.id, 0x074D);
        assert_eq!(reply.data[4], 77);
        assert_eq!(transport.sent(), &[request]);
    }

    #[test]
    fn resets_controller_before_sending() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        let clock = SteppingClock::new(0, 1);
        let (request, criterion) = soc_request();

        execute(&mut transport, &clock, &request, &criterion).unwrap();

        assert_eq!(transport.control_writes(), &[(CANCTRL_REQOP_MASK, CANCTRL_REQOP_NORMAL)]);
    }

    #[test]
    fn skips_other_traffic() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        transport.push_noise(Frame::new(0x0620, [7, 0x50, 0x50, 0x00, 1, 2, 3, 4]));
        transport.push_noise(Frame::new(0x074D, [7, 0x50, 0x46, 0x00, 1, 2, 3, 4]));
        transport.push_noise(Frame::new(0x074D, [2, 0x50, 0x50, 0x00, 1, 2, 3, 4]));
        let clock = SteppingClock::new(0, 1);
        let (request, criterion) = soc_request();

        let reply = execute(&mut transport, &clock, &request, &criterion).unwrap();

        assert_eq!(reply.pid_hi(), 0x50);
        assert_eq!(reply.declared_length(), 7);
        assert_eq!(transport.pending(), 0);
    }

    #[test]
    fn absorbs_unreadable_frames() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        transport.fail_reads(3);
        let clock = SteppingClock::new(0, 1);
        let (request, criterion) = soc_request();

        assert!(execute(&mut transport, &clock, &request, &criterion).is_ok());
    }

    #[test]
    fn send_failure_is_not_retried() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        transport.reject_sends(TransportError::ArbitrationLost);
        let clock = SteppingClock::new(0, 1);
        let (request, criterion) = soc_request();

        let result = execute(&mut transport, &clock, &request, &criterion);

        assert_eq!(result, Err(BmsError::SendFailed(TransportError::ArbitrationLost)));
        assert!(transport.sent().is_empty());
        assert_eq!(clock.reads(), 0);
    }

    #[test]
    fn times_out_only_after_budget() {
        let mut transport = LoopbackTransport::silent();
        let clock = SteppingClock::new(1_000, 1);
        let (request, criterion) = soc_request();

        let result = execute(&mut transport, &clock, &request, &criterion);

        assert_eq!(result, Err(BmsError::Timeout(TRANSACTION_TIMEOUT_MS)));
        assert_eq!(clock.last() - 1_000, TRANSACTION_TIMEOUT_MS + 1);
        assert_eq!(clock.reads(), TRANSACTION_TIMEOUT_MS as usize + 2);
    }

    #[test]
    fn reply_at_budget_edge_is_accepted() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        transport.delay_replies(TRANSACTION_TIMEOUT_MS as usize);
        let clock = SteppingClock::new(0, 1);
        let (request, criterion) = soc_request();

        assert!(execute(&mut transport, &clock, &request, &criterion).is_ok());
    }

    #[test]
    fn wraparound_times_out_immediately() {
        let mut transport = LoopbackTransport::silent();
        let clock = SteppingClock::new(u32::MAX - 1, 5);
        let (request, criterion) = soc_request();

        let result = execute(&mut transport, &clock, &request, &criterion);

        assert_eq!(result, Err(BmsError::Timeout(TRANSACTION_TIMEOUT_MS)));
        assert_eq!(clock.reads(), 2);
    }

    #[test]
    fn unknown_parameter_times_out() {
        let mut transport = LoopbackTransport::new(Arc::new(SimulatedBms::default()));
        let clock = SteppingClock::new(0, 10);
        let request = build_request(MODE_DEFAULT, u8::from(ParameterId::Unknown(0x7E)), 0x00);
        let criterion = default_criterion_for(0x7E, 0x00);

        assert!(matches!(execute(&mut transport, &clock, &request, &criterion), Err(BmsError::Timeout(_))));
    }
}
