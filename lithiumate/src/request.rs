use crate::{consts::*, frame::Frame, parameter_id::ParameterId};

/// What to ask the BMS for: a mode and a two-byte parameter id.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct RequestDescriptor {
    pub mode: u8,
    pub pid_hi: u8,
    pub pid_lo: u8,
}

impl RequestDescriptor {
    pub fn new(mode: u8, pid_hi: u8, pid_lo: u8) -> Self {
        Self { mode, pid_hi, pid_lo }
    }

    /// Ordinary read of a quantity.
    pub fn read(parameter: ParameterId) -> Self {
        Self::new(MODE_DEFAULT, parameter.into(), 0)
    }

    pub fn clear_stored_fault() -> Self {
        Self::new(MODE_CLEAR_STORED_FAULT, ParameterId::Fault.into(), 0)
    }

    pub fn to_frame(&self, request_id: u16) -> Frame {
        let mut data = [0u8; FRAME_DATA_LEN];
        data[NUM_BYTES_OFFSET] = REQUEST_DECLARED_LEN;
        data[MODE_OFFSET] = self.mode;
        data[PID_HI_OFFSET] = self.pid_hi;
        data[PID_LO_OFFSET] = self.pid_lo;
        Frame::new(request_id, data)
    }
}

/// Builds a request frame addressed to the default request identifier.
pub fn build_request(mode: u8, pid_hi: u8, pid_lo: u8) -> Frame {
    RequestDescriptor::new(mode, pid_hi, pid_lo).to_frame(REQUEST_ID)
}

pub fn response_id_for(request_id: u16) -> u16 {
    request_id.wrapping_add(RESPONSE_ID_OFFSET)
}

pub fn response_mode_for(mode: u8) -> u8 {
    mode.wrapping_add(RESPONSE_MODE_OFFSET)
}

/// Conditions a received frame has to meet to be the reply to a request.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ReplyCriterion {
    pub id: u16,
    pub mode: u8,
    pub pid_hi: u8,
    pub pid_lo: u8,
    pub min_declared_length: u8,
}

impl ReplyCriterion {
    pub fn for_request(request: &RequestDescriptor, request_id: u16) -> Self {
        Self {
            id: response_id_for(request_id),
            mode: response_mode_for(request.mode),
            pid_hi: request.pid_hi,
            pid_lo: request.pid_lo,
            min_declared_length: MIN_REPLY_DECLARED_LEN,
        }
    }

    pub fn matches(&self, candidate: &Frame) -> bool {
        candidate.id == self.id
            && candidate.declared_length() >= self.min_declared_length
            && candidate.mode() == self.mode
            && candidate.pid_hi() == self.pid_hi
            && candidate.pid_lo() == self.pid_lo
    }
}

pub fn matches(candidate: &Frame, criterion: &ReplyCriterion) -> bool {
    criterion.matches(candidate)
}

/// Criterion for the reply to a default-mode read sent to [`REQUEST_ID`].
pub fn default_criterion_for(pid_hi: u8, pid_lo: u8) -> ReplyCriterion {
    ReplyCriterion::for_request(&RequestDescriptor::new(MODE_DEFAULT, pid_hi, pid_lo), REQUEST_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(id: u16, declared: u8, mode: u8, pid_hi: u8, pid_lo: u8) -> Frame {
        Frame::new(id, [declared, mode, pid_hi, pid_lo, 0, 0, 0, 0])
    }

    #[test]
    fn request_layout() {
        for mode in [0x00, MODE_DEFAULT, MODE_CLEAR_STORED_FAULT, 0xFF] {
            for pid_hi in 0..=u8::MAX {
                for pid_lo in [0x00, 0x01, 0x7F, 0xFF] {
                    let frame = build_request(mode, pid_hi, pid_lo);
                    assert_eq!(frame.id, REQUEST_ID);
                    assert_eq!(frame.length, 8);
                    assert_eq!(frame.data, [3, mode, pid_hi, pid_lo, 0, 0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn request_to_custom_id() {
        let frame = RequestDescriptor::read(ParameterId::StateOfCharge).to_frame(0x0620);
        assert_eq!(frame.id, 0x0620);
        assert_eq!(frame.data, [3, 0x10, 0x50, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn default_criterion() {
        let criterion = default_criterion_for(0x50, 0x00);
        assert_eq!(
            criterion,
            ReplyCriterion {
                id: 0x074D,
                mode: 0x50,
                pid_hi: 0x50,
                pid_lo: 0x00,
                min_declared_length: 3,
            }
        );
    }

    #[test]
    fn criterion_follows_request_mode() {
        let criterion = ReplyCriterion::for_request(&RequestDescriptor::clear_stored_fault(), 0x0700);
        assert_eq!(criterion.id, 0x0708);
        assert_eq!(criterion.mode, 0x44);
        assert_eq!(criterion.pid_hi, 0x62);
    }

    #[test]
    fn matches_only_when_every_field_holds() {
        let criterion = default_criterion_for(0x62, 0x01);

        assert!(matches(&reply(0x074D, 3, 0x50, 0x62, 0x01), &criterion));
        assert!(matches(&reply(0x074D, 7, 0x50, 0x62, 0x01), &criterion));

        assert!(!matches(&reply(0x074C, 3, 0x50, 0x62, 0x01), &criterion));
        assert!(!matches(&reply(0x0745, 3, 0x50, 0x62, 0x01), &criterion));
        assert!(!matches(&reply(0x074D, 2, 0x50, 0x62, 0x01), &criterion));
        assert!(!matches(&reply(0x074D, 0, 0x50, 0x62, 0x01), &criterion));
        assert!(!matches(&reply(0x074D, 3, 0x10, 0x62, 0x01), &criterion));
        assert!(!matches(&reply(0x074D, 3, 0x50, 0x63, 0x01), &criterion));
        assert!(!matches(&reply(0x074D, 3, 0x50, 0x62, 0x00), &criterion));
    }

    #[test]
    fn matches_boundaries_per_field() {
        let criterion = default_criterion_for(0x46, 0x00);

        for id in 0..=0x0FFFu16 {
            assert_eq!(matches(&reply(id, 3, 0x50, 0x46, 0x00), &criterion), id == 0x074D);
        }
        for declared in 0..=u8::MAX {
            assert_eq!(matches(&reply(0x074D, declared, 0x50, 0x46, 0x00), &criterion), declared >= 3);
        }
        for mode in 0..=u8::MAX {
            assert_eq!(matches(&reply(0x074D, 3, mode, 0x46, 0x00), &criterion), mode == 0x50);
        }
        for pid_hi in 0..=u8::MAX {
            assert_eq!(matches(&reply(0x074D, 3, 0x50, pid_hi, 0x00), &criterion), pid_hi == 0x46);
        }
        for pid_lo in 0..=u8::MAX {
            assert_eq!(matches(&reply(0x074D, 3, 0x50, 0x46, pid_lo), &criterion), pid_lo == 0x00);
        }
    }

    #[test]
    fn request_frame_is_not_its_own_reply() {
        let frame = build_request(MODE_DEFAULT, 0x50, 0x00);
        assert!(!matches(&frame, &default_criterion_for(0x50, 0x00)));
    }
}
