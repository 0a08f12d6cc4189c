use crate::{consts::*, encoding::*};

/// One CAN message: an 11-bit identifier and its data bytes.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Frame {
    pub id: u16,
    /// Data length code as sent on the bus. Always 8 for this protocol.
    pub length: u8,
    pub data: [u8; FRAME_DATA_LEN],
}

impl Frame {
    pub fn new(id: u16, data: [u8; FRAME_DATA_LEN]) -> Self {
        Self {
            id,
            length: FRAME_DATA_LEN as u8,
            data,
        }
    }

    /// Number of meaningful bytes following byte 0, as declared by the sender.
    pub fn declared_length(&self) -> u8 {
        self.data[NUM_BYTES_OFFSET]
    }

    pub fn mode(&self) -> u8 {
        self.data[MODE_OFFSET]
    }

    pub fn pid_hi(&self) -> u8 {
        self.data[PID_HI_OFFSET]
    }

    pub fn pid_lo(&self) -> u8 {
        self.data[PID_LO_OFFSET]
    }

    /// The 4 data bytes after the header.
    pub fn payload(&self) -> [u8; 4] {
        [
            self.data[DATA_OFFSET],
            self.data[DATA_OFFSET + 1],
            self.data[DATA_OFFSET + 2],
            self.data[DATA_OFFSET + 3],
        ]
    }
}

impl Encodable for Frame {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_u16(self.id);
        encoder.write_u8(self.length);
        encoder.write_bytes(&self.data);
    }
}

impl Decodable<Self> for Frame {
    fn decode(decoder: &mut Decoder) -> DecodeResult<Self> {
        let id = decoder.read_u16()?;
        let length = decoder.read_u8()?;

        if length as usize > FRAME_DATA_LEN {
            return Err(DecodeError::InvalidData("DLC larger than 8"));
        }

        let data = decoder.read_array::<FRAME_DATA_LEN>()?;

        Ok(Self { id, length, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_layout() {
        let frame = Frame::new(0x074D, [7, 0x50, 0x50, 0x00, 77, 0, 0, 0]);

        let bytes = frame.encode_to_bytes();

        assert_eq!(bytes.len(), BRIDGE_FRAME_LEN);
        assert_eq!(bytes, vec![0x07, 0x4D, 8, 7, 0x50, 0x50, 0x00, 77, 0, 0, 0]);
        assert_eq!(Frame::decode_from_bytes(&bytes), Ok(frame));
    }

    #[test]
    fn accessors() {
        let frame = Frame::new(0x074D, [3, 0x50, 0x62, 0x01, 0xAA, 0xBB, 0xCC, 0xDD]);

        assert_eq!(frame.declared_length(), 3);
        assert_eq!(frame.mode(), 0x50);
        assert_eq!(frame.pid_hi(), 0x62);
        assert_eq!(frame.pid_lo(), 0x01);
        assert_eq!(frame.payload(), [0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn decode_rejects_oversized_dlc() {
        let bytes = [0x07, 0x4D, 9, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(Frame::decode_from_bytes(&bytes), Err(DecodeError::InvalidData("DLC larger than 8")));
    }

    #[test]
    fn decode_needs_whole_frame() {
        let bytes = [0x07, 0x4D, 8, 3, 0x50];
        assert_eq!(Frame::decode_from_bytes(&bytes), Err(DecodeError::MissingData));
    }
}
