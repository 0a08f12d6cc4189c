use bytes::Buf;
use std::io::{Cursor, Read};

pub trait Encodable {
    fn encode(&self, encoder: &mut Encoder);

    fn encode_to_bytes(&self) -> Vec<u8> {
        Encoder::encode(self)
    }
}

pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(16),
        }
    }

    #[allow(unused)]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend(value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, value: &[u8]) {
        self.buffer.extend(value);
    }

    pub fn write_type<T>(&mut self, value: &T)
    where
        T: Encodable + ?Sized,
    {
        value.encode(self)
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    pub fn encode<T>(value: &T) -> Vec<u8>
    where
        T: Encodable + ?Sized,
    {
        let mut encoder = Self::new();
        encoder.write_type(value);
        encoder.finish()
    }
}

#[derive(PartialEq, Debug)]
pub enum DecodeError {
    MissingData,
    InvalidData(&'static str),
}

pub type DecodeResult<T> = Result<T, DecodeError>;

pub trait Decodable<T> {
    fn decode(decoder: &mut Decoder) -> DecodeResult<T>;

    fn decode_from_bytes(buffer: &[u8]) -> DecodeResult<T>
    where
        T: Decodable<T>,
    {
        Decoder::decode(buffer)
    }
}

pub struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Decoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buffer),
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    #[allow(unused)]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        if self.cursor.remaining() < 1 {
            return Err(DecodeError::MissingData);
        }
        Ok(self.cursor.get_u8())
    }

    pub fn read_u16(&mut self) -> DecodeResult<u16> {
        if self.cursor.remaining() < 2 {
            return Err(DecodeError::MissingData);
        }
        Ok(self.cursor.get_u16())
    }

    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        if self.cursor.remaining() < N {
            return Err(DecodeError::MissingData);
        }
        let mut bytes = [0u8; N];
        self.cursor.read_exact(&mut bytes).map_err(|_| DecodeError::MissingData)?;
        Ok(bytes)
    }

    pub fn read_type<T>(&mut self) -> DecodeResult<T>
    where
        T: Decodable<T>,
    {
        T::decode(self)
    }

    pub fn decode<T>(buffer: &'a [u8]) -> DecodeResult<T>
    where
        T: Decodable<T>,
    {
        let mut decoder = Self::new(buffer);
        let value: T = decoder.read_type()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode() {
        let mut encoder = Encoder::new();
        encoder.write_u8(0xAA);
        encoder.write_u16(0x0745);
        encoder.write_bytes(&[1, 2, 3, 4]);

        assert_eq!(encoder.position(), 7);

        let bytes = encoder.finish();

        assert_eq!(bytes, vec![0xAA, 0x07, 0x45, 1, 2, 3, 4]);

        let mut decoder = Decoder::new(&bytes);

        assert_eq!(decoder.read_u8(), Ok(0xAA));
        assert_eq!(decoder.read_u16(), Ok(0x0745));
        assert_eq!(decoder.remaining(), 4);
        assert_eq!(decoder.read_array::<4>(), Ok([1, 2, 3, 4]));
        assert_eq!(decoder.position(), 7);
        assert_eq!(decoder.read_u8(), Err(DecodeError::MissingData));
    }

    #[test]
    fn read_array_leaves_cursor_on_short_input() {
        let bytes = [1u8, 2, 3];
        let mut decoder = Decoder::new(&bytes);

        assert_eq!(decoder.read_array::<8>(), Err(DecodeError::MissingData));
        assert_eq!(decoder.position(), 0);
    }
}
