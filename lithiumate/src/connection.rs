use bytes::{Buf, BytesMut};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::Mutex,
};

use crate::{consts::BRIDGE_FRAME_LEN, encoding::*, error::TransportError, frame::Frame};

/// A TCP stream carrying bridge frames.
pub struct Connection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    read_buffer: Mutex<BytesMut>,
}

#[derive(Debug)]
pub enum ReadError {
    #[allow(unused)]
    IO(tokio::io::Error),
    Decode(DecodeError),
}

impl From<ReadError> for TransportError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::IO(_) => TransportError::Closed,
            ReadError::Decode(DecodeError::InvalidData(reason)) => TransportError::Malformed(reason),
            ReadError::Decode(DecodeError::MissingData) => TransportError::Malformed("truncated frame"),
        }
    }
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            read_buffer: Mutex::new(BytesMut::with_capacity(4 * BRIDGE_FRAME_LEN)),
        }
    }

    /// Next frame from the peer, `None` once it closed the stream.
    pub async fn read_frame(&self) -> Result<Option<Frame>, ReadError> {
        let mut reader = self.reader.lock().await;
        let mut read_buffer = self.read_buffer.lock().await;

        loop {
            let mut decoder = Decoder::new(&read_buffer);

            match decoder.read_type::<Frame>() {
                Ok(frame) => {
                    let pos = decoder.position();
                    read_buffer.advance(pos);
                    return Ok(Some(frame));
                }
                Err(DecodeError::MissingData) => {} // wait for more data
                Err(err) => return Err(ReadError::Decode(err)),
            }

            let bytes_read = reader.read_buf(&mut *read_buffer).await.map_err(ReadError::IO)?;

            if bytes_read == 0 {
                if !read_buffer.is_empty() {
                    return Err(ReadError::Decode(DecodeError::MissingData));
                }
                _ = self.writer.lock().await.shutdown().await;
                return Ok(None);
            }
        }
    }

    pub async fn write_frame(&self, frame: &Frame) -> Result<(), tokio::io::Error> {
        let bytes = frame.encode_to_bytes();

        let mut writer = self.writer.lock().await;
        writer.write_all(&bytes).await
    }

    pub async fn shutdown(&self) -> Result<(), tokio::io::Error> {
        self.writer.lock().await.shutdown().await
    }
}
