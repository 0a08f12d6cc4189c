//! Frames carried over TCP, for hosts without a CAN controller.
//!
//! Each frame travels as 11 bytes: identifier (big endian), DLC and the 8 data bytes.

use std::{marker::PhantomData, net::SocketAddr, sync::Arc};

use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender},
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, info, trace, warn};

use crate::{
    connection::Connection,
    device::{respond, BmsDevice},
    error::TransportError,
    frame::Frame,
    transport::{CanSpeed, CanTransport},
};

/// Serves a [`BmsDevice`] to bridge clients.
pub struct BridgeServer<D> {
    phantom: PhantomData<D>,
}

impl<D> BridgeServer<D>
where
    D: BmsDevice,
{
    /// Answer frames addressed to `request_id` on every accepted connection.
    pub fn run(listener: TcpListener, device: Arc<D>, request_id: u16) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        info!(%addr, "bridge client connected");
                        let connection = Connection::new(stream);
                        let device = device.clone();
                        tokio::spawn(async move {
                            Self::process(connection, addr, &device, request_id).await;
                            info!(%addr, "bridge client disconnected");
                        });
                    }
                    Err(err) => warn!("accept failed: {err}"),
                }
            }
        })
    }

    async fn process(connection: Connection, addr: SocketAddr, device: &Arc<D>, request_id: u16) {
        loop {
            let frame = match connection.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return,
                Err(err) => {
                    warn!(%addr, "closing connection: {}", TransportError::from(err));
                    _ = connection.shutdown().await;
                    return;
                }
            };

            let Some(reply) = respond(device.as_ref(), request_id, &frame) else {
                trace!(%addr, id = frame.id, "no reply");
                continue;
            };

            if let Err(err) = connection.write_frame(&reply).await {
                debug!(%addr, "write failed: {err}");
                return;
            }
        }
    }
}

/// A [`CanTransport`] whose bus is a [`BridgeServer`] at the other end of a TCP stream.
///
/// Reading and writing happen on a background task, so the transport itself
/// never blocks. It must be created inside a tokio runtime.
pub struct BridgeTransport {
    outgoing: UnboundedSender<Frame>,
    incoming: UnboundedReceiver<Frame>,
    peeked: Option<Frame>,
    abort_handle: AbortHandle,
}

impl BridgeTransport {
    pub fn connect(stream: TcpStream) -> (Self, JoinHandle<Result<(), TransportError>>) {
        let connection = Arc::new(Connection::new(stream));
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming) = mpsc::unbounded_channel();

        let join_handle = tokio::spawn(Self::pump(connection, outgoing_rx, incoming_tx));

        let transport = Self {
            outgoing,
            incoming,
            peeked: None,
            abort_handle: join_handle.abort_handle(),
        };

        (transport, join_handle)
    }

    async fn pump(connection: Arc<Connection>, mut outgoing: UnboundedReceiver<Frame>, incoming: UnboundedSender<Frame>) -> Result<(), TransportError> {
        loop {
            tokio::select! {
                frame = outgoing.recv() => {
                    let Some(frame) = frame else {
                        _ = connection.shutdown().await;
                        return Ok(());
                    };
                    connection.write_frame(&frame).await.map_err(|_| TransportError::Closed)?;
                }
                frame = connection.read_frame() => {
                    match frame {
                        Ok(Some(frame)) => _ = incoming.send(frame),
                        Ok(None) => return Ok(()),
                        Err(err) => {
                            let err = TransportError::from(err);
                            warn!("bridge connection lost: {err}");
                            _ = connection.shutdown().await;
                            return Err(err);
                        }
                    }
                }
            }
        }
    }

    fn pull(&mut self) -> Result<Frame, TransportError> {
        if let Some(frame) = self.peeked.take() {
            return Ok(frame);
        }
        match self.incoming.try_recv() {
            Ok(frame) => Ok(frame),
            Err(TryRecvError::Empty) => Err(TransportError::Malformed("receive buffer empty")),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }
}

impl CanTransport for BridgeTransport {
    fn initialize(&mut self, speed: CanSpeed) -> Result<(), TransportError> {
        if self.outgoing.is_closed() {
            return Err(TransportError::NotResponding);
        }
        debug!(speed = speed.kbps(), "bridge ignores bus speed");
        Ok(())
    }

    fn set_control_state(&mut self, mask: u8, value: u8) {
        trace!(mask, value, "control state");
    }

    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.outgoing.send(*frame).map_err(|_| TransportError::Closed)
    }

    fn poll_available(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.incoming.try_recv().ok();
        }
        self.peeked.is_some()
    }

    fn receive(&mut self) -> Result<Frame, TransportError> {
        self.pull()
    }
}

impl Drop for BridgeTransport {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}
