//! UDP link - a host-side stand-in for the radio
//!
//! Carries frames between two endpoints as UDP datagrams so the protocol can
//! be exercised without radio hardware. Half-duplex discipline is kept:
//! [`UdpTransceiver::transmit`] refuses to send unless the link was switched
//! to transmit mode first.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, trace};

use crate::ack_manager::AckManager;
use crate::errors::UdpError;
use crate::transmitter::{Clock, Delay, RadioMode, Transceiver};
use crate::MAX_FRAME_SIZE;

type Result<T> = std::result::Result<T, UdpError>;

/// Reported signal strength when none is configured
pub const DEFAULT_SIGNAL_STRENGTH: i32 = -60;

/// Transceiver sending frames to a fixed UDP peer
#[derive(Debug)]
pub struct UdpTransceiver {
    socket: UdpSocket,
    peer: SocketAddr,
    mode: RadioMode,
    signal_strength: i32,
}

impl UdpTransceiver {
    /// Wrap a bound socket; frames are sent to `peer`
    pub fn new(socket: UdpSocket, peer: SocketAddr) -> Self {
        Self {
            socket,
            peer,
            mode: RadioMode::Receive,
            signal_strength: DEFAULT_SIGNAL_STRENGTH,
        }
    }

    /// Bind `local` and address frames to `peer`
    ///
    /// # Arguments
    /// * `local` - Local address, e.g. "127.0.0.1:0"
    /// * `peer` - Destination address as string (e.g., "127.0.0.1:7001")
    pub fn bind(local: &str, peer: &str) -> Result<Self> {
        let socket = UdpSocket::bind(local)?;
        let peer = peer.to_socket_addrs()?.next().ok_or_else(|| {
            UdpError::Io(format!("peer address {} did not resolve", peer))
        })?;

        Ok(Self::new(socket, peer))
    }

    /// Report a fixed signal strength for every reception
    pub fn with_signal_strength(mut self, rssi: i32) -> Self {
        self.signal_strength = rssi;
        self
    }

    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn set_peer(&mut self, peer: SocketAddr) {
        self.peer = peer;
    }

    /// Receive half sharing this transceiver's socket
    pub fn listener(&self) -> Result<UdpListener> {
        Ok(UdpListener::new(self.socket.try_clone()?))
    }
}

impl Transceiver for UdpTransceiver {
    type Error = UdpError;

    fn set_mode(&mut self, mode: RadioMode) {
        self.mode = mode;
    }

    fn transmit(&mut self, frame: &[u8], timeout_ms: u32) -> Result<()> {
        if self.mode != RadioMode::Transmit {
            return Err(UdpError::WrongMode {
                expected: RadioMode::Transmit,
                actual: self.mode,
            });
        }

        // A zero write timeout is rejected by the socket.
        let timeout = Duration::from_millis(timeout_ms.max(1) as u64);
        self.socket.set_write_timeout(Some(timeout))?;

        let sent = self.socket.send_to(frame, self.peer)?;
        if sent != frame.len() {
            return Err(UdpError::Io(format!(
                "short write: {} of {} bytes",
                sent,
                frame.len()
            )));
        }
        Ok(())
    }

    fn start_receiving(&mut self) {
        self.mode = RadioMode::Receive;
    }

    fn read_signal_strength(&mut self) -> i32 {
        self.signal_strength
    }
}

/// Receive half of a UDP link
pub struct UdpListener {
    socket: UdpSocket,
    buffer: Vec<u8>,
}

impl UdpListener {
    pub fn new(socket: UdpSocket) -> Self {
        Self {
            socket,
            // One spare byte so oversized datagrams are not silently truncated
            // into a plausible frame.
            buffer: vec![0u8; MAX_FRAME_SIZE + 1],
        }
    }

    /// Wait up to `timeout` for one datagram
    ///
    /// # Returns
    /// The datagram bytes, or `None` if nothing arrived in time
    pub fn recv_frame(&mut self, timeout: Duration) -> Result<Option<&[u8]>> {
        self.socket.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;

        match self.socket.recv_from(&mut self.buffer) {
            Ok((bytes_received, from)) => {
                trace!("received {} bytes from {}", bytes_received, from);
                Ok(Some(&self.buffer[..bytes_received]))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock
                   || e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Feed every datagram the listener receives into `manager` until `stop` is set
///
/// Intended to run on its own thread next to a blocking sender; frames are
/// dispatched through [`AckManager::receive`] so they carry the transceiver's
/// signal-strength reading.
///
/// # Returns
/// Number of datagrams dispatched
pub fn pump<R, C, D>(
    listener: &mut UdpListener,
    manager: &AckManager<R, C, D>,
    stop: &AtomicBool,
    poll: Duration,
) -> Result<u64>
where
    R: Transceiver,
    C: Clock,
    D: Delay,
{
    let mut dispatched = 0u64;

    while !stop.load(Ordering::Acquire) {
        if let Some(frame) = listener.recv_frame(poll)? {
            manager.receive(frame);
            dispatched += 1;
        }
    }

    debug!("udp pump stopped after {} frames", dispatched);
    Ok(dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmit_requires_transmit_mode() {
        let mut radio = UdpTransceiver::bind("127.0.0.1:0", "127.0.0.1:9").unwrap();

        let result = radio.transmit(&[1, 2, 3, 4], 100);

        assert_eq!(
            result,
            Err(UdpError::WrongMode {
                expected: RadioMode::Transmit,
                actual: RadioMode::Receive,
            })
        );
    }

    #[test]
    fn test_bind_rejects_unparsable_peer() {
        let result = UdpTransceiver::bind("127.0.0.1:0", "no port here");

        assert!(matches!(result, Err(UdpError::Io(_))));
    }

    #[test]
    fn test_datagram_reaches_listener() {
        let receiver = UdpTransceiver::bind("127.0.0.1:0", "127.0.0.1:9").unwrap();
        let mut listener = receiver.listener().unwrap();
        let mut sender = UdpTransceiver::bind(
            "127.0.0.1:0",
            &receiver.local_addr().unwrap().to_string(),
        )
        .unwrap();

        sender.set_mode(RadioMode::Transmit);
        sender.transmit(&[0x02, 7, 0, 0x05], 100).unwrap();
        sender.start_receiving();

        let frame = listener.recv_frame(Duration::from_secs(2)).unwrap();
        assert_eq!(frame, Some(&[0x02, 7, 0, 0x05][..]));
        assert_eq!(sender.mode(), RadioMode::Receive);
    }

    #[test]
    fn test_recv_frame_times_out() {
        let radio = UdpTransceiver::bind("127.0.0.1:0", "127.0.0.1:9").unwrap();
        let mut listener = radio.listener().unwrap();

        assert_eq!(listener.recv_frame(Duration::from_millis(20)).unwrap(), None);
    }

    #[test]
    fn test_signal_strength_override() {
        let mut radio = UdpTransceiver::bind("127.0.0.1:0", "127.0.0.1:9")
            .unwrap()
            .with_signal_strength(-101);

        assert_eq!(radio.read_signal_strength(), -101);
    }
}
