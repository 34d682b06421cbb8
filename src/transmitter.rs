//! Transmitter module - collaborator seams for the radio link
//!
//! The framework never touches hardware directly. It is built against three
//! capabilities: a [`Transceiver`] to put frames on the air, a [`Clock`] to
//! measure reply deadlines, and a [`Delay`] to yield while waiting.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use log::trace;

/// Radio operating mode. Only one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioMode {
    Transmit,
    Receive,
}

/// Half-duplex packet radio
///
/// Received buffers are handed to the manager by whoever owns the receive
/// path (an interrupt handler, a listener thread); this trait covers the
/// control side only.
pub trait Transceiver {
    type Error: fmt::Display;

    /// Switch operating mode
    fn set_mode(&mut self, mode: RadioMode);

    /// Put one frame on the air
    ///
    /// # Arguments
    /// * `frame` - Encoded frame bytes
    /// * `timeout_ms` - Upper bound the radio may spend on this transmission
    fn transmit(&mut self, frame: &[u8], timeout_ms: u32) -> Result<(), Self::Error>;

    /// Enter continuous receive mode
    fn start_receiving(&mut self);

    /// Signal strength of the most recent reception
    fn read_signal_strength(&mut self) -> i32;
}

/// Millisecond time source
///
/// Values wrap at `u32::MAX`; elapsed time is always computed with
/// `wrapping_sub`, so a wrap in the middle of a wait is harmless.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Short, bounded yield used by the send-and-wait loop
pub trait Delay {
    fn sleep_ms(&self, ms: u32);
}

/// Monotonic clock counting from its creation
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as u32
    }
}

/// Delay backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn sleep_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Stateless helper that performs one transmit cycle on a radio
pub struct Transmitter;

impl Transmitter {
    /// Send a pre-encoded frame and return the radio to receive mode
    ///
    /// Switches to transmit mode, transmits, then starts receiving again
    /// regardless of the outcome so the link never stays deaf after a failed
    /// send.
    ///
    /// # Returns
    /// The radio's transmit error rendered as a string on failure
    pub fn send_raw<R: Transceiver>(
        radio: &mut R,
        frame: &[u8],
        timeout_ms: u32,
    ) -> Result<(), String> {
        radio.set_mode(RadioMode::Transmit);
        let result = radio.transmit(frame, timeout_ms).map_err(|e| e.to_string());
        radio.start_receiving();

        trace!("transmitted {} byte frame (ok={})", frame.len(), result.is_ok());
        result
    }
}
