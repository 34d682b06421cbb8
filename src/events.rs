//! Application notifications
//!
//! The manager reports link events through an [`EventSink`]. Every method has
//! an empty default, so an application implements only what it cares about.
//! Events are delivered after the session lock has been released; a sink may
//! call back into the manager.

/// Receiver of link events
pub trait EventSink: Send + Sync {
    /// A DATA frame with a non-empty payload arrived
    fn on_data_received(&self, _payload: &[u8], _rssi: i32) {}

    /// The ACK for the message in flight arrived
    fn on_ack_received(&self, _msg_id: u8, _rssi: i32) {}

    /// A NACK for the message in flight arrived
    fn on_nack_received(&self, _msg_id: u8, _rssi: i32) {}

    /// The reply deadline for `msg_id` elapsed; `retry_count` is the number of
    /// retries already made for it
    fn on_timeout(&self, _msg_id: u8, _retry_count: u8) {}
}

type DataFn = Box<dyn Fn(&[u8], i32) + Send + Sync>;
type ReplyFn = Box<dyn Fn(u8, i32) + Send + Sync>;
type TimeoutFn = Box<dyn Fn(u8, u8) + Send + Sync>;

/// [`EventSink`] assembled from optional closures
///
/// ```
/// use radio_ack::Callbacks;
///
/// let callbacks = Callbacks::new()
///     .with_data(|payload, rssi| println!("{} bytes at {} dBm", payload.len(), rssi))
///     .with_timeout(|id, retry| println!("message {} timed out (retry {})", id, retry));
/// ```
#[derive(Default)]
pub struct Callbacks {
    data: Option<DataFn>,
    ack: Option<ReplyFn>,
    nack: Option<ReplyFn>,
    timeout: Option<TimeoutFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, f: impl Fn(&[u8], i32) + Send + Sync + 'static) -> Self {
        self.data = Some(Box::new(f));
        self
    }

    pub fn with_ack(mut self, f: impl Fn(u8, i32) + Send + Sync + 'static) -> Self {
        self.ack = Some(Box::new(f));
        self
    }

    pub fn with_nack(mut self, f: impl Fn(u8, i32) + Send + Sync + 'static) -> Self {
        self.nack = Some(Box::new(f));
        self
    }

    pub fn with_timeout(mut self, f: impl Fn(u8, u8) + Send + Sync + 'static) -> Self {
        self.timeout = Some(Box::new(f));
        self
    }
}

impl EventSink for Callbacks {
    fn on_data_received(&self, payload: &[u8], rssi: i32) {
        if let Some(f) = &self.data {
            f(payload, rssi);
        }
    }

    fn on_ack_received(&self, msg_id: u8, rssi: i32) {
        if let Some(f) = &self.ack {
            f(msg_id, rssi);
        }
    }

    fn on_nack_received(&self, msg_id: u8, rssi: i32) {
        if let Some(f) = &self.nack {
            f(msg_id, rssi);
        }
    }

    fn on_timeout(&self, msg_id: u8, retry_count: u8) {
        if let Some(f) = &self.timeout {
            f(msg_id, retry_count);
        }
    }
}
