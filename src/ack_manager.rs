//! ACK Manager module - send-and-wait reliability for one radio link
//!
//! Owns the session state of a link and drives the retry state machine:
//!
//! ```text
//! IDLE -> TRANSMITTING -> AWAITING_REPLY -> SUCCESS
//!              ^                 |-------> RETRYING --+
//!              +-----------------------------------------+
//!                                |-------> EXHAUSTED
//!         TRANSMITTING ----------------->  TRANSMIT_ERROR
//! ```
//!
//! The blocking sender and the inbound dispatcher normally run in different
//! contexts (a caller thread and a receive thread or interrupt). All session
//! state sits behind one mutex so a reply settled by the dispatcher is never
//! lost against a concurrent deadline check.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::{debug, trace, warn};

use crate::config::{AckConfig, AckStats};
use crate::contracts::Message;
use crate::errors::{AckError, Result};
use crate::events::EventSink;
use crate::transmitter::{Clock, Delay, Transceiver, Transmitter};

/// How an in-flight message was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Acked,
    Nacked,
    TimedOut,
}

/// Reply-tracking state of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing in flight
    Idle,
    /// `msg_id` is on the air; replies are accepted but no deadline runs yet
    Transmitting { msg_id: u8 },
    /// `msg_id` is in flight; its deadline runs from `since_ms`
    AwaitingReply { msg_id: u8, since_ms: u32 },
    /// `msg_id` was resolved but its sender has not collected the outcome yet
    Settled { msg_id: u8, outcome: Settlement },
}

/// Mutable state shared by the sender, the dispatcher and the poller
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) next_id: u8,
    pub(crate) state: LinkState,
    pub(crate) retry_count: u8,
    pub(crate) config: AckConfig,
    pub(crate) stats: AckStats,
}

impl Session {
    fn new(config: AckConfig) -> Self {
        Self {
            next_id: 1,
            state: LinkState::Idle,
            retry_count: 0,
            config,
            stats: AckStats::default(),
        }
    }

    /// Hand out the next sequence id. Wraps through 0.
    fn allocate_id(&mut self) -> u8 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Resolve the in-flight message if it is `msg_id`
    ///
    /// # Returns
    /// true if the message was in flight and is now settled
    pub(crate) fn settle(&mut self, msg_id: u8, outcome: Settlement) -> bool {
        match self.state {
            LinkState::Transmitting { msg_id: awaited }
            | LinkState::AwaitingReply { msg_id: awaited, .. }
                if awaited == msg_id =>
            {
                self.state = LinkState::Settled { msg_id, outcome };
                true
            }
            _ => false,
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Acknowledged-delivery endpoint for one radio link
///
/// Generic over the radio, the time source and the yield primitive. All
/// methods take `&self`, so one manager can be shared (e.g. in an `Arc`)
/// between the thread that sends and the context that receives.
pub struct AckManager<R, C, D> {
    pub(crate) radio: Mutex<R>,
    pub(crate) clock: C,
    pub(crate) delay: D,
    pub(crate) session: Mutex<Session>,
    /// Serializes senders so at most one DATA message is ever in flight
    sender: Mutex<()>,
    events: RwLock<Option<Arc<dyn EventSink>>>,
}

impl<R, C, D> AckManager<R, C, D>
where
    R: Transceiver,
    C: Clock,
    D: Delay,
{
    /// Create a manager with the default configuration
    pub fn new(radio: R, clock: C, delay: D) -> Self {
        Self::with_config(radio, clock, delay, AckConfig::default())
    }

    /// Create a manager with an explicit configuration
    pub fn with_config(radio: R, clock: C, delay: D, config: AckConfig) -> Self {
        Self {
            radio: Mutex::new(radio),
            clock,
            delay,
            session: Mutex::new(Session::new(config)),
            sender: Mutex::new(()),
            events: RwLock::new(None),
        }
    }

    /// Install the application's event sink, replacing any previous one
    pub fn set_event_sink(&self, sink: impl EventSink + 'static) {
        *self.events.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(sink));
    }

    /// Change timeout and retry limit; applies from the next send
    pub fn set_config(&self, timeout_ms: u32, max_retries: u8) {
        let mut session = lock(&self.session);
        session.config = session
            .config
            .with_timeout_ms(timeout_ms)
            .with_max_retries(max_retries);
    }

    /// Replace the whole configuration; applies from the next send
    pub fn replace_config(&self, config: AckConfig) {
        lock(&self.session).config = config;
    }

    pub fn config(&self) -> AckConfig {
        lock(&self.session).config
    }

    /// Snapshot of the link counters
    pub fn stats(&self) -> AckStats {
        lock(&self.session).stats
    }

    /// Whether a DATA message is awaiting ACK/NACK/timeout
    pub fn is_in_flight(&self) -> bool {
        matches!(
            lock(&self.session).state,
            LinkState::Transmitting { .. } | LinkState::AwaitingReply { .. }
        )
    }

    pub fn state(&self) -> LinkState {
        lock(&self.session).state
    }

    /// Put the radio into receive mode
    pub fn start_receiving(&self) {
        lock(&self.radio).start_receiving();
    }

    /// Run `f` against the installed sink, if any
    pub(crate) fn emit(&self, f: impl FnOnce(&dyn EventSink)) {
        let sink = self
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(sink) = sink {
            f(sink.as_ref());
        }
    }

    /// Send a payload and block until it is acknowledged or given up on
    ///
    /// Makes up to `max_retries + 1` attempts. Between polls the caller is
    /// suspended only through the injected [`Delay`].
    ///
    /// # Returns
    /// The id the message was sent under
    ///
    /// # Errors
    /// - `InvalidArgument` if the payload exceeds [`crate::MAX_PAYLOAD_SIZE`];
    ///   nothing is transmitted
    /// - `TransmitError` if the radio fails to transmit; not retried
    /// - `ExhaustedRetries` if no matching ACK arrived in any attempt
    pub fn send_with_retry(&self, payload: &[u8]) -> Result<u8> {
        let _sender = lock(&self.sender);

        let (message, config) = self.prepare(payload)?;
        let msg_id = message.id();
        let frame = message.encode();

        loop {
            self.transmit_attempt(msg_id, &frame, &config)?;

            match self.await_reply(msg_id, &config) {
                Settlement::Acked => {
                    debug!("message {} acknowledged", msg_id);
                    return Ok(msg_id);
                }
                Settlement::Nacked => debug!("message {} rejected by peer", msg_id),
                Settlement::TimedOut => debug!("message {} timed out", msg_id),
            }

            let mut session = lock(&self.session);
            if session.retry_count >= config.max_retries() {
                session.state = LinkState::Idle;
                let attempts = config.max_attempts();
                drop(session);

                warn!("message {} undelivered after {} attempts", msg_id, attempts);
                return Err(AckError::ExhaustedRetries { msg_id, attempts });
            }
            session.retry_count = session.retry_count.wrapping_add(1);
            session.stats.retries = session.stats.retries.wrapping_add(1);
            debug!("retrying message {} (retry {})", msg_id, session.retry_count);
        }
    }

    /// Transmit a payload once and return without waiting
    ///
    /// The message stays in flight until the dispatcher settles it or
    /// [`AckManager::check_timeout`] notices its deadline. No retries are made.
    ///
    /// # Errors
    /// `InvalidArgument` or `TransmitError`, as for
    /// [`AckManager::send_with_retry`]
    pub fn send(&self, payload: &[u8]) -> Result<u8> {
        let _sender = lock(&self.sender);

        let (message, config) = self.prepare(payload)?;
        self.transmit_attempt(message.id(), &message.encode(), &config)?;
        Ok(message.id())
    }

    /// Non-blocking deadline check for cooperative schedulers
    ///
    /// If a message is in flight and its deadline has elapsed, settles it as
    /// timed out, counts the timeout and notifies the sink. A message still
    /// being transmitted has no deadline yet and is left alone. Never retries;
    /// a blocked [`AckManager::send_with_retry`] picks up the settlement and
    /// decides.
    pub fn check_timeout(&self) {
        let expired = {
            let mut session = lock(&self.session);
            // Read under the lock: a deadline restarted after `now` was taken
            // would otherwise look wrapped-around and expire at once.
            let now = self.clock.now_ms();
            let timeout_ms = session.config.timeout_ms();
            let state = session.state;
            match state {
                LinkState::AwaitingReply { msg_id, since_ms }
                    if now.wrapping_sub(since_ms) >= timeout_ms =>
                {
                    session.state = LinkState::Settled {
                        msg_id,
                        outcome: Settlement::TimedOut,
                    };
                    session.stats.timeouts = session.stats.timeouts.wrapping_add(1);
                    Some((msg_id, session.retry_count))
                }
                _ => None,
            }
        };

        if let Some((msg_id, retry_count)) = expired {
            debug!("message {} timed out (poller)", msg_id);
            self.emit(|sink| sink.on_timeout(msg_id, retry_count));
        }
    }

    /// Validate the payload, stamp a fresh id and snapshot the configuration
    fn prepare(&self, payload: &[u8]) -> Result<(Message, AckConfig)> {
        let mut session = lock(&self.session);
        // Build before allocating so a rejected payload does not burn an id.
        let message = Message::data(session.next_id, payload)?;
        session.allocate_id();
        session.retry_count = 0;

        Ok((message, session.config))
    }

    /// One TRANSMITTING step
    ///
    /// The message is marked in flight before the radio is touched so that a
    /// reply arriving while the transmit call is still returning is not lost.
    /// Its deadline only starts once the transmit has completed.
    fn transmit_attempt(&self, msg_id: u8, frame: &[u8], config: &AckConfig) -> Result<()> {
        lock(&self.session).state = LinkState::Transmitting { msg_id };

        trace!("transmitting message {} ({} bytes)", msg_id, frame.len());
        let sent = {
            let mut radio = lock(&self.radio);
            Transmitter::send_raw(&mut *radio, frame, config.transmit_timeout_ms())
        };

        let mut session = lock(&self.session);
        if let Err(reason) = sent {
            session.state = LinkState::Idle;
            drop(session);

            warn!("transmit of message {} failed: {}", msg_id, reason);
            return Err(AckError::TransmitError { msg_id, reason });
        }

        session.stats.messages_sent = session.stats.messages_sent.wrapping_add(1);
        // Already settled if the reply beat the transmit call back.
        let state = session.state;
        if state == (LinkState::Transmitting { msg_id }) {
            session.state = LinkState::AwaitingReply {
                msg_id,
                since_ms: self.clock.now_ms(),
            };
        }
        Ok(())
    }

    /// AWAITING_REPLY: poll until settled or the deadline passes
    fn await_reply(&self, msg_id: u8, config: &AckConfig) -> Settlement {
        loop {
            let expired = {
                let mut session = lock(&self.session);
                let now = self.clock.now_ms();
                let state = session.state;
                match state {
                    LinkState::Settled { msg_id: settled, outcome } if settled == msg_id => {
                        session.state = LinkState::Idle;
                        return outcome;
                    }
                    LinkState::AwaitingReply { msg_id: awaited, since_ms } if awaited == msg_id => {
                        if now.wrapping_sub(since_ms) >= config.timeout_ms() {
                            session.state = LinkState::Idle;
                            session.stats.timeouts = session.stats.timeouts.wrapping_add(1);
                            Some(session.retry_count)
                        } else {
                            None
                        }
                    }
                    // Only this sender writes in-flight state, so another id
                    // here means the session was reset underneath us.
                    _ => return Settlement::TimedOut,
                }
            };

            if let Some(retry_count) = expired {
                self.emit(|sink| sink.on_timeout(msg_id, retry_count));
                return Settlement::TimedOut;
            }

            self.delay.sleep_ms(config.poll_interval_ms());
        }
    }
}
