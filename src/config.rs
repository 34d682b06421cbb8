//! Link configuration and running statistics

/// Timeout and retry policy for one radio link
///
/// Changes apply to the next send; a send in progress keeps the
/// configuration it started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckConfig {
    timeout_ms: u32,
    max_retries: u8,
    poll_interval_ms: u32,
    transmit_timeout_ms: u32,
}

impl AckConfig {
    /// Create a configuration with the crate defaults
    pub fn new() -> Self {
        Self {
            timeout_ms: crate::ACK_TIMEOUT_MS,
            max_retries: crate::MAX_RETRANSMIT_ATTEMPTS,
            poll_interval_ms: crate::POLL_INTERVAL_MS,
            transmit_timeout_ms: crate::TRANSMIT_TIMEOUT_MS,
        }
    }

    /// Set how long to wait for an ACK before a retry
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set retries allowed after the first attempt
    pub fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the yield interval of the wait loop
    ///
    /// Should stay short (tens of milliseconds); the wait loop only notices
    /// replies and deadlines at these boundaries.
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the timeout handed to the radio for each transmission
    pub fn with_transmit_timeout_ms(mut self, transmit_timeout_ms: u32) -> Self {
        self.transmit_timeout_ms = transmit_timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn max_retries(&self) -> u8 {
        self.max_retries
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    pub fn transmit_timeout_ms(&self) -> u32 {
        self.transmit_timeout_ms
    }

    /// Total attempts a send makes before giving up
    pub fn max_attempts(&self) -> u32 {
        self.max_retries as u32 + 1
    }
}

impl Default for AckConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Running counters for one link
///
/// Counters only ever grow; nothing in the crate resets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckStats {
    /// DATA frames successfully handed to the radio, retries included
    pub messages_sent: u32,

    /// Matching ACKs received
    pub acks_received: u32,

    /// Matching NACKs received
    pub nacks_received: u32,

    /// Deadlines that elapsed while waiting for a reply
    pub timeouts: u32,

    /// Retransmissions started after a timeout or NACK
    pub retries: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = AckConfig::default();

        assert_eq!(config.timeout_ms(), 2000);
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.poll_interval_ms(), 10);
        assert_eq!(config.transmit_timeout_ms(), 1000);
        assert_eq!(config.max_attempts(), 4);
    }

    #[test]
    fn test_config_builder() {
        let config = AckConfig::new()
            .with_timeout_ms(500)
            .with_max_retries(0)
            .with_poll_interval_ms(5)
            .with_transmit_timeout_ms(250);

        assert_eq!(config.timeout_ms(), 500);
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.poll_interval_ms(), 5);
        assert_eq!(config.transmit_timeout_ms(), 250);
        assert_eq!(config.max_attempts(), 1);
    }
}
