use log::{debug, warn};

use crate::ack_manager::{lock, AckManager, Settlement};
use crate::contracts::{decode, encode_control, MessageType, Reply};
use crate::transmitter::{Clock, Delay, Transceiver, Transmitter};

impl<R, C, D> AckManager<R, C, D>
where
    R: Transceiver,
    C: Clock,
    D: Delay,
{
    /// Inbound dispatcher. Call for every buffer the radio receives.
    ///
    /// Frames that fail to decode are dropped without any trace. DATA frames
    /// are always acknowledged before the application sees them; ACK and NACK
    /// frames only count when they carry the id currently in flight.
    pub fn on_frame_received(&self, raw: &[u8], rssi: i32) {
        let Ok(msg) = decode(raw) else {
            return;
        };

        match msg.kind() {
            MessageType::Data => {
                self.reply(Reply::Ack, msg.id());

                if !msg.payload().is_empty() {
                    self.emit(|sink| sink.on_data_received(msg.payload(), rssi));
                }
            }
            MessageType::Ack => {
                let matched = {
                    let mut session = lock(&self.session);
                    let matched = session.settle(msg.id(), Settlement::Acked);
                    if matched {
                        session.stats.acks_received = session.stats.acks_received.wrapping_add(1);
                    }
                    matched
                };

                if matched {
                    self.emit(|sink| sink.on_ack_received(msg.id(), rssi));
                }
            }
            MessageType::Nack => {
                let matched = {
                    let mut session = lock(&self.session);
                    let matched = session.settle(msg.id(), Settlement::Nacked);
                    if matched {
                        session.stats.nacks_received = session.stats.nacks_received.wrapping_add(1);
                    }
                    matched
                };

                if matched {
                    self.emit(|sink| sink.on_nack_received(msg.id(), rssi));
                }
            }
        }
    }

    /// Dispatch a frame using the radio's current signal-strength reading
    pub fn receive(&self, raw: &[u8]) {
        let rssi = lock(&self.radio).read_signal_strength();
        self.on_frame_received(raw, rssi);
    }

    fn reply(&self, reply: Reply, msg_id: u8) {
        let frame = encode_control(reply, msg_id);
        let timeout_ms = lock(&self.session).config.transmit_timeout_ms();

        let sent = {
            let mut radio = lock(&self.radio);
            Transmitter::send_raw(&mut *radio, &frame, timeout_ms)
        };
        match sent {
            Ok(()) => debug!("sent {:?} for message {}", reply, msg_id),
            Err(reason) => warn!("failed to send {:?} for message {}: {}", reply, msg_id, reason),
        }
    }
}
