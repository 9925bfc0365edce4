//! Key-state receiver.
//!
//! [`KeyReceiver`] is the part callers hold on to: it answers "is this key
//! down?" from any context. [`KeySampler`] is owned by the platform's
//! sampling loop and turns socket activity into published state. The loop
//! itself (socket, task or thread, sleeping) lives with each platform:
//!
//! ```rust,ignore
//! loop {
//!     match socket.try_recv_from(&mut buf) {
//!         Some((len, peer)) => {
//!             if let Ok(outcome) = sampler.on_packet(&buf[..len], peer, Instant::now()) {
//!                 if outcome.heartbeat {
//!                     socket.send_to(&HEARTBEAT_REPLY, (peer.ip, config.reply_port));
//!                 }
//!             }
//!         }
//!         _ => {
//!             sampler.on_idle(Instant::now());
//!         }
//!     }
//!     sleep(config.poll_interval());
//! }
//! ```

use core::fmt::Display;
use core::ops::Deref;

use embassy_time::Instant;
use log::{info, warn};

use crate::config::ReceiverConfig;
use crate::error::ReceiverError;
use crate::key_state::{KeySnapshot, SharedKeyState};
use crate::keys::Key;
use crate::packet::{self, PayloadDisplay};

/// Caller-facing half of the receiver.
pub struct KeyReceiver {
    config: ReceiverConfig,
    state: SharedKeyState,
}

impl KeyReceiver {
    pub fn new(config: ReceiverConfig) -> Self {
        let state = SharedKeyState::new();
        state.set_debug_output(config.debug_output);
        Self { config, state }
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Current flag for `key`.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.state.snapshot().is_down(key)
    }

    /// Current flag at a raw key index; out-of-range indices read as released.
    pub fn is_index_down(&self, index: i32) -> bool {
        self.state.snapshot().is_index_down(index)
    }

    pub fn snapshot(&self) -> KeySnapshot {
        self.state.snapshot()
    }

    pub fn is_link_alive(&self) -> bool {
        self.state.is_link_alive()
    }

    /// Log every received packet. Does not change how packets are decoded.
    pub fn set_debug_output(&self, enabled: bool) {
        self.state.set_debug_output(enabled);
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Reserve this receiver for a sampling loop borrowing it.
    pub fn claim(&self) -> Result<KeySampler<&Self>, ReceiverError> {
        KeySampler::claim(self)
    }
}

/// What the loop has to do after a packet was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketOutcome {
    /// Send [`packet::HEARTBEAT_REPLY`] to the sender on the reply port.
    pub heartbeat: bool,
}

/// Loop-owned half of the receiver.
///
/// `R` is however the loop holds the receiver: `&'static KeyReceiver` in a
/// firmware task, `Arc<KeyReceiver>` in a host thread.
pub struct KeySampler<R>
where
    R: Deref<Target = KeyReceiver>,
{
    receiver: R,
    last_receipt: Instant,
    cleared: bool,
}

impl<R> KeySampler<R>
where
    R: Deref<Target = KeyReceiver>,
{
    /// Reserve `receiver` for this sampler.
    ///
    /// Platforms call this before binding so a second `start` fails without
    /// creating another socket or loop.
    pub fn claim(receiver: R) -> Result<Self, ReceiverError> {
        if !receiver.state.try_claim() {
            return Err(ReceiverError::AlreadyStarted);
        }
        Ok(Self {
            receiver,
            last_receipt: Instant::from_millis(0),
            cleared: true,
        })
    }

    /// Give back a claim whose socket never came up.
    pub fn abandon(self) {
        self.receiver.state.release_claim();
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.receiver.config
    }

    pub fn last_receipt(&self) -> Instant {
        self.last_receipt
    }

    /// Handle one received datagram.
    ///
    /// A rejected packet leaves the receipt time as it was and still runs
    /// the timeout check, so a stream of junk cannot keep stale keys down.
    pub fn on_packet(
        &mut self,
        payload: &[u8],
        peer: impl Display,
        now: Instant,
    ) -> Result<PacketOutcome, ReceiverError> {
        let state = &self.receiver.state;
        if state.debug_output() {
            info!("{} {}", peer, PayloadDisplay(payload));
        }

        let frame = match packet::decode(&self.receiver.config.layout, payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping packet from {}: {}", peer, e);
                self.on_idle(now);
                return Err(e);
            }
        };

        if self.cleared {
            info!("Controller connected from {}", peer);
        }

        state.publish(frame.keys, true);
        self.last_receipt = now;
        self.cleared = false;

        Ok(PacketOutcome {
            heartbeat: frame.heartbeat,
        })
    }

    /// Handle a poll that accepted no datagram.
    ///
    /// Returns true when this call released every key because the controller
    /// went quiet for longer than the configured timeout.
    pub fn on_idle(&mut self, now: Instant) -> bool {
        if self.cleared {
            return false;
        }

        let silence = now.saturating_duration_since(self.last_receipt);
        if silence <= self.receiver.config.timeout() {
            return false;
        }

        self.receiver.state.publish(KeySnapshot::released(), false);
        self.cleared = true;
        info!(
            "Controller timed out after {} ms, releasing all keys",
            silence.as_millis()
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KEY_COUNT;

    const PEER: &str = "192.168.4.2:50000";
    const ALL_PRESSED: &[u8] = b"UDLRABCDLlRrET12H";

    fn receiver() -> KeyReceiver {
        KeyReceiver::new(ReceiverConfig::default())
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_packet_sets_matching_keys() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();

        let outcome = sampler
            .on_packet(b"UxxxxxxxxxxxxxxxH", PEER, at(1_000))
            .unwrap();

        assert!(outcome.heartbeat, "heartbeat marker must request a reply");
        assert!(receiver.is_key_down(Key::Up));
        for key in Key::ALL.iter().skip(1) {
            assert!(!receiver.is_key_down(*key), "{} should be up", key.name());
        }
        assert!(receiver.is_link_alive());
        assert_eq!(sampler.last_receipt(), at(1_000));
    }

    #[test]
    fn test_packet_without_marker_needs_no_reply() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();

        let outcome = sampler
            .on_packet(&ALL_PRESSED[..KEY_COUNT], PEER, at(10))
            .unwrap();
        assert!(!outcome.heartbeat);
    }

    #[test]
    fn test_new_packet_overwrites_previous_state() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();

        sampler.on_packet(ALL_PRESSED, PEER, at(10)).unwrap();
        assert_eq!(receiver.snapshot().pressed().count(), KEY_COUNT);

        sampler
            .on_packet(b"xxxxAxxxxxxxxxxx", PEER, at(20))
            .unwrap();
        let pressed: [bool; KEY_COUNT] = *receiver.snapshot().flags();
        for (i, down) in pressed.iter().enumerate() {
            assert_eq!(*down, i == Key::A.index(), "flag {} not overwritten", i);
        }
    }

    #[test]
    fn test_silence_past_timeout_releases_all() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();

        sampler.on_packet(ALL_PRESSED, PEER, at(1_000)).unwrap();

        assert!(!sampler.on_idle(at(1_400)));
        assert!(!sampler.on_idle(at(1_500)), "timeout is exclusive");
        assert_eq!(receiver.snapshot().pressed().count(), KEY_COUNT);

        assert!(sampler.on_idle(at(1_600)));
        assert!(!receiver.snapshot().any_pressed());
        assert!(!receiver.is_link_alive());

        // Only the transition reports a release.
        assert!(!sampler.on_idle(at(5_000)));
    }

    #[test]
    fn test_configured_timeout_is_used() {
        let receiver = KeyReceiver::new(ReceiverConfig::default().with_timeout_ms(50));
        let mut sampler = receiver.claim().unwrap();

        sampler.on_packet(ALL_PRESSED, PEER, at(0)).unwrap();
        assert!(sampler.on_idle(at(51)));
        assert!(!receiver.is_key_down(Key::Start));
    }

    #[test]
    fn test_packets_keep_link_alive() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();

        for t in (0..3_000).step_by(400) {
            sampler.on_packet(ALL_PRESSED, PEER, at(t)).unwrap();
            assert!(!sampler.on_idle(at(t + 390)));
        }
        assert!(receiver.is_key_down(Key::Select));
    }

    #[test]
    fn test_short_packet_keeps_prior_state() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();

        sampler.on_packet(ALL_PRESSED, PEER, at(100)).unwrap();
        let err = sampler.on_packet(b"xxxx", PEER, at(200)).unwrap_err();

        assert_eq!(err, ReceiverError::PacketTooShort { len: 4 });
        assert_eq!(receiver.snapshot().pressed().count(), KEY_COUNT);
        assert_eq!(sampler.last_receipt(), at(100), "rejected packet refreshed the timer");

        // A stream of short packets does not hold keys down.
        assert!(sampler.on_idle(at(601)));
    }

    #[test]
    fn test_short_packet_stream_still_times_out() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();
        sampler.on_packet(ALL_PRESSED, PEER, at(0)).unwrap();

        // Nothing but rejected packets; the loop never sees an empty poll.
        for t in (100..=500).step_by(100) {
            assert!(sampler.on_packet(b"x", PEER, at(t)).is_err());
        }
        assert_eq!(receiver.snapshot().pressed().count(), KEY_COUNT);
        assert!(receiver.is_link_alive());

        assert!(sampler.on_packet(b"x", PEER, at(501)).is_err());
        assert!(!receiver.snapshot().any_pressed());
        assert!(!receiver.is_link_alive());
    }

    #[test]
    fn test_index_query_out_of_range() {
        let receiver = receiver();
        let mut sampler = receiver.claim().unwrap();
        sampler.on_packet(ALL_PRESSED, PEER, at(0)).unwrap();

        assert!(receiver.is_index_down(0));
        assert!(receiver.is_index_down(15));
        assert!(!receiver.is_index_down(16));
        assert!(!receiver.is_index_down(-1));
    }

    #[test]
    fn test_second_claim_fails() {
        let receiver = receiver();
        let sampler = receiver.claim().unwrap();
        assert!(receiver.is_started());
        assert_eq!(receiver.claim().err(), Some(ReceiverError::AlreadyStarted));

        sampler.abandon();
        assert!(!receiver.is_started());
        assert!(receiver.claim().is_ok());
    }

    #[test]
    fn test_debug_output_does_not_change_decoding() {
        let receiver = KeyReceiver::new(ReceiverConfig::default().with_debug_output(true));
        let mut sampler = receiver.claim().unwrap();

        sampler.on_packet(b"xDxxxxxxxxxxxxxx", PEER, at(0)).unwrap();
        receiver.set_debug_output(false);
        assert!(receiver.is_key_down(Key::Down));
        assert_eq!(receiver.snapshot().pressed().count(), 1);
    }
}
