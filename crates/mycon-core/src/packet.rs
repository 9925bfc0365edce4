//! Wire format of controller packets.
//!
//! A packet is positionally encoded: bytes `0..16` carry one key each in
//! [`Key::ALL`] order and byte 16 optionally carries the heartbeat marker.
//! Anything after that is ignored.

use core::fmt;

use crate::error::ReceiverError;
use crate::key_state::KeySnapshot;
use crate::keys::{HEARTBEAT_MARKER, HEARTBEAT_OFFSET, KEY_COUNT, Key, KeyLayout};

/// Receive buffer size. Longer datagrams are truncated by the transport.
pub const MAX_PACKET_LEN: usize = 256;

/// Datagram sent back to the controller for every heartbeat.
pub const HEARTBEAT_REPLY: [u8; 1] = [HEARTBEAT_MARKER];

/// A decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFrame {
    pub keys: KeySnapshot,
    /// The sender asked for a keep-alive reply.
    pub heartbeat: bool,
}

/// Decode the byte for a single key.
pub fn decode_key(layout: &KeyLayout, key: Key, byte: u8) -> Result<(), ReceiverError> {
    if byte == layout.letter(key) {
        Ok(())
    } else {
        Err(ReceiverError::DecodeMismatch { key })
    }
}

/// Decode a whole packet.
///
/// Packets shorter than [`KEY_COUNT`] bytes are rejected instead of being
/// padded, so a truncated packet can never report a stale key. Every key
/// whose byte does not match its letter is released.
pub fn decode(layout: &KeyLayout, payload: &[u8]) -> Result<KeyFrame, ReceiverError> {
    if payload.len() < KEY_COUNT {
        return Err(ReceiverError::PacketTooShort { len: payload.len() });
    }

    let mut keys = KeySnapshot::released();
    for key in Key::ALL {
        keys.set(key, decode_key(layout, key, payload[key.index()]).is_ok());
    }

    Ok(KeyFrame {
        keys,
        heartbeat: is_heartbeat(payload),
    })
}

pub fn is_heartbeat(payload: &[u8]) -> bool {
    payload.get(HEARTBEAT_OFFSET) == Some(&HEARTBEAT_MARKER)
}

/// Renders a payload as escaped ASCII for debug logging.
pub struct PayloadDisplay<'a>(pub &'a [u8]);

impl fmt::Display for PayloadDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;

    const ALL_PRESSED: &[u8; 17] = b"UDLRABCDLlRrET12H";

    #[test]
    fn test_matching_letter_presses_key() {
        let layout = KeyLayout::default();
        for key in Key::ALL {
            let mut payload = *b"xxxxxxxxxxxxxxxx";
            payload[key.index()] = layout.letter(key);

            let frame = decode(&layout, &payload).unwrap();
            for other in Key::ALL {
                assert_eq!(
                    frame.keys.is_down(other),
                    other == key,
                    "packet for {} decoded {} wrong",
                    key.name(),
                    other.name()
                );
            }
        }
    }

    #[test]
    fn test_all_pressed_with_heartbeat() {
        let frame = decode(&KeyLayout::default(), ALL_PRESSED).unwrap();
        assert!(Key::ALL.iter().all(|&k| frame.keys.is_down(k)));
        assert!(frame.heartbeat);
    }

    #[test]
    fn test_up_only_scenario() {
        let frame = decode(&KeyLayout::default(), b"UxxxxxxxxxxxxxxxH").unwrap();
        assert!(frame.keys.is_down(Key::Up));
        assert_eq!(frame.keys.pressed().count(), 1);
        assert!(frame.heartbeat);
    }

    #[test]
    fn test_shoulder_letters_are_case_sensitive() {
        let layout = KeyLayout::default();
        // L1 expects 'L', L2 expects 'l'; swap them.
        let mut payload = *b"xxxxxxxxxxxxxxxx";
        payload[Key::L1.index()] = b'l';
        payload[Key::L2.index()] = b'L';

        let frame = decode(&layout, &payload).unwrap();
        assert!(!frame.keys.is_down(Key::L1));
        assert!(!frame.keys.is_down(Key::L2));
    }

    #[test]
    fn test_decode_key_reports_mismatch() {
        let layout = KeyLayout::default();
        assert_eq!(decode_key(&layout, Key::Start, b'T'), Ok(()));
        assert_eq!(
            decode_key(&layout, Key::Start, b't'),
            Err(ReceiverError::DecodeMismatch { key: Key::Start })
        );
    }

    #[test]
    fn test_short_packet_is_rejected() {
        let layout = KeyLayout::default();
        assert_eq!(
            decode(&layout, b"UDLR"),
            Err(ReceiverError::PacketTooShort { len: 4 })
        );
        assert_eq!(
            decode(&layout, b""),
            Err(ReceiverError::PacketTooShort { len: 0 })
        );
    }

    #[test]
    fn test_exact_key_count_has_no_heartbeat() {
        let frame = decode(&KeyLayout::default(), &ALL_PRESSED[..KEY_COUNT]).unwrap();
        assert!(frame.keys.any_pressed());
        assert!(!frame.heartbeat);
    }

    #[test]
    fn test_heartbeat_needs_exact_marker() {
        assert!(is_heartbeat(b"xxxxxxxxxxxxxxxxH"));
        assert!(!is_heartbeat(b"xxxxxxxxxxxxxxxxh"));
        assert!(!is_heartbeat(b"xxxxxxxxxxxxxxxH"));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut payload = [b'x'; MAX_PACKET_LEN];
        payload[..ALL_PRESSED.len()].copy_from_slice(ALL_PRESSED);

        let frame = decode(&KeyLayout::default(), &payload).unwrap();
        assert_eq!(frame.keys.pressed().count(), KEY_COUNT);
        assert!(frame.heartbeat);
    }

    #[test]
    fn test_payload_display_escapes_binary() {
        let shown = format!("{}", PayloadDisplay(b"UD\x00\n"));
        assert_eq!(shown, "UD\\x00\\n");
    }
}
