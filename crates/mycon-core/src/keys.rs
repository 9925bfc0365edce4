//! Key enumeration and the pressed-letter table.
//!
//! The controller streams its complete button state as one datagram where
//! byte `i` describes key `i`. A key is pressed when its byte equals the
//! letter assigned to it in the [`KeyLayout`].

use serde::{Deserialize, Serialize};

/// Number of keys carried by every packet.
pub const KEY_COUNT: usize = 16;

/// Byte offset of the heartbeat slot, directly after the key bytes.
pub const HEARTBEAT_OFFSET: usize = KEY_COUNT;

/// Heartbeat marker expected at [`HEARTBEAT_OFFSET`].
pub const HEARTBEAT_MARKER: u8 = b'H';

/// Logical buttons on the remote controller, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    C,
    D,
    L1,
    L2,
    R1,
    R2,
    Select,
    Start,
    Aux1,
    Aux2,
}

impl Key {
    /// Every key, ordered by its byte offset in a packet.
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::L1,
        Key::L2,
        Key::R1,
        Key::R2,
        Key::Select,
        Key::Start,
        Key::Aux1,
        Key::Aux2,
    ];

    /// Byte offset of this key in a packet.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Key> {
        if index < KEY_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Short label for logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::Select => "Select",
            Self::Start => "Start",
            Self::Aux1 => "1",
            Self::Aux2 => "2",
        }
    }
}

/// Expected "pressed" letter for each key.
///
/// Letters are compared byte-for-byte, so `L`/`l` and `R`/`r` tell the
/// primary and secondary shoulder buttons apart.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLayout {
    letters: [u8; KEY_COUNT],
}

impl KeyLayout {
    /// Letters sent by the stock controller app.
    pub const DEFAULT_LETTERS: [u8; KEY_COUNT] = *b"UDLRABCDLlRrET12";

    pub const fn new(letters: [u8; KEY_COUNT]) -> Self {
        Self { letters }
    }

    /// The letter that marks `key` as pressed.
    pub const fn letter(&self, key: Key) -> u8 {
        self.letters[key.index()]
    }

    pub const fn letters(&self) -> &[u8; KEY_COUNT] {
        &self.letters
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LETTERS)
    }
}
