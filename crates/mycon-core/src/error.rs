use thiserror_no_std::Error;

use crate::keys::Key;

/// Errors raised by the key-state receiver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverError {
    /// The datagram socket could not be bound. Fatal at start.
    #[error("failed to bind UDP port {port}")]
    BindFailure { port: u16 },
    /// The packet does not cover every key byte; it is dropped.
    #[error("packet too short: {len} bytes")]
    PacketTooShort { len: usize },
    /// The byte for a key is not its pressed letter; the key reads as released.
    #[error("byte for key {key:?} does not match its letter")]
    DecodeMismatch { key: Key },
    /// `start` was called on a receiver that is already running.
    #[error("receiver already started")]
    AlreadyStarted,
    /// The sampling loop could not be launched. Fatal at start.
    #[error("failed to launch the sampling loop")]
    SpawnFailure,
}
