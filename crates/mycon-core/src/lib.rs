//! Hardware-independent core library for mycon
//!
//! This crate contains all platform-agnostic logic for the mycon remote
//! controller receiver: the key enumeration and letter table, packet
//! decoding, the shared key state, and the sampling logic driven by each
//! platform's receive loop.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3) and
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod app_state;
pub mod config;
pub mod error;
pub mod key_state;
pub mod keys;
pub mod packet;
pub mod receiver;

pub use config::{DEFAULT_PORT, ReceiverConfig};
pub use error::ReceiverError;
pub use key_state::{KeySnapshot, SharedKeyState};
pub use keys::{KEY_COUNT, Key, KeyLayout};
pub use receiver::{KeyReceiver, KeySampler, PacketOutcome};
