//! ESP32-S3 firmware-specific modules for mycon
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: the Wi-Fi station connection, the embassy-net UDP sampling task,
//! and build-time credential management.

#![no_std]

extern crate alloc;

pub mod receiver;
pub mod wifi;
pub mod wifi_secrets;
