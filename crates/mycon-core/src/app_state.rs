//! Application-wide run state and error types for mycon

use core::str::FromStr;

use thiserror_no_std::Error;

use crate::error::ReceiverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRunState {
    Uninitialized,
    WifiConnecting,
    WifiConnected,
    Receiving,
    Error,
}

impl AppRunState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::WifiConnecting => "wifi connecting",
            Self::WifiConnected => "wifi connected",
            Self::Receiving => "receiving",
            Self::Error => "error",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("WiFi connection failed: {0}")]
    Wifi(heapless::String<64>),
    #[error("Receiver error: {0}")]
    Receiver(ReceiverError),
    #[error("Unknown error")]
    Unknown,
}

impl From<ReceiverError> for AppError {
    fn from(value: ReceiverError) -> Self {
        Self::Receiver(value)
    }
}

impl AppError {
    /// Build a WiFi error, truncating the message to fit.
    pub fn wifi(message: &str) -> Self {
        Self::Wifi(truncated(message))
    }
}

fn truncated<const N: usize>(value: &str) -> heapless::String<N> {
    if let Ok(s) = heapless::String::<N>::from_str(value) {
        return s;
    }
    let mut s = heapless::String::new();
    for c in value.chars() {
        if s.push(c).is_err() {
            break;
        }
    }
    s
}
