use crate::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_DEVICE, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_SETTLE_DELAY,
    INT32_FRAME_LEN,
};
use std::path::PathBuf;
use std::time::Duration;

/// Timing and shape of one interrogation exchange.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Deadline for the whole exchange, starting when the first operand is queued
    pub timeout: Duration,
    /// Pause after each half of a frame so the parity change takes effect
    pub settle_delay: Duration,
    /// Payload bytes in the response frame
    pub payload_len: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            payload_len: INT32_FRAME_LEN,
        }
    }
}

/// How to open and configure the serial device.
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub path: PathBuf,
    pub baud: u32,
    /// Pause after each parity switch
    pub settle_delay: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DEVICE),
            baud: DEFAULT_BAUD_RATE,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}
