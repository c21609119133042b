//! The interrogation handshake.
//!
//! The host sends two random signed 32-bit operands, each as its own
//! mark/space frame, and expects the device to answer with a single frame
//! holding their wrapping sum. Any protocol, I/O or timing failure aborts the
//! exchange; there are no retries.

use crate::buffer::MessageBuffer;
use crate::config::HandshakeConfig;
use crate::constants::READ_CHUNK_SIZE;
use crate::decoder::FrameDecoder;
use crate::encoder::FrameEncoder;
use crate::error::{MarkSpaceError, Result};
use crate::line::SerialLine;
use bytes::Buf;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;
use std::io;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// Supplies the operands for a challenge.
pub trait OperandSource {
    fn next_operands(&mut self) -> Result<(i32, i32)>;
}

/// Operands drawn from the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl OperandSource for OsEntropy {
    fn next_operands(&mut self) -> Result<(i32, i32)> {
        let mut seed = [0u8; 8];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| MarkSpaceError::Io(io::Error::other(e)))?;
        let mut src = &seed[..];
        Ok((src.get_i32_le(), src.get_i32_le()))
    }
}

/// The two operands of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    pub operand1: i32,
    pub operand2: i32,
}

impl Challenge {
    pub fn new(operand1: i32, operand2: i32) -> Self {
        Self { operand1, operand2 }
    }

    pub fn generate<S: OperandSource + ?Sized>(source: &mut S) -> Result<Self> {
        let (operand1, operand2) = source.next_operands()?;
        Ok(Self::new(operand1, operand2))
    }

    /// The sum the device must report. Overflow wraps, and the device has to wrap the same way.
    pub fn expected_sum(&self) -> i32 {
        self.operand1.wrapping_add(self.operand2)
    }
}

/// A passed interrogation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeReport {
    pub challenge: Challenge,
    pub received: i32,
}

impl fmt::Display for HandshakeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "I sent {} and {} and received {}",
            self.challenge.operand1, self.challenge.operand2, self.received
        )
    }
}

/// Runs the challenge/response exchange over a serial line it exclusively owns.
pub struct Interrogator<L> {
    line: L,
    encoder: FrameEncoder,
    config: HandshakeConfig,
}

impl<L: SerialLine> Interrogator<L> {
    pub fn new(line: L, config: HandshakeConfig) -> Self {
        Self {
            line,
            encoder: FrameEncoder::new(config.settle_delay),
            config,
        }
    }

    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    pub fn line(&self) -> &L {
        &self.line
    }

    pub fn into_line(self) -> L {
        self.line
    }

    /// Send both operands and verify the device's answer.
    ///
    /// The deadline covers everything from queuing the first operand to
    /// decoding the last byte of the response.
    pub async fn interrogate(&mut self, challenge: Challenge) -> Result<HandshakeReport> {
        let deadline = Instant::now() + self.config.timeout;
        info!(
            operand1 = challenge.operand1,
            operand2 = challenge.operand2,
            "Starting interrogation"
        );

        let received = match timeout_at(deadline, self.exchange(&challenge)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "No complete response before the deadline");
                return Err(MarkSpaceError::Timeout(self.config.timeout));
            }
        };

        let expected = challenge.expected_sum();
        if received != expected {
            return Err(MarkSpaceError::Verification { expected, received });
        }

        info!(received, "Device returned the expected sum");
        Ok(HandshakeReport {
            challenge,
            received,
        })
    }

    async fn exchange(&mut self, challenge: &Challenge) -> Result<i32> {
        let mut msg = MessageBuffer::new();
        for operand in [challenge.operand1, challenge.operand2] {
            msg.set_i32(operand);
            self.encoder.send(&mut self.line, &msg).await?;
            debug!(operand, frame = %msg, "Operand sent");
        }

        let response = self.receive_frame().await?;
        info!(frame = %response, "Response frame received");
        response.as_i32()
    }

    /// Read from the line until one frame of `payload_len` bytes is decoded.
    ///
    /// Carries no deadline of its own; callers wrap it in one.
    pub async fn receive_frame(&mut self) -> Result<MessageBuffer> {
        let mut decoder = FrameDecoder::new(self.config.payload_len);
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while !decoder.is_complete() {
            let n = self.line.read_bytes(&mut chunk).await?;
            if n == 0 {
                // The line hung up; waiting for the deadline would misreport it as a timeout
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "serial line closed before the response frame completed",
                )
                .into());
            }
            debug!(bytes = hex::encode(&chunk[..n]), "Serial Read");
            decoder.feed(&chunk[..n])?;
        }
        Ok(decoder.into_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_sum_wraps() {
        assert_eq!(Challenge::new(5, 7).expected_sum(), 12);
        assert_eq!(Challenge::new(i32::MAX, 1).expected_sum(), i32::MIN);
        assert_eq!(Challenge::new(i32::MIN, -1).expected_sum(), i32::MAX);
    }

    #[test]
    fn test_os_entropy_yields_operands() {
        let mut source = OsEntropy;
        let challenge = Challenge::generate(&mut source).unwrap();
        let _ = challenge.expected_sum();
    }

    #[test]
    fn test_report_wording() {
        let report = HandshakeReport {
            challenge: Challenge::new(5, 7),
            received: 12,
        };
        assert_eq!(report.to_string(), "I sent 5 and 7 and received 12");
    }
}
