//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use markspace_lib::constants::{ESCAPE_BYTE, ESCAPE_LITERAL, ESCAPE_PARITY_MARK};
#[allow(unused_imports)]
pub use markspace_lib::error::Result;
#[allow(unused_imports)]
pub use markspace_lib::{
    Challenge, ErrorKind, FrameDecoder, HandshakeConfig, Interrogator, MarkSpaceError,
    MessageBuffer, Parity, ProtocolError, SerialLine,
};
#[allow(unused_imports)]
pub use std::time::Duration;

use std::collections::VecDeque;
use std::io;

/// Render a frame the way a PARMRK tty reports it to the reader:
/// `FF 00` before the mark-parity first byte, and every literal `FF` doubled.
#[allow(dead_code)]
pub fn parmrk_stream(frame: &[u8]) -> Vec<u8> {
    let mut stream = vec![ESCAPE_BYTE, ESCAPE_PARITY_MARK];
    for &byte in frame {
        stream.push(byte);
        if byte == ESCAPE_BYTE {
            stream.push(ESCAPE_LITERAL);
        }
    }
    stream
}

/// How the simulated device answers once it has seen two operand frames.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Reply {
    /// Correct wrapping sum
    Sum,
    /// A fixed (possibly wrong) value, properly framed
    Value(i32),
    /// Raw bytes exactly as they should appear on the read side
    Raw(Vec<u8>),
    /// Never answer
    Silent,
    /// Fail the next read
    Hangup,
    /// Report end of file on every read
    Eof,
}

/// In-memory device on the far end of the line.
///
/// Rebuilds frames from the parity pattern of the writes it receives and
/// queues its reply after the second complete int32 frame.
#[allow(dead_code)]
pub struct SimulatedDevice {
    pub reply: Reply,
    /// Size of each chunk handed out per read
    pub chunk_size: usize,
    pub parity: Parity,
    pub parity_switches: Vec<Parity>,
    pub frames: Vec<Vec<u8>>,
    incoming: VecDeque<Vec<u8>>,
    answered: bool,
}

#[allow(dead_code)]
impl SimulatedDevice {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            chunk_size: usize::MAX,
            parity: Parity::Space,
            parity_switches: Vec::new(),
            frames: Vec::new(),
            incoming: VecDeque::new(),
            answered: false,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    fn maybe_answer(&mut self) {
        if self.answered || self.frames.len() < 2 || self.frames.iter().any(|f| f.len() != 4) {
            return;
        }
        self.answered = true;

        let operand = |frame: &Vec<u8>| MessageBuffer::from_slice(frame).unwrap().as_i32().unwrap();
        let sum = operand(&self.frames[0]).wrapping_add(operand(&self.frames[1]));
        let stream = match &self.reply {
            Reply::Sum => parmrk_stream(MessageBuffer::from_i32(sum).as_bytes()),
            Reply::Value(value) => parmrk_stream(MessageBuffer::from_i32(*value).as_bytes()),
            Reply::Raw(raw) => raw.clone(),
            Reply::Silent | Reply::Hangup | Reply::Eof => return,
        };
        for chunk in stream.chunks(self.chunk_size.max(1)) {
            self.incoming.push_back(chunk.to_vec());
        }
    }
}

impl SerialLine for SimulatedDevice {
    async fn set_parity(&mut self, parity: Parity) -> Result<()> {
        self.parity = parity;
        self.parity_switches.push(parity);
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        match self.parity {
            Parity::Mark => {
                // Only the first byte of a mark-parity write starts a frame
                if let Some((first, rest)) = bytes.split_first() {
                    self.frames.push(vec![*first]);
                    assert!(rest.is_empty(), "more than one byte written with mark parity");
                }
            }
            Parity::Space => {
                let frame = self
                    .frames
                    .last_mut()
                    .expect("space-parity bytes before any frame start");
                frame.extend_from_slice(bytes);
            }
        }
        self.maybe_answer();
        Ok(bytes.len())
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.reply {
            Reply::Hangup => {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device hung up").into());
            }
            Reply::Eof => return Ok(0),
            _ => {}
        }
        let Some(mut chunk) = self.incoming.pop_front() else {
            return std::future::pending().await;
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.incoming.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

/// Handshake settings with no settle delay, for tests running on real time
#[allow(dead_code)]
pub fn fast_config() -> HandshakeConfig {
    HandshakeConfig {
        settle_delay: Duration::ZERO,
        ..HandshakeConfig::default()
    }
}

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
