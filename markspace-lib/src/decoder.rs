//! Receive-side framing.
//!
//! With `PARMRK | INPCK` set, the tty driver reports a byte whose parity bit
//! disagrees with the configured (space) parity as `FF 00 <byte>`, and a
//! genuine `FF` data byte as `FF FF`. [`FrameDecoder`] walks that stream one
//! byte at a time and rebuilds the payload of a single frame.
//!
//! The `FF 00` marker itself carries no data. The byte after it is handled as
//! ordinary payload, including the usual `FF` escaping.

use crate::buffer::MessageBuffer;
use crate::constants::ESCAPE_BYTE;
use crate::error::{ProtocolError, Result};
use num_enum::{FromPrimitive, IntoPrimitive};
use tracing::trace;

/// Second byte of a two-byte escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum EscapeCode {
    /// `FF 00`: the following byte had a parity error, i.e. it was sent with mark parity
    ParityMark = 0x00,
    // Declared before `Literal` so its implicit discriminant (0x01) cannot overflow
    #[num_enum(catch_all)]
    Invalid(u8),
    /// `FF FF`: a literal 0xFF data byte
    Literal = 0xFF,
}

/// Incremental decoder for one mark/space frame of a known length.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    payload: MessageBuffer,
    expected_len: usize,
    marked_first_byte: bool,
    escaped: bool,
}

impl FrameDecoder {
    /// A fresh decoder expecting a frame of `expected_len` payload bytes
    pub fn new(expected_len: usize) -> Self {
        Self {
            payload: MessageBuffer::new(),
            expected_len,
            marked_first_byte: false,
            escaped: false,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.expected_len
    }

    /// Whether the frame-start marker has been seen
    pub fn marked_first_byte(&self) -> bool {
        self.marked_first_byte
    }

    /// Whether the last byte was an unresolved `FF`
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    pub fn is_complete(&self) -> bool {
        self.payload.len() == self.expected_len
    }

    pub fn payload(&self) -> &MessageBuffer {
        &self.payload
    }

    pub fn into_payload(self) -> MessageBuffer {
        self.payload
    }

    /// Consume one raw byte from the line
    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.escaped {
            self.escaped = false;
            match EscapeCode::from_primitive(byte) {
                EscapeCode::ParityMark => {
                    if self.marked_first_byte {
                        return Err(ProtocolError::DuplicateStartMarker.into());
                    }
                    trace!("frame start marker");
                    self.marked_first_byte = true;
                    return Ok(());
                }
                EscapeCode::Literal => {}
                EscapeCode::Invalid(code) => return Err(ProtocolError::BadEscape(code).into()),
            }
        } else if byte == ESCAPE_BYTE {
            self.escaped = true;
            return Ok(());
        }

        self.accept(byte)
    }

    /// Consume a chunk of raw bytes, returning `true` once the frame is complete.
    ///
    /// The whole chunk is processed, so payload bytes trailing a completed
    /// frame in the same read are reported as an overrun.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<bool> {
        for &byte in bytes {
            self.push(byte)?;
        }
        Ok(self.is_complete())
    }

    fn accept(&mut self, byte: u8) -> Result<()> {
        if !self.marked_first_byte {
            return Err(ProtocolError::MissingStartMarker.into());
        }
        if self.payload.len() >= self.expected_len {
            return Err(ProtocolError::PayloadOverrun {
                expected: self.expected_len,
            }
            .into());
        }
        self.payload.append_byte(byte)?;
        trace!(byte, len = self.payload.len(), "payload byte");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::INT32_FRAME_LEN;
    use crate::error::MarkSpaceError;

    fn protocol_error(result: Result<bool>) -> ProtocolError {
        match result {
            Err(MarkSpaceError::Protocol(e)) => e,
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_marker_consumes_no_payload() {
        let mut decoder = FrameDecoder::new(INT32_FRAME_LEN);
        decoder.push(0xFF).unwrap();
        assert!(decoder.is_escaped());
        assert!(decoder.payload().is_empty());

        decoder.push(0x00).unwrap();
        assert!(!decoder.is_escaped());
        assert!(decoder.marked_first_byte());
        assert!(decoder.payload().is_empty());
    }

    #[test]
    fn test_split_escape_across_chunks() {
        let mut decoder = FrameDecoder::new(INT32_FRAME_LEN);
        assert!(!decoder.feed(&[0xFF]).unwrap());
        assert!(!decoder.feed(&[0x00, 0x01, 0xFF]).unwrap());
        assert!(!decoder.feed(&[0xFF, 0x02]).unwrap());
        assert!(decoder.feed(&[0x03]).unwrap());
        assert_eq!(decoder.payload().as_bytes(), &[0x01, 0xFF, 0x02, 0x03]);
    }

    #[test]
    fn test_bad_escape_code() {
        let mut decoder = FrameDecoder::new(INT32_FRAME_LEN);
        let err = protocol_error(decoder.feed(&[0xFF, 0x00, 0x11, 0xFF, 0x7E]));
        assert_eq!(err, ProtocolError::BadEscape(0x7E));
    }

    #[test]
    fn test_overrun_within_one_chunk() {
        let mut decoder = FrameDecoder::new(INT32_FRAME_LEN);
        let err = protocol_error(decoder.feed(&[0xFF, 0x00, 1, 2, 3, 4, 5]));
        assert_eq!(err, ProtocolError::PayloadOverrun { expected: 4 });
        assert_eq!(decoder.payload().len(), 4);
    }

    #[test]
    fn test_trailing_escape_after_completion_is_tolerated() {
        let mut decoder = FrameDecoder::new(INT32_FRAME_LEN);
        assert!(decoder.feed(&[0xFF, 0x00, 1, 2, 3, 4, 0xFF]).unwrap());
        assert!(decoder.is_escaped());
    }

    #[test]
    fn test_escape_codes() {
        assert_eq!(EscapeCode::from_primitive(0x00), EscapeCode::ParityMark);
        assert_eq!(EscapeCode::from_primitive(0xFF), EscapeCode::Literal);
        assert_eq!(EscapeCode::from_primitive(0x42), EscapeCode::Invalid(0x42));
        assert_eq!(EscapeCode::from_primitive(0x01), EscapeCode::Invalid(0x01));
        assert_eq!(EscapeCode::from_primitive(0xFE), EscapeCode::Invalid(0xFE));
        assert_eq!(u8::from(EscapeCode::ParityMark), 0x00);
        assert_eq!(u8::from(EscapeCode::Literal), 0xFF);
        assert_eq!(u8::from(EscapeCode::Invalid(0x7E)), 0x7E);
    }
}
