//! Fixed-capacity message buffer shared by the send and receive paths.
//!
//! A [`MessageBuffer`] never grows past [`MSG_BUFFER_CAPACITY`]. Every append
//! is bounds-checked up front and leaves the buffer untouched on failure,
//! which is what the frame decoder leans on when the peer sends more than it
//! should.

use crate::constants::{
    INT32_FRAME_LEN, MSG_BUFFER_CAPACITY, POLL_SLAVE_FRAME, SETPOINT_FRAME_LEN, SETPOINT_PREFIX,
    SLAVE_OK_FRAME,
};
use crate::error::{MarkSpaceError, Result};
use bytes::{Buf, BufMut};
use std::cmp::Ordering;
use std::fmt;

#[derive(Clone)]
pub struct MessageBuffer {
    len: usize,
    data: [u8; MSG_BUFFER_CAPACITY],
}

impl MessageBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            len: 0,
            data: [0; MSG_BUFFER_CAPACITY],
        }
    }

    /// Create a buffer holding a copy of `bytes`
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut msg = Self::new();
        msg.append(bytes)?;
        Ok(msg)
    }

    /// Create a buffer holding `value` as a 4-byte little-endian frame
    pub fn from_i32(value: i32) -> Self {
        let mut msg = Self::new();
        msg.set_i32(value);
        msg
    }

    /// The fixed poll frame a master sends to its slave
    pub fn poll_slave() -> Self {
        Self::from_fixed(&POLL_SLAVE_FRAME)
    }

    /// The fixed frame a slave answers a poll with
    pub fn slave_ok() -> Self {
        Self::from_fixed(&SLAVE_OK_FRAME)
    }

    fn from_fixed(frame: &[u8]) -> Self {
        let mut msg = Self::new();
        msg.data[..frame.len()].copy_from_slice(frame);
        msg.len = frame.len();
        msg
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        MSG_BUFFER_CAPACITY
    }

    /// Bytes still available for appending
    pub fn remaining(&self) -> usize {
        MSG_BUFFER_CAPACITY - self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Empty the buffer. Stale contents are left in place and ignored.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append `bytes`, or fail without touching the buffer if they don't fit
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if self.remaining() < bytes.len() {
            return Err(MarkSpaceError::CapacityExceeded {
                requested: bytes.len(),
                available: self.remaining(),
            });
        }
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    pub fn append_byte(&mut self, byte: u8) -> Result<()> {
        if self.remaining() < 1 {
            return Err(MarkSpaceError::CapacityExceeded {
                requested: 1,
                available: 0,
            });
        }
        self.data[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    /// Overwrite the buffer with the little-endian encoding of `value`
    pub fn set_i32(&mut self, value: i32) {
        let mut dst = &mut self.data[..INT32_FRAME_LEN];
        dst.put_i32_le(value);
        self.len = INT32_FRAME_LEN;
    }

    /// Decode a 4-byte little-endian signed integer
    pub fn as_i32(&self) -> Result<i32> {
        if self.len != INT32_FRAME_LEN {
            return Err(MarkSpaceError::InvalidLength {
                expected: INT32_FRAME_LEN,
                actual: self.len,
            });
        }
        let mut src = self.as_bytes();
        Ok(src.get_i32_le())
    }

    /// Wrapping sum of every byte except the last.
    ///
    /// The last position is where control frames carry their own checksum,
    /// so it never contributes.
    pub fn checksum(&self) -> u8 {
        match self.as_bytes().split_last() {
            Some((_, body)) => body.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)),
            None => 0,
        }
    }

    /// Overwrite the buffer with a setpoint control frame:
    /// `87 09 03 <sp> <sp> <checksum>`
    pub fn set_control_frame(&mut self, setpoint: u8) {
        self.data[..SETPOINT_PREFIX.len()].copy_from_slice(&SETPOINT_PREFIX);
        self.data[3] = setpoint;
        self.data[4] = setpoint;
        self.data[5] = 0x00;
        self.len = SETPOINT_FRAME_LEN;
        self.data[5] = self.checksum();
    }

    /// Upper-case hex, one space-separated pair per byte
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for MessageBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for MessageBuffer {}

impl PartialOrd for MessageBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageBuffer {
    // Length first, then contents
    fn cmp(&self, other: &Self) -> Ordering {
        self.len
            .cmp(&other.len)
            .then_with(|| self.as_bytes().cmp(other.as_bytes()))
    }
}

impl AsRef<[u8]> for MessageBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl TryFrom<&[u8]> for MessageBuffer {
    type Error = MarkSpaceError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_slice(bytes)
    }
}

impl fmt::Display for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("len", &self.len)
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}
