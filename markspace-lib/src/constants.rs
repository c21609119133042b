// Wire and timing constants for the mark/space protocol

use std::time::Duration;

/// Maximum number of bytes a message buffer can hold
pub const MSG_BUFFER_CAPACITY: usize = 256;

/// Payload length of an int32 frame (4 bytes, little-endian)
pub const INT32_FRAME_LEN: usize = 4;

/// First byte of a PARMRK marker; also the first byte of an escaped literal 0xFF
pub const ESCAPE_BYTE: u8 = 0xFF;

/// Continuation after `ESCAPE_BYTE` signalling a parity-marked (frame start) byte
pub const ESCAPE_PARITY_MARK: u8 = 0x00;

/// Continuation after `ESCAPE_BYTE` signalling a literal 0xFF data byte
pub const ESCAPE_LITERAL: u8 = 0xFF;

/// Leading bytes of a setpoint control frame, followed by setpoint, setpoint, checksum
pub const SETPOINT_PREFIX: [u8; 3] = [0x87, 0x09, 0x03];

/// Length of a setpoint control frame (6 bytes)
pub const SETPOINT_FRAME_LEN: usize = 6;

/// Master-to-slave poll frame
pub const POLL_SLAVE_FRAME: [u8; 3] = [0x87, 0x00, 0x87];

/// Slave acknowledgement frame
pub const SLAVE_OK_FRAME: [u8; 5] = [0x07, 0x01, 0x03, 0x04, 0x0F];

/// Number of raw bytes requested per read while waiting for a response
pub const READ_CHUNK_SIZE: usize = 4;

/// Time FTDI-style bridges need after a parity change before the next byte goes out
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Deadline for the whole exchange, measured from queuing the first operand
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default line speed
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Default serial device
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";
