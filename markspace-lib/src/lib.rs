//! Mark/space ("stick") parity framing over an asynchronous serial line.
//!
//! A frame is the bytes of one [`MessageBuffer`]: the first byte is sent with
//! the parity bit forced to 1 and the rest with it forced to 0. On the
//! receiving side the tty driver's parity-error marking turns that transition
//! back into an in-band `FF 00` marker, which [`FrameDecoder`] resolves.
//!
//! [`Interrogator`] uses the framing for a single challenge/response exchange:
//! two random operands out, their wrapping sum back.

pub mod buffer;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod handshake;
pub mod line;
#[cfg(target_os = "linux")]
pub mod tty;


pub use buffer::MessageBuffer;
pub use config::{HandshakeConfig, LineConfig};
pub use decoder::FrameDecoder;
pub use encoder::FrameEncoder;
pub use error::{ErrorKind, MarkSpaceError, ProtocolError};
pub use handshake::{Challenge, HandshakeReport, Interrogator, OperandSource, OsEntropy};
pub use line::{Parity, SerialLine};
#[cfg(target_os = "linux")]
pub use tty::TtyLine;
