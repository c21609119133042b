use crate::error::Result;
use strum_macros::Display;

/// Stick parity setting applied to bytes written after the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Parity {
    /// Parity bit forced to 1. Marks the first byte of a frame.
    #[strum(serialize = "mark")]
    Mark,
    /// Parity bit forced to 0. Every byte after the first.
    #[strum(serialize = "space")]
    Space,
}

/// The raw capabilities the protocol needs from a serial line.
///
/// Implementations deliver received bytes with the driver's parity marking
/// intact: a parity-marked byte arrives prefixed with `FF 00` and a literal
/// `FF` arrives doubled.
#[allow(async_fn_in_trait)]
pub trait SerialLine {
    /// Switch the parity used for subsequently written bytes
    async fn set_parity(&mut self, parity: Parity) -> Result<()>;

    /// Write `bytes`, returning how many the line accepted
    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Read whatever is available into `buf`, waiting for at least one readiness event
    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize>;
}
