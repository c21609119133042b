use crate::buffer::MessageBuffer;
use crate::constants::DEFAULT_SETTLE_DELAY;
use crate::error::{MarkSpaceError, Result};
use crate::line::{Parity, SerialLine};
use std::time::Duration;
use tracing::debug;

/// Transmits message buffers as mark/space frames.
///
/// The first byte goes out with mark parity, the rest with space parity. A
/// short write on either half aborts the frame; there is no partial retry.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    settle_delay: Duration,
}

impl FrameEncoder {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Send `msg` as one frame on `line`
    pub async fn send<L: SerialLine>(&self, line: &mut L, msg: &MessageBuffer) -> Result<()> {
        let Some((first, rest)) = msg.as_bytes().split_first() else {
            return Err(MarkSpaceError::EmptyFrame);
        };

        line.set_parity(Parity::Mark).await?;
        debug!(bytes = hex::encode([*first]), parity = %Parity::Mark, "Serial Write");
        let written = line.write_bytes(std::slice::from_ref(first)).await?;
        if written != 1 {
            return Err(MarkSpaceError::ShortWrite { expected: 1, written });
        }
        tokio::time::sleep(self.settle_delay).await;

        line.set_parity(Parity::Space).await?;
        if !rest.is_empty() {
            debug!(bytes = hex::encode(rest), parity = %Parity::Space, "Serial Write");
            let written = line.write_bytes(rest).await?;
            if written != rest.len() {
                return Err(MarkSpaceError::ShortWrite {
                    expected: rest.len(),
                    written,
                });
            }
        }
        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}
