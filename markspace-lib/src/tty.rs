//! Linux termios backend for [`SerialLine`].
//!
//! The port is opened non-blocking and driven through tokio's [`AsyncFd`], so
//! reads are cancelled cleanly when the handshake deadline fires. Parity is
//! "stick" parity (`PARENB | CMSPAR`); `PARODD` then selects mark (set) or
//! space (clear). Input parity checking with `PARMRK` makes the driver flag
//! every mark-parity byte with an `FF 00` prefix.

use crate::config::LineConfig;
use crate::error::{MarkSpaceError, Result};
use crate::line::{Parity, SerialLine};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::unix::AsyncFd;
use tracing::{debug, info};

pub struct TtyLine {
    fd: AsyncFd<File>,
    path: PathBuf,
    settle_delay: Duration,
}

impl TtyLine {
    /// Open and configure the device described by `config`
    pub fn open(config: &LineConfig) -> Result<Self> {
        let speed = baud_to_speed(config.baud)?;
        info!(path = %config.path.display(), baud = config.baud, "Opening serial device");

        // Not our controlling tty: line noise must not be able to signal us
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&config.path)?;

        configure_raw_stick_parity(file.as_raw_fd(), speed)?;
        debug!("Line configured for stick parity with PARMRK input marking");

        Ok(Self {
            fd: AsyncFd::new(file)?,
            path: config.path.clone(),
            settle_delay: config.settle_delay,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SerialLine for TtyLine {
    async fn set_parity(&mut self, parity: Parity) -> Result<()> {
        let fd = self.fd.as_raw_fd();
        let mut tio = get_attr(fd)?;
        tio.c_cflag |= libc::CMSPAR;
        match parity {
            Parity::Mark => tio.c_cflag |= libc::PARODD,
            Parity::Space => tio.c_cflag &= !libc::PARODD,
        }
        // TCSADRAIN lets bytes already queued go out with the old parity
        set_attr(fd, libc::TCSADRAIN, &tio)?;
        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| {
                let mut file = inner.get_ref();
                file.write(bytes)
            }) {
                Ok(result) => return Ok(result?),
                Err(_would_block) => continue,
            }
        }
    }

    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|inner| {
                let mut file = inner.get_ref();
                file.read(buf)
            }) {
                Ok(result) => return Ok(result?),
                Err(_would_block) => continue,
            }
        }
    }
}

fn baud_to_speed(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        other => return Err(MarkSpaceError::UnsupportedBaud(other)),
    };
    Ok(speed)
}

fn configure_raw_stick_parity(fd: RawFd, speed: libc::speed_t) -> io::Result<()> {
    // SAFETY: termios is plain old data; all-zero is a valid starting point
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // 8 data bits, no modem control, receiver on, stick parity (space to start)
    tio.c_cflag = libc::CS8 | libc::CLOCAL | libc::CREAD | libc::PARENB | libc::CMSPAR;
    // Report parity errors in-band as FF 00 <byte>, literal FF as FF FF
    tio.c_iflag = libc::PARMRK | libc::INPCK;
    tio.c_oflag = 0;
    tio.c_lflag = 0;
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: tio is a valid, exclusively borrowed termios
    cvt(unsafe { libc::cfsetispeed(&mut tio, speed) })?;
    cvt(unsafe { libc::cfsetospeed(&mut tio, speed) })?;

    flush(fd)?;
    set_attr(fd, libc::TCSADRAIN, &tio)?;
    flush(fd)
}

fn get_attr(fd: RawFd) -> io::Result<libc::termios> {
    // SAFETY: tcgetattr fully initialises the struct on success
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };
    cvt(unsafe { libc::tcgetattr(fd, &mut tio) })?;
    Ok(tio)
}

fn set_attr(fd: RawFd, action: libc::c_int, tio: &libc::termios) -> io::Result<()> {
    // SAFETY: fd is an open tty owned by the caller
    cvt(unsafe { libc::tcsetattr(fd, action, tio) })
}

fn flush(fd: RawFd) -> io::Result<()> {
    // SAFETY: fd is an open tty owned by the caller
    cvt(unsafe { libc::tcflush(fd, libc::TCIOFLUSH) })
}

fn cvt(status: libc::c_int) -> io::Result<()> {
    if status < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
