use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PhyError, Result};

/// Send half of a named-pipe channel.
#[derive(Debug)]
pub struct FifoSender {
    file: File,
    path: PathBuf,
}

/// Receive half of a named-pipe channel.
#[derive(Debug)]
pub struct FifoReceiver {
    file: File,
    path: PathBuf,
}

/// Open a duplex channel over two FIFOs.
///
/// Each FIFO is created if missing and opened read+write, so neither
/// endpoint blocks in `open` waiting for its peer. The peer process calls
/// this with the two paths swapped; one side's send pipe is the other
/// side's receive pipe.
pub fn open_pair(
    send_path: impl AsRef<Path>,
    recv_path: impl AsRef<Path>,
) -> Result<(FifoSender, FifoReceiver)> {
    let send_path = send_path.as_ref().to_path_buf();
    let recv_path = recv_path.as_ref().to_path_buf();

    create_fifo(&send_path)?;
    create_fifo(&recv_path)?;

    let sender = FifoSender {
        file: open_rdwr(&send_path)?,
        path: send_path,
    };
    let receiver = FifoReceiver {
        file: open_rdwr(&recv_path)?,
        path: recv_path,
    };

    info!(send = ?sender.path, recv = ?receiver.path, "fifo channel open");
    Ok((sender, receiver))
}

fn create_fifo(path: &Path) -> Result<()> {
    let c_path = std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        PhyError::CreateFifo {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"),
        }
    })?;

    // SAFETY: c_path is a valid NUL-terminated string for the duration of
    // the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o666) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::AlreadyExists {
            debug!(?path, "fifo already exists, reusing");
            return Ok(());
        }
        return Err(PhyError::CreateFifo {
            path: path.to_path_buf(),
            source: err,
        });
    }
    Ok(())
}

fn open_rdwr(path: &Path) -> Result<File> {
    // Read+write even on the send-only half: a FIFO opened for writing
    // alone blocks until a reader appears, and reports EPIPE if the reader
    // goes away. Holding both directions keeps the pipe alive across peer
    // restarts.
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| PhyError::Open {
            path: path.to_path_buf(),
            source,
        })
}

impl FifoSender {
    /// The path this half writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FifoReceiver {
    /// The path this half reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FifoSender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Read for FifoReceiver {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
