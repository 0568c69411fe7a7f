//! Byte-stream channels to a device emulator.
//!
//! A [`Connection`] is either a FIFO pair (`<base>-cmd`, `<base>-rsp`) created by a
//! device emulator that is already running, or the stdin/stdout pipes of a child
//! process started by the harness. Responses can optionally be read with a timeout.

use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use log::{debug, warn};

pub type CommandChannel = Box<dyn Write + Send>;
pub type ResponseChannel = Box<dyn Read + Send>;

/// How long a child gets to exit on its own once its command channel is closed.
const EXIT_GRACE: Duration = Duration::from_millis(500);
const EXIT_POLL: Duration = Duration::from_millis(10);

pub struct Connection {
    pub commands: CommandChannel,
    pub responses: ResponseChannel,
    pub process: Option<ProcessGuard>,
}

impl Connection {
    pub fn fifo_paths(base: &Path) -> (PathBuf, PathBuf) {
        let base = base.as_os_str().to_string_lossy();
        (
            PathBuf::from(format!("{base}-cmd")),
            PathBuf::from(format!("{base}-rsp")),
        )
    }

    /// Open the FIFO pair of a running device emulator.
    ///
    /// Both ends are opened read-write so the open never blocks waiting for the peer.
    pub fn open_fifos(base: &Path, timeout: Option<Duration>) -> io::Result<Self> {
        let (cmd_path, rsp_path) = Self::fifo_paths(base);
        debug!("opening {} and {}", cmd_path.display(), rsp_path.display());
        let commands = OpenOptions::new().read(true).write(true).open(&cmd_path)?;
        let responses = OpenOptions::new().read(true).write(true).open(&rsp_path)?;
        Ok(Self::from_streams(commands, responses, timeout))
    }

    /// Start `program` with piped stdin (commands) and stdout (responses).
    pub fn spawn(program: &str, args: &[String], timeout: Option<Duration>) -> io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;
        debug!("spawned {program} (pid {})", child.id());

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            // Reap before reporting; piped stdio is always present after a spawn.
            drop(ProcessGuard::new(child));
            return Err(io::Error::other("child process has no stdio pipes"));
        };

        let mut connection = Self::from_streams(stdin, stdout, timeout);
        connection.process = Some(ProcessGuard::new(child));
        Ok(connection)
    }

    pub fn from_streams<W, R>(commands: W, responses: R, timeout: Option<Duration>) -> Self
    where
        W: Write + Send + 'static,
        R: Read + Send + 'static,
    {
        let responses: ResponseChannel = match timeout {
            Some(timeout) => Box::new(TimeoutReader::new(responses, timeout)),
            None => Box::new(responses),
        };
        Self {
            commands: Box::new(commands),
            responses,
            process: None,
        }
    }
}

/// Reads through a pump thread so each read can give up after `timeout`.
///
/// A timed-out read surfaces as `ErrorKind::TimedOut`. End of stream on the inner
/// reader surfaces as a zero-length read.
pub struct TimeoutReader {
    chunks: Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    offset: usize,
    timeout: Duration,
}

impl TimeoutReader {
    pub fn new<R: Read + Send + 'static>(mut inner: R, timeout: Duration) -> Self {
        let (tx, rx) = bounded(16);
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match inner.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });
        Self {
            chunks: rx,
            pending: Vec::new(),
            offset: 0,
            timeout,
        }
    }
}

impl Read for TimeoutReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.offset == self.pending.len() {
            match self.chunks.recv_timeout(self.timeout) {
                Ok(chunk) => {
                    self.pending = chunk?;
                    self.offset = 0;
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no response from device",
                    ));
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len() - self.offset);
        buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}

/// Owns a spawned device emulator and reaps it when dropped, killing it if it does
/// not exit within a short grace period.
pub struct ProcessGuard {
    child: Child,
}

impl ProcessGuard {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        let deadline = Instant::now() + EXIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("device emulator exited: {status}");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL),
                Ok(None) => break,
                Err(e) => {
                    warn!("polling device emulator: {e}");
                    break;
                }
            }
        }
        warn!("device emulator (pid {}) did not exit, killing it", self.child.id());
        if let Err(e) = self.child.kill() {
            warn!("killing device emulator: {e}");
        }
        if let Err(e) = self.child.wait() {
            warn!("reaping device emulator: {e}");
        }
    }
}
