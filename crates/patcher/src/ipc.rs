//! Line channel between the host and the UI process
//!
//! The UI process is started with all three standard streams redirected.
//! Host log lines are queued without blocking and a writer thread pushes
//! them to the child's stdin on a fixed cadence, one flush per batch.
//! Whatever the child prints comes back through two reader threads and ends
//! up in the host's log.
//!
//! The channel tears itself down when the child exits, when its stdout
//! closes or when a write fails. Teardown is idempotent.

use loading_screen_core::line_queue::LineQueue;
use loading_screen_core::protocol::{denormalize, normalize};
use parking_lot::Mutex;
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Writer cadence. Lines queued within one interval share a flush.
pub const WRITE_INTERVAL: Duration = Duration::from_millis(150);

/// Prefix of relayed UI output in the host log
pub const DEFAULT_TAG: &str = "[GUI]";

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("executable not found or inaccessible at {}", .0.display())]
    ExecutableNotFound(PathBuf),
    #[error("failed to start {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("child {0} was not redirected")]
    MissingStream(&'static str),
    #[error("failed to start channel thread: {0}")]
    Thread(#[source] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStream {
    Stdout,
    Stderr,
}

/// Destination for lines the child prints
pub trait LogSink: Send + Sync {
    /// `line` is the raw wire line, terminator already removed
    fn forward(&self, stream: ChildStream, line: &str);
}

/// Relays child output into tracing: stdout at debug, stderr at error
#[derive(Debug, Clone)]
pub struct TracingSink {
    tag: String,
}

impl TracingSink {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

impl LogSink for TracingSink {
    fn forward(&self, stream: ChildStream, line: &str) {
        let text = denormalize(line);
        match stream {
            ChildStream::Stdout => debug!("{} {}", self.tag, text),
            ChildStream::Stderr => error!("{} {}", self.tag, text),
        }
    }
}

struct ChannelShared {
    child: Mutex<Child>,
    queue: LineQueue,
    torn_down: AtomicBool,
    pid: u32,
}

impl ChannelShared {
    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    fn child_exited(&self) -> bool {
        match self.child.lock().try_wait() {
            Ok(Some(status)) => {
                debug!("GUI process exited with {}", status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to query GUI process state: {}", e);
                true
            }
        }
    }

    fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let discarded = self.queue.close();
        if discarded > 0 {
            debug!("Discarded {} queued lines", discarded);
        }

        terminate(&mut *self.child.lock(), self.pid);
    }
}

/// Process operations teardown needs
trait ChildControl {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl ChildControl for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Kill the child if it still runs and reap it. A child that could not be
/// killed is left alone: waiting on it could block forever.
fn terminate<C: ChildControl>(child: &mut C, pid: u32) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    debug!("Closing GUI process");
    match child.kill() {
        Ok(()) => {}
        // Already exited between the check and the kill
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
        Err(e) => {
            warn!("Failed to kill GUI process {}: {}", pid, e);
            return;
        }
    }
    // Reap
    let _ = child.wait();
}

/// Handle to a running UI process. Cheap to clone.
#[derive(Clone)]
pub struct IpcChannel {
    inner: Arc<ChannelShared>,
}

impl IpcChannel {
    /// Start `executable` with `args` and begin relaying
    pub fn spawn<I, S>(executable: &Path, args: I, sink: Arc<dyn LogSink>) -> Result<Self, SpawnError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if !executable.is_file() {
            return Err(SpawnError::ExecutableNotFound(executable.to_path_buf()));
        }

        let mut child = Command::new(executable)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SpawnError::Io {
                path: executable.to_path_buf(),
                source,
            })?;

        let streams = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (Some(stdin), Some(stdout), Some(stderr)) = streams else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SpawnError::MissingStream("stdio"));
        };

        let pid = child.id();
        let channel = Self {
            inner: Arc::new(ChannelShared {
                child: Mutex::new(child),
                queue: LineQueue::new(),
                torn_down: AtomicBool::new(false),
                pid,
            }),
        };

        if let Err(e) = channel.start_threads(stdin, stdout, stderr, sink) {
            channel.shutdown();
            return Err(SpawnError::Thread(e));
        }

        debug!("Started GUI process {} from {}", pid, executable.display());
        Ok(channel)
    }

    fn start_threads(
        &self,
        stdin: ChildStdin,
        stdout: impl Read + Send + 'static,
        stderr: impl Read + Send + 'static,
        sink: Arc<dyn LogSink>,
    ) -> io::Result<()> {
        let shared = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("splash-ipc-writer".to_string())
            .spawn(move || write_loop(shared, stdin))?;

        let shared = Arc::clone(&self.inner);
        let out_sink = Arc::clone(&sink);
        thread::Builder::new()
            .name("splash-ipc-stdout".to_string())
            .spawn(move || read_loop(shared, ChildStream::Stdout, stdout, out_sink))?;

        let shared = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("splash-ipc-stderr".to_string())
            .spawn(move || read_loop(shared, ChildStream::Stderr, stderr, sink))?;

        Ok(())
    }

    /// Queue a log line for the UI process. Never blocks; after teardown
    /// the line is dropped.
    pub fn enqueue(&self, line: &str) {
        if self.inner.is_torn_down() {
            return;
        }
        self.inner.queue.push(normalize(line));
    }

    /// False once the channel has been torn down
    pub fn is_alive(&self) -> bool {
        !self.inner.is_torn_down()
    }

    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    /// Lines waiting for the next writer tick
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    /// Tear the channel down and kill the UI process if it still runs
    pub fn shutdown(&self) {
        self.inner.teardown();
    }
}

fn write_loop(shared: Arc<ChannelShared>, stdin: ChildStdin) {
    let mut writer = BufWriter::new(stdin);
    debug!("Connected to the GUI process");

    while !shared.is_torn_down() && !shared.child_exited() {
        let lines = shared.queue.drain();
        if !lines.is_empty() {
            if let Err(e) = write_batch(&mut writer, &lines) {
                error!("Failed to write to the GUI process, aborting: {}", e);
                break;
            }
        }
        thread::sleep(WRITE_INTERVAL);
    }

    shared.teardown();
}

fn write_batch<W: Write>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

fn read_loop<R: Read>(shared: Arc<ChannelShared>, stream: ChildStream, source: R, sink: Arc<dyn LogSink>) {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                sink.forward(stream, text.trim_end_matches(['\n', '\r']));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Failed to read GUI {:?}: {}", stream, e);
                break;
            }
        }
    }

    // stdout closing means the child is gone or no longer talking to us
    if stream == ChildStream::Stdout {
        shared.teardown();
    }
}
