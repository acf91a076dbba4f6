//! Logging setup for the UI process
//!
//! The host reads the UI process's stdout and stderr line by line and
//! relays them into its own log, so every tracing event has to leave this
//! process as exactly one wire line. Errors and warnings go to stderr,
//! everything else to stdout.

use crate::protocol::normalize;
use std::io::{self, Write};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Buffers one formatted event and writes it as a single line when dropped
pub struct WireLine {
    buf: Vec<u8>,
    stream: Stream,
}

impl Write for WireLine {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for WireLine {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = encode_event(&self.buf);
        // Nowhere left to report a failed write to
        let _ = match self.stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{}", line),
            Stream::Stderr => writeln!(io::stderr().lock(), "{}", line),
        };
    }
}

/// Fold a formatted event into one wire line
pub fn encode_event(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    normalize(text.trim_end_matches(['\n', '\r']))
}

/// [`MakeWriter`] that splits events between stdout and stderr by level
#[derive(Debug, Clone, Copy, Default)]
pub struct WireMakeWriter;

impl<'a> MakeWriter<'a> for WireMakeWriter {
    type Writer = WireLine;

    fn make_writer(&'a self) -> Self::Writer {
        WireLine {
            buf: Vec::new(),
            stream: Stream::Stdout,
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        let stream = if *meta.level() <= Level::WARN {
            Stream::Stderr
        } else {
            Stream::Stdout
        };
        WireLine {
            buf: Vec::new(),
            stream,
        }
    }
}

/// Install the global subscriber for the UI process.
/// `RUST_LOG` overrides the default `debug` level.
pub fn init_wire_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(WireMakeWriter)
        .with_ansi(false)
        .without_time()
        .try_init();
}
