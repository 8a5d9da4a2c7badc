//! User-facing verbose output.
//!
//! Separate from `tracing`: this is what a driver prints for `--verbose`,
//! routed to a sink the caller chooses. The default sink discards.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

#[derive(Clone, Default)]
pub struct Logger {
    sink: Option<Sink>,
}

impl Logger {
    /// A logger that discards everything.
    pub fn null() -> Self {
        Self { sink: None }
    }

    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(Box::new(writer)))),
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.sink.is_some()
    }

    /// Write one line. Write errors are dropped: verbose output is best effort.
    pub fn log(&self, message: impl fmt::Display) {
        if let Some(sink) = &self.sink {
            let _ = writeln!(sink.lock(), "{message}");
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbose", &self.is_verbose())
            .finish()
    }
}

/// In-memory sink whose contents stay readable after handing a clone to a [`Logger`].
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn null_logger_is_silent() {
        let logger = Logger::null();
        assert!(!logger.is_verbose());
        logger.log("dropped");
    }

    #[test]
    fn buffer_receives_lines() {
        let buffer = LogBuffer::new();
        let logger = Logger::new(buffer.clone());
        logger.log("first");
        logger.clone().log(format_args!("second {}", 2));

        assert!(logger.is_verbose());
        assert_eq!(buffer.contents(), "first\nsecond 2\n");
    }
}
