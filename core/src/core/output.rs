//! Shared line-oriented text sink.
//!
//! The monitor, the run loop (trace lines) and the address space (watch
//! events) all write to the same [`Output`], so lines from each appear in
//! the order the events happened.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

type Sink = Box<dyn Write + Send>;

/// Cloneable handle to a text sink. Every clone writes to the same target.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// An output that records everything written to it, plus a reader for
    /// the recorded text.
    pub fn capture() -> (Self, Capture) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let output = Self::new(CaptureWriter(Arc::clone(&buffer)));
        (output, Capture(buffer))
    }

    /// Write one line. A failed write to the sink is dropped: the monitor
    /// has nowhere else to report it.
    pub fn line(&self, text: impl fmt::Display) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(sink, "{text}");
        let _ = sink.flush();
    }

    /// Write several lines under a single lock so nothing interleaves.
    pub fn lines<I, T>(&self, lines: I)
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        for text in lines {
            let _ = writeln!(sink, "{text}");
        }
        let _ = sink.flush();
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Output")
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Read side of [`Output::capture`].
#[derive(Clone)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
