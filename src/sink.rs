use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Where rendered output goes.
///
/// Cheap to clone; every clone writes to the same destination, which is how
/// nested views share their caller's output. The engine never closes the
/// destination and writes exactly once per `print`.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl OutputSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Wraps a writer the caller keeps a handle to, e.g. a buffer to read
    /// back after rendering.
    pub fn from_shared<W: Write + Send + 'static>(writer: Arc<Mutex<W>>) -> Self {
        Self { inner: writer }
    }

    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write_all(bytes)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}
