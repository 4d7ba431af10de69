//! Table of open streams keyed by integer handles.
//!
//! One counter feeds both the read and the write side, so a handle value
//! names at most one stream. Values are never recycled.

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};

use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::fs_abstraction::{InputStream, OutputStream};
use crate::types::Handle;

pub struct HandleTable {
    next: u64,
    reads: HashMap<Handle, InputStream>,
    writes: HashMap<Handle, OutputStream>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            next: 1,
            reads: HashMap::new(),
            writes: HashMap::new(),
        }
    }

    fn allocate(&mut self) -> Handle {
        let handle = Handle::new(self.next);
        self.next += 1;
        handle
    }

    pub fn open_read(&mut self, stream: InputStream) -> Handle {
        let handle = self.allocate();
        self.reads.insert(handle, stream);
        debug!(%handle, "opened read stream");
        handle
    }

    pub fn open_write(&mut self, stream: OutputStream) -> Handle {
        let handle = self.allocate();
        self.writes.insert(handle, stream);
        debug!(%handle, "opened write stream");
        handle
    }

    /// Write the whole buffer to the stream behind `handle`.
    pub fn write(&mut self, handle: Handle, bytes: &[u8]) -> Result<()> {
        let stream = self
            .writes
            .get_mut(&handle)
            .ok_or_else(|| BridgeError::InvalidArgument(format!("invalid handle: {}", handle)))?;
        stream
            .write_all(bytes)
            .map_err(|e| BridgeError::WriteFailed(format!("Failed to write: {}", e)))
    }

    /// One bounded read of at most `max_bytes`. An empty result means the
    /// stream is exhausted.
    pub fn read(&mut self, handle: Handle, max_bytes: usize) -> Result<Vec<u8>> {
        if max_bytes == 0 {
            return Err(BridgeError::InvalidArgument("maxBytes must be positive".to_string()));
        }
        let stream = self
            .reads
            .get_mut(&handle)
            .ok_or_else(|| BridgeError::InvalidArgument(format!("invalid handle: {}", handle)))?;

        let mut buf = vec![0u8; max_bytes];
        let n = loop {
            match stream.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BridgeError::ReadFailed(format!("Failed to read: {}", e))),
            }
        };
        buf.truncate(n);
        Ok(buf)
    }

    /// Drop the read stream if present. Never fails.
    pub fn close_read(&mut self, handle: Handle) {
        if self.reads.remove(&handle).is_some() {
            debug!(%handle, "closed read stream");
        }
    }

    /// Flush and drop the write stream if present. Flush errors are logged
    /// and swallowed.
    pub fn close_write(&mut self, handle: Handle) {
        if let Some(mut stream) = self.writes.remove(&handle) {
            if let Err(e) = stream.flush() {
                warn!(%handle, error = %e, "flush on close failed");
            }
            debug!(%handle, "closed write stream");
        }
    }

    /// Release every open stream, flushing writers first.
    pub fn close_all(&mut self) {
        let writes: Vec<Handle> = self.writes.keys().copied().collect();
        for handle in writes {
            self.close_write(handle);
        }
        self.reads.clear();
    }

    pub fn open_count(&self) -> usize {
        self.reads.len() + self.writes.len()
    }
}
