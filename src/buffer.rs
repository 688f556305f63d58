use crate::sink::Sink;

/// Handler for buffer contents flushed out of a [`FormatBuffer`].
///
/// Implementations decide what happens to formatted data once a buffer fills
/// up or is explicitly flushed: write it to disk, send it over the network,
/// compress it, count it. The handler is responsible for all I/O, allowing
/// the buffer itself to stay a pure in-memory structure.
///
/// # Usage
///
/// ```
/// # use binform::{BufferHandler, FormatBuffer, Sink};
/// # use std::cell::RefCell;
/// // Collect flushed chunks for inspection
/// struct Collect(RefCell<Vec<u8>>);
///
/// impl BufferHandler for Collect {
///     fn handle_full_buffer(&self, data: &[u8]) {
///         self.0.borrow_mut().extend_from_slice(data);
///     }
/// }
/// ```
pub trait BufferHandler {
    /// Process the contents of a buffer that filled up or was flushed.
    ///
    /// The slice is only valid for the duration of the call; the buffer is
    /// cleared and reused as soon as the handler returns.
    fn handle_full_buffer(&self, data: &[u8]);
}

/// A fixed-capacity text buffer with overflow-flush semantics.
///
/// The buffer owns `CAP` bytes and a length cursor, and is designed to be
/// reused across many format calls via [`clear`](FormatBuffer::clear) so the
/// formatting path never allocates. Appends never fail from the caller's
/// perspective:
///
/// * with a [`BufferHandler`] attached, an append that would overflow first
///   hands the current contents to the handler, clears, and resumes — looping
///   if the remainder is still larger than the whole buffer;
/// * without a handler, an append that cannot fit in the remaining space is
///   silently dropped whole (no error, no partial write). Formatting output
///   is never worth failing the caller over.
///
/// # Examples
///
/// ```
/// use binform::{FormatBuffer, Sink};
///
/// let mut buf = FormatBuffer::<64>::new();
/// buf.append_bytes(b"hello ");
/// buf.append_bytes(b"world");
/// assert_eq!(buf.contents(), b"hello world");
/// buf.clear();
/// assert!(buf.is_empty());
/// ```
pub struct FormatBuffer<const CAP: usize> {
    buf: Box<[u8]>,
    len: usize,
    handler: Option<Box<dyn BufferHandler>>,
}

impl<const CAP: usize> FormatBuffer<CAP> {
    /// Creates an empty buffer with no overflow handler attached.
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; CAP].into_boxed_slice(),
            len: 0,
            handler: None,
        }
    }

    /// Creates an empty buffer that flushes to `handler` on overflow.
    pub fn with_handler(handler: impl BufferHandler + 'static) -> Self {
        Self {
            buf: vec![0u8; CAP].into_boxed_slice(),
            len: 0,
            handler: Some(Box::new(handler)),
        }
    }

    /// Read-only view of the current contents. Valid until the next
    /// mutating call.
    pub fn contents(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        CAP
    }

    /// Resets the length to zero. The allocation is retained for reuse.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Forces the current contents out to the handler, if one is attached,
    /// and clears the buffer.
    pub fn flush(&mut self) {
        if self.len == 0 {
            return;
        }
        if let Some(handler) = self.handler.as_ref() {
            handler.handle_full_buffer(&self.buf[..self.len]);
        }
        self.len = 0;
    }

    fn remaining(&self) -> usize {
        CAP - self.len
    }

    /// Hands the full contents to the handler and clears. Only called when a
    /// handler is attached.
    fn flush_to_handler(&mut self) {
        if let Some(handler) = self.handler.as_ref() {
            if self.len > 0 {
                handler.handle_full_buffer(&self.buf[..self.len]);
            }
        }
        self.len = 0;
    }
}

impl<const CAP: usize> Default for FormatBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> Sink for FormatBuffer<CAP> {
    fn append_byte(&mut self, b: u8) {
        if CAP == 0 {
            return;
        }
        if self.len == CAP {
            if self.handler.is_some() {
                self.flush_to_handler();
            } else {
                return;
            }
        }
        self.buf[self.len] = b;
        self.len += 1;
    }

    fn append_repeat(&mut self, b: u8, mut count: usize) {
        if CAP == 0 {
            return;
        }
        if self.handler.is_none() {
            if count > self.remaining() {
                return;
            }
            self.buf[self.len..self.len + count].fill(b);
            self.len += count;
            return;
        }
        // Fill, flush, repeat. Iterative so an arbitrarily large count
        // never grows the stack.
        while count > 0 {
            let fit = count.min(self.remaining());
            self.buf[self.len..self.len + fit].fill(b);
            self.len += fit;
            count -= fit;
            if count > 0 {
                self.flush_to_handler();
            }
        }
    }

    fn append_bytes(&mut self, mut bytes: &[u8]) {
        if CAP == 0 {
            return;
        }
        if self.handler.is_none() {
            if bytes.len() > self.remaining() {
                return;
            }
            self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
            self.len += bytes.len();
            return;
        }
        while !bytes.is_empty() {
            let fit = bytes.len().min(self.remaining());
            self.buf[self.len..self.len + fit].copy_from_slice(&bytes[..fit]);
            self.len += fit;
            bytes = &bytes[fit..];
            if !bytes.is_empty() {
                self.flush_to_handler();
            }
        }
    }
}
