use std::sync::Arc;

use crate::buffer::{BufferHandler, FormatBuffer};
use crate::clock::TimestampConverter;
use crate::encode::Encoder;
use crate::sink::Sink;
use crate::string_table::{InternTable, StringTable};

/// The deferred-formatting logger: interns the template, binary-encodes the
/// arguments, and frames the result into a [`FormatBuffer`] whose overflow
/// handler is the caller's I/O boundary. Text rendering happens later, in
/// [`LogReader`](crate::reader::LogReader).
///
/// # Record framing
///
/// Data record: `[0 | rel_micros(4) | format_id(4) | payload_len(2) | payload]`.
/// Base record: `[1 | base_micros(8)]`, emitted whenever the clock resets.
/// All fields little-endian.
///
/// # Thread safety
///
/// A logger is single-threaded by design: one instance per thread, no locks
/// on the hot path. Threads share the [`InternTable`], which serializes its
/// own mutation.
///
/// # Examples
///
/// ```
/// use binform::{BinaryLogger, BufferHandler, InternTable, LogReader, log_record};
/// use std::sync::{Arc, Mutex};
///
/// struct Collect(Arc<Mutex<Vec<u8>>>);
/// impl BufferHandler for Collect {
///     fn handle_full_buffer(&self, data: &[u8]) {
///         self.0.lock().unwrap().extend_from_slice(data);
///     }
/// }
///
/// let data = Arc::new(Mutex::new(Vec::new()));
/// let table = Arc::new(InternTable::new());
/// {
///     let mut logger = BinaryLogger::<4096>::new(Collect(data.clone()), table.clone());
///     log_record!(logger, "Temperature: {} C", 25.5);
///     log_record!(logger, "Status: {}, Count: {}", true, 42);
/// } // drop flushes
///
/// let data = data.lock().unwrap();
/// let rendered: Vec<String> = LogReader::new(&data)
///     .map(|entry| entry.render(table.as_ref()))
///     .collect();
/// assert_eq!(rendered, ["Temperature: 25.5 C", "Status: true, Count: 42"]);
/// ```
pub struct BinaryLogger<const CAP: usize> {
    buffer: FormatBuffer<CAP>,
    table: Arc<InternTable>,
    clock: TimestampConverter,
}

pub(crate) const RECORD_KIND_DATA: u8 = 0;
pub(crate) const RECORD_KIND_BASE: u8 = 1;

/// Scratch size for one record's encoded arguments. Arguments that do not
/// fit are dropped from the record, never split.
pub const MAX_RECORD_PAYLOAD: usize = 1024;

impl<const CAP: usize> BinaryLogger<CAP> {
    /// Creates a logger flushing to `handler`, interning templates and
    /// [`Interned`](crate::encode::Interned) strings into `table`.
    pub fn new(handler: impl BufferHandler + 'static, table: Arc<InternTable>) -> Self {
        Self {
            buffer: FormatBuffer::with_handler(handler),
            table,
            clock: TimestampConverter::new(),
        }
    }

    /// The shared string table; readers need it to resolve format ids.
    pub fn table(&self) -> &Arc<InternTable> {
        &self.table
    }

    /// Writes one record. `encode_args` receives an encoder backed by a
    /// stack scratch buffer and should `add` each argument in placeholder
    /// order. Prefer the [`log_record!`](crate::log_record) macro, which also
    /// validates the template at compile time.
    pub fn log_with(&mut self, template: &str, encode_args: impl FnOnce(&mut Encoder<'_>)) {
        let format_id = self.table.get_index(template);

        let mut scratch = [0u8; MAX_RECORD_PAYLOAD];
        let mut enc = Encoder::with_table(&mut scratch, self.table.as_ref());
        encode_args(&mut enc);
        let payload = enc.bytes();

        let (rel, is_base) = self.clock.relative_micros();
        if is_base {
            let mut base = [0u8; 9];
            base[0] = RECORD_KIND_BASE;
            base[1..9].copy_from_slice(&self.clock.base_micros().to_le_bytes());
            self.buffer.append_bytes(&base);
        }

        let mut header = [0u8; 11];
        header[0] = RECORD_KIND_DATA;
        header[1..5].copy_from_slice(&rel.to_le_bytes());
        header[5..9].copy_from_slice(&format_id.to_le_bytes());
        header[9..11].copy_from_slice(&(payload.len() as u16).to_le_bytes());
        self.buffer.append_bytes(&header);
        self.buffer.append_bytes(payload);
    }

    /// Forces buffered records out to the handler.
    pub fn flush(&mut self) {
        self.buffer.flush();
    }
}

impl<const CAP: usize> Drop for BinaryLogger<CAP> {
    fn drop(&mut self) {
        self.buffer.flush();
    }
}

/// Logs a record with the given template and arguments.
///
/// Interns the template on first use, binary-encodes the arguments, and
/// writes the framed record. The template is checked at compile time: only
/// `{}`, `{{` and `}}` brace sequences are accepted.
///
/// ```
/// # use binform::{BinaryLogger, BufferHandler, InternTable, log_record};
/// # use std::sync::Arc;
/// # struct Discard;
/// # impl BufferHandler for Discard { fn handle_full_buffer(&self, _: &[u8]) {} }
/// # let mut logger = BinaryLogger::<1024>::new(Discard, Arc::new(InternTable::new()));
/// log_record!(logger, "plain message");
/// log_record!(logger, "Temperature: {} C", 25.5);
/// log_record!(logger, "Status: {}, Count: {}", true, 42);
/// ```
#[macro_export]
macro_rules! log_record {
    ($logger:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        const _: () = assert!(
            $crate::format::validate_template($fmt),
            "invalid log template",
        );
        $logger.log_with($fmt, |enc| {
            $( enc.add(&$arg); )*
            let _ = enc;
        })
    }};
}
