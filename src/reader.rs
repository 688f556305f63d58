use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::decode;
use crate::logger::{RECORD_KIND_BASE, RECORD_KIND_DATA};
use crate::string_table::StringTable;

/// Reader for the framed record stream produced by
/// [`BinaryLogger`](crate::logger::BinaryLogger).
///
/// The reader walks records sequentially, consuming base-timestamp records
/// internally and yielding one [`LogEntry`] per data record. Rendering an
/// entry back to text goes through [`decode::restore`] with the same string
/// table the logger wrote with.

/// One data record from the stream.
#[derive(Debug)]
pub struct LogEntry<'a> {
    /// Absolute time the record was written.
    pub timestamp: SystemTime,

    /// Index of the format template in the string table.
    pub format_id: u32,

    /// The encoded argument stream for this record.
    pub payload: &'a [u8],
}

impl LogEntry<'_> {
    /// Renders the entry as human-readable text.
    ///
    /// Resolves the template through `table` and restores the argument
    /// stream into it. An unknown format id produces a visible fallback line
    /// instead of an error; the log may simply predate the table contents.
    pub fn render(&self, table: &dyn StringTable) -> String {
        let mut out = String::new();
        match table.get_str(self.format_id) {
            Some(template) => {
                decode::restore(&mut out, &template, self.payload, Some(table));
            }
            None => {
                out.push_str("[[Unknown format id: ");
                out.push_str(&self.format_id.to_string());
                out.push_str("]]");
            }
        }
        out
    }
}

/// Sequential reader over a binary log byte stream.
///
/// Handler output chunks concatenate into a valid stream, so feeding the
/// reader a whole collected log is enough; there are no chunk headers to
/// strip.
///
/// # Examples
///
/// ```
/// # use binform::{BinaryLogger, BufferHandler, InternTable, LogReader, log_record};
/// # use std::sync::{Arc, Mutex};
/// # struct Collect(Arc<Mutex<Vec<u8>>>);
/// # impl BufferHandler for Collect {
/// #     fn handle_full_buffer(&self, data: &[u8]) {
/// #         self.0.lock().unwrap().extend_from_slice(data);
/// #     }
/// # }
/// # let data = Arc::new(Mutex::new(Vec::new()));
/// # let table = Arc::new(InternTable::new());
/// # {
/// #     let mut logger = BinaryLogger::<1024>::new(Collect(data.clone()), table.clone());
/// #     log_record!(logger, "count {}", 3);
/// # }
/// let data = data.lock().unwrap();
/// for entry in LogReader::new(&data) {
///     println!("{}", entry.render(table.as_ref()));
/// }
/// ```
pub struct LogReader<'a> {
    data: &'a [u8],
    pos: usize,
    base_micros: Option<u64>,
}

impl<'a> LogReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, base_micros: None }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.pos + len <= self.data.len() {
            let slice = &self.data[self.pos..self.pos + len];
            self.pos += len;
            Some(slice)
        } else {
            None
        }
    }

    fn read_u16(&mut self) -> Option<u16> {
        let b = self.read_bytes(2)?;
        Some(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Option<u32> {
        let b = self.read_bytes(4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Option<u64> {
        let b = self.read_bytes(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(b);
        Some(u64::from_le_bytes(bytes))
    }

    /// Reads the next data record, consuming base-timestamp records along
    /// the way. Returns `None` at end of stream or on a record the reader
    /// cannot walk past (unknown kind, truncated frame).
    pub fn read_entry(&mut self) -> Option<LogEntry<'a>> {
        loop {
            if self.pos >= self.data.len() {
                return None;
            }
            let kind = self.read_u8()?;
            match kind {
                RECORD_KIND_BASE => {
                    self.base_micros = Some(self.read_u64()?);
                }
                RECORD_KIND_DATA => {
                    let rel = self.read_u32()?;
                    let format_id = self.read_u32()?;
                    let payload_len = self.read_u16()? as usize;
                    let payload = self.read_bytes(payload_len)?;
                    let micros = self.base_micros.unwrap_or(0) + rel as u64;
                    return Some(LogEntry {
                        timestamp: UNIX_EPOCH + Duration::from_micros(micros),
                        format_id,
                        payload,
                    });
                }
                other => {
                    // A bad kind byte means the stream is desynchronized;
                    // record boundaries cannot be recovered past this point.
                    log::warn!("unknown record kind {other} at offset {}", self.pos - 1);
                    return None;
                }
            }
        }
    }
}

impl<'a> Iterator for LogReader<'a> {
    type Item = LogEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_entry()
    }
}
