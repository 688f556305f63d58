//! # binform
//!
//! A performance-oriented text/binary formatting and logging library built
//! around two subsystems:
//!
//! * a **bounded text formatter**: fixed-capacity buffers with
//!   overflow-flush semantics, allocation-free numeric conversion, and a
//!   `{}`-template engine;
//! * a **binary argument codec**: log-time encoding of heterogeneous
//!   arguments into a compact tagged byte stream, with text rendering
//!   deferred to read time. This decouples the expensive formatting work
//!   from the latency-critical logging call.
//!
//! ## Main components
//!
//! * [`FormatBuffer`] / [`Sink`]: bounded buffer and the append capability
//!   every formatter targets
//! * [`write_fmt!`](write_fmt) / [`write_template`]: direct text formatting
//! * [`Encoder`] / [`restore`]: the deferred binary pipeline
//! * [`BinaryLogger`] / [`LogReader`]: framed records over a shared
//!   [`InternTable`] (one logger per thread; the table serializes itself)
//!
//! ## Quick start
//!
//! ```
//! use binform::{BinaryLogger, BufferHandler, InternTable, LogReader, log_record};
//! use std::sync::{Arc, Mutex};
//!
//! struct Collect(Arc<Mutex<Vec<u8>>>);
//! impl BufferHandler for Collect {
//!     fn handle_full_buffer(&self, data: &[u8]) {
//!         self.0.lock().unwrap().extend_from_slice(data);
//!     }
//! }
//!
//! let data = Arc::new(Mutex::new(Vec::new()));
//! let table = Arc::new(InternTable::new());
//! {
//!     let mut logger = BinaryLogger::<4096>::new(Collect(data.clone()), table.clone());
//!     log_record!(logger, "Hello, world!");
//!     log_record!(logger, "Temperature: {} C", 25.5);
//! }
//!
//! let data = data.lock().unwrap();
//! let lines: Vec<String> = LogReader::new(&data)
//!     .map(|e| e.render(table.as_ref()))
//!     .collect();
//! assert_eq!(lines, ["Hello, world!", "Temperature: 25.5 C"]);
//! ```
//!
//! Formatting never fails outward: full buffers truncate or drop, malformed
//! streams render bracketed diagnostics. A log line is never worth crashing
//! the program that wrote it.

pub mod buffer;
pub mod clock;
pub mod decode;
pub mod encode;
pub mod format;
pub mod logger;
pub mod num_format;
pub mod reader;
pub mod sink;
pub mod string_table;

pub use buffer::{BufferHandler, FormatBuffer};
pub use clock::TimestampConverter;
pub use decode::restore;
pub use encode::{Encode, Encoder, Interned, TypeTag};
pub use format::{display_adapter, validate_template, write_template, Appendable, Styled, Template};
pub use logger::{BinaryLogger, MAX_RECORD_PAYLOAD};
pub use num_format::{format_signed, format_unsigned, write_f32, write_f64, IntStyle, Radix};
pub use reader::{LogEntry, LogReader};
pub use sink::Sink;
pub use string_table::{InternTable, StringTable};
