use crate::encode::TypeTag;
use crate::format::Template;
use crate::num_format;
use crate::sink::Sink;
use crate::string_table::StringTable;

/// Binary argument decoder: re-materializes text from a template plus the
/// tagged byte stream produced by [`Encoder`](crate::encode::Encoder).
///
/// Decoding never fails outward: table misses, unknown tags and truncated
/// records render bracketed diagnostics inline so a human reading the output
/// sees the problem, and the decoder never reads past the end of the stream.

/// Bounds-checked cursor over the encoded stream. Every read returns `None`
/// on shortfall instead of touching out-of-range bytes.
struct StreamCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
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
        let bytes = self.read_bytes(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_bytes(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_unsigned(&mut self, width: usize) -> Option<u64> {
        let bytes = self.read_bytes(width)?;
        let mut v = 0u64;
        for (i, &b) in bytes.iter().enumerate() {
            v |= (b as u64) << (8 * i);
        }
        Some(v)
    }

    /// Little-endian sign-extending read.
    fn read_signed(&mut self, width: usize) -> Option<i64> {
        let raw = self.read_unsigned(width)?;
        let shift = 64 - 8 * width as u32;
        Some(((raw << shift) as i64) >> shift)
    }
}

fn emit_diag(sink: &mut dyn Sink, label: &str, value: Option<u64>) {
    sink.append_bytes(b"[[");
    sink.append_bytes(label.as_bytes());
    if let Some(v) = value {
        sink.append_bytes(b": ");
        num_format::write_u64_decimal(sink, v);
    }
    sink.append_bytes(b"]]");
}

/// Nesting bound for composed records. Well-formed streams nest as deep as
/// the encoding types do; anything past this is a corrupt stream, not data.
const MAX_COMPOSED_DEPTH: u32 = 16;

/// Decodes one record into `sink`. Returns `false` when the stream can no
/// longer be trusted (unknown tag or truncated payload), after emitting a
/// diagnostic placeholder.
fn decode_record(
    cur: &mut StreamCursor<'_>,
    sink: &mut dyn Sink,
    table: Option<&dyn StringTable>,
    depth: u32,
) -> bool {
    let Some(tag_byte) = cur.read_u8() else {
        emit_diag(sink, "Truncated record", None);
        return false;
    };
    let Some(tag) = TypeTag::from_byte(tag_byte) else {
        log::warn!("unknown type tag {tag_byte} in encoded stream");
        emit_diag(sink, "Unknown type tag", Some(tag_byte as u64));
        return false;
    };
    match tag {
        TypeTag::Invalid => {
            log::warn!("invalid type tag in encoded stream");
            emit_diag(sink, "Unknown type tag", Some(0));
            false
        }
        TypeTag::Bool => match cur.read_u8() {
            Some(b) => {
                sink.append_bytes(if b != 0 { b"true" } else { b"false" });
                true
            }
            None => {
                emit_diag(sink, "Truncated record", None);
                false
            }
        },
        TypeTag::Char => match cur.read_u8() {
            Some(b) => {
                sink.append_byte(b);
                true
            }
            None => {
                emit_diag(sink, "Truncated record", None);
                false
            }
        },
        TypeTag::Str => {
            let payload = cur.read_u8().and_then(|len| cur.read_bytes(len as usize));
            match payload {
                Some(bytes) => {
                    sink.append_bytes(bytes);
                    true
                }
                None => {
                    emit_diag(sink, "Truncated record", None);
                    false
                }
            }
        }
        TypeTag::U8 | TypeTag::U16 | TypeTag::U32 | TypeTag::U64 => {
            // Fixed width straight from the tag table.
            let width = tag.fixed_payload_width().unwrap_or(0);
            match cur.read_unsigned(width) {
                Some(v) => {
                    num_format::write_u64_decimal(sink, v);
                    true
                }
                None => {
                    emit_diag(sink, "Truncated record", None);
                    false
                }
            }
        }
        TypeTag::I8 | TypeTag::I16 | TypeTag::I32 | TypeTag::I64 => {
            let width = tag.fixed_payload_width().unwrap_or(0);
            match cur.read_signed(width) {
                Some(v) => {
                    num_format::write_i64_decimal(sink, v);
                    true
                }
                None => {
                    emit_diag(sink, "Truncated record", None);
                    false
                }
            }
        }
        TypeTag::Composed => {
            if depth >= MAX_COMPOSED_DEPTH {
                log::warn!("composed records nested deeper than {MAX_COMPOSED_DEPTH}");
                emit_diag(sink, "Malformed record", None);
                return false;
            }
            let Some(count) = cur.read_u16() else {
                emit_diag(sink, "Truncated record", None);
                return false;
            };
            // Members render in sequence, space-separated. A count of one
            // never appears on the wire (the encoder elides the wrapper),
            // but decoding it anyway costs nothing.
            for i in 0..count {
                if i > 0 {
                    sink.append_byte(b' ');
                }
                if !decode_record(cur, sink, table, depth + 1) {
                    return false;
                }
            }
            true
        }
        TypeTag::StrRef => {
            let Some(index) = cur.read_u32() else {
                emit_diag(sink, "Truncated record", None);
                return false;
            };
            match table.and_then(|t| t.get_str(index)) {
                Some(s) => sink.append_bytes(s.as_bytes()),
                None => {
                    log::warn!("string table lookup miss for index {index}");
                    emit_diag(sink, "Invalid string index", Some(index as u64));
                }
            }
            true
        }
    }
}

/// Walks `template` and the encoded `stream` together, rendering one record
/// per `{}` placeholder into `sink`. Returns the number of stream bytes
/// consumed.
///
/// Degenerate shapes degrade instead of failing: a stream that runs out
/// before the placeholders do leaves the rest of the template literal
/// (matching the encoder's drop-on-full behavior), surplus records are never
/// consumed, and malformed records stop consumption after an inline
/// diagnostic.
///
/// # Examples
///
/// ```
/// use binform::{Encoder, restore};
///
/// let mut scratch = [0u8; 32];
/// let mut enc = Encoder::new(&mut scratch);
/// enc.add(&-7i32);
///
/// let mut out = String::new();
/// restore(&mut out, "delta {} end", enc.bytes(), None);
/// assert_eq!(out, "delta -7 end");
/// ```
pub fn restore(
    sink: &mut dyn Sink,
    template: &str,
    stream: &[u8],
    table: Option<&dyn StringTable>,
) -> usize {
    let mut t = Template::new(template);
    let mut cur = StreamCursor::new(stream);
    loop {
        if cur.is_at_end() {
            break;
        }
        if !t.emit_next(sink) {
            // Template exhausted; trailing records are simply not consumed.
            break;
        }
        if !decode_record(&mut cur, sink, table, 0) {
            break;
        }
    }
    t.emit_rest(sink);
    cur.pos
}
