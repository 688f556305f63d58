use crate::format::Appendable;
use crate::num_format;
use crate::sink::Sink;
use crate::string_table::StringTable;

/// Binary argument encoder.
///
/// Instead of rendering arguments to text at log time, the encoder serializes
/// them into a compact tagged byte stream: one `(tag, payload)` record per
/// argument, in placeholder order. Rendering is deferred to
/// [`restore`](crate::decode::restore), which walks the stream together with
/// the original template. All multi-byte payloads are little-endian,
/// independent of the host.

/// One-byte discriminator for an encoded argument. Wire values are fixed;
/// reorder nothing here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    Invalid = 0,
    Bool = 1,
    Char = 2,
    /// Inline string: 1-byte length prefix + data bytes.
    Str = 3,
    I8 = 4,
    U8 = 5,
    I16 = 6,
    U16 = 7,
    I32 = 8,
    U32 = 9,
    I64 = 10,
    U64 = 11,
    /// Aggregate: 2-byte member count + nested records.
    Composed = 12,
    /// 4-byte index into an external string table.
    StrRef = 13,
}

/// Payload width per tag byte; `-1` marks variable-width tags that carry
/// their own length or count field.
static PAYLOAD_WIDTHS: [i8; 14] = [0, 1, 1, -1, 1, 1, 2, 2, 4, 4, 8, 8, -1, 4];

impl TypeTag {
    pub fn from_byte(b: u8) -> Option<TypeTag> {
        use TypeTag::*;
        match b {
            0 => Some(Invalid),
            1 => Some(Bool),
            2 => Some(Char),
            3 => Some(Str),
            4 => Some(I8),
            5 => Some(U8),
            6 => Some(I16),
            7 => Some(U16),
            8 => Some(I32),
            9 => Some(U32),
            10 => Some(I64),
            11 => Some(U64),
            12 => Some(Composed),
            13 => Some(StrRef),
            _ => None,
        }
    }

    /// Fixed payload width in bytes, or `None` for variable-width tags.
    pub fn fixed_payload_width(self) -> Option<usize> {
        match PAYLOAD_WIDTHS[self as usize] {
            -1 => None,
            w => Some(w as usize),
        }
    }
}

/// Longest inline string payload; bounded by the 1-byte length prefix.
pub const MAX_INLINE_STR: usize = 255;

/// Serializes arguments into a caller-provided scratch buffer.
///
/// Encoding is fail-soft: an argument that does not fit in the remaining
/// scratch space is dropped whole (its record is simply absent from the
/// stream), never split. The decoder treats a short stream as "remaining
/// placeholders have no arguments" and degrades to literal template text.
///
/// # Examples
///
/// ```
/// use binform::{Encoder, restore};
///
/// let mut scratch = [0u8; 64];
/// let mut enc = Encoder::new(&mut scratch);
/// enc.add(&42u64);
/// enc.add(&true);
///
/// let mut out = String::new();
/// restore(&mut out, "n={} ok={}", enc.bytes(), None);
/// assert_eq!(out, "n=42 ok=true");
/// ```
pub struct Encoder<'a> {
    buf: &'a mut [u8],
    pos: usize,
    records: usize,
    table: Option<&'a dyn StringTable>,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0, records: 0, table: None }
    }

    /// An encoder that may intern strings into `table` (see [`Interned`]).
    pub fn with_table(buf: &'a mut [u8], table: &'a dyn StringTable) -> Self {
        Self { buf, pos: 0, records: 0, table: Some(table) }
    }

    /// The encoded stream so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Number of top-level records emitted so far.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Encodes one argument.
    pub fn add<T: Encode + ?Sized>(&mut self, value: &T) {
        value.encode(self);
    }

    /// Encodes a user aggregate as a composed record.
    ///
    /// The closure flattens the aggregate by `add`ing its members. The
    /// wrapper header is decided retroactively: more than one member gets a
    /// `Composed` header with the member count patched in; exactly one member
    /// has the header bytes shifted out so the record is indistinguishable
    /// from the member passed directly; zero members emit nothing at all.
    pub fn composed(&mut self, flatten: impl FnOnce(&mut Encoder<'a>)) {
        let start = self.pos;
        if self.buf.len() - self.pos < 3 {
            return; // No room for even the header, drop the argument
        }
        self.pos += 3; // tag + u16 count, patched below
        let outer_records = self.records;
        self.records = 0;
        flatten(self);
        let members = self.records;
        self.records = outer_records;
        match members {
            0 => {
                self.pos = start;
            }
            1 => {
                // Reclaim the header: shift the single member record left.
                self.buf.copy_within(start + 3..self.pos, start);
                self.pos -= 3;
                self.records += 1;
            }
            n => {
                self.buf[start] = TypeTag::Composed as u8;
                let count = n.min(u16::MAX as usize) as u16;
                self.buf[start + 1..start + 3].copy_from_slice(&count.to_le_bytes());
                self.records += 1;
            }
        }
    }

    /// Writes `tag` followed by the concatenated parts, or drops the record
    /// whole if it does not fit.
    fn emit(&mut self, tag: TypeTag, parts: &[&[u8]]) {
        let payload: usize = parts.iter().map(|p| p.len()).sum();
        if self.buf.len() - self.pos < 1 + payload {
            return;
        }
        self.buf[self.pos] = tag as u8;
        self.pos += 1;
        for part in parts {
            self.buf[self.pos..self.pos + part.len()].copy_from_slice(part);
            self.pos += part.len();
        }
        self.records += 1;
    }

    /// Narrows to the smallest unsigned tag that holds `v` losslessly.
    fn put_unsigned(&mut self, v: u64) {
        if v <= u8::MAX as u64 {
            self.emit(TypeTag::U8, &[&[v as u8]]);
        } else if v <= u16::MAX as u64 {
            self.emit(TypeTag::U16, &[&(v as u16).to_le_bytes()]);
        } else if v <= u32::MAX as u64 {
            self.emit(TypeTag::U32, &[&(v as u32).to_le_bytes()]);
        } else {
            self.emit(TypeTag::U64, &[&v.to_le_bytes()]);
        }
    }

    /// Narrows to the smallest signed tag that holds `v` losslessly.
    fn put_signed(&mut self, v: i64) {
        if v >= i8::MIN as i64 && v <= i8::MAX as i64 {
            self.emit(TypeTag::I8, &[&(v as i8).to_le_bytes()]);
        } else if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
            self.emit(TypeTag::I16, &[&(v as i16).to_le_bytes()]);
        } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
            self.emit(TypeTag::I32, &[&(v as i32).to_le_bytes()]);
        } else {
            self.emit(TypeTag::I64, &[&v.to_le_bytes()]);
        }
    }

    fn put_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        if bytes.len() == 1 {
            // Single-byte strings ride in a Char record, saving the length byte.
            self.emit(TypeTag::Char, &[bytes]);
            return;
        }
        let capped = if bytes.len() > MAX_INLINE_STR {
            // Land the cut on a char boundary.
            let mut end = MAX_INLINE_STR;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            &bytes[..end]
        } else {
            bytes
        };
        self.emit(TypeTag::Str, &[&[capped.len() as u8], capped]);
    }

    fn put_interned(&mut self, s: &str) {
        // Without a table there is nowhere to intern into; the argument is
        // silently absent from the stream, matching the fail-soft policy.
        if let Some(table) = self.table {
            let index = table.get_index(s);
            self.emit(TypeTag::StrRef, &[&index.to_le_bytes()]);
        }
    }
}

/// A value that can serialize itself into an [`Encoder`] record.
///
/// Aggregates implement this by flattening through
/// [`Encoder::composed`]:
///
/// ```
/// use binform::{Encode, Encoder, restore};
///
/// struct Point { x: i32, y: i32 }
///
/// impl Encode for Point {
///     fn encode(&self, enc: &mut Encoder) {
///         enc.composed(|e| {
///             e.add(&self.x);
///             e.add(&self.y);
///         });
///     }
/// }
///
/// let mut scratch = [0u8; 64];
/// let mut enc = Encoder::new(&mut scratch);
/// enc.add(&Point { x: 3, y: -4 });
/// enc.add(&Point { x: 3, y: -4 });
///
/// let mut out = String::new();
/// restore(&mut out, "p1=({}) p2=({})", enc.bytes(), None);
/// assert_eq!(out, "p1=(3 -4) p2=(3 -4)");
/// ```
pub trait Encode {
    fn encode(&self, enc: &mut Encoder<'_>);
}

macro_rules! encode_unsigned {
    ($($t:ty),*) => {$(
        impl Encode for $t {
            fn encode(&self, enc: &mut Encoder<'_>) {
                enc.put_unsigned(*self as u64);
            }
        }
    )*};
}

macro_rules! encode_signed {
    ($($t:ty),*) => {$(
        impl Encode for $t {
            fn encode(&self, enc: &mut Encoder<'_>) {
                enc.put_signed(*self as i64);
            }
        }
    )*};
}

encode_unsigned!(u8, u16, u32, u64, usize);
encode_signed!(i8, i16, i32, i64, isize);

impl Encode for bool {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.emit(TypeTag::Bool, &[&[u8::from(*self)]]);
    }
}

impl Encode for char {
    fn encode(&self, enc: &mut Encoder<'_>) {
        let mut utf8 = [0u8; 4];
        let s = self.encode_utf8(&mut utf8);
        if s.len() == 1 {
            enc.emit(TypeTag::Char, &[s.as_bytes()]);
        } else {
            enc.put_str(s);
        }
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.put_str(self);
    }
}

impl Encode for &str {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.put_str(self);
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.put_str(self);
    }
}

/// Bounded stack sink for stringifying floats without allocating.
struct StackSink<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> Sink for StackSink<N> {
    fn append_byte(&mut self, b: u8) {
        if self.len < N {
            self.buf[self.len] = b;
            self.len += 1;
        }
    }

    fn append_bytes(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(N - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }
}

// There are no float tags on the wire: floats are stringified once at encode
// time and carried as inline strings, which also keeps restore output
// identical to direct text formatting. The conversion switches to exponent
// form before a rendering can outgrow MAX_INLINE_STR, so the sink never
// truncates.
impl Encode for f64 {
    fn encode(&self, enc: &mut Encoder<'_>) {
        let mut s = StackSink::<{ MAX_INLINE_STR }> { buf: [0u8; MAX_INLINE_STR], len: 0 };
        num_format::write_f64(&mut s, *self);
        enc.put_str(std::str::from_utf8(&s.buf[..s.len]).unwrap_or(""));
    }
}

impl Encode for f32 {
    fn encode(&self, enc: &mut Encoder<'_>) {
        let mut s = StackSink::<{ MAX_INLINE_STR }> { buf: [0u8; MAX_INLINE_STR], len: 0 };
        num_format::write_f32(&mut s, *self);
        enc.put_str(std::str::from_utf8(&s.buf[..s.len]).unwrap_or(""));
    }
}

/// Marks a string for table-backed storage: the stream carries a 4-byte
/// index instead of the bytes. Requires an encoder constructed with
/// [`Encoder::with_table`]; without a table the argument is dropped.
///
/// In text mode an `Interned` argument formats as the plain string.
pub struct Interned<'a>(pub &'a str);

impl Encode for Interned<'_> {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.put_interned(self.0);
    }
}

impl Appendable for Interned<'_> {
    fn append_to(&self, sink: &mut dyn Sink) {
        sink.append_bytes(self.0.as_bytes());
    }
}
