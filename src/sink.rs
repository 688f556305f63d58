/// Append-only output capability consumed by every formatter in the crate.
///
/// This is the entire surface the core requires from an output destination:
/// a single byte, a repeated byte (padding), or a byte span. Anything that
/// implements these three operations can receive formatted text, whether it
/// is an in-memory buffer, a growable vector, or a string.
///
/// # Examples
///
/// ```
/// use binform::Sink;
///
/// let mut out = Vec::new();
/// out.append_bytes(b"x = ");
/// out.append_byte(b'7');
/// assert_eq!(out, b"x = 7");
/// ```
pub trait Sink {
    /// Appends a single byte.
    fn append_byte(&mut self, b: u8);

    /// Appends `count` copies of `b`. Used for field padding.
    fn append_repeat(&mut self, b: u8, count: usize) {
        for _ in 0..count {
            self.append_byte(b);
        }
    }

    /// Appends a byte span.
    fn append_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.append_byte(b);
        }
    }
}

impl Sink for Vec<u8> {
    fn append_byte(&mut self, b: u8) {
        self.push(b);
    }

    fn append_repeat(&mut self, b: u8, count: usize) {
        self.resize(self.len() + count, b);
    }

    fn append_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// String sinks accept formatted output directly. Formatter output is valid
/// UTF-8 except for raw single-byte appends above 0x7f, which are replaced.
impl Sink for String {
    fn append_byte(&mut self, b: u8) {
        if b.is_ascii() {
            self.push(b as char);
        } else {
            self.push(char::REPLACEMENT_CHARACTER);
        }
    }

    fn append_repeat(&mut self, b: u8, count: usize) {
        for _ in 0..count {
            self.append_byte(b);
        }
    }

    fn append_bytes(&mut self, bytes: &[u8]) {
        match std::str::from_utf8(bytes) {
            Ok(s) => self.push_str(s),
            Err(_) => self.push_str(&String::from_utf8_lossy(bytes)),
        }
    }
}
