use std::fmt;

use crate::num_format::{self, IntStyle};
use crate::sink::Sink;

/// Template scanning and the text-mode formatting engine.
///
/// A template is a byte string containing zero or more `{}` placeholder
/// tokens, consumed strictly left to right. `{{` and `}}` escape literal
/// braces. Placeholder and argument counts are never validated against each
/// other: surplus arguments are ignored, and template text after the last
/// consumed placeholder is emitted as-is, unmatched `{}` tokens included.

/// Cursor over a format template. Scanning is an explicit loop over the
/// bytes, so cost is linear and stack use is constant regardless of how many
/// placeholders the template contains.
pub struct Template<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Template<'a> {
    pub fn new(template: &'a str) -> Self {
        Self { bytes: template.as_bytes(), pos: 0 }
    }

    /// Emits literal text up to and including the next `{}` token.
    /// Returns `true` if a placeholder was consumed, `false` if the
    /// template ran out first.
    pub fn emit_next(&mut self, sink: &mut dyn Sink) -> bool {
        while self.pos < self.bytes.len() {
            // Copy the run up to the next brace in one append.
            let run_start = self.pos;
            while self.pos < self.bytes.len()
                && self.bytes[self.pos] != b'{'
                && self.bytes[self.pos] != b'}'
            {
                self.pos += 1;
            }
            if self.pos > run_start {
                sink.append_bytes(&self.bytes[run_start..self.pos]);
            }
            if self.pos >= self.bytes.len() {
                break;
            }
            let b = self.bytes[self.pos];
            let next = self.bytes.get(self.pos + 1).copied();
            match (b, next) {
                (b'{', Some(b'}')) => {
                    self.pos += 2;
                    return true;
                }
                (b'{', Some(b'{')) | (b'}', Some(b'}')) => {
                    sink.append_byte(b);
                    self.pos += 2;
                }
                _ => {
                    // Stray brace, emitted literally.
                    sink.append_byte(b);
                    self.pos += 1;
                }
            }
        }
        false
    }

    /// Emits the rest of the template. Escapes are still processed, but a
    /// bare `{}` no longer consumes anything and is emitted literally.
    pub fn emit_rest(&mut self, sink: &mut dyn Sink) {
        while self.pos < self.bytes.len() {
            let run_start = self.pos;
            while self.pos < self.bytes.len()
                && self.bytes[self.pos] != b'{'
                && self.bytes[self.pos] != b'}'
            {
                self.pos += 1;
            }
            if self.pos > run_start {
                sink.append_bytes(&self.bytes[run_start..self.pos]);
            }
            if self.pos >= self.bytes.len() {
                break;
            }
            let b = self.bytes[self.pos];
            let next = self.bytes.get(self.pos + 1).copied();
            match (b, next) {
                (b'{', Some(b'{')) | (b'}', Some(b'}')) => {
                    sink.append_byte(b);
                    self.pos += 2;
                }
                _ => {
                    sink.append_byte(b);
                    self.pos += 1;
                }
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

/// A value that can stringify itself into a [`Sink`].
///
/// This is the single integration point for user-defined types in text mode.
/// Types that already implement `fmt::Display` can be bridged with
/// [`display_adapter`] instead of writing an impl by hand.
pub trait Appendable {
    fn append_to(&self, sink: &mut dyn Sink);
}

macro_rules! appendable_unsigned {
    ($($t:ty),*) => {$(
        impl Appendable for $t {
            fn append_to(&self, sink: &mut dyn Sink) {
                num_format::write_u64_decimal(sink, *self as u64);
            }
        }
    )*};
}

macro_rules! appendable_signed {
    ($($t:ty),*) => {$(
        impl Appendable for $t {
            fn append_to(&self, sink: &mut dyn Sink) {
                num_format::write_i64_decimal(sink, *self as i64);
            }
        }
    )*};
}

appendable_unsigned!(u8, u16, u32, u64, usize);
appendable_signed!(i8, i16, i32, i64, isize);

impl Appendable for bool {
    fn append_to(&self, sink: &mut dyn Sink) {
        sink.append_bytes(if *self { b"true" } else { b"false" });
    }
}

impl Appendable for char {
    fn append_to(&self, sink: &mut dyn Sink) {
        let mut utf8 = [0u8; 4];
        sink.append_bytes(self.encode_utf8(&mut utf8).as_bytes());
    }
}

impl Appendable for &str {
    fn append_to(&self, sink: &mut dyn Sink) {
        sink.append_bytes(self.as_bytes());
    }
}

impl Appendable for String {
    fn append_to(&self, sink: &mut dyn Sink) {
        sink.append_bytes(self.as_bytes());
    }
}

impl Appendable for f64 {
    fn append_to(&self, sink: &mut dyn Sink) {
        num_format::write_f64(sink, *self);
    }
}

impl Appendable for f32 {
    fn append_to(&self, sink: &mut dyn Sink) {
        num_format::write_f32(sink, *self);
    }
}

/// An integer paired with an explicit [`IntStyle`], for radix and padding
/// control at the call site.
///
/// ```
/// use binform::{write_fmt, IntStyle, Styled};
///
/// let mut out = String::new();
/// write_fmt!(&mut out, "addr={}", Styled::unsigned(255, IntStyle::hex_lower().width(4).fill(b'0')));
/// assert_eq!(out, "addr=00ff");
/// ```
pub struct Styled {
    value: StyledValue,
    style: IntStyle,
}

enum StyledValue {
    Unsigned(u64),
    Signed(i64),
}

impl Styled {
    pub fn unsigned(v: u64, style: IntStyle) -> Self {
        Self { value: StyledValue::Unsigned(v), style }
    }

    pub fn signed(v: i64, style: IntStyle) -> Self {
        Self { value: StyledValue::Signed(v), style }
    }
}

impl Appendable for Styled {
    fn append_to(&self, sink: &mut dyn Sink) {
        match self.value {
            StyledValue::Unsigned(v) => num_format::format_unsigned(sink, v, &self.style),
            StyledValue::Signed(v) => num_format::format_signed(sink, v, &self.style),
        }
    }
}

struct DisplayAdapter<T: fmt::Display>(T);

impl<T: fmt::Display> Appendable for DisplayAdapter<T> {
    fn append_to(&self, sink: &mut dyn Sink) {
        struct Bridge<'a>(&'a mut dyn Sink);
        impl fmt::Write for Bridge<'_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.0.append_bytes(s.as_bytes());
                Ok(())
            }
        }
        let _ = fmt::write(&mut Bridge(sink), format_args!("{}", self.0));
    }
}

/// Bridges any `fmt::Display` type into the formatting engine. This is the
/// fallback for types without a native [`Appendable`] impl; it goes through
/// the std formatting machinery, so it is the slow path.
pub fn display_adapter<T: fmt::Display>(value: T) -> impl Appendable {
    DisplayAdapter(value)
}

/// Formats `template` into `sink`, pulling one argument per `{}` token.
///
/// ```
/// use binform::write_template;
/// use binform::format::Appendable;
///
/// let mut out = String::new();
/// write_template(&mut out, "a{}b{}c", &[&1, &2]);
/// assert_eq!(out, "a1b2c");
/// ```
pub fn write_template(sink: &mut dyn Sink, template: &str, args: &[&dyn Appendable]) {
    let mut t = Template::new(template);
    for arg in args {
        if !t.emit_next(sink) {
            return;
        }
        arg.append_to(sink);
    }
    t.emit_rest(sink);
}

/// Variadic front end for [`write_template`].
///
/// ```
/// use binform::write_fmt;
///
/// let mut out = String::new();
/// write_fmt!(&mut out, "{} + {} = {}", 2, 2, 4);
/// assert_eq!(out, "2 + 2 = 4");
/// ```
#[macro_export]
macro_rules! write_fmt {
    ($sink:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {{
        $crate::format::write_template(
            $sink,
            $fmt,
            &[$(&$arg as &dyn $crate::format::Appendable),*],
        )
    }};
}

/// Compile-time template check: only `{}`, `{{` and `}}` brace sequences are
/// allowed. Wired into `log_record!` through a const assertion so malformed
/// templates fail the build rather than the log line.
pub const fn validate_template(template: &str) -> bool {
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if i + 1 < bytes.len() && (bytes[i + 1] == b'{' || bytes[i + 1] == b'}') {
                    i += 2;
                    continue;
                }
                return false; // Lone or spec-carrying brace
            }
            b'}' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'}' {
                    i += 2;
                    continue;
                }
                return false; // Unmatched closing brace
            }
            _ => i += 1,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_validation() {
        assert!(validate_template("Test: {} value={}"));
        assert!(validate_template("no placeholders"));
        assert!(validate_template("escaped {{literal}} {}"));
        assert!(!validate_template("Test: {} value={")); // Unclosed brace
        assert!(!validate_template("Test: } value={}")); // Unopened brace
        assert!(!validate_template("named {name}")); // No named arguments
    }

    #[test]
    fn test_display_adapter() {
        let mut out = String::new();
        write_fmt!(&mut out, "addr {}", display_adapter(std::net::Ipv4Addr::LOCALHOST));
        assert_eq!(out, "addr 127.0.0.1");
    }
}
