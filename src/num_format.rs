use std::fmt::Write as _;

use crate::sink::Sink;

/// Numeric-to-text conversion primitives.
///
/// Everything here writes digits into small stack buffers and hands the
/// finished span to a [`Sink`] in one call, so a format call never allocates.

/// Pre-rendered digit pairs 00..=99. Halves the number of divisions in the
/// decimal conversion loop versus digit-by-digit.
static DIGIT_PAIRS: &[u8; 200] = b"\
0001020304050607080910111213141516171819\
2021222324252627282930313233343536373839\
4041424344454647484950515253545556575859\
6061626364656667686970717273747576777879\
8081828384858687888990919293949596979899";

static HEX_LOWER: &[u8; 16] = b"0123456789abcdef";
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Widest rendering an integer can produce: u64 in binary.
const INT_SCRATCH: usize = 64;

/// Longest `f64` rendering produced by the std `Display` conversion, which
/// never switches to exponent notation: the smallest subnormal prints as
/// "0." followed by 323 zeros and the significant digits, and `f64::MAX`
/// prints 309 integral digits. Sign + 345 digits fits with slack to spare.
const FLOAT_SCRATCH: usize = 352;

/// Longest plain float rendering emitted as-is. Matches the binary encoder's
/// inline string limit ([`MAX_INLINE_STR`](crate::encode::MAX_INLINE_STR)):
/// anything longer switches to exponent form, so the exact same text fits an
/// encoded record and the round trip stays lossless.
const FLOAT_PLAIN_MAX: usize = 255;

/// Number base for integer formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Octal,
    Decimal,
    HexLower,
    HexUpper,
}

/// Integer formatting spec: base, optional minimum field width, fill byte.
///
/// Width is a minimum achieved by left-padding with the fill byte; output is
/// never truncated. For negative values the sign is written first and counts
/// toward the width, so the fill always lands between the sign and the
/// digits: `-07` for zero fill, `-  7` for space fill.
///
/// # Examples
///
/// ```
/// use binform::{IntStyle, Sink, format_unsigned, format_signed};
///
/// let mut out = String::new();
/// format_unsigned(&mut out, 255, &IntStyle::hex_lower().width(4).fill(b'0'));
/// assert_eq!(out, "00ff");
///
/// let mut out = String::new();
/// format_signed(&mut out, -7, &IntStyle::decimal().width(3).fill(b'0'));
/// assert_eq!(out, "-07");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IntStyle {
    pub radix: Radix,
    pub width: usize,
    pub fill: u8,
}

impl IntStyle {
    pub const fn new(radix: Radix) -> Self {
        Self { radix, width: 0, fill: b' ' }
    }

    pub const fn decimal() -> Self {
        Self::new(Radix::Decimal)
    }

    pub const fn binary() -> Self {
        Self::new(Radix::Binary)
    }

    pub const fn octal() -> Self {
        Self::new(Radix::Octal)
    }

    pub const fn hex_lower() -> Self {
        Self::new(Radix::HexLower)
    }

    pub const fn hex_upper() -> Self {
        Self::new(Radix::HexUpper)
    }

    /// Minimum field width. Zero means no padding.
    pub const fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub const fn fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }
}

impl Default for IntStyle {
    fn default() -> Self {
        Self::decimal()
    }
}

/// Renders the decimal digits of `v` backwards into `scratch`, returning the
/// index of the first digit.
fn decimal_digits(scratch: &mut [u8; INT_SCRATCH], mut v: u64) -> usize {
    let mut i = INT_SCRATCH;
    while v >= 100 {
        let pair = (v % 100) as usize * 2;
        v /= 100;
        i -= 2;
        scratch[i] = DIGIT_PAIRS[pair];
        scratch[i + 1] = DIGIT_PAIRS[pair + 1];
    }
    if v >= 10 {
        let pair = v as usize * 2;
        i -= 2;
        scratch[i] = DIGIT_PAIRS[pair];
        scratch[i + 1] = DIGIT_PAIRS[pair + 1];
    } else {
        i -= 1;
        scratch[i] = b'0' + v as u8;
    }
    i
}

/// Renders `v` in a power-of-two base given `bits` per digit (1 = binary,
/// 3 = octal, 4 = hex). Returns the index of the first digit.
fn pow2_digits(scratch: &mut [u8; INT_SCRATCH], mut v: u64, bits: u32, table: &[u8; 16]) -> usize {
    let mask = (1u64 << bits) - 1;
    let mut i = INT_SCRATCH;
    loop {
        i -= 1;
        scratch[i] = table[(v & mask) as usize];
        v >>= bits;
        if v == 0 {
            break;
        }
    }
    i
}

fn digits(scratch: &mut [u8; INT_SCRATCH], v: u64, radix: Radix) -> usize {
    match radix {
        Radix::Decimal => decimal_digits(scratch, v),
        Radix::Binary => pow2_digits(scratch, v, 1, HEX_LOWER),
        Radix::Octal => pow2_digits(scratch, v, 3, HEX_LOWER),
        Radix::HexLower => pow2_digits(scratch, v, 4, HEX_LOWER),
        Radix::HexUpper => pow2_digits(scratch, v, 4, HEX_UPPER),
    }
}

/// Writes `v` in decimal with no padding.
pub fn write_u64_decimal(sink: &mut dyn Sink, v: u64) {
    let mut scratch = [0u8; INT_SCRATCH];
    let start = decimal_digits(&mut scratch, v);
    sink.append_bytes(&scratch[start..]);
}

/// Writes `v` in decimal with no padding. The magnitude of `i64::MIN` is
/// computed on the unsigned representation, where negation wraps to the
/// correct value instead of overflowing.
pub fn write_i64_decimal(sink: &mut dyn Sink, v: i64) {
    if v < 0 {
        sink.append_byte(b'-');
        write_u64_decimal(sink, (v as u64).wrapping_neg());
    } else {
        write_u64_decimal(sink, v as u64);
    }
}

/// Formats an unsigned value per `style`.
pub fn format_unsigned(sink: &mut dyn Sink, v: u64, style: &IntStyle) {
    let mut scratch = [0u8; INT_SCRATCH];
    let start = digits(&mut scratch, v, style.radix);
    let ndigits = INT_SCRATCH - start;
    if style.width > ndigits {
        sink.append_repeat(style.fill, style.width - ndigits);
    }
    sink.append_bytes(&scratch[start..]);
}

/// Formats a signed value per `style`. The sign is emitted first and counts
/// toward the field width; padding goes between the sign and the digits
/// regardless of the fill byte (`-07` for zero fill, `-  7` for space fill,
/// never ` -7`). The magnitude conversion is overflow-safe for `i64::MIN`.
pub fn format_signed(sink: &mut dyn Sink, v: i64, style: &IntStyle) {
    let (negative, magnitude) = if v < 0 {
        (true, (v as u64).wrapping_neg())
    } else {
        (false, v as u64)
    };
    let mut scratch = [0u8; INT_SCRATCH];
    let start = digits(&mut scratch, magnitude, style.radix);
    let ndigits = INT_SCRATCH - start;
    let total = ndigits + usize::from(negative);
    if negative {
        sink.append_byte(b'-');
    }
    if style.width > total {
        sink.append_repeat(style.fill, style.width - total);
    }
    sink.append_bytes(&scratch[start..]);
}

/// Fixed-size `fmt::Write` scratch for the float conversion.
struct FloatScratch {
    buf: [u8; FLOAT_SCRATCH],
    len: usize,
}

impl std::fmt::Write for FloatScratch {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let bytes = s.as_bytes();
        let n = bytes.len().min(FLOAT_SCRATCH - self.len);
        self.buf[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        Ok(())
    }
}

fn write_float(sink: &mut dyn Sink, v: impl std::fmt::Display + std::fmt::LowerExp) {
    let mut scratch = FloatScratch { buf: [0u8; FLOAT_SCRATCH], len: 0 };
    let _ = write!(scratch, "{}", v);
    if scratch.len > FLOAT_PLAIN_MAX {
        scratch.len = 0;
        let _ = write!(scratch, "{:e}", v);
    }
    sink.append_bytes(&scratch.buf[..scratch.len]);
}

/// Writes `v` using the std shortest-rendering conversion. No custom float
/// algorithm: the scratch buffer is sized for the longest rendering the
/// conversion can produce, so the `min` in `write_str` never truncates.
///
/// Values whose plain rendering runs past 255 bytes (extreme magnitudes and
/// subnormals) are written in exponent form instead, e.g. `5e-324` rather
/// than 323 zeros followed by a 5.
pub fn write_f64(sink: &mut dyn Sink, v: f64) {
    write_float(sink, v);
}

pub fn write_f32(sink: &mut dyn Sink, v: f32) {
    write_float(sink, v);
}
