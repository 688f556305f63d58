use binform::{
    restore, write_template, Appendable, Encode, Encoder, InternTable, Interned, StringTable,
    TypeTag,
};

fn encode_into(scratch: &mut [u8], build: impl FnOnce(&mut Encoder)) -> usize {
    let mut enc = Encoder::new(scratch);
    build(&mut enc);
    enc.len()
}

fn restore_str(template: &str, stream: &[u8], table: Option<&dyn StringTable>) -> String {
    let mut out = String::new();
    restore(&mut out, template, stream, table);
    out
}

/// Encode-then-restore must produce the same text as direct formatting.
#[test]
fn test_round_trip_matches_text_mode() {
    let template = "b={} c={} s={} i={} u={} f={}";
    let args: &[&dyn Appendable] =
        &[&true, &'x', &"hello", &-12345i32, &98765u32, &2.75f64];

    let mut direct = String::new();
    write_template(&mut direct, template, args);

    let mut scratch = [0u8; 256];
    let len = encode_into(&mut scratch, |enc| {
        enc.add(&true);
        enc.add(&'x');
        enc.add(&"hello");
        enc.add(&-12345i32);
        enc.add(&98765u32);
        enc.add(&2.75f64);
    });

    assert_eq!(restore_str(template, &scratch[..len], None), direct);
    assert_eq!(direct, "b=true c=x s=hello i=-12345 u=98765 f=2.75");
}

/// A narrowed integer must decode to the same text as its wide original.
#[test]
fn test_width_narrowing_idempotence() {
    for v in [0u64, 200, 300, 70_000, 5_000_000_000] {
        let mut wide = [0u8; 16];
        let wide_len = encode_into(&mut wide, |enc| enc.add(&v));

        let mut narrow = [0u8; 16];
        let narrow_len = match v {
            v if v <= u8::MAX as u64 => encode_into(&mut narrow, |e| e.add(&(v as u8))),
            v if v <= u16::MAX as u64 => encode_into(&mut narrow, |e| e.add(&(v as u16))),
            v if v <= u32::MAX as u64 => encode_into(&mut narrow, |e| e.add(&(v as u32))),
            _ => encode_into(&mut narrow, |e| e.add(&v)),
        };

        assert_eq!(&wide[..wide_len], &narrow[..narrow_len], "value {v}");
        assert_eq!(
            restore_str("{}", &wide[..wide_len], None),
            v.to_string(),
            "value {v}"
        );
    }

    // Signed narrowing keeps the sign through the smaller tag.
    let mut scratch = [0u8; 16];
    let len = encode_into(&mut scratch, |enc| enc.add(&-7i64));
    assert_eq!(scratch[0], TypeTag::I8 as u8);
    assert_eq!(restore_str("{}", &scratch[..len], None), "-7");
}

/// Extreme floats whose plain rendering exceeds the inline string limit must
/// still restore to exactly the direct-formatting text (exponent form), not a
/// truncated digit string.
#[test]
fn test_extreme_floats_round_trip() {
    for v in [5e-324f64, f64::MAX, 1e300, -2.225073858507201e-308] {
        let mut direct = String::new();
        write_template(&mut direct, "{}", &[&v]);
        assert_eq!(direct, format!("{v:e}"), "value {v:e}");

        let mut scratch = [0u8; 300];
        let len = encode_into(&mut scratch, |enc| enc.add(&v));
        assert_eq!(restore_str("{}", &scratch[..len], None), direct, "value {v:e}");
    }
}

#[test]
fn test_min_signed_values_round_trip() {
    let mut scratch = [0u8; 64];
    let len = encode_into(&mut scratch, |enc| {
        enc.add(&i8::MIN);
        enc.add(&i16::MIN);
        enc.add(&i32::MIN);
        enc.add(&i64::MIN);
    });
    assert_eq!(
        restore_str("{} {} {} {}", &scratch[..len], None),
        "-128 -32768 -2147483648 -9223372036854775808"
    );
}

struct Point {
    x: i32,
    y: i32,
}

impl Encode for Point {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.composed(|e| {
            e.add(&self.x);
            e.add(&self.y);
        });
    }
}

struct Wrapped(u32);

impl Encode for Wrapped {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.composed(|e| e.add(&self.0));
    }
}

struct Empty;

impl Encode for Empty {
    fn encode(&self, enc: &mut Encoder<'_>) {
        enc.composed(|_| {});
    }
}

#[test]
fn test_composed_multi_member() {
    let mut scratch = [0u8; 64];
    let len = encode_into(&mut scratch, |enc| enc.add(&Point { x: 3, y: -4 }));
    assert_eq!(scratch[0], TypeTag::Composed as u8);
    assert_eq!(u16::from_le_bytes([scratch[1], scratch[2]]), 2);
    assert_eq!(restore_str("p=({})", &scratch[..len], None), "p=(3 -4)");
}

/// One flattened member decodes identically to the primitive passed directly.
#[test]
fn test_composed_single_member_collapse() {
    let mut wrapped = [0u8; 64];
    let wrapped_len = encode_into(&mut wrapped, |enc| enc.add(&Wrapped(9)));

    let mut bare = [0u8; 64];
    let bare_len = encode_into(&mut bare, |enc| enc.add(&9u32));

    assert_eq!(&wrapped[..wrapped_len], &bare[..bare_len]);
    assert_eq!(restore_str("{}", &wrapped[..wrapped_len], None), "9");
}

/// Zero members emit nothing and must not desynchronize later placeholders.
#[test]
fn test_composed_zero_members_absent() {
    let mut scratch = [0u8; 64];
    let len = encode_into(&mut scratch, |enc| {
        enc.add(&Empty);
        enc.add(&11u8);
    });
    // The stream holds only the u8 record; it binds to the first placeholder
    // and the second degrades to literal text.
    assert_eq!(restore_str("a={} b={}", &scratch[..len], None), "a=11 b={}");
}

#[test]
fn test_nested_composed() {
    struct Segment {
        from: Point,
        to: Point,
    }
    impl Encode for Segment {
        fn encode(&self, enc: &mut Encoder<'_>) {
            enc.composed(|e| {
                e.add(&self.from);
                e.add(&self.to);
            });
        }
    }

    let mut scratch = [0u8; 64];
    let len = encode_into(&mut scratch, |enc| {
        enc.add(&Segment { from: Point { x: 0, y: 1 }, to: Point { x: 2, y: 3 } });
    });
    assert_eq!(restore_str("{}", &scratch[..len], None), "0 1 2 3");
}

#[test]
fn test_interned_string_round_trip() {
    let table = InternTable::new();
    let mut scratch = [0u8; 64];
    let mut enc = Encoder::with_table(&mut scratch, &table);
    enc.add(&Interned("a string worth deduplicating"));
    let len = enc.len();

    assert_eq!(scratch[0], TypeTag::StrRef as u8);
    assert_eq!(len, 5); // tag + 4-byte index
    assert_eq!(
        restore_str("msg: {}", &scratch[..len], Some(&table)),
        "msg: a string worth deduplicating"
    );
}

#[test]
fn test_interned_without_table_is_dropped() {
    let mut scratch = [0u8; 64];
    let len = encode_into(&mut scratch, |enc| {
        enc.add(&Interned("gone"));
        enc.add(&5u8);
    });
    // Only the integer record made it into the stream.
    assert_eq!(restore_str("{} {}", &scratch[..len], None), "5 {}");
}

#[test]
fn test_string_table_ref_decode_miss() {
    let table = InternTable::new();
    let mut stream = vec![TypeTag::StrRef as u8];
    stream.extend_from_slice(&77u32.to_le_bytes());
    assert_eq!(
        restore_str("{}", &stream, Some(&table)),
        "[[Invalid string index: 77]]"
    );
}

#[test]
fn test_empty_stream_leaves_template_literal() {
    assert_eq!(restore_str("a {} b {} c", &[], None), "a {} b {} c");
    assert_eq!(restore_str("plain", &[], None), "plain");
}

#[test]
fn test_short_stream_leaves_remaining_placeholders() {
    let mut scratch = [0u8; 16];
    let len = encode_into(&mut scratch, |enc| enc.add(&1u8));
    assert_eq!(restore_str("x={} y={}", &scratch[..len], None), "x=1 y={}");
}

#[test]
fn test_surplus_records_not_consumed() {
    let mut scratch = [0u8; 16];
    let len = encode_into(&mut scratch, |enc| {
        enc.add(&1u8);
        enc.add(&2u8);
    });
    let mut out = String::new();
    let consumed = restore(&mut out, "only {}", &scratch[..len], None);
    assert_eq!(out, "only 1");
    assert_eq!(consumed, 2); // one tag + one payload byte
}

#[test]
fn test_truncated_payload_renders_diagnostic() {
    // U32 tag with only two payload bytes.
    let stream = [TypeTag::U32 as u8, 0xaa, 0xbb];
    assert_eq!(
        restore_str("v={} w={}", &stream, None),
        "v=[[Truncated record]] w={}"
    );
}

#[test]
fn test_unknown_tag_renders_diagnostic() {
    let stream = [200u8, 1, 2, 3];
    assert_eq!(
        restore_str("v={} w={}", &stream, None),
        "v=[[Unknown type tag: 200]] w={}"
    );
}

#[test]
fn test_truncated_string_renders_diagnostic() {
    // Str tag claiming 10 bytes with only 3 present.
    let stream = [TypeTag::Str as u8, 10, b'a', b'b', b'c'];
    assert_eq!(restore_str("{}", &stream, None), "[[Truncated record]]");
}

#[test]
fn test_long_inline_string_capped() {
    let long = "x".repeat(400);
    let mut scratch = [0u8; 512];
    let len = encode_into(&mut scratch, |enc| enc.add(&long.as_str()));
    let restored = restore_str("{}", &scratch[..len], None);
    assert_eq!(restored, "x".repeat(255));
}

#[test]
fn test_multibyte_char_encodes_as_inline_string() {
    let mut scratch = [0u8; 16];
    let len = encode_into(&mut scratch, |enc| enc.add(&'é'));
    assert_eq!(scratch[0], TypeTag::Str as u8);
    assert_eq!(restore_str("{}", &scratch[..len], None), "é");
}
