//! The encoding half: definite and indefinite arrays of integers, strings
//! and byte strings, always using the shortest head form.

use core::ops::Range;

pub const UNSIGNED: u8 = 0;
pub const NEGATIVE: u8 = 1;
pub const BYTES: u8 = 2;
pub const TEXT: u8 = 3;
pub const ARRAY: u8 = 4;
pub const SIMPLE: u8 = 7;

const BREAK: u8 = 0xFF;

pub trait ToCbor {
    fn to_cbor(&self, encoder: &mut Encoder);
}

#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

fn write_head(buf: &mut Vec<u8>, major: u8, val: u64) {
    let major = major << 5;
    let (minor, width) = match val {
        0..=23 => (val as u8, 0),
        24..=0xFF => (24, 1),
        0x100..=0xFFFF => (25, 2),
        0x1_0000..=0xFFFF_FFFF => (26, 4),
        _ => (27, 8),
    };
    buf.push(major | minor);
    buf.extend_from_slice(&val.to_be_bytes()[8 - width..]);
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    pub fn offset(&self) -> usize {
        self.buf.len()
    }

    /// Writes the head of an item of type `major` with argument `val`; the
    /// content, if any, is up to the caller.
    pub fn emit_head(&mut self, major: u8, val: u64) {
        write_head(&mut self.buf, major, val)
    }

    /// Appends already encoded CBOR.
    pub fn emit_raw_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data)
    }

    pub fn emit<T>(&mut self, value: &T)
    where
        T: ToCbor + ?Sized,
    {
        value.to_cbor(self)
    }

    /// Writes a byte string and returns where its content landed, so it can
    /// be patched once the enclosing item is complete.
    pub fn emit_bytes(&mut self, value: &[u8]) -> Range<usize> {
        self.emit_head(BYTES, value.len() as u64);
        let start = self.buf.len();
        self.buf.extend_from_slice(value);
        start..self.buf.len()
    }

    /// Writes an array of `count` items, or an indefinite-length array when
    /// `count` is `None`.
    pub fn emit_array<F>(&mut self, count: Option<usize>, f: F)
    where
        F: FnOnce(&mut Array),
    {
        let mut a = Array::open(self, count);
        f(&mut a);
        a.close()
    }
}

/// The items of an array being written.
///
/// A definite-length array panics if it is given a different number of items
/// than it announced: that is always a bug in the caller.
pub struct Array<'a> {
    encoder: &'a mut Encoder,
    start: usize,
    remaining: Option<usize>,
}

impl<'a> Array<'a> {
    fn open(encoder: &'a mut Encoder, count: Option<usize>) -> Self {
        let start = encoder.offset();
        match count {
            Some(count) => encoder.emit_head(ARRAY, count as u64),
            None => encoder.buf.push((ARRAY << 5) | 31),
        }
        Self {
            encoder,
            start,
            remaining: count,
        }
    }

    fn close(self) {
        match self.remaining {
            None => self.encoder.buf.push(BREAK),
            Some(0) => {}
            Some(n) => panic!("Array closed with {n} items missing"),
        }
    }

    fn item(&mut self) -> &mut Encoder {
        if let Some(remaining) = &mut self.remaining {
            *remaining = remaining
                .checked_sub(1)
                .unwrap_or_else(|| panic!("Too many items for a definite-length array"));
        }
        self.encoder
    }

    /// Bytes written since the array's head byte.
    pub fn offset(&self) -> usize {
        self.encoder.offset() - self.start
    }

    pub fn emit_raw_slice(&mut self, data: &[u8]) {
        self.item().emit_raw_slice(data)
    }

    pub fn emit<T>(&mut self, value: &T)
    where
        T: ToCbor + ?Sized,
    {
        self.item().emit(value)
    }

    /// As [`Encoder::emit_bytes`]; the range is relative to the start of the
    /// whole encoding.
    pub fn emit_bytes(&mut self, value: &[u8]) -> Range<usize> {
        self.item().emit_bytes(value)
    }

    pub fn emit_array<F>(&mut self, count: Option<usize>, f: F)
    where
        F: FnOnce(&mut Array),
    {
        self.item().emit_array(count, f)
    }
}

macro_rules! unsigned_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) {
                    encoder.emit_head(UNSIGNED, *self as u64)
                }
            }
        )*
    };
}

macro_rules! signed_to_cbor {
    ($($ty:ty),*) => {
        $(
            impl ToCbor for $ty {
                fn to_cbor(&self, encoder: &mut Encoder) {
                    let v = *self as i64;
                    if v < 0 {
                        encoder.emit_head(NEGATIVE, !v as u64)
                    } else {
                        encoder.emit_head(UNSIGNED, v as u64)
                    }
                }
            }
        )*
    };
}

unsigned_to_cbor!(u8, u16, u32, u64, usize);
signed_to_cbor!(i8, i16, i32, i64, isize);

impl ToCbor for bool {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.buf.push((SIMPLE << 5) | if *self { 21 } else { 20 })
    }
}

impl ToCbor for str {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_head(TEXT, self.len() as u64);
        encoder.buf.extend_from_slice(self.as_bytes())
    }
}

impl ToCbor for String {
    fn to_cbor(&self, encoder: &mut Encoder) {
        self.as_str().to_cbor(encoder)
    }
}

impl ToCbor for [u8] {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_bytes(self);
    }
}

impl<const N: usize> ToCbor for [u8; N] {
    fn to_cbor(&self, encoder: &mut Encoder) {
        encoder.emit_bytes(self);
    }
}

impl<T> ToCbor for &T
where
    T: ToCbor + ?Sized,
{
    fn to_cbor(&self, encoder: &mut Encoder) {
        (**self).to_cbor(encoder)
    }
}

pub fn emit<T>(value: &T) -> Vec<u8>
where
    T: ToCbor + ?Sized,
{
    let mut e = Encoder::new();
    e.emit(value);
    e.build()
}

pub fn emit_head(major: u8, val: u64) -> Vec<u8> {
    let mut e = Encoder::new();
    e.emit_head(major, val);
    e.build()
}

pub fn emit_array<F>(count: Option<usize>, f: F) -> Vec<u8>
where
    F: FnOnce(&mut Array),
{
    let mut e = Encoder::new();
    e.emit_array(count, f);
    e.build()
}
