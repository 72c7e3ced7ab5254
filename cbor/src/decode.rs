use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input is truncated. The value is the number of additional bytes
    /// required before parsing can progress.
    #[error("Need at least {0} more bytes to decode value")]
    NeedMoreData(usize),

    #[error("Invalid minor-type value {0}")]
    InvalidMinorValue(u8),

    #[error("Invalid simple type {0}")]
    InvalidSimpleType(u8),

    #[error("Tags with no following value")]
    JustTags,

    #[error("Incorrect type, expecting {0}, found {1}")]
    IncorrectType(String, String),

    #[error("Chunked string contains an invalid chunk")]
    InvalidChunk,

    #[error("Sequence contains additional items")]
    AdditionalItems,

    #[error("Sequence has no more items")]
    NotEnoughItems,

    #[error("Map has key but no value")]
    PartialMap,

    #[error(transparent)]
    TryFromIntError(#[from] core::num::TryFromIntError),

    #[error(transparent)]
    InvalidUtf8(#[from] core::str::Utf8Error),
}

impl From<core::convert::Infallible> for Error {
    fn from(e: core::convert::Infallible) -> Self {
        match e {}
    }
}

pub trait FromCbor: Sized {
    type Error: From<self::Error>;

    /// Parses a value from the front of `data`, returning it and the number
    /// of bytes consumed, or `None` if `data` is empty.
    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error>;
}

pub enum Value<'a, 'b> {
    UnsignedInteger(u64),
    NegativeInteger(u64),
    Bytes(&'a [u8]),
    ByteStream(Vec<&'a [u8]>),
    Text(&'a str),
    TextStream(Vec<&'a str>),
    Array(&'b mut Array<'a>),
    Map(&'b mut Map<'a>),
    False,
    True,
    Null,
    Undefined,
    Simple(u8),
    Float(f64),
}

impl Value<'_, '_> {
    pub fn type_name(&self) -> String {
        match self {
            Value::UnsignedInteger(_) => "Unsigned Integer".to_string(),
            Value::NegativeInteger(_) => "Negative Integer".to_string(),
            Value::Bytes(_) => "Definite-length Byte String".to_string(),
            Value::ByteStream(_) => "Indefinite-length Byte String".to_string(),
            Value::Text(_) => "Definite-length Text String".to_string(),
            Value::TextStream(_) => "Indefinite-length Text String".to_string(),
            Value::Array(a) if a.is_definite() => "Definite-length Array".to_string(),
            Value::Array(_) => "Indefinite-length Array".to_string(),
            Value::Map(m) if m.is_definite() => "Definite-length Map".to_string(),
            Value::Map(_) => "Indefinite-length Map".to_string(),
            Value::False => "False".to_string(),
            Value::True => "True".to_string(),
            Value::Null => "Null".to_string(),
            Value::Undefined => "Undefined".to_string(),
            Value::Simple(v) => format!("Simple Value {v}"),
            Value::Float(_) => "Float".to_string(),
        }
    }

    /// Consumes the remainder of the value, recursing into arrays and maps.
    pub fn skip(&mut self, max_recursion: usize) -> Result<(), Error> {
        match self {
            Value::Array(a) => a.skip_to_end(max_recursion),
            Value::Map(m) => m.skip_to_end(max_recursion),
            _ => Ok(()),
        }
    }
}

pub struct Sequence<'a, const D: usize> {
    data: &'a [u8],
    count: Option<usize>,
    offset: usize,
    parsed: usize,
}

pub type Array<'a> = Sequence<'a, 1>;
pub type Map<'a> = Sequence<'a, 2>;

impl<'a, const D: usize> Sequence<'a, D> {
    fn new(data: &'a [u8], header_len: usize, count: Option<usize>) -> Self {
        Self {
            data,
            count: count.map(|c| c * D),
            offset: header_len,
            parsed: 0,
        }
    }

    /// The number of items, if the sequence is definite-length.
    pub fn count(&self) -> Option<usize> {
        self.count.map(|c| c / D)
    }

    pub fn is_definite(&self) -> bool {
        self.count.is_some()
    }

    /// Offset from the initial byte of this sequence.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn check_for_end(&mut self) -> Result<bool, Error> {
        if let Some(count) = self.count {
            return Ok(self.parsed >= count);
        }
        match self.data.get(self.offset) {
            None => Err(Error::NeedMoreData(1)),
            Some(0xFF) if self.parsed % D != 0 => Err(Error::PartialMap),
            Some(0xFF) => {
                self.offset += 1;
                self.count = Some(self.parsed);
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    /// Returns the offset past the end of the sequence if all items have
    /// been read, otherwise `None`.
    pub fn end(&mut self) -> Result<Option<usize>, Error> {
        if self.check_for_end()? {
            Ok(Some(self.offset))
        } else {
            Ok(None)
        }
    }

    fn complete(&mut self) -> Result<(), Error> {
        if self.check_for_end()? {
            Ok(())
        } else {
            Err(Error::AdditionalItems)
        }
    }

    fn skip_to_end(&mut self, max_recursion: usize) -> Result<(), Error> {
        if max_recursion == 0 {
            return Err(Error::IncorrectType(
                "shallower nesting".to_string(),
                "nested sequence".to_string(),
            ));
        }
        while self
            .try_parse_value(|mut value, _| value.skip(max_recursion - 1))?
            .is_some()
        {}
        Ok(())
    }

    /// Parses the next item, returning the callback result and the offset
    /// of the item from the initial byte of this sequence, or `None` at the
    /// end of the sequence.
    pub fn try_parse_value<T, F, E>(&mut self, f: F) -> Result<Option<(T, usize)>, E>
    where
        F: FnOnce(Value, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        if self.check_for_end()? {
            return Ok(None);
        }
        let item_start = self.offset;
        match try_parse_value(&self.data[item_start..], f)? {
            Some((r, len)) => {
                self.parsed += 1;
                self.offset += len;
                Ok(Some((r, item_start)))
            }
            None => Err(Error::NeedMoreData(1).into()),
        }
    }

    pub fn parse_value<T, F, E>(&mut self, f: F) -> Result<(T, usize), E>
    where
        F: FnOnce(Value, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.try_parse_value(f)?
            .ok_or_else(|| Error::NotEnoughItems.into())
    }

    pub fn parse_array<T, F, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Array, &[u64]) -> Result<T, E>,
        E: From<Error>,
    {
        self.parse_value(|value, tags| match value {
            Value::Array(a) => f(a, tags),
            value => Err(Error::IncorrectType("Array".to_string(), value.type_name()).into()),
        })
        .map(|(r, _)| r)
    }

    pub fn try_parse<T>(&mut self) -> Result<Option<T>, T::Error>
    where
        T: FromCbor,
    {
        if self.check_for_end()? {
            return Ok(None);
        }
        match T::try_from_cbor(&self.data[self.offset..])? {
            Some((value, len)) => {
                self.parsed += 1;
                self.offset += len;
                Ok(Some(value))
            }
            None => Err(Error::NeedMoreData(1).into()),
        }
    }

    pub fn parse<T>(&mut self) -> Result<T, T::Error>
    where
        T: FromCbor,
    {
        self.try_parse::<T>()?
            .ok_or_else(|| T::Error::from(Error::NotEnoughItems))
    }
}

fn need(data: &[u8], len: usize) -> Result<(), Error> {
    if data.len() < len {
        Err(Error::NeedMoreData(len - data.len()))
    } else {
        Ok(())
    }
}

fn parse_tags(data: &[u8]) -> Result<(Vec<u64>, usize), Error> {
    let mut tags = Vec::new();
    let mut offset = 0;
    while let Some(&b) = data.get(offset) {
        if b >> 5 != 6 {
            break;
        }
        let (tag, len) = parse_uint_minor(b & 0x1F, &data[offset + 1..])?;
        tags.push(tag);
        offset += len + 1;
    }
    Ok((tags, offset))
}

fn parse_uint_minor(minor: u8, data: &[u8]) -> Result<(u64, usize), Error> {
    match minor {
        0..24 => Ok((minor as u64, 0)),
        24 => {
            need(data, 1)?;
            Ok((data[0] as u64, 1))
        }
        25 => {
            need(data, 2)?;
            Ok((u16::from_be_bytes([data[0], data[1]]) as u64, 2))
        }
        26 => {
            need(data, 4)?;
            Ok((u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as u64, 4))
        }
        27 => {
            need(data, 8)?;
            let mut v = [0u8; 8];
            v.copy_from_slice(&data[..8]);
            Ok((u64::from_be_bytes(v), 8))
        }
        _ => Err(Error::InvalidMinorValue(minor)),
    }
}

/// Parses the head of a data item: major type, argument, and head length.
///
/// Indefinite-length heads and tags are rejected.
pub fn parse_head(data: &[u8]) -> Result<(u8, u64, usize), Error> {
    need(data, 1)?;
    let (val, len) = parse_uint_minor(data[0] & 0x1F, &data[1..])?;
    Ok((data[0] >> 5, val, len + 1))
}

fn parse_data_minor(minor: u8, data: &[u8]) -> Result<(&[u8], usize), Error> {
    let (data_len, len) = parse_uint_minor(minor, data)?;
    let end = usize::try_from(data_len)?
        .checked_add(len)
        .ok_or(Error::NeedMoreData(usize::MAX))?;
    need(data, end)?;
    Ok((&data[len..end], end))
}

fn parse_data_chunked(major: u8, data: &[u8]) -> Result<(Vec<&[u8]>, usize), Error> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    loop {
        let Some(&b) = data.get(offset) else {
            return Err(Error::NeedMoreData(1));
        };
        offset += 1;
        if b == 0xFF {
            return Ok((chunks, offset));
        }
        if b >> 5 != major || b & 0x1F == 31 {
            return Err(Error::InvalidChunk);
        }
        let (chunk, len) = parse_data_minor(b & 0x1F, &data[offset..])?;
        chunks.push(chunk);
        offset += len;
    }
}

pub fn try_parse_value<T, F, E>(data: &[u8], f: F) -> Result<Option<(T, usize)>, E>
where
    F: FnOnce(Value, &[u64]) -> Result<T, E>,
    E: From<Error>,
{
    let (tags, start) = parse_tags(data)?;
    let Some(&initial) = data.get(start) else {
        return if tags.is_empty() {
            Ok(None)
        } else {
            Err(Error::JustTags.into())
        };
    };

    let mut offset = start + 1;
    let minor = initial & 0x1F;
    let r = match initial >> 5 {
        0 => {
            let (v, len) = parse_uint_minor(minor, &data[offset..])?;
            offset += len;
            f(Value::UnsignedInteger(v), &tags)
        }
        1 => {
            let (v, len) = parse_uint_minor(minor, &data[offset..])?;
            offset += len;
            f(Value::NegativeInteger(v), &tags)
        }
        2 if minor == 31 => {
            let (chunks, len) = parse_data_chunked(2, &data[offset..])?;
            offset += len;
            f(Value::ByteStream(chunks), &tags)
        }
        2 => {
            let (v, len) = parse_data_minor(minor, &data[offset..])?;
            offset += len;
            f(Value::Bytes(v), &tags)
        }
        3 if minor == 31 => {
            let (chunks, len) = parse_data_chunked(3, &data[offset..])?;
            offset += len;
            let chunks = chunks
                .into_iter()
                .map(core::str::from_utf8)
                .collect::<Result<Vec<_>, _>>()
                .map_err(Error::from)?;
            f(Value::TextStream(chunks), &tags)
        }
        3 => {
            let (v, len) = parse_data_minor(minor, &data[offset..])?;
            offset += len;
            f(
                Value::Text(core::str::from_utf8(v).map_err(Error::from)?),
                &tags,
            )
        }
        major @ (4 | 5) => {
            let count = if minor == 31 {
                None
            } else {
                let (count, len) = parse_uint_minor(minor, &data[offset..])?;
                offset += len;
                Some(usize::try_from(count).map_err(Error::from)?)
            };
            if major == 4 {
                let mut a = Array::new(&data[start..], offset - start, count);
                let r = f(Value::Array(&mut a), &tags)?;
                a.complete()?;
                offset = start + a.offset;
                Ok(r)
            } else {
                let mut m = Map::new(&data[start..], offset - start, count);
                let r = f(Value::Map(&mut m), &tags)?;
                m.complete()?;
                offset = start + m.offset;
                Ok(r)
            }
        }
        7 => match minor {
            20 => f(Value::False, &tags),
            21 => f(Value::True, &tags),
            22 => f(Value::Null, &tags),
            23 => f(Value::Undefined, &tags),
            0..20 => f(Value::Simple(minor), &tags),
            24 => {
                need(&data[offset..], 1)?;
                let v = data[offset];
                if v < 32 {
                    return Err(Error::InvalidSimpleType(v).into());
                }
                offset += 1;
                f(Value::Simple(v), &tags)
            }
            25 => {
                need(&data[offset..], 2)?;
                let v = half::f16::from_be_bytes([data[offset], data[offset + 1]]);
                offset += 2;
                f(Value::Float(v.into()), &tags)
            }
            26 => {
                need(&data[offset..], 4)?;
                let mut b = [0u8; 4];
                b.copy_from_slice(&data[offset..offset + 4]);
                offset += 4;
                f(Value::Float(f32::from_be_bytes(b).into()), &tags)
            }
            27 => {
                need(&data[offset..], 8)?;
                let mut b = [0u8; 8];
                b.copy_from_slice(&data[offset..offset + 8]);
                offset += 8;
                f(Value::Float(f64::from_be_bytes(b)), &tags)
            }
            _ => return Err(Error::InvalidSimpleType(minor).into()),
        },
        // Major type 6 is consumed by parse_tags
        _ => return Err(Error::InvalidMinorValue(minor).into()),
    }?;
    Ok(Some((r, offset)))
}

pub fn parse_value<T, F, E>(data: &[u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(Value, &[u64]) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_value(data, f)?.ok_or_else(|| Error::NeedMoreData(1).into())
}

pub fn try_parse_array<T, F, E>(data: &[u8], f: F) -> Result<Option<(T, usize)>, E>
where
    F: FnOnce(&mut Array, &[u64]) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_value(data, |value, tags| match value {
        Value::Array(a) => f(a, tags),
        value => Err(Error::IncorrectType("Array".to_string(), value.type_name()).into()),
    })
}

pub fn parse_array<T, F, E>(data: &[u8], f: F) -> Result<(T, usize), E>
where
    F: FnOnce(&mut Array, &[u64]) -> Result<T, E>,
    E: From<Error>,
{
    try_parse_array(data, f)?.ok_or_else(|| Error::NeedMoreData(1).into())
}

/// Parses a value that must occupy all of `data`.
pub fn parse<T>(data: &[u8]) -> Result<T, T::Error>
where
    T: FromCbor,
{
    match T::try_from_cbor(data)? {
        Some((v, len)) if len == data.len() => Ok(v),
        Some(_) => Err(Error::AdditionalItems.into()),
        None => Err(Error::NeedMoreData(1).into()),
    }
}

macro_rules! impl_uint_from_cbor {
    ($($ty:ty),*) => {
        $(
            impl FromCbor for $ty {
                type Error = self::Error;

                fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
                    try_parse_value(data, |value, _| match value {
                        Value::UnsignedInteger(n) => Ok(<$ty>::try_from(n)?),
                        value => Err(Error::IncorrectType(
                            "Unsigned Integer".to_string(),
                            value.type_name(),
                        )),
                    })
                }
            }
        )*
    };
}

impl_uint_from_cbor!(u8, u16, u32, u64, usize);

macro_rules! impl_int_from_cbor {
    ($($ty:ty),*) => {
        $(
            impl FromCbor for $ty {
                type Error = self::Error;

                fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
                    try_parse_value(data, |value, _| match value {
                        Value::UnsignedInteger(n) => Ok(<$ty>::try_from(n)?),
                        Value::NegativeInteger(n) => Ok(<$ty>::try_from(-1 - i64::try_from(n)?)?),
                        value => Err(Error::IncorrectType(
                            "Integer".to_string(),
                            value.type_name(),
                        )),
                    })
                }
            }
        )*
    };
}

impl_int_from_cbor!(i8, i16, i32, i64, isize);

impl FromCbor for bool {
    type Error = self::Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        try_parse_value(data, |value, _| match value {
            Value::False => Ok(false),
            Value::True => Ok(true),
            value => Err(Error::IncorrectType("Boolean".to_string(), value.type_name())),
        })
    }
}

impl FromCbor for String {
    type Error = self::Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        try_parse_value(data, |value, _| match value {
            Value::Text(s) => Ok(s.to_string()),
            Value::TextStream(s) => Ok(s.concat()),
            value => Err(Error::IncorrectType("String".to_string(), value.type_name())),
        })
    }
}

impl FromCbor for Box<[u8]> {
    type Error = self::Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        try_parse_value(data, |value, _| match value {
            Value::Bytes(b) => Ok(b.into()),
            Value::ByteStream(b) => Ok(b.concat().into()),
            value => Err(Error::IncorrectType(
                "Byte String".to_string(),
                value.type_name(),
            )),
        })
    }
}
