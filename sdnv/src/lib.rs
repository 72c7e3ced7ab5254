//! Self-Delimiting Numeric Values, as defined by RFC 6256.
//!
//! An SDNV carries an unsigned integer as a big-endian sequence of 7-bit
//! groups. Every byte except the last has its high bit set.

use thiserror::Error;

/// The longest encoding of a `u64`: `ceil(64 / 7)` bytes.
pub const MAX_ENCODED_LEN: usize = 10;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The buffer ended before the terminating byte. The value is the total
    /// number of bytes required before decoding can progress.
    #[error("Need at least {0} bytes to decode SDNV")]
    NeedMoreData(usize),

    #[error("SDNV is longer than {MAX_ENCODED_LEN} bytes")]
    TooLong,

    #[error("SDNV value does not fit in 64 bits")]
    Overflow,

    #[error("Negative value {0} cannot be encoded as an SDNV")]
    InvalidValue(i64),
}

/// Returns the number of bytes `value` occupies when encoded.
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Appends the encoding of `value` to `out`.
pub fn encode_into(value: u64, out: &mut Vec<u8>) {
    let len = encoded_len(value);
    for i in (0..len).rev() {
        let group = ((value >> (i * 7)) & 0x7F) as u8;
        out.push(if i == 0 { group } else { group | 0x80 });
    }
}

pub fn encode(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_ENCODED_LEN);
    encode_into(value, &mut out);
    out
}

/// Encodes a signed value, rejecting negatives.
pub fn encode_signed(value: i64) -> Result<Vec<u8>, Error> {
    if value < 0 {
        Err(Error::InvalidValue(value))
    } else {
        Ok(encode(value as u64))
    }
}

/// Decodes an SDNV from the front of `data`, ignoring anything after it.
///
/// Returns the value and the number of bytes consumed.
pub fn decode(data: &[u8]) -> Result<(u64, usize), Error> {
    let mut value = 0u64;
    for (idx, b) in data.iter().enumerate() {
        if idx >= MAX_ENCODED_LEN {
            return Err(Error::TooLong);
        }
        if value > (u64::MAX >> 7) {
            return Err(Error::Overflow);
        }
        value = (value << 7) | (b & 0x7F) as u64;
        if b & 0x80 == 0 {
            return Ok((value, idx + 1));
        }
    }

    if data.len() >= MAX_ENCODED_LEN {
        Err(Error::TooLong)
    } else {
        Err(Error::NeedMoreData(data.len() + 1))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn encode_vectors() {
        assert_eq!(encode(0), hex!("00"));
        assert_eq!(encode(0x7F), hex!("7f"));
        assert_eq!(encode(0x80), hex!("81 00"));
        assert_eq!(encode(0xABC), hex!("95 3c"));
        assert_eq!(encode(0x1234), hex!("a4 34"));
        assert_eq!(encode(0x4234), hex!("81 84 34"));
        assert_eq!(
            encode(u64::MAX),
            hex!("81 ff ff ff ff ff ff ff ff 7f")
        );
    }

    #[test]
    fn encode_appends() {
        let mut out = vec![0xAA];
        encode_into(0xABC, &mut out);
        assert_eq!(out, hex!("aa 95 3c"));
    }

    #[test]
    fn encoded_lengths() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(0x7F), 1);
        assert_eq!(encoded_len(0x80), 2);
        assert_eq!(encoded_len(0x3FFF), 2);
        assert_eq!(encoded_len(0x4000), 3);
        assert_eq!(encoded_len(u64::MAX), MAX_ENCODED_LEN);
    }

    #[test]
    fn decode_vectors() {
        assert_eq!(decode(&hex!("a4 34")), Ok((0x1234, 2)));
        assert_eq!(decode(&hex!("a4 34 00 00")), Ok((0x1234, 2)));
        assert_eq!(decode(&hex!("7f")), Ok((0x7F, 1)));
        assert_eq!(decode(&hex!("95 3c")), Ok((0xABC, 2)));
        assert_eq!(decode(&hex!("81 84 34")), Ok((0x4234, 3)));
    }

    #[test]
    fn decode_truncated() {
        assert_eq!(decode(&[]), Err(Error::NeedMoreData(1)));
        assert_eq!(decode(&hex!("a4")), Err(Error::NeedMoreData(2)));
        assert_eq!(decode(&hex!("81 84")), Err(Error::NeedMoreData(3)));
    }

    #[test]
    fn decode_too_long() {
        assert_eq!(
            decode(&hex!("80 80 80 80 80 80 80 80 80 80 00")),
            Err(Error::TooLong)
        );
        assert_eq!(
            decode(&hex!("82 ff ff ff ff ff ff ff ff 7f")),
            Err(Error::Overflow)
        );
    }

    #[test]
    fn signed() {
        assert_eq!(encode_signed(-1), Err(Error::InvalidValue(-1)));
        assert_eq!(encode_signed(0xABC), Ok(hex!("95 3c").to_vec()));
    }

    #[test]
    fn round_trip() {
        let mut v = 1u64;
        while v != 0 {
            for value in [v - 1, v, v | (v >> 1)] {
                let e = encode(value);
                assert_eq!(decode(&e), Ok((value, e.len())));
            }
            v <<= 1;
        }
    }
}
