//! A compact CBOR (RFC 8949) encoder and incremental decoder.
//!
//! Decoding never copies definite-length strings, and a truncated input is
//! reported as [`decode::Error::NeedMoreData`] with the number of further
//! bytes required, so callers can parse directly from a receive buffer.

pub mod decode;
pub mod encode;
