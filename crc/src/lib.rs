//! A generic, table-driven CRC engine.
//!
//! Any model expressible in the Rocksoft parameter form (width, polynomial,
//! init, reflect-in, reflect-out, xor-out) with a width of 1 to 64 bits is
//! supported. The lookup table for a [`Crc`] is built on first use and kept
//! for the lifetime of the instance, so the catalogue statics in
//! [`catalog`] each build their table at most once per process.

use std::sync::OnceLock;
use thiserror::Error;

mod table;

pub mod catalog;

pub use catalog::*;

#[cfg(test)]
mod engine_tests;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("Unsupported CRC width {0}, must be between 1 and 64")]
    InvalidWidth(u8),
}

/// The parameters of a CRC model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Algorithm {
    pub name: &'static str,
    pub width: u8,
    /// Generator polynomial, unreflected, without the implicit top bit
    pub poly: u64,
    /// Initial register value, unreflected
    pub init: u64,
    pub refin: bool,
    pub refout: bool,
    pub xorout: u64,
    /// Checksum of the ASCII string `"123456789"`
    pub check: u64,
}

impl Algorithm {
    fn mask(&self) -> u64 {
        mask(self.width)
    }

    /// Both reflected: the table and register are kept in reflected order.
    fn is_reflected(&self) -> bool {
        self.refin && self.refout
    }
}

pub(crate) const fn mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

pub(crate) const fn reflect(value: u64, width: u8) -> u64 {
    value.reverse_bits() >> (64 - width as u32)
}

/// A CRC model together with its lazily built lookup table.
pub struct Crc {
    algorithm: Algorithm,
    table: OnceLock<[u64; 256]>,
}

impl core::fmt::Debug for Crc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Crc")
            .field("algorithm", &self.algorithm)
            .field("table_built", &self.table.get().is_some())
            .finish()
    }
}

impl Crc {
    /// Creates an engine for `algorithm`.
    ///
    /// # Panics
    ///
    /// Panics if the width is not between 1 and 64. Use [`Crc::try_new`] for
    /// runtime-supplied parameters.
    pub const fn new(algorithm: Algorithm) -> Self {
        assert!(
            algorithm.width >= 1 && algorithm.width <= 64,
            "CRC width must be between 1 and 64"
        );
        Self {
            algorithm,
            table: OnceLock::new(),
        }
    }

    pub fn try_new(algorithm: Algorithm) -> Result<Self, Error> {
        if algorithm.width == 0 || algorithm.width > 64 {
            return Err(Error::InvalidWidth(algorithm.width));
        }
        Ok(Self::new(algorithm))
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    fn table(&self) -> &[u64; 256] {
        self.table.get_or_init(|| {
            if self.algorithm.is_reflected() {
                table::reflected(&self.algorithm)
            } else {
                table::direct(&self.algorithm)
            }
        })
    }

    pub fn checksum(&self, data: &[u8]) -> u64 {
        let mut digest = self.digest();
        digest.update(data);
        digest.finalize()
    }

    pub fn digest(&self) -> Digest<'_> {
        let alg = &self.algorithm;
        let register = if alg.is_reflected() {
            reflect(alg.init & alg.mask(), alg.width)
        } else {
            (alg.init & alg.mask()) << (64 - alg.width as u32)
        };
        Digest {
            crc: self,
            register,
        }
    }
}

/// Incremental CRC computation.
#[derive(Debug, Clone)]
pub struct Digest<'a> {
    crc: &'a Crc,
    register: u64,
}

impl Digest<'_> {
    pub fn update(&mut self, data: &[u8]) {
        let alg = &self.crc.algorithm;
        let table = self.crc.table();
        self.register = if alg.is_reflected() {
            table::update_reflected(table, self.register, data)
        } else {
            table::update_direct(table, self.register, alg.refin, data)
        };
    }

    pub fn finalize(self) -> u64 {
        let alg = &self.crc.algorithm;
        let crc = if alg.is_reflected() {
            self.register
        } else {
            let crc = self.register >> (64 - alg.width as u32);
            if alg.refout {
                reflect(crc, alg.width)
            } else {
                crc
            }
        };
        (crc ^ alg.xorout) & alg.mask()
    }
}
