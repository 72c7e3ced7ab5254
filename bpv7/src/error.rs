/*!
The error type shared by the block, bundle and status report codecs.
*/

use super::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported bundle protocol version {0}")]
    InvalidVersion(u64),

    #[error("Bundle must contain at least a primary and a payload block")]
    NotEnoughBlocks,

    #[error("Final block of bundle is not a payload block")]
    PayloadNotFinal,

    #[error("Bundle has more than one payload block")]
    DuplicatePayloadBlock,

    #[error("Bundle has more than one block with block number {0}")]
    DuplicateBlockNumber(u64),

    #[error("Block number 1 is reserved for the payload block, found {0}")]
    PayloadBlockNumber(u64),

    #[error("Invalid block number {0}")]
    InvalidBlockNumber(u64),

    #[error("Block has not been assigned a block number")]
    UnassignedBlockNumber,

    #[error("Bundle has more than one Previous Node block")]
    DuplicatePreviousNodeBlock,

    #[error("Previous Node block must be the first block after the primary block")]
    PreviousNodeNotFirst,

    #[error("Bundle has more than one Hop Count block")]
    DuplicateHopCountBlock,

    #[error("Bundle has more than one Bundle Age block")]
    DuplicateBundleAgeBlock,

    #[error("Bundle creation time is zero, and there is no Bundle Age block")]
    BundleAgeBlockRequired,

    #[error("Fragment flag is set, but fragment offset and total length are missing")]
    MissingFragmentInfo,

    #[error("Fragment offset and total length supplied without the fragment flag")]
    UnexpectedFragmentInfo,

    #[error("Invalid fragment information: offset {0}, total length {1}")]
    InvalidFragmentInfo(u64, u64),

    #[error("Invalid CRC type {0}")]
    InvalidCrcType(u64),

    #[error("Block has unexpected CRC value length {0}")]
    InvalidCrcLength(usize),

    #[error("Block {block} CRC mismatch: {on_wire:#x} on the wire, {computed:#x} computed")]
    ChecksumMismatch {
        block: u64,
        on_wire: u32,
        computed: u32,
    },

    #[error("Expected a {expected} block, found a {found} block")]
    WrongBlockType {
        expected: block_type::BlockType,
        found: block_type::BlockType,
    },

    #[error("Blocks must not be tagged")]
    TaggedBlock,

    #[error("Unknown administrative record type {0}")]
    UnknownAdminRecordType(u64),

    #[error("Lifetime is too long to encode")]
    LifetimeOverflow,

    #[error(transparent)]
    InvalidEid(#[from] eid::Error),

    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),

    #[error("Failed to parse {field}: {source}")]
    InvalidField {
        field: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub trait CaptureFieldErr<T> {
    fn map_field_err(self, field: &'static str) -> Result<T, Error>;
}

impl<T, E: Into<Box<dyn std::error::Error + Send + Sync>>> CaptureFieldErr<T>
    for std::result::Result<T, E>
{
    fn map_field_err(self, field: &'static str) -> Result<T, Error> {
        self.map_err(|e| Error::InvalidField {
            field,
            source: e.into(),
        })
    }
}
