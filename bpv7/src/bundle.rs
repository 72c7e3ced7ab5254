use super::*;
use error::CaptureFieldErr;

/// A BPv7 bundle: a primary block, extension blocks in encoding order, and a
/// payload block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub primary: PrimaryBlock,
    blocks: Vec<CanonicalBlock>,
    payload: CanonicalBlock,
}

impl Bundle {
    /// Creates a bundle with no extension blocks.
    ///
    /// The payload block is always block number 1.
    pub fn new(primary: PrimaryBlock, mut payload: CanonicalBlock) -> Result<Self, Error> {
        if payload.block_type != BlockType::Payload {
            return Err(Error::WrongBlockType {
                expected: BlockType::Payload,
                found: payload.block_type,
            });
        }
        match payload.block_number {
            None | Some(1) => payload.block_number = Some(1),
            Some(n) => return Err(Error::InvalidBlockNumber(n)),
        }
        Ok(Self {
            primary,
            blocks: Vec::new(),
            payload,
        })
    }

    pub fn with_blocks<I>(
        primary: PrimaryBlock,
        payload: CanonicalBlock,
        blocks: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = CanonicalBlock>,
    {
        let mut bundle = Self::new(primary, payload)?;
        for block in blocks {
            bundle.add(block)?;
        }
        Ok(bundle)
    }

    /// The extension blocks, in encoding order.
    pub fn blocks(&self) -> &[CanonicalBlock] {
        &self.blocks
    }

    pub fn payload(&self) -> &CanonicalBlock {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut CanonicalBlock {
        &mut self.payload
    }

    /// All canonical blocks in encoding order, ending with the payload.
    pub fn canonical_blocks(&self) -> impl Iterator<Item = &CanonicalBlock> {
        self.blocks.iter().chain(core::iter::once(&self.payload))
    }

    pub fn is_fragment(&self) -> bool {
        self.primary.flags.is_fragment
    }

    fn find(&self, block_type: BlockType) -> Option<&CanonicalBlock> {
        self.blocks.iter().find(|b| b.block_type == block_type)
    }

    pub fn previous_node(&self) -> Result<Option<PreviousNode>, Error> {
        self.find(BlockType::PreviousNode)
            .map(PreviousNode::try_from)
            .transpose()
    }

    pub fn bundle_age(&self) -> Result<Option<BundleAge>, Error> {
        self.find(BlockType::BundleAge)
            .map(BundleAge::try_from)
            .transpose()
    }

    pub fn hop_count(&self) -> Result<Option<HopCount>, Error> {
        self.find(BlockType::HopCount)
            .map(HopCount::try_from)
            .transpose()
    }

    /// Checks that `block` could join the existing extension blocks.
    fn check_block(&self, block: &CanonicalBlock) -> Result<(), Error> {
        match block.block_number {
            Some(0) => return Err(Error::InvalidBlockNumber(0)),
            Some(1) if block.block_type == BlockType::Payload => {
                return Err(Error::DuplicatePayloadBlock);
            }
            Some(1) => return Err(Error::PayloadBlockNumber(1)),
            Some(n) if self.blocks.iter().any(|b| b.block_number == Some(n)) => {
                return Err(Error::DuplicateBlockNumber(n));
            }
            _ => {}
        }

        match block.block_type {
            BlockType::Payload => Err(Error::DuplicatePayloadBlock),
            BlockType::PreviousNode if self.find(BlockType::PreviousNode).is_some() => {
                Err(Error::DuplicatePreviousNodeBlock)
            }
            BlockType::HopCount if self.find(BlockType::HopCount).is_some() => {
                Err(Error::DuplicateHopCountBlock)
            }
            BlockType::BundleAge if self.find(BlockType::BundleAge).is_some() => {
                Err(Error::DuplicateBundleAgeBlock)
            }
            _ => Ok(()),
        }
    }

    /// Adds an extension block, returning its block number.
    ///
    /// A block without a number is given one more than the highest number in
    /// use. Previous Node blocks are placed first, all others are appended.
    pub fn add(&mut self, mut block: CanonicalBlock) -> Result<u64, Error> {
        self.check_block(&block)?;

        let block_number = match block.block_number {
            Some(n) => n,
            None => {
                self.blocks
                    .iter()
                    .filter_map(|b| b.block_number)
                    .max()
                    .unwrap_or(1)
                    .max(1)
                    + 1
            }
        };
        block.block_number = Some(block_number);

        if block.block_type == BlockType::PreviousNode {
            self.blocks.insert(0, block);
        } else {
            self.blocks.push(block);
        }
        Ok(block_number)
    }

    /// Checks the invariants that depend on the bundle as a whole.
    pub fn validate(&self) -> Result<(), Error> {
        if self.primary.timestamp.creation_time.secs() == 0
            && self.find(BlockType::BundleAge).is_none()
        {
            return Err(Error::BundleAgeBlockRequired);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        self.validate()?;

        let primary = self.primary.encode()?;
        let blocks = self
            .canonical_blocks()
            .map(CanonicalBlock::encode)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cbor::encode::emit_array(None, |a| {
            a.emit_raw_slice(&primary);
            for block in &blocks {
                a.emit_raw_slice(block);
            }
        }))
    }

    /// Parses a bundle occupying the whole of `data`.
    ///
    /// Blocks keep their encoded order, and a bundle breaking any of the
    /// composition rules enforced by [`Bundle::add`] and
    /// [`Bundle::validate`] is rejected. CRCs are not checked here: see
    /// [`Bundle::verify_crcs`].
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        cbor::decode::parse(data)
    }

    /// Returns the first block whose CRC does not match its contents.
    pub fn verify_crcs(&self) -> Result<(), Error> {
        if let Some(crc) = self.primary.crc.filter(|crc| !crc.is_valid()) {
            return Err(Error::ChecksumMismatch {
                block: 0,
                on_wire: crc.on_wire,
                computed: crc.computed,
            });
        }
        for block in self.canonical_blocks() {
            if let Some(crc) = block.crc.filter(|crc| !crc.is_valid()) {
                return Err(Error::ChecksumMismatch {
                    block: block.block_number.unwrap_or_default(),
                    on_wire: crc.on_wire,
                    computed: crc.computed,
                });
            }
        }
        Ok(())
    }
}

impl cbor::decode::FromCbor for Bundle {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        cbor::decode::try_parse_array(data, |a, _| {
            let primary = a.parse::<PrimaryBlock>().map_field_err("primary block")?;

            let mut canonical = Vec::new();
            while let Some(block) = a.try_parse::<CanonicalBlock>()? {
                canonical.push(block);
            }
            let payload = canonical.pop().ok_or(Error::NotEnoughBlocks)?;
            if payload.block_type != BlockType::Payload {
                return Err(Error::PayloadNotFinal);
            }
            if payload.block_number != Some(1) {
                return Err(Error::InvalidBlockNumber(
                    payload.block_number.unwrap_or_default(),
                ));
            }

            let mut bundle = Bundle::new(primary, payload)?;
            for block in canonical {
                bundle.check_block(&block)?;
                if block.block_type == BlockType::PreviousNode && !bundle.blocks.is_empty() {
                    return Err(Error::PreviousNodeNotFirst);
                }
                bundle.blocks.push(block);
            }

            bundle.validate()?;
            Ok(bundle)
        })
    }
}
