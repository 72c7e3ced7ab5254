/*!
One-call construction of a typical bundle: primary block, optional Previous
Node block, Hop Count block, Bundle Age block, and payload.
*/

use super::*;

#[derive(Debug, Clone)]
pub struct Builder {
    source: Eid,
    destination: Eid,
    payload: Box<[u8]>,
    report_to: Eid,
    primary_crc_type: CrcType,
    canonical_crc_type: CrcType,
    creation_time: Option<DtnTime>,
    sequence_number: Option<u64>,
    lifetime: core::time::Duration,
    flags: BundleFlags,
    fragment_info: Option<FragmentInfo>,
    hop_limit: u64,
    hop_count: u64,
    bundle_age: core::time::Duration,
    previous_node: Option<Eid>,
}

impl Builder {
    pub fn new(source: Eid, destination: Eid, payload: impl Into<Box<[u8]>>) -> Self {
        Self {
            source,
            destination,
            payload: payload.into(),
            report_to: Eid::Null,
            primary_crc_type: CrcType::Crc32,
            canonical_crc_type: CrcType::Crc16,
            creation_time: None,
            sequence_number: None,
            lifetime: core::time::Duration::from_secs(300),
            flags: BundleFlags::default(),
            fragment_info: None,
            hop_limit: 30,
            hop_count: 0,
            bundle_age: core::time::Duration::ZERO,
            previous_node: None,
        }
    }

    pub fn report_to(mut self, report_to: Eid) -> Self {
        self.report_to = report_to;
        self
    }

    pub fn primary_crc_type(mut self, crc_type: CrcType) -> Self {
        self.primary_crc_type = crc_type;
        self
    }

    pub fn canonical_crc_type(mut self, crc_type: CrcType) -> Self {
        self.canonical_crc_type = crc_type;
        self
    }

    /// Defaults to the current time.
    pub fn creation_time(mut self, creation_time: DtnTime) -> Self {
        self.creation_time = Some(creation_time);
        self
    }

    /// Defaults to the next value of the counter passed to [`Builder::build`].
    pub fn sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    pub fn lifetime(mut self, lifetime: core::time::Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn flags(mut self, flags: BundleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Marks the bundle as a fragment.
    pub fn fragment(mut self, offset: u64, total_len: u64) -> Self {
        self.flags.is_fragment = true;
        self.fragment_info = Some(FragmentInfo { offset, total_len });
        self
    }

    pub fn hop_limit(mut self, hop_limit: u64) -> Self {
        self.hop_limit = hop_limit;
        self
    }

    pub fn hop_count(mut self, hop_count: u64) -> Self {
        self.hop_count = hop_count;
        self
    }

    pub fn bundle_age(mut self, bundle_age: core::time::Duration) -> Self {
        self.bundle_age = bundle_age;
        self
    }

    pub fn previous_node(mut self, previous_node: Eid) -> Self {
        self.previous_node = Some(previous_node);
        self
    }

    pub fn build(self, counter: &SequenceCounter) -> Result<Bundle, Error> {
        let primary = PrimaryBlock {
            flags: self.flags,
            crc_type: self.primary_crc_type,
            destination: self.destination,
            source: self.source,
            report_to: self.report_to,
            timestamp: CreationTimestamp {
                creation_time: self.creation_time.unwrap_or_else(DtnTime::now),
                sequence_number: self.sequence_number.unwrap_or_else(|| counter.next()),
            },
            lifetime: self.lifetime,
            fragment_info: self.fragment_info,
            crc: None,
        };

        let mut bundle = Bundle::new(
            primary,
            CanonicalBlock::payload(self.payload, self.canonical_crc_type),
        )?;

        if let Some(previous_node) = self.previous_node {
            bundle.add(PreviousNode(previous_node).into_block(self.canonical_crc_type))?;
        }
        bundle.add(
            HopCount {
                limit: self.hop_limit,
                count: self.hop_count,
            }
            .into_block(self.canonical_crc_type),
        )?;
        bundle.add(BundleAge(self.bundle_age).into_block(self.canonical_crc_type))?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn eid(s: &str) -> Eid {
        s.parse().unwrap()
    }

    #[test]
    fn defaults() {
        let counter = SequenceCounter::new();
        let bundle = Builder::new(eid("dtn://src/a"), eid("ipn:2.1"), *b"payload")
            .build(&counter)
            .unwrap();

        assert_eq!(bundle.primary.crc_type, CrcType::Crc32);
        assert_eq!(bundle.primary.lifetime, core::time::Duration::from_secs(300));
        assert_eq!(bundle.primary.report_to, Eid::Null);
        assert_eq!(bundle.primary.timestamp.sequence_number, 0);

        let types: Vec<_> = bundle.canonical_blocks().map(|b| b.block_type).collect();
        assert_eq!(
            types,
            [BlockType::HopCount, BlockType::BundleAge, BlockType::Payload]
        );
        assert!(bundle.canonical_blocks().all(|b| b.crc_type == CrcType::Crc16));
        assert_eq!(
            bundle.hop_count().unwrap(),
            Some(HopCount {
                limit: 30,
                count: 0
            })
        );
        assert_eq!(
            bundle.bundle_age().unwrap(),
            Some(BundleAge(core::time::Duration::ZERO))
        );

        let next = Builder::new(eid("dtn://src/a"), eid("ipn:2.1"), *b"payload")
            .build(&counter)
            .unwrap();
        assert_eq!(next.primary.timestamp.sequence_number, 1);
    }

    #[test]
    fn previous_node_first() {
        let bundle = Builder::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"x")
            .previous_node(eid("ipn:3.0"))
            .sequence_number(99)
            .build(&SequenceCounter::new())
            .unwrap();
        let numbers: Vec<_> = bundle
            .canonical_blocks()
            .map(|b| (b.block_type, b.block_number))
            .collect();
        assert_eq!(
            numbers,
            [
                (BlockType::PreviousNode, Some(2)),
                (BlockType::HopCount, Some(3)),
                (BlockType::BundleAge, Some(4)),
                (BlockType::Payload, Some(1)),
            ]
        );
        assert_eq!(bundle.primary.timestamp.sequence_number, 99);
    }

    #[test]
    fn fragment() {
        let bundle = Builder::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"frag")
            .fragment(10, 100)
            .build(&SequenceCounter::new())
            .unwrap();
        assert!(bundle.is_fragment());
        let parsed = Bundle::parse(&bundle.encode().unwrap()).unwrap();
        assert_eq!(
            parsed.primary.fragment_info,
            Some(FragmentInfo {
                offset: 10,
                total_len: 100
            })
        );
    }
}
