use super::*;
use builder::Builder;
use hex_literal::hex;

fn eid(s: &str) -> Eid {
    s.parse().unwrap()
}

fn primary(creation_time: u64) -> PrimaryBlock {
    PrimaryBlock {
        destination: eid("ipn:2.1"),
        source: eid("dtn://node/src"),
        timestamp: CreationTimestamp::new(DtnTime::new(creation_time), 0),
        ..Default::default()
    }
}

#[test]
fn round_trip_all_crc_types() {
    for crc_type in [CrcType::None, CrcType::Crc16, CrcType::Crc32] {
        let bundle = Builder::new(eid("ipn:1.1"), eid("dtn://dest/"), *b"hello")
            .primary_crc_type(crc_type)
            .canonical_crc_type(crc_type)
            .previous_node(eid("ipn:3.0"))
            .creation_time(DtnTime::new(1000))
            .build(&SequenceCounter::new())
            .unwrap();

        let data = bundle.encode().unwrap();
        assert_eq!(data[0], 0x9f);
        assert_eq!(*data.last().unwrap(), 0xff);

        let parsed = Bundle::parse(&data).unwrap();
        parsed.verify_crcs().unwrap();
        assert_eq!(parsed.primary.destination, bundle.primary.destination);
        assert_eq!(parsed.primary.timestamp, bundle.primary.timestamp);
        assert_eq!(&*parsed.payload().data, b"hello");
        assert_eq!(
            parsed.previous_node().unwrap(),
            Some(PreviousNode(eid("ipn:3.0")))
        );

        for block in parsed.canonical_blocks() {
            assert_eq!(block.crc_type, crc_type);
            assert_eq!(block.crc.is_some(), crc_type != CrcType::None);
        }

        // Re-encoding a parsed bundle reproduces the same bytes
        assert_eq!(parsed.encode().unwrap(), data);
    }
}

#[test]
fn corrupted_payload_is_reported() {
    let bundle = Builder::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"payload")
        .canonical_crc_type(CrcType::Crc32)
        .build(&SequenceCounter::new())
        .unwrap();
    let mut data = bundle.encode().unwrap();

    let pos = data
        .windows(7)
        .position(|w| w == b"payload")
        .unwrap();
    data[pos] ^= 0x20;

    let parsed = Bundle::parse(&data).unwrap();
    assert_eq!(&*parsed.payload().data, b"Payload");

    let crc = parsed.payload().crc.unwrap();
    assert!(!crc.is_valid());
    assert!(matches!(
        parsed.verify_crcs(),
        Err(Error::ChecksumMismatch { block: 1, on_wire, computed })
            if on_wire == crc.on_wire && computed == crc.computed
    ));
}

#[test]
fn corrupted_primary_is_reported() {
    let bundle = Builder::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"x")
        .creation_time(DtnTime::new(5))
        .build(&SequenceCounter::new())
        .unwrap();
    let mut data = bundle.encode().unwrap();

    // Lifetime is the only 1a-prefixed item in the primary block
    let pos = data.iter().position(|b| *b == 0x1a).unwrap();
    data[pos + 4] ^= 0x01;

    assert!(matches!(
        Bundle::parse(&data).unwrap().verify_crcs(),
        Err(Error::ChecksumMismatch { block: 0, .. })
    ));
}

#[test]
fn second_hop_count_rejected() {
    let mut bundle = Bundle::new(primary(1), CanonicalBlock::payload(*b"x", CrcType::None)).unwrap();
    bundle
        .add(HopCount { limit: 10, count: 0 }.into_block(CrcType::None))
        .unwrap();
    assert!(matches!(
        bundle.add(HopCount { limit: 5, count: 1 }.into_block(CrcType::None)),
        Err(Error::DuplicateHopCountBlock)
    ));
}

#[test]
fn second_previous_node_rejected() {
    let mut bundle = Bundle::new(primary(1), CanonicalBlock::payload(*b"x", CrcType::None)).unwrap();
    bundle
        .add(PreviousNode(eid("ipn:1.0")).into_block(CrcType::None))
        .unwrap();
    assert!(matches!(
        bundle.add(PreviousNode(eid("ipn:2.0")).into_block(CrcType::None)),
        Err(Error::DuplicatePreviousNodeBlock)
    ));
}

#[test]
fn bundle_age() {
    let mut bundle = Bundle::new(primary(1), CanonicalBlock::payload(*b"x", CrcType::None)).unwrap();
    let age = BundleAge(core::time::Duration::from_millis(1500));
    assert_eq!(bundle.add(age.into_block(CrcType::Crc16)).unwrap(), 2);
    assert_eq!(bundle.bundle_age().unwrap(), Some(age));
    assert!(matches!(
        bundle.add(age.into_block(CrcType::Crc16)),
        Err(Error::DuplicateBundleAgeBlock)
    ));
}

#[test]
fn bundle_age_required_without_clock() {
    let mut bundle = Bundle::new(primary(0), CanonicalBlock::payload(*b"x", CrcType::None)).unwrap();
    assert!(matches!(bundle.validate(), Err(Error::BundleAgeBlockRequired)));
    assert!(matches!(bundle.encode(), Err(Error::BundleAgeBlockRequired)));

    // Nor is such a bundle accepted off the wire
    let mut data = vec![0x9f];
    data.extend_from_slice(&primary(0).encode().unwrap());
    data.extend_from_slice(&CanonicalBlock::payload(*b"x", CrcType::None).encode().unwrap());
    data.push(0xff);
    assert!(matches!(
        Bundle::parse(&data),
        Err(Error::BundleAgeBlockRequired)
    ));

    bundle
        .add(BundleAge(core::time::Duration::ZERO).into_block(CrcType::None))
        .unwrap();
    bundle.validate().unwrap();
    bundle.encode().unwrap();
}

#[test]
fn block_numbers() {
    let mut bundle = Bundle::new(primary(1), CanonicalBlock::payload(*b"x", CrcType::None)).unwrap();

    let opaque = |n: Option<u64>| {
        let block = CanonicalBlock::new(BlockType::Unrecognised(200), *b"?", CrcType::None);
        match n {
            Some(n) => block.with_block_number(n),
            None => block,
        }
    };

    assert_eq!(bundle.add(opaque(Some(7))).unwrap(), 7);
    assert_eq!(bundle.add(opaque(None)).unwrap(), 8);
    assert!(matches!(
        bundle.add(opaque(Some(7))),
        Err(Error::DuplicateBlockNumber(7))
    ));
    assert!(matches!(
        bundle.add(opaque(Some(1))),
        Err(Error::PayloadBlockNumber(1))
    ));
    assert!(matches!(
        bundle.add(opaque(Some(0))),
        Err(Error::InvalidBlockNumber(0))
    ));
    assert!(matches!(
        bundle.add(CanonicalBlock::payload(*b"y", CrcType::None)),
        Err(Error::DuplicatePayloadBlock)
    ));
}

#[test]
fn payload_must_be_payload() {
    assert!(matches!(
        Bundle::new(
            primary(1),
            HopCount { limit: 1, count: 0 }.into_block(CrcType::None)
        ),
        Err(Error::WrongBlockType {
            expected: BlockType::Payload,
            found: BlockType::HopCount
        })
    ));
}

#[test]
fn previous_node_inserted_first() {
    let mut bundle = Bundle::new(primary(1), CanonicalBlock::payload(*b"x", CrcType::None)).unwrap();
    bundle
        .add(HopCount { limit: 3, count: 0 }.into_block(CrcType::None))
        .unwrap();
    bundle
        .add(PreviousNode(eid("ipn:9.0")).into_block(CrcType::None))
        .unwrap();
    let types: Vec<_> = bundle.blocks().iter().map(|b| b.block_type).collect();
    assert_eq!(types, [BlockType::PreviousNode, BlockType::HopCount]);
}

#[test]
fn parse_rejects_bad_structure() {
    let primary = primary(1).encode().unwrap();
    let payload = CanonicalBlock::payload(*b"x", CrcType::None).encode().unwrap();
    let hop_count = HopCount { limit: 3, count: 0 }
        .into_block(CrcType::None)
        .with_block_number(2)
        .encode()
        .unwrap();
    let previous_node = PreviousNode(eid("ipn:9.0"))
        .into_block(CrcType::None)
        .with_block_number(3)
        .encode()
        .unwrap();

    let bundle = |blocks: &[&[u8]]| {
        let mut data = vec![0x9f];
        data.extend_from_slice(&primary);
        for block in blocks {
            data.extend_from_slice(block);
        }
        data.push(0xff);
        Bundle::parse(&data)
    };

    assert!(matches!(bundle(&[]), Err(Error::NotEnoughBlocks)));
    assert!(matches!(
        bundle(&[&payload, &hop_count]),
        Err(Error::PayloadNotFinal)
    ));
    assert!(matches!(
        bundle(&[&hop_count, &hop_count, &payload]),
        Err(Error::DuplicateBlockNumber(2))
    ));
    assert!(matches!(
        bundle(&[&hop_count, &previous_node, &payload]),
        Err(Error::PreviousNodeNotFirst)
    ));

    let parsed = bundle(&[&previous_node, &hop_count, &payload]).unwrap();
    assert_eq!(parsed.blocks().len(), 2);
    assert_eq!(
        parsed.hop_count().unwrap(),
        Some(HopCount { limit: 3, count: 0 })
    );
}

#[test]
fn parse_payload_with_wrong_number() {
    let mut data = vec![0x9f];
    data.extend_from_slice(&primary(1).encode().unwrap());
    data.extend_from_slice(&hex!("850102000041 78"));
    data.push(0xff);
    assert!(matches!(
        Bundle::parse(&data),
        Err(Error::InvalidBlockNumber(2))
    ));
}

#[test]
fn parse_truncated() {
    let data = Builder::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"payload")
        .build(&SequenceCounter::new())
        .unwrap()
        .encode()
        .unwrap();
    for len in 0..data.len() {
        assert!(Bundle::parse(&data[..len]).is_err());
    }
}

#[test]
fn administrative_record() {
    let subject = primary(10);
    let report = status_report::BundleStatusReport::new(
        status_report::StatusCodes::RECEIVED,
        status_report::ReasonCode::NoAdditionalInformation,
        &subject,
        None,
    );

    let bundle = Bundle::new(
        PrimaryBlock {
            flags: BundleFlags {
                is_admin_record: true,
                ..Default::default()
            },
            destination: subject.report_to.clone(),
            source: eid("ipn:2.0"),
            timestamp: CreationTimestamp::new(DtnTime::new(20), 1),
            ..Default::default()
        },
        report.into_payload_block(CrcType::Crc16),
    )
    .unwrap();

    let parsed = Bundle::parse(&bundle.encode().unwrap()).unwrap();
    assert!(parsed.primary.flags.is_admin_record);
    assert_eq!(
        status_report::BundleStatusReport::parse(&parsed.payload().data).unwrap(),
        report
    );
}
