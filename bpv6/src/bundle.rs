use super::*;
use bpwire_sdnv::encode_into as sdnv;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FragmentInfo {
    pub offset: u64,
    pub total_len: u64,
}

/// An outgoing BPv6 bundle.
///
/// `creation_time` defaults to the current time and `sequence_number` to the
/// next value of the counter passed to [`Bundle::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub flags: BundleFlags,
    pub destination: Eid,
    pub source: Eid,
    pub report_to: Eid,
    pub custodian: Eid,
    pub creation_time: Option<DtnTime>,
    pub sequence_number: Option<u64>,
    /// Seconds
    pub lifetime: u64,
    pub fragment_info: Option<FragmentInfo>,
    pub payload: Box<[u8]>,
}

impl Bundle {
    pub fn new(source: Eid, destination: Eid, payload: impl Into<Box<[u8]>>) -> Self {
        Self {
            flags: BundleFlags::default(),
            destination,
            source,
            report_to: Eid::Null,
            custodian: Eid::Null,
            creation_time: None,
            sequence_number: None,
            lifetime: 300,
            fragment_info: None,
            payload: payload.into(),
        }
    }

    /// Marks the bundle as a fragment.
    pub fn fragment(mut self, offset: u64, total_len: u64) -> Self {
        self.flags.insert(BundleFlags::IS_FRAGMENT);
        self.fragment_info = Some(FragmentInfo { offset, total_len });
        self
    }

    /// Encodes the primary block followed by the payload block.
    pub fn encode(&self, counter: &SequenceCounter) -> Result<Vec<u8>, Error> {
        let fragment_info = match (
            self.flags.contains(BundleFlags::IS_FRAGMENT),
            self.fragment_info,
        ) {
            (true, None) => return Err(Error::MissingFragmentInfo),
            (false, Some(_)) => return Err(Error::UnexpectedFragmentInfo),
            (_, Some(f)) if f.offset >= f.total_len => {
                return Err(Error::InvalidFragmentInfo(f.offset, f.total_len));
            }
            (_, fragment_info) => fragment_info,
        };

        // Everything after the block length field
        let mut body = Vec::new();
        let mut dictionary = Vec::new();
        for eid in [
            &self.destination,
            &self.source,
            &self.report_to,
            &self.custodian,
        ] {
            for part in [eid.scheme().to_string(), eid.ssp()] {
                sdnv(dictionary.len() as u64, &mut body);
                dictionary.extend_from_slice(part.as_bytes());
                dictionary.push(0);
            }
        }

        sdnv(
            self.creation_time.unwrap_or_else(DtnTime::now).secs(),
            &mut body,
        );
        sdnv(
            self.sequence_number.unwrap_or_else(|| counter.next()),
            &mut body,
        );
        sdnv(self.lifetime, &mut body);
        sdnv(dictionary.len() as u64, &mut body);
        body.extend_from_slice(&dictionary);
        if let Some(fragment_info) = fragment_info {
            sdnv(fragment_info.offset, &mut body);
            sdnv(fragment_info.total_len, &mut body);
        }

        let mut data = Vec::with_capacity(body.len() + self.payload.len() + 32);
        data.push(VERSION);
        sdnv(self.flags.bits(), &mut data);
        sdnv(body.len() as u64, &mut data);
        data.extend_from_slice(&body);

        data.push(PAYLOAD_BLOCK);
        sdnv(BlockFlags::LAST_BLOCK.bits(), &mut data);
        sdnv(self.payload.len() as u64, &mut data);
        data.extend_from_slice(&self.payload);
        Ok(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    fn eid(s: &str) -> Eid {
        s.parse().unwrap()
    }

    const DICTIONARY: &[u8] = b"ipn\x002.1\x00ipn\x001.1\x00dtn\x00none\x00dtn\x00none\x00";

    #[test]
    fn encode() {
        let bundle = Bundle {
            creation_time: Some(DtnTime::new(1000)),
            sequence_number: Some(5),
            ..Bundle::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"hi")
        };
        let data = bundle.encode(&SequenceCounter::new()).unwrap();

        let mut expected = hex!("06 8110 30 0004080c1014191d 8768 05 822c 22").to_vec();
        expected.extend_from_slice(DICTIONARY);
        expected.extend_from_slice(&hex!("01 08 02 6869"));
        assert_eq!(data, expected);
    }

    #[test]
    fn sequence_from_counter() {
        let counter = SequenceCounter::new();
        let bundle = Bundle {
            creation_time: Some(DtnTime::new(1)),
            ..Bundle::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"")
        };

        // Offset of the sequence number: type, flags, length, eight offsets, time
        let seq = |data: Vec<u8>| data[1 + 2 + 1 + 8 + 1];
        assert_eq!(seq(bundle.encode(&counter).unwrap()), 0);
        assert_eq!(seq(bundle.encode(&counter).unwrap()), 1);
        counter.reset();
        assert_eq!(seq(bundle.encode(&counter).unwrap()), 0);
    }

    #[test]
    fn dtn_eids() {
        let bundle = Bundle {
            creation_time: Some(DtnTime::new(0)),
            sequence_number: Some(0),
            ..Bundle::new(eid("dtn://a/b"), eid("dtn://c"), *b"x")
        };
        let data = bundle.encode(&SequenceCounter::new()).unwrap();
        let dictionary = b"dtn\x00//c\x00dtn\x00//a/b\x00dtn\x00none\x00dtn\x00none\x00";
        assert!(
            data.windows(dictionary.len())
                .any(|w| w == dictionary.as_slice())
        );
        // Offsets of the eight dictionary strings
        assert_eq!(data[4..12], hex!("0004080c 1216 1b1f"));
    }

    #[test]
    fn fragment() {
        let bundle = Bundle {
            creation_time: Some(DtnTime::new(1000)),
            sequence_number: Some(5),
            ..Bundle::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"hi")
        }
        .fragment(4, 200);
        let data = bundle.encode(&SequenceCounter::new()).unwrap();

        assert_eq!(data[..4], hex!("06 8111 33"));
        let tail = hex!("04 8148 01 08 02 6869");
        assert_eq!(data[data.len() - tail.len()..], tail);
    }

    #[test]
    fn fragment_flag_mismatch() {
        let mut bundle = Bundle::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"hi");
        bundle.flags.insert(BundleFlags::IS_FRAGMENT);
        assert!(matches!(
            bundle.encode(&SequenceCounter::new()),
            Err(Error::MissingFragmentInfo)
        ));

        let bundle = Bundle {
            fragment_info: Some(FragmentInfo {
                offset: 0,
                total_len: 10,
            }),
            ..Bundle::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"hi")
        };
        assert!(matches!(
            bundle.encode(&SequenceCounter::new()),
            Err(Error::UnexpectedFragmentInfo)
        ));

        let bundle = Bundle::new(eid("ipn:1.1"), eid("ipn:2.1"), *b"hi").fragment(10, 10);
        assert!(matches!(
            bundle.encode(&SequenceCounter::new()),
            Err(Error::InvalidFragmentInfo(10, 10))
        ));
    }
}
