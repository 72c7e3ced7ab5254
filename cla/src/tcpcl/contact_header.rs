use super::*;
use tracing::trace;

pub const MAGIC: [u8; 4] = *b"dtn!";
pub const VERSION: u8 = 3;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactFlags {
    pub request_ack: bool,
    pub reactive_fragmentation: bool,
    pub allow_refusal: bool,
    pub request_length: bool,
}

impl From<u8> for ContactFlags {
    fn from(value: u8) -> Self {
        if value & 0xF0 != 0 {
            trace!("Parsing contact header with reserved flag bits {value:#x}");
        }
        Self {
            request_ack: value & 0x01 != 0,
            reactive_fragmentation: value & 0x02 != 0,
            allow_refusal: value & 0x04 != 0,
            request_length: value & 0x08 != 0,
        }
    }
}

impl From<ContactFlags> for u8 {
    fn from(value: ContactFlags) -> Self {
        let mut flags = 0;
        if value.request_ack {
            flags |= 0x01;
        }
        if value.reactive_fragmentation {
            flags |= 0x02;
        }
        if value.allow_refusal {
            flags |= 0x04;
        }
        if value.request_length {
            flags |= 0x08;
        }
        flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactHeader {
    pub version: u8,
    pub flags: ContactFlags,

    /// Seconds between keepalives, 0 if the sender does not want them.
    pub keepalive_interval: u16,
    pub eid: String,
}

impl ContactHeader {
    pub fn new(eid: impl Into<String>, keepalive_interval: u16) -> Self {
        Self {
            version: VERSION,
            flags: ContactFlags::default(),
            keepalive_interval,
            eid: eid.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        if !self.eid.is_ascii() {
            return Err(Error::InvalidEid);
        }
        let mut data = Vec::with_capacity(8 + bpwire_sdnv::MAX_ENCODED_LEN + self.eid.len());
        data.extend_from_slice(&MAGIC);
        data.push(self.version);
        data.push(self.flags.into());
        data.extend_from_slice(&self.keepalive_interval.to_be_bytes());
        bpwire_sdnv::encode_into(self.eid.len() as u64, &mut data);
        data.extend_from_slice(self.eid.as_bytes());
        Ok(data)
    }

    /// Parses a contact header from the front of `data`.
    ///
    /// The magic and version are checked as soon as their bytes arrive, so a
    /// peer speaking something else is rejected without waiting for the rest.
    pub fn parse(data: &[u8]) -> Result<Parsed<Self>, Error> {
        let magic_len = data.len().min(MAGIC.len());
        if data[..magic_len] != MAGIC[..magic_len] {
            return Err(Error::InvalidMagic);
        }
        match data.get(4) {
            Some(&version) if version != VERSION => {
                return Err(Error::UnsupportedVersion(version));
            }
            _ => {}
        }
        if data.len() < 5 {
            return Ok(Parsed::Incomplete(5));
        }
        if data.len() < 8 {
            return Ok(Parsed::Incomplete(8));
        }

        let (eid_len, offset) = match parse_sdnv(data, 8)? {
            Parsed::Complete(len, offset) => (len, offset),
            Parsed::Incomplete(n) => return Ok(Parsed::Incomplete(n)),
        };
        let end = usize::try_from(eid_len)
            .ok()
            .and_then(|len| offset.checked_add(len))
            .ok_or(Error::MalformedLength)?;
        let Some(eid) = data.get(offset..end) else {
            return Ok(Parsed::Incomplete(end));
        };
        if !eid.is_ascii() {
            return Err(Error::InvalidEid);
        }

        Ok(Parsed::Complete(
            Self {
                version: data[4],
                flags: data[5].into(),
                keepalive_interval: u16::from_be_bytes([data[6], data[7]]),
                // ASCII is always valid UTF-8
                eid: String::from_utf8_lossy(eid).into_owned(),
            },
            end,
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn round_trip() {
        let header = ContactHeader::new("dtn://x.dtn", 30);
        let data = header.encode().unwrap();
        assert_eq!(
            data,
            hex!("64746e21 03 00 001e 0b 64746e3a2f2f782e64746e")
        );

        let Parsed::Complete(parsed, len) = ContactHeader::parse(&data).unwrap() else {
            panic!("incomplete");
        };
        assert_eq!(len, data.len());
        assert_eq!(parsed.eid, "dtn://x.dtn");
        assert_eq!(parsed.version, 3);
        assert_eq!(parsed.keepalive_interval, 30);
        assert_eq!(parsed, header);
    }

    #[test]
    fn flags() {
        let flags = ContactFlags {
            request_ack: true,
            request_length: true,
            ..Default::default()
        };
        assert_eq!(u8::from(flags), 0x09);
        assert_eq!(ContactFlags::from(0x09), flags);
        assert_eq!(ContactFlags::from(0xF6), ContactFlags::from(0x06));
    }

    #[test]
    fn byte_at_a_time() {
        let data = ContactHeader::new("dtn://a-rather-long-node-name.dtn/", 0)
            .encode()
            .unwrap();
        for len in 0..data.len() {
            match ContactHeader::parse(&data[..len]).unwrap() {
                Parsed::Incomplete(needed) => assert!(needed > len, "prefix of {len} bytes"),
                Parsed::Complete(..) => panic!("complete after {len} bytes"),
            }
        }
        assert_eq!(ContactHeader::parse(&data[..3]).unwrap(), Parsed::Incomplete(5));
        assert_eq!(ContactHeader::parse(&data[..5]).unwrap(), Parsed::Incomplete(8));
        assert_eq!(
            ContactHeader::parse(&data[..8]).unwrap(),
            Parsed::Incomplete(9)
        );
        assert_eq!(
            ContactHeader::parse(&data[..9]).unwrap(),
            Parsed::Incomplete(data.len())
        );
    }

    #[test]
    fn rejects() {
        assert!(matches!(
            ContactHeader::parse(b"dtx"),
            Err(Error::InvalidMagic)
        ));
        assert!(matches!(
            ContactHeader::parse(&hex!("64746e21 04")),
            Err(Error::UnsupportedVersion(4))
        ));
        assert!(matches!(
            ContactHeader::parse(&hex!("64746e21 03 00 0000 02 ff00")),
            Err(Error::InvalidEid)
        ));
        assert!(matches!(
            ContactHeader::parse(&hex!("64746e21 03 00 0000 ffffffffffffffffffff")),
            Err(Error::MalformedLength)
        ));
        assert!(matches!(
            ContactHeader::new("dtn://é", 0).encode(),
            Err(Error::InvalidEid)
        ));
    }
}
