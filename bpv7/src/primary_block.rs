use super::*;
use crc::{encode_block, parse_crc_value};
use error::CaptureFieldErr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentInfo {
    pub offset: u64,
    pub total_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryBlock {
    pub flags: BundleFlags,
    pub crc_type: CrcType,
    pub destination: Eid,
    pub source: Eid,
    pub report_to: Eid,
    pub timestamp: CreationTimestamp,
    pub lifetime: core::time::Duration,
    /// Present if and only if `flags.is_fragment` is set
    pub fragment_info: Option<FragmentInfo>,
    /// Set when the block was parsed with a CRC
    pub crc: Option<CrcValue>,
}

impl Default for PrimaryBlock {
    fn default() -> Self {
        Self {
            flags: BundleFlags::default(),
            crc_type: CrcType::Crc32,
            destination: Eid::Null,
            source: Eid::Null,
            report_to: Eid::Null,
            timestamp: CreationTimestamp::default(),
            lifetime: core::time::Duration::from_secs(300),
            fragment_info: None,
            crc: None,
        }
    }
}

impl PrimaryBlock {
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let fragment_info = match (self.flags.is_fragment, &self.fragment_info) {
            (true, None) => return Err(Error::MissingFragmentInfo),
            (false, Some(_)) => return Err(Error::UnexpectedFragmentInfo),
            (_, fragment_info) => fragment_info,
        };
        let lifetime =
            u64::try_from(self.lifetime.as_micros()).map_err(|_| Error::LifetimeOverflow)?;

        let count = if fragment_info.is_some() { 10 } else { 8 };
        Ok(encode_block(self.crc_type, count, |a| {
            a.emit(&7);
            a.emit(&u64::from(self.flags));
            a.emit(&self.crc_type);
            a.emit(&self.destination);
            a.emit(&self.source);
            a.emit(&self.report_to);
            a.emit(&self.timestamp);
            a.emit(&lifetime);
            if let Some(fragment_info) = fragment_info {
                a.emit(&fragment_info.offset);
                a.emit(&fragment_info.total_len);
            }
        }))
    }

    /// Parses a complete primary block occupying the whole of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        cbor::decode::parse(data)
    }
}

impl cbor::decode::FromCbor for PrimaryBlock {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        cbor::decode::try_parse_array(data, |block, tags| {
            if !tags.is_empty() {
                return Err(Error::TaggedBlock);
            }

            let version = block.parse::<u64>().map_field_err("version")?;
            if version != 7 {
                return Err(Error::InvalidVersion(version));
            }

            let flags = BundleFlags::from(
                block
                    .parse::<u64>()
                    .map_field_err("bundle processing control flags")?,
            );
            let crc_type = block.parse::<CrcType>().map_field_err("CRC type")?;
            let destination = block.parse::<Eid>().map_field_err("destination EID")?;
            let source = block.parse::<Eid>().map_field_err("source EID")?;
            let report_to = block.parse::<Eid>().map_field_err("report-to EID")?;
            let timestamp = block
                .parse::<CreationTimestamp>()
                .map_field_err("creation timestamp")?;
            let lifetime = core::time::Duration::from_micros(
                block.parse::<u64>().map_field_err("lifetime")?,
            );

            let fragment_info = if flags.is_fragment {
                let offset = block.parse::<u64>().map_field_err("fragment offset")?;
                let total_len = block
                    .parse::<u64>()
                    .map_field_err("total application data unit length")?;
                if offset >= total_len {
                    return Err(Error::InvalidFragmentInfo(offset, total_len));
                }
                Some(FragmentInfo { offset, total_len })
            } else {
                None
            };

            let crc = parse_crc_value(data, block, crc_type)?;

            Ok(Self {
                flags,
                crc_type,
                destination,
                source,
                report_to,
                timestamp,
                lifetime,
                fragment_info,
                crc,
            })
        })
    }
}
