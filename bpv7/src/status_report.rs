use super::*;
use error::CaptureFieldErr;

const BUNDLE_STATUS_REPORT: u64 = 1;

/// The set of status assertions a report makes.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct StatusCodes(u8);

impl StatusCodes {
    pub const RECEIVED: Self = Self(0x01);
    pub const FORWARDED: Self = Self(0x04);
    pub const DELIVERED: Self = Self(0x08);
    pub const DELETED: Self = Self(0x10);

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for StatusCodes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    #[default]
    NoAdditionalInformation,
    LifetimeExpired,
    ForwardedOverUnidirectionalLink,
    TransmissionCanceled,
    DepletedStorage,
    DestinationEndpointIDUnintelligible,
    NoKnownRouteToDestinationFromHere,
    NoTimelyContactWithNextNodeOnRoute,
    BlockUnintelligible,
    HopLimitExceeded,
    TrafficPared,
    Unassigned(u64),
}

impl From<ReasonCode> for u64 {
    fn from(value: ReasonCode) -> Self {
        match value {
            ReasonCode::NoAdditionalInformation => 0,
            ReasonCode::LifetimeExpired => 1,
            ReasonCode::ForwardedOverUnidirectionalLink => 2,
            ReasonCode::TransmissionCanceled => 3,
            ReasonCode::DepletedStorage => 4,
            ReasonCode::DestinationEndpointIDUnintelligible => 5,
            ReasonCode::NoKnownRouteToDestinationFromHere => 6,
            ReasonCode::NoTimelyContactWithNextNodeOnRoute => 7,
            ReasonCode::BlockUnintelligible => 8,
            ReasonCode::HopLimitExceeded => 9,
            ReasonCode::TrafficPared => 10,
            ReasonCode::Unassigned(v) => v,
        }
    }
}

impl From<u64> for ReasonCode {
    fn from(value: u64) -> Self {
        match value {
            0 => ReasonCode::NoAdditionalInformation,
            1 => ReasonCode::LifetimeExpired,
            2 => ReasonCode::ForwardedOverUnidirectionalLink,
            3 => ReasonCode::TransmissionCanceled,
            4 => ReasonCode::DepletedStorage,
            5 => ReasonCode::DestinationEndpointIDUnintelligible,
            6 => ReasonCode::NoKnownRouteToDestinationFromHere,
            7 => ReasonCode::NoTimelyContactWithNextNodeOnRoute,
            8 => ReasonCode::BlockUnintelligible,
            9 => ReasonCode::HopLimitExceeded,
            10 => ReasonCode::TrafficPared,
            v => ReasonCode::Unassigned(v),
        }
    }
}

/// A positive status assertion, with the time of the event if the subject
/// bundle requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAssertion(pub Option<DtnTime>);

fn emit_status_assertion(a: &mut cbor::encode::Array, sa: &Option<StatusAssertion>) {
    match sa {
        None => a.emit_array(Some(1), |a| a.emit(&false)),
        Some(StatusAssertion(None)) => a.emit_array(Some(1), |a| a.emit(&true)),
        Some(StatusAssertion(Some(time))) => a.emit_array(Some(2), |a| {
            a.emit(&true);
            a.emit(time);
        }),
    }
}

fn parse_status_assertion(a: &mut cbor::decode::Array) -> Result<Option<StatusAssertion>, Error> {
    a.parse_array(|a, _| {
        if a.parse::<bool>().map_field_err("status")? {
            Ok(Some(StatusAssertion(
                a.try_parse::<DtnTime>().map_field_err("status time")?,
            )))
        } else {
            Ok(None)
        }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleStatusReport {
    pub received: Option<StatusAssertion>,
    pub forwarded: Option<StatusAssertion>,
    pub delivered: Option<StatusAssertion>,
    pub deleted: Option<StatusAssertion>,
    pub reason: ReasonCode,
    pub source: Eid,
    pub timestamp: CreationTimestamp,
    pub fragment_info: Option<FragmentInfo>,
}

impl BundleStatusReport {
    /// Creates a report about `subject`.
    ///
    /// Each asserted status carries `time` (or the current time) only if the
    /// subject requested status times.
    pub fn new(
        codes: StatusCodes,
        reason: ReasonCode,
        subject: &PrimaryBlock,
        time: Option<DtnTime>,
    ) -> Self {
        let time = subject
            .flags
            .report_status_time
            .then(|| time.unwrap_or_else(DtnTime::now));
        let status = |code| codes.contains(code).then_some(StatusAssertion(time));
        Self {
            received: status(StatusCodes::RECEIVED),
            forwarded: status(StatusCodes::FORWARDED),
            delivered: status(StatusCodes::DELIVERED),
            deleted: status(StatusCodes::DELETED),
            reason,
            source: subject.source.clone(),
            timestamp: subject.timestamp,
            fragment_info: subject.fragment_info,
        }
    }

    /// Encodes the administrative record carried in the payload block.
    pub fn encode(&self) -> Vec<u8> {
        cbor::encode::emit_array(Some(2), |a| {
            a.emit(&BUNDLE_STATUS_REPORT);
            let count = if self.fragment_info.is_some() { 6 } else { 4 };
            a.emit_array(Some(count), |a| {
                a.emit_array(Some(4), |a| {
                    emit_status_assertion(a, &self.received);
                    emit_status_assertion(a, &self.forwarded);
                    emit_status_assertion(a, &self.delivered);
                    emit_status_assertion(a, &self.deleted);
                });
                a.emit(&u64::from(self.reason));
                a.emit(&self.source);
                a.emit(&self.timestamp);
                if let Some(fragment_info) = &self.fragment_info {
                    a.emit(&fragment_info.offset);
                    a.emit(&fragment_info.total_len);
                }
            });
        })
    }

    pub fn into_payload_block(&self, crc_type: CrcType) -> CanonicalBlock {
        CanonicalBlock::payload(self.encode(), crc_type)
    }

    /// Parses an administrative record containing a bundle status report.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        cbor::decode::parse(data)
    }
}

impl cbor::decode::FromCbor for BundleStatusReport {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        cbor::decode::try_parse_array(data, |a, _| {
            let record_type = a.parse::<u64>().map_field_err("record type")?;
            if record_type != BUNDLE_STATUS_REPORT {
                return Err(Error::UnknownAdminRecordType(record_type));
            }

            a.parse_array(|a, _| {
                let (received, forwarded, delivered, deleted) = a.parse_array(|a, _| {
                    Ok::<_, Error>((
                        parse_status_assertion(a)?,
                        parse_status_assertion(a)?,
                        parse_status_assertion(a)?,
                        parse_status_assertion(a)?,
                    ))
                })?;
                let reason = ReasonCode::from(a.parse::<u64>().map_field_err("reason code")?);
                let source = a.parse::<Eid>().map_field_err("source EID")?;
                let timestamp = a
                    .parse::<CreationTimestamp>()
                    .map_field_err("creation timestamp")?;
                let fragment_info = match a.try_parse::<u64>().map_field_err("fragment offset")? {
                    Some(offset) => Some(FragmentInfo {
                        offset,
                        total_len: a.parse().map_field_err("fragment length")?,
                    }),
                    None => None,
                };

                Ok(Self {
                    received,
                    forwarded,
                    delivered,
                    deleted,
                    reason,
                    source,
                    timestamp,
                    fragment_info,
                })
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    fn subject(report_status_time: bool, fragment: bool) -> PrimaryBlock {
        PrimaryBlock {
            flags: BundleFlags {
                report_status_time,
                is_fragment: fragment,
                ..Default::default()
            },
            source: Eid::Ipn {
                node: 1,
                service: 1,
            },
            timestamp: CreationTimestamp::new(DtnTime::new(100), 7),
            fragment_info: fragment.then_some(FragmentInfo {
                offset: 5,
                total_len: 50,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn encode_without_times() {
        let report = BundleStatusReport::new(
            StatusCodes::RECEIVED | StatusCodes::DELIVERED,
            ReasonCode::NoAdditionalInformation,
            &subject(false, false),
            Some(DtnTime::new(1)),
        );
        assert_eq!(
            report.encode(),
            hex!("8201 84 84 81f5 81f4 81f5 81f4 00 8202820101 82186407")
        );
    }

    #[test]
    fn encode_with_times() {
        let report = BundleStatusReport::new(
            StatusCodes::FORWARDED,
            ReasonCode::HopLimitExceeded,
            &subject(true, false),
            Some(DtnTime::new(2)),
        );
        assert_eq!(report.forwarded, Some(StatusAssertion(Some(DtnTime::new(2)))));
        assert_eq!(report.received, None);
        assert_eq!(
            report.encode(),
            hex!("8201 84 84 81f4 82f502 81f4 81f4 09 8202820101 82186407")
        );
    }

    #[test]
    fn round_trip_fragment() {
        let report = BundleStatusReport::new(
            StatusCodes::DELETED,
            ReasonCode::LifetimeExpired,
            &subject(true, true),
            Some(DtnTime::new(3)),
        );
        let block = report.into_payload_block(CrcType::Crc16);
        assert_eq!(block.block_number, Some(1));
        assert_eq!(BundleStatusReport::parse(&block.data).unwrap(), report);
    }

    #[test]
    fn unknown_record_type() {
        assert!(matches!(
            BundleStatusReport::parse(&hex!("820280")),
            Err(Error::UnknownAdminRecordType(2))
        ));
    }
}
