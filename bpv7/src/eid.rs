use super::*;
use thiserror::Error;
use winnow::{
    ModalResult, Parser,
    ascii::dec_uint,
    combinator::{alt, preceded},
    token::take_while,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported EID scheme {0}")]
    UnsupportedScheme(u64),

    #[error("Invalid dtn scheme-specific part {0:?}")]
    InvalidSsp(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),
}

/// An endpoint identifier.
///
/// `dtn:none` is the null endpoint. Other `dtn` EIDs keep their
/// scheme-specific part verbatim, e.g. `//node/service`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub enum Eid {
    #[default]
    Null,
    Dtn(Box<str>),
    Ipn {
        node: u64,
        service: u64,
    },
}

impl Eid {
    pub fn scheme(&self) -> &'static str {
        match self {
            Eid::Null | Eid::Dtn(_) => "dtn",
            Eid::Ipn { .. } => "ipn",
        }
    }

    pub fn ssp(&self) -> String {
        match self {
            Eid::Null => "none".to_string(),
            Eid::Dtn(ssp) => ssp.to_string(),
            Eid::Ipn { node, service } => format!("{node}.{service}"),
        }
    }
}

impl core::fmt::Display for Eid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Eid::Null => write!(f, "dtn:none"),
            Eid::Dtn(ssp) => write!(f, "dtn:{ssp}"),
            Eid::Ipn { node, service } => write!(f, "ipn:{node}.{service}"),
        }
    }
}

fn parse_ipn(input: &mut &str) -> ModalResult<Eid> {
    (dec_uint, preceded(".", dec_uint))
        .map(|(node, service)| Eid::Ipn { node, service })
        .parse_next(input)
}

fn parse_dtn(input: &mut &str) -> ModalResult<Eid> {
    take_while(1.., '\x21'..='\x7e')
        .map(|ssp: &str| {
            if ssp == "none" {
                Eid::Null
            } else {
                Eid::Dtn(ssp.into())
            }
        })
        .parse_next(input)
}

pub fn parse_eid(input: &mut &str) -> ModalResult<Eid> {
    alt((preceded("dtn:", parse_dtn), preceded("ipn:", parse_ipn))).parse_next(input)
}

impl core::str::FromStr for Eid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_eid
            .parse(s)
            .map_err(|e| Error::ParseError(e.to_string()))
    }
}

impl TryFrom<&str> for Eid {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Eid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Eid> for String {
    fn from(value: Eid) -> Self {
        value.to_string()
    }
}

impl cbor::encode::ToCbor for Eid {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit_array(Some(2), |a| match self {
            Eid::Null => {
                a.emit(&1);
                a.emit(&0);
            }
            Eid::Dtn(ssp) => {
                a.emit(&1);
                a.emit(&**ssp);
            }
            Eid::Ipn { node, service } => {
                a.emit(&2);
                a.emit_array(Some(2), |a| {
                    a.emit(node);
                    a.emit(service);
                });
            }
        })
    }
}

impl cbor::decode::FromCbor for Eid {
    type Error = self::Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        cbor::decode::try_parse_array(data, |a, _| match a.parse::<u64>()? {
            1 => a
                .parse_value(|value, _| match value {
                    cbor::decode::Value::UnsignedInteger(0) => Ok(Eid::Null),
                    cbor::decode::Value::Text("none") => Ok(Eid::Null),
                    cbor::decode::Value::Text(ssp) => {
                        if ssp.is_empty() || !ssp.bytes().all(|b| (0x21..=0x7e).contains(&b)) {
                            Err(Error::InvalidSsp(ssp.to_string()))
                        } else {
                            Ok(Eid::Dtn(ssp.into()))
                        }
                    }
                    value => Err(cbor::decode::Error::IncorrectType(
                        "Text String or 0".to_string(),
                        value.type_name(),
                    )
                    .into()),
                })
                .map(|(eid, _)| eid),
            2 => a.parse_array(|a, _| {
                Ok::<_, Error>(Eid::Ipn {
                    node: a.parse()?,
                    service: a.parse()?,
                })
            }),
            scheme => Err(Error::UnsupportedScheme(scheme)),
        })
    }
}
