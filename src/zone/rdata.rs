//! Presentation-format record data → wire `RData`.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, PTR, TXT};
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::txt::RDataParser;

use crate::zone::UpdateError;

/// Maximum length of a single TXT character-string.
const TXT_CHUNK: usize = 255;

/// Parse `data` as a record of `record_type` (case-insensitive).
///
/// Address, name, MX and TXT data are parsed here so that names are always
/// absolute and long TXT values are split. Every other type goes through the
/// zone-file presentation parser.
pub fn parse_rdata(record_type: &str, data: &str) -> Result<RData, UpdateError> {
    let data = data.trim();
    let invalid = |reason: String| UpdateError::InvalidData {
        record_type: record_type.to_string(),
        data: data.to_string(),
        reason,
    };

    match record_type.to_ascii_uppercase().as_str() {
        "A" => data
            .parse::<Ipv4Addr>()
            .map(|ip| RData::A(A::from(ip)))
            .map_err(|e| invalid(e.to_string())),
        "AAAA" => data
            .parse::<Ipv6Addr>()
            .map(|ip| RData::AAAA(AAAA::from(ip)))
            .map_err(|e| invalid(e.to_string())),
        "CNAME" => Ok(RData::CNAME(CNAME(parse_fqdn(data)?))),
        "NS" => Ok(RData::NS(NS(parse_fqdn(data)?))),
        "PTR" => Ok(RData::PTR(PTR(parse_fqdn(data)?))),
        "MX" => {
            let (preference, exchange) = data
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid("expected \"<preference> <exchange>\"".to_string()))?;
            let preference = preference
                .parse::<u16>()
                .map_err(|e| invalid(e.to_string()))?;
            Ok(RData::MX(MX::new(preference, parse_fqdn(exchange.trim())?)))
        }
        "TXT" => Ok(RData::TXT(TXT::new(split_txt(data)))),
        other => {
            let parsed_type = RecordType::from_str(other)
                .map_err(|_| UpdateError::UnsupportedRecordType(record_type.to_string()))?;
            if parsed_type.is_any() || matches!(parsed_type, RecordType::AXFR | RecordType::IXFR) {
                return Err(UpdateError::UnsupportedRecordType(record_type.to_string()));
            }
            RData::try_from_str(parsed_type, data).map_err(|e| invalid(e.to_string()))
        }
    }
}

/// Parse an absolute domain name; a missing trailing dot is implied.
pub fn parse_fqdn(name: &str) -> Result<Name, UpdateError> {
    let mut parsed = Name::from_ascii(name).map_err(|e| UpdateError::InvalidName {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    parsed.set_fqdn(true);
    Ok(parsed)
}

/// Split text into character-strings of at most 255 bytes on char boundaries.
fn split_txt(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if current.len() + c.len_utf8() > TXT_CHUNK {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
