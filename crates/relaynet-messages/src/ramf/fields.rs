//! The five-item field sequence signed inside every message.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, SubsecRound, Utc};
use der::{Any, Decode, Encode, Tag, TagNumber, Tagged};
use tracing::trace;

use crate::cms::{from_any, retag, to_any};
use crate::error::RamfError;
use crate::limits::{DATE_TIME_LENGTH, FIELD_COUNT, MAX_DATE_TIME_YEAR};

/// DATE-TIME rendering without separators or zone.
const DATE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

const RECIPIENT_ADDRESS: &str = "Recipient address";
const MESSAGE_ID: &str = "Message id";
const TTL: &str = "TTL";
const PAYLOAD: &str = "Payload";

/// Decoded field sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fields {
    /// `[0]` recipient address.
    pub recipient_address: String,
    /// `[1]` message id.
    pub id: String,
    /// `[2]` creation date, always with a zero offset.
    pub creation_date: DateTime<FixedOffset>,
    /// `[3]` time to live in seconds.
    pub ttl: u32,
    /// `[4]` payload.
    pub payload: Vec<u8>,
}

/// Encode the field sequence.
///
/// The creation date is converted to UTC and truncated to whole seconds.
///
/// # Errors
///
/// Returns an error if a text field has non-visible characters or the
/// creation date falls outside years 0000-9999.
pub fn encode(
    recipient_address: &str,
    id: &str,
    creation_date: &DateTime<FixedOffset>,
    ttl: u32,
    payload: &[u8],
) -> Result<Vec<u8>, RamfError> {
    check_visible(recipient_address, RECIPIENT_ADDRESS)?;
    check_visible(id, MESSAGE_ID)?;
    let creation_time = format_date_time(creation_date)?;

    let items = vec![
        field(0, recipient_address.as_bytes())?,
        field(1, id.as_bytes())?,
        field(2, creation_time.as_bytes())?,
        field(3, to_any(&ttl)?.value())?,
        field(4, payload)?,
    ];
    Ok(items.to_der()?)
}

/// Decode a field sequence.
///
/// # Errors
///
/// Returns an error for the first violation found: not DER, not a
/// SEQUENCE, wrong item count, then each field in order.
pub fn decode(serialization: &[u8]) -> Result<Fields, RamfError> {
    let sequence = Any::from_der(serialization).map_err(|_| RamfError::FieldsNotDer)?;
    if sequence.tag() != Tag::Sequence {
        return Err(RamfError::FieldsNotSequence);
    }
    let items = Vec::<Any>::from_der(serialization).map_err(|_| RamfError::FieldsNotDer)?;
    if items.len() != FIELD_COUNT {
        return Err(RamfError::InvalidFieldCount {
            expected: FIELD_COUNT,
            actual: items.len(),
        });
    }

    let recipient_address = visible_string(&items[0], 0, RECIPIENT_ADDRESS)?;
    let id = visible_string(&items[1], 1, MESSAGE_ID)?;
    let creation_date = parse_date_time(&items[2])?;
    let ttl = expect_tag(&items[3], 3, TTL)?;
    let ttl: u32 = from_any(&retag(ttl, Tag::Integer)?).map_err(|e| malformed(TTL, e.to_string()))?;
    let payload = expect_tag(&items[4], 4, PAYLOAD)?.value().to_vec();

    trace!(recipient_address = %recipient_address, id = %id, ttl, "Decoded field sequence");
    Ok(Fields {
        recipient_address,
        id,
        creation_date,
        ttl,
        payload,
    })
}

fn field(number: u8, value: &[u8]) -> Result<Any, RamfError> {
    Ok(Any::new(context_tag(number), value)?)
}

fn context_tag(number: u8) -> Tag {
    Tag::ContextSpecific {
        constructed: false,
        number: TagNumber::new(number),
    }
}

fn expect_tag<'a>(any: &'a Any, number: u8, name: &'static str) -> Result<&'a Any, RamfError> {
    if any.tag() == context_tag(number) {
        Ok(any)
    } else {
        Err(malformed(
            name,
            format!("expected implicit tag [{number}] but got {}", any.tag()),
        ))
    }
}

fn visible_string(any: &Any, number: u8, name: &'static str) -> Result<String, RamfError> {
    let bytes = expect_tag(any, number, name)?.value();
    if !bytes.iter().all(is_visible) {
        return Err(RamfError::InvalidVisibleString { field: name });
    }
    // Visible characters are ASCII.
    String::from_utf8(bytes.to_vec()).map_err(|e| malformed(name, e.to_string()))
}

fn check_visible(value: &str, name: &'static str) -> Result<(), RamfError> {
    if value.bytes().all(|b| is_visible(&b)) {
        Ok(())
    } else {
        Err(RamfError::InvalidVisibleString { field: name })
    }
}

fn is_visible(byte: &u8) -> bool {
    (0x20..=0x7e).contains(byte)
}

fn format_date_time(date: &DateTime<FixedOffset>) -> Result<String, RamfError> {
    let utc = date.with_timezone(&Utc).trunc_subsecs(0);
    if !(0..=MAX_DATE_TIME_YEAR).contains(&utc.year()) {
        return Err(RamfError::CreationDateOutOfRange(format!(
            "year {} is not representable",
            utc.year()
        )));
    }
    Ok(utc.format(DATE_TIME_FORMAT).to_string())
}

fn parse_date_time(any: &Any) -> Result<DateTime<FixedOffset>, RamfError> {
    if any.tag() != context_tag(2) {
        return Err(RamfError::InvalidCreationTime);
    }
    let digits = any.value();
    if digits.len() != DATE_TIME_LENGTH || !digits.iter().all(u8::is_ascii_digit) {
        return Err(RamfError::InvalidCreationTime);
    }
    let number = |range: std::ops::Range<usize>| {
        digits[range]
            .iter()
            .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0'))
    };
    let year = i32::try_from(number(0..4)).map_err(|_| RamfError::InvalidCreationTime)?;
    NaiveDate::from_ymd_opt(year, number(4..6), number(6..8))
        .and_then(|date| date.and_hms_opt(number(8..10), number(10..12), number(12..14)))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or(RamfError::InvalidCreationTime)
}

fn malformed(field: &'static str, reason: String) -> RamfError {
    RamfError::MalformedField { field, reason }
}
