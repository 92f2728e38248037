//! Protocol limits and constants.

// === Message Limits ===

/// Maximum length of a serialized RAMF message (9 MiB).
pub const MAX_MESSAGE_LENGTH: usize = 9 * 1024 * 1024;

/// Default time to live of a new message, in seconds.
pub const DEFAULT_TTL_SECONDS: u32 = 5 * 60;

// === Format Signature ===

/// Magic constant every RAMF serialization starts with.
pub const FORMAT_SIGNATURE_MAGIC: &[u8; 8] = b"Relaynet";

/// Length of the format signature: magic, concrete type and version.
pub const FORMAT_SIGNATURE_LENGTH: usize = FORMAT_SIGNATURE_MAGIC.len() + 2;

// === Field Sequence ===

/// Number of items in the field sequence.
pub const FIELD_COUNT: usize = 5;

/// Length of a DATE-TIME value without time zone (`YYYYMMDDHHMMSS`).
pub const DATE_TIME_LENGTH: usize = 14;

/// Largest year representable in a DATE-TIME value.
pub const MAX_DATE_TIME_YEAR: i32 = 9999;
