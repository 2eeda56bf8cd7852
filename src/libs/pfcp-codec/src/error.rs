//! PFCP Error Types
//!
//! Error types for PFCP encoding, decoding and field lookup.

use thiserror::Error;

/// PFCP Error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PfcpError {
    /// Buffer too short for operation
    #[error("Buffer too short: needed {needed} bytes, available {available}")]
    BufferTooShort { needed: usize, available: usize },

    /// Accessor invoked on an IE that is neither the field nor one of its carriers
    #[error("Wrong carrier: {field} cannot be read from IE type {ie_type}")]
    WrongCarrier { field: &'static str, ie_type: u16 },

    /// Type selector inside a payload holds an undefined value
    #[error("Malformed discriminant in {field}: {value}")]
    MalformedDiscriminant { field: &'static str, value: u8 },

    /// Value cannot be encoded without producing a non round-tripping payload
    #[error("Inconsistent field: {0}")]
    InconsistentField(String),

    /// Payload or message body does not fit a 16-bit length field
    #[error("Payload too long: {len} bytes")]
    PayloadTooLong { len: usize },

    /// Non-decimal digit in a BCD digit string
    #[error("Invalid digit: {0:?}")]
    InvalidDigit(char),

    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    /// Invalid IE type
    #[error("Invalid IE type: {0}")]
    InvalidIeType(u16),

    /// Invalid message type
    #[error("Invalid message type: {0}")]
    InvalidMessageType(u8),

    /// Message exceeds the configured size limit
    #[error("Message too large: {len} bytes exceeds limit of {max}")]
    MessageTooLarge { len: usize, max: usize },

    /// Missing mandatory IE
    #[error("Missing mandatory IE: {0}")]
    MissingMandatoryIe(&'static str),

    /// Slot name not defined for the message type
    #[error("Unknown slot {slot} for message type {message_type}")]
    UnknownSlot { slot: String, message_type: u8 },

    /// Version not supported
    #[error("PFCP version not supported: {0}")]
    VersionNotSupported(u8),
}

/// PFCP Result type
pub type PfcpResult<T> = Result<T, PfcpError>;

impl PfcpError {
    /// Shorthand for the bound check that precedes every read
    pub(crate) fn short(needed: usize, available: usize) -> Self {
        PfcpError::BufferTooShort { needed, available }
    }
}
