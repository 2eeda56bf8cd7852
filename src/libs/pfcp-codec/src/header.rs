//! PFCP Header
//!
//! PFCP message header as specified in 3GPP TS 29.244 Section 7.2.2.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{PfcpError, PfcpResult};
use crate::types::PFCP_VERSION;
use crate::util::ensure;

/// PFCP Header length without SEID (8 bytes)
pub const PFCP_HEADER_LEN: usize = 8;

/// PFCP Header length with SEID (16 bytes)
pub const PFCP_HEADER_LEN_WITH_SEID: usize = 16;

/// Octets before the length field is counted from
pub const PFCP_MANDATORY_LEN: usize = 4;

/// Largest 24-bit sequence number
pub const MAX_SEQUENCE_NUMBER: u32 = 0x00FF_FFFF;

/// Largest 4-bit message priority
pub const MAX_PRIORITY: u8 = 0x0F;

const FLAG_S: u8 = 0x01;
const FLAG_MP: u8 = 0x02;
const FLAG_FO: u8 = 0x04;

/// PFCP Message Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PfcpMessageType {
    // Node related messages (no SEID)
    HeartbeatRequest = 1,
    HeartbeatResponse = 2,
    PfdManagementRequest = 3,
    PfdManagementResponse = 4,
    AssociationSetupRequest = 5,
    AssociationSetupResponse = 6,
    AssociationUpdateRequest = 7,
    AssociationUpdateResponse = 8,
    AssociationReleaseRequest = 9,
    AssociationReleaseResponse = 10,
    VersionNotSupportedResponse = 11,
    NodeReportRequest = 12,
    NodeReportResponse = 13,
    SessionSetDeletionRequest = 14,
    SessionSetDeletionResponse = 15,
    SessionSetModificationRequest = 16,
    SessionSetModificationResponse = 17,

    // Session related messages (with SEID)
    SessionEstablishmentRequest = 50,
    SessionEstablishmentResponse = 51,
    SessionModificationRequest = 52,
    SessionModificationResponse = 53,
    SessionDeletionRequest = 54,
    SessionDeletionResponse = 55,
    SessionReportRequest = 56,
    SessionReportResponse = 57,
}

impl TryFrom<u8> for PfcpMessageType {
    type Error = PfcpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::HeartbeatRequest),
            2 => Ok(Self::HeartbeatResponse),
            3 => Ok(Self::PfdManagementRequest),
            4 => Ok(Self::PfdManagementResponse),
            5 => Ok(Self::AssociationSetupRequest),
            6 => Ok(Self::AssociationSetupResponse),
            7 => Ok(Self::AssociationUpdateRequest),
            8 => Ok(Self::AssociationUpdateResponse),
            9 => Ok(Self::AssociationReleaseRequest),
            10 => Ok(Self::AssociationReleaseResponse),
            11 => Ok(Self::VersionNotSupportedResponse),
            12 => Ok(Self::NodeReportRequest),
            13 => Ok(Self::NodeReportResponse),
            14 => Ok(Self::SessionSetDeletionRequest),
            15 => Ok(Self::SessionSetDeletionResponse),
            16 => Ok(Self::SessionSetModificationRequest),
            17 => Ok(Self::SessionSetModificationResponse),
            50 => Ok(Self::SessionEstablishmentRequest),
            51 => Ok(Self::SessionEstablishmentResponse),
            52 => Ok(Self::SessionModificationRequest),
            53 => Ok(Self::SessionModificationResponse),
            54 => Ok(Self::SessionDeletionRequest),
            55 => Ok(Self::SessionDeletionResponse),
            56 => Ok(Self::SessionReportRequest),
            57 => Ok(Self::SessionReportResponse),
            _ => Err(PfcpError::InvalidMessageType(value)),
        }
    }
}

impl From<PfcpMessageType> for u8 {
    fn from(t: PfcpMessageType) -> Self {
        t as u8
    }
}

impl PfcpMessageType {
    /// Check if this message type requires SEID
    pub fn has_seid(&self) -> bool {
        (*self as u8) >= 50
    }

    /// Get the name of the message type
    pub fn name(&self) -> &'static str {
        match self {
            Self::HeartbeatRequest => "Heartbeat Request",
            Self::HeartbeatResponse => "Heartbeat Response",
            Self::PfdManagementRequest => "PFD Management Request",
            Self::PfdManagementResponse => "PFD Management Response",
            Self::AssociationSetupRequest => "Association Setup Request",
            Self::AssociationSetupResponse => "Association Setup Response",
            Self::AssociationUpdateRequest => "Association Update Request",
            Self::AssociationUpdateResponse => "Association Update Response",
            Self::AssociationReleaseRequest => "Association Release Request",
            Self::AssociationReleaseResponse => "Association Release Response",
            Self::VersionNotSupportedResponse => "Version Not Supported Response",
            Self::NodeReportRequest => "Node Report Request",
            Self::NodeReportResponse => "Node Report Response",
            Self::SessionSetDeletionRequest => "Session Set Deletion Request",
            Self::SessionSetDeletionResponse => "Session Set Deletion Response",
            Self::SessionSetModificationRequest => "Session Set Modification Request",
            Self::SessionSetModificationResponse => "Session Set Modification Response",
            Self::SessionEstablishmentRequest => "Session Establishment Request",
            Self::SessionEstablishmentResponse => "Session Establishment Response",
            Self::SessionModificationRequest => "Session Modification Request",
            Self::SessionModificationResponse => "Session Modification Response",
            Self::SessionDeletionRequest => "Session Deletion Request",
            Self::SessionDeletionResponse => "Session Deletion Response",
            Self::SessionReportRequest => "Session Report Request",
            Self::SessionReportResponse => "Session Report Response",
        }
    }
}

/// PFCP Header structure
///
/// Format (with SEID - 16 bytes):
/// ```text
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// |    Version    | Spare | FO| MP| S |                           |
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// |                    Message Type                               |
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// |                    Message Length (2 octets)                  |
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// |                    SEID (8 octets, only if S)                 |
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// |                    Sequence Number (3 octets)                 |
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// |   Priority (if MP)    |            Spare                      |
/// +-------+-------+-------+-------+-------+-------+-------+-------+
/// ```
///
/// The S flag mirrors `seid.is_some()` and MP mirrors `priority.is_some()`.
/// `message_type` stays raw so unknown types survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PfcpHeader {
    /// PFCP version, 3 bits
    pub version: u8,
    /// Follow On flag: another message follows in the same datagram
    pub follow_on: bool,
    /// Message type code
    pub message_type: u8,
    /// Message length excluding the first 4 octets
    pub length: u16,
    /// Session Endpoint Identifier
    pub seid: Option<u64>,
    /// Sequence number, 24 bits
    pub sequence_number: u32,
    /// Message priority, 4 bits
    pub priority: Option<u8>,
}

impl PfcpHeader {
    /// Create a new PFCP header without SEID
    pub fn new(message_type: PfcpMessageType, sequence_number: u32) -> Self {
        Self::raw(message_type as u8, None, sequence_number)
    }

    /// Create a new PFCP header with SEID
    pub fn new_with_seid(message_type: PfcpMessageType, seid: u64, sequence_number: u32) -> Self {
        Self::raw(message_type as u8, Some(seid), sequence_number)
    }

    /// Header for any type code, known or not
    pub fn raw(message_type: u8, seid: Option<u64>, sequence_number: u32) -> Self {
        Self {
            version: PFCP_VERSION,
            follow_on: false,
            message_type,
            length: 0,
            seid,
            sequence_number,
            priority: None,
        }
    }

    /// Typed view of the message type
    pub fn known_type(&self) -> Option<PfcpMessageType> {
        PfcpMessageType::try_from(self.message_type).ok()
    }

    /// Get the header length
    pub fn header_len(&self) -> usize {
        if self.seid.is_some() {
            PFCP_HEADER_LEN_WITH_SEID
        } else {
            PFCP_HEADER_LEN
        }
    }

    /// Header octets counted by the length field
    fn counted_header_len(&self) -> usize {
        self.header_len() - PFCP_MANDATORY_LEN
    }

    /// Body length implied by `length`.
    pub fn body_len(&self) -> PfcpResult<usize> {
        (self.length as usize)
            .checked_sub(self.counted_header_len())
            .ok_or_else(|| {
                PfcpError::InvalidFormat(format!(
                    "message length {} below header size {}",
                    self.length,
                    self.counted_header_len()
                ))
            })
    }

    /// Recompute `length` for a body of `body_len` octets.
    pub fn set_body_len(&mut self, body_len: usize) -> PfcpResult<()> {
        let len = body_len
            .checked_add(self.counted_header_len())
            .ok_or(PfcpError::PayloadTooLong { len: body_len })?;
        self.length = u16::try_from(len).map_err(|_| PfcpError::PayloadTooLong { len })?;
        Ok(())
    }

    /// Reject values the header fields cannot hold
    pub fn validate(&self) -> PfcpResult<()> {
        if self.version == 0 || self.version > 0x07 {
            return Err(PfcpError::InconsistentField(format!(
                "version {} outside 1..=7",
                self.version
            )));
        }
        if self.sequence_number > MAX_SEQUENCE_NUMBER {
            return Err(PfcpError::InconsistentField(format!(
                "sequence number {:#x} exceeds 24 bits",
                self.sequence_number
            )));
        }
        if let Some(p) = self.priority {
            if p > MAX_PRIORITY {
                return Err(PfcpError::InconsistentField(format!(
                    "priority {p} exceeds 4 bits"
                )));
            }
        }
        Ok(())
    }

    /// Encode the header to bytes
    pub fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        self.validate()?;

        let mut flags = self.version << 5;
        if self.follow_on {
            flags |= FLAG_FO;
        }
        if self.priority.is_some() {
            flags |= FLAG_MP;
        }
        if self.seid.is_some() {
            flags |= FLAG_S;
        }
        buf.put_u8(flags);
        buf.put_u8(self.message_type);
        buf.put_u16(self.length);

        if let Some(seid) = self.seid {
            buf.put_u64(seid);
        }

        // Sequence number (3 bytes) + priority/spare (1 byte)
        let seq_bytes = self.sequence_number.to_be_bytes();
        buf.put_slice(&seq_bytes[1..4]);
        buf.put_u8(self.priority.unwrap_or(0) << 4);
        Ok(())
    }

    /// Decode header from bytes
    ///
    /// Any version is accepted here; version policy belongs to the caller.
    pub fn decode(buf: &mut Bytes) -> PfcpResult<Self> {
        ensure(&*buf, PFCP_MANDATORY_LEN)?;
        let flags = buf.chunk()[0];
        let seid_presence = flags & FLAG_S != 0;
        let header_len = if seid_presence {
            PFCP_HEADER_LEN_WITH_SEID
        } else {
            PFCP_HEADER_LEN
        };
        ensure(&*buf, header_len)?;

        buf.advance(1);
        let message_type = buf.get_u8();
        let length = buf.get_u16();
        let seid = if seid_presence {
            Some(buf.get_u64())
        } else {
            None
        };

        let mut seq_bytes = [0u8; 4];
        buf.copy_to_slice(&mut seq_bytes[1..4]);
        let sequence_number = u32::from_be_bytes(seq_bytes);

        let last_byte = buf.get_u8();
        let priority = if flags & FLAG_MP != 0 {
            Some(last_byte >> 4)
        } else {
            None
        };

        Ok(Self {
            version: flags >> 5,
            follow_on: flags & FLAG_FO != 0,
            message_type,
            length,
            seid,
            sequence_number,
            priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_encode_decode_no_seid() {
        let header = PfcpHeader::new(PfcpMessageType::HeartbeatRequest, 12345);
        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), PFCP_HEADER_LEN);
        assert_eq!(buf[0], 0x20);

        let mut bytes = buf.freeze();
        let decoded = PfcpHeader::decode(&mut bytes).unwrap();

        assert_eq!(decoded.version, PFCP_VERSION);
        assert_eq!(decoded.known_type(), Some(PfcpMessageType::HeartbeatRequest));
        assert_eq!(decoded.sequence_number, 12345);
        assert!(decoded.seid.is_none());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_header_encode_decode_with_seid() {
        let mut header = PfcpHeader::new_with_seid(
            PfcpMessageType::SessionEstablishmentRequest,
            0x1122334455667788,
            0xABCDEF,
        );
        header.set_body_len(0).unwrap();
        assert_eq!(header.length, 12);

        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), PFCP_HEADER_LEN_WITH_SEID);
        assert_eq!(buf[0], 0x21);
        assert_eq!(&buf[12..15], &[0xAB, 0xCD, 0xEF]);

        let mut bytes = buf.freeze();
        let decoded = PfcpHeader::decode(&mut bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.body_len().unwrap(), 0);
    }

    #[test]
    fn test_flags_layout() {
        let mut header = PfcpHeader::new_with_seid(PfcpMessageType::SessionReportRequest, 1, 1);
        header.follow_on = true;
        header.priority = Some(9);

        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(buf[0], 0x27);
        assert_eq!(buf[15], 0x90);

        let decoded = PfcpHeader::decode(&mut buf.freeze()).unwrap();
        assert!(decoded.follow_on);
        assert_eq!(decoded.priority, Some(9));
    }

    #[test]
    fn test_validate() {
        let mut buf = BytesMut::new();

        let mut header = PfcpHeader::new(PfcpMessageType::HeartbeatRequest, 0x0100_0000);
        assert!(matches!(header.encode(&mut buf), Err(PfcpError::InconsistentField(_))));

        header.sequence_number = 1;
        header.priority = Some(16);
        assert!(header.encode(&mut buf).is_err());

        header.priority = None;
        header.version = 0;
        assert!(header.encode(&mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        let mut short = Bytes::from_static(&[0x21, 50, 0, 12, 0, 0]);
        assert!(matches!(
            PfcpHeader::decode(&mut short),
            Err(PfcpError::BufferTooShort { needed: 16, .. })
        ));
    }

    #[test]
    fn test_body_len_below_header() {
        let mut header = PfcpHeader::new_with_seid(PfcpMessageType::SessionDeletionRequest, 1, 1);
        header.length = 4;
        assert!(matches!(header.body_len(), Err(PfcpError::InvalidFormat(_))));
        assert!(header.set_body_len(u16::MAX as usize).is_err());
    }

    #[test]
    fn test_message_type_has_seid() {
        assert!(!PfcpMessageType::HeartbeatRequest.has_seid());
        assert!(!PfcpMessageType::AssociationSetupRequest.has_seid());
        assert!(!PfcpMessageType::SessionSetModificationResponse.has_seid());
        assert!(PfcpMessageType::SessionEstablishmentRequest.has_seid());
        assert!(PfcpMessageType::SessionReportResponse.has_seid());
        assert!(PfcpMessageType::try_from(18).is_err());
    }
}
