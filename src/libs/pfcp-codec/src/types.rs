//! PFCP Types
//!
//! Typed IE payloads as specified in 3GPP TS 29.244 Section 8.2, one per
//! payload encoding kind, each with its legal carrier paths.
//!
//! Decoders read the octets they understand and ignore trailing ones, which
//! later releases may append. Encoders write the minimal form.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::SystemTime;

use bytes::{Buf, BufMut, BytesMut};

use crate::catalogue::{self, Encoding, Typed};
use crate::error::{PfcpError, PfcpResult};
use crate::field::{Hop, IeValue};
use crate::ie::IeType;
use crate::util::{
    self, ensure, get_array, get_u16, get_u24, get_u32, get_u40, get_u64, get_u8, has_bit,
    put_u24, put_u40, set_bit_if,
};

/// PFCP Version
pub const PFCP_VERSION: u8 = 1;

/// PFCP UDP port (8805)
pub const PFCP_UDP_PORT: u16 = 8805;

/// Carrier path list: `Carrier => [next, ...]`
macro_rules! hops {
    ($($carrier:ident => [$($next:ident),+ $(,)?]),* $(,)?) => {
        &[$(Hop::new(IeType::$carrier, &[$(IeType::$next),+])),*]
    };
}

/// Fixed-width integer newtype
macro_rules! scalar_ie {
    (
        $(#[$doc:meta])*
        $name:ident($inner:ty) = $ie:ident, $label:literal, $get:ident, $put:ident,
        $carriers:expr
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub $inner);

        impl IeValue for $name {
            const IE_TYPE: IeType = IeType::$ie;
            const NAME: &'static str = $label;
            const ENCODING: Encoding = Encoding::Scalar;
            const CARRIERS: &'static [Hop] = $carriers;

            fn decode(payload: &[u8]) -> PfcpResult<Self> {
                let mut buf = payload;
                Ok(Self($get(&mut buf)?))
            }

            fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
                buf.$put(self.0);
                Ok(())
            }
        }
    };
}

/// NTP-seconds timestamp newtype
macro_rules! timestamp_ie {
    ($(#[$doc:meta])* $name:ident = $ie:ident, $label:literal, $carriers:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn from_system_time(time: SystemTime) -> PfcpResult<Self> {
                Ok(Self(util::system_time_to_ntp(time)?))
            }

            pub fn now() -> PfcpResult<Self> {
                Self::from_system_time(SystemTime::now())
            }

            pub fn to_system_time(self) -> SystemTime {
                util::ntp_to_system_time(self.0)
            }

            /// Seconds since the Unix epoch
            pub fn unix_secs(self) -> i64 {
                util::ntp_to_unix(self.0)
            }
        }

        impl IeValue for $name {
            const IE_TYPE: IeType = IeType::$ie;
            const NAME: &'static str = $label;
            const ENCODING: Encoding = Encoding::Timestamp;
            const CARRIERS: &'static [Hop] = $carriers;

            fn decode(payload: &[u8]) -> PfcpResult<Self> {
                let mut buf = payload;
                Ok(Self(get_u32(&mut buf)?))
            }

            fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
                buf.put_u32(self.0);
                Ok(())
            }
        }
    };
}

/// Octet-string newtype
macro_rules! text_ie {
    ($(#[$doc:meta])* $name:ident = $ie:ident, $label:literal, $carriers:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl IeValue for $name {
            const IE_TYPE: IeType = IeType::$ie;
            const NAME: &'static str = $label;
            const ENCODING: Encoding = Encoding::Text;
            const CARRIERS: &'static [Hop] = $carriers;

            fn decode(payload: &[u8]) -> PfcpResult<Self> {
                let text = std::str::from_utf8(payload).map_err(|e| {
                    PfcpError::InvalidFormat(format!("{} is not UTF-8: {e}", $label))
                })?;
                Ok(Self(text.to_string()))
            }

            fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
                buf.put_slice(self.0.as_bytes());
                Ok(())
            }
        }
    };
}

/// One-octet enumeration with a typed error for undefined values
macro_rules! wire_enum {
    ($(#[$doc:meta])* $name:ident, $label:literal { $($variant:ident = $val:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $val),+
        }

        impl TryFrom<u8> for $name {
            type Error = PfcpError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($val => Ok(Self::$variant),)+
                    _ => Err(PfcpError::MalformedDiscriminant { field: $label, value }),
                }
            }
        }
    };
}

fn check_flag(field: &str, flag: bool, present: bool) -> PfcpResult<()> {
    if flag != present {
        let state = if flag { "set but value missing" } else { "clear but value present" };
        return Err(PfcpError::InconsistentField(format!("{field} flag {state}")));
    }
    Ok(())
}

fn get_ipv4<B: Buf>(buf: &mut B) -> PfcpResult<Ipv4Addr> {
    Ok(Ipv4Addr::from(get_array::<4, _>(buf)?))
}

fn get_ipv6<B: Buf>(buf: &mut B) -> PfcpResult<Ipv6Addr> {
    Ok(Ipv6Addr::from(get_array::<16, _>(buf)?))
}

fn put_len_prefixed(buf: &mut BytesMut, field: &str, data: &[u8]) -> PfcpResult<()> {
    let len = u8::try_from(data.len()).map_err(|_| {
        PfcpError::InconsistentField(format!("{field} longer than 255 octets"))
    })?;
    buf.put_u8(len);
    buf.put_slice(data);
    Ok(())
}

fn get_len_prefixed<'a>(buf: &mut &'a [u8]) -> PfcpResult<&'a [u8]> {
    let len = get_u8(buf)? as usize;
    ensure(&*buf, len)?;
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

// ============================================================================
// Enumerations
// ============================================================================

/// PFCP Cause Values (TS 29.244 Section 8.2.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PfcpCause {
    RequestAccepted = 1,
    MoreUsageReportToSend = 2,
    RequestRejected = 64,
    SessionContextNotFound = 65,
    MandatoryIeMissing = 66,
    ConditionalIeMissing = 67,
    InvalidLength = 68,
    MandatoryIeIncorrect = 69,
    InvalidForwardingPolicy = 70,
    InvalidFTeidAllocationOption = 71,
    NoEstablishedPfcpAssociation = 72,
    RuleCreationModificationFailure = 73,
    PfcpEntityInCongestion = 74,
    NoResourcesAvailable = 75,
    ServiceNotSupported = 76,
    SystemFailure = 77,
    RedirectionRequested = 78,
    AllDynamicAddressesAreOccupied = 79,
}

impl TryFrom<u8> for PfcpCause {
    type Error = PfcpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::RequestAccepted),
            2 => Ok(Self::MoreUsageReportToSend),
            64 => Ok(Self::RequestRejected),
            65 => Ok(Self::SessionContextNotFound),
            66 => Ok(Self::MandatoryIeMissing),
            67 => Ok(Self::ConditionalIeMissing),
            68 => Ok(Self::InvalidLength),
            69 => Ok(Self::MandatoryIeIncorrect),
            70 => Ok(Self::InvalidForwardingPolicy),
            71 => Ok(Self::InvalidFTeidAllocationOption),
            72 => Ok(Self::NoEstablishedPfcpAssociation),
            73 => Ok(Self::RuleCreationModificationFailure),
            74 => Ok(Self::PfcpEntityInCongestion),
            75 => Ok(Self::NoResourcesAvailable),
            76 => Ok(Self::ServiceNotSupported),
            77 => Ok(Self::SystemFailure),
            78 => Ok(Self::RedirectionRequested),
            79 => Ok(Self::AllDynamicAddressesAreOccupied),
            _ => Err(PfcpError::MalformedDiscriminant { field: "Cause", value }),
        }
    }
}

impl PfcpCause {
    /// Get the name of the cause
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestAccepted => "Request Accepted",
            Self::MoreUsageReportToSend => "More Usage Report To Send",
            Self::RequestRejected => "Request Rejected",
            Self::SessionContextNotFound => "Session Context Not Found",
            Self::MandatoryIeMissing => "Mandatory IE Missing",
            Self::ConditionalIeMissing => "Conditional IE Missing",
            Self::InvalidLength => "Invalid Length",
            Self::MandatoryIeIncorrect => "Mandatory IE Incorrect",
            Self::InvalidForwardingPolicy => "Invalid Forwarding Policy",
            Self::InvalidFTeidAllocationOption => "Invalid F-TEID Allocation Option",
            Self::NoEstablishedPfcpAssociation => "No Established PFCP Association",
            Self::RuleCreationModificationFailure => "Rule Creation/Modification Failure",
            Self::PfcpEntityInCongestion => "PFCP Entity in Congestion",
            Self::NoResourcesAvailable => "No Resources Available",
            Self::ServiceNotSupported => "Service Not Supported",
            Self::SystemFailure => "System Failure",
            Self::RedirectionRequested => "Redirection Requested",
            Self::AllDynamicAddressesAreOccupied => "All Dynamic Addresses Are Occupied",
        }
    }

    /// Check if cause indicates success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::RequestAccepted | Self::MoreUsageReportToSend)
    }
}

impl IeValue for PfcpCause {
    const IE_TYPE: IeType = IeType::Cause;
    const NAME: &'static str = "Cause";
    const ENCODING: Encoding = Encoding::Scalar;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Self::try_from(get_u8(&mut buf)?)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(*self as u8);
        Ok(())
    }
}

wire_enum! {
    /// Source Interface values (TS 29.244 Section 8.2.2)
    SourceInterface, "Source Interface" {
        Access = 0,
        Core = 1,
        SgiLanN6Lan = 2,
        CpFunction = 3,
        FiveGVnInternal = 4,
    }
}

impl IeValue for SourceInterface {
    const IE_TYPE: IeType = IeType::SourceInterface;
    const NAME: &'static str = "Source Interface";
    const ENCODING: Encoding = Encoding::Scalar;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [SourceInterface],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Self::try_from(get_u8(&mut buf)? & 0x0F)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(*self as u8);
        Ok(())
    }
}

wire_enum! {
    /// Destination Interface values (TS 29.244 Section 8.2.24)
    DestinationInterface, "Destination Interface" {
        Access = 0,
        Core = 1,
        SgiLanN6Lan = 2,
        CpFunction = 3,
        LiFunction = 4,
        FiveGVnInternal = 5,
    }
}

impl IeValue for DestinationInterface {
    const IE_TYPE: IeType = IeType::DestinationInterface;
    const NAME: &'static str = "Destination Interface";
    const ENCODING: Encoding = Encoding::Scalar;
    const CARRIERS: &'static [Hop] = hops![
        CreateFar => [ForwardingParameters, DuplicatingParameters],
        UpdateFar => [UpdateForwardingParameters, UpdateDuplicatingParameters],
        ForwardingParameters => [DestinationInterface],
        UpdateForwardingParameters => [DestinationInterface],
        DuplicatingParameters => [DestinationInterface],
        UpdateDuplicatingParameters => [DestinationInterface],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Self::try_from(get_u8(&mut buf)? & 0x0F)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(*self as u8);
        Ok(())
    }
}

wire_enum! {
    /// PDN Type values (TS 29.244 Section 8.2.79)
    PdnType, "PDN Type" {
        Ipv4 = 1,
        Ipv6 = 2,
        Ipv4v6 = 3,
        NonIp = 4,
        Ethernet = 5,
    }
}

impl IeValue for PdnType {
    const IE_TYPE: IeType = IeType::PdnType;
    const NAME: &'static str = "PDN Type";
    const ENCODING: Encoding = Encoding::Scalar;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Self::try_from(get_u8(&mut buf)? & 0x07)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(*self as u8);
        Ok(())
    }
}

// ============================================================================
// Fixed scalars
// ============================================================================

scalar_ie! {
    /// PDR ID (TS 29.244 Section 8.2.36)
    PdrId(u16) = PdrId, "PDR ID", get_u16, put_u16,
    hops![
        CreatePdr => [PdrId],
        UpdatePdr => [PdrId],
        RemovePdr => [PdrId],
        CreatedPdr => [PdrId],
        UpdatedPdr => [PdrId],
        DownlinkDataReport => [PdrId],
    ]
}

scalar_ie! {
    /// FAR ID (TS 29.244 Section 8.2.74)
    FarId(u32) = FarId, "FAR ID", get_u32, put_u32,
    hops![
        CreatePdr => [FarId],
        UpdatePdr => [FarId],
        CreateFar => [FarId],
        UpdateFar => [FarId],
        RemoveFar => [FarId],
    ]
}

scalar_ie! {
    /// URR ID (TS 29.244 Section 8.2.54)
    UrrId(u32) = UrrId, "URR ID", get_u32, put_u32,
    hops![
        CreatePdr => [UrrId],
        UpdatePdr => [UrrId],
        CreateUrr => [UrrId],
        UpdateUrr => [UrrId],
        RemoveUrr => [UrrId],
        QueryUrr => [UrrId],
        UsageReportSmr => [UrrId],
        UsageReportSdr => [UrrId],
        UsageReportSrr => [UrrId],
    ]
}

scalar_ie! {
    /// QER ID (TS 29.244 Section 8.2.75)
    QerId(u32) = QerId, "QER ID", get_u32, put_u32,
    hops![
        CreatePdr => [QerId],
        UpdatePdr => [QerId],
        CreateQer => [QerId],
        UpdateQer => [QerId],
        RemoveQer => [QerId],
    ]
}

scalar_ie! {
    /// BAR ID (TS 29.244 Section 8.2.88)
    BarId(u8) = BarId, "BAR ID", get_u8, put_u8,
    hops![
        CreateFar => [BarId],
        UpdateFar => [BarId],
        CreateBar => [BarId],
        UpdateBar => [BarId],
        UpdateBarSmr => [BarId],
        RemoveBar => [BarId],
    ]
}

scalar_ie! {
    /// Precedence (TS 29.244 Section 8.2.11)
    Precedence(u32) = Precedence, "Precedence", get_u32, put_u32,
    hops![
        CreatePdr => [Precedence],
        UpdatePdr => [Precedence],
    ]
}

scalar_ie! {
    /// Ethernet Filter ID (TS 29.244 Section 8.2.98)
    EthernetFilterId(u32) = EthernetFilterId, "Ethernet Filter ID", get_u32, put_u32,
    hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [EthernetPacketFilter],
        EthernetPacketFilter => [EthernetFilterId],
    ]
}

scalar_ie! {
    /// Ethertype (TS 29.244 Section 8.2.96)
    Ethertype(u16) = Ethertype, "Ethertype", get_u16, put_u16,
    hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [EthernetPacketFilter],
        EthernetPacketFilter => [Ethertype],
    ]
}

scalar_ie! {
    /// UR-SEQN (TS 29.244 Section 8.2.77)
    UrSeqn(u32) = UrSeqn, "UR-SEQN", get_u32, put_u32,
    hops![
        UsageReportSmr => [UrSeqn],
        UsageReportSdr => [UrSeqn],
        UsageReportSrr => [UrSeqn],
    ]
}

scalar_ie! {
    /// Duration Measurement in seconds (TS 29.244 Section 8.2.45)
    DurationMeasurement(u32) = DurationMeasurement, "Duration Measurement", get_u32, put_u32,
    hops![
        UsageReportSmr => [DurationMeasurement],
        UsageReportSdr => [DurationMeasurement],
        UsageReportSrr => [DurationMeasurement],
    ]
}

scalar_ie! {
    /// Time Threshold in seconds (TS 29.244 Section 8.2.14)
    TimeThreshold(u32) = TimeThreshold, "Time Threshold", get_u32, put_u32,
    hops![
        CreateUrr => [TimeThreshold],
        UpdateUrr => [TimeThreshold],
    ]
}

scalar_ie! {
    /// Transport Level Marking: ToS/Traffic Class value and mask
    TransportLevelMarking(u16) = TransportLevelMarking, "Transport Level Marking", get_u16, put_u16,
    hops![
        CreateFar => [ForwardingParameters, DuplicatingParameters],
        UpdateFar => [UpdateForwardingParameters, UpdateDuplicatingParameters],
        ForwardingParameters => [TransportLevelMarking],
        UpdateForwardingParameters => [TransportLevelMarking],
        DuplicatingParameters => [TransportLevelMarking],
        UpdateDuplicatingParameters => [TransportLevelMarking],
    ]
}

scalar_ie! {
    /// Offending IE type code
    OffendingIe(u16) = OffendingIe, "Offending IE", get_u16, put_u16,
    &[]
}

scalar_ie! {
    /// Load/overload metric, 0..=100
    Metric(u8) = Metric, "Metric", get_u8, put_u8,
    hops![
        LoadControlInformation => [Metric],
        OverloadControlInformation => [Metric],
    ]
}

scalar_ie! {
    /// Load/overload control sequence number
    SequenceNumber(u32) = SequenceNumber, "Sequence Number", get_u32, put_u32,
    hops![
        LoadControlInformation => [SequenceNumber],
        OverloadControlInformation => [SequenceNumber],
    ]
}

/// QoS Flow Identifier (6 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Qfi(pub u8);

impl IeValue for Qfi {
    const IE_TYPE: IeType = IeType::Qfi;
    const NAME: &'static str = "QFI";
    const ENCODING: Encoding = Encoding::Scalar;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [Qfi],
        CreateQer => [Qfi],
        UpdateQer => [Qfi],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Ok(Self(get_u8(&mut buf)? & 0x3F))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        if self.0 > 0x3F {
            return Err(PfcpError::InconsistentField(format!("QFI {} exceeds 6 bits", self.0)));
        }
        buf.put_u8(self.0);
        Ok(())
    }
}

// ============================================================================
// Timestamps and strings
// ============================================================================

timestamp_ie! {
    /// Recovery Time Stamp (TS 29.244 Section 8.2.65)
    RecoveryTimeStamp = RecoveryTimeStamp, "Recovery Time Stamp", &[]
}

timestamp_ie! {
    StartTime = StartTime, "Start Time",
    hops![
        UsageReportSmr => [StartTime],
        UsageReportSdr => [StartTime],
        UsageReportSrr => [StartTime],
    ]
}

timestamp_ie! {
    EndTime = EndTime, "End Time",
    hops![
        UsageReportSmr => [EndTime],
        UsageReportSdr => [EndTime],
        UsageReportSrr => [EndTime],
    ]
}

timestamp_ie! {
    TimeOfFirstPacket = TimeOfFirstPacket, "Time of First Packet",
    hops![
        UsageReportSmr => [TimeOfFirstPacket],
        UsageReportSdr => [TimeOfFirstPacket],
        UsageReportSrr => [TimeOfFirstPacket],
    ]
}

timestamp_ie! {
    TimeOfLastPacket = TimeOfLastPacket, "Time of Last Packet",
    hops![
        UsageReportSmr => [TimeOfLastPacket],
        UsageReportSdr => [TimeOfLastPacket],
        UsageReportSrr => [TimeOfLastPacket],
    ]
}

timestamp_ie! {
    /// Time at which the URR switches to its subsequent thresholds
    MonitoringTime = MonitoringTime, "Monitoring Time",
    hops![
        CreateUrr => [MonitoringTime],
        UpdateUrr => [MonitoringTime],
    ]
}

text_ie! {
    /// Network Instance (TS 29.244 Section 8.2.4)
    NetworkInstance = NetworkInstance, "Network Instance",
    hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [NetworkInstance],
        CreateFar => [ForwardingParameters],
        UpdateFar => [UpdateForwardingParameters],
        ForwardingParameters => [NetworkInstance],
        UpdateForwardingParameters => [NetworkInstance],
        CreateTrafficEndpoint => [NetworkInstance],
        UpdateTrafficEndpoint => [NetworkInstance],
    ]
}

text_ie! {
    /// Application ID (TS 29.244 Section 8.2.6)
    ApplicationId = ApplicationId, "Application ID",
    hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [ApplicationId],
        ApplicationIdsPfds => [ApplicationId],
        UsageReportSmr => [ApplicationDetectionInformation],
        UsageReportSdr => [ApplicationDetectionInformation],
        UsageReportSrr => [ApplicationDetectionInformation],
        ApplicationDetectionInformation => [ApplicationId],
    ]
}

/// APN/DNN encoded as DNS labels (TS 29.244 Section 8.2.103)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApnDnn(pub String);

impl IeValue for ApnDnn {
    const IE_TYPE: IeType = IeType::ApnDnn;
    const NAME: &'static str = "APN/DNN";
    const ENCODING: Encoding = Encoding::Text;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        Ok(Self(util::decode_fqdn(payload)?))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_slice(&util::encode_fqdn(&self.0)?);
        Ok(())
    }
}

// ============================================================================
// Discriminated
// ============================================================================

/// Node ID (TS 29.244 Section 8.2.38)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Fqdn(String),
}

impl NodeId {
    /// Node ID type octet value
    pub fn node_id_type(&self) -> u8 {
        match self {
            NodeId::Ipv4(_) => 0,
            NodeId::Ipv6(_) => 1,
            NodeId::Fqdn(_) => 2,
        }
    }
}

impl IeValue for NodeId {
    const IE_TYPE: IeType = IeType::NodeId;
    const NAME: &'static str = "Node ID";
    const ENCODING: Encoding = Encoding::Discriminated;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        match get_u8(&mut buf)? & 0x0F {
            0 => Ok(NodeId::Ipv4(get_ipv4(&mut buf)?)),
            1 => Ok(NodeId::Ipv6(get_ipv6(&mut buf)?)),
            2 => Ok(NodeId::Fqdn(util::decode_fqdn(buf)?)),
            value => Err(PfcpError::MalformedDiscriminant { field: "Node ID", value }),
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(self.node_id_type());
        match self {
            NodeId::Ipv4(addr) => buf.put_slice(&addr.octets()),
            NodeId::Ipv6(addr) => buf.put_slice(&addr.octets()),
            NodeId::Fqdn(name) => buf.put_slice(&util::encode_fqdn(name)?),
        }
        Ok(())
    }
}

/// Failed Rule ID (TS 29.244 Section 8.2.80)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailedRuleId {
    Pdr(u16),
    Far(u32),
    Qer(u32),
    Urr(u32),
    Bar(u8),
    Mar(u16),
    Srr(u8),
}

impl IeValue for FailedRuleId {
    const IE_TYPE: IeType = IeType::FailedRuleId;
    const NAME: &'static str = "Failed Rule ID";
    const ENCODING: Encoding = Encoding::Discriminated;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        match get_u8(&mut buf)? & 0x1F {
            0 => Ok(Self::Pdr(get_u16(&mut buf)?)),
            1 => Ok(Self::Far(get_u32(&mut buf)?)),
            2 => Ok(Self::Qer(get_u32(&mut buf)?)),
            3 => Ok(Self::Urr(get_u32(&mut buf)?)),
            4 => Ok(Self::Bar(get_u8(&mut buf)?)),
            5 => Ok(Self::Mar(get_u16(&mut buf)?)),
            6 => Ok(Self::Srr(get_u8(&mut buf)?)),
            value => Err(PfcpError::MalformedDiscriminant { field: "Failed Rule ID", value }),
        }
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        match *self {
            Self::Pdr(id) => {
                buf.put_u8(0);
                buf.put_u16(id);
            }
            Self::Far(id) => {
                buf.put_u8(1);
                buf.put_u32(id);
            }
            Self::Qer(id) => {
                buf.put_u8(2);
                buf.put_u32(id);
            }
            Self::Urr(id) => {
                buf.put_u8(3);
                buf.put_u32(id);
            }
            Self::Bar(id) => {
                buf.put_u8(4);
                buf.put_u8(id);
            }
            Self::Mar(id) => {
                buf.put_u8(5);
                buf.put_u16(id);
            }
            Self::Srr(id) => {
                buf.put_u8(6);
                buf.put_u8(id);
            }
        }
        Ok(())
    }
}

wire_enum! {
    /// Outer Header Removal description (TS 29.244 Section 8.2.64)
    OuterHeaderRemovalDescription, "Outer Header Removal" {
        GtpUUdpIpv4 = 0,
        GtpUUdpIpv6 = 1,
        UdpIpv4 = 2,
        UdpIpv6 = 3,
        Ipv4 = 4,
        Ipv6 = 5,
        GtpUUdpIp = 6,
        VlanSTag = 7,
        STagAndCTag = 8,
    }
}

/// Outer Header Removal structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OuterHeaderRemoval {
    pub description: OuterHeaderRemovalDescription,
    /// GTP-U extension header deletion octet (bit 1: PDU session container)
    pub gtpu_extension_header_deletion: Option<u8>,
}

impl OuterHeaderRemoval {
    pub fn new(description: OuterHeaderRemovalDescription) -> Self {
        Self {
            description,
            gtpu_extension_header_deletion: None,
        }
    }
}

impl IeValue for OuterHeaderRemoval {
    const IE_TYPE: IeType = IeType::OuterHeaderRemoval;
    const NAME: &'static str = "Outer Header Removal";
    const ENCODING: Encoding = Encoding::Discriminated;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [OuterHeaderRemoval],
        UpdatePdr => [OuterHeaderRemoval],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let description = OuterHeaderRemovalDescription::try_from(get_u8(&mut buf)?)?;
        let gtpu_extension_header_deletion = if buf.has_remaining() {
            Some(buf.get_u8())
        } else {
            None
        };
        Ok(Self {
            description,
            gtpu_extension_header_deletion,
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(self.description as u8);
        if let Some(v) = self.gtpu_extension_header_deletion {
            buf.put_u8(v);
        }
        Ok(())
    }
}

// ============================================================================
// Bitmaps
// ============================================================================

/// Apply Action flags (TS 29.244 Section 8.2.26)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyAction {
    pub drop: bool,
    pub forw: bool, // Forward
    pub buff: bool, // Buffer
    pub nocp: bool, // Notify CP function
    pub dupl: bool, // Duplicate
    pub ipma: bool, // IP Multicast Accept
    pub ipmd: bool, // IP Multicast Deny
    pub dfrt: bool, // Duplicate for Redundant Transmission
    pub edrt: bool, // Eliminate Duplicate for Redundant Transmission
    pub bdpn: bool, // Buffered Downlink Packet Notification
    pub ddpn: bool, // Discarded Downlink Packet Notification
}

impl ApplyAction {
    pub fn drop() -> Self {
        Self { drop: true, ..Default::default() }
    }

    pub fn forward() -> Self {
        Self { forw: true, ..Default::default() }
    }

    pub fn buffer() -> Self {
        Self { buff: true, ..Default::default() }
    }
}

impl IeValue for ApplyAction {
    const IE_TYPE: IeType = IeType::ApplyAction;
    const NAME: &'static str = "Apply Action";
    const ENCODING: Encoding = Encoding::Bitmap;
    const CARRIERS: &'static [Hop] = hops![
        CreateFar => [ApplyAction],
        UpdateFar => [ApplyAction],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let o5 = get_u8(&mut buf)?;
        // Octet 6 was added in Release 16
        let o6 = if buf.has_remaining() { buf.get_u8() } else { 0 };
        Ok(Self {
            drop: has_bit(o5, 1),
            forw: has_bit(o5, 2),
            buff: has_bit(o5, 3),
            nocp: has_bit(o5, 4),
            dupl: has_bit(o5, 5),
            ipma: has_bit(o5, 6),
            ipmd: has_bit(o5, 7),
            dfrt: has_bit(o5, 8),
            edrt: has_bit(o6, 1),
            bdpn: has_bit(o6, 2),
            ddpn: has_bit(o6, 3),
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut o5 = 0u8;
        o5 = set_bit_if(o5, 1, self.drop);
        o5 = set_bit_if(o5, 2, self.forw);
        o5 = set_bit_if(o5, 3, self.buff);
        o5 = set_bit_if(o5, 4, self.nocp);
        o5 = set_bit_if(o5, 5, self.dupl);
        o5 = set_bit_if(o5, 6, self.ipma);
        o5 = set_bit_if(o5, 7, self.ipmd);
        o5 = set_bit_if(o5, 8, self.dfrt);
        buf.put_u8(o5);

        let mut o6 = 0u8;
        o6 = set_bit_if(o6, 1, self.edrt);
        o6 = set_bit_if(o6, 2, self.bdpn);
        o6 = set_bit_if(o6, 3, self.ddpn);
        if o6 != 0 {
            buf.put_u8(o6);
        }
        Ok(())
    }
}

/// Read up to `max` octets of a flag bitmap; octet 5 lands in the low byte.
fn get_octet_bits(payload: &[u8], min: usize, max: usize) -> PfcpResult<u32> {
    ensure(&payload, min)?;
    Ok(payload
        .iter()
        .take(max)
        .enumerate()
        .fold(0u32, |acc, (i, b)| acc | (*b as u32) << (8 * i)))
}

fn put_octet_bits(buf: &mut BytesMut, bits: u32, octets: usize) {
    for i in 0..octets {
        buf.put_u8((bits >> (8 * i)) as u8);
    }
}

/// Reporting Triggers (TS 29.244 Section 8.2.19)
///
/// Bit constants count from octet 5 bit 1 upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ReportingTriggers(pub u32);

impl ReportingTriggers {
    pub const PERIODIC_REPORTING: u32 = 1 << 0;
    pub const VOLUME_THRESHOLD: u32 = 1 << 1;
    pub const TIME_THRESHOLD: u32 = 1 << 2;
    pub const QUOTA_HOLDING_TIME: u32 = 1 << 3;
    pub const START_OF_TRAFFIC: u32 = 1 << 4;
    pub const STOP_OF_TRAFFIC: u32 = 1 << 5;
    pub const DROPPED_DL_TRAFFIC_THRESHOLD: u32 = 1 << 6;
    pub const LINKED_USAGE_REPORTING: u32 = 1 << 7;
    pub const VOLUME_QUOTA: u32 = 1 << 8;
    pub const TIME_QUOTA: u32 = 1 << 9;
    pub const ENVELOPE_CLOSURE: u32 = 1 << 10;
    pub const MAC_ADDRESSES_REPORTING: u32 = 1 << 11;
    pub const EVENT_THRESHOLD: u32 = 1 << 12;
    pub const EVENT_QUOTA: u32 = 1 << 13;
    pub const IP_MULTICAST_JOIN_LEAVE: u32 = 1 << 14;
    pub const QUOTA_VALIDITY_TIME: u32 = 1 << 15;
    pub const REPORT_END_MARKER: u32 = 1 << 16;
    pub const USER_PLANE_INACTIVITY_TIMER: u32 = 1 << 17;

    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits == bits
    }
}

impl IeValue for ReportingTriggers {
    const IE_TYPE: IeType = IeType::ReportingTriggers;
    const NAME: &'static str = "Reporting Triggers";
    const ENCODING: Encoding = Encoding::Bitmap;
    const CARRIERS: &'static [Hop] = hops![
        CreateUrr => [ReportingTriggers],
        UpdateUrr => [ReportingTriggers],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        Ok(Self(get_octet_bits(payload, 2, 3)?))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        if self.0 >> 24 != 0 {
            return Err(PfcpError::InconsistentField(format!(
                "reporting trigger bits {:#x} beyond octet 7",
                self.0
            )));
        }
        let octets = if self.0 >> 16 != 0 { 3 } else { 2 };
        put_octet_bits(buf, self.0, octets);
        Ok(())
    }
}

/// Usage Report Trigger (TS 29.244 Section 8.2.41)
///
/// Bit constants count from octet 5 bit 1 upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct UsageReportTrigger(pub u32);

impl UsageReportTrigger {
    pub const PERIODIC_REPORTING: u32 = 1 << 0;
    pub const VOLUME_THRESHOLD: u32 = 1 << 1;
    pub const TIME_THRESHOLD: u32 = 1 << 2;
    pub const QUOTA_HOLDING_TIME: u32 = 1 << 3;
    pub const START_OF_TRAFFIC: u32 = 1 << 4;
    pub const STOP_OF_TRAFFIC: u32 = 1 << 5;
    pub const DROPPED_DL_TRAFFIC_THRESHOLD: u32 = 1 << 6;
    pub const IMMEDIATE_REPORT: u32 = 1 << 7;
    pub const VOLUME_QUOTA: u32 = 1 << 8;
    pub const TIME_QUOTA: u32 = 1 << 9;
    pub const LINKED_USAGE_REPORTING: u32 = 1 << 10;
    pub const TERMINATION_REPORT: u32 = 1 << 11;
    pub const MONITORING_TIME: u32 = 1 << 12;
    pub const ENVELOPE_CLOSURE: u32 = 1 << 13;
    pub const MAC_ADDRESSES_REPORTING: u32 = 1 << 14;
    pub const EVENT_THRESHOLD: u32 = 1 << 15;
    pub const EVENT_QUOTA: u32 = 1 << 16;
    pub const TERMINATION_BY_UP: u32 = 1 << 17;
    pub const IP_MULTICAST_JOIN_LEAVE: u32 = 1 << 18;
    pub const QUOTA_VALIDITY_TIME: u32 = 1 << 19;

    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits == bits
    }
}

impl IeValue for UsageReportTrigger {
    const IE_TYPE: IeType = IeType::UsageReportTrigger;
    const NAME: &'static str = "Usage Report Trigger";
    const ENCODING: Encoding = Encoding::Bitmap;
    const CARRIERS: &'static [Hop] = hops![
        UsageReportSmr => [UsageReportTrigger],
        UsageReportSdr => [UsageReportTrigger],
        UsageReportSrr => [UsageReportTrigger],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        Ok(Self(get_octet_bits(payload, 1, 3)?))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        if self.0 >> 24 != 0 {
            return Err(PfcpError::InconsistentField(format!(
                "usage report trigger bits {:#x} beyond octet 7",
                self.0
            )));
        }
        put_octet_bits(buf, self.0, 3);
        Ok(())
    }
}

/// Report Type (TS 29.244 Section 8.2.21)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportType {
    pub downlink_data_report: bool,
    pub usage_report: bool,
    pub error_indication_report: bool,
    pub user_plane_inactivity_report: bool,
}

impl IeValue for ReportType {
    const IE_TYPE: IeType = IeType::ReportType;
    const NAME: &'static str = "Report Type";
    const ENCODING: Encoding = Encoding::Bitmap;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        Ok(Self {
            downlink_data_report: has_bit(flags, 1),
            usage_report: has_bit(flags, 2),
            error_indication_report: has_bit(flags, 3),
            user_plane_inactivity_report: has_bit(flags, 4),
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.downlink_data_report);
        flags = set_bit_if(flags, 2, self.usage_report);
        flags = set_bit_if(flags, 3, self.error_indication_report);
        flags = set_bit_if(flags, 4, self.user_plane_inactivity_report);
        buf.put_u8(flags);
        Ok(())
    }
}

/// Measurement Method flags (TS 29.244 Section 8.2.40)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasurementMethod {
    pub duration: bool,
    pub volume: bool,
    pub event: bool,
}

impl IeValue for MeasurementMethod {
    const IE_TYPE: IeType = IeType::MeasurementMethod;
    const NAME: &'static str = "Measurement Method";
    const ENCODING: Encoding = Encoding::Bitmap;
    const CARRIERS: &'static [Hop] = hops![
        CreateUrr => [MeasurementMethod],
        UpdateUrr => [MeasurementMethod],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        Ok(Self {
            duration: has_bit(flags, 1),
            volume: has_bit(flags, 2),
            event: has_bit(flags, 3),
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.duration);
        flags = set_bit_if(flags, 2, self.volume);
        flags = set_bit_if(flags, 3, self.event);
        buf.put_u8(flags);
        Ok(())
    }
}

/// Ethernet Filter Properties (TS 29.244 Section 8.2.99)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EthernetFilterProperties {
    /// Bidirectional filter
    pub bide: bool,
}

impl IeValue for EthernetFilterProperties {
    const IE_TYPE: IeType = IeType::EthernetFilterProperties;
    const NAME: &'static str = "Ethernet Filter Properties";
    const ENCODING: Encoding = Encoding::Bitmap;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [EthernetPacketFilter],
        EthernetPacketFilter => [EthernetFilterProperties],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Ok(Self { bide: has_bit(get_u8(&mut buf)?, 1) })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(set_bit_if(0, 1, self.bide));
        Ok(())
    }
}

/// CP Function Features (TS 29.244 Section 8.2.58)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CpFunctionFeatures(pub u8);

impl CpFunctionFeatures {
    pub const LOAD: u8 = 0x01;
    pub const OVRL: u8 = 0x02;
    pub const EPFAR: u8 = 0x04;
    pub const SSET: u8 = 0x08;
    pub const BUNDL: u8 = 0x10;
    pub const MPAS: u8 = 0x20;
    pub const ARDR: u8 = 0x40;
    pub const UIAUR: u8 = 0x80;

    pub fn supports(&self, feature: u8) -> bool {
        self.0 & feature == feature
    }
}

impl IeValue for CpFunctionFeatures {
    const IE_TYPE: IeType = IeType::CpFunctionFeatures;
    const NAME: &'static str = "CP Function Features";
    const ENCODING: Encoding = Encoding::Bitmap;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Ok(Self(get_u8(&mut buf)?))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(self.0);
        Ok(())
    }
}

/// UP Function Features (TS 29.244 Section 8.2.25)
///
/// The octet count grows with each release, so the raw octets are kept and
/// features are addressed by `(octet, bit)` with octet 0 being octet 5.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct UpFunctionFeatures {
    pub octets: Vec<u8>,
}

impl UpFunctionFeatures {
    pub const BUCP: (usize, u8) = (0, 1);
    pub const DDND: (usize, u8) = (0, 2);
    pub const DLBD: (usize, u8) = (0, 3);
    pub const TRST: (usize, u8) = (0, 4);
    pub const FTUP: (usize, u8) = (0, 5);
    pub const PFDM: (usize, u8) = (0, 6);
    pub const HEEU: (usize, u8) = (0, 7);
    pub const TREU: (usize, u8) = (0, 8);
    pub const EMPU: (usize, u8) = (1, 1);
    pub const PDIU: (usize, u8) = (1, 2);
    pub const UDBC: (usize, u8) = (1, 3);
    pub const QUOAC: (usize, u8) = (1, 4);
    pub const TRACE: (usize, u8) = (1, 5);
    pub const FRRT: (usize, u8) = (1, 6);
    pub const PFDE: (usize, u8) = (1, 7);
    pub const EPFAR: (usize, u8) = (1, 8);

    pub fn supports(&self, (octet, bit): (usize, u8)) -> bool {
        self.octets.get(octet).is_some_and(|b| has_bit(*b, bit))
    }

    /// Set a feature bit, growing to the minimum two octets as needed.
    pub fn set(&mut self, (octet, bit): (usize, u8)) -> PfcpResult<()> {
        let mask = util::bit_mask(bit).ok_or_else(|| {
            PfcpError::InvalidFormat(format!("feature bit {bit} outside 1..=8"))
        })?;
        let len = (octet + 1).max(2);
        if self.octets.len() < len {
            self.octets.resize(len, 0);
        }
        self.octets[octet] |= mask;
        Ok(())
    }
}

impl IeValue for UpFunctionFeatures {
    const IE_TYPE: IeType = IeType::UpFunctionFeatures;
    const NAME: &'static str = "UP Function Features";
    const ENCODING: Encoding = Encoding::Bitmap;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        ensure(&payload, 2)?;
        Ok(Self { octets: payload.to_vec() })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        if self.octets.len() < 2 {
            return Err(PfcpError::InconsistentField(
                "UP Function Features needs at least two octets".to_string(),
            ));
        }
        buf.put_slice(&self.octets);
        Ok(())
    }
}

// ============================================================================
// Flag-conditional
// ============================================================================

/// F-SEID (Fully Qualified SEID) structure (TS 29.244 Section 8.2.37)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FSeid {
    pub v4: bool,
    pub v6: bool,
    pub seid: u64,
    pub ipv4_addr: Option<Ipv4Addr>,
    pub ipv6_addr: Option<Ipv6Addr>,
}

impl FSeid {
    pub fn new_ipv4(seid: u64, addr: Ipv4Addr) -> Self {
        Self {
            v4: true,
            v6: false,
            seid,
            ipv4_addr: Some(addr),
            ipv6_addr: None,
        }
    }

    pub fn new_ipv6(seid: u64, addr: Ipv6Addr) -> Self {
        Self {
            v4: false,
            v6: true,
            seid,
            ipv4_addr: None,
            ipv6_addr: Some(addr),
        }
    }
}

impl IeValue for FSeid {
    const IE_TYPE: IeType = IeType::FSeid;
    const NAME: &'static str = "F-SEID";
    const ENCODING: Encoding = Encoding::FlagConditional;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let v6 = has_bit(flags, 1);
        let v4 = has_bit(flags, 2);
        let seid = get_u64(&mut buf)?;
        let ipv4_addr = if v4 { Some(get_ipv4(&mut buf)?) } else { None };
        let ipv6_addr = if v6 { Some(get_ipv6(&mut buf)?) } else { None };

        Ok(Self { v4, v6, seid, ipv4_addr, ipv6_addr })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        check_flag("F-SEID V4", self.v4, self.ipv4_addr.is_some())?;
        check_flag("F-SEID V6", self.v6, self.ipv6_addr.is_some())?;

        let flags = set_bit_if(set_bit_if(0, 1, self.v6), 2, self.v4);
        buf.put_u8(flags);
        buf.put_u64(self.seid);
        if let Some(addr) = self.ipv4_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(addr) = self.ipv6_addr {
            buf.put_slice(&addr.octets());
        }
        Ok(())
    }
}

/// F-TEID (Fully Qualified TEID) structure (TS 29.244 Section 8.2.3)
///
/// With CH set the UP function allocates the TEID, so TEID and addresses are
/// absent and V4/V6 only request an address family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FTeid {
    pub v4: bool,
    pub v6: bool,
    pub ch: bool,   // CHOOSE bit
    pub chid: bool, // CHOOSE ID bit
    pub teid: Option<u32>,
    pub ipv4_addr: Option<Ipv4Addr>,
    pub ipv6_addr: Option<Ipv6Addr>,
    pub choose_id: Option<u8>,
}

impl FTeid {
    pub fn new_ipv4(teid: u32, addr: Ipv4Addr) -> Self {
        Self {
            v4: true,
            teid: Some(teid),
            ipv4_addr: Some(addr),
            ..Default::default()
        }
    }

    pub fn new_ipv6(teid: u32, addr: Ipv6Addr) -> Self {
        Self {
            v6: true,
            teid: Some(teid),
            ipv6_addr: Some(addr),
            ..Default::default()
        }
    }

    /// Ask the UP function to allocate the TEID
    pub fn new_choose(v4: bool, v6: bool, choose_id: Option<u8>) -> Self {
        Self {
            v4,
            v6,
            ch: true,
            chid: choose_id.is_some(),
            choose_id,
            ..Default::default()
        }
    }
}

impl IeValue for FTeid {
    const IE_TYPE: IeType = IeType::FTeid;
    const NAME: &'static str = "F-TEID";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [FTeid],
        CreatedPdr => [FTeid],
        UpdatedPdr => [FTeid],
        CreateTrafficEndpoint => [FTeid],
        CreatedTrafficEndpoint => [FTeid],
        UpdateTrafficEndpoint => [FTeid],
        ErrorIndicationReport => [FTeid],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let v4 = has_bit(flags, 1);
        let v6 = has_bit(flags, 2);
        let ch = has_bit(flags, 3);
        let chid = has_bit(flags, 4);
        if chid && !ch {
            return Err(PfcpError::InconsistentField(
                "F-TEID CHID set without CH".to_string(),
            ));
        }

        let mut fteid = FTeid { v4, v6, ch, chid, ..Default::default() };
        if !ch {
            fteid.teid = Some(get_u32(&mut buf)?);
            if v4 {
                fteid.ipv4_addr = Some(get_ipv4(&mut buf)?);
            }
            if v6 {
                fteid.ipv6_addr = Some(get_ipv6(&mut buf)?);
            }
        }
        if chid {
            fteid.choose_id = Some(get_u8(&mut buf)?);
        }

        Ok(fteid)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        if self.ch {
            if self.teid.is_some() || self.ipv4_addr.is_some() || self.ipv6_addr.is_some() {
                return Err(PfcpError::InconsistentField(
                    "F-TEID CH set with TEID or address present".to_string(),
                ));
            }
        } else {
            if self.teid.is_none() {
                return Err(PfcpError::InconsistentField(
                    "F-TEID CH clear but TEID missing".to_string(),
                ));
            }
            if self.chid {
                return Err(PfcpError::InconsistentField(
                    "F-TEID CHID set without CH".to_string(),
                ));
            }
            check_flag("F-TEID V4", self.v4, self.ipv4_addr.is_some())?;
            check_flag("F-TEID V6", self.v6, self.ipv6_addr.is_some())?;
        }
        check_flag("F-TEID CHID", self.chid, self.choose_id.is_some())?;

        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.v4);
        flags = set_bit_if(flags, 2, self.v6);
        flags = set_bit_if(flags, 3, self.ch);
        flags = set_bit_if(flags, 4, self.chid);
        buf.put_u8(flags);

        if let Some(teid) = self.teid {
            buf.put_u32(teid);
        }
        if let Some(addr) = self.ipv4_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(addr) = self.ipv6_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(id) = self.choose_id {
            buf.put_u8(id);
        }
        Ok(())
    }
}

/// UE IP Address structure (TS 29.244 Section 8.2.62)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UeIpAddress {
    pub v6: bool,
    pub v4: bool,
    pub sd: bool,     // Source/Destination flag
    pub ipv6d: bool,  // IPv6 prefix delegation
    pub chv4: bool,   // CHOOSE IPv4
    pub chv6: bool,   // CHOOSE IPv6
    pub ip6pl: bool,  // IPv6 prefix length present
    pub ipv4_addr: Option<Ipv4Addr>,
    pub ipv6_addr: Option<Ipv6Addr>,
    pub ipv6_prefix_delegation_bits: Option<u8>,
    pub ipv6_prefix_length: Option<u8>,
}

impl UeIpAddress {
    /// `is_destination` sets the S/D bit (address is a destination address).
    pub fn new_ipv4(addr: Ipv4Addr, is_destination: bool) -> Self {
        Self {
            v4: true,
            sd: is_destination,
            ipv4_addr: Some(addr),
            ..Default::default()
        }
    }

    pub fn new_ipv6(addr: Ipv6Addr, is_destination: bool) -> Self {
        Self {
            v6: true,
            sd: is_destination,
            ipv6_addr: Some(addr),
            ..Default::default()
        }
    }
}

impl IeValue for UeIpAddress {
    const IE_TYPE: IeType = IeType::UeIpAddress;
    const NAME: &'static str = "UE IP Address";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [UeIpAddress],
        CreatedPdr => [UeIpAddress],
        CreateTrafficEndpoint => [UeIpAddress],
        CreatedTrafficEndpoint => [UeIpAddress],
        UpdateTrafficEndpoint => [UeIpAddress],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let mut ue = UeIpAddress {
            v6: has_bit(flags, 1),
            v4: has_bit(flags, 2),
            sd: has_bit(flags, 3),
            ipv6d: has_bit(flags, 4),
            chv4: has_bit(flags, 5),
            chv6: has_bit(flags, 6),
            ip6pl: has_bit(flags, 7),
            ..Default::default()
        };

        if ue.v4 && !ue.chv4 {
            ue.ipv4_addr = Some(get_ipv4(&mut buf)?);
        }
        if ue.v6 && !ue.chv6 {
            ue.ipv6_addr = Some(get_ipv6(&mut buf)?);
        }
        if ue.ipv6d {
            ue.ipv6_prefix_delegation_bits = Some(get_u8(&mut buf)?);
        }
        if ue.ip6pl {
            ue.ipv6_prefix_length = Some(get_u8(&mut buf)?);
        }

        Ok(ue)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        check_flag("UE IP Address V4", self.v4 && !self.chv4, self.ipv4_addr.is_some())?;
        check_flag("UE IP Address V6", self.v6 && !self.chv6, self.ipv6_addr.is_some())?;
        check_flag("UE IP Address IPv6D", self.ipv6d, self.ipv6_prefix_delegation_bits.is_some())?;
        check_flag("UE IP Address IP6PL", self.ip6pl, self.ipv6_prefix_length.is_some())?;

        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.v6);
        flags = set_bit_if(flags, 2, self.v4);
        flags = set_bit_if(flags, 3, self.sd);
        flags = set_bit_if(flags, 4, self.ipv6d);
        flags = set_bit_if(flags, 5, self.chv4);
        flags = set_bit_if(flags, 6, self.chv6);
        flags = set_bit_if(flags, 7, self.ip6pl);
        buf.put_u8(flags);

        if let Some(addr) = self.ipv4_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(addr) = self.ipv6_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(bits) = self.ipv6_prefix_delegation_bits {
            buf.put_u8(bits);
        }
        if let Some(len) = self.ipv6_prefix_length {
            buf.put_u8(len);
        }
        Ok(())
    }
}

/// Volume Threshold in octets (TS 29.244 Section 8.2.13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeThreshold {
    pub total_volume: Option<u64>,
    pub uplink_volume: Option<u64>,
    pub downlink_volume: Option<u64>,
}

impl IeValue for VolumeThreshold {
    const IE_TYPE: IeType = IeType::VolumeThreshold;
    const NAME: &'static str = "Volume Threshold";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        CreateUrr => [VolumeThreshold],
        UpdateUrr => [VolumeThreshold],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let mut vt = VolumeThreshold::default();

        if has_bit(flags, 1) { vt.total_volume = Some(get_u64(&mut buf)?); }
        if has_bit(flags, 2) { vt.uplink_volume = Some(get_u64(&mut buf)?); }
        if has_bit(flags, 3) { vt.downlink_volume = Some(get_u64(&mut buf)?); }

        Ok(vt)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.total_volume.is_some());
        flags = set_bit_if(flags, 2, self.uplink_volume.is_some());
        flags = set_bit_if(flags, 3, self.downlink_volume.is_some());

        buf.put_u8(flags);
        if let Some(v) = self.total_volume { buf.put_u64(v); }
        if let Some(v) = self.uplink_volume { buf.put_u64(v); }
        if let Some(v) = self.downlink_volume { buf.put_u64(v); }
        Ok(())
    }
}

/// Volume Measurement (TS 29.244 Section 8.2.44)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeMeasurement {
    pub total_volume: Option<u64>,
    pub uplink_volume: Option<u64>,
    pub downlink_volume: Option<u64>,
    pub total_packets: Option<u64>,
    pub uplink_packets: Option<u64>,
    pub downlink_packets: Option<u64>,
}

impl VolumeMeasurement {
    fn fields(&self) -> [Option<u64>; 6] {
        [
            self.total_volume,
            self.uplink_volume,
            self.downlink_volume,
            self.total_packets,
            self.uplink_packets,
            self.downlink_packets,
        ]
    }
}

impl IeValue for VolumeMeasurement {
    const IE_TYPE: IeType = IeType::VolumeMeasurement;
    const NAME: &'static str = "Volume Measurement";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        UsageReportSmr => [VolumeMeasurement],
        UsageReportSdr => [VolumeMeasurement],
        UsageReportSrr => [VolumeMeasurement],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let mut values = [None; 6];
        for (i, slot) in values.iter_mut().enumerate() {
            if has_bit(flags, i as u8 + 1) {
                *slot = Some(get_u64(&mut buf)?);
            }
        }
        let [total_volume, uplink_volume, downlink_volume, total_packets, uplink_packets, downlink_packets] =
            values;

        Ok(Self {
            total_volume,
            uplink_volume,
            downlink_volume,
            total_packets,
            uplink_packets,
            downlink_packets,
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let fields = self.fields();
        let flags = fields
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, v)| set_bit_if(acc, i as u8 + 1, v.is_some()));

        buf.put_u8(flags);
        for v in fields.into_iter().flatten() {
            buf.put_u64(v);
        }
        Ok(())
    }
}

/// Outer Header Creation (TS 29.244 Section 8.2.56)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OuterHeaderCreation {
    pub description: u16,
    pub teid: Option<u32>,
    pub ipv4_addr: Option<Ipv4Addr>,
    pub ipv6_addr: Option<Ipv6Addr>,
    pub port_number: Option<u16>,
    pub c_tag: Option<VlanTag>,
    pub s_tag: Option<VlanTag>,
}

impl OuterHeaderCreation {
    pub const GTPU_UDP_IPV4: u16 = 0x0100;
    pub const GTPU_UDP_IPV6: u16 = 0x0200;
    pub const UDP_IPV4: u16 = 0x0400;
    pub const UDP_IPV6: u16 = 0x0800;
    pub const IPV4: u16 = 0x1000;
    pub const IPV6: u16 = 0x2000;
    pub const C_TAG: u16 = 0x4000;
    pub const S_TAG: u16 = 0x8000;
    pub const N19_INDICATION: u16 = 0x0001;
    pub const N6_INDICATION: u16 = 0x0002;

    /// GTP-U/UDP/IPv4 outer header
    pub fn new_gtpu_ipv4(teid: u32, addr: Ipv4Addr) -> Self {
        Self {
            description: Self::GTPU_UDP_IPV4,
            teid: Some(teid),
            ipv4_addr: Some(addr),
            ..Default::default()
        }
    }

    /// GTP-U/UDP/IPv6 outer header
    pub fn new_gtpu_ipv6(teid: u32, addr: Ipv6Addr) -> Self {
        Self {
            description: Self::GTPU_UDP_IPV6,
            teid: Some(teid),
            ipv6_addr: Some(addr),
            ..Default::default()
        }
    }

    fn has(&self, bits: u16) -> bool {
        self.description & bits != 0
    }

    fn wants_teid(&self) -> bool {
        self.has(Self::GTPU_UDP_IPV4 | Self::GTPU_UDP_IPV6)
    }

    fn wants_ipv4(&self) -> bool {
        self.has(Self::GTPU_UDP_IPV4 | Self::UDP_IPV4 | Self::IPV4)
    }

    fn wants_ipv6(&self) -> bool {
        self.has(Self::GTPU_UDP_IPV6 | Self::UDP_IPV6 | Self::IPV6)
    }

    fn wants_port(&self) -> bool {
        self.has(Self::UDP_IPV4 | Self::UDP_IPV6)
    }
}

impl IeValue for OuterHeaderCreation {
    const IE_TYPE: IeType = IeType::OuterHeaderCreation;
    const NAME: &'static str = "Outer Header Creation";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        CreateFar => [ForwardingParameters, DuplicatingParameters],
        UpdateFar => [UpdateForwardingParameters, UpdateDuplicatingParameters],
        ForwardingParameters => [OuterHeaderCreation],
        UpdateForwardingParameters => [OuterHeaderCreation],
        DuplicatingParameters => [OuterHeaderCreation],
        UpdateDuplicatingParameters => [OuterHeaderCreation],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let mut ohc = OuterHeaderCreation {
            description: get_u16(&mut buf)?,
            ..Default::default()
        };

        if ohc.wants_teid() {
            ohc.teid = Some(get_u32(&mut buf)?);
        }
        if ohc.wants_ipv4() {
            ohc.ipv4_addr = Some(get_ipv4(&mut buf)?);
        }
        if ohc.wants_ipv6() {
            ohc.ipv6_addr = Some(get_ipv6(&mut buf)?);
        }
        if ohc.wants_port() {
            ohc.port_number = Some(get_u16(&mut buf)?);
        }
        if ohc.has(Self::C_TAG) {
            ohc.c_tag = Some(VlanTag::read(&mut buf)?);
        }
        if ohc.has(Self::S_TAG) {
            ohc.s_tag = Some(VlanTag::read(&mut buf)?);
        }

        Ok(ohc)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        check_flag("Outer Header Creation TEID", self.wants_teid(), self.teid.is_some())?;
        check_flag("Outer Header Creation IPv4", self.wants_ipv4(), self.ipv4_addr.is_some())?;
        check_flag("Outer Header Creation IPv6", self.wants_ipv6(), self.ipv6_addr.is_some())?;
        check_flag("Outer Header Creation port", self.wants_port(), self.port_number.is_some())?;
        check_flag("Outer Header Creation C-TAG", self.has(Self::C_TAG), self.c_tag.is_some())?;
        check_flag("Outer Header Creation S-TAG", self.has(Self::S_TAG), self.s_tag.is_some())?;

        buf.put_u16(self.description);
        if let Some(teid) = self.teid {
            buf.put_u32(teid);
        }
        if let Some(addr) = self.ipv4_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(addr) = self.ipv6_addr {
            buf.put_slice(&addr.octets());
        }
        if let Some(port) = self.port_number {
            buf.put_u16(port);
        }
        if let Some(tag) = &self.c_tag {
            tag.write(buf)?;
        }
        if let Some(tag) = &self.s_tag {
            tag.write(buf)?;
        }
        Ok(())
    }
}

/// SDF Filter (TS 29.244 Section 8.2.5)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdfFilter {
    pub flow_description: Option<String>,
    pub tos_traffic_class: Option<u16>,
    pub security_parameter_index: Option<u32>,
    /// IPv6 flow label, 20 bits carried in 3 octets
    pub flow_label: Option<u32>,
    pub sdf_filter_id: Option<u32>,
}

impl SdfFilter {
    pub fn from_flow_description(desc: impl Into<String>) -> Self {
        Self {
            flow_description: Some(desc.into()),
            ..Default::default()
        }
    }
}

impl IeValue for SdfFilter {
    const IE_TYPE: IeType = IeType::SdfFilter;
    const NAME: &'static str = "SDF Filter";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [SdfFilter],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let _spare = get_u8(&mut buf)?;
        let mut sdf = SdfFilter::default();

        if has_bit(flags, 1) {
            let len = get_u16(&mut buf)? as usize;
            ensure(&buf, len)?;
            let desc = std::str::from_utf8(&buf[..len]).map_err(|e| {
                PfcpError::InvalidFormat(format!("flow description is not UTF-8: {e}"))
            })?;
            sdf.flow_description = Some(desc.to_string());
            buf.advance(len);
        }
        if has_bit(flags, 2) {
            sdf.tos_traffic_class = Some(get_u16(&mut buf)?);
        }
        if has_bit(flags, 3) {
            sdf.security_parameter_index = Some(get_u32(&mut buf)?);
        }
        if has_bit(flags, 4) {
            sdf.flow_label = Some(get_u24(&mut buf)?);
        }
        if has_bit(flags, 5) {
            sdf.sdf_filter_id = Some(get_u32(&mut buf)?);
        }

        Ok(sdf)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.flow_description.is_some());
        flags = set_bit_if(flags, 2, self.tos_traffic_class.is_some());
        flags = set_bit_if(flags, 3, self.security_parameter_index.is_some());
        flags = set_bit_if(flags, 4, self.flow_label.is_some());
        flags = set_bit_if(flags, 5, self.sdf_filter_id.is_some());
        buf.put_u8(flags);
        buf.put_u8(0);

        if let Some(desc) = &self.flow_description {
            let len = u16::try_from(desc.len())
                .map_err(|_| PfcpError::PayloadTooLong { len: desc.len() })?;
            buf.put_u16(len);
            buf.put_slice(desc.as_bytes());
        }
        if let Some(v) = self.tos_traffic_class {
            buf.put_u16(v);
        }
        if let Some(v) = self.security_parameter_index {
            buf.put_u32(v);
        }
        if let Some(v) = self.flow_label {
            put_u24(buf, v)?;
        }
        if let Some(v) = self.sdf_filter_id {
            buf.put_u32(v);
        }
        Ok(())
    }
}

/// MAC Address (TS 29.244 Section 8.2.93)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddress {
    pub source: Option<[u8; 6]>,
    pub destination: Option<[u8; 6]>,
    pub upper_source: Option<[u8; 6]>,
    pub upper_destination: Option<[u8; 6]>,
}

impl IeValue for MacAddress {
    const IE_TYPE: IeType = IeType::MacAddress;
    const NAME: &'static str = "MAC Address";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [EthernetPacketFilter],
        EthernetPacketFilter => [MacAddress],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let mut mac = MacAddress::default();
        if has_bit(flags, 1) { mac.source = Some(get_array(&mut buf)?); }
        if has_bit(flags, 2) { mac.destination = Some(get_array(&mut buf)?); }
        if has_bit(flags, 3) { mac.upper_source = Some(get_array(&mut buf)?); }
        if has_bit(flags, 4) { mac.upper_destination = Some(get_array(&mut buf)?); }
        Ok(mac)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let fields = [self.source, self.destination, self.upper_source, self.upper_destination];
        let flags = fields
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, v)| set_bit_if(acc, i as u8 + 1, v.is_some()));
        buf.put_u8(flags);
        for mac in fields.iter().flatten() {
            buf.put_slice(mac);
        }
        Ok(())
    }
}

/// Downlink Data Service Information (TS 29.244 Section 8.2.27)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownlinkDataServiceInformation {
    /// Paging Policy Indication, 6 bits
    pub ppi: Option<u8>,
    /// QFI, 6 bits
    pub qfi: Option<u8>,
}

impl IeValue for DownlinkDataServiceInformation {
    const IE_TYPE: IeType = IeType::DownlinkDataServiceInformation;
    const NAME: &'static str = "Downlink Data Service Information";
    const ENCODING: Encoding = Encoding::FlagConditional;
    const CARRIERS: &'static [Hop] = hops![
        DownlinkDataReport => [DownlinkDataServiceInformation],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let mut info = Self::default();
        if has_bit(flags, 1) {
            info.ppi = Some(get_u8(&mut buf)? & 0x3F);
        }
        if has_bit(flags, 2) {
            info.qfi = Some(get_u8(&mut buf)? & 0x3F);
        }
        Ok(info)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        for v in [self.ppi, self.qfi].into_iter().flatten() {
            if v > 0x3F {
                return Err(PfcpError::InconsistentField(format!(
                    "Downlink Data Service Information value {v} exceeds 6 bits"
                )));
            }
        }
        let flags = set_bit_if(set_bit_if(0, 1, self.ppi.is_some()), 2, self.qfi.is_some());
        buf.put_u8(flags);
        if let Some(v) = self.ppi {
            buf.put_u8(v);
        }
        if let Some(v) = self.qfi {
            buf.put_u8(v);
        }
        Ok(())
    }
}

/// User ID (TS 29.244 Section 8.2.101)
///
/// IMSI, IMEI and MSISDN are swapped-nibble digit strings; NAI is text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserId {
    pub imsi: Option<String>,
    pub imei: Option<String>,
    pub msisdn: Option<String>,
    pub nai: Option<String>,
}

impl UserId {
    /// Decode, keeping or dropping the 0xF filler nibble of odd-length
    /// digit strings. A kept filler reads as a trailing `f`.
    pub fn decode_with(payload: &[u8], strip_filler: bool) -> PfcpResult<Self> {
        let mut buf = payload;
        let flags = get_u8(&mut buf)?;
        let mut id = UserId::default();

        if has_bit(flags, 1) {
            id.imsi = Some(util::decode_digits(get_len_prefixed(&mut buf)?, strip_filler)?);
        }
        if has_bit(flags, 2) {
            id.imei = Some(util::decode_digits(get_len_prefixed(&mut buf)?, strip_filler)?);
        }
        if has_bit(flags, 3) {
            id.msisdn = Some(util::decode_digits(get_len_prefixed(&mut buf)?, strip_filler)?);
        }
        if has_bit(flags, 4) {
            let nai = get_len_prefixed(&mut buf)?;
            let nai = std::str::from_utf8(nai)
                .map_err(|e| PfcpError::InvalidFormat(format!("NAI is not UTF-8: {e}")))?;
            id.nai = Some(nai.to_string());
        }

        Ok(id)
    }
}

impl IeValue for UserId {
    const IE_TYPE: IeType = IeType::UserId;
    const NAME: &'static str = "User ID";
    const ENCODING: Encoding = Encoding::Digits;

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        Self::decode_with(payload, true)
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.imsi.is_some());
        flags = set_bit_if(flags, 2, self.imei.is_some());
        flags = set_bit_if(flags, 3, self.msisdn.is_some());
        flags = set_bit_if(flags, 4, self.nai.is_some());
        buf.put_u8(flags);

        if let Some(imsi) = &self.imsi {
            put_len_prefixed(buf, "IMSI", &util::encode_digits(imsi)?)?;
        }
        if let Some(imei) = &self.imei {
            put_len_prefixed(buf, "IMEI", &util::encode_digits(imei)?)?;
        }
        if let Some(msisdn) = &self.msisdn {
            put_len_prefixed(buf, "MSISDN", &util::encode_digits(msisdn)?)?;
        }
        if let Some(nai) = &self.nai {
            put_len_prefixed(buf, "NAI", nai.as_bytes())?;
        }
        Ok(())
    }
}

// ============================================================================
// Bit-packed
// ============================================================================

/// VLAN tag body shared by C-TAG and S-TAG (TS 29.244 Section 8.2.94)
///
/// Octet 5 holds the PCP/DEI/VID presence flags. Octet 6 packs the VID high
/// nibble, DEI and PCP; octet 7 is the VID low byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VlanTag {
    /// Priority code point, 3 bits
    pub pcp: Option<u8>,
    /// Drop eligible indicator
    pub dei: Option<bool>,
    /// VLAN identifier, 12 bits
    pub vid: Option<u16>,
}

impl VlanTag {
    pub fn read<B: Buf>(buf: &mut B) -> PfcpResult<Self> {
        ensure(&*buf, 3)?;
        let flags = buf.get_u8();
        let packed = buf.get_u8();
        let vid_low = buf.get_u8();

        Ok(Self {
            pcp: has_bit(flags, 1).then_some(packed & 0x07),
            dei: has_bit(flags, 2).then_some(packed & 0x08 != 0),
            vid: has_bit(flags, 3).then_some(((packed as u16 & 0xF0) << 4) | vid_low as u16),
        })
    }

    pub fn write(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let pcp = self.pcp.unwrap_or(0);
        let vid = self.vid.unwrap_or(0);
        if pcp > 0x07 {
            return Err(PfcpError::InconsistentField(format!("PCP {pcp} exceeds 3 bits")));
        }
        if vid > 0x0FFF {
            return Err(PfcpError::InconsistentField(format!("VID {vid} exceeds 12 bits")));
        }

        let mut flags = 0u8;
        flags = set_bit_if(flags, 1, self.pcp.is_some());
        flags = set_bit_if(flags, 2, self.dei.is_some());
        flags = set_bit_if(flags, 3, self.vid.is_some());

        let dei = if self.dei.unwrap_or(false) { 0x08 } else { 0 };
        buf.put_u8(flags);
        buf.put_u8((((vid >> 8) as u8) << 4) | dei | pcp);
        buf.put_u8(vid as u8);
        Ok(())
    }
}

/// C-TAG (customer VLAN tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CTag(pub VlanTag);

impl IeValue for CTag {
    const IE_TYPE: IeType = IeType::CTag;
    const NAME: &'static str = "C-TAG";
    const ENCODING: Encoding = Encoding::BitPacked;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [EthernetPacketFilter],
        EthernetPacketFilter => [CTag],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Ok(Self(VlanTag::read(&mut buf)?))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        self.0.write(buf)
    }
}

/// S-TAG (service VLAN tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct STag(pub VlanTag);

impl IeValue for STag {
    const IE_TYPE: IeType = IeType::STag;
    const NAME: &'static str = "S-TAG";
    const ENCODING: Encoding = Encoding::BitPacked;
    const CARRIERS: &'static [Hop] = hops![
        CreatePdr => [Pdi],
        UpdatePdr => [Pdi],
        Pdi => [EthernetPacketFilter],
        EthernetPacketFilter => [STag],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        Ok(Self(VlanTag::read(&mut buf)?))
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        self.0.write(buf)
    }
}

wire_enum! {
    /// Gate state
    Gate, "Gate Status" {
        Open = 0,
        Closed = 1,
    }
}

/// Gate Status (TS 29.244 Section 8.2.7): UL gate in bits 4-3, DL gate in
/// bits 2-1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStatus {
    pub ul_gate: Gate,
    pub dl_gate: Gate,
}

impl GateStatus {
    pub fn both_open() -> Self {
        Self { ul_gate: Gate::Open, dl_gate: Gate::Open }
    }

    pub fn both_closed() -> Self {
        Self { ul_gate: Gate::Closed, dl_gate: Gate::Closed }
    }
}

impl IeValue for GateStatus {
    const IE_TYPE: IeType = IeType::GateStatus;
    const NAME: &'static str = "Gate Status";
    const ENCODING: Encoding = Encoding::BitPacked;
    const CARRIERS: &'static [Hop] = hops![
        CreateQer => [GateStatus],
        UpdateQer => [GateStatus],
    ];

    fn decode(payload: &[u8]) -> PfcpResult<Self> {
        let mut buf = payload;
        let value = get_u8(&mut buf)?;
        Ok(Self {
            ul_gate: Gate::try_from((value >> 2) & 0x03)?,
            dl_gate: Gate::try_from(value & 0x03)?,
        })
    }

    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        buf.put_u8(((self.ul_gate as u8) << 2) | self.dl_gate as u8);
        Ok(())
    }
}

// ============================================================================
// Wide integers
// ============================================================================

macro_rules! bitrate_ie {
    ($(#[$doc:meta])* $name:ident = $ie:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            /// Uplink bitrate in kbps, 40 bits
            pub uplink: u64,
            /// Downlink bitrate in kbps, 40 bits
            pub downlink: u64,
        }

        impl $name {
            pub fn new(uplink: u64, downlink: u64) -> Self {
                Self { uplink, downlink }
            }
        }

        impl IeValue for $name {
            const IE_TYPE: IeType = IeType::$ie;
            const NAME: &'static str = $label;
            const ENCODING: Encoding = Encoding::WideInteger;
            const CARRIERS: &'static [Hop] = hops![
                CreateQer => [$ie],
                UpdateQer => [$ie],
            ];

            fn decode(payload: &[u8]) -> PfcpResult<Self> {
                let mut buf = payload;
                let uplink = get_u40(&mut buf)?;
                let downlink = get_u40(&mut buf)?;
                Ok(Self { uplink, downlink })
            }

            fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
                put_u40(buf, self.uplink)?;
                put_u40(buf, self.downlink)
            }
        }
    };
}

bitrate_ie! {
    /// Maximum Bit Rate (TS 29.244 Section 8.2.8)
    Mbr = Mbr, "MBR"
}

bitrate_ie! {
    /// Guaranteed Bit Rate (TS 29.244 Section 8.2.9)
    Gbr = Gbr, "GBR"
}

// ============================================================================
// Counted lists
// ============================================================================

/// Maximum entries a one-octet count can describe
pub const MAX_MAC_ADDRESSES: usize = u8::MAX as usize;

macro_rules! mac_list_ie {
    ($(#[$doc:meta])* $name:ident = $ie:ident, $label:literal) => {
        $(#[$doc])*
        ///
        /// The count octet is derived from the list; construction rejects more
        /// than 255 entries.
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            macs: Vec<[u8; 6]>,
            pub c_tag: Option<VlanTag>,
            pub s_tag: Option<VlanTag>,
        }

        impl $name {
            pub fn new(macs: Vec<[u8; 6]>) -> PfcpResult<Self> {
                if macs.len() > MAX_MAC_ADDRESSES {
                    return Err(PfcpError::InconsistentField(format!(
                        "{} holds at most {} addresses, got {}",
                        $label,
                        MAX_MAC_ADDRESSES,
                        macs.len()
                    )));
                }
                Ok(Self { macs, c_tag: None, s_tag: None })
            }

            pub fn macs(&self) -> &[[u8; 6]] {
                &self.macs
            }
        }

        impl IeValue for $name {
            const IE_TYPE: IeType = IeType::$ie;
            const NAME: &'static str = $label;
            const ENCODING: Encoding = Encoding::CountedList;
            const CARRIERS: &'static [Hop] = hops![
                UsageReportSmr => [EthernetTrafficInformation],
                UsageReportSdr => [EthernetTrafficInformation],
                UsageReportSrr => [EthernetTrafficInformation],
                EthernetTrafficInformation => [$ie],
                EthernetContextInformation => [$ie],
            ];

            fn decode(payload: &[u8]) -> PfcpResult<Self> {
                let mut buf = payload;
                let count = get_u8(&mut buf)? as usize;
                ensure(&buf, count * 6)?;
                let mut macs = Vec::with_capacity(count);
                for _ in 0..count {
                    macs.push(get_array::<6, _>(&mut buf)?);
                }

                let mut list = Self { macs, c_tag: None, s_tag: None };
                // Release 16 appends length-prefixed C-TAG and S-TAG
                if buf.has_remaining() {
                    list.c_tag = read_optional_tag(&mut buf)?;
                }
                if buf.has_remaining() {
                    list.s_tag = read_optional_tag(&mut buf)?;
                }
                Ok(list)
            }

            fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
                if self.macs.len() > MAX_MAC_ADDRESSES {
                    return Err(PfcpError::InconsistentField(format!(
                        "{} count {} exceeds {}",
                        $label,
                        self.macs.len(),
                        MAX_MAC_ADDRESSES
                    )));
                }
                buf.put_u8(self.macs.len() as u8);
                for mac in &self.macs {
                    buf.put_slice(mac);
                }
                if self.c_tag.is_some() || self.s_tag.is_some() {
                    write_optional_tag(buf, self.c_tag.as_ref())?;
                }
                if self.s_tag.is_some() {
                    write_optional_tag(buf, self.s_tag.as_ref())?;
                }
                Ok(())
            }
        }
    };
}

fn read_optional_tag(buf: &mut &[u8]) -> PfcpResult<Option<VlanTag>> {
    let mut body = get_len_prefixed(buf)?;
    if body.is_empty() {
        return Ok(None);
    }
    Ok(Some(VlanTag::read(&mut body)?))
}

fn write_optional_tag(buf: &mut BytesMut, tag: Option<&VlanTag>) -> PfcpResult<()> {
    match tag {
        Some(tag) => {
            buf.put_u8(3);
            tag.write(buf)
        }
        None => {
            buf.put_u8(0);
            Ok(())
        }
    }
}

mac_list_ie! {
    /// MAC Addresses Detected (TS 29.244 Section 8.2.103)
    MacAddressesDetected = MacAddressesDetected, "MAC Addresses Detected"
}

mac_list_ie! {
    /// MAC Addresses Removed (TS 29.244 Section 8.2.104)
    MacAddressesRemoved = MacAddressesRemoved, "MAC Addresses Removed"
}

/// Typed codecs registered in the catalogue
pub(crate) fn registry() -> Vec<Typed> {
    vec![
        catalogue::typed::<PfcpCause>(),
        catalogue::typed::<SourceInterface>(),
        catalogue::typed::<DestinationInterface>(),
        catalogue::typed::<PdnType>(),
        catalogue::typed::<PdrId>(),
        catalogue::typed::<FarId>(),
        catalogue::typed::<UrrId>(),
        catalogue::typed::<QerId>(),
        catalogue::typed::<BarId>(),
        catalogue::typed::<Precedence>(),
        catalogue::typed::<EthernetFilterId>(),
        catalogue::typed::<Ethertype>(),
        catalogue::typed::<UrSeqn>(),
        catalogue::typed::<DurationMeasurement>(),
        catalogue::typed::<TimeThreshold>(),
        catalogue::typed::<TransportLevelMarking>(),
        catalogue::typed::<OffendingIe>(),
        catalogue::typed::<Metric>(),
        catalogue::typed::<SequenceNumber>(),
        catalogue::typed::<Qfi>(),
        catalogue::typed::<RecoveryTimeStamp>(),
        catalogue::typed::<StartTime>(),
        catalogue::typed::<EndTime>(),
        catalogue::typed::<TimeOfFirstPacket>(),
        catalogue::typed::<TimeOfLastPacket>(),
        catalogue::typed::<MonitoringTime>(),
        catalogue::typed::<NetworkInstance>(),
        catalogue::typed::<ApplicationId>(),
        catalogue::typed::<ApnDnn>(),
        catalogue::typed::<NodeId>(),
        catalogue::typed::<FailedRuleId>(),
        catalogue::typed::<OuterHeaderRemoval>(),
        catalogue::typed::<ApplyAction>(),
        catalogue::typed::<ReportingTriggers>(),
        catalogue::typed::<UsageReportTrigger>(),
        catalogue::typed::<ReportType>(),
        catalogue::typed::<MeasurementMethod>(),
        catalogue::typed::<EthernetFilterProperties>(),
        catalogue::typed::<CpFunctionFeatures>(),
        catalogue::typed::<UpFunctionFeatures>(),
        catalogue::typed::<FSeid>(),
        catalogue::typed::<FTeid>(),
        catalogue::typed::<UeIpAddress>(),
        catalogue::typed::<VolumeThreshold>(),
        catalogue::typed::<VolumeMeasurement>(),
        catalogue::typed::<OuterHeaderCreation>(),
        catalogue::typed::<SdfFilter>(),
        catalogue::typed::<MacAddress>(),
        catalogue::typed::<DownlinkDataServiceInformation>(),
        catalogue::typed::<UserId>(),
        catalogue::typed::<CTag>(),
        catalogue::typed::<STag>(),
        catalogue::typed::<GateStatus>(),
        catalogue::typed::<Mbr>(),
        catalogue::typed::<Gbr>(),
        catalogue::typed::<MacAddressesDetected>(),
        catalogue::typed::<MacAddressesRemoved>(),
    ]
}
