//! PFCP Information Elements
//!
//! The generic TLV engine: IE framing, the sibling parser shared by message
//! bodies and grouped payloads, and the IE type registry (3GPP TS 29.244
//! Section 8.1).
//!
//! Decoded payloads are `Bytes` slices of the input buffer. They share its
//! allocation by reference count instead of borrowing it, so an `Ie` owns its
//! payload for as long as it lives and the caller's buffer can never be
//! changed underneath it.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{PfcpError, PfcpResult};
use crate::catalogue;
use crate::field::{self, IeValue};
use crate::util::ensure;

/// IE header length (type + length)
pub const IE_HEADER_LEN: usize = 4;

/// Type bit marking a vendor-specific IE
pub const VENDOR_SPECIFIC_BIT: u16 = 0x8000;

/// Largest payload a 16-bit length field can describe
pub const MAX_IE_PAYLOAD_LEN: usize = u16::MAX as usize;

macro_rules! ie_types {
    ($($variant:ident = $code:literal, $name:literal, $grouped:literal;)*) => {
        /// PFCP IE Type values (TS 29.244 Section 8.1.2)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum IeType {
            $($variant = $code,)*
        }

        impl TryFrom<u16> for IeType {
            type Error = PfcpError;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $($code => Ok(Self::$variant),)*
                    _ => Err(PfcpError::InvalidIeType(value)),
                }
            }
        }

        /// Every standard IE type with its name and whether its payload is grouped
        pub(crate) static IE_TYPES: &[(IeType, &str, bool)] = &[
            $((IeType::$variant, $name, $grouped),)*
        ];
    };
}

ie_types! {
    CreatePdr = 1, "Create PDR", true;
    Pdi = 2, "PDI", true;
    CreateFar = 3, "Create FAR", true;
    ForwardingParameters = 4, "Forwarding Parameters", true;
    DuplicatingParameters = 5, "Duplicating Parameters", true;
    CreateUrr = 6, "Create URR", true;
    CreateQer = 7, "Create QER", true;
    CreatedPdr = 8, "Created PDR", true;
    UpdatePdr = 9, "Update PDR", true;
    UpdateFar = 10, "Update FAR", true;
    UpdateForwardingParameters = 11, "Update Forwarding Parameters", true;
    UpdateBar = 12, "Update BAR within Session Report Response", true;
    UpdateUrr = 13, "Update URR", true;
    UpdateQer = 14, "Update QER", true;
    RemovePdr = 15, "Remove PDR", true;
    RemoveFar = 16, "Remove FAR", true;
    RemoveUrr = 17, "Remove URR", true;
    RemoveQer = 18, "Remove QER", true;
    Cause = 19, "Cause", false;
    SourceInterface = 20, "Source Interface", false;
    FTeid = 21, "F-TEID", false;
    NetworkInstance = 22, "Network Instance", false;
    SdfFilter = 23, "SDF Filter", false;
    ApplicationId = 24, "Application ID", false;
    GateStatus = 25, "Gate Status", false;
    Mbr = 26, "MBR", false;
    Gbr = 27, "GBR", false;
    QerCorrelationId = 28, "QER Correlation ID", false;
    Precedence = 29, "Precedence", false;
    TransportLevelMarking = 30, "Transport Level Marking", false;
    VolumeThreshold = 31, "Volume Threshold", false;
    TimeThreshold = 32, "Time Threshold", false;
    MonitoringTime = 33, "Monitoring Time", false;
    SubsequentVolumeThreshold = 34, "Subsequent Volume Threshold", false;
    SubsequentTimeThreshold = 35, "Subsequent Time Threshold", false;
    InactivityDetectionTime = 36, "Inactivity Detection Time", false;
    ReportingTriggers = 37, "Reporting Triggers", false;
    RedirectInformation = 38, "Redirect Information", false;
    ReportType = 39, "Report Type", false;
    OffendingIe = 40, "Offending IE", false;
    ForwardingPolicy = 41, "Forwarding Policy", false;
    DestinationInterface = 42, "Destination Interface", false;
    UpFunctionFeatures = 43, "UP Function Features", false;
    ApplyAction = 44, "Apply Action", false;
    DownlinkDataServiceInformation = 45, "Downlink Data Service Information", false;
    DownlinkDataNotificationDelay = 46, "Downlink Data Notification Delay", false;
    DlBufferingDuration = 47, "DL Buffering Duration", false;
    DlBufferingSuggestedPacketCount = 48, "DL Buffering Suggested Packet Count", false;
    PfcpSmreqFlags = 49, "PFCPSMReq-Flags", false;
    PfcpSrrspFlags = 50, "PFCPSRRsp-Flags", false;
    LoadControlInformation = 51, "Load Control Information", true;
    SequenceNumber = 52, "Sequence Number", false;
    Metric = 53, "Metric", false;
    OverloadControlInformation = 54, "Overload Control Information", true;
    Timer = 55, "Timer", false;
    PdrId = 56, "PDR ID", false;
    FSeid = 57, "F-SEID", false;
    ApplicationIdsPfds = 58, "Application ID's PFDs", true;
    PfdContext = 59, "PFD Context", true;
    NodeId = 60, "Node ID", false;
    PfdContents = 61, "PFD Contents", false;
    MeasurementMethod = 62, "Measurement Method", false;
    UsageReportTrigger = 63, "Usage Report Trigger", false;
    MeasurementPeriod = 64, "Measurement Period", false;
    FqCsid = 65, "FQ-CSID", false;
    VolumeMeasurement = 66, "Volume Measurement", false;
    DurationMeasurement = 67, "Duration Measurement", false;
    ApplicationDetectionInformation = 68, "Application Detection Information", true;
    TimeOfFirstPacket = 69, "Time of First Packet", false;
    TimeOfLastPacket = 70, "Time of Last Packet", false;
    QuotaHoldingTime = 71, "Quota Holding Time", false;
    DroppedDlTrafficThreshold = 72, "Dropped DL Traffic Threshold", false;
    VolumeQuota = 73, "Volume Quota", false;
    TimeQuota = 74, "Time Quota", false;
    StartTime = 75, "Start Time", false;
    EndTime = 76, "End Time", false;
    QueryUrr = 77, "Query URR", true;
    UsageReportSmr = 78, "Usage Report within Session Modification Response", true;
    UsageReportSdr = 79, "Usage Report within Session Deletion Response", true;
    UsageReportSrr = 80, "Usage Report within Session Report Request", true;
    UrrId = 81, "URR ID", false;
    LinkedUrrId = 82, "Linked URR ID", false;
    DownlinkDataReport = 83, "Downlink Data Report", true;
    OuterHeaderCreation = 84, "Outer Header Creation", false;
    CreateBar = 85, "Create BAR", true;
    UpdateBarSmr = 86, "Update BAR within Session Modification Request", true;
    RemoveBar = 87, "Remove BAR", true;
    BarId = 88, "BAR ID", false;
    CpFunctionFeatures = 89, "CP Function Features", false;
    UsageInformation = 90, "Usage Information", false;
    ApplicationInstanceId = 91, "Application Instance ID", false;
    FlowInformation = 92, "Flow Information", false;
    UeIpAddress = 93, "UE IP Address", false;
    PacketRate = 94, "Packet Rate", false;
    OuterHeaderRemoval = 95, "Outer Header Removal", false;
    RecoveryTimeStamp = 96, "Recovery Time Stamp", false;
    DlFlowLevelMarking = 97, "DL Flow Level Marking", false;
    HeaderEnrichment = 98, "Header Enrichment", false;
    ErrorIndicationReport = 99, "Error Indication Report", true;
    MeasurementInformation = 100, "Measurement Information", false;
    NodeReportType = 101, "Node Report Type", false;
    UserPlanePathFailureReport = 102, "User Plane Path Failure Report", true;
    RemoteGtpUPeer = 103, "Remote GTP-U Peer", false;
    UrSeqn = 104, "UR-SEQN", false;
    UpdateDuplicatingParameters = 105, "Update Duplicating Parameters", true;
    ActivatePredefinedRules = 106, "Activate Predefined Rules", false;
    DeactivatePredefinedRules = 107, "Deactivate Predefined Rules", false;
    FarId = 108, "FAR ID", false;
    QerId = 109, "QER ID", false;
    OciFlags = 110, "OCI Flags", false;
    PfcpAssociationReleaseRequest = 111, "PFCP Association Release Request", false;
    GracefulReleasePeriod = 112, "Graceful Release Period", false;
    PdnType = 113, "PDN Type", false;
    FailedRuleId = 114, "Failed Rule ID", false;
    TimeQuotaMechanism = 115, "Time Quota Mechanism", false;
    UserPlaneIpResourceInformation = 116, "User Plane IP Resource Information", false;
    UserPlaneInactivityTimer = 117, "User Plane Inactivity Timer", false;
    AggregatedUrrs = 118, "Aggregated URRs", true;
    Multiplier = 119, "Multiplier", false;
    AggregatedUrrId = 120, "Aggregated URR ID", false;
    SubsequentVolumeQuota = 121, "Subsequent Volume Quota", false;
    SubsequentTimeQuota = 122, "Subsequent Time Quota", false;
    Rqi = 123, "RQI", false;
    Qfi = 124, "QFI", false;
    QueryUrrReference = 125, "Query URR Reference", false;
    AdditionalUsageReportsInformation = 126, "Additional Usage Reports Information", false;
    CreateTrafficEndpoint = 127, "Create Traffic Endpoint", true;
    CreatedTrafficEndpoint = 128, "Created Traffic Endpoint", true;
    UpdateTrafficEndpoint = 129, "Update Traffic Endpoint", true;
    RemoveTrafficEndpoint = 130, "Remove Traffic Endpoint", true;
    TrafficEndpointId = 131, "Traffic Endpoint ID", false;
    EthernetPacketFilter = 132, "Ethernet Packet Filter", true;
    MacAddress = 133, "MAC Address", false;
    CTag = 134, "C-TAG", false;
    STag = 135, "S-TAG", false;
    Ethertype = 136, "Ethertype", false;
    Proxying = 137, "Proxying", false;
    EthernetFilterId = 138, "Ethernet Filter ID", false;
    EthernetFilterProperties = 139, "Ethernet Filter Properties", false;
    SuggestedBufferingPacketsCount = 140, "Suggested Buffering Packets Count", false;
    UserId = 141, "User ID", false;
    EthernetPduSessionInformation = 142, "Ethernet PDU Session Information", false;
    EthernetTrafficInformation = 143, "Ethernet Traffic Information", true;
    MacAddressesDetected = 144, "MAC Addresses Detected", false;
    MacAddressesRemoved = 145, "MAC Addresses Removed", false;
    EthernetInactivityTimer = 146, "Ethernet Inactivity Timer", false;
    AdditionalMonitoringTime = 147, "Additional Monitoring Time", true;
    EventQuota = 148, "Event Quota", false;
    EventThreshold = 149, "Event Threshold", false;
    SubsequentEventQuota = 150, "Subsequent Event Quota", false;
    SubsequentEventThreshold = 151, "Subsequent Event Threshold", false;
    TraceInformation = 152, "Trace Information", false;
    FramedRoute = 153, "Framed Route", false;
    FramedRouting = 154, "Framed Routing", false;
    FramedIpv6Route = 155, "Framed IPv6 Route", false;
    TimeStamp = 156, "Event Time Stamp", false;
    AveragingWindow = 157, "Averaging Window", false;
    PagingPolicyIndicator = 158, "Paging Policy Indicator", false;
    ApnDnn = 159, "APN/DNN", false;
    ThreeGppInterfaceType = 160, "3GPP Interface Type", false;
    PfcpSrreqFlags = 161, "PFCPSRReq-Flags", false;
    PfcpAureqFlags = 162, "PFCPAUReq-Flags", false;
    ActivationTime = 163, "Activation Time", false;
    DeactivationTime = 164, "Deactivation Time", false;
    CreateMar = 165, "Create MAR", true;
    ThreeGppAccessForwardingActionInformation = 166, "3GPP Access Forwarding Action Information", true;
    Non3gppAccessForwardingActionInformation = 167, "Non-3GPP Access Forwarding Action Information", true;
    RemoveMar = 168, "Remove MAR", true;
    UpdateMar = 169, "Update MAR", true;
    MarId = 170, "MAR ID", false;
    SteeringFunctionality = 171, "Steering Functionality", false;
    SteeringMode = 172, "Steering Mode", false;
    Weight = 173, "Weight", false;
    Priority = 174, "Priority", false;
    Update3gppAccessForwardingActionInformation = 175, "Update 3GPP Access Forwarding Action Information", true;
    UpdateNon3gppAccessForwardingActionInformation = 176, "Update Non-3GPP Access Forwarding Action Information", true;
    UeIpAddressPoolIdentity = 177, "UE IP Address Pool Identity", false;
    AlternativeSmfIpAddress = 178, "Alternative SMF IP Address", false;
    PacketReplicationAndDetectionCarryOnInformation = 179, "Packet Replication and Detection Carry On Information", false;
    SmfSetId = 180, "SMF Set ID", false;
    QuotaValidityTime = 181, "Quota Validity Time", false;
    NumberOfReports = 182, "Number of Reports", false;
    PfcpSessionRetentionInformation = 183, "PFCP Session Retention Information", true;
    PfcpAsrspFlags = 184, "PFCPASRsp-Flags", false;
    CpPfcpEntityIpAddress = 185, "CP PFCP Entity IP Address", false;
    PfcpSereqFlags = 186, "PFCPSEReq-Flags", false;
    UserPlanePathRecoveryReport = 187, "User Plane Path Recovery Report", true;
    IpMulticastAddressingInfo = 188, "IP Multicast Addressing Info", true;
    JoinIpMulticastInformation = 189, "Join IP Multicast Information within Usage Report", true;
    LeaveIpMulticastInformation = 190, "Leave IP Multicast Information within Usage Report", true;
    IpMulticastAddress = 191, "IP Multicast Address", false;
    SourceIpAddress = 192, "Source IP Address", false;
    PacketRateStatus = 193, "Packet Rate Status", false;
    CreateBridgeInfoForTsc = 194, "Create Bridge Info for TSC", false;
    CreatedBridgeInfoForTsc = 195, "Created Bridge Info for TSC", true;
    DsTtPortNumber = 196, "DS-TT Port Number", false;
    NwTtPortNumber = 197, "NW-TT Port Number", false;
    TsnBridgeId = 198, "TSN Bridge ID", false;
    TscManagementInformationSmr = 199, "Port Management Information for TSC within Session Modification Request", true;
    TscManagementInformationSmrsp = 200, "Port Management Information for TSC within Session Modification Response", true;
    TscManagementInformationSrr = 201, "Port Management Information for TSC within Session Report Request", true;
    PortManagementInformationContainer = 202, "Port Management Information Container", false;
    ClockDriftControlInformation = 203, "Clock Drift Control Information", true;
    RequestedClockDriftInformation = 204, "Requested Clock Drift Information", false;
    ClockDriftReport = 205, "Clock Drift Report", true;
    TimeDomainNumber = 206, "TSN Time Domain Number", false;
    TimeOffsetThreshold = 207, "Time Offset Threshold", false;
    CumulativeRateratioThreshold = 208, "Cumulative Rate Ratio Threshold", false;
    TimeOffsetMeasurement = 209, "Time Offset Measurement", false;
    CumulativeRateratioMeasurement = 210, "Cumulative Rate Ratio Measurement", false;
    RemoveSrr = 211, "Remove SRR", true;
    CreateSrr = 212, "Create SRR", true;
    UpdateSrr = 213, "Update SRR", true;
    SessionReport = 214, "Session Report", true;
    SrrId = 215, "SRR ID", false;
    AccessAvailabilityControlInformation = 216, "Access Availability Control Information", true;
    RequestedAccessAvailabilityInformation = 217, "Requested Access Availability Information", false;
    AccessAvailabilityReport = 218, "Access Availability Report", true;
    AccessAvailabilityInformation = 219, "Access Availability Information", false;
    ProvideAtsssControlInformation = 220, "Provide ATSSS Control Information", true;
    AtsssControlParameters = 221, "ATSSS Control Parameters", true;
    MptcpControlInformation = 222, "MPTCP Control Information", false;
    AtsssLlControlInformation = 223, "ATSSS-LL Control Information", false;
    PmfControlInformation = 224, "PMF Control Information", false;
    MptcpParameters = 225, "MPTCP Parameters", true;
    AtsssLlParameters = 226, "ATSSS-LL Parameters", true;
    PmfParameters = 227, "PMF Parameters", true;
    MptcpAddressInformation = 228, "MPTCP Address Information", false;
    UeLinkSpecificIpAddress = 229, "UE Link Specific IP Address", false;
    PmfAddressInformation = 230, "PMF Address Information", false;
    AtsssLlInformation = 231, "ATSSS-LL Information", false;
    DataNetworkAccessIdentifier = 232, "Data Network Access Identifier", false;
    UeIpAddressPoolInformation = 233, "UE IP Address Pool Information", true;
    AveragePacketDelay = 234, "Average Packet Delay", false;
    MinimumPacketDelay = 235, "Minimum Packet Delay", false;
    MaximumPacketDelay = 236, "Maximum Packet Delay", false;
    QosReportTrigger = 237, "QoS Report Trigger", false;
    GtpUPathQosControlInformation = 238, "GTP-U Path QoS Control Information", true;
    GtpUPathQosReport = 239, "GTP-U Path QoS Report", true;
    QosInformationInGtpUPathQosReport = 240, "QoS Information in GTP-U Path QoS Report", true;
    GtpUPathInterfaceType = 241, "GTP-U Path Interface Type", false;
    QosMonitoringPerQosFlowControlInformation = 242, "QoS Monitoring Per QoS Flow Control Information", true;
    RequestedQosMonitoring = 243, "Requested QoS Monitoring", false;
    ReportingFrequency = 244, "Reporting Frequency", false;
    PacketDelayThresholds = 245, "Packet Delay Thresholds", false;
    MinimumWaitTime = 246, "Minimum Wait Time", false;
    QosMonitoringReport = 247, "QoS Monitoring Report", true;
    QosMonitoringMeasurement = 248, "QoS Monitoring Measurement", false;
    MtEdtControlInformation = 249, "MT-EDT Control Information", false;
    DlDataPacketsSize = 250, "DL Data Packets Size", false;
    QerControlIndications = 251, "QER Control Indications", false;
    PacketRateStatusReport = 252, "Packet Rate Status Report", true;
    NfInstanceId = 253, "NF Instance ID", false;
    EthernetContextInformation = 254, "Ethernet Context Information", true;
    RedundantTransmissionParameters = 255, "Redundant Transmission Parameters", true;
    UpdatedPdr = 256, "Updated PDR", true;
}

impl From<IeType> for u16 {
    fn from(t: IeType) -> u16 {
        t as u16
    }
}

impl IeType {
    /// Human readable name
    pub fn name(self) -> &'static str {
        catalogue::ie_name(self as u16)
    }

    /// Whether the payload is a sequence of nested IEs
    pub fn is_grouped(self) -> bool {
        catalogue::is_grouped(self as u16)
    }
}

/// Information Element: a type code and its payload.
///
/// The length field is never stored; it is computed from the payload on every
/// encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ie {
    ie_type: u16,
    payload: Bytes,
}

impl Ie {
    pub fn new(ie_type: impl Into<u16>, payload: impl Into<Bytes>) -> Self {
        Self {
            ie_type: ie_type.into(),
            payload: payload.into(),
        }
    }

    /// Build a grouped IE from its children, in order.
    pub fn grouped(ie_type: impl Into<u16>, children: &[Ie]) -> PfcpResult<Self> {
        let mut buf = BytesMut::with_capacity(children.iter().map(Ie::encoded_len).sum());
        for child in children {
            child.encode(&mut buf)?;
        }
        Ok(Self::new(ie_type, buf.freeze()))
    }

    /// Build an IE from a typed value.
    pub fn from_value<F: IeValue>(value: &F) -> PfcpResult<Self> {
        let mut buf = BytesMut::new();
        value.encode(&mut buf)?;
        Ok(Self::new(F::IE_TYPE, buf.freeze()))
    }

    /// Build a vendor-specific IE. The vendor bit is forced on.
    pub fn vendor_specific(ie_type: u16, enterprise_id: u16, data: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(2 + data.len());
        buf.put_u16(enterprise_id);
        buf.put_slice(data);
        Self::new(ie_type | VENDOR_SPECIFIC_BIT, buf.freeze())
    }

    pub fn ie_type(&self) -> u16 {
        self.ie_type
    }

    /// Typed view of the type code, if it is a standard one
    pub fn known_type(&self) -> Option<IeType> {
        IeType::try_from(self.ie_type).ok()
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Name for diagnostics
    pub fn name(&self) -> &'static str {
        catalogue::ie_name(self.ie_type)
    }

    /// Encoded size including the 4-byte header
    pub fn encoded_len(&self) -> usize {
        IE_HEADER_LEN + self.payload.len()
    }

    pub fn is_vendor_specific(&self) -> bool {
        self.ie_type & VENDOR_SPECIFIC_BIT != 0
    }

    /// Enterprise ID leading a vendor-specific payload
    pub fn enterprise_id(&self) -> PfcpResult<u16> {
        if !self.is_vendor_specific() {
            return Err(PfcpError::InvalidFormat(format!(
                "IE type {} is not vendor-specific",
                self.ie_type
            )));
        }
        let mut buf = &self.payload[..];
        crate::util::get_u16(&mut buf)
    }

    /// Vendor-specific data following the enterprise ID
    pub fn vendor_data(&self) -> PfcpResult<Bytes> {
        self.enterprise_id()?;
        Ok(self.payload.slice(2..))
    }

    /// Encode type, derived length and payload.
    pub fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let len = self.payload.len();
        if len > MAX_IE_PAYLOAD_LEN {
            return Err(PfcpError::PayloadTooLong { len });
        }
        buf.reserve(IE_HEADER_LEN + len);
        buf.put_u16(self.ie_type);
        buf.put_u16(len as u16);
        buf.put_slice(&self.payload);
        Ok(())
    }

    /// Decode one IE, advancing `buf` past it.
    ///
    /// The declared length is checked against the remaining bytes before the
    /// payload is sliced out.
    pub fn decode(buf: &mut Bytes) -> PfcpResult<Self> {
        ensure(&*buf, IE_HEADER_LEN)?;
        let ie_type = buf.get_u16();
        let len = buf.get_u16() as usize;
        ensure(&*buf, len)?;
        let payload = buf.split_to(len);
        log::trace!("IE {} ({}) len={}", catalogue::ie_name(ie_type), ie_type, len);
        Ok(Self { ie_type, payload })
    }

    /// Decode one IE from the front of a slice, returning it with the number
    /// of bytes consumed. The payload is copied.
    pub fn decode_from(data: &[u8]) -> PfcpResult<(Self, usize)> {
        let mut buf = data;
        ensure(&buf, IE_HEADER_LEN)?;
        let ie_type = buf.get_u16();
        let len = buf.get_u16() as usize;
        ensure(&buf, len)?;
        let payload = Bytes::copy_from_slice(&buf[..len]);
        Ok((Self { ie_type, payload }, IE_HEADER_LEN + len))
    }

    /// Parse the payload as a sequence of sibling IEs.
    pub fn children(&self) -> PfcpResult<Vec<Ie>> {
        parse_siblings(self.payload.clone())
    }

    /// Read a field from this IE or from inside it, following the field's
    /// carrier path. `Ok(None)` means the carrier is valid but the field is
    /// absent.
    pub fn get<F: IeValue>(&self) -> PfcpResult<Option<F>> {
        field::find::<F>(self)
    }

    /// Read every occurrence of a field found along its carrier path.
    pub fn get_all<F: IeValue>(&self) -> PfcpResult<Vec<F>> {
        field::find_all::<F>(self)
    }

    /// Multi-line tree rendering for logs, nested up to `max_depth` levels.
    pub fn dump(&self, max_depth: usize) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0, max_depth);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize, max_depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&format!(
            "{indent}{} ({}) len={}",
            self.name(),
            self.ie_type,
            self.payload.len()
        ));

        if catalogue::is_grouped(self.ie_type) {
            match self.children() {
                Ok(children) if depth < max_depth => {
                    out.push('\n');
                    for child in children {
                        child.dump_into(out, depth + 1, max_depth);
                    }
                    return;
                }
                Ok(_) => out.push_str(" [...]"),
                Err(_) => out.push_str(&format!(" [malformed] {}", hex::encode(&self.payload))),
            }
        } else {
            match catalogue::describe(self.ie_type, &self.payload) {
                Some(Ok(text)) => out.push_str(&format!(": {text}")),
                Some(Err(e)) => out.push_str(&format!(": <{e}> {}", hex::encode(&self.payload))),
                None => out.push_str(&format!(": {}", hex::encode(&self.payload))),
            }
        }
        out.push('\n');
    }
}

/// Scan a buffer into its sibling IEs, in order.
///
/// Used for message bodies and grouped payloads alike. A trailing partial
/// TLV is an error; it is never dropped. Each iteration consumes at least
/// the 4-byte IE header, so the loop is linear in the buffer size.
pub fn parse_siblings(mut buf: Bytes) -> PfcpResult<Vec<Ie>> {
    let mut ies = Vec::new();
    while buf.has_remaining() {
        ies.push(Ie::decode(&mut buf)?);
    }
    Ok(ies)
}

/// `parse_siblings` over a borrowed slice. The payloads are copied once.
pub fn parse_siblings_slice(data: &[u8]) -> PfcpResult<Vec<Ie>> {
    parse_siblings(Bytes::copy_from_slice(data))
}

/// Encode a list of IEs back to back.
pub fn encode_all(ies: &[Ie], buf: &mut BytesMut) -> PfcpResult<()> {
    for ie in ies {
        ie.encode(buf)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ie_encode_decode() {
        let ie = Ie::new(IeType::Cause, vec![1u8]);
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x13, 0x00, 0x01, 0x01]);

        let mut bytes = buf.freeze();
        let decoded = Ie::decode(&mut bytes).unwrap();
        assert_eq!(decoded, ie);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_from_reports_consumed() {
        let data = [0x00, 0x38, 0x00, 0x02, 0x00, 0x07, 0xFF];
        let (ie, used) = Ie::decode_from(&data).unwrap();
        assert_eq!(used, 6);
        assert_eq!(ie.ie_type(), IeType::PdrId as u16);
        assert_eq!(&ie.payload()[..], &[0x00, 0x07]);
    }

    #[test]
    fn test_declared_length_past_end() {
        let mut bytes = Bytes::from_static(&[0x00, 0x13, 0x00, 0x05, 0x01]);
        assert_eq!(
            Ie::decode(&mut bytes),
            Err(PfcpError::BufferTooShort { needed: 5, available: 1 })
        );
    }

    #[test]
    fn test_siblings_reject_partial_tail() {
        let data = [0x00, 0x13, 0x00, 0x01, 0x01, 0x00, 0x13];
        assert!(matches!(
            parse_siblings_slice(&data),
            Err(PfcpError::BufferTooShort { needed: 4, available: 2 })
        ));
    }

    #[test]
    fn test_siblings_empty_and_zero_length() {
        assert!(parse_siblings(Bytes::new()).unwrap().is_empty());
        let ies = parse_siblings_slice(&[0x00, 0x02, 0x00, 0x00]).unwrap();
        assert_eq!(ies.len(), 1);
        assert!(ies[0].payload().is_empty());
    }

    #[test]
    fn test_grouped_children() {
        let pdr_id = Ie::new(IeType::PdrId, vec![0x00, 0x01]);
        let precedence = Ie::new(IeType::Precedence, vec![0, 0, 0, 255]);
        let pdr = Ie::grouped(IeType::CreatePdr, &[pdr_id.clone(), precedence.clone()]).unwrap();
        assert_eq!(pdr.payload().len(), pdr_id.encoded_len() + precedence.encoded_len());
        assert_eq!(pdr.children().unwrap(), vec![pdr_id, precedence]);
    }

    #[test]
    fn test_length_is_derived_from_payload() {
        let ie = Ie::new(IeType::NetworkInstance, Bytes::from_static(b"internet"));
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]) as usize, 8);
        assert_eq!(buf.len(), ie.encoded_len());
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let ie = Ie::new(IeType::NetworkInstance, vec![0u8; MAX_IE_PAYLOAD_LEN + 1]);
        let mut buf = BytesMut::new();
        assert_eq!(
            ie.encode(&mut buf),
            Err(PfcpError::PayloadTooLong { len: MAX_IE_PAYLOAD_LEN + 1 })
        );
    }

    #[test]
    fn test_vendor_specific() {
        let ie = Ie::vendor_specific(0x0001, 18681, &[0xDE, 0xAD]);
        assert!(ie.is_vendor_specific());
        assert_eq!(ie.ie_type(), 0x8001);
        assert_eq!(ie.enterprise_id().unwrap(), 18681);
        assert_eq!(&ie.vendor_data().unwrap()[..], &[0xDE, 0xAD]);
        assert!(ie.known_type().is_none());

        let plain = Ie::new(IeType::Cause, vec![1u8]);
        assert!(plain.enterprise_id().is_err());
    }

    #[test]
    fn test_ie_type_registry() {
        assert_eq!(IeType::try_from(138).unwrap(), IeType::EthernetFilterId);
        assert_eq!(IeType::try_from(256).unwrap(), IeType::UpdatedPdr);
        assert_eq!(IeType::try_from(0), Err(PfcpError::InvalidIeType(0)));
        assert_eq!(IeType::Pdi.name(), "PDI");
        assert!(IeType::CreatePdr.is_grouped());
        assert!(!IeType::Cause.is_grouped());
    }

    #[test]
    fn test_dump_nested() {
        let filter = Ie::grouped(
            IeType::EthernetPacketFilter,
            &[Ie::new(IeType::EthernetFilterId, vec![0, 0, 0, 9])],
        )
        .unwrap();
        let pdi = Ie::grouped(IeType::Pdi, &[filter]).unwrap();
        let text = pdi.dump(8);
        assert!(text.starts_with("PDI (2)"));
        assert!(text.contains("    Ethernet Filter ID (138) len=4"));

        let shallow = pdi.dump(0);
        assert!(shallow.contains("[...]"));
        assert!(!shallow.contains("Ethernet Filter ID"));
    }

    #[test]
    fn test_dump_raw_payload_as_hex() {
        let unknown = Ie::new(0x7F00u16, vec![0xDE, 0xAD, 0x0B]);
        assert_eq!(unknown.dump(8), "Unknown (32512) len=3: dead0b\n");

        let malformed = Ie::new(IeType::Pdi, vec![0x00, 0x14]);
        assert!(malformed.dump(8).contains("[malformed] 0014"));
    }
}
