//! PFCP Messages
//!
//! A message is a header, one IE list per named slot of its shape, and a
//! catch-all list for IEs no slot takes. Shapes follow TS 29.244 Section 7;
//! slot order is the order IEs are written on the wire.

use std::collections::HashMap;
use std::sync::LazyLock;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{PfcpError, PfcpResult};
use crate::field::{self, IeValue};
use crate::header::{PfcpHeader, PfcpMessageType};
use crate::ie::{parse_siblings, Ie, IeType};
use crate::types::PFCP_VERSION;
use crate::util::ensure;

/// Named position in a message shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub ie_type: IeType,
    /// Takes any number of IEs instead of at most one
    pub multiple: bool,
}

const fn one(name: &'static str, ie_type: IeType) -> Slot {
    Slot { name, ie_type, multiple: false }
}

const fn many(name: &'static str, ie_type: IeType) -> Slot {
    Slot { name, ie_type, multiple: true }
}

/// Slot table for one message type
#[derive(Debug)]
pub struct MessageShape {
    pub message_type: PfcpMessageType,
    pub slots: &'static [Slot],
}

impl MessageShape {
    fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    fn route(&self, ie_type: u16) -> Option<usize> {
        self.slots.iter().position(|s| s.ie_type as u16 == ie_type)
    }
}

macro_rules! shape {
    ($t:ident, [$($slot:expr),* $(,)?]) => {
        MessageShape { message_type: PfcpMessageType::$t, slots: &[$($slot),*] }
    };
}

static SHAPES: &[MessageShape] = &[
    shape!(HeartbeatRequest, [
        one("recovery_time_stamp", IeType::RecoveryTimeStamp),
        one("source_ip_address", IeType::SourceIpAddress),
    ]),
    shape!(HeartbeatResponse, [
        one("recovery_time_stamp", IeType::RecoveryTimeStamp),
    ]),
    shape!(PfdManagementRequest, [
        many("application_ids_pfds", IeType::ApplicationIdsPfds),
    ]),
    shape!(PfdManagementResponse, [
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
    ]),
    shape!(AssociationSetupRequest, [
        one("node_id", IeType::NodeId),
        one("recovery_time_stamp", IeType::RecoveryTimeStamp),
        one("up_function_features", IeType::UpFunctionFeatures),
        one("cp_function_features", IeType::CpFunctionFeatures),
        many("user_plane_ip_resource_information", IeType::UserPlaneIpResourceInformation),
        many("alternative_smf_ip_address", IeType::AlternativeSmfIpAddress),
        one("smf_set_id", IeType::SmfSetId),
        one("pfcp_session_retention_information", IeType::PfcpSessionRetentionInformation),
        many("ue_ip_address_pool_information", IeType::UeIpAddressPoolInformation),
        many("gtpu_path_qos_control_information", IeType::GtpUPathQosControlInformation),
        many("clock_drift_control_information", IeType::ClockDriftControlInformation),
        one("upf_instance_id", IeType::NfInstanceId),
    ]),
    shape!(AssociationSetupResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
        one("recovery_time_stamp", IeType::RecoveryTimeStamp),
        one("up_function_features", IeType::UpFunctionFeatures),
        one("cp_function_features", IeType::CpFunctionFeatures),
        many("user_plane_ip_resource_information", IeType::UserPlaneIpResourceInformation),
        many("alternative_smf_ip_address", IeType::AlternativeSmfIpAddress),
        one("pfcpasrsp_flags", IeType::PfcpAsrspFlags),
        many("ue_ip_address_pool_information", IeType::UeIpAddressPoolInformation),
        many("gtpu_path_qos_control_information", IeType::GtpUPathQosControlInformation),
        many("clock_drift_control_information", IeType::ClockDriftControlInformation),
        one("upf_instance_id", IeType::NfInstanceId),
    ]),
    shape!(AssociationUpdateRequest, [
        one("node_id", IeType::NodeId),
        one("up_function_features", IeType::UpFunctionFeatures),
        one("cp_function_features", IeType::CpFunctionFeatures),
        one("pfcp_association_release_request", IeType::PfcpAssociationReleaseRequest),
        one("graceful_release_period", IeType::GracefulReleasePeriod),
        one("pfcpaureq_flags", IeType::PfcpAureqFlags),
        many("alternative_smf_ip_address", IeType::AlternativeSmfIpAddress),
        many("clock_drift_control_information", IeType::ClockDriftControlInformation),
        many("ue_ip_address_pool_information", IeType::UeIpAddressPoolInformation),
        many("gtpu_path_qos_control_information", IeType::GtpUPathQosControlInformation),
    ]),
    shape!(AssociationUpdateResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
        one("up_function_features", IeType::UpFunctionFeatures),
        one("cp_function_features", IeType::CpFunctionFeatures),
    ]),
    shape!(AssociationReleaseRequest, [
        one("node_id", IeType::NodeId),
    ]),
    shape!(AssociationReleaseResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
    ]),
    shape!(VersionNotSupportedResponse, []),
    shape!(NodeReportRequest, [
        one("node_id", IeType::NodeId),
        one("node_report_type", IeType::NodeReportType),
        one("user_plane_path_failure_report", IeType::UserPlanePathFailureReport),
        one("user_plane_path_recovery_report", IeType::UserPlanePathRecoveryReport),
        many("clock_drift_report", IeType::ClockDriftReport),
        many("gtpu_path_qos_report", IeType::GtpUPathQosReport),
    ]),
    shape!(NodeReportResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
    ]),
    shape!(SessionSetDeletionRequest, [
        one("node_id", IeType::NodeId),
        many("fq_csid", IeType::FqCsid),
    ]),
    shape!(SessionSetDeletionResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
    ]),
    shape!(SessionSetModificationRequest, [
        one("node_id", IeType::NodeId),
        many("alternative_smf_ip_address", IeType::AlternativeSmfIpAddress),
        many("fq_csid", IeType::FqCsid),
    ]),
    shape!(SessionSetModificationResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
    ]),
    shape!(SessionEstablishmentRequest, [
        one("node_id", IeType::NodeId),
        one("cp_f_seid", IeType::FSeid),
        many("create_pdr", IeType::CreatePdr),
        many("create_far", IeType::CreateFar),
        many("create_urr", IeType::CreateUrr),
        many("create_qer", IeType::CreateQer),
        one("create_bar", IeType::CreateBar),
        many("create_traffic_endpoint", IeType::CreateTrafficEndpoint),
        one("pdn_type", IeType::PdnType),
        many("fq_csid", IeType::FqCsid),
        one("user_plane_inactivity_timer", IeType::UserPlaneInactivityTimer),
        one("user_id", IeType::UserId),
        one("trace_information", IeType::TraceInformation),
        one("apn_dnn", IeType::ApnDnn),
        many("create_mar", IeType::CreateMar),
        one("pfcpsereq_flags", IeType::PfcpSereqFlags),
        one("create_bridge_info_for_tsc", IeType::CreateBridgeInfoForTsc),
        many("create_srr", IeType::CreateSrr),
        one("provide_atsss_control_information", IeType::ProvideAtsssControlInformation),
        one("recovery_time_stamp", IeType::RecoveryTimeStamp),
    ]),
    shape!(SessionEstablishmentResponse, [
        one("node_id", IeType::NodeId),
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
        one("up_f_seid", IeType::FSeid),
        many("created_pdr", IeType::CreatedPdr),
        one("load_control_information", IeType::LoadControlInformation),
        one("overload_control_information", IeType::OverloadControlInformation),
        many("fq_csid", IeType::FqCsid),
        one("failed_rule_id", IeType::FailedRuleId),
        many("created_traffic_endpoint", IeType::CreatedTrafficEndpoint),
        one("created_bridge_info_for_tsc", IeType::CreatedBridgeInfoForTsc),
        one("atsss_control_parameters", IeType::AtsssControlParameters),
    ]),
    shape!(SessionModificationRequest, [
        one("cp_f_seid", IeType::FSeid),
        many("remove_pdr", IeType::RemovePdr),
        many("remove_far", IeType::RemoveFar),
        many("remove_urr", IeType::RemoveUrr),
        many("remove_qer", IeType::RemoveQer),
        one("remove_bar", IeType::RemoveBar),
        many("remove_traffic_endpoint", IeType::RemoveTrafficEndpoint),
        many("create_pdr", IeType::CreatePdr),
        many("create_far", IeType::CreateFar),
        many("create_urr", IeType::CreateUrr),
        many("create_qer", IeType::CreateQer),
        one("create_bar", IeType::CreateBar),
        many("create_traffic_endpoint", IeType::CreateTrafficEndpoint),
        many("update_pdr", IeType::UpdatePdr),
        many("update_far", IeType::UpdateFar),
        many("update_urr", IeType::UpdateUrr),
        many("update_qer", IeType::UpdateQer),
        one("update_bar", IeType::UpdateBarSmr),
        many("update_traffic_endpoint", IeType::UpdateTrafficEndpoint),
        one("pfcpsmreq_flags", IeType::PfcpSmreqFlags),
        many("query_urr", IeType::QueryUrr),
        many("fq_csid", IeType::FqCsid),
        one("user_plane_inactivity_timer", IeType::UserPlaneInactivityTimer),
        one("query_urr_reference", IeType::QueryUrrReference),
        one("trace_information", IeType::TraceInformation),
        many("remove_mar", IeType::RemoveMar),
        many("update_mar", IeType::UpdateMar),
        many("create_mar", IeType::CreateMar),
        one("node_id", IeType::NodeId),
        one("port_management_information_for_tsc", IeType::TscManagementInformationSmr),
        many("remove_srr", IeType::RemoveSrr),
        many("create_srr", IeType::CreateSrr),
        many("update_srr", IeType::UpdateSrr),
        one("provide_atsss_control_information", IeType::ProvideAtsssControlInformation),
        one("ethernet_context_information", IeType::EthernetContextInformation),
        many("access_availability_information", IeType::AccessAvailabilityInformation),
    ]),
    shape!(SessionModificationResponse, [
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
        many("created_pdr", IeType::CreatedPdr),
        one("load_control_information", IeType::LoadControlInformation),
        one("overload_control_information", IeType::OverloadControlInformation),
        many("usage_report", IeType::UsageReportSmr),
        one("failed_rule_id", IeType::FailedRuleId),
        one("additional_usage_reports_information", IeType::AdditionalUsageReportsInformation),
        many("created_traffic_endpoint", IeType::CreatedTrafficEndpoint),
        one("created_bridge_info_for_tsc", IeType::CreatedBridgeInfoForTsc),
        one("atsss_control_parameters", IeType::AtsssControlParameters),
        many("updated_pdr", IeType::UpdatedPdr),
        one("port_management_information_for_tsc", IeType::TscManagementInformationSmrsp),
    ]),
    shape!(SessionDeletionRequest, []),
    shape!(SessionDeletionResponse, [
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
        one("load_control_information", IeType::LoadControlInformation),
        one("overload_control_information", IeType::OverloadControlInformation),
        many("usage_report", IeType::UsageReportSdr),
        one("additional_usage_reports_information", IeType::AdditionalUsageReportsInformation),
    ]),
    shape!(SessionReportRequest, [
        one("report_type", IeType::ReportType),
        one("downlink_data_report", IeType::DownlinkDataReport),
        many("usage_report", IeType::UsageReportSrr),
        one("error_indication_report", IeType::ErrorIndicationReport),
        one("load_control_information", IeType::LoadControlInformation),
        one("overload_control_information", IeType::OverloadControlInformation),
        one("additional_usage_reports_information", IeType::AdditionalUsageReportsInformation),
        one("pfcpsrreq_flags", IeType::PfcpSrreqFlags),
        one("old_cp_f_seid", IeType::FSeid),
        one("packet_rate_status_report", IeType::PacketRateStatusReport),
        one("port_management_information_for_tsc", IeType::TscManagementInformationSrr),
        many("session_report", IeType::SessionReport),
    ]),
    shape!(SessionReportResponse, [
        one("cause", IeType::Cause),
        one("offending_ie", IeType::OffendingIe),
        one("update_bar", IeType::UpdateBar),
        one("pfcpsrrsp_flags", IeType::PfcpSrrspFlags),
        one("cp_f_seid", IeType::FSeid),
        one("n4u_f_teid", IeType::FTeid),
        one("alternative_smf_ip_address", IeType::AlternativeSmfIpAddress),
    ]),
];

static SHAPE_INDEX: LazyLock<HashMap<u8, &'static MessageShape>> = LazyLock::new(|| {
    SHAPES
        .iter()
        .map(|shape| (shape.message_type as u8, shape))
        .collect()
});

/// Shape for a message type code, `None` for codes outside the base protocol
pub fn shape(message_type: u8) -> Option<&'static MessageShape> {
    SHAPE_INDEX.get(&message_type).copied()
}

/// Every message shape, in type code order
pub fn shapes() -> &'static [MessageShape] {
    SHAPES
}

/// PFCP Message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: PfcpHeader,
    shape: Option<&'static MessageShape>,
    slots: Vec<Vec<Ie>>,
    extra: Vec<Ie>,
}

impl PartialEq for MessageShape {
    fn eq(&self, other: &Self) -> bool {
        self.message_type == other.message_type
    }
}

impl Eq for MessageShape {}

impl Message {
    /// Node message without SEID
    pub fn new(message_type: PfcpMessageType, sequence_number: u32) -> Self {
        Self::with_header(PfcpHeader::new(message_type, sequence_number))
    }

    /// Session message carrying a SEID
    pub fn new_session(message_type: PfcpMessageType, seid: u64, sequence_number: u32) -> Self {
        Self::with_header(PfcpHeader::new_with_seid(message_type, seid, sequence_number))
    }

    /// Message for any type code. Unknown codes get no slots and keep every
    /// IE in `extra`.
    pub fn raw(message_type: u8, seid: Option<u64>, sequence_number: u32) -> Self {
        Self::with_header(PfcpHeader::raw(message_type, seid, sequence_number))
    }

    fn with_header(header: PfcpHeader) -> Self {
        let shape = shape(header.message_type);
        let slot_count = shape.map_or(0, |s| s.slots.len());
        Self {
            header,
            shape,
            slots: vec![Vec::new(); slot_count],
            extra: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.header.priority = Some(priority);
        self
    }

    pub fn with_follow_on(mut self, follow_on: bool) -> Self {
        self.header.follow_on = follow_on;
        self
    }

    /// Header as last decoded; `length` is recomputed on every encode.
    pub fn header(&self) -> &PfcpHeader {
        &self.header
    }

    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }

    pub fn known_type(&self) -> Option<PfcpMessageType> {
        self.shape.map(|s| s.message_type)
    }

    pub fn name(&self) -> &'static str {
        self.known_type().map_or("Unknown", |t| t.name())
    }

    pub fn seid(&self) -> Option<u64> {
        self.header.seid
    }

    pub fn sequence_number(&self) -> u32 {
        self.header.sequence_number
    }

    pub fn shape(&self) -> Option<&'static MessageShape> {
        self.shape
    }

    /// Place an IE in the first slot of its type. A full single slot, or no
    /// slot at all, sends it to `extra`.
    pub fn add(&mut self, ie: Ie) -> &mut Self {
        let target = self.shape.and_then(|s| s.route(ie.ie_type()).map(|i| (i, &s.slots[i])));
        match target {
            Some((i, slot)) if slot.multiple || self.slots[i].is_empty() => self.slots[i].push(ie),
            Some((_, slot)) => {
                log::debug!(
                    "{}: duplicate {} moved to extra",
                    self.name(),
                    slot.name
                );
                self.extra.push(ie);
            }
            None => self.extra.push(ie),
        }
        self
    }

    /// Encode a typed value and route it like `add`.
    pub fn add_value<F: IeValue>(&mut self, value: &F) -> PfcpResult<&mut Self> {
        Ok(self.add(Ie::from_value(value)?))
    }

    /// Replace a slot's contents.
    pub fn set(&mut self, slot_name: &str, ies: Vec<Ie>) -> PfcpResult<()> {
        let (index, slot) = self.lookup_slot(slot_name)?;
        if let Some(bad) = ies.iter().find(|ie| ie.ie_type() != slot.ie_type as u16) {
            return Err(PfcpError::InconsistentField(format!(
                "slot {} takes {}, got {}",
                slot.name,
                slot.ie_type.name(),
                bad.name()
            )));
        }
        if !slot.multiple && ies.len() > 1 {
            return Err(PfcpError::InconsistentField(format!(
                "slot {} holds one IE, got {}",
                slot.name,
                ies.len()
            )));
        }
        self.slots[index] = ies;
        Ok(())
    }

    fn lookup_slot(&self, slot_name: &str) -> PfcpResult<(usize, &'static Slot)> {
        self.shape
            .and_then(|s| s.slot_index(slot_name).map(|i| (i, &s.slots[i])))
            .ok_or_else(|| PfcpError::UnknownSlot {
                slot: slot_name.to_string(),
                message_type: self.header.message_type,
            })
    }

    /// First IE in a slot. Unknown slot names read as empty.
    pub fn slot(&self, slot_name: &str) -> Option<&Ie> {
        self.slot_all(slot_name).first()
    }

    pub fn slot_all(&self, slot_name: &str) -> &[Ie] {
        match self.lookup_slot(slot_name) {
            Ok((index, _)) => self.slots[index].as_slice(),
            Err(_) => &[],
        }
    }

    /// Slot content, or `MissingMandatoryIe` when it is empty.
    pub fn require(&self, slot_name: &str) -> PfcpResult<&Ie> {
        let (index, slot) = self.lookup_slot(slot_name)?;
        self.slots[index]
            .first()
            .ok_or(PfcpError::MissingMandatoryIe(slot.name))
    }

    /// IEs no slot took, in arrival order
    pub fn extra(&self) -> &[Ie] {
        &self.extra
    }

    /// All IEs in wire order: slots in table order, then `extra`.
    pub fn ies(&self) -> impl Iterator<Item = &Ie> {
        self.slots.iter().flatten().chain(self.extra.iter())
    }

    /// First occurrence of `F` among the top-level IEs, looking through
    /// carriers where `F` may be nested.
    pub fn get<F: IeValue>(&self) -> PfcpResult<Option<F>> {
        for ie in self.ies() {
            if field::can_carry::<F>(ie.ie_type()) {
                if let Some(value) = field::find::<F>(ie)? {
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }

    /// Every occurrence of `F` in wire order
    pub fn get_all<F: IeValue>(&self) -> PfcpResult<Vec<F>> {
        let mut out = Vec::new();
        for ie in self.ies() {
            if field::can_carry::<F>(ie.ie_type()) {
                out.extend(field::find_all::<F>(ie)?);
            }
        }
        Ok(out)
    }

    /// Encode header and body; the length field is computed from the body.
    pub fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()> {
        let mut body = BytesMut::new();
        for ie in self.ies() {
            ie.encode(&mut body)?;
        }

        let mut header = self.header.clone();
        header.set_body_len(body.len())?;
        header.encode(buf)?;
        buf.put_slice(&body);

        log::debug!(
            "Encoded {} seq={} len={}",
            self.name(),
            header.sequence_number,
            header.length
        );
        Ok(())
    }

    pub fn marshal(&self) -> PfcpResult<Bytes> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode one message, rejecting versions other than 1.
    ///
    /// On success `buf` is advanced past the message and any following bytes
    /// are left for the caller. On error `buf` is untouched.
    pub fn decode(buf: &mut Bytes) -> PfcpResult<Self> {
        Self::decode_with(buf, true)
    }

    /// Decode one message; with `strict_version` false, other versions are
    /// accepted with a warning.
    pub fn decode_with(buf: &mut Bytes, strict_version: bool) -> PfcpResult<Self> {
        let mut cursor = buf.clone();
        let header = PfcpHeader::decode(&mut cursor)?;

        if header.version != PFCP_VERSION {
            if strict_version {
                return Err(PfcpError::VersionNotSupported(header.version));
            }
            log::warn!("Accepting PFCP version {}", header.version);
        }

        let body_len = header.body_len()?;
        ensure(&cursor, body_len)?;
        let body = cursor.split_to(body_len);
        let ies = parse_siblings(body)?;

        let mut msg = Self::with_header(header);
        for ie in ies {
            msg.add(ie);
        }

        buf.advance(msg.header.header_len() + body_len);
        log::debug!(
            "Decoded {} seq={} len={} extra={}",
            msg.name(),
            msg.header.sequence_number,
            msg.header.length,
            msg.extra.len()
        );
        Ok(msg)
    }

    /// Multi-line rendering of the header line and every IE tree.
    pub fn dump(&self, max_depth: usize) -> String {
        let mut out = format!(
            "{} ({}) seq={}",
            self.name(),
            self.header.message_type,
            self.header.sequence_number
        );
        if let Some(seid) = self.header.seid {
            out.push_str(&format!(" seid={seid:#x}"));
        }
        out.push('\n');
        for ie in self.ies() {
            out.push_str(&ie.dump(max_depth));
        }
        out
    }
}

/// Parse one message from a borrowed buffer. The input is copied once.
pub fn parse_message(data: &[u8]) -> PfcpResult<Message> {
    let mut buf = Bytes::copy_from_slice(data);
    Message::decode(&mut buf)
}
