//! Property-Based Tests for PFCP Codec
//!
//! Round trips for flag-conditional IEs and headers, re-encoding of typed
//! values decoded from arbitrary payloads, the IE length invariant, and
//! robustness of the sibling and message parsers against arbitrary input.

use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;

use crate::field::IeValue;
use crate::header::{PfcpHeader, MAX_PRIORITY, MAX_SEQUENCE_NUMBER};
use crate::ie::{parse_siblings, Ie, IeType};
use crate::message::parse_message;
use crate::types::{
    ApplyAction, CTag, DownlinkDataServiceInformation, FSeid, FTeid, MacAddress,
    MacAddressesDetected, MacAddressesRemoved, OuterHeaderCreation, PdrId, STag, SdfFilter,
    UeIpAddress, UserId, VlanTag, VolumeMeasurement, VolumeThreshold,
};

fn ipv4() -> impl Strategy<Value = Ipv4Addr> {
    any::<u32>().prop_map(Ipv4Addr::from)
}

fn ipv6() -> impl Strategy<Value = Ipv6Addr> {
    any::<u128>().prop_map(Ipv6Addr::from)
}

fn vlan_tag() -> impl Strategy<Value = VlanTag> {
    (
        proptest::option::of(0u8..=7),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0u16..=0x0FFF),
    )
        .prop_map(|(pcp, dei, vid)| VlanTag { pcp, dei, vid })
}

fn round_trip<F: IeValue + PartialEq>(value: &F) -> Result<(), TestCaseError> {
    let ie = Ie::from_value(value).map_err(|e| TestCaseError::fail(e.to_string()))?;
    let decoded = F::decode(ie.payload()).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(&decoded, value);
    Ok(())
}

/// Whatever a payload decodes to must encode and decode back to itself.
fn decoded_value_re_encodes<F: IeValue + PartialEq>(data: &[u8]) -> Result<(), TestCaseError> {
    match F::decode(data) {
        Ok(value) => round_trip(&value),
        Err(_) => Ok(()),
    }
}

// ========================================================================
// Flag-conditional IE round trips
// ========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_fseid_round_trip(
        seid in any::<u64>(),
        v4 in proptest::option::of(ipv4()),
        v6 in proptest::option::of(ipv6()),
    ) {
        let fseid = FSeid {
            v4: v4.is_some(),
            v6: v6.is_some(),
            seid,
            ipv4_addr: v4,
            ipv6_addr: v6,
        };
        round_trip(&fseid)?;
    }

    #[test]
    fn prop_fteid_round_trip(
        teid in any::<u32>(),
        v4 in proptest::option::of(ipv4()),
        v6 in proptest::option::of(ipv6()),
    ) {
        let fteid = FTeid {
            v4: v4.is_some(),
            v6: v6.is_some(),
            teid: Some(teid),
            ipv4_addr: v4,
            ipv6_addr: v6,
            ..Default::default()
        };
        round_trip(&fteid)?;
    }

    #[test]
    fn prop_fteid_choose_round_trip(
        v4 in any::<bool>(),
        v6 in any::<bool>(),
        choose_id in proptest::option::of(any::<u8>()),
    ) {
        round_trip(&FTeid::new_choose(v4, v6, choose_id))?;
    }

    #[test]
    fn prop_ue_ip_address_round_trip(
        flags in proptest::array::uniform7(any::<bool>()),
        v4_addr in ipv4(),
        v6_addr in ipv6(),
        delegation_bits in any::<u8>(),
        prefix_length in any::<u8>(),
    ) {
        let [v4, v6, sd, ipv6d, chv4, chv6, ip6pl] = flags;
        let ue_ip = UeIpAddress {
            v4,
            v6,
            sd,
            ipv6d,
            chv4,
            chv6,
            ip6pl,
            ipv4_addr: (v4 && !chv4).then_some(v4_addr),
            ipv6_addr: (v6 && !chv6).then_some(v6_addr),
            ipv6_prefix_delegation_bits: ipv6d.then_some(delegation_bits),
            ipv6_prefix_length: ip6pl.then_some(prefix_length),
        };
        round_trip(&ue_ip)?;
    }

    #[test]
    fn prop_outer_header_creation_round_trip(
        high in any::<u8>(),
        low in 0u16..=3,
        teid in any::<u32>(),
        v4_addr in ipv4(),
        v6_addr in ipv6(),
        port in any::<u16>(),
        c_tag in vlan_tag(),
        s_tag in vlan_tag(),
    ) {
        type Ohc = OuterHeaderCreation;
        let description = ((high as u16) << 8) | low;
        let has = |bits: u16| description & bits != 0;
        let ohc = Ohc {
            description,
            teid: has(Ohc::GTPU_UDP_IPV4 | Ohc::GTPU_UDP_IPV6).then_some(teid),
            ipv4_addr: has(Ohc::GTPU_UDP_IPV4 | Ohc::UDP_IPV4 | Ohc::IPV4).then_some(v4_addr),
            ipv6_addr: has(Ohc::GTPU_UDP_IPV6 | Ohc::UDP_IPV6 | Ohc::IPV6).then_some(v6_addr),
            port_number: has(Ohc::UDP_IPV4 | Ohc::UDP_IPV6).then_some(port),
            c_tag: has(Ohc::C_TAG).then_some(c_tag),
            s_tag: has(Ohc::S_TAG).then_some(s_tag),
        };
        round_trip(&ohc)?;
    }

    #[test]
    fn prop_sdf_filter_round_trip(
        flow_description in proptest::option::of("[ -~]{0,64}"),
        tos_traffic_class in proptest::option::of(any::<u16>()),
        security_parameter_index in proptest::option::of(any::<u32>()),
        flow_label in proptest::option::of(0u32..=0xF_FFFF),
        sdf_filter_id in proptest::option::of(any::<u32>()),
    ) {
        round_trip(&SdfFilter {
            flow_description,
            tos_traffic_class,
            security_parameter_index,
            flow_label,
            sdf_filter_id,
        })?;
    }

    #[test]
    fn prop_mac_address_round_trip(
        macs in proptest::array::uniform4(proptest::option::of(any::<[u8; 6]>())),
    ) {
        let [source, destination, upper_source, upper_destination] = macs;
        round_trip(&MacAddress { source, destination, upper_source, upper_destination })?;
    }

    #[test]
    fn prop_volume_threshold_round_trip(
        values in proptest::array::uniform3(proptest::option::of(any::<u64>())),
    ) {
        let [total_volume, uplink_volume, downlink_volume] = values;
        round_trip(&VolumeThreshold { total_volume, uplink_volume, downlink_volume })?;
    }

    #[test]
    fn prop_downlink_data_service_information_round_trip(
        ppi in proptest::option::of(0u8..=0x3F),
        qfi in proptest::option::of(0u8..=0x3F),
    ) {
        round_trip(&DownlinkDataServiceInformation { ppi, qfi })?;
    }

    #[test]
    fn prop_user_id_round_trip(
        imsi in proptest::option::of("[0-9]{0,15}"),
        imei in proptest::option::of("[0-9]{0,16}"),
        msisdn in proptest::option::of("[0-9]{0,15}"),
        nai in proptest::option::of("[a-z0-9@.]{0,40}"),
    ) {
        round_trip(&UserId { imsi, imei, msisdn, nai })?;
    }

    #[test]
    fn prop_vlan_tags_round_trip(c_tag in vlan_tag(), s_tag in vlan_tag()) {
        round_trip(&CTag(c_tag))?;
        round_trip(&STag(s_tag))?;
    }

    #[test]
    fn prop_apply_action_round_trip(flags in proptest::array::uniform11(any::<bool>())) {
        let [drop, forw, buff, nocp, dupl, ipma, ipmd, dfrt, edrt, bdpn, ddpn] = flags;
        round_trip(&ApplyAction {
            drop,
            forw,
            buff,
            nocp,
            dupl,
            ipma,
            ipmd,
            dfrt,
            edrt,
            bdpn,
            ddpn,
        })?;
    }

    #[test]
    fn prop_mac_address_lists_round_trip(
        macs in proptest::collection::vec(any::<[u8; 6]>(), 0..16),
        c_tag in proptest::option::of(vlan_tag()),
        s_tag in proptest::option::of(vlan_tag()),
    ) {
        let mut detected = MacAddressesDetected::new(macs.clone()).unwrap();
        detected.c_tag = c_tag;
        detected.s_tag = s_tag;
        round_trip(&detected)?;

        let mut removed = MacAddressesRemoved::new(macs).unwrap();
        removed.c_tag = c_tag;
        removed.s_tag = s_tag;
        round_trip(&removed)?;
    }

    #[test]
    fn prop_volume_measurement_round_trip(
        values in proptest::array::uniform6(proptest::option::of(any::<u64>())),
    ) {
        let [total_volume, uplink_volume, downlink_volume, total_packets, uplink_packets, downlink_packets] =
            values;
        round_trip(&VolumeMeasurement {
            total_volume,
            uplink_volume,
            downlink_volume,
            total_packets,
            uplink_packets,
            downlink_packets,
        })?;
    }
}

// ========================================================================
// Typed decode of arbitrary payloads
// ========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_flag_conditional_decode_re_encodes(
        data in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        decoded_value_re_encodes::<FSeid>(&data)?;
        decoded_value_re_encodes::<FTeid>(&data)?;
        decoded_value_re_encodes::<UeIpAddress>(&data)?;
        decoded_value_re_encodes::<OuterHeaderCreation>(&data)?;
        decoded_value_re_encodes::<SdfFilter>(&data)?;
        decoded_value_re_encodes::<MacAddress>(&data)?;
        decoded_value_re_encodes::<VolumeThreshold>(&data)?;
        decoded_value_re_encodes::<VolumeMeasurement>(&data)?;
        decoded_value_re_encodes::<DownlinkDataServiceInformation>(&data)?;
        decoded_value_re_encodes::<UserId>(&data)?;
    }

    #[test]
    fn prop_bitmap_and_list_decode_re_encodes(
        data in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        decoded_value_re_encodes::<ApplyAction>(&data)?;
        decoded_value_re_encodes::<CTag>(&data)?;
        decoded_value_re_encodes::<STag>(&data)?;
        decoded_value_re_encodes::<MacAddressesDetected>(&data)?;
        decoded_value_re_encodes::<MacAddressesRemoved>(&data)?;
    }

    #[test]
    fn prop_fteid_flag_combinations_re_encode(
        flags in 0u8..16,
        body in proptest::collection::vec(any::<u8>(), 0..24),
    ) {
        let mut data = vec![flags];
        data.extend(body);
        decoded_value_re_encodes::<FTeid>(&data)?;
    }
}

// ========================================================================
// Length invariant and parser robustness
// ========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_ie_length_matches_payload(
        ie_type in any::<u16>(),
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let ie = Ie::new(ie_type, payload.clone());
        let mut buf = BytesMut::new();
        ie.encode(&mut buf).unwrap();

        prop_assert_eq!(buf.len(), ie.encoded_len());
        prop_assert_eq!(u16::from_be_bytes([buf[2], buf[3]]) as usize, payload.len());
        prop_assert_eq!(&buf[4..], &payload[..]);
    }

    #[test]
    fn prop_grouped_length_covers_children(ids in proptest::collection::vec(any::<u16>(), 0..16)) {
        let children: Vec<Ie> = ids.iter().map(|id| Ie::from_value(&PdrId(*id)).unwrap()).collect();
        let group = Ie::grouped(IeType::CreatePdr, &children).unwrap();

        prop_assert_eq!(group.payload().len(), children.len() * 6);
        prop_assert_eq!(group.children().unwrap(), children);
    }

    #[test]
    fn prop_siblings_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(ies) = parse_siblings(Bytes::from(data.clone())) {
            let mut buf = BytesMut::new();
            for ie in &ies {
                ie.encode(&mut buf).unwrap();
            }
            prop_assert_eq!(&buf[..], &data[..]);
        }
    }

    #[test]
    fn prop_message_parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_message(&data);
    }
}

// ========================================================================
// Header round trip
// ========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_header_round_trip(
        message_type in any::<u8>(),
        seid in proptest::option::of(any::<u64>()),
        sequence_number in 0u32..=MAX_SEQUENCE_NUMBER,
        priority in proptest::option::of(0u8..=MAX_PRIORITY),
        follow_on in any::<bool>(),
        body_len in 0usize..1024,
    ) {
        let mut header = PfcpHeader::raw(message_type, seid, sequence_number);
        header.priority = priority;
        header.follow_on = follow_on;
        header.set_body_len(body_len).unwrap();

        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();
        prop_assert_eq!(buf.len(), header.header_len());

        let mut bytes = buf.freeze();
        let decoded = PfcpHeader::decode(&mut bytes).unwrap();
        prop_assert_eq!(decoded.body_len().unwrap(), body_len);
        prop_assert_eq!(decoded, header);
        prop_assert!(bytes.is_empty());
    }
}
