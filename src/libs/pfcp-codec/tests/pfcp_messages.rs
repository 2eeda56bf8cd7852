//! PFCP Message Integration Tests
//!
//! N4 session flows built and parsed through the public API, checked
//! against hand-assembled wire octets.

use std::net::Ipv4Addr;

use anyhow::Result;
use pfcp_codec::prelude::*;
use pfcp_codec::types::{EthernetFilterId, MacAddress, SdfFilter};
use pfcp_codec::{catalogue, field};

const SMF_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
const UPF_ADDR: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Create PDR { PDR ID, Precedence, PDI { Source Interface, F-TEID, SDF Filter,
/// Ethernet Packet Filter { Ethernet Filter ID, MAC Address } }, FAR ID }
fn create_pdr(pdr_id: u16, teid: u32, mac: [u8; 6]) -> Result<Ie> {
    let packet_filter = Ie::grouped(
        IeType::EthernetPacketFilter,
        &[
            Ie::from_value(&EthernetFilterId(pdr_id as u32))?,
            Ie::from_value(&MacAddress { source: Some(mac), ..Default::default() })?,
        ],
    )?;
    let pdi = Ie::grouped(
        IeType::Pdi,
        &[
            Ie::from_value(&SourceInterface::Access)?,
            Ie::from_value(&FTeid::new_ipv4(teid, UPF_ADDR))?,
            Ie::from_value(&SdfFilter::from_flow_description("permit out ip from any to assigned"))?,
            packet_filter,
        ],
    )?;
    Ok(Ie::grouped(
        IeType::CreatePdr,
        &[
            Ie::from_value(&PdrId(pdr_id))?,
            Ie::from_value(&Precedence(255))?,
            pdi,
            Ie::from_value(&FarId(pdr_id as u32))?,
        ],
    )?)
}

#[test]
fn test_session_establishment_response_wire_format() -> Result<()> {
    init();

    let mut msg = Message::new_session(PfcpMessageType::SessionEstablishmentResponse, 0x1234, 0x000102);
    msg.add_value(&NodeId::Ipv4(UPF_ADDR))?;
    msg.add_value(&PfcpCause::RequestAccepted)?;
    msg.add_value(&FSeid::new_ipv4(0x0A0B, UPF_ADDR))?;

    let bytes = msg.marshal()?;
    let expected: Vec<u8> = [
        &[0x21, 0x33, 0x00, 0x2B][..],
        &[0, 0, 0, 0, 0, 0, 0x12, 0x34],
        &[0x00, 0x01, 0x02, 0x00],
        // Node ID
        &[0x00, 0x3C, 0x00, 0x05, 0x00, 10, 0, 0, 2],
        // Cause
        &[0x00, 0x13, 0x00, 0x01, 0x01],
        // F-SEID
        &[0x00, 0x39, 0x00, 0x0D, 0x02, 0, 0, 0, 0, 0, 0, 0x0A, 0x0B, 10, 0, 0, 2],
    ]
    .concat();
    assert_eq!(&bytes[..], &expected[..]);

    let decoded = parse_message(&bytes)?;
    assert_eq!(decoded.seid(), Some(0x1234));
    assert_eq!(decoded.require("cause")?.payload().as_ref(), &[0x01]);
    assert!(decoded.get::<PfcpCause>()?.is_some_and(|c| c.is_success()));
    assert_eq!(decoded.get::<FSeid>()?.and_then(|f| f.ipv4_addr), Some(UPF_ADDR));
    Ok(())
}

#[test]
fn test_session_establishment_response_cause_only() -> Result<()> {
    init();

    let mut msg = Message::new_session(
        PfcpMessageType::SessionEstablishmentResponse,
        0x0102030405060708,
        0x0A0B0C,
    );
    msg.add_value(&PfcpCause::RequestAccepted)?;

    let bytes = msg.marshal()?;
    // Length counts the sequence/spare word, the SEID and the 5-octet Cause IE
    let expected = [
        0x21, 0x33, 0x00, 0x11,
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        0x0A, 0x0B, 0x0C, 0x00,
        0x00, 0x13, 0x00, 0x01, 0x01,
    ];
    assert_eq!(&bytes[..], &expected[..]);
    assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]) as usize, 4 + 8 + 5);

    let decoded = parse_message(&bytes)?;
    assert_eq!(decoded.header().length, 0x11);
    assert_eq!(decoded.seid(), Some(0x0102030405060708));
    assert_eq!(decoded.sequence_number(), 0x0A0B0C);
    assert_eq!(decoded.get::<PfcpCause>()?, Some(PfcpCause::RequestAccepted));
    assert_eq!(decoded.ies().count(), 1);
    assert_eq!(decoded.marshal()?, bytes);
    Ok(())
}

#[test]
fn test_nested_search_through_session_establishment_request() -> Result<()> {
    init();

    let mac_a = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
    let mac_b = [0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB];

    let mut msg = Message::new_session(PfcpMessageType::SessionEstablishmentRequest, 0, 1);
    msg.add_value(&NodeId::Ipv4(SMF_ADDR))?;
    msg.add_value(&FSeid::new_ipv4(0x1001, SMF_ADDR))?;
    msg.add(create_pdr(1, 0x100, mac_a)?);
    msg.add(create_pdr(2, 0x200, mac_b)?);

    let decoded = parse_message(&msg.marshal()?)?;
    assert_eq!(decoded.slot_all("create_pdr").len(), 2);

    // Create PDR > PDI > Ethernet Packet Filter > MAC Address
    let macs: Vec<_> = decoded
        .get_all::<MacAddress>()?
        .into_iter()
        .filter_map(|m| m.source)
        .collect();
    assert_eq!(macs, vec![mac_a, mac_b]);

    let second = &decoded.slot_all("create_pdr")[1];
    assert_eq!(field::find::<EthernetFilterId>(second)?, Some(EthernetFilterId(2)));
    assert_eq!(field::find::<FTeid>(second)?.and_then(|f| f.teid), Some(0x200));
    assert_eq!(field::find::<FarId>(second)?, Some(FarId(2)));

    // A PDR carries no UE IP address here: valid carrier, field absent
    assert_eq!(field::find::<UeIpAddress>(second)?, None);

    // Node ID cannot hold a PDR ID
    let node = decoded.require("node_id")?;
    assert!(matches!(field::find::<PdrId>(node), Err(PfcpError::WrongCarrier { .. })));
    Ok(())
}

#[test]
fn test_heartbeat_exchange() -> Result<()> {
    init();

    let ts = RecoveryTimeStamp::now()?;
    let mut request = Message::new(PfcpMessageType::HeartbeatRequest, 42);
    request.add_value(&ts)?;

    let received = parse_message(&request.marshal()?)?;
    assert_eq!(received.known_type(), Some(PfcpMessageType::HeartbeatRequest));

    let mut response = Message::new(PfcpMessageType::HeartbeatResponse, received.sequence_number());
    response.add_value(&ts)?;
    let answer = parse_message(&response.marshal()?)?;

    assert_eq!(answer.sequence_number(), 42);
    assert_eq!(answer.get::<RecoveryTimeStamp>()?, Some(ts));
    Ok(())
}

#[test]
fn test_unknown_and_vendor_ies_survive_relay() -> Result<()> {
    init();

    let mut msg = Message::new(PfcpMessageType::AssociationSetupRequest, 3);
    msg.add_value(&NodeId::Fqdn("smf.example.org".to_string()))?;
    msg.add_value(&RecoveryTimeStamp::now()?)?;
    msg.add(Ie::vendor_specific(0x8001, 10415, &[0xDE, 0xAD]));
    msg.add(Ie::new(0x7F00u16, vec![1u8, 2, 3]));

    let bytes = msg.marshal()?;
    let relayed = parse_message(&bytes)?;
    assert_eq!(relayed.extra().len(), 2);
    assert_eq!(relayed.extra()[0].enterprise_id()?, 10415);
    assert_eq!(relayed.marshal()?, bytes);
    Ok(())
}

#[test]
fn test_unknown_message_type_round_trips() -> Result<()> {
    init();

    let data = [
        0x21, 0xC8, 0x00, 0x11, // version 1, S, type 200, length 17
        0, 0, 0, 0, 0, 0, 0, 9, // SEID
        0x00, 0x00, 0x05, 0x00, // sequence 5
        0x00, 0x13, 0x00, 0x01, 0x01, // Cause
    ];
    let msg = parse_message(&data)?;
    assert_eq!(msg.known_type(), None);
    assert!(msg.shape().is_none());
    assert_eq!(msg.extra().len(), 1);
    assert_eq!(&msg.marshal()?[..], &data[..]);
    Ok(())
}

#[test]
fn test_catalogue_dump_names_every_ie() -> Result<()> {
    init();

    let mut msg = Message::new_session(PfcpMessageType::SessionEstablishmentRequest, 0, 1);
    msg.add(create_pdr(1, 0x100, [0; 6])?);
    let dump = PfcpCodec::default().dump(&msg);

    for ie_type in [IeType::CreatePdr, IeType::Pdi, IeType::EthernetPacketFilter, IeType::MacAddress] {
        let name = catalogue::ie_name(ie_type as u16);
        assert!(dump.contains(name), "{name} missing from dump:\n{dump}");
    }
    Ok(())
}

#[test]
fn test_truncated_datagram_rejected() -> Result<()> {
    init();

    let mut msg = Message::new(PfcpMessageType::HeartbeatRequest, 1);
    msg.add_value(&RecoveryTimeStamp::now()?)?;
    let bytes = msg.marshal()?;

    for cut in 0..bytes.len() {
        assert!(parse_message(&bytes[..cut]).is_err(), "accepted {cut} octets");
    }
    Ok(())
}
