//! Container-aware field lookup
//!
//! A field is read with a single accessor no matter where it sits. Given an
//! IE, the accessor decodes it directly when it already is the field, or
//! descends through the field's fixed list of carrier hops. Carrier paths are
//! data on each field type, never a generic tree walk, so a same-typed IE at
//! an unintended depth is never matched.

use std::fmt::Debug;

use bytes::BytesMut;

use crate::catalogue::Encoding;
use crate::error::{PfcpError, PfcpResult};
use crate::ie::{Ie, IeType};

/// One step of a carrier path: inside `carrier`, continue into the first
/// child whose type is listed in `next`.
///
/// `next` names further carriers, and the field's own type wherever the field
/// may legally appear at that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub carrier: IeType,
    pub next: &'static [IeType],
}

impl Hop {
    pub const fn new(carrier: IeType, next: &'static [IeType]) -> Self {
        Self { carrier, next }
    }

    fn leads_to(&self, ie_type: u16) -> bool {
        self.next.iter().any(|t| *t as u16 == ie_type)
    }
}

/// A typed IE payload with its codec and legal carriers.
pub trait IeValue: Sized + Debug {
    /// Leaf IE type
    const IE_TYPE: IeType;
    /// Field name used in errors
    const NAME: &'static str;
    /// Payload encoding kind
    const ENCODING: Encoding;
    /// Grouped IEs this field may be nested in
    const CARRIERS: &'static [Hop] = &[];

    /// Decode from the IE payload (without the IE header).
    fn decode(payload: &[u8]) -> PfcpResult<Self>;

    /// Append the IE payload (without the IE header).
    fn encode(&self, buf: &mut BytesMut) -> PfcpResult<()>;
}

fn hop_for<F: IeValue>(ie_type: u16) -> Option<&'static Hop> {
    F::CARRIERS.iter().find(|hop| hop.carrier as u16 == ie_type)
}

/// True when `ie_type` is the field itself or one of its carriers.
pub fn can_carry<F: IeValue>(ie_type: u16) -> bool {
    ie_type == F::IE_TYPE as u16 || hop_for::<F>(ie_type).is_some()
}

/// Read the first occurrence of `F` from `ie`.
///
/// - `ie` is `F`: the payload is decoded.
/// - `ie` is a carrier of `F`: the first child on the path is followed.
/// - Otherwise `WrongCarrier`.
///
/// `Ok(None)` means the carrier is valid and the field is absent.
pub fn find<F: IeValue>(ie: &Ie) -> PfcpResult<Option<F>> {
    if ie.ie_type() == F::IE_TYPE as u16 {
        return F::decode(ie.payload()).map(Some);
    }

    let hop = hop_for::<F>(ie.ie_type()).ok_or(PfcpError::WrongCarrier {
        field: F::NAME,
        ie_type: ie.ie_type(),
    })?;

    for child in ie.children()? {
        if hop.leads_to(child.ie_type()) {
            return find::<F>(&child);
        }
    }

    Ok(None)
}

/// Read every occurrence of `F` reachable along its carrier paths, in wire
/// order.
pub fn find_all<F: IeValue>(ie: &Ie) -> PfcpResult<Vec<F>> {
    let mut out = Vec::new();
    collect::<F>(ie, &mut out)?;
    Ok(out)
}

fn collect<F: IeValue>(ie: &Ie, out: &mut Vec<F>) -> PfcpResult<()> {
    if ie.ie_type() == F::IE_TYPE as u16 {
        out.push(F::decode(ie.payload())?);
        return Ok(());
    }

    let hop = hop_for::<F>(ie.ie_type()).ok_or(PfcpError::WrongCarrier {
        field: F::NAME,
        ie_type: ie.ie_type(),
    })?;

    for child in ie.children()? {
        if hop.leads_to(child.ie_type()) {
            collect::<F>(&child, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EthernetFilterId, PdrId, PfcpCause, Precedence, SdfFilter};

    fn filter(id: u32) -> Ie {
        Ie::grouped(
            IeType::EthernetPacketFilter,
            &[Ie::from_value(&EthernetFilterId(id)).unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn test_leaf_decodes_directly() {
        let ie = Ie::from_value(&PdrId(7)).unwrap();
        assert_eq!(find::<PdrId>(&ie).unwrap(), Some(PdrId(7)));
    }

    #[test]
    fn test_three_level_search() {
        let _ = env_logger::try_init();
        let pdi = Ie::grouped(IeType::Pdi, &[filter(0xAABBCCDD)]).unwrap();
        let pdr = Ie::grouped(IeType::CreatePdr, &[Ie::from_value(&PdrId(1)).unwrap(), pdi]).unwrap();
        assert_eq!(pdr.get::<EthernetFilterId>().unwrap(), Some(EthernetFilterId(0xAABBCCDD)));
        assert_eq!(pdr.get::<PdrId>().unwrap(), Some(PdrId(1)));
    }

    #[test]
    fn test_absent_is_not_an_error() {
        let pdi = Ie::grouped(IeType::Pdi, &[]).unwrap();
        let pdr = Ie::grouped(IeType::CreatePdr, &[pdi]).unwrap();
        assert_eq!(pdr.get::<EthernetFilterId>().unwrap(), None);
        assert_eq!(pdr.get::<Precedence>().unwrap(), None);
    }

    #[test]
    fn test_wrong_carrier() {
        let cause = Ie::from_value(&PfcpCause::RequestAccepted).unwrap();
        assert_eq!(
            cause.get::<EthernetFilterId>(),
            Err(PfcpError::WrongCarrier { field: "Ethernet Filter ID", ie_type: 19 })
        );
    }

    #[test]
    fn test_leaf_at_unlisted_depth_is_not_matched() {
        // Ethernet Filter ID placed directly in the PDI is not on its path
        let stray = Ie::from_value(&EthernetFilterId(5)).unwrap();
        let pdi = Ie::grouped(IeType::Pdi, &[stray]).unwrap();
        assert_eq!(pdi.get::<EthernetFilterId>().unwrap(), None);
    }

    #[test]
    fn test_find_all_collects_repeats() {
        let pdi = Ie::grouped(IeType::Pdi, &[filter(1), filter(2)]).unwrap();
        let pdr = Ie::grouped(IeType::CreatePdr, &[pdi]).unwrap();
        assert_eq!(
            pdr.get_all::<EthernetFilterId>().unwrap(),
            vec![EthernetFilterId(1), EthernetFilterId(2)]
        );
        assert_eq!(pdr.get::<EthernetFilterId>().unwrap(), Some(EthernetFilterId(1)));
        assert!(pdr.get_all::<SdfFilter>().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_carrier_payload() {
        let pdr = Ie::new(IeType::CreatePdr, vec![0x00, 0x38, 0x00]);
        assert!(matches!(
            pdr.get::<PdrId>(),
            Err(PfcpError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_can_carry() {
        assert!(can_carry::<EthernetFilterId>(IeType::CreatePdr as u16));
        assert!(can_carry::<EthernetFilterId>(IeType::EthernetFilterId as u16));
        assert!(!can_carry::<EthernetFilterId>(IeType::CreateFar as u16));
    }
}
