//! IE catalogue
//!
//! Process-wide table keyed by IE type code: name, payload encoding, carrier
//! hops and a typed renderer for diagnostics. Built once on first use and
//! read-only afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::PfcpResult;
use crate::field::{Hop, IeValue};
use crate::ie::{IE_TYPES, VENDOR_SPECIFIC_BIT};
use crate::types;

/// Payload encoding kinds every concrete IE is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Concatenated child IEs
    Grouped,
    /// Fixed-width integer or enumerated value
    Scalar,
    /// Fixed-width set of independent flag bits
    Bitmap,
    /// Flags byte selecting which sub-fields follow
    FlagConditional,
    /// Several sub-byte fields sharing octets
    BitPacked,
    /// NTP-epoch seconds
    Timestamp,
    /// 24- or 40-bit integers
    WideInteger,
    /// Swapped-nibble decimal digits
    Digits,
    /// Selector byte choosing the layout of the rest
    Discriminated,
    /// Count byte followed by fixed-size entries
    CountedList,
    /// Octet string or DNS-label name
    Text,
    /// No typed codec in this crate
    Opaque,
}

type Describe = fn(&[u8]) -> PfcpResult<String>;

/// Catalogue entry for one IE type
#[derive(Debug, Clone)]
pub struct CatalogueEntry {
    pub ie_type: u16,
    pub name: &'static str,
    pub encoding: Encoding,
    pub carriers: &'static [Hop],
    describe: Option<Describe>,
}

impl CatalogueEntry {
    pub fn is_grouped(&self) -> bool {
        self.encoding == Encoding::Grouped
    }

    /// Decode with the typed codec and render with `Debug`.
    pub fn describe(&self, payload: &[u8]) -> Option<PfcpResult<String>> {
        self.describe.map(|f| f(payload))
    }

    pub fn has_codec(&self) -> bool {
        self.describe.is_some()
    }
}

/// Registration record for a typed codec
pub(crate) struct Typed {
    ie_type: u16,
    encoding: Encoding,
    carriers: &'static [Hop],
    describe: Describe,
}

fn describe_as<F: IeValue>(payload: &[u8]) -> PfcpResult<String> {
    F::decode(payload).map(|v| format!("{v:?}"))
}

pub(crate) fn typed<F: IeValue>() -> Typed {
    Typed {
        ie_type: F::IE_TYPE as u16,
        encoding: F::ENCODING,
        carriers: F::CARRIERS,
        describe: describe_as::<F>,
    }
}

static CATALOGUE: LazyLock<HashMap<u16, CatalogueEntry>> = LazyLock::new(build);

fn build() -> HashMap<u16, CatalogueEntry> {
    let mut map = HashMap::with_capacity(IE_TYPES.len());

    for &(ie_type, name, grouped) in IE_TYPES {
        map.insert(
            ie_type as u16,
            CatalogueEntry {
                ie_type: ie_type as u16,
                name,
                encoding: if grouped { Encoding::Grouped } else { Encoding::Opaque },
                carriers: &[],
                describe: None,
            },
        );
    }

    for t in types::registry() {
        if let Some(entry) = map.get_mut(&t.ie_type) {
            entry.encoding = t.encoding;
            entry.carriers = t.carriers;
            entry.describe = Some(t.describe);
        }
    }

    log::debug!("IE catalogue built: {} types", map.len());
    map
}

/// Catalogue entry for a type code
pub fn lookup(ie_type: u16) -> Option<&'static CatalogueEntry> {
    CATALOGUE.get(&ie_type)
}

/// All entries, in no particular order
pub fn entries() -> impl Iterator<Item = &'static CatalogueEntry> {
    CATALOGUE.values()
}

pub fn ie_name(ie_type: u16) -> &'static str {
    match lookup(ie_type) {
        Some(entry) => entry.name,
        None if ie_type & VENDOR_SPECIFIC_BIT != 0 => "Vendor-Specific",
        None => "Unknown",
    }
}

pub fn is_grouped(ie_type: u16) -> bool {
    lookup(ie_type).is_some_and(CatalogueEntry::is_grouped)
}

/// Render a payload with its typed codec, if the type has one.
pub fn describe(ie_type: u16, payload: &[u8]) -> Option<PfcpResult<String>> {
    lookup(ie_type).and_then(|entry| entry.describe(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ie::IeType;

    #[test]
    fn test_all_standard_types_present() {
        assert_eq!(entries().count(), 256);
        for code in 1..=256u16 {
            assert!(lookup(code).is_some(), "missing IE type {code}");
        }
        assert!(lookup(0).is_none());
    }

    #[test]
    fn test_names() {
        assert_eq!(ie_name(19), "Cause");
        assert_eq!(ie_name(138), "Ethernet Filter ID");
        assert_eq!(ie_name(0x8001), "Vendor-Specific");
        assert_eq!(ie_name(1000), "Unknown");
    }

    #[test]
    fn test_typed_entries() {
        let fteid = lookup(IeType::FTeid as u16).unwrap();
        assert_eq!(fteid.encoding, Encoding::FlagConditional);
        assert!(fteid.has_codec());
        assert!(!fteid.carriers.is_empty());

        let pdr = lookup(IeType::CreatePdr as u16).unwrap();
        assert!(pdr.is_grouped());
        assert!(!pdr.has_codec());
    }

    #[test]
    fn test_describe() {
        let text = describe(IeType::PdrId as u16, &[0x00, 0x05]).unwrap().unwrap();
        assert_eq!(text, "PdrId(5)");
        assert!(describe(IeType::PdrId as u16, &[0x00]).unwrap().is_err());
        assert!(describe(IeType::CreatePdr as u16, &[]).is_none());
    }

    #[test]
    fn test_every_carrier_is_grouped() {
        for entry in entries() {
            for hop in entry.carriers {
                assert!(
                    is_grouped(hop.carrier as u16),
                    "{} lists non-grouped carrier {:?}",
                    entry.name,
                    hop.carrier
                );
            }
        }
    }

    #[test]
    fn test_every_path_step_resolves() {
        // Each `next` type is either the leaf itself or another carrier of it
        for entry in entries() {
            for hop in entry.carriers {
                for next in hop.next {
                    let code = *next as u16;
                    let ok = code == entry.ie_type
                        || entry.carriers.iter().any(|h| h.carrier as u16 == code);
                    assert!(ok, "{}: {:?} leads nowhere", entry.name, next);
                }
            }
        }
    }
}
