//! PFCP Grouped IE Fuzzer
//!
//! Feeds arbitrary bytes to the sibling parser as the payload of a Create PDR
//! and runs the carrier-path accessors over it.
//!
//! Run with: cargo +nightly fuzz run fuzz_pfcp_grouped_ie

#![no_main]

use libfuzzer_sys::fuzz_target;
use pfcp_codec::field;
use pfcp_codec::ie::{parse_siblings, Ie, IeType};
use pfcp_codec::types::{FTeid, MacAddress, PdrId, SdfFilter, UeIpAddress};

fuzz_target!(|data: &[u8]| {
    let _ = parse_siblings(bytes::Bytes::copy_from_slice(data));

    let pdr = Ie::new(IeType::CreatePdr, data.to_vec());
    let _ = field::find::<PdrId>(&pdr);
    let _ = field::find_all::<FTeid>(&pdr);
    let _ = field::find_all::<UeIpAddress>(&pdr);
    let _ = field::find_all::<SdfFilter>(&pdr);
    let _ = field::find_all::<MacAddress>(&pdr);
    let _ = pdr.dump(8);
});
