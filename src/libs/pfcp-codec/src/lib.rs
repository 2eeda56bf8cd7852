//! PFCP Codec Library
//!
//! Encoding and decoding of PFCP (Packet Forwarding Control Protocol) messages
//! and information elements as specified in 3GPP TS 29.244.
//!
//! Every IE is kept as its raw type and payload, so unknown and vendor-specific
//! IEs survive a decode/encode cycle unchanged. Typed values are read on demand
//! through [`IeValue`], either from the IE itself or from inside the grouped IEs
//! that may carry it.
//!
//! # Features
//!
//! - PFCP header encoding/decoding with SEID, priority and follow-on flags
//! - Sibling IE parsing and grouped IE nesting
//! - Typed codecs for scalar, bitmap, flag-conditional and discriminated IEs
//! - Catalogue of all IE types with name, encoding and grouping
//! - Message dispatch into per-type slots for all 25 message types
//!
//! # Example
//!
//! ```rust
//! use pfcp_codec::prelude::*;
//!
//! let mut msg = Message::new(PfcpMessageType::HeartbeatRequest, 1);
//! msg.add_value(&RecoveryTimeStamp(3_900_000_000)).unwrap();
//!
//! let bytes = msg.marshal().unwrap();
//! let decoded = parse_message(&bytes).unwrap();
//! assert_eq!(decoded.get::<RecoveryTimeStamp>().unwrap(), Some(RecoveryTimeStamp(3_900_000_000)));
//! ```

pub mod catalogue;
pub mod codec;
pub mod config;
pub mod error;
pub mod field;
pub mod header;
pub mod ie;
pub mod message;
pub mod types;
pub mod util;

#[cfg(test)]
mod property_tests;

pub use catalogue::{CatalogueEntry, Encoding};
pub use codec::PfcpCodec;
pub use config::{CodecConfig, ConfigError};
pub use error::{PfcpError, PfcpResult};
pub use field::{Hop, IeValue};
pub use header::{PfcpHeader, PfcpMessageType, PFCP_HEADER_LEN, PFCP_HEADER_LEN_WITH_SEID};
pub use ie::{parse_siblings, Ie, IeType};
pub use message::{parse_message, Message, MessageShape, Slot};
pub use types::{PFCP_UDP_PORT, PFCP_VERSION};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::codec::PfcpCodec;
    pub use crate::config::CodecConfig;
    pub use crate::error::{PfcpError, PfcpResult};
    pub use crate::field::IeValue;
    pub use crate::header::{PfcpHeader, PfcpMessageType};
    pub use crate::ie::{parse_siblings, Ie, IeType};
    pub use crate::message::{parse_message, Message};
    pub use crate::types::{
        ApplyAction,
        BarId,
        CpFunctionFeatures,
        DestinationInterface,
        FSeid,
        FTeid,
        FarId,
        GateStatus,
        NetworkInstance,
        NodeId,
        OuterHeaderCreation,
        OuterHeaderRemoval,
        PdrId,
        PfcpCause,
        Precedence,
        QerId,
        RecoveryTimeStamp,
        ReportType,
        ReportingTriggers,
        SourceInterface,
        UeIpAddress,
        UpFunctionFeatures,
        UrrId,
        UsageReportTrigger,
        VolumeMeasurement,
        VolumeThreshold,
    };
}
