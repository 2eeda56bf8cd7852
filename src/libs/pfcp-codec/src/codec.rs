//! Codec facade
//!
//! Applies a [`CodecConfig`] around message parse, marshal and diagnostics.

use bytes::Bytes;

use crate::config::{CodecConfig, ConfigError};
use crate::error::{PfcpError, PfcpResult};
use crate::ie::{Ie, IeType};
use crate::message::Message;
use crate::types::UserId;

/// Configured PFCP codec
#[derive(Debug, Clone, Default)]
pub struct PfcpCodec {
    config: CodecConfig,
}

impl PfcpCodec {
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn check_len(&self, len: usize) -> PfcpResult<()> {
        if len > self.config.max_message_len {
            return Err(PfcpError::MessageTooLarge {
                len,
                max: self.config.max_message_len,
            });
        }
        Ok(())
    }

    /// Parse one message from the front of `data`.
    pub fn parse(&self, data: &[u8]) -> PfcpResult<Message> {
        self.parse_bytes(&mut Bytes::copy_from_slice(data))
    }

    /// Parse one message, advancing `buf` past it.
    ///
    /// The size limit applies to the declared message length, checked before
    /// the body is read.
    pub fn parse_bytes(&self, buf: &mut Bytes) -> PfcpResult<Message> {
        if buf.len() >= 4 {
            let declared = u16::from_be_bytes([buf[2], buf[3]]) as usize + 4;
            self.check_len(declared)?;
        }
        Message::decode_with(buf, self.config.strict_version)
    }

    /// Parse every message of a datagram bundled with the Follow On flag.
    pub fn parse_all(&self, data: &[u8]) -> PfcpResult<Vec<Message>> {
        let mut buf = Bytes::copy_from_slice(data);
        let mut messages = Vec::new();
        while !buf.is_empty() {
            let msg = self.parse_bytes(&mut buf)?;
            let follow_on = msg.header().follow_on;
            messages.push(msg);
            if !follow_on {
                break;
            }
        }
        Ok(messages)
    }

    pub fn marshal(&self, msg: &Message) -> PfcpResult<Bytes> {
        let bytes = msg.marshal()?;
        self.check_len(bytes.len())?;
        Ok(bytes)
    }

    /// Diagnostic rendering, nested up to the configured depth.
    pub fn dump(&self, msg: &Message) -> String {
        msg.dump(self.config.max_dump_depth)
    }

    /// Decode a User ID IE with the configured digit filler policy.
    pub fn user_id(&self, ie: &Ie) -> PfcpResult<UserId> {
        if ie.ie_type() != IeType::UserId as u16 {
            return Err(PfcpError::WrongCarrier {
                field: "User ID",
                ie_type: ie.ie_type(),
            });
        }
        UserId::decode_with(ie.payload(), self.config.strip_digit_filler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::PfcpMessageType;
    use crate::types::{PfcpCause, RecoveryTimeStamp};

    #[test]
    fn test_size_limit() {
        let _ = env_logger::try_init();
        let codec = PfcpCodec::new(CodecConfig { max_message_len: 16, ..Default::default() }).unwrap();

        let mut msg = Message::new(PfcpMessageType::HeartbeatRequest, 1);
        msg.add_value(&RecoveryTimeStamp(1)).unwrap();
        let bytes = codec.marshal(&msg).unwrap();
        assert_eq!(bytes.len(), 16);

        msg.add_value(&PfcpCause::RequestAccepted).unwrap();
        assert_eq!(
            codec.marshal(&msg),
            Err(PfcpError::MessageTooLarge { len: 21, max: 16 })
        );

        let big = msg.marshal().unwrap();
        assert!(matches!(codec.parse(&big), Err(PfcpError::MessageTooLarge { .. })));
    }

    #[test]
    fn test_lenient_version() {
        let _ = env_logger::try_init();
        let data = [0x40, 0x02, 0x00, 0x04, 0, 0, 9, 0];
        assert!(PfcpCodec::default().parse(&data).is_err());

        let lenient = PfcpCodec::new(CodecConfig { strict_version: false, ..Default::default() }).unwrap();
        assert_eq!(lenient.parse(&data).unwrap().sequence_number(), 9);
    }

    #[test]
    fn test_parse_all_follows_fo_flag() {
        let first = Message::new(PfcpMessageType::HeartbeatRequest, 1)
            .with_follow_on(true)
            .marshal()
            .unwrap();
        let second = Message::new(PfcpMessageType::HeartbeatRequest, 2).marshal().unwrap();
        let data = [first.as_ref(), second.as_ref()].concat();

        let messages = PfcpCodec::default().parse_all(&data).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sequence_number(), 2);
    }

    #[test]
    fn test_user_id_policy() {
        let id = UserId { imsi: Some("12345".to_string()), ..Default::default() };
        let ie = Ie::from_value(&id).unwrap();

        assert_eq!(PfcpCodec::default().user_id(&ie).unwrap(), id);

        let keep = PfcpCodec::new(CodecConfig { strip_digit_filler: false, ..Default::default() }).unwrap();
        let kept = keep.user_id(&ie).unwrap();
        assert_eq!(kept.imsi.as_deref(), Some("12345f"));
        assert_eq!(Ie::from_value(&kept).unwrap(), ie);

        let cause = Ie::from_value(&PfcpCause::RequestAccepted).unwrap();
        assert!(matches!(PfcpCodec::default().user_id(&cause), Err(PfcpError::WrongCarrier { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(PfcpCodec::new(CodecConfig { max_dump_depth: 0, ..Default::default() }).is_err());
    }
}
