//! Bit and byte primitives
//!
//! Helpers shared by every payload codec: bound-checked reads, odd-width
//! big-endian integers, flag bits, NTP timestamps, swapped-nibble digit
//! strings and DNS-label names.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};

use crate::error::{PfcpError, PfcpResult};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01)
pub const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// Filler nibble for odd-length digit strings
pub const DIGIT_FILLER: u8 = 0x0F;

/// Maximum length of a single DNS label
pub const MAX_LABEL_LEN: usize = 63;

/// Fail with `BufferTooShort` unless `needed` bytes remain.
#[inline]
pub fn ensure<B: Buf + ?Sized>(buf: &B, needed: usize) -> PfcpResult<()> {
    if buf.remaining() < needed {
        return Err(PfcpError::short(needed, buf.remaining()));
    }
    Ok(())
}

/// Mask for bit `bit`, counting from 1 at the least significant bit.
/// Indexes outside 1..=8 have no mask.
#[inline]
pub fn bit_mask(bit: u8) -> Option<u8> {
    match bit {
        1..=8 => Some(1 << (bit - 1)),
        _ => None,
    }
}

/// Test bit `bit` of a flags byte, counting from 1 at the least significant bit.
/// Out-of-range indexes read as clear.
#[inline]
pub fn has_bit(byte: u8, bit: u8) -> bool {
    bit_mask(bit).is_some_and(|mask| byte & mask != 0)
}

/// Set bit `bit` of a flags byte, counting from 1 at the least significant bit.
/// Out-of-range indexes leave the byte unchanged.
#[inline]
pub fn set_bit(byte: u8, bit: u8) -> u8 {
    bit_mask(bit).map_or(byte, |mask| byte | mask)
}

/// Set bit `bit` when `on` is true.
#[inline]
pub fn set_bit_if(byte: u8, bit: u8, on: bool) -> u8 {
    if on {
        set_bit(byte, bit)
    } else {
        byte
    }
}

pub fn get_u8<B: Buf>(buf: &mut B) -> PfcpResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn get_u16<B: Buf>(buf: &mut B) -> PfcpResult<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn get_u32<B: Buf>(buf: &mut B) -> PfcpResult<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn get_u64<B: Buf>(buf: &mut B) -> PfcpResult<u64> {
    ensure(buf, 8)?;
    Ok(buf.get_u64())
}

/// Read a fixed-size byte array (addresses, MACs).
pub fn get_array<const N: usize, B: Buf>(buf: &mut B) -> PfcpResult<[u8; N]> {
    ensure(buf, N)?;
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Read a 24-bit big-endian integer.
pub fn get_u24<B: Buf>(buf: &mut B) -> PfcpResult<u32> {
    ensure(buf, 3)?;
    Ok(buf.get_uint(3) as u32)
}

/// Write a 24-bit big-endian integer. Values wider than 24 bits are rejected.
pub fn put_u24<B: BufMut>(buf: &mut B, value: u32) -> PfcpResult<()> {
    if value > 0x00FF_FFFF {
        return Err(PfcpError::InconsistentField(format!(
            "value {value:#x} does not fit in 24 bits"
        )));
    }
    buf.put_uint(value as u64, 3);
    Ok(())
}

/// Read a 40-bit big-endian integer.
pub fn get_u40<B: Buf>(buf: &mut B) -> PfcpResult<u64> {
    ensure(buf, 5)?;
    Ok(buf.get_uint(5))
}

/// Write a 40-bit big-endian integer. Values wider than 40 bits are rejected.
pub fn put_u40<B: BufMut>(buf: &mut B, value: u64) -> PfcpResult<()> {
    if value > 0x00FF_FFFF_FFFF {
        return Err(PfcpError::InconsistentField(format!(
            "value {value:#x} does not fit in 40 bits"
        )));
    }
    buf.put_uint(value, 5);
    Ok(())
}

/// Convert an NTP-era-0 seconds counter to Unix seconds.
///
/// The 32-bit counter wraps in February 2036; era rollover is not handled.
pub fn ntp_to_unix(ntp: u32) -> i64 {
    ntp as i64 - NTP_UNIX_OFFSET
}

/// Convert Unix seconds to an NTP-era-0 seconds counter.
pub fn unix_to_ntp(unix: i64) -> PfcpResult<u32> {
    unix.checked_add(NTP_UNIX_OFFSET)
        .and_then(|ntp| u32::try_from(ntp).ok())
        .ok_or_else(|| {
            PfcpError::InconsistentField(format!("unix time {unix} is outside NTP era 0"))
        })
}

pub fn ntp_to_system_time(ntp: u32) -> SystemTime {
    let unix = ntp_to_unix(ntp);
    if unix >= 0 {
        UNIX_EPOCH + Duration::from_secs(unix as u64)
    } else {
        UNIX_EPOCH - Duration::from_secs(unix.unsigned_abs())
    }
}

pub fn system_time_to_ntp(time: SystemTime) -> PfcpResult<u32> {
    // Saturated values fall outside era 0 and are rejected by unix_to_ntp
    let unix = match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -(i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX)),
    };
    unix_to_ntp(unix)
}

/// Pack a decimal digit string, two digits per byte with swapped nibbles.
///
/// `"12345"` becomes `[0x21, 0x43, 0xF5]`. An explicit trailing `f` in the
/// filler position is accepted, so `"12345f"` packs the same way.
pub fn encode_digits(digits: &str) -> PfcpResult<Vec<u8>> {
    let count = digits.chars().count();
    let mut nibbles = Vec::with_capacity(count);
    for (i, c) in digits.chars().enumerate() {
        let filler_slot = i + 1 == count && i % 2 == 1;
        let d = match c {
            'f' | 'F' if filler_slot => DIGIT_FILLER,
            _ => c.to_digit(10).ok_or(PfcpError::InvalidDigit(c))? as u8,
        };
        nibbles.push(d);
    }

    Ok(nibbles
        .chunks(2)
        .map(|pair| {
            let low = pair[0];
            let high = pair.get(1).copied().unwrap_or(DIGIT_FILLER);
            (high << 4) | low
        })
        .collect())
}

/// Unpack a swapped-nibble digit string.
///
/// A 0xF high nibble in the last byte is the filler: dropped with
/// `strip_filler`, kept as `f` without it. A non-decimal nibble anywhere
/// else is an `InvalidDigit`.
pub fn decode_digits(data: &[u8], strip_filler: bool) -> PfcpResult<String> {
    let mut out = String::with_capacity(data.len() * 2);
    let last = data.len().saturating_sub(1);

    for (i, byte) in data.iter().enumerate() {
        let low = byte & 0x0F;
        let high = byte >> 4;
        out.push(nibble_to_digit(low)?);

        if high == DIGIT_FILLER && i == last {
            if !strip_filler {
                out.push('f');
            }
            break;
        }
        out.push(nibble_to_digit(high)?);
    }

    Ok(out)
}

fn nibble_to_digit(nibble: u8) -> PfcpResult<char> {
    if nibble > 9 {
        let c = char::from_digit(nibble as u32, 16).unwrap_or('?');
        return Err(PfcpError::InvalidDigit(c));
    }
    Ok((b'0' + nibble) as char)
}

/// Encode a dotted name as length-prefixed DNS labels, without the root label.
pub fn encode_fqdn(name: &str) -> PfcpResult<Vec<u8>> {
    let name = name.strip_suffix('.').unwrap_or(name);
    let mut out = Vec::with_capacity(name.len() + 1);
    if name.is_empty() {
        return Ok(out);
    }

    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(PfcpError::InconsistentField(format!(
                "invalid label {label:?} in {name:?}"
            )));
        }
        out.put_u8(label.len() as u8);
        out.put_slice(label.as_bytes());
    }

    Ok(out)
}

/// Decode length-prefixed DNS labels into a dotted name.
///
/// A single zero-length root label is accepted at the very end.
pub fn decode_fqdn(data: &[u8]) -> PfcpResult<String> {
    let mut buf = data;
    let mut name = String::with_capacity(data.len());

    while buf.has_remaining() {
        let len = buf.get_u8() as usize;
        if len == 0 {
            if buf.has_remaining() {
                return Err(PfcpError::InvalidFormat(
                    "empty label inside name".to_string(),
                ));
            }
            break;
        }
        ensure(&buf, len)?;
        let label = std::str::from_utf8(&buf[..len])
            .map_err(|e| PfcpError::InvalidFormat(format!("label is not UTF-8: {e}")))?;
        if !name.is_empty() {
            name.push('.');
        }
        name.push_str(label);
        buf.advance(len);
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_bits_count_from_lsb() {
        assert!(has_bit(0x01, 1));
        assert!(!has_bit(0x01, 2));
        assert!(has_bit(0x80, 8));
        assert_eq!(set_bit(0, 3), 0x04);
        assert_eq!(set_bit_if(0x01, 2, false), 0x01);
    }

    #[test]
    fn test_bit_index_out_of_range() {
        assert_eq!(bit_mask(0), None);
        assert_eq!(bit_mask(9), None);
        assert!(!has_bit(0xFF, 0));
        assert!(!has_bit(0xFF, 9));
        assert_eq!(set_bit(0x10, 0), 0x10);
        assert_eq!(set_bit(0x10, 9), 0x10);
    }

    #[test]
    fn test_u24_u40() {
        let mut buf = BytesMut::new();
        put_u24(&mut buf, 0xABCDEF).unwrap();
        put_u40(&mut buf, 0x01_0203_0405).unwrap();
        assert_eq!(&buf[..], &[0xAB, 0xCD, 0xEF, 0x01, 0x02, 0x03, 0x04, 0x05]);

        let mut rd = &buf[..];
        assert_eq!(get_u24(&mut rd).unwrap(), 0xABCDEF);
        assert_eq!(get_u40(&mut rd).unwrap(), 0x01_0203_0405);
        assert!(get_u24(&mut rd).is_err());
    }

    #[test]
    fn test_wide_values_rejected() {
        let mut buf = BytesMut::new();
        assert!(put_u24(&mut buf, 0x0100_0000).is_err());
        assert!(put_u40(&mut buf, 1 << 40).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ntp_offset() {
        assert_eq!(ntp_to_unix(2_208_988_800), 0);
        assert_eq!(unix_to_ntp(0).unwrap(), 2_208_988_800);
        assert_eq!(ntp_to_system_time(2_208_988_800), UNIX_EPOCH);
        assert_eq!(system_time_to_ntp(UNIX_EPOCH).unwrap(), 2_208_988_800);
        // Past the end of era 0
        assert!(unix_to_ntp(3_000_000_000).is_err());
        assert!(unix_to_ntp(-NTP_UNIX_OFFSET - 1).is_err());
    }

    #[test]
    fn test_pre_unix_ntp_time() {
        let t = ntp_to_system_time(0);
        assert_eq!(system_time_to_ntp(t).unwrap(), 0);
    }

    #[test]
    fn test_digits_odd_length() {
        let packed = encode_digits("12345").unwrap();
        assert_eq!(packed, vec![0x21, 0x43, 0xF5]);
        assert_eq!(decode_digits(&packed, true).unwrap(), "12345");
        assert_eq!(decode_digits(&packed, false).unwrap(), "12345f");
        assert_eq!(encode_digits("12345f").unwrap(), packed);
    }

    #[test]
    fn test_digits_filler_only_in_last_position() {
        assert_eq!(decode_digits(&[0xF1, 0x32], false), Err(PfcpError::InvalidDigit('f')));
        assert_eq!(decode_digits(&[0x21, 0x3F], true), Err(PfcpError::InvalidDigit('f')));
        assert_eq!(encode_digits("1f23"), Err(PfcpError::InvalidDigit('f')));
        assert_eq!(encode_digits("12f"), Err(PfcpError::InvalidDigit('f')));
        assert_eq!(encode_digits("123f").unwrap(), vec![0x21, 0xF3]);
    }

    #[test]
    fn test_digits_even_length() {
        let packed = encode_digits("001010123456789").unwrap();
        assert_eq!(packed.len(), 8);
        assert_eq!(decode_digits(&packed, true).unwrap(), "001010123456789");

        let even = encode_digits("1234").unwrap();
        assert_eq!(even, vec![0x21, 0x43]);
        assert_eq!(decode_digits(&even, false).unwrap(), "1234");
    }

    #[test]
    fn test_digits_rejects_non_decimal() {
        assert_eq!(encode_digits("12a"), Err(PfcpError::InvalidDigit('a')));
        assert!(decode_digits(&[0x1C], true).is_err());
        // Filler in the middle is never stripped
        assert!(decode_digits(&[0xF1, 0x21], true).is_err());
    }

    #[test]
    fn test_fqdn() {
        let enc = encode_fqdn("upf.example.net").unwrap();
        assert_eq!(enc[0], 3);
        assert_eq!(&enc[1..4], b"upf");
        assert_eq!(decode_fqdn(&enc).unwrap(), "upf.example.net");

        let mut rooted = enc.clone();
        rooted.push(0);
        assert_eq!(decode_fqdn(&rooted).unwrap(), "upf.example.net");

        assert!(encode_fqdn("a..b").is_err());
        assert!(decode_fqdn(&[5, b'a', b'b']).is_err());
        assert_eq!(encode_fqdn("internet.").unwrap(), encode_fqdn("internet").unwrap());
    }
}
