//! Self-delimiting record framing.
//!
//! ```text
//! u64 LE   payload length
//! u32 LE   masked CRC-32C of the 8 length bytes
//! [u8]     payload (encoded Event)
//! u32 LE   masked CRC-32C of the payload
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use prost::Message;

use crate::schema::Event;

const MASK_DELTA: u32 = 0xa282_ead8;

/// Bytes of framing around each payload.
pub const FRAME_OVERHEAD: usize = 8 + 4 + 4;

/// Masked CRC-32C (Castagnoli) as used by the record framing.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    let crc = crc32c::crc32c(data);
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

/// Serialize `event` into one framed record, ready to append verbatim.
pub fn encode_record(event: &Event) -> Bytes {
    let mut buf = BytesMut::with_capacity(event.encoded_len() + FRAME_OVERHEAD);
    encode_record_into(event, &mut buf);
    buf.freeze()
}

/// Append one framed record for `event` to `buf`.
pub fn encode_record_into(event: &Event, buf: &mut BytesMut) {
    let payload = event.encode_to_vec();
    let len = (payload.len() as u64).to_le_bytes();

    buf.reserve(payload.len() + FRAME_OVERHEAD);
    buf.put_slice(&len);
    buf.put_u32_le(masked_crc32c(&len));
    buf.put_slice(&payload);
    buf.put_u32_le(masked_crc32c(&payload));
}

impl Event {
    /// Framed record bytes for this event.
    pub fn to_record_bytes(&self) -> Bytes {
        encode_record(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_of_empty_input() {
        // CRC-32C of the empty string is zero, leaving only the delta.
        assert_eq!(masked_crc32c(&[]), MASK_DELTA);
    }

    #[test]
    fn test_frame_layout() {
        let event = Event::header(0);
        let record = encode_record(&event);
        let payload_len = event.encoded_len();

        assert_eq!(record.len(), payload_len + FRAME_OVERHEAD);

        let len = u64::from_le_bytes(record[0..8].try_into().unwrap());
        assert_eq!(len as usize, payload_len);

        let len_crc = u32::from_le_bytes(record[8..12].try_into().unwrap());
        assert_eq!(len_crc, masked_crc32c(&record[0..8]));

        let payload = &record[12..12 + payload_len];
        let data_crc = u32::from_le_bytes(record[12 + payload_len..].try_into().unwrap());
        assert_eq!(data_crc, masked_crc32c(payload));

        assert_eq!(Event::decode(payload).unwrap(), event);
    }

    #[test]
    fn test_encode_into_appends() {
        let mut buf = BytesMut::new();
        let first = Event::header(0);
        let second = Event::header(1);
        encode_record_into(&first, &mut buf);
        encode_record_into(&second, &mut buf);

        assert_eq!(
            buf.len(),
            first.encoded_len() + second.encoded_len() + 2 * FRAME_OVERHEAD
        );
    }
}
