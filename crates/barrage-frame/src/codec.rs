use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of one length field.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Bytes counted by the length field ahead of the body:
/// repeated length (4) + message type (2) + encrypt (1) + reserved (1).
pub const HEADER_OVERHEAD: usize = 8;

/// Full header size: length (4) + [`HEADER_OVERHEAD`] = 12 bytes.
pub const HEADER_SIZE: usize = LENGTH_FIELD_SIZE + HEADER_OVERHEAD;

/// Message type tag for frames sent by a client.
pub const CLIENT_MESSAGE_TYPE: u16 = 689;

/// Message type tag for frames sent by the barrage server.
pub const SERVER_MESSAGE_TYPE: u16 = 690;

/// Default maximum body size: 16 MiB.
pub const DEFAULT_MAX_BODY: usize = 16 * 1024 * 1024;

/// One decoded wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type tag ([`CLIENT_MESSAGE_TYPE`] or [`SERVER_MESSAGE_TYPE`]).
    pub msg_type: u16,
    /// The raw STT body, including its NUL terminator.
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(msg_type: u16, body: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            body: body.into(),
        }
    }

    /// Create a client frame carrying `body`.
    pub fn client(body: impl Into<Bytes>) -> Self {
        Self::new(CLIENT_MESSAGE_TYPE, body)
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format (all integers little-endian):
/// ```text
/// ┌────────────┬────────────┬──────────┬─────────┬──────────┬──────────┐
/// │ Length     │ Length     │ Type     │ Encrypt │ Reserved │ Body     │
/// │ (4B)       │ (4B, copy) │ (2B)     │ (1B, 0) │ (1B, 0)  │          │
/// └────────────┴────────────┴──────────┴─────────┴──────────┴──────────┘
/// ```
/// `Length` counts everything after the first length field.
pub fn encode_frame(msg_type: u16, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let max = u32::MAX as usize - HEADER_OVERHEAD;
    if body.len() > max {
        return Err(FrameError::BodyTooLarge {
            size: body.len(),
            max,
        });
    }
    let length = (HEADER_OVERHEAD + body.len()) as u32;

    dst.reserve(HEADER_SIZE + body.len());
    dst.put_u32_le(length);
    dst.put_u32_le(length);
    dst.put_u16_le(msg_type);
    dst.put_u8(0);
    dst.put_u8(0);
    dst.put_slice(body);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_body: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let first = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    let second = u32::from_le_bytes([src[4], src[5], src[6], src[7]]);
    if first != second {
        return Err(FrameError::LengthMismatch { first, second });
    }
    if (first as usize) < HEADER_OVERHEAD {
        return Err(FrameError::InvalidLength {
            length: first,
            min: HEADER_OVERHEAD as u32,
        });
    }

    let body_len = first as usize - HEADER_OVERHEAD;
    if body_len > max_body {
        return Err(FrameError::BodyTooLarge {
            size: body_len,
            max: max_body,
        });
    }

    let total = HEADER_SIZE + body_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    let msg_type = u16::from_le_bytes([src[8], src[9]]);
    src.advance(HEADER_SIZE);
    let body = src.split_to(body_len).freeze();

    Ok(Some(Frame { msg_type, body }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum body size in bytes. Default: 16 MiB.
    pub max_body_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let body = b"type@=mrkl/\0";

        encode_frame(CLIENT_MESSAGE_TYPE, body, &mut buf).unwrap();

        assert_eq!(buf.len(), HEADER_SIZE + body.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap().unwrap();

        assert_eq!(frame.msg_type, CLIENT_MESSAGE_TYPE);
        assert_eq!(frame.body.as_ref(), body);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_header_layout_is_bit_exact() {
        let mut buf = BytesMut::new();
        encode_frame(CLIENT_MESSAGE_TYPE, b"abcd", &mut buf).unwrap();

        // length = 8 + 4 = 12, written twice; 689 = 0x02B1.
        assert_eq!(
            &buf[..HEADER_SIZE],
            &[12, 0, 0, 0, 12, 0, 0, 0, 0xB1, 0x02, 0, 0]
        );
        assert_eq!(&buf[HEADER_SIZE..], b"abcd");
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x0C, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_incomplete_body() {
        let mut buf = BytesMut::new();
        encode_frame(SERVER_MESSAGE_TYPE, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_decode_length_mismatch() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(20);
        buf.put_u32_le(21);
        buf.put_u16_le(SERVER_MESSAGE_TYPE);
        buf.put_u16_le(0);

        let result = decode_frame(&mut buf, DEFAULT_MAX_BODY);
        assert!(matches!(
            result,
            Err(FrameError::LengthMismatch {
                first: 20,
                second: 21
            })
        ));
    }

    #[test]
    fn test_decode_length_below_overhead() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(3);
        buf.put_u32_le(3);
        buf.put_u16_le(SERVER_MESSAGE_TYPE);
        buf.put_u16_le(0);

        let result = decode_frame(&mut buf, DEFAULT_MAX_BODY);
        assert!(matches!(result, Err(FrameError::InvalidLength { .. })));
    }

    #[test]
    fn test_decode_body_too_large() {
        let mut buf = BytesMut::new();
        let length = (HEADER_OVERHEAD + 1024 * 1024 * 32) as u32;
        buf.put_u32_le(length);
        buf.put_u32_le(length);
        buf.put_u16_le(SERVER_MESSAGE_TYPE);
        buf.put_u16_le(0);

        let result = decode_frame(&mut buf, DEFAULT_MAX_BODY);
        assert!(matches!(result, Err(FrameError::BodyTooLarge { .. })));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(SERVER_MESSAGE_TYPE, b"first", &mut buf).unwrap();
        encode_frame(CLIENT_MESSAGE_TYPE, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap().unwrap();
        assert_eq!(f1.msg_type, SERVER_MESSAGE_TYPE);
        assert_eq!(f1.body.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap().unwrap();
        assert_eq!(f2.msg_type, CLIENT_MESSAGE_TYPE);
        assert_eq!(f2.body.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_reserved_bytes_ignored_on_decode() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(HEADER_OVERHEAD as u32 + 2);
        buf.put_u32_le(HEADER_OVERHEAD as u32 + 2);
        buf.put_u16_le(SERVER_MESSAGE_TYPE);
        buf.put_u8(7);
        buf.put_u8(9);
        buf.put_slice(b"ok");

        let frame = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap().unwrap();
        assert_eq!(frame.body.as_ref(), b"ok");
    }

    #[test]
    fn test_empty_body() {
        let mut buf = BytesMut::new();
        encode_frame(CLIENT_MESSAGE_TYPE, b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_BODY).unwrap().unwrap();
        assert_eq!(frame.msg_type, CLIENT_MESSAGE_TYPE);
        assert!(frame.body.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::client(Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), HEADER_SIZE + 4);
        assert_eq!(frame.msg_type, CLIENT_MESSAGE_TYPE);
    }
}
