use rand::Rng;
use rand_core::RngCore;

use crate::{
    Frame, Header, OpCode,
    error::{FrameDecodeError, FrameEncodeError},
    frame::MAX_SHORT_PAYLOAD_LEN,
};

/// Default ceiling on the payload length a peer may declare.
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 16 * 1024;

/// The close frame sent in reply to a peer's close: no status code, no reason.
pub const CLOSE_FRAME: [u8; 2] = [0x88, 0x00];

/// Decodes one frame from the start of `buffer`.
///
/// Returns the unmasked frame and the number of bytes it occupied.
/// [`FrameDecodeError::Incomplete`] means the buffer holds a prefix of a frame and
/// more bytes are needed. A data frame with an empty payload is [`FrameDecodeError::EmptyPayload`].
/// Errors carrying a [`frame_len`](FrameDecodeError::frame_len) leave the stream aligned once that many bytes are skipped.
pub fn decode_frame(buffer: &[u8]) -> Result<(Frame, usize), FrameDecodeError> {
    FramesCodec::new().decode(buffer)
}

/// Encodes `payload` as a final, unmasked text frame.
///
/// Only the 7-bit length form is emitted, so payloads above 125 bytes are rejected.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameEncodeError> {
    FramesCodec::new().encode(true, OpCode::Text, payload, None)
}

pub const fn encode_close_frame() -> [u8; 2] {
    CLOSE_FRAME
}

/// Frame decoder and encoder with a configurable payload ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramesCodec {
    max_payload_len: usize,
    /// Emit the 16 and 64-bit length forms instead of rejecting payloads above 125 bytes.
    extended_frames: bool,
}

impl Default for FramesCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FramesCodec {
    pub const fn new() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            extended_frames: false,
        }
    }

    pub const fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    pub const fn with_extended_frames(mut self, extended_frames: bool) -> Self {
        self.extended_frames = extended_frames;
        self
    }

    pub const fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    pub const fn extended_frames(&self) -> bool {
        self.extended_frames
    }

    pub fn decode(&self, src: &[u8]) -> Result<(Frame, usize), FrameDecodeError> {
        let (header, header_len) = Header::parse(src, self.max_payload_len)?;

        if header.payload_len() == 0 && header.opcode().is_data() {
            return Err(FrameDecodeError::EmptyPayload {
                frame_len: header_len,
            });
        }

        let end = header_len
            .checked_add(header.payload_len())
            .ok_or(FrameDecodeError::MalformedHeader)?;

        let mut payload = src
            .get(header_len..end)
            .ok_or(FrameDecodeError::Incomplete)?
            .to_vec();

        // The mask bit is authoritative: unmasked frames are taken as they are.
        if let Some(mask) = header.mask() {
            crate::mask::unmask(&mut payload, mask);
        }

        let frame = Frame::new(header.is_final(), header.opcode(), header.mask(), payload);

        Ok((frame, end))
    }

    /// Encodes a single frame, masking the payload when `mask` is given.
    pub fn encode(
        &self,
        fin: bool,
        opcode: OpCode,
        payload: &[u8],
        mask: Option<[u8; 4]>,
    ) -> Result<Vec<u8>, FrameEncodeError> {
        let len = payload.len();

        if len > MAX_SHORT_PAYLOAD_LEN && (!self.extended_frames || opcode.is_control()) {
            return Err(FrameEncodeError::PayloadTooLarge { len });
        }

        let header = Header::new(fin, opcode, mask, len);

        let mut dst = Vec::with_capacity(header.size() + len);

        let head_len = header.write(&mut dst);

        dst.extend_from_slice(payload);

        if let Some(mask) = mask {
            crate::mask::unmask(&mut dst[head_len..], mask);
        }

        Ok(dst)
    }

    /// Encodes a frame the way a client must: masked with a fresh random key.
    pub fn encode_masked<R: RngCore>(
        &self,
        rng: &mut R,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<Vec<u8>, FrameEncodeError> {
        let mask: [u8; 4] = rng.random();

        self.encode(true, opcode, payload, Some(mask))
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn client_frame(opcode: OpCode, payload: &[u8], mask: [u8; 4]) -> Vec<u8> {
        FramesCodec::new()
            .encode(true, opcode, payload, Some(mask))
            .unwrap()
    }

    mod decode {
        use super::*;

        #[test]
        fn ok() {
            let src = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];

            let (frame, consumed) = decode_frame(&src).unwrap();

            assert_eq!(consumed, src.len());
            assert_eq!(frame.opcode(), OpCode::Text);
            assert!(frame.is_masked());
            assert_eq!(frame.payload(), b"Hello");
        }

        #[test]
        fn unmasked_frame_is_taken_as_is() {
            let src = [0x81, 0x05, b'H', b'e', b'l', b'l', b'o'];

            let (frame, consumed) = decode_frame(&src).unwrap();

            assert_eq!(consumed, 7);
            assert!(!frame.is_masked());
            assert_eq!(frame.payload(), b"Hello");
        }

        #[test]
        fn stops_at_frame_boundary() {
            let mut src = client_frame(OpCode::Text, b"first", [9, 8, 7, 6]);
            let first_len = src.len();
            src.extend(client_frame(OpCode::Text, b"second", [1, 2, 3, 4]));

            let (frame, consumed) = decode_frame(&src).unwrap();

            assert_eq!(consumed, first_len);
            assert_eq!(frame.payload(), b"first");

            let (frame, _) = decode_frame(&src[consumed..]).unwrap();

            assert_eq!(frame.payload(), b"second");
        }

        #[test]
        fn round_trip_for_any_length_and_mask() {
            let mut rng = StdRng::seed_from_u64(6455);

            for len in 1..=MAX_SHORT_PAYLOAD_LEN {
                let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();
                let mask: [u8; 4] = rng.random();

                let src = client_frame(OpCode::Binary, &payload, mask);

                let (frame, consumed) = decode_frame(&src).unwrap();

                assert_eq!(consumed, src.len());
                assert_eq!(frame.payload(), &payload[..]);
            }
        }

        #[test]
        fn extended_16_bit_length() {
            let payload = vec![b'x'; 1000];
            let src = FramesCodec::new()
                .with_extended_frames(true)
                .encode(true, OpCode::Binary, &payload, Some([5, 6, 7, 8]))
                .unwrap();

            let (frame, consumed) = decode_frame(&src).unwrap();

            assert_eq!(consumed, 2 + 2 + 4 + 1000);
            assert_eq!(frame.payload(), &payload[..]);
        }

        #[test]
        fn every_truncation_is_incomplete() {
            let payload = vec![b'a'; 300];
            let src = FramesCodec::new()
                .with_extended_frames(true)
                .encode(true, OpCode::Text, &payload, Some([0xde, 0xad, 0xbe, 0xef]))
                .unwrap();

            for end in 0..src.len() {
                assert_eq!(
                    decode_frame(&src[..end]),
                    Err(FrameDecodeError::Incomplete),
                    "truncated at {end}"
                );
            }
        }

        #[test]
        fn empty_data_frame() {
            let src = client_frame(OpCode::Text, b"", [1, 2, 3, 4]);

            assert_eq!(
                decode_frame(&src),
                Err(FrameDecodeError::EmptyPayload { frame_len: 6 })
            );
        }

        #[test]
        fn empty_close_frame_is_valid() {
            let src = client_frame(OpCode::Close, b"", [1, 2, 3, 4]);

            let (frame, consumed) = decode_frame(&src).unwrap();

            assert_eq!(consumed, 6);
            assert_eq!(frame.opcode(), OpCode::Close);
            assert!(frame.payload().is_empty());
        }

        #[test]
        fn declared_length_above_ceiling() {
            let codec = FramesCodec::new().with_max_payload_len(64);
            let src = [0x82, 0xFE, 0x00, 0x80];

            assert_eq!(
                codec.decode(&src),
                Err(FrameDecodeError::PayloadTooLarge {
                    len: 128,
                    max: 64,
                    frame_len: 8 + 128,
                })
            );
        }

        #[test]
        fn reserved_opcode() {
            let src = [0x83, 0x81, 0, 0, 0, 0, b'x'];

            assert_eq!(decode_frame(&src), Err(FrameDecodeError::MalformedHeader));
        }
    }

    mod encode {
        use super::*;

        #[test]
        fn ok() {
            let encoded = encode_frame(b"Hello").unwrap();

            assert_eq!(encoded, [0x81, 0x05, b'H', b'e', b'l', b'l', b'o']);
        }

        #[test]
        fn largest_short_payload() {
            let encoded = encode_frame(&[b'x'; 125]).unwrap();

            assert_eq!(encoded.len(), 127);
            assert_eq!(encoded[..2], [0x81, 125]);
        }

        #[test]
        fn payload_too_large() {
            assert_eq!(
                encode_frame(&[b'x'; 126]),
                Err(FrameEncodeError::PayloadTooLarge { len: 126 })
            );
        }

        #[test]
        fn extended_frames() {
            let codec = FramesCodec::new().with_extended_frames(true);

            let encoded = codec.encode(true, OpCode::Text, &[b'x'; 126], None).unwrap();

            assert_eq!(encoded[..4], [0x81, 126, 0x00, 126]);
            assert_eq!(encoded.len(), 4 + 126);
        }

        #[test]
        fn control_frames_stay_short() {
            let codec = FramesCodec::new().with_extended_frames(true);

            assert_eq!(
                codec.encode(true, OpCode::Ping, &[0; 126], None),
                Err(FrameEncodeError::PayloadTooLarge { len: 126 })
            );
        }

        #[test]
        fn close_frame() {
            assert_eq!(encode_close_frame(), [0x88, 0x00]);
        }

        #[test]
        fn masked_sets_mask_bit() {
            let mut rng = StdRng::seed_from_u64(7);

            let encoded = FramesCodec::new()
                .encode_masked(&mut rng, OpCode::Text, b"ping")
                .unwrap();

            assert_eq!(encoded[1], 0x80 | 4);
            assert_eq!(encoded.len(), 2 + 4 + 4);

            let (frame, _) = decode_frame(&encoded).unwrap();

            assert_eq!(frame.payload(), b"ping");
        }
    }
}
