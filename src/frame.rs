use crate::{OpCode, error::FrameDecodeError};

/// Size of the fixed part of every frame header.
pub const MIN_HEADER_SIZE: usize = 2;

/// Largest header: 2 fixed bytes, 8 bytes of extended length and a 4 byte mask.
pub const MAX_HEADER_SIZE: usize = 14;

/// Largest payload that fits the 7-bit length form.
pub const MAX_SHORT_PAYLOAD_LEN: usize = 125;

/// A received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Indicates if this is the final frame in a message.
    fin: bool,
    /// The opcode of the frame.
    opcode: OpCode,
    /// The masking key the peer used, if any. The payload is already unmasked.
    mask: Option<[u8; 4]>,
    /// The unmasked payload of the frame.
    payload: Vec<u8>,
}

impl Frame {
    /// Creates a new `Frame` instance.
    pub const fn new(fin: bool, opcode: OpCode, mask: Option<[u8; 4]>, payload: Vec<u8>) -> Self {
        Self {
            fin,
            opcode,
            mask,
            payload,
        }
    }

    /// Returns whether this is the final frame in a message.
    pub const fn is_final(&self) -> bool {
        self.fin
    }

    /// Returns the opcode of the frame.
    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Returns whether the frame arrived masked.
    pub const fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    pub const fn mask(&self) -> Option<[u8; 4]> {
        self.mask
    }

    /// Returns the unmasked payload of the frame.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// A parsed or to-be-written frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Indicates if this is the final frame in a message.
    fin: bool,
    /// The opcode of the frame.
    opcode: OpCode,
    /// The masking key, present only when the mask bit is set.
    mask: Option<[u8; 4]>,
    /// The length of the payload.
    payload_len: usize,
}

impl Header {
    pub const fn new(fin: bool, opcode: OpCode, mask: Option<[u8; 4]>, payload_len: usize) -> Self {
        Self {
            fin,
            opcode,
            mask,
            payload_len,
        }
    }

    pub const fn is_final(&self) -> bool {
        self.fin
    }

    pub const fn opcode(&self) -> OpCode {
        self.opcode
    }

    pub const fn mask(&self) -> Option<[u8; 4]> {
        self.mask
    }

    pub const fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Number of bytes this header occupies on the wire.
    pub const fn size(&self) -> usize {
        let extra = if self.payload_len <= MAX_SHORT_PAYLOAD_LEN {
            0
        } else if self.payload_len <= u16::MAX as usize {
            2
        } else {
            8
        };

        MIN_HEADER_SIZE + extra + if self.mask.is_some() { 4 } else { 0 }
    }

    /// Parses a header from the start of `src`, returning it and the number of bytes it occupies.
    ///
    /// Every index is checked against `src` before it is read. A declared payload
    /// length above `max_payload_len` is rejected before any payload byte is looked at.
    pub fn parse(src: &[u8], max_payload_len: usize) -> Result<(Self, usize), FrameDecodeError> {
        let &[byte0, byte1, ..] = src else {
            return Err(FrameDecodeError::Incomplete);
        };

        // RSV bits are accepted without validation.
        let fin = byte0 & 0b1000_0000 != 0;
        let opcode = OpCode::try_from(byte0 & 0b0000_1111)?;
        let masked = byte1 & 0b1000_0000 != 0;

        let length_code = byte1 & 0x7F;
        let extra = match length_code {
            126 => 2,
            127 => 8,
            _ => 0,
        };

        let mut offset = MIN_HEADER_SIZE;

        let extended = src
            .get(offset..offset + extra)
            .ok_or(FrameDecodeError::Incomplete)?;

        let declared_len: u64 = match *extended {
            [] => u64::from(length_code),
            [hi, lo] => u64::from(u16::from_be_bytes([hi, lo])),
            [b0, b1, b2, b3, b4, b5, b6, b7] => {
                u64::from_be_bytes([b0, b1, b2, b3, b4, b5, b6, b7])
            }
            _ => return Err(FrameDecodeError::MalformedHeader),
        };

        offset += extra;

        // The most significant bit of the 64-bit form must be zero.
        if declared_len >> 63 != 0 {
            return Err(FrameDecodeError::MalformedHeader);
        }

        let header_len = offset + if masked { 4 } else { 0 };
        let frame_len = header_len as u64 + declared_len;

        if opcode.is_control() && (!fin || declared_len > MAX_SHORT_PAYLOAD_LEN as u64) {
            return Err(FrameDecodeError::InvalidControlFrame { frame_len });
        }

        let payload_len = usize::try_from(declared_len)
            .ok()
            .filter(|len| *len <= max_payload_len)
            .ok_or(FrameDecodeError::PayloadTooLarge {
                len: declared_len,
                max: max_payload_len,
                frame_len,
            })?;

        let mask = if masked {
            let &[m0, m1, m2, m3] = src
                .get(offset..offset + 4)
                .ok_or(FrameDecodeError::Incomplete)?
            else {
                return Err(FrameDecodeError::MalformedHeader);
            };

            offset += 4;

            Some([m0, m1, m2, m3])
        } else {
            None
        };

        Ok((Self::new(fin, opcode, mask, payload_len), offset))
    }

    /// Appends the header to `dst`, picking the shortest length form.
    pub fn write(&self, dst: &mut Vec<u8>) -> usize {
        let start = dst.len();

        dst.push((self.fin as u8) << 7 | (self.opcode as u8));

        let mask_bit = if self.mask.is_some() { 0x80 } else { 0x00 };
        let len = self.payload_len;

        if len <= MAX_SHORT_PAYLOAD_LEN {
            dst.push(mask_bit | len as u8);
        } else if len <= u16::MAX as usize {
            dst.push(mask_bit | 126);
            dst.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            dst.push(mask_bit | 127);
            dst.extend_from_slice(&(len as u64).to_be_bytes());
        }

        if let Some(mask) = self.mask {
            dst.extend_from_slice(&mask);
        }

        dst.len() - start
    }
}
