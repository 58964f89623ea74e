//! Stream framing.
//!
//! Frames are self-delimiting, but a TCP stream needs datagram boundaries
//! so a decoder knows where one frame's bytes end (the optional tail of
//! `GetTransactionChain` depends on it). Each datagram is a `len:u32`
//! prefix followed by exactly one encoded frame.

use crate::frame::Frame;
use crate::{codec, WireError};
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Length-prefix header size.
const HEADER_SIZE: usize = 4;

/// Default cap on a single datagram (content cap + envelope headroom).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Frame codec for a framed TCP stream.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    /// Codec with the default size cap.
    pub fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Codec with a custom size cap.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, WireError> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if length > self.max_frame_size {
            return Err(WireError::MessageTooLarge {
                size: length,
                max: self.max_frame_size,
            });
        }

        if src.len() < HEADER_SIZE + length {
            src.reserve(HEADER_SIZE + length - src.len());
            return Ok(None);
        }

        // The datagram is consumed before parsing, so a malformed frame
        // leaves the stream aligned on the next length prefix.
        src.advance(HEADER_SIZE);
        let payload = src.split_to(length);

        let (frame, rest) = codec::decode(&payload)?;
        if !rest.is_empty() {
            return Err(WireError::Malformed("trailing bytes in datagram"));
        }
        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = WireError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), WireError> {
        let bytes = codec::encode(&frame)?;
        if bytes.len() > self.max_frame_size {
            return Err(WireError::MessageTooLarge {
                size: bytes.len(),
                max: self.max_frame_size,
            });
        }
        dst.reserve(HEADER_SIZE + bytes.len());
        dst.put_u32(bytes.len() as u32);
        dst.put_slice(&bytes);
        Ok(())
    }
}
