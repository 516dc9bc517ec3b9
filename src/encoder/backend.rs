use crate::attribute::VideoCodecAttribute;
use crate::error::Result;

use super::picture::Picture;

/// Settings a native encoder is opened with.
///
/// Derived from a [`VideoCodecAttribute`]: one worker thread, a keyframe every
/// `frame_rate` frames, intra refresh and Annex B byte-stream output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderParams {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Target bitrate in bits per second; caps the constant-rate-factor control.
    pub bitrate: u32,
    pub threads: u32,
    pub keyframe_interval: u32,
    pub intra_refresh: bool,
    pub annex_b: bool,
}

impl From<&VideoCodecAttribute> for EncoderParams {
    fn from(attr: &VideoCodecAttribute) -> Self {
        Self {
            width: attr.width,
            height: attr.height,
            frame_rate: attr.frame_rate,
            bitrate: attr.bitrate,
            threads: 1,
            keyframe_interval: attr.frame_rate,
            intra_refresh: true,
            annex_b: true,
        }
    }
}

/// One compressed access unit. Owned by whoever receives it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPacket {
    pub data: Vec<u8>,
    /// Presentation index of the picture this packet encodes.
    pub pts: i64,
    pub keyframe: bool,
}

impl EncodedPacket {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An open encoder instance.
///
/// Not safe for concurrent use; every method takes `&mut self`.
pub trait NativeEncoder: Send {
    /// Submit one picture. `Ok(None)` means the encoder buffered it and produced no
    /// output on this call.
    fn encode(&mut self, picture: &Picture, pts: i64) -> Result<Option<EncodedPacket>>;

    /// Drain pictures still buffered inside the encoder.
    fn flush(&mut self) -> Result<Vec<EncodedPacket>> {
        Ok(Vec::new())
    }
}

/// Factory for native encoder instances.
pub trait EncoderBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Open a new encoder instance. Failures map to `CodecError::EncoderFailure`.
    fn open(&self, params: &EncoderParams) -> Result<Box<dyn NativeEncoder>>;
}
