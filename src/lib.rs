//! Capture Codec
//!
//! Real-time preparation of captured video frames for a single-stream H.264 encoder.
//!
//! # Architecture
//!
//! Frames flow leaf-first through four layers:
//!
//! 1. **Color math** (`color`): fixed-point BT.601 YCbCr to clipped RGB.
//! 2. **Format conversion** (`convert`): a read-only registry mapping (source, destination)
//!    pixel format pairs to stride-aware transforms. Unknown pairs are rejected before any
//!    byte of the destination is written.
//! 3. **Encoder session** (`session`): one native encoder instance and one I420 scratch
//!    picture per stream, acquired on configure and released exactly once.
//! 4. **Frame pipeline** (`pipeline`): dispatches captured frames by kind, drives the session
//!    for video and accepts audio without encoding it.
//!
//! # Module Structure
//!
//! - `format`, `buffer`, `frame`: pixel layouts, borrowed image views, capture frame records
//! - `attribute`: capture and codec attributes
//! - `encoder`: backend traits, scratch picture, stub/openh264/x264 backends
//! - `source`: synthetic capture source for tests and the demo binary
//! - `config`: file and environment configuration for `capture_encode`

pub mod attribute;
pub mod buffer;
pub mod color;
pub mod config;
pub mod convert;
pub mod encoder;
pub mod error;
pub mod format;
pub mod frame;
pub mod pipeline;
pub mod session;
pub mod source;

pub use attribute::{
    AudioCaptureAttribute, AudioCodecAttribute, SourceAttribute, VideoCaptureAttribute,
    VideoCodecAttribute,
};
pub use buffer::{ImageView, ImageViewMut};
pub use color::{ycrcb_to_rgb, Rgb};
pub use config::PipelineConfig;
pub use convert::{Converter, FormatConverter};
pub use encoder::{BackendRegistry, EncodedPacket, EncoderBackend, NativeEncoder, StubBackend};
pub use error::{CodecError, Result};
pub use format::PixelFormat;
pub use frame::{AudioFrame, CaptureFrame, FrameKind, RawFrame, VideoFrame};
pub use pipeline::{FrameOutcome, FramePipeline, PipelineState, PipelineStats};
pub use session::{EncodeOutcome, EncoderSession, SessionState, SessionStats};
pub use source::{SyntheticConfig, SyntheticSource};
