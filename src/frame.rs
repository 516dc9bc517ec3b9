//! Capture frame records.
//!
//! - `VideoFrame`: borrowed view of one captured picture. The capture side owns the memory.
//! - `AudioFrame`: borrowed PCM block. Accepted by the pipeline, never encoded.
//! - `CaptureFrame`: the video/audio discriminator the pipeline dispatches on.
//! - `RawFrame`: owned frame produced by the synthetic source.

use crate::format::PixelFormat;

#[derive(Clone, Copy, Debug)]
pub struct VideoFrame<'a> {
    pub format: PixelFormat,
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive (luma) rows.
    pub stride: usize,
    pub width: u32,
    pub height: u32,
}

impl<'a> VideoFrame<'a> {
    pub fn new(format: PixelFormat, data: &'a [u8], stride: usize, width: u32, height: u32) -> Self {
        Self {
            format,
            data,
            stride,
            width,
            height,
        }
    }

    /// Frame with rows packed back to back.
    pub fn tight(format: PixelFormat, data: &'a [u8], width: u32, height: u32) -> Self {
        Self::new(format, data, format.row_bytes(width), width, height)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AudioFrame<'a> {
    pub samples: &'a [u8],
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Clone, Copy, Debug)]
pub enum CaptureFrame<'a> {
    Video(VideoFrame<'a>),
    Audio(AudioFrame<'a>),
}

impl CaptureFrame<'_> {
    pub fn kind(&self) -> FrameKind {
        match self {
            CaptureFrame::Video(_) => FrameKind::Video,
            CaptureFrame::Audio(_) => FrameKind::Audio,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Video,
    Audio,
}

/// Owned frame buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub format: PixelFormat,
    pub data: Vec<u8>,
    pub stride: usize,
    pub width: u32,
    pub height: u32,
}

impl RawFrame {
    /// Zeroed frame with `padding` extra bytes after each row.
    ///
    /// Returns `None` when the layout length overflows.
    pub fn zeroed(format: PixelFormat, width: u32, height: u32, padding: usize) -> Option<Self> {
        let stride = format.row_bytes(width).checked_add(padding)?;
        let len = format.buffer_len(width, stride, height)?;
        Some(Self {
            format,
            data: vec![0u8; len],
            stride,
            width,
            height,
        })
    }

    pub fn as_video(&self) -> VideoFrame<'_> {
        VideoFrame::new(self.format, &self.data, self.stride, self.width, self.height)
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_frame_includes_padding() {
        let frame = RawFrame::zeroed(PixelFormat::Nv12, 8, 4, 8).unwrap();
        assert_eq!(frame.stride, 16);
        assert_eq!(frame.byte_len(), 16 * 4 + 16 * 2);
        let view = frame.as_video();
        assert_eq!(view.width, 8);
        assert_eq!(view.format, PixelFormat::Nv12);
    }

    #[test]
    fn capture_frame_kind() {
        let data = [0u8; 4];
        let video = CaptureFrame::Video(VideoFrame::tight(PixelFormat::Rgb32, &data, 1, 1));
        let audio = CaptureFrame::Audio(AudioFrame {
            samples: &data,
            sample_rate: 48_000,
            channels: 2,
        });
        assert_eq!(video.kind(), FrameKind::Video);
        assert_eq!(audio.kind(), FrameKind::Audio);
    }
}
