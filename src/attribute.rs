//! Capture and codec attributes handed in by the surrounding capture application.

use serde::Deserialize;

use crate::error::{CodecError, Result};
use crate::format::PixelFormat;

/// Layout of the frames the capture source delivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct VideoCaptureAttribute {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct AudioCaptureAttribute {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// Encoder-side video settings. `bitrate` is in bits per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct VideoCodecAttribute {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bitrate: u32,
}

impl VideoCodecAttribute {
    pub fn validate(&self) -> Result<()> {
        PixelFormat::I420.check_dimensions(self.width, self.height)?;
        if self.frame_rate == 0 {
            return Err(CodecError::invalid("frame rate must be greater than zero"));
        }
        if self.bitrate == 0 {
            return Err(CodecError::invalid("bitrate must be greater than zero"));
        }
        Ok(())
    }
}

/// Accepted for completeness; the audio path is a pass-through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct AudioCodecAttribute {
    pub sample_rate: u32,
    pub channels: u16,
    pub bitrate: u32,
}

/// Source attribute as delivered by the capture collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceAttribute {
    Video(VideoCaptureAttribute),
    Audio(AudioCaptureAttribute),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(width: u32, height: u32, frame_rate: u32, bitrate: u32) -> VideoCodecAttribute {
        VideoCodecAttribute {
            width,
            height,
            frame_rate,
            bitrate,
        }
    }

    #[test]
    fn validates_codec_attribute() {
        assert!(attr(640, 480, 30, 1_000_000).validate().is_ok());
        assert!(attr(0, 480, 30, 1_000_000).validate().is_err());
        assert!(attr(641, 480, 30, 1_000_000).validate().is_err());
        assert!(attr(640, 480, 0, 1_000_000).validate().is_err());
        assert!(attr(640, 480, 30, 0).validate().is_err());
    }

    #[test]
    fn capture_attribute_parses_lowercase_format() {
        let attr: VideoCaptureAttribute = serde_json::from_str(
            r#"{"format": "nv12", "width": 320, "height": 240, "frame_rate": 15}"#,
        )
        .unwrap();
        assert_eq!(attr.format, PixelFormat::Nv12);
        assert_eq!(attr.frame_rate, 15);
    }
}
