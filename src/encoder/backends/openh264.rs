//! H.264 encoding through the `openh264` crate (library built from source).

use openh264::encoder::{
    BitRate, Encoder, EncoderConfig, FrameRate, FrameType, IntraFramePeriod, RateControlMode,
    UsageType,
};
use openh264::formats::YUVSlices;
use openh264::OpenH264API;

use crate::encoder::backend::{EncodedPacket, EncoderBackend, EncoderParams, NativeEncoder};
use crate::encoder::picture::Picture;
use crate::error::{CodecError, Result};

#[derive(Clone, Debug, Default)]
pub struct OpenH264Backend;

impl OpenH264Backend {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for OpenH264Backend {
    fn name(&self) -> &'static str {
        "openh264"
    }

    fn open(&self, params: &EncoderParams) -> Result<Box<dyn NativeEncoder>> {
        // OpenH264 has no intra-refresh switch; periodic IDRs bound the keyframe cost instead.
        let config = EncoderConfig::new()
            .usage_type(UsageType::CameraVideoRealTime)
            .bitrate(BitRate::from_bps(params.bitrate))
            .max_frame_rate(FrameRate::from_hz(params.frame_rate as f32))
            .rate_control_mode(RateControlMode::Quality)
            .intra_frame_period(IntraFramePeriod::from_num_frames(params.keyframe_interval))
            .num_threads(params.threads as u16);

        let api = OpenH264API::from_source();
        let encoder = Encoder::with_api_config(api, config)
            .map_err(|e| CodecError::encoder(format!("failed to open openh264: {}", e)))?;

        log::info!(
            "openh264 encoder opened {}x{} @ {} fps, {} bps",
            params.width,
            params.height,
            params.frame_rate,
            params.bitrate
        );

        Ok(Box::new(OpenH264Encoder {
            encoder,
            width: params.width,
            height: params.height,
        }))
    }
}

struct OpenH264Encoder {
    encoder: Encoder,
    width: u32,
    height: u32,
}

impl NativeEncoder for OpenH264Encoder {
    fn encode(&mut self, picture: &Picture, pts: i64) -> Result<Option<EncodedPacket>> {
        if picture.width() != self.width || picture.height() != self.height {
            return Err(CodecError::encoder(format!(
                "picture {}x{} does not match encoder {}x{}",
                picture.width(),
                picture.height(),
                self.width,
                self.height
            )));
        }

        let (w, h) = (self.width as usize, self.height as usize);
        let (y_stride, c_stride) = (picture.stride(), picture.chroma_stride());
        let bytes = picture.as_bytes();
        let y_len = y_stride * h;
        let c_len = c_stride * (h / 2);
        let yuv = YUVSlices::new(
            (
                &bytes[..y_len],
                &bytes[y_len..y_len + c_len],
                &bytes[y_len + c_len..y_len + 2 * c_len],
            ),
            (w, h),
            (y_stride, c_stride, c_stride),
        );

        let bitstream = self
            .encoder
            .encode(&yuv)
            .map_err(|e| CodecError::encoder(format!("openh264 encode failed: {}", e)))?;

        let frame_type = bitstream.frame_type();
        let data = bitstream.to_vec();
        if data.is_empty() || matches!(frame_type, FrameType::Skip) {
            log::trace!("openh264 produced no output for pts {}", pts);
            return Ok(None);
        }

        Ok(Some(EncodedPacket {
            data,
            pts,
            keyframe: matches!(frame_type, FrameType::IDR | FrameType::I),
        }))
    }
}
