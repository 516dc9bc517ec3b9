//! libx264 through FFmpeg.
//!
//! Opened with the `veryfast`/`zerolatency` preset, `high` profile, CRF rate control capped
//! by a VBV buffer sized from the target bitrate, and periodic intra refresh.

use ffmpeg_next as ffmpeg;

use crate::encoder::backend::{EncodedPacket, EncoderBackend, EncoderParams, NativeEncoder};
use crate::encoder::picture::Picture;
use crate::error::{CodecError, Result};

const DEFAULT_CRF: u32 = 23;

#[derive(Clone, Debug, Default)]
pub struct X264Backend;

impl X264Backend {
    pub fn new() -> Self {
        Self
    }
}

fn ffmpeg_err(context: &str, err: ffmpeg::Error) -> CodecError {
    CodecError::encoder(format!("{}: {}", context, err))
}

fn is_drained(err: &ffmpeg::Error) -> bool {
    match err {
        ffmpeg::Error::Eof => true,
        ffmpeg::Error::Other { errno } => *errno == ffmpeg::util::error::EAGAIN,
        _ => false,
    }
}

impl EncoderBackend for X264Backend {
    fn name(&self) -> &'static str {
        "x264"
    }

    fn open(&self, params: &EncoderParams) -> Result<Box<dyn NativeEncoder>> {
        ffmpeg::init().map_err(|e| ffmpeg_err("initialize ffmpeg", e))?;
        let codec = ffmpeg::encoder::find_by_name("libx264")
            .ok_or_else(|| CodecError::encoder("ffmpeg was built without libx264"))?;

        let mut encoder = ffmpeg::codec::context::Context::new()
            .encoder()
            .video()
            .map_err(|e| ffmpeg_err("create encoder context", e))?;
        let fps = params.frame_rate as i32;
        encoder.set_width(params.width);
        encoder.set_height(params.height);
        encoder.set_format(ffmpeg::format::Pixel::YUV420P);
        encoder.set_time_base(ffmpeg::util::rational::Rational::new(1, fps));
        encoder.set_frame_rate(Some(ffmpeg::util::rational::Rational::new(fps, 1)));
        encoder.set_gop(params.keyframe_interval);

        let vbv_kbps = (params.bitrate / 1000).max(1);
        let mut x264_params = format!(
            "threads={}:keyint={}:vbv-maxrate={}:vbv-bufsize={}",
            params.threads, params.keyframe_interval, vbv_kbps, vbv_kbps
        );
        if params.intra_refresh {
            x264_params.push_str(":intra-refresh=1");
        }
        if params.annex_b {
            x264_params.push_str(":annexb=1");
        }

        let mut opts = ffmpeg::Dictionary::new();
        opts.set("preset", "veryfast");
        opts.set("tune", "zerolatency");
        opts.set("profile", "high");
        opts.set("crf", &DEFAULT_CRF.to_string());
        opts.set("x264-params", &x264_params);
        log::debug!("libx264 options: {}", x264_params);

        let encoder = encoder
            .open_as_with(codec, opts)
            .map_err(|e| ffmpeg_err("open libx264", e))?;

        log::info!(
            "x264 encoder opened {}x{} @ {} fps, vbv {} kbps",
            params.width,
            params.height,
            params.frame_rate,
            vbv_kbps
        );

        Ok(Box::new(X264Encoder {
            encoder,
            frame: ffmpeg::frame::Video::new(
                ffmpeg::format::Pixel::YUV420P,
                params.width,
                params.height,
            ),
        }))
    }
}

struct X264Encoder {
    encoder: ffmpeg::encoder::video::Encoder,
    frame: ffmpeg::frame::Video,
}

impl X264Encoder {
    /// Copy the scratch picture into the encoder-owned frame, plane by plane.
    fn fill_frame(&mut self, picture: &Picture) {
        let (w, h) = (picture.width() as usize, picture.height() as usize);
        let (y, u, v) = picture.planes();
        let planes = [(y, w, h), (u, w / 2, h / 2), (v, w / 2, h / 2)];
        for (index, (plane, row_bytes, rows)) in planes.into_iter().enumerate() {
            let dst_stride = self.frame.stride(index);
            let dst = self.frame.data_mut(index);
            for row in 0..rows {
                let start = row * dst_stride;
                dst[start..start + row_bytes].copy_from_slice(plane.row(row, row_bytes));
            }
        }
    }

    /// Collect every packet the encoder has ready. Errors other than "needs more input" and
    /// end of stream are encoder failures.
    fn drain(&mut self) -> Result<Vec<EncodedPacket>> {
        let mut packets = Vec::new();
        let mut packet = ffmpeg::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => {
                    if let Some(data) = packet.data() {
                        packets.push(EncodedPacket {
                            data: data.to_vec(),
                            pts: packet.pts().unwrap_or_default(),
                            keyframe: packet.is_key(),
                        });
                    }
                }
                Err(e) if is_drained(&e) => return Ok(packets),
                Err(e) => return Err(ffmpeg_err("receive packet from libx264", e)),
            }
        }
    }
}

impl NativeEncoder for X264Encoder {
    fn encode(&mut self, picture: &Picture, pts: i64) -> Result<Option<EncodedPacket>> {
        self.fill_frame(picture);
        self.frame.set_pts(Some(pts));
        self.encoder
            .send_frame(&self.frame)
            .map_err(|e| ffmpeg_err("send frame to libx264", e))?;

        // zerolatency emits one access unit per picture; any extra units are appended.
        let mut packets = self.drain()?.into_iter();
        let Some(mut first) = packets.next() else {
            return Ok(None);
        };
        for packet in packets {
            first.keyframe |= packet.keyframe;
            first.data.extend_from_slice(&packet.data);
        }
        Ok(Some(first))
    }

    fn flush(&mut self) -> Result<Vec<EncodedPacket>> {
        self.encoder
            .send_eof()
            .map_err(|e| ffmpeg_err("flush libx264", e))?;
        self.drain()
    }
}
