//! Frame pipeline.
//!
//! Receives captured frames from the capture collaborator, dispatches them by kind, and drives
//! the encoder session for video. Audio frames are accepted and counted but never encoded.

use std::sync::Arc;

use crate::attribute::{
    AudioCaptureAttribute, AudioCodecAttribute, SourceAttribute, VideoCaptureAttribute,
    VideoCodecAttribute,
};
use crate::encoder::{EncodedPacket, EncoderBackend};
use crate::error::{CodecError, Result};
use crate::frame::CaptureFrame;
use crate::session::{EncodeOutcome, EncoderSession, SessionStats};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl PipelineState {
    pub fn name(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Paused => "paused",
            PipelineState::Stopped => "stopped",
        }
    }
}

/// What happened to a frame handed to [`FramePipeline::send_frame`].
#[derive(Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Video(EncodeOutcome),
    /// Audio frame accepted; there is no audio encoder.
    Audio,
    /// Pipeline is paused; the frame was discarded.
    Dropped,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub video_frames: u64,
    pub audio_frames: u64,
    pub paused_drops: u64,
}

pub struct FramePipeline {
    session: EncoderSession,
    state: PipelineState,
    video_source: Option<VideoCaptureAttribute>,
    audio_source: Option<AudioCaptureAttribute>,
    video_codec: Option<VideoCodecAttribute>,
    audio_codec: Option<AudioCodecAttribute>,
    stats: PipelineStats,
}

impl FramePipeline {
    pub fn new(backend: Arc<dyn EncoderBackend>) -> Self {
        Self {
            session: EncoderSession::new(backend),
            state: PipelineState::Idle,
            video_source: None,
            audio_source: None,
            video_codec: None,
            audio_codec: None,
            stats: PipelineStats::default(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn session_stats(&self) -> &SessionStats {
        self.session.stats()
    }

    pub fn session(&self) -> &EncoderSession {
        &self.session
    }

    pub fn video_source(&self) -> Option<&VideoCaptureAttribute> {
        self.video_source.as_ref()
    }

    pub fn audio_source(&self) -> Option<&AudioCaptureAttribute> {
        self.audio_source.as_ref()
    }

    pub fn audio_codec(&self) -> Option<&AudioCodecAttribute> {
        self.audio_codec.as_ref()
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        if self.state != PipelineState::Idle {
            return Err(CodecError::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    /// Record what the capture source delivers. Only valid before `start`.
    pub fn set_source_attribute(&mut self, attribute: SourceAttribute) -> Result<()> {
        self.require_idle("set_source_attribute")?;
        match attribute {
            SourceAttribute::Video(video) => {
                video.format.check_dimensions(video.width, video.height)?;
                log::debug!(
                    "video source: {} {}x{} @ {} fps",
                    video.format,
                    video.width,
                    video.height,
                    video.frame_rate
                );
                self.video_source = Some(video);
            }
            SourceAttribute::Audio(audio) => {
                log::debug!(
                    "audio source: {} Hz, {} ch, {} bit",
                    audio.sample_rate,
                    audio.channels,
                    audio.bits_per_sample
                );
                self.audio_source = Some(audio);
            }
        }
        Ok(())
    }

    pub fn set_video_codec_attribute(&mut self, attribute: VideoCodecAttribute) -> Result<()> {
        self.require_idle("set_video_codec_attribute")?;
        attribute.validate()?;
        self.video_codec = Some(attribute);
        Ok(())
    }

    /// Stored only; the audio path performs no encoding.
    pub fn set_audio_codec_attribute(&mut self, attribute: AudioCodecAttribute) -> Result<()> {
        self.require_idle("set_audio_codec_attribute")?;
        self.audio_codec = Some(attribute);
        Ok(())
    }

    /// Configure the encoder session from the stored attributes and begin accepting frames.
    pub fn start(&mut self) -> Result<()> {
        self.require_idle("start")?;
        let source = self
            .video_source
            .ok_or_else(|| CodecError::invalid("video source attribute not set"))?;
        let codec = self
            .video_codec
            .ok_or_else(|| CodecError::invalid("video codec attribute not set"))?;
        if source.width != codec.width || source.height != codec.height {
            return Err(CodecError::invalid(format!(
                "source {}x{} does not match codec {}x{}",
                source.width, source.height, codec.width, codec.height
            )));
        }

        self.session.configure(&codec, source.format)?;
        self.state = PipelineState::Running;
        log::info!("pipeline started ({})", self.session.backend_name());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != PipelineState::Running {
            return Err(CodecError::InvalidState {
                operation: "pause",
                state: self.state.name(),
            });
        }
        self.state = PipelineState::Paused;
        log::info!("pipeline paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != PipelineState::Paused {
            return Err(CodecError::InvalidState {
                operation: "resume",
                state: self.state.name(),
            });
        }
        self.state = PipelineState::Running;
        log::info!("pipeline resumed");
        Ok(())
    }

    /// Drain the encoder and close the session. Returns the drained packets.
    ///
    /// Stopping an idle or already stopped pipeline returns no packets.
    pub fn stop(&mut self) -> Result<Vec<EncodedPacket>> {
        let packets = match self.state {
            PipelineState::Running | PipelineState::Paused => self.session.flush(),
            PipelineState::Idle | PipelineState::Stopped => Ok(Vec::new()),
        };
        self.session.close();
        if self.state != PipelineState::Stopped {
            log::info!(
                "pipeline stopped: video={} audio={} paused_drops={}",
                self.stats.video_frames,
                self.stats.audio_frames,
                self.stats.paused_drops
            );
        }
        self.state = PipelineState::Stopped;
        packets
    }

    /// Dispatch one captured frame.
    pub fn send_frame(&mut self, frame: Option<&CaptureFrame<'_>>) -> Result<FrameOutcome> {
        let frame = frame.ok_or_else(|| CodecError::invalid("no frame supplied"))?;
        match self.state {
            PipelineState::Running => {}
            PipelineState::Paused => {
                self.stats.paused_drops += 1;
                return Ok(FrameOutcome::Dropped);
            }
            state => {
                return Err(CodecError::InvalidState {
                    operation: "send_frame",
                    state: state.name(),
                })
            }
        }

        match frame {
            CaptureFrame::Video(video) => {
                self.stats.video_frames += 1;
                self.session
                    .encode_frame(Some(video))
                    .map(FrameOutcome::Video)
            }
            CaptureFrame::Audio(_) => {
                self.stats.audio_frames += 1;
                Ok(FrameOutcome::Audio)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::StubBackend;
    use crate::format::PixelFormat;
    use crate::frame::{AudioFrame, RawFrame};

    fn pipeline() -> FramePipeline {
        let mut pipeline = FramePipeline::new(Arc::new(StubBackend::new()));
        pipeline
            .set_source_attribute(SourceAttribute::Video(VideoCaptureAttribute {
                format: PixelFormat::Yuy2,
                width: 32,
                height: 16,
                frame_rate: 30,
            }))
            .unwrap();
        pipeline
            .set_video_codec_attribute(VideoCodecAttribute {
                width: 32,
                height: 16,
                frame_rate: 30,
                bitrate: 250_000,
            })
            .unwrap();
        pipeline
    }

    #[test]
    fn start_requires_attributes() {
        let mut pipeline = FramePipeline::new(Arc::new(StubBackend::new()));
        assert!(matches!(
            pipeline.start(),
            Err(CodecError::InvalidArgument(_))
        ));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn unsupported_source_keeps_pipeline_idle() {
        // Yuy2 only converts to Rgb32, never to the encoder's I420 input.
        let mut pipeline = pipeline();
        assert!(matches!(
            pipeline.start(),
            Err(CodecError::UnsupportedFormat { .. })
        ));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[test]
    fn paused_frames_are_dropped_and_counted() {
        let mut pipeline = FramePipeline::new(Arc::new(StubBackend::new()));
        pipeline
            .set_source_attribute(SourceAttribute::Video(VideoCaptureAttribute {
                format: PixelFormat::Nv12,
                width: 16,
                height: 16,
                frame_rate: 30,
            }))
            .unwrap();
        pipeline
            .set_video_codec_attribute(VideoCodecAttribute {
                width: 16,
                height: 16,
                frame_rate: 30,
                bitrate: 250_000,
            })
            .unwrap();
        pipeline.start().unwrap();

        let raw = RawFrame::zeroed(PixelFormat::Nv12, 16, 16, 0).unwrap();
        let frame = CaptureFrame::Video(raw.as_video());
        assert!(matches!(
            pipeline.send_frame(Some(&frame)).unwrap(),
            FrameOutcome::Video(EncodeOutcome::Packet(_))
        ));

        pipeline.pause().unwrap();
        assert_eq!(
            pipeline.send_frame(Some(&frame)).unwrap(),
            FrameOutcome::Dropped
        );
        pipeline.resume().unwrap();

        let samples = [0u8; 8];
        let audio = CaptureFrame::Audio(AudioFrame {
            samples: &samples,
            sample_rate: 48_000,
            channels: 2,
        });
        assert_eq!(
            pipeline.send_frame(Some(&audio)).unwrap(),
            FrameOutcome::Audio
        );

        assert!(pipeline.stop().unwrap().is_empty());
        assert_eq!(
            pipeline.stats(),
            &PipelineStats {
                video_frames: 1,
                audio_frames: 1,
                paused_drops: 1,
            }
        );
        assert_eq!(pipeline.session_stats().frames_submitted, 1);
        assert!(matches!(
            pipeline.send_frame(Some(&frame)),
            Err(CodecError::InvalidState { .. })
        ));
    }

    #[test]
    fn attributes_are_frozen_after_start() {
        let mut pipeline = FramePipeline::new(Arc::new(StubBackend::new()));
        pipeline
            .set_source_attribute(SourceAttribute::Video(VideoCaptureAttribute {
                format: PixelFormat::I420,
                width: 16,
                height: 16,
                frame_rate: 30,
            }))
            .unwrap();
        pipeline
            .set_video_codec_attribute(VideoCodecAttribute {
                width: 16,
                height: 16,
                frame_rate: 30,
                bitrate: 250_000,
            })
            .unwrap();
        pipeline.start().unwrap();
        assert!(pipeline
            .set_audio_codec_attribute(AudioCodecAttribute {
                sample_rate: 48_000,
                channels: 2,
                bitrate: 128_000,
            })
            .is_err());
        assert!(pipeline.resume().is_err());
    }
}
