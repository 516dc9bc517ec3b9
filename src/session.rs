//! Single-stream encoder session.
//!
//! A session owns one native encoder instance and one scratch picture. Both are acquired by
//! [`EncoderSession::configure`] and released together, exactly once, by
//! [`EncoderSession::close`] or on drop.
//!
//! ```text
//! Unconfigured --configure--> Configured --encode_frame--> Encoding
//!       |                          |                          |
//!       +----------close-----------+-----------close----------+--> Closed
//! ```

use std::fmt;
use std::sync::Arc;

use crate::attribute::VideoCodecAttribute;
use crate::convert::{Converter, FormatConverter};
use crate::encoder::{EncodedPacket, EncoderBackend, EncoderParams, NativeEncoder, Picture};
use crate::error::{CodecError, Result};
use crate::format::PixelFormat;
use crate::frame::VideoFrame;

/// Layout every native encoder consumes.
pub const ENCODER_INPUT_FORMAT: PixelFormat = PixelFormat::I420;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Encoding,
    Closed,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Unconfigured => "unconfigured",
            SessionState::Configured => "configured",
            SessionState::Encoding => "encoding",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of submitting one frame.
#[derive(Debug, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The encoder produced a packet on this call.
    Packet(EncodedPacket),
    /// The frame was accepted and buffered; output will arrive on a later call or on flush.
    Pending,
}

impl EncodeOutcome {
    pub fn into_packet(self) -> Option<EncodedPacket> {
        match self {
            EncodeOutcome::Packet(packet) => Some(packet),
            EncodeOutcome::Pending => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_submitted: u64,
    pub packets_emitted: u64,
    pub bytes_emitted: u64,
    pub frames_dropped: u64,
}

/// Native encoder plus its scratch picture and resolved input conversion.
struct EncoderHandle {
    encoder: Box<dyn NativeEncoder>,
    picture: Picture,
    converter: Converter,
    attribute: VideoCodecAttribute,
    next_pts: i64,
}

pub struct EncoderSession {
    backend: Arc<dyn EncoderBackend>,
    state: SessionState,
    handle: Option<EncoderHandle>,
    stats: SessionStats,
}

impl EncoderSession {
    pub fn new(backend: Arc<dyn EncoderBackend>) -> Self {
        Self {
            backend,
            state: SessionState::Unconfigured,
            handle: None,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Attribute the session was configured with, while it holds an encoder.
    pub fn attribute(&self) -> Option<&VideoCodecAttribute> {
        self.handle.as_ref().map(|handle| &handle.attribute)
    }

    /// Source format the session converts from, while it holds an encoder.
    pub fn source_format(&self) -> Option<PixelFormat> {
        self.handle.as_ref().map(|handle| handle.converter.from())
    }

    /// Resolve the input conversion, allocate the scratch picture and open the encoder.
    ///
    /// Any failure leaves the session `Unconfigured` with nothing held.
    pub fn configure(
        &mut self,
        attribute: &VideoCodecAttribute,
        source_format: PixelFormat,
    ) -> Result<()> {
        if self.state != SessionState::Unconfigured {
            return Err(CodecError::InvalidState {
                operation: "configure",
                state: self.state.name(),
            });
        }
        attribute.validate()?;

        let converter = FormatConverter::resolve(source_format, ENCODER_INPUT_FORMAT)?;
        let picture = Picture::alloc(attribute.width, attribute.height)?;
        let params = EncoderParams::from(attribute);
        let encoder = self.backend.open(&params)?;

        log::info!(
            "session configured: backend={} {}x{} @ {} fps, {} bps, input {}",
            self.backend.name(),
            attribute.width,
            attribute.height,
            attribute.frame_rate,
            attribute.bitrate,
            source_format
        );

        self.handle = Some(EncoderHandle {
            encoder,
            picture,
            converter,
            attribute: *attribute,
            next_pts: 0,
        });
        self.state = SessionState::Configured;
        Ok(())
    }

    /// Convert `frame` into the scratch picture and submit it.
    ///
    /// An `EncoderFailure` drops this frame only; the session remains usable.
    pub fn encode_frame(&mut self, frame: Option<&VideoFrame<'_>>) -> Result<EncodeOutcome> {
        let handle = match (self.state, self.handle.as_mut()) {
            (SessionState::Configured | SessionState::Encoding, Some(handle)) => handle,
            (state, _) => {
                return Err(CodecError::InvalidState {
                    operation: "encode_frame",
                    state: state.name(),
                })
            }
        };
        let frame = frame.ok_or_else(|| CodecError::invalid("no frame supplied"))?;

        if frame.format != handle.converter.from() {
            return Err(CodecError::invalid(format!(
                "frame format {} does not match configured input {}",
                frame.format,
                handle.converter.from()
            )));
        }
        let attr = &handle.attribute;
        if frame.width != attr.width || frame.height != attr.height {
            return Err(CodecError::invalid(format!(
                "frame {}x{} does not match configured {}x{}",
                frame.width, frame.height, attr.width, attr.height
            )));
        }

        let stride = handle.picture.stride();
        handle.converter.convert(
            handle.picture.as_mut_bytes(),
            stride,
            frame.data,
            frame.stride,
            frame.width,
            frame.height,
        )?;

        self.state = SessionState::Encoding;
        self.stats.frames_submitted += 1;
        let pts = handle.next_pts;
        handle.next_pts += 1;

        match handle.encoder.encode(&handle.picture, pts) {
            Ok(Some(packet)) => {
                self.stats.packets_emitted += 1;
                self.stats.bytes_emitted += packet.len() as u64;
                log::trace!(
                    "pts {} -> {} bytes (keyframe={})",
                    pts,
                    packet.len(),
                    packet.keyframe
                );
                Ok(EncodeOutcome::Packet(packet))
            }
            Ok(None) => Ok(EncodeOutcome::Pending),
            Err(e) => {
                self.stats.frames_dropped += 1;
                log::warn!("frame {} dropped: {}", pts, e);
                Err(e)
            }
        }
    }

    /// Drain packets the encoder is still holding back.
    pub fn flush(&mut self) -> Result<Vec<EncodedPacket>> {
        let handle = match (self.state, self.handle.as_mut()) {
            (SessionState::Configured | SessionState::Encoding, Some(handle)) => handle,
            (state, _) => {
                return Err(CodecError::InvalidState {
                    operation: "flush",
                    state: state.name(),
                })
            }
        };
        let packets = handle.encoder.flush()?;
        self.stats.packets_emitted += packets.len() as u64;
        self.stats.bytes_emitted += packets.iter().map(|p| p.len() as u64).sum::<u64>();
        Ok(packets)
    }

    /// Release the encoder and scratch picture. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Some(handle) = self.handle.take() {
            log::info!(
                "session closed: backend={} frames={} packets={} bytes={} dropped={}",
                self.backend.name(),
                self.stats.frames_submitted,
                self.stats.packets_emitted,
                self.stats.bytes_emitted,
                self.stats.frames_dropped
            );
            drop(handle);
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        self.close();
    }
}
