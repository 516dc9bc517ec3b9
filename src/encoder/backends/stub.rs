use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, VecDeque};

use crate::encoder::backend::{EncodedPacket, EncoderBackend, EncoderParams, NativeEncoder};
use crate::encoder::picture::Picture;
use crate::error::{CodecError, Result};

const START_CODE: [u8; 4] = [0, 0, 0, 1];
const NAL_IDR: u8 = 0x65;
const NAL_NON_IDR: u8 = 0x41;

/// In-process backend for tests and dry runs.
///
/// Each packet is an Annex B start code, a slice NAL header byte and the SHA-256 of the
/// visible picture samples. `delay` holds that many pictures back before emitting, like an
/// encoder with lookahead. Frames listed in `fail_on` report an encoder failure.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    delay: usize,
    fail_on: BTreeSet<u64>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: usize) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the given zero-based submission indices.
    pub fn failing_on(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.fail_on.extend(frames);
        self
    }
}

impl EncoderBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn open(&self, params: &EncoderParams) -> Result<Box<dyn NativeEncoder>> {
        if params.keyframe_interval == 0 {
            return Err(CodecError::encoder("keyframe interval must be non-zero"));
        }
        Ok(Box::new(StubEncoder {
            params: params.clone(),
            delay: self.delay,
            fail_on: self.fail_on.clone(),
            submitted: 0,
            encoded: 0,
            pending: VecDeque::with_capacity(self.delay + 1),
        }))
    }
}

pub struct StubEncoder {
    params: EncoderParams,
    delay: usize,
    fail_on: BTreeSet<u64>,
    submitted: u64,
    encoded: u64,
    pending: VecDeque<EncodedPacket>,
}

impl StubEncoder {
    fn digest(picture: &Picture) -> [u8; 32] {
        let (w, h) = (picture.width() as usize, picture.height() as usize);
        let (y, u, v) = picture.planes();
        let mut hasher = Sha256::new();
        for row in 0..h {
            hasher.update(y.row(row, w));
        }
        for row in 0..h / 2 {
            hasher.update(u.row(row, w / 2));
        }
        for row in 0..h / 2 {
            hasher.update(v.row(row, w / 2));
        }
        hasher.finalize().into()
    }
}

impl NativeEncoder for StubEncoder {
    fn encode(&mut self, picture: &Picture, pts: i64) -> Result<Option<EncodedPacket>> {
        let index = self.submitted;
        self.submitted += 1;
        if self.fail_on.contains(&index) {
            return Err(CodecError::encoder(format!(
                "stub encoder rejected frame {}",
                index
            )));
        }
        if picture.width() != self.params.width || picture.height() != self.params.height {
            return Err(CodecError::encoder(format!(
                "picture {}x{} does not match encoder {}x{}",
                picture.width(),
                picture.height(),
                self.params.width,
                self.params.height
            )));
        }

        let keyframe = self.encoded % self.params.keyframe_interval as u64 == 0;
        self.encoded += 1;

        let mut data = Vec::with_capacity(START_CODE.len() + 1 + 32);
        data.extend_from_slice(&START_CODE);
        data.push(if keyframe { NAL_IDR } else { NAL_NON_IDR });
        data.extend_from_slice(&Self::digest(picture));
        self.pending.push_back(EncodedPacket {
            data,
            pts,
            keyframe,
        });

        if self.pending.len() > self.delay {
            Ok(self.pending.pop_front())
        } else {
            Ok(None)
        }
    }

    fn flush(&mut self) -> Result<Vec<EncodedPacket>> {
        Ok(self.pending.drain(..).collect())
    }
}
