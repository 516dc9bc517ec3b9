//! Pixel format identifiers and their memory layouts.
//!
//! Packed formats store one row per stride. Planar formats are addressed from a single base:
//! the luma plane (`stride × height`) comes first, followed by the chroma plane(s).
//!
//! | Format | Bytes                         | Chroma                       |
//! |--------|-------------------------------|------------------------------|
//! | Rgb24  | R G B                         | -                            |
//! | Rgb32  | R G B X                       | -                            |
//! | Yuy2   | Y0 U Y1 V per 2 pixels        | 4:2:2 packed                 |
//! | Uyvy   | U Y0 V Y1 per 2 pixels        | 4:2:2 packed                 |
//! | I420   | Y plane, U plane, V plane     | 4:2:0, `stride/2` per row    |
//! | Nv12   | Y plane, interleaved UV plane | 4:2:0, `stride` per row      |

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgb24,
    Rgb32,
    Yuy2,
    Uyvy,
    I420,
    Nv12,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 6] = [
        PixelFormat::Rgb24,
        PixelFormat::Rgb32,
        PixelFormat::Yuy2,
        PixelFormat::Uyvy,
        PixelFormat::I420,
        PixelFormat::Nv12,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Rgb32 => "rgb32",
            PixelFormat::Yuy2 => "yuy2",
            PixelFormat::Uyvy => "uyvy",
            PixelFormat::I420 => "i420",
            PixelFormat::Nv12 => "nv12",
        }
    }

    /// Four-character code identifying the layout.
    pub fn fourcc(self) -> [u8; 4] {
        match self {
            PixelFormat::Rgb24 => *b"RGB3",
            PixelFormat::Rgb32 => *b"RGB4",
            PixelFormat::Yuy2 => *b"YUY2",
            PixelFormat::Uyvy => *b"UYVY",
            PixelFormat::I420 => *b"I420",
            PixelFormat::Nv12 => *b"NV12",
        }
    }

    pub fn from_fourcc(fourcc: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.fourcc() == fourcc)
    }

    pub fn is_planar(self) -> bool {
        matches!(self, PixelFormat::I420 | PixelFormat::Nv12)
    }

    /// Bytes of one row of pixel data (the luma row for planar formats).
    pub fn row_bytes(self, width: u32) -> usize {
        let w = width as usize;
        match self {
            PixelFormat::Rgb24 => w * 3,
            PixelFormat::Rgb32 => w * 4,
            PixelFormat::Yuy2 | PixelFormat::Uyvy => w * 2,
            PixelFormat::I420 | PixelFormat::Nv12 => w,
        }
    }

    /// Minimum buffer length for an image of `height` rows at `stride`.
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn buffer_len(self, width: u32, stride: usize, height: u32) -> Option<usize> {
        let h = height as usize;
        match self {
            PixelFormat::I420 => {
                let luma = stride.checked_mul(h)?;
                let chroma = (stride / 2).checked_mul(h / 2)?;
                luma.checked_add(chroma.checked_mul(2)?)
            }
            PixelFormat::Nv12 => {
                let luma = stride.checked_mul(h)?;
                luma.checked_add(stride.checked_mul(h / 2)?)
            }
            _ => {
                if h == 0 {
                    return Some(0);
                }
                stride
                    .checked_mul(h - 1)?
                    .checked_add(self.row_bytes(width))
            }
        }
    }

    /// Checks subsampling constraints on the frame dimensions.
    ///
    /// 4:2:2 packed formats need an even width; 4:2:0 formats need even width and height.
    /// Odd widths are rejected rather than truncated.
    pub fn check_dimensions(self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(CodecError::invalid(format!(
                "{} frame dimensions must be non-zero, got {}x{}",
                self, width, height
            )));
        }
        match self {
            PixelFormat::Yuy2 | PixelFormat::Uyvy if width % 2 != 0 => Err(CodecError::invalid(
                format!("{} requires an even width, got {}", self, width),
            )),
            PixelFormat::I420 | PixelFormat::Nv12 if width % 2 != 0 || height % 2 != 0 => {
                Err(CodecError::invalid(format!(
                    "{} requires even width and height, got {}x{}",
                    self, width, height
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| CodecError::invalid(format!("unknown pixel format '{}'", s)))
    }
}
