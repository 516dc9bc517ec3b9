//! Format conversion registry.
//!
//! Each registered entry maps an exact `(from, to)` pixel-format pair to a transform. The
//! table is built once per process and never mutated afterwards. Callers on the frame path
//! resolve a [`Converter`] once and reuse it, so no per-frame lookup happens.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::buffer::{ImageView, ImageViewMut, Plane, PlaneMut};
use crate::color::ycrcb_to_rgb;
use crate::error::{CodecError, Result};
use crate::format::PixelFormat;

/// Transform from a validated source view into a validated destination view.
pub type TransformFn = fn(&mut ImageViewMut<'_>, &ImageView<'_>);

#[derive(Clone, Copy)]
pub struct ConversionEntry {
    pub from: PixelFormat,
    pub to: PixelFormat,
    transform: TransformFn,
}

impl std::fmt::Debug for ConversionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEntry")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

static CONVERSIONS: [ConversionEntry; 7] = [
    ConversionEntry {
        from: PixelFormat::Rgb32,
        to: PixelFormat::Rgb32,
        transform: rgb32_copy,
    },
    ConversionEntry {
        from: PixelFormat::Rgb24,
        to: PixelFormat::Rgb32,
        transform: rgb24_to_rgb32,
    },
    ConversionEntry {
        from: PixelFormat::Yuy2,
        to: PixelFormat::Rgb32,
        transform: yuy2_to_rgb32,
    },
    ConversionEntry {
        from: PixelFormat::Uyvy,
        to: PixelFormat::Rgb32,
        transform: uyvy_to_rgb32,
    },
    ConversionEntry {
        from: PixelFormat::I420,
        to: PixelFormat::I420,
        transform: i420_copy,
    },
    ConversionEntry {
        from: PixelFormat::Nv12,
        to: PixelFormat::I420,
        transform: nv12_to_i420,
    },
    ConversionEntry {
        from: PixelFormat::Nv12,
        to: PixelFormat::Rgb32,
        transform: nv12_to_rgb32,
    },
];

fn registry() -> &'static HashMap<(PixelFormat, PixelFormat), ConversionEntry> {
    static REGISTRY: OnceLock<HashMap<(PixelFormat, PixelFormat), ConversionEntry>> =
        OnceLock::new();
    REGISTRY.get_or_init(|| {
        CONVERSIONS
            .iter()
            .map(|entry| ((entry.from, entry.to), *entry))
            .collect()
    })
}

/// Entry point to the process-wide conversion table.
pub struct FormatConverter;

impl FormatConverter {
    /// Resolve the transform for an exact format pair.
    pub fn resolve(from: PixelFormat, to: PixelFormat) -> Result<Converter> {
        registry()
            .get(&(from, to))
            .map(|entry| Converter { entry: *entry })
            .ok_or(CodecError::UnsupportedFormat { from, to })
    }

    pub fn is_supported(from: PixelFormat, to: PixelFormat) -> bool {
        registry().contains_key(&(from, to))
    }

    /// All registered pairs, in registration order.
    pub fn pairs() -> impl Iterator<Item = (PixelFormat, PixelFormat)> {
        CONVERSIONS.iter().map(|entry| (entry.from, entry.to))
    }

    /// One-shot conversion. Resolves the pair, validates both buffers, then transforms.
    #[allow(clippy::too_many_arguments)]
    pub fn convert(
        from: PixelFormat,
        to: PixelFormat,
        dst: &mut [u8],
        dst_stride: usize,
        src: &[u8],
        src_stride: usize,
        width: u32,
        height: u32,
    ) -> Result<()> {
        Self::resolve(from, to)?.convert(dst, dst_stride, src, src_stride, width, height)
    }
}

/// A resolved conversion for one format pair.
#[derive(Clone, Copy, Debug)]
pub struct Converter {
    entry: ConversionEntry,
}

impl Converter {
    pub fn from(&self) -> PixelFormat {
        self.entry.from
    }

    pub fn to(&self) -> PixelFormat {
        self.entry.to
    }

    /// Convert `height` rows of `width` pixels. Nothing is written unless every
    /// precondition holds.
    pub fn convert(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        src: &[u8],
        src_stride: usize,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (from, to) = (self.entry.from, self.entry.to);
        from.check_dimensions(width, height)?;
        to.check_dimensions(width, height)?;
        check_buffer(from, "source", src.len(), src_stride, width, height)?;
        check_buffer(to, "destination", dst.len(), dst_stride, width, height)?;

        let src = ImageView::new(src, src_stride, width, height);
        let mut dst = ImageViewMut::new(dst, dst_stride, width, height);
        (self.entry.transform)(&mut dst, &src);
        Ok(())
    }
}

fn check_buffer(
    format: PixelFormat,
    role: &str,
    len: usize,
    stride: usize,
    width: u32,
    height: u32,
) -> Result<()> {
    let row = format.row_bytes(width);
    if stride < row {
        return Err(CodecError::invalid(format!(
            "{} stride {} is shorter than a {} row of {} bytes",
            role, stride, format, row
        )));
    }
    let expected = format
        .buffer_len(width, stride, height)
        .ok_or_else(|| CodecError::invalid(format!("{} frame dimensions overflow", role)))?;
    if len < expected {
        return Err(CodecError::invalid(format!(
            "{} buffer too small for {} {}x{} at stride {}: expected {}, got {}",
            role, format, width, height, stride, expected, len
        )));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Transforms
// ----------------------------------------------------------------------------

fn copy_rows(dst: &mut PlaneMut<'_>, src: &Plane<'_>, row_bytes: usize, rows: usize) {
    for y in 0..rows {
        dst.row_mut(y, row_bytes)
            .copy_from_slice(src.row(y, row_bytes));
    }
}

/// RGB32 to RGB32 across differing row padding.
fn rgb32_copy(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    let (w, h) = (src.width(), src.height());
    copy_rows(&mut dst.plane_mut(), &src.plane(), w * 4, h);
}

fn rgb24_to_rgb32(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    let (w, h) = (src.width(), src.height());
    let src_plane = src.plane();
    let mut dst_plane = dst.plane_mut();
    for y in 0..h {
        let src_row = src_plane.row(y, w * 3);
        let dst_row = dst_plane.row_mut(y, w * 4);
        for (out, px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(3)) {
            out[0] = px[0];
            out[1] = px[1];
            out[2] = px[2];
            out[3] = 0xFF;
        }
    }
}

/// Byte offsets of the samples inside one 4:2:2 macropixel.
struct Packed422 {
    y0: usize,
    u: usize,
    y1: usize,
    v: usize,
}

const YUY2_ORDER: Packed422 = Packed422 {
    y0: 0,
    u: 1,
    y1: 2,
    v: 3,
};

const UYVY_ORDER: Packed422 = Packed422 {
    u: 0,
    y0: 1,
    v: 2,
    y1: 3,
};

fn packed_422_to_rgb32(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>, order: &Packed422) {
    let (w, h) = (src.width(), src.height());
    debug_assert!(w % 2 == 0, "4:2:2 width must be even");
    let src_plane = src.plane();
    let mut dst_plane = dst.plane_mut();
    for y in 0..h {
        let src_row = src_plane.row(y, w * 2);
        let dst_row = dst_plane.row_mut(y, w * 4);
        for (out, mp) in dst_row.chunks_exact_mut(8).zip(src_row.chunks_exact(4)) {
            let (u, v) = (mp[order.u], mp[order.v]);
            ycrcb_to_rgb(mp[order.y0], v, u).write_rgb32(&mut out[..4]);
            ycrcb_to_rgb(mp[order.y1], v, u).write_rgb32(&mut out[4..]);
        }
    }
}

fn yuy2_to_rgb32(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    packed_422_to_rgb32(dst, src, &YUY2_ORDER);
}

fn uyvy_to_rgb32(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    packed_422_to_rgb32(dst, src, &UYVY_ORDER);
}

/// I420 to I420 across differing row padding, plane by plane.
fn i420_copy(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    let (w, h) = (src.width(), src.height());
    let (src_y, src_u, src_v) = src.i420_planes();
    let (mut dst_y, mut dst_u, mut dst_v) = dst.i420_planes_mut();
    copy_rows(&mut dst_y, &src_y, w, h);
    copy_rows(&mut dst_u, &src_u, w / 2, h / 2);
    copy_rows(&mut dst_v, &src_v, w / 2, h / 2);
}

/// Semi-planar to planar 4:2:0. Luma is copied row by row; the interleaved chroma rows are
/// split into the U plane then the V plane.
fn nv12_to_i420(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    let (w, h) = (src.width(), src.height());
    let (src_y, src_uv) = src.nv12_planes();
    let (mut dst_y, mut dst_u, mut dst_v) = dst.i420_planes_mut();

    copy_rows(&mut dst_y, &src_y, w, h);

    for row in 0..h / 2 {
        let uv = src_uv.row(row, w);
        let u_row = dst_u.row_mut(row, w / 2);
        for (out, pair) in u_row.iter_mut().zip(uv.chunks_exact(2)) {
            *out = pair[0];
        }
        let v_row = dst_v.row_mut(row, w / 2);
        for (out, pair) in v_row.iter_mut().zip(uv.chunks_exact(2)) {
            *out = pair[1];
        }
    }
}

fn nv12_to_rgb32(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    let (w, h) = (src.width(), src.height());
    let (src_y, src_uv) = src.nv12_planes();
    let mut dst_plane = dst.plane_mut();
    for y in 0..h {
        let luma = src_y.row(y, w);
        let uv = src_uv.row(y / 2, w);
        let out_row = dst_plane.row_mut(y, w * 4);
        for (x, out) in out_row.chunks_exact_mut(4).enumerate() {
            let pair = x & !1;
            ycrcb_to_rgb(luma[x], uv[pair + 1], uv[pair]).write_rgb32(out);
        }
    }
}
