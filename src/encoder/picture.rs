use crate::buffer::{ImageView, Plane};
use crate::error::{CodecError, Result};
use crate::format::PixelFormat;

const STRIDE_ALIGN: usize = 32;

/// Scratch I420 picture an encoder session converts into.
///
/// The luma stride is rounded up to a 32-byte boundary, so rows carry padding that the
/// converters never write and the encoders never read.
#[derive(Debug)]
pub struct Picture {
    data: Vec<u8>,
    stride: usize,
    width: u32,
    height: u32,
}

impl Picture {
    pub fn alloc(width: u32, height: u32) -> Result<Self> {
        PixelFormat::I420.check_dimensions(width, height)?;
        let stride = (width as usize)
            .checked_next_multiple_of(STRIDE_ALIGN)
            .ok_or_else(|| CodecError::invalid("picture width overflows"))?;
        let len = PixelFormat::I420
            .buffer_len(width, stride, height)
            .ok_or_else(|| CodecError::invalid("picture dimensions overflow"))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            CodecError::invalid(format!("cannot allocate {} byte picture: {}", len, e))
        })?;
        data.resize(len, 0u8);
        log::debug!(
            "allocated {}x{} I420 picture, stride {}, {} bytes",
            width,
            height,
            stride,
            len
        );
        Ok(Self {
            data,
            stride,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma stride. Chroma planes use half of it.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn chroma_stride(&self) -> usize {
        self.stride / 2
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Y, U and V planes.
    pub fn planes(&self) -> (Plane<'_>, Plane<'_>, Plane<'_>) {
        ImageView::new(&self.data, self.stride, self.width, self.height).i420_planes()
    }

    /// Whole backing buffer, planes laid out contiguously.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_aligned() {
        let picture = Picture::alloc(100, 60).unwrap();
        assert_eq!(picture.stride(), 128);
        assert_eq!(picture.chroma_stride(), 64);
        assert_eq!(picture.byte_len(), 128 * 60 + 2 * 64 * 30);
    }

    #[test]
    fn rejects_odd_dimensions() {
        assert!(matches!(
            Picture::alloc(101, 60),
            Err(CodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unallocatable_size_is_an_error() {
        assert!(matches!(
            Picture::alloc(1 << 30, 1 << 30),
            Err(CodecError::InvalidArgument(_))
        ));
    }
}
