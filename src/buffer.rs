//! Borrowed stride-addressed image views.
//!
//! Views never own memory. Lengths are validated once by the converter entry point; row
//! accessors only carry debug assertions.

/// Read-only view of one plane.
#[derive(Clone, Copy, Debug)]
pub struct Plane<'a> {
    data: &'a [u8],
    stride: usize,
}

impl<'a> Plane<'a> {
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// `len` bytes starting at row `y`.
    #[inline]
    pub fn row(&self, y: usize, len: usize) -> &'a [u8] {
        let start = y * self.stride;
        debug_assert!(len <= self.stride, "row length exceeds stride");
        debug_assert!(start + len <= self.data.len(), "row {} out of bounds", y);
        let data: &'a [u8] = self.data;
        &data[start..start + len]
    }
}

/// Writable view of one plane.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    pub fn new(data: &'a mut [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize, len: usize) -> &mut [u8] {
        let start = y * self.stride;
        debug_assert!(len <= self.stride, "row length exceeds stride");
        debug_assert!(start + len <= self.data.len(), "row {} out of bounds", y);
        &mut self.data[start..start + len]
    }
}

/// Read-only frame view: base slice, stride, pixel extent.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    data: &'a [u8],
    stride: usize,
    width: u32,
    height: u32,
}

impl<'a> ImageView<'a> {
    pub fn new(data: &'a [u8], stride: usize, width: u32, height: u32) -> Self {
        Self {
            data,
            stride,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The whole buffer as a single plane (packed formats, or the luma plane).
    pub fn plane(&self) -> Plane<'a> {
        Plane::new(self.data, self.stride)
    }

    /// Y, U and V planes of an I420 image.
    pub fn i420_planes(&self) -> (Plane<'a>, Plane<'a>, Plane<'a>) {
        let (luma_len, chroma_stride, chroma_len) = i420_plane_sizes(self.stride, self.height);
        let data: &'a [u8] = self.data;
        let (y, rest) = data.split_at(luma_len);
        let (u, v) = rest.split_at(chroma_len);
        (
            Plane::new(y, self.stride),
            Plane::new(u, chroma_stride),
            Plane::new(v, chroma_stride),
        )
    }

    /// Y plane and interleaved UV plane of an NV12 image.
    pub fn nv12_planes(&self) -> (Plane<'a>, Plane<'a>) {
        let luma_len = self.stride * self.height();
        let data: &'a [u8] = self.data;
        let (y, uv) = data.split_at(luma_len);
        (Plane::new(y, self.stride), Plane::new(uv, self.stride))
    }
}

/// Writable frame view.
#[derive(Debug)]
pub struct ImageViewMut<'a> {
    data: &'a mut [u8],
    stride: usize,
    width: u32,
    height: u32,
}

impl<'a> ImageViewMut<'a> {
    pub fn new(data: &'a mut [u8], stride: usize, width: u32, height: u32) -> Self {
        Self {
            data,
            stride,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn plane_mut(&mut self) -> PlaneMut<'_> {
        PlaneMut::new(&mut *self.data, self.stride)
    }

    pub fn i420_planes_mut(&mut self) -> (PlaneMut<'_>, PlaneMut<'_>, PlaneMut<'_>) {
        let (luma_len, chroma_stride, chroma_len) = i420_plane_sizes(self.stride, self.height);
        let (y, rest) = self.data.split_at_mut(luma_len);
        let (u, v) = rest.split_at_mut(chroma_len);
        (
            PlaneMut::new(y, self.stride),
            PlaneMut::new(u, chroma_stride),
            PlaneMut::new(v, chroma_stride),
        )
    }
}

/// Luma length, chroma stride and chroma length for an I420 image.
///
/// Each chroma plane is exactly a quarter of the luma plane when the stride is even.
pub fn i420_plane_sizes(stride: usize, height: u32) -> (usize, usize, usize) {
    let h = height as usize;
    let chroma_stride = stride / 2;
    (stride * h, chroma_stride, chroma_stride * (h / 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i420_planes_split_at_quarter_boundaries() {
        let data: Vec<u8> = (0..48u8).collect();
        let view = ImageView::new(&data, 8, 8, 4);
        let (y, u, v) = view.i420_planes();
        assert_eq!(y.row(0, 8)[0], 0);
        assert_eq!(u.row(0, 4)[0], 32);
        assert_eq!(u.stride(), 4);
        assert_eq!(v.row(0, 4)[0], 40);
        assert_eq!(v.row(1, 4)[3], 47);
    }

    #[test]
    fn rows_skip_padding() {
        let data = [1u8, 2, 0xEE, 3, 4, 0xEE];
        let plane = ImageView::new(&data, 3, 2, 2).plane();
        assert_eq!(plane.row(0, 2), &[1, 2]);
        assert_eq!(plane.row(1, 2), &[3, 4]);
    }

    #[test]
    fn non_square_plane_sizes() {
        let (luma, chroma_stride, chroma) = i420_plane_sizes(640, 360);
        assert_eq!(luma, 640 * 360);
        assert_eq!(chroma_stride, 320);
        assert_eq!(chroma * 4, luma);
    }
}
