//! Fixed-point BT.601 luma/chroma decode.

/// One decoded pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Writes the pixel as `R G B X` with an opaque fourth byte.
    #[inline]
    pub fn write_rgb32(self, out: &mut [u8]) {
        out[0] = self.r;
        out[1] = self.g;
        out[2] = self.b;
        out[3] = 0xFF;
    }
}

#[inline]
pub fn clip(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Decodes a studio-range Y/Cr/Cb triple to full-range RGB.
#[inline]
pub fn ycrcb_to_rgb(y: u8, cr: u8, cb: u8) -> Rgb {
    let c = y as i32 - 16;
    let d = cb as i32 - 128;
    let e = cr as i32 - 128;

    Rgb {
        r: clip((298 * c + 409 * e + 128) >> 8),
        g: clip((298 * c - 100 * d - 208 * e + 128) >> 8),
        b: clip((298 * c + 516 * d + 128) >> 8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_bounds() {
        assert_eq!(clip(-1), 0);
        assert_eq!(clip(0), 0);
        assert_eq!(clip(128), 128);
        assert_eq!(clip(255), 255);
        assert_eq!(clip(70_000), 255);
    }

    #[test]
    fn studio_white_and_black() {
        assert_eq!(ycrcb_to_rgb(235, 128, 128), Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(ycrcb_to_rgb(16, 128, 128), Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn saturated_chroma_clips_instead_of_wrapping() {
        // Black luma with full red chroma: R overshoots, B undershoots.
        let px = ycrcb_to_rgb(16, 255, 0);
        assert_eq!(px.r, 255);
        assert_eq!(px.b, 0);

        let px = ycrcb_to_rgb(0, 0, 255);
        assert_eq!(px.r, 0);
        assert_eq!(px.b, 237);

        let px = ycrcb_to_rgb(255, 0, 255);
        assert_eq!(px.b, 255);
    }

    #[test]
    fn whole_domain_decodes_without_panicking() {
        // Channels are u8, so range is enforced by type; this walks the domain to catch
        // any overflow in the fixed-point math under debug assertions.
        let mut checksum = 0u64;
        for y in 0..=255u8 {
            for cr in 0..=255u8 {
                for cb in 0..=255u8 {
                    let px = ycrcb_to_rgb(y, cr, cb);
                    checksum += px.r as u64 + px.g as u64 + px.b as u64;
                }
            }
        }
        assert!(checksum > 0);
    }

    #[test]
    fn write_rgb32_sets_opaque_pad() {
        let mut out = [0u8; 4];
        Rgb { r: 1, g: 2, b: 3 }.write_rgb32(&mut out);
        assert_eq!(out, [1, 2, 3, 0xFF]);
    }
}
