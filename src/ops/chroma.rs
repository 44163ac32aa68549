//! Chroma resampling between 4:4:4 and 4:2:0.
//!
//! Chroma samples of 4:2:0 are taken to sit in the center of each 2×2 luma
//! block. Luma and alpha are copied through untouched.

use core::fmt;
use core::marker::PhantomData;

use smallvec::smallvec;

use super::{Candidates, ColorConversionOp, common_bit_depth};
use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::{ChromaDownsampling, ChromaUpsampling, ConversionOptions};
use crate::pixel::{Channel, Chroma, Colorspace, bytes_per_sample};
use crate::plane::{PlaneMut, PlaneRef, Sample};
use crate::state::{ColorState, ColorStateWithCost, SpeedCost};

/// Whether samples of `bits` are stored as `P`.
fn stored_as<P: Sample>(bits: u8) -> bool {
    bytes_per_sample(bits) == P::BYTES
}

/// Shared applicability test: YCbCr at `chroma`, a depth `P` handles, and a
/// matrix that really is YCbCr.
fn resamples<P: Sample>(input: &ColorState, chroma: Chroma) -> bool {
    input.colorspace == Colorspace::YCbCr
        && input.chroma == chroma
        && stored_as::<P>(input.bits_per_pixel)
        && !input.has_rgb_matrix()
}

fn resampled(input: &PixelImage, chroma: Chroma, bits: u8) -> Result<PixelImage, ConvertError> {
    let mut out = PixelImage::new(input.width(), input.height(), Colorspace::YCbCr, chroma);
    out.copy_plane_from(input, Channel::Y)?;
    if input.has_channel(Channel::Alpha) {
        out.copy_plane_from(input, Channel::Alpha)?;
    }
    out.add_plane(Channel::Cb, bits)?;
    out.add_plane(Channel::Cr, bits)?;
    Ok(out)
}

fn sample_depth_error<P: Sample>(bits: u8) -> ConvertError {
    ConvertError::InvalidParameter(alloc::format!(
        "{bits}-bit chroma is not stored in {}-byte samples",
        P::BYTES
    ))
}

/// 4:4:4 → 4:2:0 by averaging each 2×2 block.
pub struct YCbCr444ToYCbCr420Average<P>(PhantomData<fn() -> P>);

impl<P> YCbCr444ToYCbCr420Average<P> {
    pub const NEW: Self = Self(PhantomData);
}

impl<P> fmt::Debug for YCbCr444ToYCbCr420Average<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("YCbCr444ToYCbCr420Average")
    }
}

impl<P: Sample> ColorConversionOp for YCbCr444ToYCbCr420Average<P> {
    fn name(&self) -> &'static str {
        if P::BYTES == 1 {
            "ycbcr444_to_ycbcr420_average"
        } else {
            "ycbcr444_to_ycbcr420_average_hdr"
        }
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        options: &ConversionOptions,
    ) -> Candidates {
        if options.preferred_chroma_downsampling_algorithm != ChromaDownsampling::Average
            || !resamples::<P>(input, Chroma::C444)
            || target.chroma != Chroma::C420
        {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: ColorState {
                chroma: Chroma::C420,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let bits = common_bit_depth(input, &[Channel::Y, Channel::Cb, Channel::Cr])?;
        if !stored_as::<P>(bits) {
            return Err(sample_depth_error::<P>(bits));
        }
        let mut out = resampled(input, Chroma::C420, bits)?;
        let (w, h) = (input.width() as usize, input.height() as usize);
        for channel in [Channel::Cb, Channel::Cr] {
            let src = input.sample_view::<P>(channel, bits)?;
            let mut dst = out.sample_view_mut::<P>(channel)?;
            downsample_average(&src, &mut dst, w, h);
        }
        Ok(out)
    }
}

/// Rounded mean of two samples.
#[inline]
fn mean2<P: Sample>(a: P, b: P) -> P {
    P::from_u32((a.widen() + b.widen() + 1) / 2)
}

fn downsample_average<P: Sample>(src: &PlaneRef<'_, P>, dst: &mut PlaneMut<'_, P>, w: usize, h: usize) {
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));

    // Odd sizes leave a last row or column with only a pair to average.
    if h % 2 == 1 {
        let y = h - 1;
        for x in (0..w - 1).step_by(2) {
            dst.set(x / 2, ch - 1, mean2(src.get(x, y), src.get(x + 1, y)));
        }
    }
    if w % 2 == 1 {
        let x = w - 1;
        for y in (0..h - 1).step_by(2) {
            dst.set(cw - 1, y / 2, mean2(src.get(x, y), src.get(x, y + 1)));
        }
    }
    if w % 2 == 1 && h % 2 == 1 {
        dst.set(cw - 1, ch - 1, src.get(w - 1, h - 1));
    }

    for y in (0..h - 1).step_by(2) {
        for x in (0..w - 1).step_by(2) {
            let sum = src.get(x, y).widen()
                + src.get(x + 1, y).widen()
                + src.get(x, y + 1).widen()
                + src.get(x + 1, y + 1).widen();
            dst.set(x / 2, y / 2, P::from_u32((sum + 2) / 4));
        }
    }
}

/// 4:2:0 → 4:4:4 by bilinear interpolation.
pub struct YCbCr420BilinearToYCbCr444<P>(PhantomData<fn() -> P>);

impl<P> YCbCr420BilinearToYCbCr444<P> {
    pub const NEW: Self = Self(PhantomData);
}

impl<P> fmt::Debug for YCbCr420BilinearToYCbCr444<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("YCbCr420BilinearToYCbCr444")
    }
}

impl<P: Sample> ColorConversionOp for YCbCr420BilinearToYCbCr444<P> {
    fn name(&self) -> &'static str {
        if P::BYTES == 1 {
            "ycbcr420_bilinear_to_ycbcr444"
        } else {
            "ycbcr420_bilinear_to_ycbcr444_hdr"
        }
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        _target: &ColorState,
        options: &ConversionOptions,
    ) -> Candidates {
        if options.preferred_chroma_upsampling_algorithm != ChromaUpsampling::Bilinear
            || !resamples::<P>(input, Chroma::C420)
        {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: ColorState {
                chroma: Chroma::C444,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let bits = common_bit_depth(input, &[Channel::Y, Channel::Cb, Channel::Cr])?;
        if !stored_as::<P>(bits) {
            return Err(sample_depth_error::<P>(bits));
        }
        let mut out = resampled(input, Chroma::C444, bits)?;
        let (w, h) = (input.width() as usize, input.height() as usize);
        for channel in [Channel::Cb, Channel::Cr] {
            let src = input.sample_view::<P>(channel, bits)?;
            let mut dst = out.sample_view_mut::<P>(channel)?;
            upsample_bilinear(&src, &mut dst, w, h);
        }
        Ok(out)
    }
}

/// `(3a + b) / 4`, rounded.
#[inline]
fn lerp31<P: Sample>(a: P, b: P) -> P {
    P::from_u32((3 * a.widen() + b.widen() + 2) / 4)
}

fn upsample_bilinear<P: Sample>(src: &PlaneRef<'_, P>, dst: &mut PlaneMut<'_, P>, w: usize, h: usize) {
    let even_w = w % 2 == 0;
    let even_h = h % 2 == 0;
    // Last chroma column/row, used by the right and bottom borders.
    let (lx, ly) = (w.div_ceil(2) - 1, h.div_ceil(2) - 1);

    dst.set(0, 0, src.get(0, 0));
    for cx in 0..(w - 1) / 2 {
        let (a, b) = (src.get(cx, 0), src.get(cx + 1, 0));
        dst.set(2 * cx + 1, 0, lerp31(a, b));
        dst.set(2 * cx + 2, 0, lerp31(b, a));
    }
    if even_w {
        dst.set(w - 1, 0, src.get(lx, 0));
    }

    for cy in 0..(h - 1) / 2 {
        let (a, b) = (src.get(0, cy), src.get(0, cy + 1));
        dst.set(0, 2 * cy + 1, lerp31(a, b));
        dst.set(0, 2 * cy + 2, lerp31(b, a));
    }
    if even_h {
        dst.set(0, h - 1, src.get(0, ly));
    }

    if even_w {
        for cy in 0..(h - 1) / 2 {
            let (a, b) = (src.get(lx, cy), src.get(lx, cy + 1));
            dst.set(w - 1, 2 * cy + 1, lerp31(a, b));
            dst.set(w - 1, 2 * cy + 2, lerp31(b, a));
        }
    }
    if even_h {
        for cx in 0..(w - 1) / 2 {
            let (a, b) = (src.get(cx, ly), src.get(cx + 1, ly));
            dst.set(2 * cx + 1, h - 1, lerp31(a, b));
            dst.set(2 * cx + 2, h - 1, lerp31(b, a));
        }
    }
    if even_w && even_h {
        dst.set(w - 1, h - 1, src.get(lx, ly));
    }

    for y in (1..h.saturating_sub(1)).step_by(2) {
        for x in (1..w.saturating_sub(1)).step_by(2) {
            let (cx, cy) = (x / 2, y / 2);
            let c00 = src.get(cx, cy).widen();
            let c01 = src.get(cx + 1, cy).widen();
            let c10 = src.get(cx, cy + 1).widen();
            let c11 = src.get(cx + 1, cy + 1).widen();
            let weigh = |w00: u32, w01: u32, w10: u32, w11: u32| {
                P::from_u32((c00 * w00 + c01 * w01 + c10 * w10 + c11 * w11 + 8) / 16)
            };
            dst.set(x, y, weigh(9, 3, 3, 1));
            dst.set(x + 1, y, weigh(3, 9, 1, 3));
            dst.set(x, y + 1, weigh(3, 1, 9, 3));
            dst.set(x + 1, y + 1, weigh(1, 3, 3, 9));
        }
    }
}
