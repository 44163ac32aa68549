//! Monochrome bridging: grey images into YCbCr or interleaved RGB.

use smallvec::smallvec;

use super::{Candidates, ColorConversionOp};
use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::ConversionOptions;
use crate::pixel::{Channel, Chroma, Colorspace};
use crate::state::{ColorState, ColorStateWithCost, SpeedCost};

fn is_mono(input: &ColorState) -> bool {
    input.colorspace == Colorspace::Monochrome && input.chroma == Chroma::Monochrome
}

/// Neutral chroma level for `bits`: 128 at 8 bits, 512 at 10, and so on.
pub(crate) fn neutral_chroma(bits: u8) -> u16 {
    1 << (bits.clamp(1, 16) - 1)
}

/// Monochrome → YCbCr 4:2:0 with neutral chroma.
#[derive(Debug)]
pub struct MonoToYCbCr420;

impl ColorConversionOp for MonoToYCbCr420 {
    fn name(&self) -> &'static str {
        "mono_to_ycbcr420"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_mono(input) {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: ColorState {
                colorspace: Colorspace::YCbCr,
                chroma: Chroma::C420,
                ..*input
            },
            cost: SpeedCost::OPTIMIZED_SOFTWARE,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let bits = input.checked_plane(Channel::Y, None)?.bit_depth();
        let mut out = PixelImage::new(input.width(), input.height(), Colorspace::YCbCr, Chroma::C420);
        out.copy_plane_from(input, Channel::Y)?;
        for channel in [Channel::Cb, Channel::Cr] {
            out.add_plane(channel, bits)?;
            out.fill_plane(channel, neutral_chroma(bits))?;
        }
        if input.has_channel(Channel::Alpha) {
            out.copy_plane_from(input, Channel::Alpha)?;
        }
        Ok(out)
    }
}

/// 8-bit monochrome → interleaved RGB24 or RGBA32.
#[derive(Debug)]
pub struct MonoToRgb24_32;

impl ColorConversionOp for MonoToRgb24_32 {
    fn name(&self) -> &'static str {
        "mono_to_rgb24_32"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_mono(input) || input.bits_per_pixel != 8 {
            return Candidates::new();
        }
        let rgba = ColorStateWithCost {
            state: ColorState {
                colorspace: Colorspace::Rgb,
                chroma: Chroma::InterleavedRgba,
                has_alpha: true,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        };
        // Alpha is never silently dropped here; that is DropAlphaPlane's job.
        if input.has_alpha {
            return smallvec![rgba];
        }
        let rgb = ColorStateWithCost {
            state: ColorState {
                colorspace: Colorspace::Rgb,
                chroma: Chroma::InterleavedRgb,
                has_alpha: false,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        };
        smallvec![rgb, rgba]
    }

    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let luma = input.checked_plane(Channel::Y, Some(8))?;
        let alpha = if input.has_channel(Channel::Alpha) {
            Some(input.checked_plane(Channel::Alpha, Some(8))?)
        } else {
            None
        };
        let chroma = if target.has_alpha {
            Chroma::InterleavedRgba
        } else {
            Chroma::InterleavedRgb
        };
        let mut out = PixelImage::new(input.width(), input.height(), Colorspace::Rgb, chroma);
        let dst = out.add_plane(Channel::Interleaved, 8)?;
        let n = chroma.interleaved_components();

        for (y, (out_row, luma_row)) in dst.rows_mut().zip(luma.rows()).enumerate() {
            let alpha_row = alpha.and_then(|a| a.row(y as u32));
            for (x, (px, &v)) in out_row.chunks_exact_mut(n).zip(luma_row).enumerate() {
                px[..3].fill(v);
                if n == 4 {
                    px[3] = alpha_row.map_or(0xFF, |a| a[x]);
                }
            }
        }
        Ok(out)
    }
}
