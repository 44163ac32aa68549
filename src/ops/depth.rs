//! Bit depth changes of planar images.

use smallvec::smallvec;

use super::{Candidates, ColorConversionOp, common_bit_depth, is_planar_layout, present_planes};
use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::ConversionOptions;
use crate::state::{ColorState, ColorStateWithCost, SpeedCost};

/// Widens 8-bit planes to the target depth by bit replication, so that
/// 0 maps to 0 and 255 to the new maximum.
#[derive(Debug)]
pub struct ToHdrPlanes;

impl ColorConversionOp for ToHdrPlanes {
    fn name(&self) -> &'static str {
        "to_hdr_planes"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_planar_layout(input.chroma)
            || input.bits_per_pixel != 8
            || !(9..=16).contains(&target.bits_per_pixel)
        {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: input.with_bits_per_pixel(target.bits_per_pixel),
            cost: SpeedCost::UNOPTIMIZED,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let bits = target.bits_per_pixel;
        if !(9..=16).contains(&bits) {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "cannot widen to {bits} bits"
            )));
        }
        let shift = u32::from(bits - 8);
        let mut out = PixelImage::new(input.width(), input.height(), input.colorspace(), input.chroma());
        for channel in present_planes(input) {
            let src = input.checked_plane(channel, Some(8))?;
            let (w, h) = (src.width() as usize, src.height() as usize);
            let from = src.view::<u8>()?;
            let mut to = out.add_plane(channel, bits)?.view_mut::<u16>()?;
            for y in 0..h {
                for x in 0..w {
                    let v = u16::from(from.get(x, y));
                    to.set(x, y, (v << shift) | (v >> (8 - shift)));
                }
            }
        }
        Ok(out)
    }
}

/// Narrows deep planes to 8 bits by dropping the low bits.
#[derive(Debug)]
pub struct ToSdrPlanes;

impl ColorConversionOp for ToSdrPlanes {
    fn name(&self) -> &'static str {
        "to_sdr_planes"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_planar_layout(input.chroma) || input.bits_per_pixel <= 8 || target.bits_per_pixel != 8 {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: input.with_bits_per_pixel(8),
            cost: SpeedCost::UNOPTIMIZED,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        common_bit_depth(input, input.color_state()?.color_channels())?;
        let mut out = PixelImage::new(input.width(), input.height(), input.colorspace(), input.chroma());
        for channel in present_planes(input) {
            let src = input.checked_plane(channel, None)?;
            let bits = src.bit_depth();
            if bits <= 8 {
                out.copy_plane_from(input, channel)?;
                continue;
            }
            let shift = u32::from(bits - 8);
            let (w, h) = (src.width() as usize, src.height() as usize);
            let from = src.view::<u16>()?;
            let mut to = out.add_plane(channel, 8)?.view_mut::<u8>()?;
            for y in 0..h {
                for x in 0..w {
                    to.set(x, y, (from.get(x, y) >> shift) as u8);
                }
            }
        }
        Ok(out)
    }
}
