use smallvec::smallvec;

use super::{Candidates, ColorConversionOp, common_bit_depth, is_planar_layout, present_planes};
use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::ConversionOptions;
use crate::pixel::Channel;
use crate::state::{ColorState, ColorStateWithCost, SpeedCost};

/// Removes the alpha plane of a planar image.
#[derive(Debug)]
pub struct DropAlphaPlane;

impl ColorConversionOp for DropAlphaPlane {
    fn name(&self) -> &'static str {
        "drop_alpha_plane"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_planar_layout(input.chroma) || !input.has_alpha || target.has_alpha {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: input.with_alpha(false),
            cost: SpeedCost::TRIVIAL,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        if !is_planar_layout(input.chroma()) {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "cannot drop alpha from interleaved {}",
                input.chroma()
            )));
        }
        common_bit_depth(input, input.color_state()?.color_channels())?;
        let mut out = PixelImage::new(input.width(), input.height(), input.colorspace(), input.chroma());
        for channel in present_planes(input).filter(|&c| c != Channel::Alpha) {
            out.copy_plane_from(input, channel)?;
        }
        Ok(out)
    }
}
