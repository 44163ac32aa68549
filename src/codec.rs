//! Encoder-side glue: bring an image into the layout an encoder accepts.

use enough::Stop;
use tracing::{debug, trace};

use crate::convert::ConvertRequest;
use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::ConversionOptions;
use crate::pixel::{Chroma, Colorspace};
use crate::state::{ColorState, Nclx, Target};

/// What an encoder reports about the pixel layout it takes as input.
pub trait EncoderInput {
    /// Given the layout of the image about to be encoded, return the layout
    /// the encoder wants instead. Returning the arguments unchanged means
    /// the encoder takes the image as it is.
    fn query_input_colorspace(&self, colorspace: Colorspace, chroma: Chroma) -> (Colorspace, Chroma);
}

/// An encoder that takes a single layout regardless of the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedInput {
    pub colorspace: Colorspace,
    pub chroma: Chroma,
}

impl FixedInput {
    pub const fn new(colorspace: Colorspace, chroma: Chroma) -> Self {
        Self { colorspace, chroma }
    }
}

impl EncoderInput for FixedInput {
    fn query_input_colorspace(&self, _colorspace: Colorspace, _chroma: Chroma) -> (Colorspace, Chroma) {
        (self.colorspace, self.chroma)
    }
}

/// Whether an image tagged `image` satisfies a requested `output` tag.
///
/// Only YCbCr data depends on the tag; untagged images count as
/// [`Nclx::SRGB`].
fn colorimetry_matches(colorspace: Colorspace, image: Option<Nclx>, output: Option<Nclx>) -> bool {
    if colorspace != Colorspace::YCbCr {
        return true;
    }
    let Some(output) = output else {
        return true;
    };
    let image = image.unwrap_or(Nclx::SRGB);
    image.full_range == output.full_range
        && image.matrix_coefficients == output.matrix_coefficients
        && image.colour_primaries == output.colour_primaries
}

/// Convert `image` into the layout `encoder` asks for, keeping its bit depth.
///
/// `output_colorimetry` is the tag the encoded file will carry. YCbCr samples
/// are never re-encoded for another matrix, range or primaries, so a YCbCr
/// image whose tag differs from it is rejected. Images that already fit are
/// returned as is.
pub fn prepare_for_encoder(
    image: PixelImage,
    encoder: &dyn EncoderInput,
    output_colorimetry: Option<Nclx>,
    options: ConversionOptions,
    stop: impl Stop,
) -> Result<PixelImage, ConvertError> {
    let (colorspace, chroma) = encoder.query_input_colorspace(image.colorspace(), image.chroma());
    trace!(%colorspace, %chroma, "encoder input layout");

    let tag_matches = colorimetry_matches(image.colorspace(), image.colorimetry(), output_colorimetry);
    if !tag_matches {
        let from = image.color_state()?;
        let to = ColorState {
            colorspace,
            chroma,
            colorimetry: output_colorimetry,
            ..from
        };
        debug!(%from, "YCbCr colorimetry differs from the encoder output tag");
        return Err(ConvertError::UnsupportedConversion {
            from,
            to: Target::Exact(to),
        });
    }
    if colorspace == image.colorspace() && chroma == image.chroma() {
        return Ok(image);
    }

    let mut request = ConvertRequest::new(colorspace, chroma).with_options(options);
    if let Some(nclx) = output_colorimetry.or(image.colorimetry()) {
        request = request.with_colorimetry(nclx);
    }
    request.convert(image, stop)
}
