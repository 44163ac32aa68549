//! The decoder-facing entry point: turn "give me this layout" into a target
//! state, plan a pipeline to it and run it.

use enough::Stop;
use tracing::debug;

use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::limits::Limits;
use crate::options::ConversionOptions;
use crate::pipeline::ConversionPipeline;
use crate::pixel::{Chroma, Colorspace};
use crate::state::{AcceptSet, ColorState, Nclx, Target};

/// Bit depth used for packed 16-bit targets when the source has 8 bits or
/// fewer and no depth was requested.
const PACKED_16_DEFAULT_BITS: u8 = 10;

#[derive(Clone, Copy, Debug)]
enum Wanted {
    /// A layout; `None` keeps what the input has.
    Layout {
        colorspace: Option<Colorspace>,
        chroma: Option<Chroma>,
    },
    State(ColorState),
    Accept(AcceptSet),
}

/// Builder for one conversion.
///
/// ```
/// use zenplanes::{Channel, Chroma, Colorspace, ConvertRequest, PixelImage, Unstoppable};
///
/// let mut grey = PixelImage::new(4, 4, Colorspace::Monochrome, Chroma::Monochrome);
/// grey.add_plane(Channel::Y, 8)?;
///
/// let rgba = ConvertRequest::new(Colorspace::Rgb, Chroma::InterleavedRgba)
///     .convert(grey, Unstoppable)?;
/// assert_eq!(rgba.chroma(), Chroma::InterleavedRgba);
/// # Ok::<(), zenplanes::ConvertError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ConvertRequest<'a> {
    wanted: Wanted,
    bit_depth: Option<u8>,
    colorimetry: Option<Nclx>,
    options: ConversionOptions,
    limits: Option<&'a Limits>,
}

impl<'a> ConvertRequest<'a> {
    /// Convert to `colorspace` with `chroma`, keeping the input's bit depth
    /// unless the layout dictates one.
    pub fn new(colorspace: Colorspace, chroma: Chroma) -> Self {
        Self::with_wanted(Wanted::Layout {
            colorspace: Some(colorspace),
            chroma: Some(chroma),
        })
    }

    /// Keep the layout; useful together with [`with_bit_depth`](Self::with_bit_depth).
    pub fn unchanged() -> Self {
        Self::with_wanted(Wanted::Layout {
            colorspace: None,
            chroma: None,
        })
    }

    /// Convert to exactly `state`.
    pub fn to_state(state: ColorState) -> Self {
        Self::with_wanted(Wanted::State(state))
    }

    /// Convert to the cheapest state `set` accepts.
    pub fn accepting(set: AcceptSet) -> Self {
        Self::with_wanted(Wanted::Accept(set))
    }

    fn with_wanted(wanted: Wanted) -> Self {
        Self {
            wanted,
            bit_depth: None,
            colorimetry: None,
            options: ConversionOptions::default(),
            limits: None,
        }
    }

    /// Request an output bit depth (1..=16).
    pub fn with_bit_depth(mut self, bits: u8) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    /// Tag the output with `nclx`. No pixel values are changed.
    pub fn with_colorimetry(mut self, nclx: Nclx) -> Self {
        self.colorimetry = Some(nclx);
        self
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// The target the planner will search for, given the input's state.
    pub fn target_for(&self, input: &ColorState) -> Result<Target, ConvertError> {
        if let Some(bits) = self.bit_depth {
            if !(1..=16).contains(&bits) {
                return Err(ConvertError::InvalidParameter(alloc::format!(
                    "bit depth {bits} is outside 1..=16"
                )));
            }
        }
        let colorimetry = self.colorimetry.or(input.colorimetry);
        match self.wanted {
            Wanted::State(state) => {
                let state = match self.bit_depth {
                    Some(bits) => state.with_bits_per_pixel(bits),
                    None => state,
                };
                Ok(Target::Exact(state.with_colorimetry(self.colorimetry.or(state.colorimetry))))
            }
            Wanted::Accept(set) => Ok(Target::Accept(match self.bit_depth {
                Some(bits) => set.with_bits_per_pixel(bits),
                None => set,
            })),
            Wanted::Layout { colorspace, chroma } => {
                let (colorspace, chroma) = resolve_layout(input, colorspace, chroma);
                if colorspace == Colorspace::YCbCr
                    && !matches!(chroma, Chroma::C420 | Chroma::C422 | Chroma::C444)
                {
                    return Err(ConvertError::InvalidParameter(alloc::format!(
                        "YCbCr cannot use {chroma} chroma"
                    )));
                }
                let has_alpha = if chroma.is_interleaved() {
                    chroma.has_interleaved_alpha()
                } else {
                    input.has_alpha
                };
                let mut bits = self.bit_depth.unwrap_or(input.bits_per_pixel);
                if matches!(chroma, Chroma::InterleavedRgb | Chroma::InterleavedRgba) {
                    bits = 8;
                }
                if chroma.is_packed_16() && bits <= 8 {
                    bits = PACKED_16_DEFAULT_BITS;
                }
                Ok(Target::Exact(
                    ColorState::new(colorspace, chroma, has_alpha, bits).with_colorimetry(colorimetry),
                ))
            }
        }
    }

    /// Plan the conversion of an image in state `input`.
    pub fn plan(&self, input: &ColorState) -> Result<ConversionPipeline, ConvertError> {
        let target = self.target_for(input)?;
        ConversionPipeline::construct(input, &target, self.options)
    }

    /// Plan and run the conversion.
    ///
    /// An image already in the target state comes back unchanged apart from
    /// the requested colorimetry tag.
    pub fn convert(&self, image: PixelImage, stop: impl Stop) -> Result<PixelImage, ConvertError> {
        stop.check()?;
        let input = image.color_state()?;
        let pipeline = self.plan(&input)?;
        debug!(steps = pipeline.steps().len(), "converting {}x{} image", image.width(), image.height());

        let mut out = pipeline.convert_image_with_stop(image, &stop, self.limits)?;
        if self.colorimetry.is_some() {
            out.set_colorimetry(self.colorimetry);
        }
        Ok(out)
    }
}

/// Fill in whichever of colorspace and chroma the caller left open.
fn resolve_layout(
    input: &ColorState,
    colorspace: Option<Colorspace>,
    chroma: Option<Chroma>,
) -> (Colorspace, Chroma) {
    match (colorspace, chroma) {
        (Some(colorspace), Some(chroma)) => (colorspace, chroma),
        (Some(colorspace), None) => {
            let chroma = if fits(colorspace, input.chroma) {
                input.chroma
            } else {
                match colorspace {
                    Colorspace::Monochrome => Chroma::Monochrome,
                    Colorspace::YCbCr => Chroma::C420,
                    Colorspace::Rgb => Chroma::C444,
                }
            };
            (colorspace, chroma)
        }
        (None, Some(chroma)) => {
            let colorspace = if fits(input.colorspace, chroma) {
                input.colorspace
            } else if chroma == Chroma::Monochrome {
                Colorspace::Monochrome
            } else if chroma.is_interleaved() {
                Colorspace::Rgb
            } else {
                Colorspace::YCbCr
            };
            (colorspace, chroma)
        }
        (None, None) => (input.colorspace, input.chroma),
    }
}

/// Whether `chroma` is a layout `colorspace` can be stored in.
fn fits(colorspace: Colorspace, chroma: Chroma) -> bool {
    match colorspace {
        Colorspace::Monochrome => chroma == Chroma::Monochrome,
        Colorspace::YCbCr => matches!(chroma, Chroma::C420 | Chroma::C422 | Chroma::C444),
        Colorspace::Rgb => chroma == Chroma::C444 || chroma.is_interleaved(),
    }
}

/// Convert `image` to `colorspace` and `chroma` with default options.
///
/// `None` keeps the input's value; with both `None` the image is returned
/// without being inspected.
pub fn convert(
    image: PixelImage,
    colorspace: Option<Colorspace>,
    chroma: Option<Chroma>,
    stop: impl Stop,
) -> Result<PixelImage, ConvertError> {
    if colorspace.is_none() && chroma.is_none() {
        return Ok(image);
    }
    ConvertRequest::with_wanted(Wanted::Layout { colorspace, chroma }).convert(image, stop)
}
