//! Elementary conversion operators and the registry the planner searches.
//!
//! Each operator covers one narrow family of input states. It reports which
//! states it can reach in one step ([`ColorConversionOp::candidate_targets`])
//! and performs the step ([`ColorConversionOp::convert`]). The planner chains
//! them; no operator knows about any other.

mod alpha;
mod chroma;
mod depth;
mod mono;
mod rgb;

use core::fmt;

use smallvec::SmallVec;

use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::ConversionOptions;
use crate::pixel::{Channel, Chroma};
use crate::state::{ColorState, ColorStateWithCost};

pub use alpha::DropAlphaPlane;
pub use chroma::{YCbCr420BilinearToYCbCr444, YCbCr444ToYCbCr420Average};
pub use depth::{ToHdrPlanes, ToSdrPlanes};
pub use mono::{MonoToRgb24_32, MonoToYCbCr420};
pub use rgb::{
    InterleavedToRgb, RgbHdrToRrggbbaaBe, RgbToInterleaved, RrggbbaaBeToRgbHdr,
    RrggbbaaSwapEndianness,
};

/// States reachable in one step. Operators offer at most two, so this never
/// allocates.
pub type Candidates = SmallVec<[ColorStateWithCost; 2]>;

/// One elementary pixel-format conversion.
///
/// Implementations are stateless, so a single `'static` instance can serve
/// every thread.
pub trait ColorConversionOp: Send + Sync + fmt::Debug {
    /// Short identifier used in logs and pipeline dumps.
    fn name(&self) -> &'static str;

    /// States this operator can turn `input` into, with the cost of doing so.
    ///
    /// `target` is the state the planner is heading for; operators may use it
    /// to pick a variant (e.g. with or without alpha) but must not assume they
    /// reach it. Returns an empty list when `input` is outside the operator's
    /// family. Never looks at pixel data.
    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        options: &ConversionOptions,
    ) -> Candidates;

    /// Convert `input` into `target`, one of the states previously offered
    /// by [`candidate_targets`](Self::candidate_targets).
    ///
    /// The input image is re-validated against what the operator needs; an
    /// image that does not match fails with an error instead of being read
    /// out of bounds.
    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError>;
}

/// All built-in operators, in registration order.
///
/// The planner breaks cost ties in favor of the operator listed first, so
/// reordering this table can change which conversion path is chosen.
pub static OPERATORS: &[&dyn ColorConversionOp] = &[
    &RgbToInterleaved,
    &InterleavedToRgb,
    &RgbHdrToRrggbbaaBe,
    &MonoToYCbCr420,
    &MonoToRgb24_32,
    &RrggbbaaSwapEndianness,
    &RrggbbaaBeToRgbHdr,
    &DropAlphaPlane,
    &ToHdrPlanes,
    &ToSdrPlanes,
    &YCbCr420BilinearToYCbCr444::<u8>::NEW,
    &YCbCr420BilinearToYCbCr444::<u16>::NEW,
    &YCbCr444ToYCbCr420Average::<u8>::NEW,
    &YCbCr444ToYCbCr420Average::<u16>::NEW,
];

/// Look up a built-in operator by its [`name`](ColorConversionOp::name).
pub fn find_operator(name: &str) -> Option<&'static dyn ColorConversionOp> {
    OPERATORS.iter().copied().find(|op| op.name() == name)
}

/// Layouts with one plane per channel, the only ones that carry a separate
/// alpha plane.
pub(crate) fn is_planar_layout(chroma: Chroma) -> bool {
    matches!(
        chroma,
        Chroma::Monochrome | Chroma::C420 | Chroma::C422 | Chroma::C444
    )
}

/// Bit depth shared by all of `channels`, or an error naming the first plane
/// that differs.
pub(crate) fn common_bit_depth(image: &PixelImage, channels: &[Channel]) -> Result<u8, ConvertError> {
    let (&first, rest) = channels
        .split_first()
        .ok_or_else(|| ConvertError::InvalidParameter("no channels to check".into()))?;
    let bits = image.checked_plane(first, None)?.bit_depth();
    for &channel in rest {
        image.checked_plane(channel, Some(bits))?;
    }
    Ok(bits)
}

/// Planes present on `input` among the planar color channels and alpha.
pub(crate) fn present_planes(input: &PixelImage) -> impl Iterator<Item = Channel> + '_ {
    [
        Channel::Y,
        Channel::Cb,
        Channel::Cr,
        Channel::R,
        Channel::G,
        Channel::B,
        Channel::Alpha,
    ]
    .into_iter()
    .filter(|&c| input.has_channel(c))
}
