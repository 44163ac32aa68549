//! Points in the pixel-format space and the predicates the planner aims for.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Add;

use crate::pixel::{Channel, Chroma, Colorspace, plane_size};
use crate::plane::aligned_stride;

/// NCLX colorimetry tag (ISO/IEC 23091-2 code points).
///
/// Carried through conversions untouched. Only `matrix_coefficients == 0`
/// (identity / GBR) is ever inspected, because chroma resampling must not
/// touch planes that are really RGB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Nclx {
    pub colour_primaries: u16,
    pub transfer_characteristics: u16,
    pub matrix_coefficients: u16,
    pub full_range: bool,
}

impl Nclx {
    /// BT.709 primaries, sRGB transfer, BT.601 matrix, full range.
    pub const SRGB: Nclx = Nclx {
        colour_primaries: 1,
        transfer_characteristics: 13,
        matrix_coefficients: 6,
        full_range: true,
    };

    /// Whether the matrix is the identity, i.e. the "YCbCr" planes hold G, B, R.
    pub const fn is_rgb_matrix(&self) -> bool {
        self.matrix_coefficients == 0
    }
}

/// Format of a pixel buffer: one vertex of the planner's search graph.
///
/// Equality and hashing ignore `colorimetry`: the tag never changes the
/// memory layout and no operator rewrites it.
#[derive(Clone, Copy, Debug)]
pub struct ColorState {
    pub colorspace: Colorspace,
    pub chroma: Chroma,
    pub has_alpha: bool,
    pub bits_per_pixel: u8,
    pub colorimetry: Option<Nclx>,
}

impl ColorState {
    pub const fn new(
        colorspace: Colorspace,
        chroma: Chroma,
        has_alpha: bool,
        bits_per_pixel: u8,
    ) -> Self {
        Self {
            colorspace,
            chroma,
            has_alpha,
            bits_per_pixel,
            colorimetry: None,
        }
    }

    pub const fn with_colorimetry(mut self, nclx: Option<Nclx>) -> Self {
        self.colorimetry = nclx;
        self
    }

    pub const fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    pub const fn with_bits_per_pixel(mut self, bits: u8) -> Self {
        self.bits_per_pixel = bits;
        self
    }

    /// Whether the colorimetry declares an identity (RGB-like) matrix.
    pub fn has_rgb_matrix(&self) -> bool {
        self.colorimetry.is_some_and(|n| n.is_rgb_matrix())
    }

    /// The non-alpha planes an image in this state holds.
    pub fn color_channels(&self) -> &'static [Channel] {
        if self.chroma.is_interleaved() {
            return &[Channel::Interleaved];
        }
        match self.colorspace {
            Colorspace::Monochrome => &[Channel::Y],
            Colorspace::YCbCr => &[Channel::Y, Channel::Cb, Channel::Cr],
            Colorspace::Rgb => &[Channel::R, Channel::G, Channel::B],
        }
    }

    /// Whether alpha is stored as its own plane.
    pub fn has_alpha_plane(&self) -> bool {
        self.has_alpha && self.chroma.is_planar()
    }

    /// Bytes an image of this state and size occupies, using the same
    /// stride alignment as [`crate::Plane::new`]. `None` on overflow.
    pub fn image_bytes(&self, width: u32, height: u32) -> Option<usize> {
        let components = self.chroma.interleaved_components();
        let alpha: &[Channel] = if self.has_alpha_plane() {
            &[Channel::Alpha]
        } else {
            &[]
        };
        self.color_channels()
            .iter()
            .chain(alpha)
            .try_fold(0usize, |total, &channel| {
                let (w, h) = plane_size(self.chroma, channel, width, height);
                let stride = aligned_stride(w, components, self.bits_per_pixel)?;
                total.checked_add(stride.checked_mul(h as usize)?)
            })
    }
}

impl PartialEq for ColorState {
    fn eq(&self, other: &Self) -> bool {
        self.colorspace == other.colorspace
            && self.chroma == other.chroma
            && self.has_alpha == other.has_alpha
            && self.bits_per_pixel == other.bits_per_pixel
    }
}

impl Eq for ColorState {}

impl Hash for ColorState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.colorspace.hash(state);
        self.chroma.hash(state);
        self.has_alpha.hash(state);
        self.bits_per_pixel.hash(state);
    }
}

impl fmt::Display for ColorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "colorspace={} chroma={} bpp={} alpha={} nclx={}",
            self.colorspace,
            self.chroma,
            self.bits_per_pixel,
            if self.has_alpha { "yes" } else { "no" },
            if self.colorimetry.is_some() { "yes" } else { "no" },
        )
    }
}

/// Ordinal cost of one conversion step. Lower is cheaper.
///
/// The constants mirror the tiers the built-in operators use; any other
/// value is allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeedCost(pub u32);

impl SpeedCost {
    pub const TRIVIAL: SpeedCost = SpeedCost(1);
    pub const HARDWARE: SpeedCost = SpeedCost(2);
    pub const OPTIMIZED_SOFTWARE: SpeedCost = SpeedCost(5 + 1);
    pub const UNOPTIMIZED: SpeedCost = SpeedCost(10 + 1);
    pub const SLOW: SpeedCost = SpeedCost(15 + 1);
}

impl Add for SpeedCost {
    type Output = SpeedCost;

    fn add(self, rhs: SpeedCost) -> SpeedCost {
        SpeedCost(self.0.saturating_add(rhs.0))
    }
}

/// A state an operator can produce in one step, with the step's cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorStateWithCost {
    pub state: ColorState,
    pub cost: SpeedCost,
}

/// Alpha constraint of an [`AcceptSet`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaRequirement {
    #[default]
    Any,
    Required,
    Forbidden,
}

/// A set of acceptable states, e.g. "YCbCr, any chroma, 8-bit, with alpha".
///
/// `None` fields accept anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptSet {
    pub colorspace: Option<Colorspace>,
    pub chroma: Option<Chroma>,
    pub bits_per_pixel: Option<u8>,
    pub alpha: AlphaRequirement,
}

impl AcceptSet {
    /// Accepts every state.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_colorspace(mut self, colorspace: Colorspace) -> Self {
        self.colorspace = Some(colorspace);
        self
    }

    pub fn with_chroma(mut self, chroma: Chroma) -> Self {
        self.chroma = Some(chroma);
        self
    }

    pub fn with_bits_per_pixel(mut self, bits: u8) -> Self {
        self.bits_per_pixel = Some(bits);
        self
    }

    pub fn with_alpha(mut self, alpha: AlphaRequirement) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn accepts(&self, state: &ColorState) -> bool {
        self.colorspace.is_none_or(|c| c == state.colorspace)
            && self.chroma.is_none_or(|c| c == state.chroma)
            && self.bits_per_pixel.is_none_or(|b| b == state.bits_per_pixel)
            && match self.alpha {
                AlphaRequirement::Any => true,
                AlphaRequirement::Required => state.has_alpha,
                AlphaRequirement::Forbidden => !state.has_alpha,
            }
    }
}

/// What the planner searches for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Exactly this state (colorimetry aside).
    Exact(ColorState),
    /// Any state in the set.
    Accept(AcceptSet),
}

impl Target {
    pub fn is_satisfied_by(&self, state: &ColorState) -> bool {
        match self {
            Target::Exact(target) => target == state,
            Target::Accept(set) => set.accepts(state),
        }
    }

    /// The concrete state handed to operators as a steering hint.
    ///
    /// For an accept set, unconstrained fields are taken from `from`, so
    /// operators are not pushed away from states the set already accepts.
    pub fn steering_state(&self, from: &ColorState) -> ColorState {
        let set = match self {
            Target::Exact(target) => return *target,
            Target::Accept(set) => set,
        };
        let colorspace = set.colorspace.unwrap_or(from.colorspace);
        let chroma = set.chroma.unwrap_or(if colorspace == from.colorspace {
            from.chroma
        } else {
            match colorspace {
                Colorspace::Monochrome => Chroma::Monochrome,
                Colorspace::YCbCr => Chroma::C420,
                Colorspace::Rgb => Chroma::C444,
            }
        });
        let has_alpha = match set.alpha {
            AlphaRequirement::Any => from.has_alpha,
            AlphaRequirement::Required => true,
            AlphaRequirement::Forbidden => false,
        };
        ColorState {
            colorspace,
            chroma,
            has_alpha,
            bits_per_pixel: set.bits_per_pixel.unwrap_or(from.bits_per_pixel),
            colorimetry: from.colorimetry,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Exact(state) => state.fmt(f),
            Target::Accept(set) => {
                f.write_str("any of colorspace=")?;
                match set.colorspace {
                    Some(c) => write!(f, "{c}")?,
                    None => f.write_str("*")?,
                }
                f.write_str(" chroma=")?;
                match set.chroma {
                    Some(c) => write!(f, "{c}")?,
                    None => f.write_str("*")?,
                }
                f.write_str(" bpp=")?;
                match set.bits_per_pixel {
                    Some(b) => write!(f, "{b}")?,
                    None => f.write_str("*")?,
                }
                write!(f, " alpha={:?}", set.alpha)
            }
        }
    }
}
