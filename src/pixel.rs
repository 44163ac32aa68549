use core::fmt;

/// Color model of an image.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colorspace {
    /// Luma only (plus optional alpha).
    Monochrome,
    /// Luma plus two color-difference planes.
    YCbCr,
    /// Red, green and blue, planar or interleaved.
    Rgb,
}

impl fmt::Display for Colorspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Monochrome => "mono",
            Self::YCbCr => "YCbCr",
            Self::Rgb => "RGB",
        })
    }
}

/// Plane layout of an image.
///
/// For YCbCr this is the chroma subsampling. For RGB it is either planar
/// (`C444`) or one of the interleaved layouts, whose tag also says whether
/// an alpha component is present and, for 16-bit packing, the byte order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Chroma {
    Monochrome,
    /// Chroma halved horizontally and vertically.
    C420,
    /// Chroma halved horizontally.
    C422,
    /// Full-resolution chroma, or planar RGB.
    C444,
    /// 3 × 8-bit, R G B.
    InterleavedRgb,
    /// 4 × 8-bit, R G B A.
    InterleavedRgba,
    /// 3 × 16-bit big endian.
    InterleavedRrggbbBe,
    /// 3 × 16-bit little endian.
    InterleavedRrggbbLe,
    /// 4 × 16-bit big endian.
    InterleavedRrggbbaaBe,
    /// 4 × 16-bit little endian.
    InterleavedRrggbbaaLe,
}

impl Chroma {
    /// Components stored per pixel in one plane: 1 for planar layouts.
    pub fn interleaved_components(&self) -> usize {
        match self {
            Self::Monochrome | Self::C420 | Self::C422 | Self::C444 => 1,
            Self::InterleavedRgb | Self::InterleavedRrggbbBe | Self::InterleavedRrggbbLe => 3,
            Self::InterleavedRgba | Self::InterleavedRrggbbaaBe | Self::InterleavedRrggbbaaLe => 4,
        }
    }

    /// Whether all components live in a single interleaved plane.
    pub fn is_interleaved(&self) -> bool {
        self.interleaved_components() > 1
    }

    /// Whether the layout tag itself carries an alpha component.
    ///
    /// Planar layouts return `false`; their alpha is a separate plane.
    pub fn has_interleaved_alpha(&self) -> bool {
        matches!(
            self,
            Self::InterleavedRgba | Self::InterleavedRrggbbaaBe | Self::InterleavedRrggbbaaLe
        )
    }

    /// Whether this is one of the 16-bit-per-component packed layouts.
    pub fn is_packed_16(&self) -> bool {
        matches!(
            self,
            Self::InterleavedRrggbbBe
                | Self::InterleavedRrggbbLe
                | Self::InterleavedRrggbbaaBe
                | Self::InterleavedRrggbbaaLe
        )
    }

    /// Whether this is a planar layout (one plane per channel).
    pub fn is_planar(&self) -> bool {
        !self.is_interleaved()
    }

    /// Horizontal and vertical subsampling shift of the Cb/Cr planes.
    pub fn chroma_shift(&self) -> (u32, u32) {
        match self {
            Self::C420 => (1, 1),
            Self::C422 => (1, 0),
            _ => (0, 0),
        }
    }
}

impl fmt::Display for Chroma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Monochrome => "mono",
            Self::C420 => "420",
            Self::C422 => "422",
            Self::C444 => "444",
            Self::InterleavedRgb => "RGB",
            Self::InterleavedRgba => "RGBA",
            Self::InterleavedRrggbbBe => "RRGGBB_BE",
            Self::InterleavedRrggbbLe => "RRGGBB_LE",
            Self::InterleavedRrggbbaaBe => "RRGGBBAA_BE",
            Self::InterleavedRrggbbaaLe => "RRGGBBAA_LE",
        })
    }
}

/// Identity of one plane within a [`crate::PixelImage`].
///
/// The ordering is significant: the first present color channel decides an
/// image's reported bit depth.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Y,
    Cb,
    Cr,
    R,
    G,
    B,
    Alpha,
    /// The single plane of an interleaved layout.
    Interleaved,
}

impl Channel {
    /// Whether this plane carries color (everything except alpha).
    pub fn is_color(&self) -> bool {
        !matches!(self, Self::Alpha)
    }

    /// Whether this is a subsampled color-difference plane.
    pub fn is_chroma(&self) -> bool {
        matches!(self, Self::Cb | Self::Cr)
    }
}

/// Bytes needed to store one sample of the given bit depth.
pub fn bytes_per_sample(bit_depth: u8) -> usize {
    if bit_depth > 8 { 2 } else { 1 }
}

/// Size of a plane of `channel` for an image of `width` × `height`,
/// rounding subsampled chroma up on odd sizes.
pub fn plane_size(chroma: Chroma, channel: Channel, width: u32, height: u32) -> (u32, u32) {
    if !channel.is_chroma() {
        return (width, height);
    }
    let (sx, sy) = chroma.chroma_shift();
    (
        width.div_ceil(1 << sx),
        height.div_ceil(1 << sy),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_planes_round_up() {
        assert_eq!(plane_size(Chroma::C420, Channel::Cb, 5, 3), (3, 2));
        assert_eq!(plane_size(Chroma::C422, Channel::Cr, 5, 3), (3, 3));
        assert_eq!(plane_size(Chroma::C444, Channel::Cb, 5, 3), (5, 3));
        assert_eq!(plane_size(Chroma::C420, Channel::Y, 5, 3), (5, 3));
        assert_eq!(plane_size(Chroma::C420, Channel::Alpha, 5, 3), (5, 3));
    }

    #[test]
    fn interleaved_layouts() {
        assert_eq!(Chroma::InterleavedRgb.interleaved_components(), 3);
        assert_eq!(Chroma::InterleavedRrggbbaaLe.interleaved_components(), 4);
        assert!(Chroma::InterleavedRgba.has_interleaved_alpha());
        assert!(!Chroma::InterleavedRrggbbBe.has_interleaved_alpha());
        assert!(Chroma::InterleavedRrggbbLe.is_packed_16());
        assert!(!Chroma::InterleavedRgba.is_packed_16());
        assert!(Chroma::C420.is_planar());
    }

    #[test]
    fn channel_order_puts_color_first() {
        assert!(Channel::Y < Channel::Alpha);
        assert!(Channel::R < Channel::Alpha);
        assert!(Channel::Alpha < Channel::Interleaved);
    }
}
