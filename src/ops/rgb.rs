//! RGB packing: planar ↔ interleaved, 16-bit big-endian packing and byte
//! order swaps.

use smallvec::smallvec;

use super::{Candidates, ColorConversionOp, common_bit_depth};
use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::options::ConversionOptions;
use crate::pixel::{Channel, Chroma, Colorspace};
use crate::plane::{Plane, Sample};
use crate::state::{ColorState, ColorStateWithCost, SpeedCost};

const RGB: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

/// Largest value representable in `bits`.
fn max_value(bits: u8) -> u16 {
    ((1u32 << bits.min(16)) - 1) as u16
}

/// Byte order of samples inside a packed plane, as a transform of the native
/// value.
type ByteOrder<P> = fn(P) -> P;

fn native<P>(v: P) -> P {
    v
}

/// Write planar `src` into component `c` of the `n`-component plane `dst`.
fn pack_component<P: Sample>(
    dst: &mut Plane,
    src: &Plane,
    c: usize,
    n: usize,
    order: ByteOrder<P>,
) -> Result<(), ConvertError> {
    let (w, h) = (src.width() as usize, src.height() as usize);
    let from = src.view::<P>()?;
    let mut to = dst.view_mut::<P>()?;
    for y in 0..h {
        for x in 0..w {
            to.set(x * n + c, y, order(from.get(x, y)));
        }
    }
    Ok(())
}

fn fill_component<P: Sample>(dst: &mut Plane, c: usize, n: usize, value: P) -> Result<(), ConvertError> {
    let (w, h) = (dst.width() as usize, dst.height() as usize);
    let mut to = dst.view_mut::<P>()?;
    for y in 0..h {
        for x in 0..w {
            to.set(x * n + c, y, value);
        }
    }
    Ok(())
}

/// Read component `c` of the `n`-component plane `src` into planar `dst`.
fn unpack_component<P: Sample>(
    dst: &mut Plane,
    src: &Plane,
    c: usize,
    n: usize,
    order: ByteOrder<P>,
) -> Result<(), ConvertError> {
    let (w, h) = (dst.width() as usize, dst.height() as usize);
    let from = src.view::<P>()?;
    let mut to = dst.view_mut::<P>()?;
    for y in 0..h {
        for x in 0..w {
            to.set(x, y, order(from.get(x * n + c, y)));
        }
    }
    Ok(())
}

/// Planar R, G, B (+ alpha) at `bits` → one interleaved plane laid out as
/// `chroma`. Missing alpha is filled with `alpha_fill`.
fn interleave<P: Sample>(
    input: &PixelImage,
    chroma: Chroma,
    bits: u8,
    order: ByteOrder<P>,
    alpha_fill: P,
) -> Result<PixelImage, ConvertError> {
    let n = chroma.interleaved_components();
    let alpha = if n == 4 && input.has_channel(Channel::Alpha) {
        Some(input.checked_plane(Channel::Alpha, Some(bits))?)
    } else {
        None
    };
    let mut out = PixelImage::new(input.width(), input.height(), Colorspace::Rgb, chroma);
    let dst = out.add_plane(Channel::Interleaved, bits)?;
    for (c, channel) in RGB.into_iter().enumerate() {
        pack_component(dst, input.checked_plane(channel, Some(bits))?, c, n, order)?;
    }
    if n == 4 {
        match alpha {
            Some(a) => pack_component(dst, a, 3, n, order)?,
            None => fill_component(dst, 3, n, order(alpha_fill))?,
        }
    }
    Ok(out)
}

/// One interleaved plane → planar R, G, B, plus alpha when `want_alpha`.
/// Missing alpha is filled with `alpha_fill`.
fn deinterleave<P: Sample>(
    input: &PixelImage,
    src: &Plane,
    order: ByteOrder<P>,
    want_alpha: bool,
    alpha_fill: P,
) -> Result<PixelImage, ConvertError> {
    let bits = src.bit_depth();
    let n = input.chroma().interleaved_components();
    let mut out = PixelImage::new(input.width(), input.height(), Colorspace::Rgb, Chroma::C444);
    for (c, channel) in RGB.into_iter().enumerate() {
        unpack_component(out.add_plane(channel, bits)?, src, c, n, order)?;
    }
    if want_alpha {
        let dst = out.add_plane(Channel::Alpha, bits)?;
        if n == 4 {
            unpack_component(dst, src, 3, n, order)?;
        } else {
            fill_component(dst, 0, 1, alpha_fill)?;
        }
    }
    Ok(out)
}

fn require_bits(channel: Channel, expected: u8, actual: u8) -> Result<(), ConvertError> {
    if expected != actual {
        return Err(ConvertError::BitDepthMismatch {
            channel,
            expected,
            actual,
        });
    }
    Ok(())
}

fn is_planar_rgb(input: &ColorState) -> bool {
    input.colorspace == Colorspace::Rgb && input.chroma == Chroma::C444
}

/// Planar 8-bit RGB → interleaved RGB24 / RGBA32.
#[derive(Debug)]
pub struct RgbToInterleaved;

impl ColorConversionOp for RgbToInterleaved {
    fn name(&self) -> &'static str {
        "rgb_to_rgb24_32"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_planar_rgb(input) || input.bits_per_pixel != 8 {
            return Candidates::new();
        }
        smallvec![
            ColorStateWithCost {
                state: ColorState {
                    chroma: Chroma::InterleavedRgba,
                    has_alpha: true,
                    ..*input
                },
                cost: SpeedCost::UNOPTIMIZED,
            },
            ColorStateWithCost {
                state: ColorState {
                    chroma: Chroma::InterleavedRgb,
                    has_alpha: false,
                    ..*input
                },
                cost: SpeedCost::UNOPTIMIZED,
            },
        ]
    }

    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let bits = common_bit_depth(input, &RGB)?;
        require_bits(Channel::R, 8, bits)?;
        let chroma = if target.has_alpha {
            Chroma::InterleavedRgba
        } else {
            Chroma::InterleavedRgb
        };
        interleave::<u8>(input, chroma, 8, native, 0xFF)
    }
}

/// Interleaved RGB24 / RGBA32 → planar 8-bit RGB.
#[derive(Debug)]
pub struct InterleavedToRgb;

impl ColorConversionOp for InterleavedToRgb {
    fn name(&self) -> &'static str {
        "rgb24_32_to_rgb"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if input.colorspace != Colorspace::Rgb
            || !matches!(input.chroma, Chroma::InterleavedRgb | Chroma::InterleavedRgba)
            || input.bits_per_pixel != 8
        {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: ColorState {
                chroma: Chroma::C444,
                has_alpha: target.has_alpha,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        if !matches!(input.chroma(), Chroma::InterleavedRgb | Chroma::InterleavedRgba) {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "expected RGB or RGBA, got {}",
                input.chroma()
            )));
        }
        let src = input.checked_plane(Channel::Interleaved, Some(8))?;
        deinterleave::<u8>(input, src, native, target.has_alpha, 0xFF)
    }
}

/// Planar deep RGB → 16-bit big-endian RRGGBB / RRGGBBAA.
#[derive(Debug)]
pub struct RgbHdrToRrggbbaaBe;

impl ColorConversionOp for RgbHdrToRrggbbaaBe {
    fn name(&self) -> &'static str {
        "rgb_hdr_to_rrggbbaa_be"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if !is_planar_rgb(input) || input.bits_per_pixel <= 8 {
            return Candidates::new();
        }
        let rrggbbaa = ColorStateWithCost {
            state: ColorState {
                chroma: Chroma::InterleavedRrggbbaaBe,
                has_alpha: true,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        };
        if input.has_alpha {
            return smallvec![rrggbbaa];
        }
        let rrggbb = ColorStateWithCost {
            state: ColorState {
                chroma: Chroma::InterleavedRrggbbBe,
                has_alpha: false,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        };
        smallvec![rrggbb, rrggbbaa]
    }

    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        let bits = common_bit_depth(input, &RGB)?;
        if bits <= 8 {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "{bits}-bit RGB cannot be packed as 16-bit components"
            )));
        }
        let chroma = if target.has_alpha {
            Chroma::InterleavedRrggbbaaBe
        } else {
            Chroma::InterleavedRrggbbBe
        };
        interleave(input, chroma, bits, u16::to_be, max_value(bits))
    }
}

/// 16-bit big-endian RRGGBB / RRGGBBAA → planar deep RGB.
#[derive(Debug)]
pub struct RrggbbaaBeToRgbHdr;

impl ColorConversionOp for RrggbbaaBeToRgbHdr {
    fn name(&self) -> &'static str {
        "rrggbbaa_be_to_rgb_hdr"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        if input.colorspace != Colorspace::Rgb
            || !matches!(
                input.chroma,
                Chroma::InterleavedRrggbbBe | Chroma::InterleavedRrggbbaaBe
            )
            || input.bits_per_pixel <= 8
        {
            return Candidates::new();
        }
        smallvec![ColorStateWithCost {
            state: ColorState {
                chroma: Chroma::C444,
                has_alpha: target.has_alpha,
                ..*input
            },
            cost: SpeedCost::UNOPTIMIZED,
        }]
    }

    fn convert(
        &self,
        input: &PixelImage,
        target: &ColorState,
        _options: &ConversionOptions,
    ) -> Result<PixelImage, ConvertError> {
        if !matches!(
            input.chroma(),
            Chroma::InterleavedRrggbbBe | Chroma::InterleavedRrggbbaaBe
        ) {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "expected big-endian RRGGBB(AA), got {}",
                input.chroma()
            )));
        }
        let src = input.checked_plane(Channel::Interleaved, None)?;
        let fill = max_value(src.bit_depth());
        deinterleave(input, src, u16::from_be, target.has_alpha, fill)
    }
}

/// Byte order of packed 16-bit RGB(A), in both directions.
#[derive(Debug)]
pub struct RrggbbaaSwapEndianness;

fn swapped(chroma: Chroma) -> Option<Chroma> {
    match chroma {
        Chroma::InterleavedRrggbbBe => Some(Chroma::InterleavedRrggbbLe),
        Chroma::InterleavedRrggbbLe => Some(Chroma::InterleavedRrggbbBe),
        Chroma::InterleavedRrggbbaaBe => Some(Chroma::InterleavedRrggbbaaLe),
        Chroma::InterleavedRrggbbaaLe => Some(Chroma::InterleavedRrggbbaaBe),
        _ => None,
    }
}

impl ColorConversionOp for RrggbbaaSwapEndianness {
    fn name(&self) -> &'static str {
        "rrggbbaa_swap_endianness"
    }

    fn candidate_targets(
        &self,
        input: &ColorState,
        _target: &ColorState,
        _options: &ConversionOptions,
    ) -> Candidates {
        let Some(chroma) = swapped(input.chroma).filter(|_| input.colorspace == Colorspace::Rgb) else {
            return Candidates::new();
        };
        smallvec![ColorStateWithCost {
            state: ColorState {
                chroma,
                has_alpha: chroma.has_interleaved_alpha(),
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
        let chroma = swapped(input.chroma()).ok_or_else(|| {
            ConvertError::InvalidParameter(alloc::format!(
                "{} is not a packed 16-bit layout",
                input.chroma()
            ))
        })?;
        let src = input.checked_plane(Channel::Interleaved, None)?;
        let mut out = PixelImage::new(input.width(), input.height(), Colorspace::Rgb, chroma);
        let dst = out.add_plane(Channel::Interleaved, src.bit_depth())?;
        for (dst_row, src_row) in dst.rows_mut().zip(src.rows()) {
            for (d, s) in dst_row.chunks_exact_mut(2).zip(src_row.chunks_exact(2)) {
                d[0] = s[1];
                d[1] = s[0];
            }
        }
        Ok(out)
    }
}
