use enough::{Stop, StopReason, Unstoppable};
use zenplanes::ops::{Candidates, ColorConversionOp};
use zenplanes::*;

/// Planner traces show up with `RUST_LOG=zenplanes=trace`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn planar(width: u32, height: u32, colorspace: Colorspace, chroma: Chroma, channels: &[Channel], bits: u8) -> PixelImage {
    let mut img = PixelImage::new(width, height, colorspace, chroma);
    for &channel in channels {
        img.add_plane(channel, bits).unwrap();
    }
    img
}

/// Write samples row by row; values are truncated to the plane's storage.
fn write_samples(img: &mut PixelImage, channel: Channel, values: &[u16]) {
    let plane = img.plane_mut(channel).unwrap();
    let (w, h, bps) = (plane.width() as usize, plane.height() as usize, plane.bytes_per_sample());
    assert_eq!(values.len(), w * h);
    for y in 0..h {
        let row = plane.row_mut(y as u32).unwrap();
        for (x, &v) in values[y * w..(y + 1) * w].iter().enumerate() {
            if bps == 1 {
                row[x] = v as u8;
            } else {
                row[2 * x..2 * x + 2].copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
}

fn read_samples(img: &PixelImage, channel: Channel) -> Vec<u16> {
    let plane = img.plane(channel).unwrap();
    let bps = plane.bytes_per_sample();
    plane
        .rows()
        .flat_map(|row| {
            row.chunks_exact(bps).map(|s| match s {
                [v] => u16::from(*v),
                [a, b] => u16::from_ne_bytes([*a, *b]),
                _ => unreachable!(),
            })
        })
        .collect()
}

const YCBCR: [Channel; 3] = [Channel::Y, Channel::Cb, Channel::Cr];
const RGB: [Channel; 3] = [Channel::R, Channel::G, Channel::B];

#[test]
fn identity_conversion_returns_input() {
    let mut img = planar(7, 5, Colorspace::YCbCr, Chroma::C420, &YCBCR, 10);
    write_samples(&mut img, Channel::Y, &(0..35).map(|v| v * 29).collect::<Vec<_>>());
    let out = ConvertRequest::new(Colorspace::YCbCr, Chroma::C420)
        .convert(img.clone(), Unstoppable)
        .unwrap();
    assert_eq!(out, img);
}

#[test]
fn endianness_swap_is_an_involution() {
    let mut img = PixelImage::new(3, 2, Colorspace::Rgb, Chroma::InterleavedRrggbbaaLe);
    img.add_plane(Channel::Interleaved, 12).unwrap();
    for y in 0..2 {
        let row = img.plane_mut(Channel::Interleaved).unwrap().row_mut(y).unwrap();
        for (i, b) in row.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(y as u8);
        }
    }
    let be = ConvertRequest::new(Colorspace::Rgb, Chroma::InterleavedRrggbbaaBe)
        .convert(img.clone(), Unstoppable)
        .unwrap();
    assert_eq!(be.chroma(), Chroma::InterleavedRrggbbaaBe);
    let src_row = img.plane(Channel::Interleaved).unwrap().row(0).unwrap();
    let be_row = be.plane(Channel::Interleaved).unwrap().row(0).unwrap();
    assert_eq!(be_row[0], src_row[1]);
    assert_eq!(be_row[1], src_row[0]);

    let le = ConvertRequest::new(Colorspace::Rgb, Chroma::InterleavedRrggbbaaLe)
        .convert(be, Unstoppable)
        .unwrap();
    assert_eq!(le, img);
}

#[test]
fn downsampling_averages_blocks() {
    let mut img = planar(2, 2, Colorspace::YCbCr, Chroma::C444, &YCBCR, 8);
    write_samples(&mut img, Channel::Cb, &[100, 110, 120, 130]);
    write_samples(&mut img, Channel::Cr, &[10, 20, 30, 40]);
    let out = convert(img, None, Some(Chroma::C420), Unstoppable).unwrap();
    assert_eq!(read_samples(&out, Channel::Cb), [115]);
    assert_eq!(read_samples(&out, Channel::Cr), [25]);
}

#[test]
fn odd_last_row_averages_pairs() {
    let mut img = planar(2, 3, Colorspace::YCbCr, Chroma::C444, &YCBCR, 8);
    write_samples(&mut img, Channel::Cb, &[10, 20, 30, 40, 50, 61]);
    let out = convert(img, None, Some(Chroma::C420), Unstoppable).unwrap();
    // (10+20+30+40+2)/4 = 25, (50+61+1)/2 = 56
    assert_eq!(read_samples(&out, Channel::Cb), [25, 56]);
}

#[test]
fn mono_to_rgba_synthesizes_alpha() {
    let mut img = planar(2, 2, Colorspace::Monochrome, Chroma::Monochrome, &[Channel::Y], 8);
    write_samples(&mut img, Channel::Y, &[0, 64, 128, 255]);
    let out = convert(img, Some(Colorspace::Rgb), Some(Chroma::InterleavedRgba), Unstoppable).unwrap();
    let pixels: Vec<u8> = out.plane(Channel::Interleaved).unwrap().rows().flatten().copied().collect();
    assert_eq!(
        pixels,
        [0, 0, 0, 255, 64, 64, 64, 255, 128, 128, 128, 255, 255, 255, 255, 255]
    );
}

#[test]
fn flat_chroma_survives_444_420_444() {
    for bits in [8, 10] {
        let mut img = planar(9, 7, Colorspace::YCbCr, Chroma::C444, &YCBCR, bits);
        let flat = if bits == 8 { 77 } else { 301 };
        write_samples(&mut img, Channel::Cb, &[flat; 63]);
        write_samples(&mut img, Channel::Cr, &[flat + 5; 63]);
        let sub = convert(img.clone(), None, Some(Chroma::C420), Unstoppable).unwrap();
        let full = convert(sub, None, Some(Chroma::C444), Unstoppable).unwrap();
        assert_eq!(full, img, "{bits}-bit flat chroma");
    }
}

#[test]
fn sdr_rgb_to_packed_big_endian() {
    init_tracing();
    let mut img = planar(2, 1, Colorspace::Rgb, Chroma::C444, &RGB, 8);
    write_samples(&mut img, Channel::R, &[255, 0]);
    write_samples(&mut img, Channel::G, &[128, 0]);
    write_samples(&mut img, Channel::B, &[0, 1]);
    let request = ConvertRequest::new(Colorspace::Rgb, Chroma::InterleavedRrggbbBe);
    let pipeline = request.plan(&img.color_state().unwrap()).unwrap();
    let names: Vec<_> = pipeline.steps().iter().map(|s| s.op.name()).collect();
    assert_eq!(names, ["to_hdr_planes", "rgb_hdr_to_rrggbbaa_be"]);

    let out = request.convert(img, Unstoppable).unwrap();
    assert_eq!(out.bits_per_pixel(Channel::Interleaved), Some(10));
    let row = out.plane(Channel::Interleaved).unwrap().row(0).unwrap();
    // 255 -> 1023, 128 -> 514, 1 -> 4
    assert_eq!(row, [0x03, 0xFF, 0x02, 0x02, 0, 0, 0, 0, 0, 0, 0, 4]);
}

#[test]
fn packed_big_endian_back_to_planar() {
    let mut img = PixelImage::new(1, 1, Colorspace::Rgb, Chroma::InterleavedRrggbbBe);
    img.add_plane(Channel::Interleaved, 10).unwrap();
    img.plane_mut(Channel::Interleaved)
        .unwrap()
        .row_mut(0)
        .unwrap()
        .copy_from_slice(&[0x03, 0xFF, 0x01, 0x00, 0x00, 0x2A]);
    let out = ConvertRequest::to_state(ColorState::new(Colorspace::Rgb, Chroma::C444, true, 10))
        .convert(img, Unstoppable)
        .unwrap();
    assert_eq!(read_samples(&out, Channel::R), [1023]);
    assert_eq!(read_samples(&out, Channel::G), [256]);
    assert_eq!(read_samples(&out, Channel::B), [42]);
    assert_eq!(read_samples(&out, Channel::Alpha), [1023]);
}

#[test]
fn deep_ycbcr_to_8bit() {
    let mut img = planar(4, 4, Colorspace::YCbCr, Chroma::C420, &YCBCR, 10);
    write_samples(&mut img, Channel::Y, &[1023; 16]);
    let out = ConvertRequest::unchanged().with_bit_depth(8).convert(img, Unstoppable).unwrap();
    assert_eq!(out.bits_per_pixel(Channel::Cb), Some(8));
    assert!(read_samples(&out, Channel::Y).iter().all(|&v| v == 255));
}

#[test]
fn mixed_plane_depths_fail_after_planning() {
    let mut img = PixelImage::new(4, 4, Colorspace::YCbCr, Chroma::C420);
    for (channel, bits) in [(Channel::Y, 10), (Channel::Cb, 8), (Channel::Cr, 12)] {
        img.add_plane(channel, bits).unwrap();
    }
    let err = ConvertRequest::unchanged().with_bit_depth(8).convert(img, Unstoppable).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameterValue);

    let mut img = planar(3, 3, Colorspace::YCbCr, Chroma::C444, &[Channel::Y, Channel::Alpha], 8);
    img.add_plane(Channel::Cb, 10).unwrap();
    img.add_plane(Channel::Cr, 16).unwrap();
    let target = ColorState::new(Colorspace::YCbCr, Chroma::C444, false, 8);
    let err = ConvertRequest::to_state(target).convert(img, Unstoppable).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameterValue);
}

#[derive(Debug)]
struct Marker(&'static str);

impl ColorConversionOp for Marker {
    fn name(&self) -> &'static str {
        self.0
    }

    fn candidate_targets(&self, input: &ColorState, _target: &ColorState, _options: &ConversionOptions) -> Candidates {
        let mut out = Candidates::new();
        if input.chroma == Chroma::C444 {
            out.push(ColorStateWithCost {
                state: ColorState { chroma: Chroma::C420, ..*input },
                cost: SpeedCost::UNOPTIMIZED,
            });
        }
        out
    }

    fn convert(&self, input: &PixelImage, _target: &ColorState, _options: &ConversionOptions) -> Result<PixelImage, ConvertError> {
        Ok(input.clone())
    }
}

static FIRST: Marker = Marker("first");
static SECOND: Marker = Marker("second");
static FIRST_THEN_SECOND: &[&dyn ColorConversionOp] = &[&FIRST, &SECOND];
static SECOND_THEN_FIRST: &[&dyn ColorConversionOp] = &[&SECOND, &FIRST];

#[test]
fn equal_cost_ties_go_to_the_first_registered_operator() {
    let from = ColorState::new(Colorspace::YCbCr, Chroma::C444, false, 8);
    let to = Target::Exact(ColorState { chroma: Chroma::C420, ..from });
    let options = ConversionOptions::default();
    for _ in 0..3 {
        let a = ConversionPipeline::construct_with(FIRST_THEN_SECOND, &from, &to, options).unwrap();
        assert_eq!(a.steps()[0].op.name(), "first");
        let b = ConversionPipeline::construct_with(SECOND_THEN_FIRST, &from, &to, options).unwrap();
        assert_eq!(b.steps()[0].op.name(), "second");
    }
}

#[test]
fn built_in_plans_are_deterministic() {
    init_tracing();
    let from = ColorState::new(Colorspace::Monochrome, Chroma::Monochrome, true, 8);
    let to = Target::Exact(ColorState::new(Colorspace::YCbCr, Chroma::C444, false, 12));
    let first = ConversionPipeline::construct(&from, &to, ConversionOptions::default()).unwrap();
    for _ in 0..5 {
        let again = ConversionPipeline::construct(&from, &to, ConversionOptions::default()).unwrap();
        assert_eq!(again.to_string(), first.to_string());
    }
    assert!(first.steps().len() <= MAX_PIPELINE_STEPS);
}

struct Cancelled;

impl Stop for Cancelled {
    fn check(&self) -> Result<(), StopReason> {
        Err(StopReason::Cancelled)
    }
}

#[test]
fn cancelled_conversion_stops() {
    let img = planar(4, 4, Colorspace::Monochrome, Chroma::Monochrome, &[Channel::Y], 8);
    let err = convert(img, Some(Colorspace::YCbCr), Some(Chroma::C420), Cancelled).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn encoder_glue_reaches_encoder_layout() {
    let mut img = planar(6, 6, Colorspace::Monochrome, Chroma::Monochrome, &[Channel::Y, Channel::Alpha], 8);
    write_samples(&mut img, Channel::Y, &[90; 36]);
    let encoder = FixedInput::new(Colorspace::YCbCr, Chroma::C444);
    let out = prepare_for_encoder(img, &encoder, Some(Nclx::SRGB), ConversionOptions::default(), Unstoppable).unwrap();
    assert_eq!(out.chroma(), Chroma::C444);
    assert!(out.has_alpha());
    assert_eq!(out.colorimetry(), Some(Nclx::SRGB));
    assert!(read_samples(&out, Channel::Cb).iter().all(|&v| v == 128));
}
