//! Test corpus: conversions over generated patterns, many sizes and depths.

use enough::Unstoppable;
use zenplanes::*;

fn checkerboard(w: usize, h: usize, max: u16) -> Vec<u16> {
    let mut samples = vec![0u16; w * h];
    for y in 0..h {
        for x in 0..w {
            samples[y * w + x] = if (x + y) % 2 == 0 { max - max / 10 } else { max / 12 };
        }
    }
    samples
}

fn noise_pattern(w: usize, h: usize, max: u16) -> Vec<u16> {
    let mut state: u32 = 0xDEAD_BEEF;
    (0..w * h)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % (u32::from(max) + 1)) as u16
        })
        .collect()
}

const SIZES: &[(u32, u32)] = &[
    (1, 1),
    (1, 2),
    (2, 1),
    (2, 2),
    (3, 3),
    (3, 4),
    (4, 3),
    (5, 1),
    (1, 5),
    (7, 9),
    (8, 8),
    (16, 15),
    (33, 17),
];

fn max_value(bits: u8) -> u16 {
    ((1u32 << bits) - 1) as u16
}

fn fill(img: &mut PixelImage, channel: Channel, values: &[u16]) {
    let plane = img.plane_mut(channel).unwrap();
    let w = plane.width() as usize;
    let bps = plane.bytes_per_sample();
    for (y, chunk) in values.chunks(w).enumerate() {
        let row = plane.row_mut(y as u32).unwrap();
        for (x, &v) in chunk.iter().enumerate() {
            if bps == 1 {
                row[x] = v as u8;
            } else {
                row[2 * x..2 * x + 2].copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
}

fn samples(img: &PixelImage, channel: Channel) -> Vec<u16> {
    let plane = img.plane(channel).unwrap();
    let bps = plane.bytes_per_sample();
    plane
        .rows()
        .flat_map(|row| {
            row.chunks_exact(bps).map(move |s| {
                if bps == 1 {
                    u16::from(s[0])
                } else {
                    u16::from_ne_bytes([s[0], s[1]])
                }
            })
        })
        .collect()
}

/// An image with every plane of `channels` filled from `pattern`.
fn patterned(
    (w, h): (u32, u32),
    colorspace: Colorspace,
    chroma: Chroma,
    channels: &[Channel],
    bits: u8,
    pattern: fn(usize, usize, u16) -> Vec<u16>,
) -> PixelImage {
    let mut img = PixelImage::new(w, h, colorspace, chroma);
    for &channel in channels {
        let plane = img.add_plane(channel, bits).unwrap();
        let (pw, ph) = (plane.width() as usize, plane.height() as usize);
        let values = pattern(pw, ph, max_value(bits));
        fill(&mut img, channel, &values);
    }
    img
}

const YCBCR: [Channel; 3] = [Channel::Y, Channel::Cb, Channel::Cr];
const RGB: [Channel; 3] = [Channel::R, Channel::G, Channel::B];
const RGBA: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::Alpha];

// ── Chroma resampling ────────────────────────────────────────────────

#[test]
fn downsampling_stays_within_source_range() {
    for &size in SIZES {
        for bits in [8, 10, 16] {
            let img = patterned(size, Colorspace::YCbCr, Chroma::C444, &YCBCR, bits, noise_pattern);
            let out = convert(img.clone(), None, Some(Chroma::C420), Unstoppable).unwrap();
            let cb = out.plane(Channel::Cb).unwrap();
            assert_eq!((cb.width(), cb.height()), (size.0.div_ceil(2), size.1.div_ceil(2)));
            assert_eq!(samples(&out, Channel::Y), samples(&img, Channel::Y));

            let src = samples(&img, Channel::Cb);
            let (lo, hi) = (*src.iter().min().unwrap(), *src.iter().max().unwrap());
            assert!(samples(&out, Channel::Cb).iter().all(|v| (lo..=hi).contains(v)), "{size:?} at {bits} bits");
        }
    }
}

#[test]
fn upsampling_stays_within_source_range() {
    for &size in SIZES {
        for bits in [8, 12] {
            let img = patterned(size, Colorspace::YCbCr, Chroma::C420, &YCBCR, bits, checkerboard);
            let out = convert(img.clone(), None, Some(Chroma::C444), Unstoppable).unwrap();
            let cr = out.plane(Channel::Cr).unwrap();
            assert_eq!((cr.width(), cr.height()), size);

            let src = samples(&img, Channel::Cr);
            let (lo, hi) = (*src.iter().min().unwrap(), *src.iter().max().unwrap());
            assert!(samples(&out, Channel::Cr).iter().all(|v| (lo..=hi).contains(v)), "{size:?} at {bits} bits");
        }
    }
}

#[test]
fn alpha_rides_along_through_resampling() {
    let channels = [Channel::Y, Channel::Cb, Channel::Cr, Channel::Alpha];
    for &size in SIZES {
        let img = patterned(size, Colorspace::YCbCr, Chroma::C444, &channels, 8, noise_pattern);
        let there = convert(img.clone(), None, Some(Chroma::C420), Unstoppable).unwrap();
        let back = convert(there, None, Some(Chroma::C444), Unstoppable).unwrap();
        assert_eq!(back.plane(Channel::Alpha), img.plane(Channel::Alpha));
    }
}

// ── RGB packing ──────────────────────────────────────────────────────

#[test]
fn planar_rgb_through_rgba32_and_back() {
    for &size in SIZES {
        let img = patterned(size, Colorspace::Rgb, Chroma::C444, &RGB, 8, noise_pattern);
        let packed = convert(img.clone(), None, Some(Chroma::InterleavedRgba), Unstoppable).unwrap();
        let alpha: Vec<u8> = packed
            .plane(Channel::Interleaved)
            .unwrap()
            .rows()
            .flat_map(|row| row.chunks_exact(4).map(|px| px[3]))
            .collect();
        assert!(alpha.iter().all(|&a| a == 0xFF));

        let back = ConvertRequest::to_state(ColorState::new(Colorspace::Rgb, Chroma::C444, false, 8))
            .convert(packed, Unstoppable)
            .unwrap();
        assert_eq!(back, img, "{size:?}");
    }
}

#[test]
fn rgb24_through_planar_and_back() {
    for &size in SIZES {
        let planar = patterned(size, Colorspace::Rgb, Chroma::C444, &RGB, 8, checkerboard);
        let rgb24 = convert(planar, None, Some(Chroma::InterleavedRgb), Unstoppable).unwrap();
        let split = convert(rgb24.clone(), None, Some(Chroma::C444), Unstoppable).unwrap();
        assert!(!split.has_alpha());
        let joined = convert(split, None, Some(Chroma::InterleavedRgb), Unstoppable).unwrap();
        assert_eq!(joined, rgb24);
    }
}

#[test]
fn deep_rgba_through_little_endian_and_back() {
    for &size in SIZES {
        for bits in [10, 12, 16] {
            let img = patterned(size, Colorspace::Rgb, Chroma::C444, &RGBA, bits, noise_pattern);
            let le = convert(img.clone(), None, Some(Chroma::InterleavedRrggbbaaLe), Unstoppable).unwrap();
            assert_eq!(le.bits_per_pixel(Channel::Interleaved), Some(bits));
            let back = convert(le, None, Some(Chroma::C444), Unstoppable).unwrap();
            assert_eq!(back, img, "{size:?} at {bits} bits");
        }
    }
}

#[test]
fn grey_to_rgb24_replicates_luma() {
    for &size in SIZES {
        let img = patterned(size, Colorspace::Monochrome, Chroma::Monochrome, &[Channel::Y], 8, noise_pattern);
        let out = convert(img.clone(), Some(Colorspace::Rgb), Some(Chroma::InterleavedRgb), Unstoppable).unwrap();
        let luma = samples(&img, Channel::Y);
        let rgb: Vec<u8> = out.plane(Channel::Interleaved).unwrap().rows().flatten().copied().collect();
        for (px, &v) in rgb.chunks_exact(3).zip(&luma) {
            assert_eq!(px, [v as u8; 3]);
        }
    }
}

#[test]
fn endianness_swap_twice_restores_bytes() {
    let layouts = [
        (Chroma::InterleavedRrggbbBe, Chroma::InterleavedRrggbbLe),
        (Chroma::InterleavedRrggbbLe, Chroma::InterleavedRrggbbBe),
        (Chroma::InterleavedRrggbbaaBe, Chroma::InterleavedRrggbbaaLe),
        (Chroma::InterleavedRrggbbaaLe, Chroma::InterleavedRrggbbaaBe),
    ];
    for &size in SIZES {
        for (from, to) in layouts {
            for bits in [10, 16] {
                let mut img = PixelImage::new(size.0, size.1, Colorspace::Rgb, from);
                let plane = img.add_plane(Channel::Interleaved, bits).unwrap();
                let row_len = size.0 as usize * from.interleaved_components() * 2;
                let bytes = noise_pattern(row_len, size.1 as usize, 0xFF);
                for (y, chunk) in bytes.chunks(row_len).enumerate() {
                    let row = plane.row_mut(y as u32).unwrap();
                    for (b, &v) in row.iter_mut().zip(chunk) {
                        *b = v as u8;
                    }
                }

                let swapped = convert(img.clone(), None, Some(to), Unstoppable).unwrap();
                assert_eq!(swapped.chroma(), to);
                assert_eq!(swapped.has_alpha(), img.has_alpha());
                let back = convert(swapped, None, Some(from), Unstoppable).unwrap();
                assert_eq!(back, img, "{size:?} {from} at {bits} bits");
            }
        }
    }
}

// ── Bit depth ────────────────────────────────────────────────────────

#[test]
fn widen_then_narrow_is_lossless() {
    for &size in SIZES {
        for bits in [9, 10, 12, 16] {
            let img = patterned(size, Colorspace::YCbCr, Chroma::C420, &YCBCR, 8, noise_pattern);
            let deep = ConvertRequest::unchanged()
                .with_bit_depth(bits)
                .convert(img.clone(), Unstoppable)
                .unwrap();
            assert!(samples(&deep, Channel::Cb).iter().all(|&v| v <= max_value(bits)));
            let back = ConvertRequest::unchanged().with_bit_depth(8).convert(deep, Unstoppable).unwrap();
            assert_eq!(back, img, "{size:?} through {bits} bits");
        }
    }
}

#[test]
fn memory_limit_rejects_large_intermediates() {
    let limits = Limits {
        max_memory_bytes: Some(1024),
        ..Default::default()
    };
    let small = patterned((8, 8), Colorspace::Monochrome, Chroma::Monochrome, &[Channel::Y], 8, checkerboard);
    assert!(ConvertRequest::new(Colorspace::YCbCr, Chroma::C420)
        .with_limits(&limits)
        .convert(small, Unstoppable)
        .is_ok());

    let large = patterned((64, 64), Colorspace::Monochrome, Chroma::Monochrome, &[Channel::Y], 8, checkerboard);
    let err = ConvertRequest::new(Colorspace::YCbCr, Chroma::C420)
        .with_limits(&limits)
        .convert(large, Unstoppable)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MemoryAllocation);
}
