#![no_main]
use libfuzzer_sys::fuzz_target;
use zenplanes::*;

const COLORSPACES: [Colorspace; 3] = [Colorspace::Monochrome, Colorspace::YCbCr, Colorspace::Rgb];
const CHROMAS: [Chroma; 10] = [
    Chroma::Monochrome,
    Chroma::C420,
    Chroma::C422,
    Chroma::C444,
    Chroma::InterleavedRgb,
    Chroma::InterleavedRgba,
    Chroma::InterleavedRrggbbBe,
    Chroma::InterleavedRrggbbLe,
    Chroma::InterleavedRrggbbaaBe,
    Chroma::InterleavedRrggbbaaLe,
];
const CHANNELS: [Channel; 8] = [
    Channel::Y,
    Channel::Cb,
    Channel::Cr,
    Channel::R,
    Channel::G,
    Channel::B,
    Channel::Alpha,
    Channel::Interleaved,
];

fuzz_target!(|data: &[u8]| {
    // Images may be inconsistent with their declared layout (missing planes,
    // mixed depths). Conversion must fail cleanly, never panic.
    let [w, h, cs, ch, mask, depths @ .., tcs, tch] = data else {
        return;
    };
    let (width, height) = (u32::from(w % 24) + 1, u32::from(h % 24) + 1);
    let mut img = PixelImage::new(width, height, COLORSPACES[*cs as usize % 3], CHROMAS[*ch as usize % 10]);
    for (i, &channel) in CHANNELS.iter().enumerate() {
        if (*mask >> i) & 1 == 0 {
            continue;
        }
        let bits = depths.get(i).map_or(8, |d| d % 16 + 1);
        let Ok(plane) = img.add_plane(channel, bits) else {
            continue;
        };
        let mut seed = u32::from(bits).wrapping_mul(2_654_435_761);
        for y in 0..plane.height() {
            if let Some(row) = plane.row_mut(y) {
                for b in row.iter_mut() {
                    seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                    *b = (seed >> 16) as u8;
                }
            }
        }
    }

    let limits = Limits {
        max_memory_bytes: Some(1 << 20),
        ..Default::default()
    };
    let target_colorspace = COLORSPACES[*tcs as usize % 3];
    let target_chroma = CHROMAS[*tch as usize % 10];
    let _ = ConvertRequest::new(target_colorspace, target_chroma)
        .with_limits(&limits)
        .convert(img, enough::Unstoppable);
});
