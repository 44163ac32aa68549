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

fn state(bytes: &[u8]) -> ColorState {
    ColorState::new(
        COLORSPACES[bytes[0] as usize % 3],
        CHROMAS[bytes[1] as usize % 10],
        bytes[2] & 1 == 1,
        bytes[3] % 18,
    )
}

fuzz_target!(|data: &[u8]| {
    // Planning any pair of states, consistent or not, must never panic and
    // must respect the depth bound.
    if data.len() < 8 {
        return;
    }
    let from = state(&data[..4]);
    let to = state(&data[4..8]);
    if let Ok(pipeline) = ConversionPipeline::construct(&from, &Target::Exact(to), ConversionOptions::default()) {
        assert!(pipeline.steps().len() <= MAX_PIPELINE_STEPS);
        if let Some(last) = pipeline.output_state() {
            assert_eq!(last, to, "pipeline ends off target");
        }
    }
});
