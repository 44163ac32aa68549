/// Chroma downsampling filter for 4:4:4 → 4:2:0.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChromaDownsampling {
    /// Mean of each 2×2 block, rounded half up.
    #[default]
    Average,
}

/// Chroma upsampling filter for 4:2:0 → 4:4:4.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChromaUpsampling {
    /// Separable {3, 1} weights around centered chroma samples.
    #[default]
    Bilinear,
}

/// Caller preferences that steer which operators the planner may use.
///
/// Operators whose algorithm does not match a preference report no
/// candidates, so a preference can make a conversion unreachable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConversionOptions {
    pub preferred_chroma_downsampling_algorithm: ChromaDownsampling,
    pub preferred_chroma_upsampling_algorithm: ChromaUpsampling,
}

impl ConversionOptions {
    pub fn with_downsampling(mut self, algorithm: ChromaDownsampling) -> Self {
        self.preferred_chroma_downsampling_algorithm = algorithm;
        self
    }

    pub fn with_upsampling(mut self, algorithm: ChromaUpsampling) -> Self {
        self.preferred_chroma_upsampling_algorithm = algorithm;
        self
    }
}
