use alloc::boxed::Box;
use alloc::string::String;
use enough::StopReason;

use crate::pixel::Channel;
use crate::state::{ColorState, Target};

/// Errors from conversion planning and execution.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error("unsupported color conversion from {from} to {to}")]
    UnsupportedConversion { from: ColorState, to: Target },

    #[error("invalid parameter value: {0}")]
    InvalidParameter(String),

    #[error("image has no {0:?} plane")]
    MissingPlane(Channel),

    #[error("{channel:?} plane has {actual} bits per sample, expected {expected}")]
    BitDepthMismatch {
        channel: Channel,
        expected: u8,
        actual: u8,
    },

    #[error("{channel:?} plane is {actual:?}, expected {expected:?}")]
    PlaneSizeMismatch {
        channel: Channel,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("failed to allocate {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("conversion step {op} failed")]
    StepFailed {
        op: &'static str,
        #[source]
        source: Box<ConvertError>,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

/// Coarse classification of a [`ConvertError`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// No operator chain reaches the requested target.
    UnsupportedColorConversion,
    /// The image contradicts what an operator was promised.
    InvalidParameterValue,
    /// An output plane could not be allocated or exceeds the limits.
    MemoryAllocation,
    /// The caller's [`enough::Stop`] fired.
    Cancelled,
}

impl ConvertError {
    /// Classify this error. `StepFailed` reports the kind of its cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedConversion { .. } => ErrorKind::UnsupportedColorConversion,
            Self::InvalidParameter(_)
            | Self::MissingPlane(_)
            | Self::BitDepthMismatch { .. }
            | Self::PlaneSizeMismatch { .. } => ErrorKind::InvalidParameterValue,
            Self::DimensionsTooLarge { .. } | Self::LimitExceeded(_) | Self::OutOfMemory { .. } => {
                ErrorKind::MemoryAllocation
            }
            Self::StepFailed { source, .. } => source.kind(),
            Self::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

impl From<StopReason> for ConvertError {
    fn from(r: StopReason) -> Self {
        ConvertError::Cancelled(r)
    }
}
