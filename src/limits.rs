use crate::error::ConvertError;

/// Resource limits for conversion.
///
/// All fields default to `None` (no limit). Image dimensions ultimately come
/// from untrusted files, so callers converting decoder output should set at
/// least `max_memory_bytes`.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    /// Maximum pixel count (width * height).
    pub max_pixels: Option<u64>,
    /// Maximum bytes for any single intermediate or output image.
    pub max_memory_bytes: Option<u64>,
}

fn within(what: &str, value: u64, limit: Option<u64>) -> Result<(), ConvertError> {
    match limit {
        Some(max) if value > max => Err(ConvertError::LimitExceeded(alloc::format!(
            "{what} {value} exceeds limit {max}"
        ))),
        _ => Ok(()),
    }
}

impl Limits {
    /// Check image dimensions against the width, height and pixel limits.
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), ConvertError> {
        within("width", u64::from(width), self.max_width)?;
        within("height", u64::from(height), self.max_height)?;
        within(
            "pixel count",
            u64::from(width) * u64::from(height),
            self.max_pixels,
        )
    }

    /// Check the size of one image that a conversion step would allocate.
    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), ConvertError> {
        within("image size in bytes", bytes as u64, self.max_memory_bytes)
    }
}
