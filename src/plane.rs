//! Plane storage and the bounds-checked typed views operators work through.

use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::error::ConvertError;
use crate::pixel::bytes_per_sample;

/// Row alignment in bytes for planes this crate allocates.
pub const STRIDE_ALIGNMENT: usize = 16;

/// Stride for a freshly allocated plane, rounded up to [`STRIDE_ALIGNMENT`].
pub(crate) fn aligned_stride(width: u32, components: usize, bit_depth: u8) -> Option<usize> {
    let row = (width as usize)
        .checked_mul(components)?
        .checked_mul(bytes_per_sample(bit_depth))?;
    row.checked_next_multiple_of(STRIDE_ALIGNMENT)
}

/// One rectangular sample array.
///
/// Samples deeper than 8 bits take two bytes in native byte order, except
/// in packed 16-bit interleaved planes where the image's chroma tag decides
/// the byte order. Invariants, enforced by every constructor:
/// `width, height >= 1`, `1 <= bit_depth <= 16`,
/// `stride >= width * components * bytes_per_sample`, and the buffer holds
/// `stride * height` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane {
    width: u32,
    height: u32,
    bit_depth: u8,
    components: u8,
    stride: usize,
    data: Vec<u8>,
}

impl Plane {
    /// Allocate a zero-filled plane with an aligned stride.
    pub fn new(width: u32, height: u32, bit_depth: u8, components: usize) -> Result<Self, ConvertError> {
        check_geometry(width, height, bit_depth, components)?;
        let stride = aligned_stride(width, components, bit_depth)
            .ok_or(ConvertError::DimensionsTooLarge { width, height })?;
        let bytes = stride
            .checked_mul(height as usize)
            .ok_or(ConvertError::DimensionsTooLarge { width, height })?;
        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| ConvertError::OutOfMemory { bytes })?;
        data.resize(bytes, 0);
        Ok(Self {
            width,
            height,
            bit_depth,
            components: components as u8,
            stride,
            data,
        })
    }

    /// Wrap an existing buffer, e.g. decoder output.
    ///
    /// Fails with [`ConvertError::InvalidParameter`] if `stride` is shorter
    /// than a row or `data` shorter than `stride * height`.
    pub fn from_vec(
        width: u32,
        height: u32,
        bit_depth: u8,
        components: usize,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, ConvertError> {
        check_geometry(width, height, bit_depth, components)?;
        let row = (width as usize)
            .checked_mul(components * bytes_per_sample(bit_depth))
            .ok_or(ConvertError::DimensionsTooLarge { width, height })?;
        if stride < row {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "stride {stride} is shorter than a {row}-byte row"
            )));
        }
        let needed = stride
            .checked_mul(height as usize)
            .ok_or(ConvertError::DimensionsTooLarge { width, height })?;
        if data.len() < needed {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "plane buffer holds {} bytes, {width}x{height} with stride {stride} needs {needed}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bit_depth,
            components: components as u8,
            stride,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Components per pixel: 1 for planar channels.
    pub fn components(&self) -> usize {
        self.components as usize
    }

    /// Distance in bytes between the starts of two rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_sample(&self) -> usize {
        bytes_per_sample(self.bit_depth)
    }

    /// Bytes of pixel data in one row, excluding padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.components() * self.bytes_per_sample()
    }

    /// The whole buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Row `y` without padding, or `None` past the last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data.get(start..start + self.row_bytes())
    }

    /// Mutable row `y` without padding, or `None` past the last row.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let len = self.row_bytes();
        self.data.get_mut(start..start + len)
    }

    /// Iterate rows without padding.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let len = self.row_bytes();
        self.data
            .chunks(self.stride)
            .take(self.height as usize)
            .map(move |row| &row[..len])
    }

    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let len = self.row_bytes();
        let height = self.height as usize;
        self.data
            .chunks_mut(self.stride)
            .take(height)
            .map(move |row| &mut row[..len])
    }

    /// Typed read view. Fails if `P` does not match the sample width.
    pub(crate) fn view<P: Sample>(&self) -> Result<PlaneRef<'_, P>, ConvertError> {
        self.check_sample::<P>()?;
        Ok(PlaneRef {
            data: &self.data,
            stride: self.stride,
            _sample: PhantomData,
        })
    }

    /// Typed write view. Fails if `P` does not match the sample width.
    pub(crate) fn view_mut<P: Sample>(&mut self) -> Result<PlaneMut<'_, P>, ConvertError> {
        self.check_sample::<P>()?;
        Ok(PlaneMut {
            data: &mut self.data,
            stride: self.stride,
            _sample: PhantomData,
        })
    }

    fn check_sample<P: Sample>(&self) -> Result<(), ConvertError> {
        if P::BYTES != self.bytes_per_sample() {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "{}-bit plane accessed as {}-byte samples",
                self.bit_depth,
                P::BYTES
            )));
        }
        Ok(())
    }
}

fn check_geometry(width: u32, height: u32, bit_depth: u8, components: usize) -> Result<(), ConvertError> {
    if width == 0 || height == 0 {
        return Err(ConvertError::InvalidParameter(alloc::format!(
            "empty plane {width}x{height}"
        )));
    }
    if !(1..=16).contains(&bit_depth) {
        return Err(ConvertError::InvalidParameter(alloc::format!(
            "unsupported bit depth {bit_depth}"
        )));
    }
    if !(1..=4).contains(&components) {
        return Err(ConvertError::InvalidParameter(alloc::format!(
            "unsupported component count {components}"
        )));
    }
    Ok(())
}

/// Integer sample type of a plane.
pub(crate) trait Sample: Copy + Into<u32> + 'static {
    const BYTES: usize;

    #[inline(always)]
    fn widen(self) -> u32 {
        self.into()
    }

    /// Truncating conversion; callers keep values in range.
    fn from_u32(v: u32) -> Self;

    fn load(row: &[u8], index: usize) -> Self;

    fn store(row: &mut [u8], index: usize, value: Self);
}

impl Sample for u8 {
    const BYTES: usize = 1;

    #[inline(always)]
    fn from_u32(v: u32) -> Self {
        v as u8
    }

    #[inline(always)]
    fn load(row: &[u8], index: usize) -> Self {
        row[index]
    }

    #[inline(always)]
    fn store(row: &mut [u8], index: usize, value: Self) {
        row[index] = value;
    }
}

impl Sample for u16 {
    const BYTES: usize = 2;

    #[inline(always)]
    fn from_u32(v: u32) -> Self {
        v as u16
    }

    #[inline(always)]
    fn load(row: &[u8], index: usize) -> Self {
        u16::from_ne_bytes([row[2 * index], row[2 * index + 1]])
    }

    #[inline(always)]
    fn store(row: &mut [u8], index: usize, value: Self) {
        row[2 * index..2 * index + 2].copy_from_slice(&value.to_ne_bytes());
    }
}

/// Read view over a validated plane. `x` counts samples, not pixels.
///
/// Callers index within the dimensions they checked the plane against;
/// anything else is caught by slice indexing rather than read out of bounds.
pub(crate) struct PlaneRef<'a, P> {
    data: &'a [u8],
    stride: usize,
    _sample: PhantomData<P>,
}

impl<P: Sample> PlaneRef<'_, P> {
    #[inline(always)]
    pub(crate) fn get(&self, x: usize, y: usize) -> P {
        P::load(&self.data[y * self.stride..], x)
    }
}

/// Write view over a validated plane. `x` counts samples, not pixels.
pub(crate) struct PlaneMut<'a, P> {
    data: &'a mut [u8],
    stride: usize,
    _sample: PhantomData<P>,
}

impl<P: Sample> PlaneMut<'_, P> {
    #[inline(always)]
    pub(crate) fn set(&mut self, x: usize, y: usize, value: P) {
        P::store(&mut self.data[y * self.stride..], x, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn stride_is_aligned() {
        let plane = Plane::new(5, 3, 10, 1).unwrap();
        assert_eq!(plane.stride(), 16);
        assert_eq!(plane.row_bytes(), 10);
        assert_eq!(plane.data().len(), 48);

        let wide = Plane::new(9, 1, 8, 3).unwrap();
        assert_eq!(wide.stride(), 32);
    }

    #[test]
    fn from_vec_rejects_short_buffers() {
        assert!(Plane::from_vec(4, 2, 8, 1, 4, vec![0; 8]).is_ok());
        assert!(matches!(
            Plane::from_vec(4, 2, 8, 1, 4, vec![0; 7]),
            Err(ConvertError::InvalidParameter(_))
        ));
        assert!(matches!(
            Plane::from_vec(4, 2, 8, 1, 3, vec![0; 64]),
            Err(ConvertError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_degenerate_geometry() {
        assert!(Plane::new(0, 4, 8, 1).is_err());
        assert!(Plane::new(4, 4, 17, 1).is_err());
        assert!(Plane::new(4, 4, 8, 5).is_err());
    }

    #[test]
    fn rows_skip_padding() {
        let data = vec![1, 2, 9, 9, 3, 4, 9, 9];
        let plane = Plane::from_vec(2, 2, 8, 1, 4, data).unwrap();
        let rows: Vec<&[u8]> = plane.rows().collect();
        assert_eq!(rows, vec![&[1u8, 2][..], &[3, 4][..]]);
        assert_eq!(plane.row(1), Some(&[3u8, 4][..]));
        assert_eq!(plane.row(2), None);
    }

    #[test]
    fn typed_views_match_sample_width() {
        let mut plane = Plane::new(2, 2, 12, 1).unwrap();
        assert!(plane.view::<u8>().is_err());
        plane.view_mut::<u16>().unwrap().set(1, 1, 0x0abc);
        assert_eq!(plane.view::<u16>().unwrap().get(1, 1), 0x0abc);
        assert_eq!(plane.view::<u16>().unwrap().get(0, 1), 0);
    }
}
