use alloc::collections::BTreeMap;

use crate::error::ConvertError;
use crate::pixel::{Channel, Chroma, Colorspace, plane_size};
use crate::plane::{Plane, PlaneMut, PlaneRef, Sample};
use crate::state::{ColorState, Nclx};

/// A multi-plane pixel buffer keyed by channel.
///
/// Conversions never mutate their input; every step allocates a new image.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelImage {
    width: u32,
    height: u32,
    colorspace: Colorspace,
    chroma: Chroma,
    colorimetry: Option<Nclx>,
    premultiplied_alpha: bool,
    planes: BTreeMap<Channel, Plane>,
}

impl PixelImage {
    /// An image without planes. Add them with [`add_plane`](Self::add_plane)
    /// or [`insert_plane`](Self::insert_plane).
    pub fn new(width: u32, height: u32, colorspace: Colorspace, chroma: Chroma) -> Self {
        Self {
            width,
            height,
            colorspace,
            chroma,
            colorimetry: None,
            premultiplied_alpha: false,
            planes: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    pub fn chroma(&self) -> Chroma {
        self.chroma
    }

    pub fn colorimetry(&self) -> Option<Nclx> {
        self.colorimetry
    }

    pub fn set_colorimetry(&mut self, nclx: Option<Nclx>) {
        self.colorimetry = nclx;
    }

    pub fn is_premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    pub fn set_premultiplied_alpha(&mut self, premultiplied: bool) {
        self.premultiplied_alpha = premultiplied;
    }

    /// Allocate a zeroed plane sized for `channel` under this image's chroma.
    pub fn add_plane(&mut self, channel: Channel, bit_depth: u8) -> Result<&mut Plane, ConvertError> {
        let (w, h) = plane_size(self.chroma, channel, self.width, self.height);
        let plane = Plane::new(w, h, bit_depth, self.components_of(channel))?;
        self.planes.remove(&channel);
        Ok(self.planes.entry(channel).or_insert(plane))
    }

    /// Attach an existing plane, e.g. one produced by a decoder.
    ///
    /// The plane must have exactly the size `channel` needs under this
    /// image's chroma, and the component count the chroma implies.
    pub fn insert_plane(&mut self, channel: Channel, plane: Plane) -> Result<(), ConvertError> {
        let expected = plane_size(self.chroma, channel, self.width, self.height);
        let actual = (plane.width(), plane.height());
        if expected != actual {
            return Err(ConvertError::PlaneSizeMismatch {
                channel,
                expected,
                actual,
            });
        }
        if plane.components() != self.components_of(channel) {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "{channel:?} plane has {} components, {} needs {}",
                plane.components(),
                self.chroma,
                self.components_of(channel)
            )));
        }
        self.planes.insert(channel, plane);
        Ok(())
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.planes.contains_key(&channel)
    }

    pub fn plane(&self, channel: Channel) -> Option<&Plane> {
        self.planes.get(&channel)
    }

    pub fn plane_mut(&mut self, channel: Channel) -> Option<&mut Plane> {
        self.planes.get_mut(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.planes.keys().copied()
    }

    pub fn bits_per_pixel(&self, channel: Channel) -> Option<u8> {
        self.plane(channel).map(Plane::bit_depth)
    }

    /// Whether the image carries alpha, as a plane or in its interleaved layout.
    pub fn has_alpha(&self) -> bool {
        self.has_channel(Channel::Alpha) || self.chroma.has_interleaved_alpha()
    }

    /// The state this image reports, derived from the planes it holds.
    ///
    /// The bit depth is that of the first color plane in [`Channel`] order.
    pub fn color_state(&self) -> Result<ColorState, ConvertError> {
        let bits = self
            .planes
            .iter()
            .find(|(channel, _)| channel.is_color())
            .map(|(_, plane)| plane.bit_depth())
            .ok_or_else(|| ConvertError::InvalidParameter("image has no color planes".into()))?;
        Ok(ColorState::new(self.colorspace, self.chroma, self.has_alpha(), bits)
            .with_colorimetry(self.colorimetry))
    }

    /// Total bytes held by all planes, padding included.
    pub fn byte_size(&self) -> usize {
        self.planes.values().map(|p| p.data().len()).sum()
    }

    fn components_of(&self, channel: Channel) -> usize {
        if channel == Channel::Interleaved {
            self.chroma.interleaved_components()
        } else {
            1
        }
    }

    /// The plane for `channel`, checked to be exactly the size this image's
    /// chroma prescribes and to use `bit_depth` bits.
    pub(crate) fn checked_plane(&self, channel: Channel, bit_depth: Option<u8>) -> Result<&Plane, ConvertError> {
        let plane = self.plane(channel).ok_or(ConvertError::MissingPlane(channel))?;
        let expected = plane_size(self.chroma, channel, self.width, self.height);
        let actual = (plane.width(), plane.height());
        if expected != actual {
            return Err(ConvertError::PlaneSizeMismatch {
                channel,
                expected,
                actual,
            });
        }
        if plane.components() != self.components_of(channel) {
            return Err(ConvertError::InvalidParameter(alloc::format!(
                "{channel:?} plane has {} components",
                plane.components()
            )));
        }
        if channel == Channel::Interleaved {
            let depth_fits = if self.chroma.is_packed_16() {
                plane.bit_depth() > 8
            } else {
                plane.bit_depth() == 8
            };
            if !depth_fits {
                return Err(ConvertError::InvalidParameter(alloc::format!(
                    "{}-bit samples cannot be stored as {}",
                    plane.bit_depth(),
                    self.chroma
                )));
            }
        }
        if let Some(expected) = bit_depth {
            if plane.bit_depth() != expected {
                return Err(ConvertError::BitDepthMismatch {
                    channel,
                    expected,
                    actual: plane.bit_depth(),
                });
            }
        }
        Ok(plane)
    }

    pub(crate) fn sample_view<P: Sample>(&self, channel: Channel, bit_depth: u8) -> Result<PlaneRef<'_, P>, ConvertError> {
        self.checked_plane(channel, Some(bit_depth))?.view::<P>()
    }

    pub(crate) fn sample_view_mut<P: Sample>(&mut self, channel: Channel) -> Result<PlaneMut<'_, P>, ConvertError> {
        self.plane_mut(channel)
            .ok_or(ConvertError::MissingPlane(channel))?
            .view_mut::<P>()
    }

    /// Copy `channel` from `src` unchanged. Both images must share dimensions
    /// and the plane's subsampling.
    pub(crate) fn copy_plane_from(&mut self, src: &PixelImage, channel: Channel) -> Result<(), ConvertError> {
        let plane = src.checked_plane(channel, None)?;
        self.insert_plane(channel, plane.clone())
    }

    /// Set every sample of `channel` to `value`.
    pub(crate) fn fill_plane(&mut self, channel: Channel, value: u16) -> Result<(), ConvertError> {
        let plane = self
            .plane_mut(channel)
            .ok_or(ConvertError::MissingPlane(channel))?;
        if plane.bytes_per_sample() == 1 {
            let v = value as u8;
            plane.rows_mut().for_each(|row| row.fill(v));
        } else {
            let bytes = value.to_ne_bytes();
            for row in plane.rows_mut() {
                for sample in row.chunks_exact_mut(2) {
                    sample.copy_from_slice(&bytes);
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "imgref")]
mod typed {
    use alloc::vec::Vec;
    use imgref::{ImgRef, ImgVec};
    use rgb::{RGB8, RGBA8};

    use super::PixelImage;
    use crate::error::ConvertError;
    use crate::pixel::{Channel, Chroma, Colorspace};
    use crate::plane::Plane;

    impl PixelImage {
        /// Build an interleaved RGB24 image from typed pixels.
        pub fn from_imgref_rgb8(img: ImgRef<'_, RGB8>) -> Result<Self, ConvertError> {
            Self::from_rows(img.width(), img.height(), Chroma::InterleavedRgb, img.rows(), |px, out| {
                out.extend_from_slice(&[px.r, px.g, px.b])
            })
        }

        /// Build an interleaved RGBA32 image from typed pixels.
        pub fn from_imgref_rgba8(img: ImgRef<'_, RGBA8>) -> Result<Self, ConvertError> {
            Self::from_rows(img.width(), img.height(), Chroma::InterleavedRgba, img.rows(), |px, out| {
                out.extend_from_slice(&[px.r, px.g, px.b, px.a])
            })
        }

        /// Copy an interleaved RGB24 image out as typed pixels.
        pub fn to_imgvec_rgb8(&self) -> Result<ImgVec<RGB8>, ConvertError> {
            self.to_imgvec(Chroma::InterleavedRgb, |c| RGB8::new(c[0], c[1], c[2]))
        }

        /// Copy an interleaved RGBA32 image out as typed pixels.
        pub fn to_imgvec_rgba8(&self) -> Result<ImgVec<RGBA8>, ConvertError> {
            self.to_imgvec(Chroma::InterleavedRgba, |c| RGBA8::new(c[0], c[1], c[2], c[3]))
        }

        fn from_rows<'a, P: 'a>(
            width: usize,
            height: usize,
            chroma: Chroma,
            rows: impl Iterator<Item = &'a [P]>,
            push: impl Fn(&P, &mut Vec<u8>),
        ) -> Result<Self, ConvertError> {
            let w = u32::try_from(width).map_err(|_| ConvertError::DimensionsTooLarge {
                width: u32::MAX,
                height: height as u32,
            })?;
            let h = u32::try_from(height).map_err(|_| ConvertError::DimensionsTooLarge {
                width: w,
                height: u32::MAX,
            })?;
            let components = chroma.interleaved_components();
            let bytes = width
                .checked_mul(height)
                .and_then(|n| n.checked_mul(components))
                .ok_or(ConvertError::DimensionsTooLarge { width: w, height: h })?;
            let mut data = Vec::new();
            data.try_reserve_exact(bytes)
                .map_err(|_| ConvertError::OutOfMemory { bytes })?;
            for row in rows {
                row.iter().for_each(|px| push(px, &mut data));
            }
            let plane = Plane::from_vec(w, h, 8, components, width * components, data)?;
            let mut image = PixelImage::new(w, h, Colorspace::Rgb, chroma);
            image.insert_plane(Channel::Interleaved, plane)?;
            Ok(image)
        }

        fn to_imgvec<P>(&self, chroma: Chroma, make: impl Fn(&[u8]) -> P) -> Result<ImgVec<P>, ConvertError> {
            if self.chroma != chroma {
                return Err(ConvertError::InvalidParameter(alloc::format!(
                    "image is {}, not {chroma}",
                    self.chroma
                )));
            }
            let plane = self.checked_plane(Channel::Interleaved, Some(8))?;
            let pixels: Vec<P> = plane
                .rows()
                .flat_map(|row| row.chunks_exact(chroma.interleaved_components()).map(&make))
                .collect();
            Ok(ImgVec::new(
                pixels,
                self.width as usize,
                self.height as usize,
            ))
        }
    }
}
