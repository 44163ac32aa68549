//! # zenplanes
//!
//! Pixel-format conversion between planar and interleaved layouts of
//! monochrome, YCbCr and RGB images, as needed around HEIF-style codecs.
//!
//! A conversion is planned, then executed. The planner treats every
//! [`ColorState`] (colorspace, chroma layout, alpha, bit depth) as a vertex
//! and every registered [`ColorConversionOp`](ops::ColorConversionOp) as a
//! source of weighted edges, and picks the cheapest chain of at most
//! [`MAX_PIPELINE_STEPS`] operators. The executor runs the chain on a
//! [`PixelImage`], allocating a fresh image per step.
//!
//! ## Supported Conversions
//!
//! - Monochrome → YCbCr 4:2:0 (neutral chroma) and → RGB24/RGBA32
//! - YCbCr 4:4:4 ↔ 4:2:0 (average downsampling, bilinear upsampling), 8 to 16 bits
//! - Planar RGB ↔ interleaved RGB24/RGBA32 and RRGGBB(AA) big-endian
//! - RRGGBB(AA) endianness swap
//! - Alpha plane removal, 8-bit ↔ deep planes
//!
//! ## Non-Goals
//!
//! - YCbCr ↔ RGB matrix conversion, gamma or color management
//! - SIMD kernels
//!
//! ## Usage
//!
//! ```
//! use zenplanes::{Channel, Chroma, Colorspace, ConvertRequest, Limits, PixelImage, Unstoppable};
//!
//! let mut image = PixelImage::new(64, 48, Colorspace::YCbCr, Chroma::C444);
//! for channel in [Channel::Y, Channel::Cb, Channel::Cr] {
//!     image.add_plane(channel, 10)?;
//! }
//!
//! let limits = Limits { max_memory_bytes: Some(1 << 20), ..Default::default() };
//! let subsampled = ConvertRequest::new(Colorspace::YCbCr, Chroma::C420)
//!     .with_limits(&limits)
//!     .convert(image, Unstoppable)?;
//! assert_eq!(subsampled.plane(Channel::Cb).map(|p| p.width()), Some(32));
//! # Ok::<(), zenplanes::ConvertError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod codec;
mod convert;
mod error;
mod image;
mod limits;
mod options;
mod pipeline;
mod pixel;
mod plane;
mod state;

pub mod ops;

// Re-exports
pub use codec::{EncoderInput, FixedInput, prepare_for_encoder};
pub use convert::{ConvertRequest, convert};
pub use enough::{Stop, Unstoppable};
pub use error::{ConvertError, ErrorKind};
pub use image::PixelImage;
pub use limits::Limits;
pub use options::{ChromaDownsampling, ChromaUpsampling, ConversionOptions};
pub use pipeline::{ConversionPipeline, MAX_PIPELINE_STEPS, Step};
pub use pixel::{Channel, Chroma, Colorspace, bytes_per_sample, plane_size};
pub use plane::{Plane, STRIDE_ALIGNMENT};
pub use state::{AcceptSet, AlphaRequirement, ColorState, ColorStateWithCost, Nclx, SpeedCost, Target};
