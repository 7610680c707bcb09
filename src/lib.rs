//! # GIF export codec for rasterized captures
//!
//! This crate turns an in-memory pixel buffer into a single-image GIF. It provides the pieces
//! that matter for that: a palette mapper that reduces indexed or packed RGB sources to at most
//! 256 distinct colors, an LZW compressor with the classic hashed dictionary, and a container
//! writer that frames the compressed codes into length-prefixed sub-blocks.
//!
//! The compressed stream starts with a clear code and ends with an end code which are defined
//! as follows:
//!
//!  * `CLEAR_CODE == 1 << min_code_size`
//!  * `END_CODE   == CLEAR_CODE + 1`
//!
//! Encoding a two by two checkerboard:
//!
//! ```
//! use rastergif::{encode, PixelBuffer, PixelFormat, BitOrder};
//! let colormap = [[0, 0, 0], [255, 255, 255]];
//! // One byte per row, pixels packed most significant bit first.
//! let rows = [0b0100_0000, 0b1000_0000];
//! let pixels = PixelBuffer::new(&rows, 2, 2, PixelFormat::Mono {
//!     colormap: &colormap,
//!     bit_order: BitOrder::Msb,
//! });
//!
//! let mut gif = vec![];
//! let written = encode(&pixels, &mut gif).unwrap();
//! assert_eq!(written, gif.len());
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

/// The largest code width the GIF flavor of LZW allows.
pub(crate) const MAX_CODESIZE: u8 = 12;
/// Number of codes addressable with [`MAX_CODESIZE`] bits.
pub(crate) const MAX_ENTRIES: usize = 1 << MAX_CODESIZE as usize;
/// Largest accepted width or height.
pub const MAX_DIMENSION: usize = 4096;

/// Alias for a LZW code point
pub(crate) type Code = u16;

/// The order of pixels within a byte of a monochrome source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOrder {
    /// The most significant bit holds the leftmost pixel.
    Msb,
    /// The least significant bit holds the leftmost pixel.
    Lsb,
}

impl Default for BitOrder {
    fn default() -> Self {
        BitOrder::Msb
    }
}

pub mod bits;
pub mod container;
pub mod encode;
mod error;
pub mod lzw;
pub mod palette;
pub mod pixel;

pub use crate::encode::{encode, encode_to_vec, EncodeOptions, Encoder};
pub use crate::error::{EncodeError, Result};
pub use crate::palette::{IndexedImage, Palette, Rgb};
pub use crate::pixel::{ByteOrder, PackedRgb, PixelBuffer, PixelFormat};
