//! Description of the source pixel buffer and unpacking of its pixel formats.
//!
//! A [`PixelBuffer`] borrows the caller's bytes for the duration of an encode. Indexed sources
//! carry their colormap, packed sources carry the masks of their color fields.
use crate::error::{EncodeError, Result};
use crate::palette::Rgb;
use crate::{BitOrder, MAX_DIMENSION};

use crate::alloc::vec::Vec;

/// Order of the bytes forming one packed pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Layout of the pixels in a [`PixelBuffer`].
#[derive(Clone, Copy, Debug)]
pub enum PixelFormat<'a> {
    /// One bit per pixel, rows padded to whole bytes.
    Mono {
        colormap: &'a [Rgb],
        bit_order: BitOrder,
    },
    /// One colormap slot per byte.
    Indexed { colormap: &'a [Rgb] },
    /// Red, green and blue fields packed into 2, 3 or 4 bytes.
    Packed(PackedRgb),
}

/// A packed true color format, described by one mask per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedRgb {
    depth: u8,
    byte_order: ByteOrder,
    red: Channel,
    green: Channel,
    blue: Channel,
}

/// The (mask, shift, width) triple locating one color field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Channel {
    mask: u32,
    shift: u32,
    bits: u32,
}

/// A borrowed, immutable grid of pixels.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    format: PixelFormat<'a>,
}

impl<'a> PixelFormat<'a> {
    /// Choose the format for a source depth using the common layouts.
    ///
    /// Depth 16 is read as little endian RGB565, 24 as R, G, B bytes and 32 as little endian
    /// `0x00RRGGBB`. Use [`PackedRgb::new`] for anything else.
    pub fn from_depth(depth: u8, colormap: &'a [Rgb], bit_order: BitOrder) -> Result<Self> {
        Ok(match depth {
            1 => PixelFormat::Mono {
                colormap,
                bit_order,
            },
            8 => PixelFormat::Indexed { colormap },
            16 => PixelFormat::Packed(PackedRgb::rgb565()),
            24 => PixelFormat::Packed(PackedRgb::rgb888()),
            32 => PixelFormat::Packed(PackedRgb::xrgb8888()),
            depth => return Err(EncodeError::UnsupportedPixelFormat { depth }),
        })
    }

    /// Bits occupied by one pixel.
    pub fn depth(&self) -> u8 {
        match self {
            PixelFormat::Mono { .. } => 1,
            PixelFormat::Indexed { .. } => 8,
            PixelFormat::Packed(packed) => packed.depth,
        }
    }

    /// Bytes needed for a row of `width` pixels without any padding.
    pub fn min_stride(&self, width: usize) -> usize {
        match self {
            PixelFormat::Mono { .. } => (width + 7) / 8,
            PixelFormat::Indexed { .. } => width,
            PixelFormat::Packed(packed) => width * packed.bytes_per_pixel(),
        }
    }
}

impl PackedRgb {
    /// Describe a packed format.
    ///
    /// Each mask must be a single contiguous run of bits within the low `depth` bits. The
    /// byte order tells how the `depth / 8` bytes of a pixel assemble into one value.
    pub fn new(depth: u8, red: u32, green: u32, blue: u32, byte_order: ByteOrder) -> Result<Self> {
        if !matches!(depth, 16 | 24 | 32) {
            return Err(EncodeError::UnsupportedPixelFormat { depth });
        }

        Ok(PackedRgb {
            depth,
            byte_order,
            red: Channel::new(red, depth)?,
            green: Channel::new(green, depth)?,
            blue: Channel::new(blue, depth)?,
        })
    }

    /// Little endian 5-6-5.
    pub fn rgb565() -> Self {
        PackedRgb {
            depth: 16,
            byte_order: ByteOrder::Little,
            red: Channel::from_parts(0xf800, 11, 5),
            green: Channel::from_parts(0x07e0, 5, 6),
            blue: Channel::from_parts(0x001f, 0, 5),
        }
    }

    /// Three bytes in red, green, blue order.
    pub fn rgb888() -> Self {
        PackedRgb {
            depth: 24,
            byte_order: ByteOrder::Big,
            red: Channel::from_parts(0xff_0000, 16, 8),
            green: Channel::from_parts(0x00_ff00, 8, 8),
            blue: Channel::from_parts(0x00_00ff, 0, 8),
        }
    }

    /// Little endian `0x00RRGGBB`, i.e. bytes in blue, green, red, pad order.
    pub fn xrgb8888() -> Self {
        PackedRgb {
            depth: 32,
            byte_order: ByteOrder::Little,
            red: Channel::from_parts(0x00ff_0000, 16, 8),
            green: Channel::from_parts(0x0000_ff00, 8, 8),
            blue: Channel::from_parts(0x0000_00ff, 0, 8),
        }
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.depth / 8)
    }

    /// Assemble the value of the pixel starting at `bytes`.
    fn read(&self, bytes: &[u8]) -> u32 {
        let bytes = &bytes[..self.bytes_per_pixel()];
        match self.byte_order {
            ByteOrder::Little => bytes
                .iter()
                .rev()
                .fold(0, |acc, &b| (acc << 8) | u32::from(b)),
            ByteOrder::Big => bytes.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b)),
        }
    }

    /// Expand a pixel value to 8 bits per channel.
    pub fn unpack(&self, value: u32) -> Rgb {
        [
            self.red.expand(value),
            self.green.expand(value),
            self.blue.expand(value),
        ]
    }
}

impl Channel {
    fn new(mask: u32, depth: u8) -> Result<Self> {
        let invalid = EncodeError::InvalidOption("channel mask must be a contiguous run of bits");
        if mask == 0 || (depth < 32 && mask >> depth != 0) {
            return Err(invalid);
        }

        let shift = mask.trailing_zeros();
        let run = mask >> shift;
        if run & run.wrapping_add(1) != 0 {
            return Err(invalid);
        }

        Ok(Channel::from_parts(mask, shift, run.count_ones()))
    }

    const fn from_parts(mask: u32, shift: u32, bits: u32) -> Self {
        Channel { mask, shift, bits }
    }

    fn expand(self, value: u32) -> u8 {
        expand_field(value, self.mask, self.shift, self.bits)
    }
}

/// Scale a `bits` wide field to 8 bits.
///
/// Narrow fields are shifted to the top of the byte and the vacated low bits are filled by
/// repeating the field, so that all zeros stay 0x00 and all ones become 0xff. Wide fields keep
/// their most significant 8 bits.
pub fn expand_field(value: u32, mask: u32, shift: u32, bits: u32) -> u8 {
    let field = (value & mask) >> shift;
    if bits >= 8 {
        return (field >> (bits - 8)) as u8;
    }

    let mut out = field << (8 - bits);
    let mut filled = bits;
    while filled < 8 {
        out |= out >> filled;
        filled *= 2;
    }
    (out & 0xff) as u8
}

impl<'a> PixelBuffer<'a> {
    /// Describe `data` as `height` rows of `width` pixels without row padding.
    pub fn new(data: &'a [u8], width: usize, height: usize, format: PixelFormat<'a>) -> Self {
        PixelBuffer {
            data,
            width,
            height,
            stride: format.min_stride(width),
            format,
        }
    }

    /// Use `stride` bytes per row, for sources with padded scanlines.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> &PixelFormat<'a> {
        &self.format
    }

    /// Validate the dimensions and the extent of the pixel data.
    ///
    /// Dimensions are checked first so that an oversized image is refused before anything
    /// else is looked at.
    pub fn check(&self) -> Result<()> {
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(EncodeError::DimensionTooLarge {
                width: self.width,
                height: self.height,
            });
        }

        let row = self.format.min_stride(self.width);
        if self.stride < row {
            return Err(EncodeError::InvalidOption("stride is shorter than one row"));
        }

        let expected = match self.height {
            0 => 0,
            h => self
                .stride
                .checked_mul(h - 1)
                .and_then(|rows| rows.checked_add(row))
                .ok_or(EncodeError::InvalidOption("stride overflows"))?,
        };
        if self.data.len() < expected {
            return Err(EncodeError::BufferTooShort {
                expected,
                actual: self.data.len(),
            });
        }

        Ok(())
    }

    /// The bytes of row `y`, without trailing padding.
    ///
    /// Only meaningful after [`check`](Self::check) succeeded.
    pub(crate) fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.format.min_stride(self.width)]
    }
}

/// The value of pixel `x` of a monochrome row.
pub(crate) fn mono_bit(row: &[u8], x: usize, order: BitOrder) -> u8 {
    let byte = row[x / 8];
    let bit = match order {
        BitOrder::Msb => 7 - (x % 8),
        BitOrder::Lsb => x % 8,
    };
    (byte >> bit) & 1
}

/// Convert every pixel to full 8-bit RGB, row-major and top to bottom.
///
/// This is the true color path for consumers that do not need a palette.
pub fn expand_rgb(buffer: &PixelBuffer<'_>) -> Result<Vec<Rgb>> {
    buffer.check()?;
    let mut out = Vec::with_capacity(buffer.width * buffer.height);

    let lookup = |colormap: &[Rgb], index: u8| {
        colormap
            .get(usize::from(index))
            .copied()
            .ok_or(EncodeError::IndexOutOfRange {
                index,
                colormap_len: colormap.len(),
            })
    };

    for y in 0..buffer.height {
        let row = buffer.row(y);
        match buffer.format {
            PixelFormat::Mono {
                colormap,
                bit_order,
            } => {
                for x in 0..buffer.width {
                    out.push(lookup(colormap, mono_bit(row, x, bit_order))?);
                }
            }
            PixelFormat::Indexed { colormap } => {
                for &index in row {
                    out.push(lookup(colormap, index)?);
                }
            }
            PixelFormat::Packed(packed) => {
                for pixel in row.chunks_exact(packed.bytes_per_pixel()) {
                    out.push(packed.unpack(packed.read(pixel)));
                }
            }
        }
    }

    Ok(out)
}

impl PackedRgb {
    /// Iterate over the unpacked colors of one row.
    pub(crate) fn row_colors<'r>(&'r self, row: &'r [u8]) -> impl Iterator<Item = Rgb> + 'r {
        row.chunks_exact(self.bytes_per_pixel())
            .map(move |pixel| self.unpack(self.read(pixel)))
    }
}
