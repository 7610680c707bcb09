//! Reduction of a pixel buffer to a palette and a buffer of palette indices.
use crate::alloc::collections::BTreeMap;
use crate::alloc::vec::Vec;

use crate::error::{EncodeError, Result};
use crate::pixel::{mono_bit, PixelBuffer, PixelFormat};
use crate::MAX_DIMENSION;

/// An 8-bit per channel color.
pub type Rgb = [u8; 3];

/// Most colors a palette can address.
pub const MAX_COLORS: usize = 256;

/// An ordered list of distinct colors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

/// A palette together with one palette index per pixel, row-major and top to bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    width: usize,
    height: usize,
    palette: Palette,
    indices: Vec<u8>,
}

impl Palette {
    pub fn new() -> Self {
        Palette::default()
    }

    /// Build a palette from distinct colors.
    pub fn from_colors(colors: &[Rgb]) -> Result<Self> {
        let mut palette = Palette::new();
        for &color in colors {
            if palette.position(color).is_some() {
                return Err(EncodeError::InvalidOption("palette colors must be distinct"));
            }
            palette.push(color)?;
        }
        Ok(palette)
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Bits needed to address every entry, never less than 2.
    ///
    /// This is both the LZW minimum code size and the exponent of the color table size.
    pub fn min_code_size(&self) -> u8 {
        let mut size = 2;
        while (1usize << size) < self.colors.len() {
            size += 1;
        }
        size
    }

    /// Number of entries of the written color table, including zero padding.
    pub fn table_len(&self) -> usize {
        1 << self.min_code_size()
    }

    fn position(&self, color: Rgb) -> Option<u8> {
        self.colors
            .iter()
            .position(|&c| c == color)
            .map(|index| index as u8)
    }

    fn push(&mut self, color: Rgb) -> Result<u8> {
        if self.colors.len() == MAX_COLORS {
            return Err(EncodeError::PaletteOverflow {
                colors: MAX_COLORS + 1,
            });
        }
        self.colors.push(color);
        Ok((self.colors.len() - 1) as u8)
    }

    /// The index of `color`, appending it when it is new.
    fn intern(&mut self, color: Rgb) -> Result<u8> {
        match self.position(color) {
            Some(index) => Ok(index),
            None => self.push(color),
        }
    }
}

impl IndexedImage {
    /// Wrap data that is already reduced to a palette.
    pub fn new(width: usize, height: usize, palette: Palette, indices: Vec<u8>) -> Result<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(EncodeError::DimensionTooLarge { width, height });
        }
        if indices.len() != width * height {
            return Err(EncodeError::BufferTooShort {
                expected: width * height,
                actual: indices.len(),
            });
        }
        if let Some(&index) = indices
            .iter()
            .find(|&&index| usize::from(index) >= palette.len())
        {
            return Err(EncodeError::IndexOutOfRange {
                index,
                colormap_len: palette.len(),
            });
        }

        Ok(IndexedImage {
            width,
            height,
            palette,
            indices,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// The indices of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.indices[y * self.width..(y + 1) * self.width]
    }
}

/// Reduce a pixel buffer to a palette and an index buffer of the same dimensions.
///
/// * Monochrome sources keep the first two colormap entries as a two color palette. The entries
///   are taken as they are, so a colormap repeating one color yields a palette holding that
///   color twice. Bit values map to indices 0 and 1 unchanged.
/// * Indexed sources keep only the colormap slots that some pixel references, compacted in slot
///   order. Slots holding the same color share one palette entry.
/// * Packed sources are expanded to 8 bits per channel and collected exactly in order of first
///   appearance. More than 256 distinct colors is an error, no quantization takes place.
pub fn map_pixels(buffer: &PixelBuffer<'_>) -> Result<IndexedImage> {
    buffer.check()?;

    let (width, height) = (buffer.width(), buffer.height());
    let mut indices = Vec::with_capacity(width * height);

    let palette = match *buffer.format() {
        PixelFormat::Mono {
            colormap,
            bit_order,
        } => {
            if colormap.len() < 2 {
                return Err(EncodeError::IndexOutOfRange {
                    index: 1,
                    colormap_len: colormap.len(),
                });
            }
            for y in 0..height {
                let row = buffer.row(y);
                indices.extend((0..width).map(|x| mono_bit(row, x, bit_order)));
            }
            Palette {
                colors: colormap[..2].to_vec(),
            }
        }
        PixelFormat::Indexed { colormap } => {
            let mut referenced = [false; MAX_COLORS];
            for y in 0..height {
                for &slot in buffer.row(y) {
                    referenced[usize::from(slot)] = true;
                }
            }

            let mut palette = Palette::new();
            let mut remap = [0u8; MAX_COLORS];
            for (slot, _) in referenced.iter().enumerate().filter(|&(_, &used)| used) {
                let color = colormap
                    .get(slot)
                    .copied()
                    .ok_or(EncodeError::IndexOutOfRange {
                        index: slot as u8,
                        colormap_len: colormap.len(),
                    })?;
                remap[slot] = palette.intern(color)?;
            }

            for y in 0..height {
                indices.extend(buffer.row(y).iter().map(|&slot| remap[usize::from(slot)]));
            }
            palette
        }
        PixelFormat::Packed(packed) => {
            let mut palette = Palette::new();
            let mut seen: BTreeMap<Rgb, u8> = BTreeMap::new();
            let mut last: Option<(Rgb, u8)> = None;

            for y in 0..height {
                for color in packed.row_colors(buffer.row(y)) {
                    let index = match last {
                        Some((c, index)) if c == color => index,
                        _ => match seen.get(&color) {
                            Some(&index) => index,
                            None => {
                                let index = palette.push(color)?;
                                seen.insert(color, index);
                                index
                            }
                        },
                    };
                    last = Some((color, index));
                    indices.push(index);
                }
            }
            palette
        }
    };

    log::trace!(
        "Mapped {}x{} pixels of depth {} onto {} colors",
        width,
        height,
        buffer.format().depth(),
        palette.len()
    );

    Ok(IndexedImage {
        width,
        height,
        palette,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PackedRgb;
    use crate::BitOrder;

    fn ramp() -> Vec<Rgb> {
        (0..=255u8).map(|i| [i, 255 - i, i / 2]).collect()
    }

    #[test]
    fn compacts_referenced_slots() {
        let colormap = ramp();
        let pixels = [3, 7, 9, 9, 7, 3];
        let buffer = PixelBuffer::new(&pixels, 3, 2, PixelFormat::Indexed {
            colormap: &colormap,
        });

        let image = map_pixels(&buffer).unwrap();
        assert_eq!(
            image.palette().colors(),
            &[colormap[3], colormap[7], colormap[9]]
        );
        assert_eq!(image.indices(), &[0, 1, 2, 2, 1, 0]);
        assert_eq!(image.palette().min_code_size(), 2);
        assert_eq!(image.palette().table_len(), 4);
    }

    #[test]
    fn merges_duplicate_slots() {
        let colormap = [[1, 2, 3], [9, 9, 9], [1, 2, 3]];
        let pixels = [2, 1, 0];
        let buffer = PixelBuffer::new(&pixels, 3, 1, PixelFormat::Indexed {
            colormap: &colormap,
        });

        let image = map_pixels(&buffer).unwrap();
        assert_eq!(image.palette().colors(), &[[1, 2, 3], [9, 9, 9]]);
        assert_eq!(image.indices(), &[0, 1, 0]);
    }

    #[test]
    fn missing_colormap_slot() {
        let colormap = [[0, 0, 0]];
        let buffer = PixelBuffer::new(&[0, 4], 2, 1, PixelFormat::Indexed {
            colormap: &colormap,
        });
        assert!(matches!(
            map_pixels(&buffer),
            Err(EncodeError::IndexOutOfRange {
                index: 4,
                colormap_len: 1
            })
        ));
    }

    #[test]
    fn mono_keeps_two_entries() {
        let colormap = [[0, 0, 0], [255, 255, 255], [1, 1, 1]];
        // Ten pixels per row, rows padded to two bytes.
        let rows = [0b0000_0001, 0b1100_0000, 0b1000_0000, 0b0000_0000];
        let msb = PixelBuffer::new(&rows, 10, 2, PixelFormat::Mono {
            colormap: &colormap,
            bit_order: BitOrder::Msb,
        });
        let image = map_pixels(&msb).unwrap();
        assert_eq!(image.palette().len(), 2);
        assert_eq!(image.row(0), &[0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
        assert_eq!(image.row(1), &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        let lsb = PixelBuffer::new(&rows, 10, 2, PixelFormat::Mono {
            colormap: &colormap,
            bit_order: BitOrder::Lsb,
        });
        let image = map_pixels(&lsb).unwrap();
        assert_eq!(image.row(0), &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(image.row(1), &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn all_zero_mono_still_two_colors() {
        let colormap = [[0, 0, 0], [255, 255, 255]];
        let buffer = PixelBuffer::new(&[0, 0], 8, 2, PixelFormat::Mono {
            colormap: &colormap,
            bit_order: BitOrder::Msb,
        });
        let image = map_pixels(&buffer).unwrap();
        assert_eq!(image.palette().colors(), &colormap);
    }

    #[test]
    fn mono_repeated_color_keeps_both_entries() {
        let colormap = [[5, 5, 5], [5, 5, 5]];
        let buffer = PixelBuffer::new(&[0b1010_0000], 4, 1, PixelFormat::Mono {
            colormap: &colormap,
            bit_order: BitOrder::Msb,
        });
        let image = map_pixels(&buffer).unwrap();
        assert_eq!(image.palette().colors(), &colormap);
        assert_eq!(image.indices(), &[1, 0, 1, 0]);
    }

    #[test]
    fn packed_colors_in_first_seen_order() {
        let data = [10, 20, 30, 1, 2, 3, 10, 20, 30, 1, 2, 3];
        let buffer = PixelBuffer::new(&data, 2, 2, PixelFormat::Packed(PackedRgb::rgb888()));
        let image = map_pixels(&buffer).unwrap();
        assert_eq!(image.palette().colors(), &[[10, 20, 30], [1, 2, 3]]);
        assert_eq!(image.indices(), &[0, 1, 0, 1]);
    }

    #[test]
    fn packed_overflow() {
        let data: Vec<u8> = (0..257u32)
            .flat_map(|i| vec![(i >> 8) as u8, i as u8, 0])
            .collect();
        let buffer = PixelBuffer::new(&data, 257, 1, PixelFormat::Packed(PackedRgb::rgb888()));
        assert!(matches!(
            map_pixels(&buffer),
            Err(EncodeError::PaletteOverflow { colors: 257 })
        ));
    }

    #[test]
    fn indexed_image_validation() {
        let palette = Palette::from_colors(&[[0, 0, 0], [1, 1, 1]]).unwrap();
        assert!(IndexedImage::new(2, 1, palette.clone(), vec![0, 1]).is_ok());
        assert!(matches!(
            IndexedImage::new(2, 1, palette.clone(), vec![0, 2]),
            Err(EncodeError::IndexOutOfRange { index: 2, .. })
        ));
        assert!(matches!(
            IndexedImage::new(4097, 0, palette, vec![]),
            Err(EncodeError::DimensionTooLarge { .. })
        ));
        assert!(Palette::from_colors(&[[0, 0, 0], [0, 0, 0]]).is_err());
    }

    #[test]
    fn code_size_grows_with_palette() {
        let sizes: Vec<u8> = [0usize, 1, 2, 4, 5, 16, 17, 256]
            .iter()
            .map(|&n| {
                let colors: Vec<Rgb> = (0..n).map(|i| [i as u8, 0, 0]).collect();
                Palette::from_colors(&colors).unwrap().min_code_size()
            })
            .collect();
        assert_eq!(sizes, [2, 2, 2, 2, 3, 4, 5, 8]);
    }
}
