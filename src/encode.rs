//! A module for all encoding needs.
use crate::alloc::vec::Vec;

use crate::container::{ContainerWriter, ImageDescriptor, ScreenDescriptor, Version};
use crate::error::{EncodeError, Result};
use crate::lzw::Compressor;
use crate::palette::{map_pixels, IndexedImage};
use crate::pixel::PixelBuffer;

#[cfg(feature = "std")]
use std::io::Write;

/// Choices that change the written file but not the pixels.
///
/// The default writes a plain `GIF87a` file: no extension blocks, no interlacing and the
/// background set to the first palette entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    transparent: Option<u8>,
    background: u8,
    interlace: bool,
}

/// Encodes pixel buffers into GIF files.
///
/// The encoder only holds options. Each call builds its own palette, dictionary and output
/// buffer, so one encoder may be used for any number of images, also from several threads.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

/// A encoding stream sink.
///
/// See [`Encoder::into_stream`] on how to create this type and more information.
#[cfg(feature = "std")]
pub struct IntoStream<'d, W> {
    encoder: &'d Encoder,
    writer: W,
}

/// An async encoding sink.
///
/// See [`Encoder::into_async`] on how to create this type and more information.
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    encoder: &'d Encoder,
    writer: W,
}

impl EncodeOptions {
    pub fn new() -> Self {
        EncodeOptions::default()
    }

    /// Mark a palette index as transparent. This switches the file to `GIF89a`.
    pub fn with_transparent(mut self, index: Option<u8>) -> Self {
        self.transparent = index;
        self
    }

    /// Set the palette index of the background color.
    pub fn with_background(mut self, index: u8) -> Self {
        self.background = index;
        self
    }

    /// Store rows in the four pass interlaced order.
    pub fn with_interlace(mut self, interlace: bool) -> Self {
        self.interlace = interlace;
        self
    }

    pub fn transparent(&self) -> Option<u8> {
        self.transparent
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn interlace(&self) -> bool {
        self.interlace
    }

    fn check(&self, palette_len: usize) -> Result<()> {
        if let Some(index) = self.transparent {
            if usize::from(index) >= palette_len {
                return Err(EncodeError::InvalidOption(
                    "transparent index is outside of the palette",
                ));
            }
        }
        if palette_len > 0 && usize::from(self.background) >= palette_len {
            return Err(EncodeError::InvalidOption(
                "background index is outside of the palette",
            ));
        }
        Ok(())
    }
}

impl Encoder {
    pub fn new() -> Self {
        Encoder::default()
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        Encoder { options }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Reduce the pixels to a palette and encode them into a complete file.
    pub fn encode_to_vec(&self, pixels: &PixelBuffer<'_>) -> Result<Vec<u8>> {
        // Refuse oversized or short buffers before any work is done.
        pixels.check()?;
        let image = map_pixels(pixels)?;
        self.encode_indexed(&image)
    }

    /// Encode an image that is already reduced to a palette.
    pub fn encode_indexed(&self, image: &IndexedImage) -> Result<Vec<u8>> {
        let palette = image.palette();
        self.options.check(palette.len())?;

        let (width, height) = (image.width() as u16, image.height() as u16);
        let min_code_size = palette.min_code_size();
        let version = match self.options.transparent {
            Some(_) => Version::Gif89a,
            None => Version::Gif87a,
        };

        // Headers plus a guess for well compressible content.
        let estimate = 64 + palette.table_len() * 3 + image.indices().len() / 4;
        let mut container = ContainerWriter::with_capacity(estimate);
        container.write_header(version);
        container.write_screen(
            &ScreenDescriptor {
                width,
                height,
                background: self.options.background,
            },
            palette,
        );
        if let Some(index) = self.options.transparent {
            container.write_graphic_control(index);
        }
        container.write_image_descriptor(&ImageDescriptor {
            width,
            height,
            interlaced: self.options.interlace,
        });

        let mut blocks = container.image_data(min_code_size);
        let mut compressor = Compressor::new(min_code_size);
        for y in row_order(image.height(), self.options.interlace) {
            compressor.compress(image.row(y), &mut blocks)?;
        }
        let stats = compressor.finish(&mut blocks);
        let sub_blocks = blocks.finish();
        container.write_trailer();

        log::debug!(
            "Encoded {}x{} image with {} colors: {} codes, {} clears, {} sub-blocks, {} bytes",
            width,
            height,
            palette.len(),
            stats.codes,
            stats.clears,
            sub_blocks,
            container.len()
        );

        Ok(container.into_bytes())
    }

    /// Construct an encoder into a writer.
    #[cfg(feature = "std")]
    pub fn into_stream<W: Write>(&self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            encoder: self,
            writer,
        }
    }

    /// Construct an encoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite + Unpin>(&self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            encoder: self,
            writer,
        }
    }
}

#[cfg(feature = "std")]
impl<W: Write> IntoStream<'_, W> {
    /// Encode the pixels and write the complete file.
    ///
    /// Returns the number of bytes written. The file is written with a single `write_all`
    /// after encoding succeeded; on a write error the sink may hold a truncated file.
    pub fn encode(&mut self, pixels: &PixelBuffer<'_>) -> Result<usize> {
        let bytes = self.encoder.encode_to_vec(pixels)?;
        self.write(&bytes)
    }

    /// Encode an image that is already reduced to a palette and write the complete file.
    pub fn encode_indexed(&mut self, image: &IndexedImage) -> Result<usize> {
        let bytes = self.encoder.encode_indexed(image)?;
        self.write(&bytes)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(bytes.len())
    }
}

#[cfg(feature = "async")]
impl<W: futures::io::AsyncWrite + Unpin> IntoAsync<'_, W> {
    /// Encode the pixels and write the complete file.
    ///
    /// Encoding runs to completion before the first byte is handed to the writer.
    pub async fn encode(&mut self, pixels: &PixelBuffer<'_>) -> Result<usize> {
        let bytes = self.encoder.encode_to_vec(pixels)?;
        self.write(&bytes).await
    }

    /// Encode an image that is already reduced to a palette and write the complete file.
    pub async fn encode_indexed(&mut self, image: &IndexedImage) -> Result<usize> {
        let bytes = self.encoder.encode_indexed(image)?;
        self.write(&bytes).await
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        use futures::io::AsyncWriteExt;
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(bytes.len())
    }
}

/// Rows in the order they are stored.
///
/// Interlaced images store every 8th row starting at 0, then every 8th starting at 4, every
/// 4th starting at 2 and finally every 2nd starting at 1.
fn row_order(height: usize, interlace: bool) -> impl Iterator<Item = usize> {
    const INTERLACED: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];
    const PLAIN: [(usize, usize); 1] = [(0, 1)];

    let passes: &'static [(usize, usize)] = if interlace { &INTERLACED } else { &PLAIN };
    passes
        .iter()
        .flat_map(move |&(start, step)| (start..height).step_by(step))
}

/// Encode `pixels` with default options and write the file to `sink`.
///
/// Returns the number of bytes written.
#[cfg(feature = "std")]
pub fn encode<W: Write>(pixels: &PixelBuffer<'_>, sink: W) -> Result<usize> {
    Encoder::new().into_stream(sink).encode(pixels)
}

/// Encode `pixels` with default options into a new vector.
pub fn encode_to_vec(pixels: &PixelBuffer<'_>) -> Result<Vec<u8>> {
    Encoder::new().encode_to_vec(pixels)
}
