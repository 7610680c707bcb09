//! Layout of the GIF container.
//!
//! The whole file is assembled in memory and handed out as one byte vector. A sink only ever
//! sees a single write of a complete file.
use crate::alloc::vec::Vec;

use crate::bits::ByteSink;
use crate::palette::Palette;

/// Payload bytes per data sub-block.
pub const SUB_BLOCK_LEN: usize = 254;

const EXTENSION_INTRODUCER: u8 = 0x21;
const GRAPHIC_CONTROL_LABEL: u8 = 0xf9;
const IMAGE_SEPARATOR: u8 = 0x2c;
const TRAILER: u8 = 0x3b;

/// The signature and version tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    /// Plain images without extensions.
    Gif87a,
    /// Required as soon as an extension block is present.
    Gif89a,
}

/// The logical screen descriptor and the global color table following it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub background: u8,
}

/// The image descriptor of the single image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
}

/// Writes the blocks of a GIF file in order.
#[derive(Debug, Default)]
pub struct ContainerWriter {
    out: Vec<u8>,
}

/// Frames compressed bytes into length-prefixed sub-blocks.
///
/// Bytes are buffered until [`SUB_BLOCK_LEN`] are available, a partial block is only written
/// by [`finish`](Self::finish), together with the terminating empty block.
pub struct SubBlocks<'w> {
    out: &'w mut Vec<u8>,
    block: [u8; SUB_BLOCK_LEN],
    len: usize,
    blocks: usize,
}

impl Version {
    fn tag(self) -> &'static [u8; 6] {
        match self {
            Version::Gif87a => b"GIF87a",
            Version::Gif89a => b"GIF89a",
        }
    }
}

impl ContainerWriter {
    pub fn new() -> Self {
        ContainerWriter::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ContainerWriter {
            out: Vec::with_capacity(capacity),
        }
    }

    pub fn write_header(&mut self, version: Version) {
        self.out.extend_from_slice(version.tag());
    }

    /// Write the logical screen descriptor and the global color table.
    ///
    /// The table has `1 << palette.min_code_size()` entries, unused ones are zero.
    pub fn write_screen(&mut self, screen: &ScreenDescriptor, palette: &Palette) {
        let bits = palette.min_code_size() - 1;
        // Global table present, color resolution, not sorted, table size.
        let flags = 0x80 | (bits << 4) | bits;

        self.put_u16(screen.width);
        self.put_u16(screen.height);
        self.out.extend_from_slice(&[flags, screen.background, 0]);

        for color in palette.colors() {
            self.out.extend_from_slice(color);
        }
        let padding = (palette.table_len() - palette.len()) * 3;
        self.out.resize(self.out.len() + padding, 0);
    }

    /// Write a graphic control extension marking `transparent` as see-through.
    pub fn write_graphic_control(&mut self, transparent: u8) {
        self.out.extend_from_slice(&[
            EXTENSION_INTRODUCER,
            GRAPHIC_CONTROL_LABEL,
            4, // block size
            0x01,
            0, // delay
            0,
            transparent,
            0, // block terminator
        ]);
    }

    pub fn write_image_descriptor(&mut self, image: &ImageDescriptor) {
        self.out.push(IMAGE_SEPARATOR);
        self.put_u16(0);
        self.put_u16(0);
        self.put_u16(image.width);
        self.put_u16(image.height);
        self.out.push(if image.interlaced { 0x40 } else { 0 });
    }

    /// Start the image data with its minimum code size and return the sub-block framer.
    pub fn image_data(&mut self, min_code_size: u8) -> SubBlocks<'_> {
        self.out.push(min_code_size);
        SubBlocks {
            out: &mut self.out,
            block: [0; SUB_BLOCK_LEN],
            len: 0,
            blocks: 0,
        }
    }

    pub fn write_trailer(&mut self) {
        self.out.push(TRAILER);
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    fn put_u16(&mut self, value: u16) {
        self.out.extend_from_slice(&value.to_le_bytes());
    }
}

impl SubBlocks<'_> {
    /// Write out the buffered bytes and the terminating empty block.
    ///
    /// Returns the number of non-empty sub-blocks.
    pub fn finish(mut self) -> usize {
        self.flush_block();
        self.out.push(0);
        self.blocks
    }

    fn flush_block(&mut self) {
        if self.len == 0 {
            return;
        }
        self.out.push(self.len as u8);
        self.out.extend_from_slice(&self.block[..self.len]);
        self.len = 0;
        self.blocks += 1;
    }
}

impl ByteSink for SubBlocks<'_> {
    fn put(&mut self, byte: u8) {
        self.block[self.len] = byte;
        self.len += 1;
        if self.len == SUB_BLOCK_LEN {
            self.flush_block();
        }
    }
}
