//! Packing of variable width codes into bytes.
//!
//! Codes are laid out least significant bit first, which is the only order the GIF flavor of
//! LZW knows. Grouping the bytes into sub-blocks is left to the consumer behind [`ByteSink`].
use crate::{Code, MAX_CODESIZE};

use crate::alloc::vec::Vec;

/// Receiver of the packed bytes.
pub trait ByteSink {
    /// Accept the next output byte.
    fn put(&mut self, byte: u8);
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, byte: u8) {
        self.push(byte);
    }
}

/// Accumulates codes of the current width and emits whole bytes.
#[derive(Debug, Default)]
pub struct BitPacker {
    /// The buffer bits.
    buffer: u64,
    /// The number of valid buffer bits.
    bits_in_buffer: u8,
}

impl BitPacker {
    pub fn new() -> Self {
        BitPacker::default()
    }

    /// Insert a code of `code_size` bits and push out every completed byte.
    pub fn push_code<S: ByteSink + ?Sized>(&mut self, code: Code, code_size: u8, out: &mut S) {
        debug_assert!(code_size <= MAX_CODESIZE);
        debug_assert!(u32::from(code) < 1 << code_size);

        self.buffer |= u64::from(code) << self.bits_in_buffer;
        self.bits_in_buffer += code_size;

        while self.bits_in_buffer >= 8 {
            out.put((self.buffer & 0xff) as u8);
            self.buffer >>= 8;
            self.bits_in_buffer -= 8;
        }
    }

    /// Emit the remaining partial byte, padded with zero bits at the top.
    pub fn flush<S: ByteSink + ?Sized>(&mut self, out: &mut S) {
        if self.bits_in_buffer > 0 {
            out.put((self.buffer & 0xff) as u8);
        }
        self.buffer = 0;
        self.bits_in_buffer = 0;
    }

    /// Bits waiting for a byte to complete.
    pub fn pending_bits(&self) -> u8 {
        self.bits_in_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::BitPacker;

    #[test]
    fn codes_fill_bytes_lsb_first() {
        let mut out = vec![];
        let mut packer = BitPacker::new();
        for &code in &[4, 0, 1] {
            packer.push_code(code, 3, &mut out);
        }
        assert_eq!(out, [0x44]);
        assert_eq!(packer.pending_bits(), 1);

        packer.push_code(1, 3, &mut out);
        packer.push_code(0, 4, &mut out);
        assert_eq!(out, [0x44, 0x02]);
        assert_eq!(packer.pending_bits(), 0);
    }

    #[test]
    fn flush_pads_partial_byte() {
        let mut out = vec![];
        let mut packer = BitPacker::new();
        packer.push_code(5, 4, &mut out);
        assert!(out.is_empty());

        packer.flush(&mut out);
        assert_eq!(out, [0x05]);

        // Nothing pending, nothing emitted.
        packer.flush(&mut out);
        assert_eq!(out, [0x05]);
    }

    #[test]
    fn wide_codes_span_bytes() {
        let mut out = vec![];
        let mut packer = BitPacker::new();
        packer.push_code(0xabc, 12, &mut out);
        packer.push_code(0x123, 12, &mut out);
        assert_eq!(out, [0xbc, 0x3a, 0x12]);
    }
}
