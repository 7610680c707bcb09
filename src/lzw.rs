//! LZW compression of palette indices, GIF flavor.
//!
//! The dictionary maps a (prefix code, next symbol) pair to the code standing for the extended
//! sequence. It lives in an open addressing hash table of [`HASH_SIZE`] slots that is probed
//! with a double hashing step, the same layout as the classic Unix `compress` and the GIF
//! encoders derived from it. Matching that layout keeps the output byte-identical to theirs.
//!
//! Codes grow from `min_size + 1` bits up to [`MAX_CODESIZE`] bits. Once all 4096 codes are
//! assigned the compressor emits a clear code and starts over with an empty dictionary.
use crate::alloc::vec::Vec;

use crate::bits::{BitPacker, ByteSink};
use crate::error::{EncodeError, Result};
use crate::{Code, MAX_CODESIZE, MAX_ENTRIES};

/// Slots of the dictionary hash table, a prime somewhat above 4096.
pub const HASH_SIZE: usize = 5003;

/// Shift placing the symbol above the prefix in the primary hash.
///
/// Chosen so that any hash stays below [`HASH_SIZE`].
const HASH_SHIFT: u32 = {
    let mut shift = 0;
    let mut size = HASH_SIZE;
    while size < 1 << 16 {
        size *= 2;
        shift += 1;
    }
    8 - shift
};

const EMPTY: u32 = u32::MAX;

/// Counters describing an emitted code stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodeStats {
    /// All emitted codes, including clear and end codes.
    pub codes: usize,
    /// Clear codes emitted, the initial one included.
    pub clears: usize,
}

/// The dictionary of known sequences.
struct HashTable {
    /// Combined `(symbol << 12) | prefix` key per slot, or [`EMPTY`].
    keys: Vec<u32>,
    /// The code assigned to the sequence of the key in the same slot.
    codes: Vec<Code>,
}

/// Where the compressor is within the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Nothing was emitted yet, not even the clear code.
    Fresh,
    /// The dictionary is clear and no symbol is pending.
    AwaitingFirstPixel,
    /// The pending sequence, represented by its code.
    Extending(Code),
    /// The end code was emitted.
    Ended,
}

/// A LZW compressor for one image.
///
/// Every encode constructs its own compressor, there is no state shared between instances.
pub struct Compressor {
    /// The configured minimal code size.
    min_size: u8,
    /// The current encoding dictionary.
    table: HashTable,
    /// The bit buffer for encoding.
    packer: BitPacker,
    /// The current code length.
    code_size: u8,
    /// Largest code representable with the current code length.
    max_code: Code,
    /// The code assigned to the next new sequence.
    next_code: Code,
    /// The clear code for resetting the dictionary.
    clear_code: Code,
    /// A clear code was emitted and the code length must return to its initial value.
    clear_pending: bool,
    state: State,
    stats: CodeStats,
}

impl HashTable {
    fn new() -> Self {
        let mut table = HashTable {
            keys: Vec::with_capacity(HASH_SIZE),
            codes: Vec::with_capacity(HASH_SIZE),
        };
        table.keys.resize(HASH_SIZE, EMPTY);
        table.codes.resize(HASH_SIZE, 0);
        table
    }

    fn clear(&mut self) {
        for key in self.keys.iter_mut() {
            *key = EMPTY;
        }
    }

    /// Search for the extension of `prefix` by `symbol`.
    ///
    /// Return Ok with its code when it is known, otherwise Err with the free slot at which the
    /// sequence would be inserted.
    fn find(&self, prefix: Code, symbol: u8) -> core::result::Result<Code, usize> {
        let key = (u32::from(symbol) << MAX_CODESIZE) | u32::from(prefix);
        let mut slot = (usize::from(symbol) << HASH_SHIFT) ^ usize::from(prefix);

        // Double hashing. The step is never zero and HASH_SIZE is prime, so the probe visits
        // every slot and the table always has free slots left.
        let step = if slot == 0 { 1 } else { HASH_SIZE - slot };
        loop {
            match self.keys[slot] {
                k if k == key => return Ok(self.codes[slot]),
                EMPTY => return Err(slot),
                _ => {}
            }

            slot = if slot >= step {
                slot - step
            } else {
                slot + HASH_SIZE - step
            };
        }
    }

    fn insert(&mut self, slot: usize, prefix: Code, symbol: u8, code: Code) {
        debug_assert_eq!(self.keys[slot], EMPTY);
        self.keys[slot] = (u32::from(symbol) << MAX_CODESIZE) | u32::from(prefix);
        self.codes[slot] = code;
    }
}

impl Compressor {
    /// Create a compressor for symbols of `min_size` bits.
    ///
    /// # Panics
    ///
    /// When `min_size` is not within `2..=8`.
    pub fn new(min_size: u8) -> Self {
        assert!(
            (2..=8).contains(&min_size),
            "minimum code size {} outside of 2..=8",
            min_size
        );

        let clear_code = 1 << min_size;
        Compressor {
            min_size,
            table: HashTable::new(),
            packer: BitPacker::new(),
            code_size: min_size + 1,
            max_code: max_code(min_size + 1),
            next_code: clear_code + 2,
            clear_code,
            clear_pending: false,
            state: State::Fresh,
            stats: CodeStats::default(),
        }
    }

    pub fn clear_code(&self) -> Code {
        self.clear_code
    }

    pub fn end_code(&self) -> Code {
        self.clear_code + 1
    }

    /// The current code length in bits.
    pub fn code_size(&self) -> u8 {
        self.code_size
    }

    /// Compress `symbols`, continuing the sequence of previous calls.
    ///
    /// Consecutive calls form one continuous stream, row boundaries do not reset anything.
    pub fn compress<S: ByteSink + ?Sized>(&mut self, symbols: &[u8], out: &mut S) -> Result<()> {
        self.begin(out);

        for &symbol in symbols {
            if u16::from(symbol) >= self.clear_code {
                return Err(EncodeError::IndexOutOfRange {
                    index: symbol,
                    colormap_len: usize::from(self.clear_code),
                });
            }

            let prefix = match self.state {
                State::Extending(prefix) => prefix,
                State::AwaitingFirstPixel => {
                    self.state = State::Extending(Code::from(symbol));
                    continue;
                }
                State::Fresh | State::Ended => {
                    return Err(EncodeError::InvalidOption("compressor already finished"))
                }
            };

            match self.table.find(prefix, symbol) {
                Ok(code) => self.state = State::Extending(code),
                Err(slot) => {
                    self.emit(prefix, out);
                    self.state = State::Extending(Code::from(symbol));

                    if usize::from(self.next_code) < MAX_ENTRIES {
                        self.table.insert(slot, prefix, symbol, self.next_code);
                        self.next_code += 1;
                    } else {
                        self.reset(out);
                    }
                }
            }
        }

        Ok(())
    }

    /// Emit the pending sequence and the end code, then pad the last byte.
    pub fn finish<S: ByteSink + ?Sized>(&mut self, out: &mut S) -> CodeStats {
        if self.state == State::Ended {
            return self.stats;
        }

        self.begin(out);
        if let State::Extending(code) = self.state {
            self.emit(code, out);
        }
        self.emit(self.end_code(), out);
        self.packer.flush(out);
        self.state = State::Ended;
        self.stats
    }

    pub fn stats(&self) -> CodeStats {
        self.stats
    }

    fn begin<S: ByteSink + ?Sized>(&mut self, out: &mut S) {
        if self.state == State::Fresh {
            self.emit(self.clear_code, out);
            self.stats.clears += 1;
            self.state = State::AwaitingFirstPixel;
        }
    }

    /// Forget all sequences and tell the decoder to do the same.
    fn reset<S: ByteSink + ?Sized>(&mut self, out: &mut S) {
        log::trace!(
            "Dictionary full after {} codes, emitting clear code",
            self.stats.codes
        );
        self.table.clear();
        self.next_code = self.clear_code + 2;
        self.clear_pending = true;
        self.stats.clears += 1;
        self.emit(self.clear_code, out);
    }

    /// Write `code` with the current length, then adjust the length for the next code.
    fn emit<S: ByteSink + ?Sized>(&mut self, code: Code, out: &mut S) {
        self.packer.push_code(code, self.code_size, out);
        self.stats.codes += 1;

        if self.clear_pending {
            self.code_size = self.min_size + 1;
            self.max_code = max_code(self.code_size);
            self.clear_pending = false;
        } else if self.next_code > self.max_code {
            self.code_size += 1;
            self.max_code = if self.code_size == MAX_CODESIZE {
                MAX_ENTRIES as Code
            } else {
                max_code(self.code_size)
            };
        }
    }
}

fn max_code(code_size: u8) -> Code {
    (1 << code_size) - 1
}

/// Compress a complete sequence of symbols in one go.
pub fn compress_to_vec(min_size: u8, symbols: &[u8]) -> Result<(Vec<u8>, CodeStats)> {
    let mut out = Vec::with_capacity(symbols.len() / 2 + 8);
    let mut compressor = Compressor::new(min_size);
    compressor.compress(symbols, &mut out)?;
    let stats = compressor.finish(&mut out);
    Ok((out, stats))
}
