//! Writes a 64x64 black and white checkerboard to stdout.

use std::io::{self, BufWriter};

use rastergif::{BitOrder, PixelBuffer, PixelFormat};

fn main() {
    let colormap = [[0, 0, 0], [255, 255, 255]];
    // Eight pixels per byte, squares of eight pixels.
    let rows: Vec<u8> = (0..64)
        .flat_map(|y| (0..8).map(move |x| if (x + y / 8) % 2 == 0 { 0x00 } else { 0xff }))
        .collect();
    let pixels = PixelBuffer::new(&rows, 64, 64, PixelFormat::Mono {
        colormap: &colormap,
        bit_order: BitOrder::Msb,
    });

    let stdout = io::stdout();
    let stdout = BufWriter::new(stdout.lock());
    match rastergif::encode(&pixels, stdout) {
        Ok(_) => (),
        Err(err) => eprintln!("{}", err),
    }
}
