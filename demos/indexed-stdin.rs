//! Reads 8-bit indexed pixels from stdin and writes a greyscale GIF to stdout.
//!
//! The width is the first argument, the height follows from the input length.

use std::io::{self, BufWriter, Read};

use rastergif::{PixelBuffer, PixelFormat, Rgb};

fn main() {
    match (|| -> io::Result<()> {
        let width: usize = std::env::args()
            .nth(1)
            .and_then(|arg| arg.parse().ok())
            .filter(|&width| width > 0)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "usage: <width>"))?;

        let mut data = vec![];
        io::stdin().lock().read_to_end(&mut data)?;
        let height = data.len() / width;

        let colormap: Vec<Rgb> = (0..=255u8).map(|i| [i, i, i]).collect();
        let pixels = PixelBuffer::new(&data, width, height, PixelFormat::Indexed {
            colormap: &colormap,
        });

        let stdout = io::stdout();
        let stdout = BufWriter::new(stdout.lock());
        rastergif::encode(&pixels, stdout)?;
        Ok(())
    })() {
        Ok(()) => (),
        Err(err) => eprintln!("{}", err),
    }
}
