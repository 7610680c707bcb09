#![no_main]
use libfuzzer_sys::fuzz_target;
use rastergif::{BitOrder, PixelBuffer, PixelFormat};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let width = usize::from(data[0] % 64);
    let depth = [1u8, 8, 16, 24, 32][usize::from(data[1] % 5)];
    let pixels = &data[3..];
    let colormap: Vec<_> = (0..=255u8).map(|i| [i, data[2], 255 - i]).collect();

    let format = PixelFormat::from_depth(depth, &colormap, BitOrder::Msb).unwrap();
    let stride = format.min_stride(width).max(1);
    let height = pixels.len() / stride;
    if width == 0 || height == 0 {
        return;
    }
    let buffer = PixelBuffer::new(pixels, width, height, format);

    // Overflowing palettes are fine; anything that encodes must decode again.
    if let Ok(bytes) = rastergif::encode_to_vec(&buffer) {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options.read_info(bytes.as_slice()).expect("header decodes");
        let frame = decoder.read_next_frame().expect("frame decodes");
        assert_eq!(frame.expect("one frame").buffer.len(), width * height);
    }
});
