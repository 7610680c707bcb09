use rastergif::lzw::{compress_to_vec, Compressor};
use rastergif::{encode_to_vec, PixelBuffer, PixelFormat};

/// Deterministic noise, which keeps adding new sequences to the dictionary.
fn noise(len: usize, bits: u8) -> Vec<u8> {
    let mut state = 0x9e37_79b9u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 8) as u8 & ((1u16 << bits) - 1) as u8
        })
        .collect()
}

fn decode_lzw(min_size: u8, data: &[u8]) -> Vec<u8> {
    let mut decoder = weezl::decode::Decoder::new(weezl::BitOrder::Lsb, min_size);
    decoder.decode(data).expect("stream decodes")
}

#[test]
fn reset_inside_stream() {
    for &bits in &[2u8, 4, 8] {
        let data = noise(100_000, bits);
        let (compressed, stats) = compress_to_vec(bits, &data).unwrap();

        assert!(stats.clears >= 2, "{} bits: {:?}", bits, stats);
        assert_eq!(decode_lzw(bits, &compressed), data, "{} bits", bits);
    }
}

#[test]
fn reset_across_many_rows() {
    let data = noise(20_000, 8);
    let mut compressed = vec![];
    let mut compressor = Compressor::new(8);
    for row in data.chunks(100) {
        compressor.compress(row, &mut compressed).unwrap();
    }
    let stats = compressor.finish(&mut compressed);

    assert!(stats.clears >= 2);
    assert_eq!(decode_lzw(8, &compressed), data);
}

#[test]
fn no_reset_for_repetitive_input() {
    let data = vec![0u8; 100 * 100];
    let (compressed, stats) = compress_to_vec(2, &data).unwrap();
    assert_eq!(stats.clears, 1);
    assert!(stats.codes < data.len());
    assert!(compressed.len() < data.len());
    assert_eq!(decode_lzw(2, &compressed), data);
}

#[test]
fn container_decodes_across_reset() {
    let colormap: Vec<_> = (0..=255u8).map(|i| [i, 255 - i, 0]).collect();
    let data = noise(256 * 256, 8);
    let pixels = PixelBuffer::new(&data, 256, 256, PixelFormat::Indexed {
        colormap: &colormap,
    });
    let bytes = encode_to_vec(&pixels).unwrap();

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(bytes.as_slice()).unwrap();
    let palette = decoder.global_palette().unwrap().to_vec();
    let frame = decoder.read_next_frame().unwrap().unwrap();

    let red: Vec<u8> = frame
        .buffer
        .iter()
        .map(|&i| palette[usize::from(i) * 3])
        .collect();
    assert_eq!(red, data);
}
