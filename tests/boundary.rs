use std::io::{self, Write};

use rastergif::{
    encode, encode_to_vec, BitOrder, EncodeError, Encoder, PackedRgb, PixelBuffer, PixelFormat,
};

#[rustfmt::skip]
const CHECKER_2X2: [u8; 42] = [
    b'G', b'I', b'F', b'8', b'7', b'a',
    // Logical screen: 2x2, global table of 4 entries, background 0, aspect 0.
    0x02, 0x00, 0x02, 0x00, 0x91, 0x00, 0x00,
    0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // Image descriptor at 0,0 of 2x2, no local table, not interlaced.
    0x2c, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00,
    // Minimum code size, one sub-block, terminator.
    0x02, 0x03, 0x44, 0x02, 0x05, 0x00,
    0x3b,
];

#[test]
fn mono_checker_exact_bytes() {
    let colormap = [[0, 0, 0], [255, 255, 255]];
    let rows = [0b0100_0000, 0b1000_0000];
    let pixels = PixelBuffer::new(&rows, 2, 2, PixelFormat::Mono {
        colormap: &colormap,
        bit_order: BitOrder::Msb,
    });

    let mut sink = vec![];
    let written = encode(&pixels, &mut sink).unwrap();
    assert_eq!(written, CHECKER_2X2.len());
    assert_eq!(sink, CHECKER_2X2);

    // The same picture with the other bit order.
    let rows = [0b0000_0010, 0b0000_0001];
    let pixels = PixelBuffer::new(&rows, 2, 2, PixelFormat::Mono {
        colormap: &colormap,
        bit_order: BitOrder::Lsb,
    });
    assert_eq!(encode_to_vec(&pixels).unwrap(), CHECKER_2X2);
}

#[test]
fn indexed_checker_exact_bytes() {
    let colormap = [[0, 0, 0], [255, 255, 255]];
    let data = [0, 1, 1, 0];
    let pixels = PixelBuffer::new(&data, 2, 2, PixelFormat::Indexed {
        colormap: &colormap,
    });
    assert_eq!(encode_to_vec(&pixels).unwrap(), CHECKER_2X2);
}

#[test]
fn largest_image_accepted() {
    let colormap = [[1, 2, 3]];
    let data = vec![0u8; 4096 * 4096];
    let pixels = PixelBuffer::new(&data, 4096, 4096, PixelFormat::Indexed {
        colormap: &colormap,
    });

    let bytes = encode_to_vec(&pixels).unwrap();
    assert_eq!(&bytes[6..10], &[0x00, 0x10, 0x00, 0x10]);
    assert!(bytes.len() < data.len() / 100);
}

#[test]
fn oversized_image_rejected_before_writing() {
    let colormap = [[1, 2, 3]];
    // Far too short as well; the dimension is what gets reported.
    let data = [0u8; 16];

    for &(width, height) in &[(4097, 1), (1, 4097), (5000, 5000)] {
        let pixels = PixelBuffer::new(&data, width, height, PixelFormat::Indexed {
            colormap: &colormap,
        });
        let mut sink = vec![];
        let result = encode(&pixels, &mut sink);
        assert!(
            matches!(result, Err(EncodeError::DimensionTooLarge { .. })),
            "{}x{}: {:?}",
            width,
            height,
            result
        );
        assert!(sink.is_empty());
    }
}

#[test]
fn overflowing_stride_rejected() {
    let colormap = [[0, 0, 0], [255, 255, 255]];
    let data = [0u8; 4];

    for &stride in &[usize::MAX, usize::MAX / 2] {
        let pixels = PixelBuffer::new(&data, 2, 2, PixelFormat::Indexed {
            colormap: &colormap,
        })
        .with_stride(stride);
        let mut sink = vec![];
        let result = encode(&pixels, &mut sink);
        assert!(
            matches!(
                result,
                Err(EncodeError::InvalidOption(_)) | Err(EncodeError::BufferTooShort { .. })
            ),
            "stride {}: {:?}",
            stride,
            result
        );
        assert!(sink.is_empty());
    }
}

#[test]
fn unsupported_depths() {
    for &depth in &[0u8, 2, 4, 12, 15, 48] {
        assert!(matches!(
            PixelFormat::from_depth(depth, &[], BitOrder::Msb),
            Err(EncodeError::UnsupportedPixelFormat { depth: d }) if d == depth
        ));
    }
    for &depth in &[1u8, 8, 16, 24, 32] {
        assert!(PixelFormat::from_depth(depth, &[], BitOrder::Msb).is_ok());
    }
}

#[test]
fn too_many_colors() {
    let (width, height) = (300, 1);
    let data: Vec<u8> = (0..width as u32)
        .flat_map(|i| (i << 8).to_le_bytes().to_vec())
        .collect();
    let pixels = PixelBuffer::new(&data, width, height, PixelFormat::Packed(PackedRgb::xrgb8888()));

    let mut sink = vec![];
    assert!(matches!(
        encode(&pixels, &mut sink),
        Err(EncodeError::PaletteOverflow { .. })
    ));
    assert!(sink.is_empty());
}

#[test]
fn single_color_compresses() {
    let colormap = [[9, 9, 9], [0, 0, 0]];
    let data = vec![0u8; 100 * 100];
    let pixels = PixelBuffer::new(&data, 100, 100, PixelFormat::Indexed {
        colormap: &colormap,
    });

    let bytes = encode_to_vec(&pixels).unwrap();
    // Header and tables take 35 bytes, the rest is image data.
    assert!(bytes.len() - 35 < data.len() / 10);
}

struct Failing;

impl Write for Failing {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_failure_surfaces_once() {
    let colormap = [[0, 0, 0], [255, 255, 255]];
    let data = [0, 1, 1, 0];
    let pixels = PixelBuffer::new(&data, 2, 2, PixelFormat::Indexed {
        colormap: &colormap,
    });

    let result = Encoder::new().into_stream(Failing).encode(&pixels);
    match result {
        Err(EncodeError::SinkWriteFailed(err)) => assert_eq!(err.to_string(), "disk full"),
        other => panic!("unexpected {:?}", other),
    }
}
