#![no_main]
use libfuzzer_sys::fuzz_target;
use rastergif::lzw::compress_to_vec;
use weezl::{decode, BitOrder};

fuzz_target!(|data: &[u8]| {
    let min_size = match data.split_first() {
        Some((&first, _)) => 2 + first % 7,
        None => return,
    };
    let mask = ((1u16 << min_size) - 1) as u8;
    let symbols: Vec<u8> = data[1..].iter().map(|&b| b & mask).collect();

    let (compressed, _) = compress_to_vec(min_size, &symbols).expect("symbols are in range");
    let mut decoder = decode::Decoder::new(BitOrder::Lsb, min_size);
    let decoded = decoder.decode(&compressed);
    assert!(decoded.is_ok(), "{:?}", decoded);
    assert_eq!(decoded.unwrap(), symbols);
});
